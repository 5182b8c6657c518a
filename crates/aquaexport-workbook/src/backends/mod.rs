pub mod umya;

pub use umya::UmyaDocument;
