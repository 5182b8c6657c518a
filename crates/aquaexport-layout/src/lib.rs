//! Sheet layouts for the aquaexport report modes.
//!
//! A [`ModeLayout`] is a declarative manifest: which document and sheets a mode
//! writes to, where each location's 32-row block starts, and which column holds
//! each `(metric, statistic)` pair. Adding a location is a manifest change, not a
//! code change. [`LayoutRegistry`] holds one validated layout per [`Mode`] and is
//! the only place cell addresses are derived from.

mod error;
mod layout;
mod mode;
mod registry;
mod validation;

pub use error::{LayoutError, LookupError};
pub use layout::{
    BLOCK_DAY_ROWS, BlockLayout, CellAddress, DAY_ROW_OFFSET, DocumentLayout, LocationSchema,
    ModeLayout, YearMarker, day_row,
};
pub use mode::Mode;
pub use registry::LayoutRegistry;
pub use validation::{LayoutIssue, ValidationError};

/// Embedded default manifest for [`Mode::Quality`].
pub const QUALITY_LAYOUT_YAML: &str = include_str!("../layouts/quality.yaml");
/// Embedded default manifest for [`Mode::Quantity`].
pub const QUANTITY_LAYOUT_YAML: &str = include_str!("../layouts/quantity.yaml");
