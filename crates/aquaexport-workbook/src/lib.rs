//! Year-partitioned xlsx export of daily measurements.
//!
//! Records are grouped by calendar year, each year is projected into its own
//! document built from a mode template, and every document is saved atomically.

pub mod backends;
pub mod error;
pub mod partition;
pub mod projector;
pub mod runtime;
pub mod source;
pub mod storage;
pub mod store;

pub use backends::UmyaDocument;
pub use error::{ExportError, ExportWarning};
pub use partition::{
    DateRange, LocationSeries, Measurements, MetricValues, YearPartitions, partition,
};
pub use projector::{CellProjector, Projection};
pub use runtime::{
    ExportOptions, ExportProgress, ExportReport, ExportStatus, Exporter, ProgressFn, YearSummary,
};
pub use source::{InMemorySource, JsonFileSource, MeasurementSource};
pub use storage::{AtomicFileStorage, DocumentStorage};
pub use store::{WorkbookStore, YearDocument};

pub use aquaexport_common::{CellRef, CellValue, MetricValue, Statistic};
pub use aquaexport_layout::{LayoutRegistry, Mode, ModeLayout};
