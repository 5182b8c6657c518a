//! Shared coordinate and value types for the aquaexport workspace.
//!
//! - `coord` : 1-based A1 cell references and column-letter helpers
//! - `value` : statistic kinds, incoming metric values and cell payloads

pub mod coord;
pub mod value;

pub use coord::{CellRef, CoordError, column_to_letters, letters_to_column};
pub use value::{CellValue, MetricValue, Statistic};
