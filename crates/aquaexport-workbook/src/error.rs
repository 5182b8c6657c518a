use std::fmt;
use std::io;
use std::path::PathBuf;

use aquaexport_layout::{LayoutError, LookupError, Mode};
use chrono::NaiveDate;

/// Fatal conditions. Each stops the current year partition, or the whole run
/// when raised before any partition was touched.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{mode} template not found: {path}")]
    TemplateMissing { mode: Mode, path: PathBuf },

    #[error("{path} is open in another program ({mode}, {year}); close it and retry")]
    DocumentLocked {
        path: PathBuf,
        year: i32,
        mode: Mode,
    },

    #[error("measurement source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("measurement source returned malformed data: {reason}")]
    MalformedSource { reason: String },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("spreadsheet error in {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl ExportError {
    pub fn is_locked(&self) -> bool {
        matches!(self, ExportError::DocumentLocked { .. })
    }
}

/// Non-fatal conditions. Collected into the run report and logged; the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// A location without a block in the layout. Raised once per location per run.
    UnknownLocation { mode: Mode, location: String },
    /// The computed month sheet is absent from the document; that day was skipped.
    MissingSheet {
        sheet: String,
        path: PathBuf,
        location: String,
        date: NaiveDate,
    },
    /// The template lacks a month sheet, so its year marker could not be stamped.
    MissingYearMarkerSheet { sheet: String, path: PathBuf },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::UnknownLocation { mode, location } => {
                write!(f, "unknown {mode} location `{location}`; its records were skipped")
            }
            ExportWarning::MissingSheet {
                sheet,
                path,
                location,
                date,
            } => write!(
                f,
                "sheet {sheet} not found in {}; skipped {location} on {date}",
                path.display()
            ),
            ExportWarning::MissingYearMarkerSheet { sheet, path } => write!(
                f,
                "sheet {sheet} not found in {}; year marker not stamped",
                path.display()
            ),
        }
    }
}

/// Sharing/lock violations raised by the OS when another process holds the file.
pub(crate) fn is_lock_violation(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33))
}
