use std::path::PathBuf;

use aquaexport_common::Statistic;

use crate::Mode;
use crate::validation::ValidationError;

/// Failure to obtain a usable layout manifest.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to read layout manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("layout manifest declares mode `{found}` but was supplied for `{expected}`")]
    ModeMismatch { expected: Mode, found: Mode },
}

/// A single address lookup that the layout cannot answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("location `{location}` has no block in the {mode} layout")]
    UnknownLocation { mode: Mode, location: String },

    #[error("location `{location}` has no column for {metric}/{statistic}")]
    UnknownColumn {
        location: String,
        metric: String,
        statistic: Statistic,
    },

    #[error("day {day} is outside the 1..=31 rows of a block")]
    DayOutOfRange { day: u32 },

    #[error("`{column}` is not a valid column reference")]
    InvalidColumn { column: String },
}
