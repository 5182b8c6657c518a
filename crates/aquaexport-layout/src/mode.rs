use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Report kind. Each mode has its own layout, template and output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Water quality parameters (min/max/avg per parameter).
    Quality,
    /// Abstracted water quantities (daily volumes and peak flows).
    Quantity,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Quality, Mode::Quantity];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Quality => "quality",
            Mode::Quantity => "quantity",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quality" | "kvaliteta_vode" => Ok(Mode::Quality),
            "quantity" | "zahvacene_kolicine_vode" => Ok(Mode::Quantity),
            other => Err(format!(
                "unknown mode `{other}` (expected `quality` or `quantity`)"
            )),
        }
    }
}
