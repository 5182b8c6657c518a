use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which aggregate of a day's readings a cell holds.
///
/// Triples coming from the data source are ordered `(min, max, avg)`;
/// single-valued metrics use [`Statistic::Value`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Statistic {
    Min,
    Max,
    Avg,
    Value,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::Min,
        Statistic::Max,
        Statistic::Avg,
        Statistic::Value,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Value => "value",
        }
    }
}

impl Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "avg" => Ok(Self::Avg),
            "value" => Ok(Self::Value),
            other => Err(format!("unknown statistic `{other}`")),
        }
    }
}

/// One metric's value for one location and day, as produced by the data source.
///
/// Any component may be absent (`null`); absent components are never written.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Scalar(Option<f64>),
    Triple(Option<f64>, Option<f64>, Option<f64>),
}

impl MetricValue {
    pub fn triple(min: f64, max: f64, avg: f64) -> Self {
        Self::Triple(Some(min), Some(max), Some(avg))
    }

    pub fn scalar(value: f64) -> Self {
        Self::Scalar(Some(value))
    }

    /// Present `(statistic, value)` pairs in column order min, max, avg.
    pub fn statistics(&self) -> Vec<(Statistic, f64)> {
        match *self {
            MetricValue::Scalar(value) => value
                .map(|v| vec![(Statistic::Value, v)])
                .unwrap_or_default(),
            MetricValue::Triple(min, max, avg) => [
                (Statistic::Min, min),
                (Statistic::Max, max),
                (Statistic::Avg, avg),
            ]
            .into_iter()
            .filter_map(|(stat, v)| v.map(|v| (stat, v)))
            .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statistics().is_empty()
    }
}

/// Payload read from or written to a worksheet cell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}
