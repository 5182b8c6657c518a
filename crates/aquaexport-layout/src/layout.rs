use std::collections::BTreeMap;
use std::fmt;

use aquaexport_common::{CellRef, Statistic, letters_to_column};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::Mode;
use crate::error::LookupError;

/// Day rows per block. Short months leave the trailing rows untouched.
pub const BLOCK_DAY_ROWS: u32 = 31;
/// Offset from a block's anchor row to the row of day 1.
pub const DAY_ROW_OFFSET: u32 = 2;

/// Row of `day` inside the block anchored at `anchor`: `anchor + 2 + (day - 1)`.
pub fn day_row(anchor: u32, day: u32) -> Result<u32, LookupError> {
    if !(1..=BLOCK_DAY_ROWS).contains(&day) {
        return Err(LookupError::DayOutOfRange { day });
    }
    Ok(anchor + DAY_ROW_OFFSET + (day - 1))
}

/// Canonical layout manifest for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeLayout {
    pub mode: Mode,
    pub document: DocumentLayout,
    /// Month sheets are named `<prefix><MM>`.
    pub sheet_prefix: String,
    pub block: BlockLayout,
    /// Columns holding template formulas. Never written.
    #[serde(default)]
    pub protected_columns: Vec<String>,
    pub locations: Vec<LocationSchema>,
}

/// Where documents of a mode live and which template seeds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentLayout {
    /// Subdirectory of the export root.
    pub directory: String,
    /// Documents are named `<file_stem>_<year>.xlsx`.
    pub file_stem: String,
    /// Template file name inside the template directory.
    pub template: String,
}

/// Structural columns shared by every block of a mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockLayout {
    pub day_column: String,
    pub label_column: String,
    #[serde(default)]
    pub year_marker: Option<YearMarker>,
}

/// Cell stamped with the document year once, when the document is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearMarker {
    pub column: String,
    pub rows_above_anchor: u32,
}

/// One location's block: anchor row plus metric/statistic columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationSchema {
    pub name: String,
    /// Text written into the label column; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub anchor: u32,
    pub columns: BTreeMap<String, BTreeMap<Statistic, String>>,
}

impl LocationSchema {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Last row touched by this block (the day-31 row).
    pub fn last_row(&self) -> u32 {
        self.anchor + DAY_ROW_OFFSET + BLOCK_DAY_ROWS - 1
    }

    pub fn column_letters(&self, metric: &str, statistic: Statistic) -> Option<&str> {
        self.columns
            .get(metric)
            .and_then(|stats| stats.get(&statistic))
            .map(String::as_str)
    }
}

/// Fully derived target of one write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub sheet: String,
    pub cell: CellRef,
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.cell)
    }
}

impl ModeLayout {
    /// Construct a layout by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a layout from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize this layout to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn location(&self, name: &str) -> Option<&LocationSchema> {
        self.locations.iter().find(|loc| loc.name == name)
    }

    pub fn sheet_name(&self, month: u32) -> String {
        format!("{}{:02}", self.sheet_prefix, month)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        (1..=12).map(|month| self.sheet_name(month)).collect()
    }

    pub fn file_name(&self, year: i32) -> String {
        format!("{}_{}.xlsx", self.document.file_stem, year)
    }

    pub fn anchor(&self, location: &str) -> Result<u32, LookupError> {
        self.location(location)
            .map(|loc| loc.anchor)
            .ok_or_else(|| self.unknown_location(location))
    }

    /// 1-based column index for `(location, metric, statistic)`.
    pub fn column(
        &self,
        location: &str,
        metric: &str,
        statistic: Statistic,
    ) -> Result<u32, LookupError> {
        let schema = self
            .location(location)
            .ok_or_else(|| self.unknown_location(location))?;
        let letters =
            schema
                .column_letters(metric, statistic)
                .ok_or_else(|| LookupError::UnknownColumn {
                    location: location.to_string(),
                    metric: metric.to_string(),
                    statistic,
                })?;
        column_index(letters)
    }

    /// The single addressing function:
    /// sheet `<prefix><MM>`, row `anchor + 2 + (day - 1)`, column from the schema.
    pub fn address(
        &self,
        location: &str,
        date: NaiveDate,
        metric: &str,
        statistic: Statistic,
    ) -> Result<CellAddress, LookupError> {
        let anchor = self.anchor(location)?;
        let col = self.column(location, metric, statistic)?;
        let row = day_row(anchor, date.day())?;
        Ok(CellAddress {
            sheet: self.sheet_name(date.month()),
            cell: CellRef { row, col },
        })
    }

    pub fn day_column(&self) -> Result<u32, LookupError> {
        column_index(&self.block.day_column)
    }

    pub fn label_column(&self) -> Result<u32, LookupError> {
        column_index(&self.block.label_column)
    }

    pub fn is_protected(&self, col: u32) -> bool {
        self.protected_columns
            .iter()
            .any(|letters| letters_to_column(letters) == Some(col))
    }

    /// Year-marker cells, one per block, in declaration order.
    pub fn year_marker_cells(&self) -> Result<Vec<CellRef>, LookupError> {
        let Some(marker) = &self.block.year_marker else {
            return Ok(Vec::new());
        };
        let col = column_index(&marker.column)?;
        Ok(self
            .locations
            .iter()
            .filter(|loc| loc.anchor > marker.rows_above_anchor)
            .map(|loc| CellRef {
                row: loc.anchor - marker.rows_above_anchor,
                col,
            })
            .collect())
    }

    fn unknown_location(&self, location: &str) -> LookupError {
        LookupError::UnknownLocation {
            mode: self.mode,
            location: location.to_string(),
        }
    }
}

fn column_index(letters: &str) -> Result<u32, LookupError> {
    letters_to_column(letters).ok_or_else(|| LookupError::InvalidColumn {
        column: letters.to_string(),
    })
}
