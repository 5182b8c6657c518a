//! Compact A1 coordinate helpers.
//!
//! Rows and columns are 1-based, matching what a spreadsheet user sees: `A1` is
//! `(row 1, col 1)`. The limits are Excel's: 1,048,576 rows × 16,384 columns.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const ROW_MAX: u32 = 1_048_576;
pub const COL_MAX: u32 = 16_384;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoordError {
    ZeroIndex,
    RowOverflow(u64),
    ColOverflow(u64),
    InvalidColumn(String),
    InvalidA1(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::ZeroIndex => write!(f, "row and column indices must be 1-based (>= 1)"),
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {ROW_MAX}"),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {COL_MAX}"),
            CoordError::InvalidColumn(text) => write!(f, "`{text}` is not a column reference"),
            CoordError::InvalidA1(text) => write!(f, "`{text}` is not an A1 cell reference"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Absolute cell position inside one worksheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn try_new(row: u32, col: u32) -> Result<Self, CoordError> {
        if row == 0 || col == 0 {
            return Err(CoordError::ZeroIndex);
        }
        if row > ROW_MAX {
            return Err(CoordError::RowOverflow(row as u64));
        }
        if col > COL_MAX {
            return Err(CoordError::ColOverflow(col as u64));
        }
        Ok(Self { row, col })
    }

    /// Build from a column letter (`"C"`) and a row number.
    pub fn from_column(column: &str, row: u32) -> Result<Self, CoordError> {
        let col = letters_to_column(column)
            .ok_or_else(|| CoordError::InvalidColumn(column.to_string()))?;
        Self::try_new(row, col)
    }

    /// Column letters for this reference (`3` -> `"C"`).
    pub fn column_letters(&self) -> String {
        column_to_letters(self.col)
    }

    /// `(col, row)` tuple in the order umya-spreadsheet expects.
    pub fn col_row(&self) -> (u32, u32) {
        (self.col, self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let split = trimmed
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| CoordError::InvalidA1(s.to_string()))?;
        let (letters, digits) = trimmed.split_at(split);
        let digits = digits.trim_start_matches('$');
        let row: u32 = digits
            .parse()
            .map_err(|_| CoordError::InvalidA1(s.to_string()))?;
        let upper = letters.to_ascii_uppercase();
        Self::from_column(&upper, row)
    }
}

/// Convert a 1-based column index to letters (`1` -> `A`, `28` -> `AB`).
pub fn column_to_letters(col: u32) -> String {
    debug_assert!(col >= 1, "columns are 1-based");
    let mut col = col.saturating_sub(1);
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Convert column letters to a 1-based index. Only uppercase ASCII is accepted.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32 + 1;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
    }
    if col > COL_MAX { None } else { Some(col) }
}
