use std::io::Cursor;
use std::path::Path;

use aquaexport_common::{CellRef, CellValue};
use umya_spreadsheet::{CellRawValue, Spreadsheet, XlsxError, reader::xlsx};

/// In-memory xlsx document backed by umya-spreadsheet.
///
/// Cells outside the ones written here (styles, formulas, merged ranges)
/// are carried through untouched when the document is serialized.
pub struct UmyaDocument {
    workbook: Spreadsheet,
}

impl UmyaDocument {
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, XlsxError> {
        // Full read, not lazy, so serialization never meets undeserialized sheets.
        let workbook = xlsx::read(path.as_ref())?;
        Ok(Self { workbook })
    }

    pub fn from_spreadsheet(workbook: Spreadsheet) -> Self {
        Self { workbook }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        let count = self.workbook.get_sheet_count();
        (0..count)
            .filter_map(|i| self.workbook.get_sheet(&i))
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.workbook.get_sheet_by_name(sheet).is_some()
    }

    /// Overwrites the value of one cell. The sheet must exist.
    pub fn write_cell(
        &mut self,
        sheet: &str,
        cell: CellRef,
        value: &CellValue,
    ) -> Result<(), XlsxError> {
        let ws = self
            .workbook
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| XlsxError::CellError(format!("sheet {sheet} not found")))?;
        // umya uses (col,row)
        let target = ws.get_cell_mut(cell.col_row());
        match value {
            CellValue::Number(n) => {
                target.set_value_number(*n);
            }
            CellValue::Bool(b) => {
                target.set_value_bool(*b);
            }
            CellValue::Text(s) => {
                target.set_value(s.clone());
            }
        }
        Ok(())
    }

    /// Cached value of a cell; formulas report their last computed result.
    pub fn read_cell(&self, sheet: &str, cell: CellRef) -> Option<CellValue> {
        let ws = self.workbook.get_sheet_by_name(sheet)?;
        let cv = ws.get_cell(cell.col_row())?.get_cell_value();
        match cv.get_raw_value() {
            CellRawValue::Numeric(n) => Some(CellValue::Number(*n)),
            CellRawValue::Bool(b) => Some(CellValue::Bool(*b)),
            CellRawValue::String(s) => Some(CellValue::Text(s.to_string())),
            CellRawValue::RichText(rt) => Some(CellValue::Text(rt.get_text().to_string())),
            CellRawValue::Lazy(s) => {
                let txt = s.as_ref();
                match txt.parse::<f64>() {
                    Ok(n) => Some(CellValue::Number(n)),
                    Err(_) => Some(CellValue::Text(txt.to_string())),
                }
            }
            _ => None,
        }
    }

    /// Formula text of a cell, without the leading `=`.
    pub fn cell_formula(&self, sheet: &str, cell: CellRef) -> Option<String> {
        let ws = self.workbook.get_sheet_by_name(sheet)?;
        let cv = ws.get_cell(cell.col_row())?.get_cell_value();
        if cv.is_formula() {
            Some(cv.get_formula().to_string())
        } else {
            None
        }
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, XlsxError> {
        let count = self.workbook.get_sheet_count();
        for i in 0..count {
            self.workbook.read_sheet(i);
        }
        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.workbook, &mut buf)?;
        Ok(buf.into_inner())
    }
}
