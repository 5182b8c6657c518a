use aquaexport_common::{CellRef, CellValue};
use aquaexport_layout::{LookupError, ModeLayout, day_row};
use chrono::{Datelike, NaiveDate};

use crate::error::{ExportError, ExportWarning};
use crate::partition::MetricValues;
use crate::store::YearDocument;

/// Outcome of projecting one `(location, day)` record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub cells_written: usize,
    pub warnings: Vec<ExportWarning>,
}

/// Writes records into a year document through one mode's layout.
pub struct CellProjector<'a> {
    layout: &'a ModeLayout,
    day_column: u32,
    label_column: u32,
}

impl<'a> CellProjector<'a> {
    pub fn new(layout: &'a ModeLayout) -> Result<Self, ExportError> {
        Ok(Self {
            layout,
            day_column: layout.day_column()?,
            label_column: layout.label_column()?,
        })
    }

    /// Write the day number, the label on day 1, and every present statistic
    /// that the location's schema maps to a column.
    ///
    /// Statistics without a column are skipped. A missing month sheet skips the
    /// whole record with a warning.
    pub fn project(
        &self,
        doc: &mut YearDocument,
        location: &str,
        date: NaiveDate,
        values: &MetricValues,
    ) -> Result<Projection, ExportError> {
        let mut out = Projection::default();
        let Some(schema) = self.layout.location(location) else {
            out.warnings.push(ExportWarning::UnknownLocation {
                mode: self.layout.mode,
                location: location.to_string(),
            });
            return Ok(out);
        };

        let sheet = self.layout.sheet_name(date.month());
        if !doc.has_sheet(&sheet) {
            let warning = ExportWarning::MissingSheet {
                sheet,
                path: doc.path().to_path_buf(),
                location: location.to_string(),
                date,
            };
            tracing::warn!("{warning}");
            out.warnings.push(warning);
            return Ok(out);
        }

        let row = day_row(schema.anchor, date.day())?;
        doc.write_cell(
            &sheet,
            CellRef {
                row,
                col: self.day_column,
            },
            &CellValue::from(date.day()),
        )?;
        out.cells_written += 1;
        if date.day() == 1 {
            doc.write_cell(
                &sheet,
                CellRef {
                row,
                col: self.label_column,
            },
                &CellValue::from(schema.display_name()),
            )?;
            out.cells_written += 1;
        }

        for (metric, value) in values {
            for (statistic, number) in value.statistics() {
                let col = match self.layout.column(location, metric, statistic) {
                    Ok(col) => col,
                    Err(LookupError::UnknownColumn { .. }) => {
                        tracing::trace!(location, %metric, %statistic, "no column mapped; skipped");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                };
                if self.layout.is_protected(col) {
                    tracing::debug!(location, %metric, col, "protected column; skipped");
                    continue;
                }
                doc.write_cell(&sheet, CellRef { row, col }, &CellValue::Number(number))?;
                out.cells_written += 1;
            }
        }
        tracing::debug!(
            location,
            %date,
            %sheet,
            row,
            cells = out.cells_written,
            "projected record"
        );
        Ok(out)
    }
}
