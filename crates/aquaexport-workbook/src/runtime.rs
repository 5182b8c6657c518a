use std::collections::BTreeSet;
use std::path::PathBuf;

use aquaexport_layout::{LayoutRegistry, Mode, ModeLayout};
use chrono::NaiveDate;

use crate::error::{ExportError, ExportWarning};
use crate::partition::{DateRange, Measurements, YearPartitions, partition};
use crate::projector::CellProjector;
use crate::storage::DocumentStorage;
use crate::store::WorkbookStore;

/// Progress snapshot handed to the progress callback after each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub completed: usize,
    pub total: usize,
    pub year: i32,
    pub date: NaiveDate,
}

impl ExportProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

pub type ProgressFn = Box<dyn FnMut(ExportProgress) + Send>;

#[derive(Default)]
pub struct ExportOptions {
    pub progress: Option<ProgressFn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Success,
    CompletedWithWarnings,
}

impl ExportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::CompletedWithWarnings => "completed_with_warnings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    pub path: PathBuf,
    pub created: bool,
    pub records: usize,
    pub cells_written: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub mode: Mode,
    pub status: ExportStatus,
    pub records: usize,
    pub cells_written: usize,
    pub years: Vec<YearSummary>,
    pub warnings: Vec<ExportWarning>,
}

impl ExportReport {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            status: ExportStatus::Success,
            records: 0,
            cells_written: 0,
            years: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.years.iter().map(|year| &year.path)
    }
}

/// Drives one export run: partition, resolve per year, project, save.
///
/// Years are processed in ascending order and one document is open at a time.
/// A fatal error stops the run; documents saved before it stay on disk.
pub struct Exporter<'a, S> {
    layouts: &'a LayoutRegistry,
    store: &'a WorkbookStore<S>,
}

impl<'a, S: DocumentStorage> Exporter<'a, S> {
    pub fn new(layouts: &'a LayoutRegistry, store: &'a WorkbookStore<S>) -> Self {
        Self { layouts, store }
    }

    /// Export every record of `measurements` that falls inside `range`.
    pub fn run(
        &self,
        mode: Mode,
        range: &DateRange,
        measurements: &Measurements,
        options: ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        let partitions = partition(measurements, range);
        tracing::info!(
            %mode,
            start = %range.start(),
            end = %range.end(),
            years = ?partitions.year_list(),
            "starting export"
        );
        self.run_partitions(mode, partitions, options)
    }

    /// Export pre-grouped records.
    pub fn run_partitions(
        &self,
        mode: Mode,
        mut partitions: YearPartitions,
        mut options: ExportOptions,
    ) -> Result<ExportReport, ExportError> {
        let layout = self.layouts.get(mode);
        let mut report = ExportReport::new(mode);

        let unknown: BTreeSet<String> = partitions
            .locations()
            .into_iter()
            .filter(|name| layout.location(name).is_none())
            .map(str::to_string)
            .collect();
        for location in &unknown {
            let warning = ExportWarning::UnknownLocation {
                mode,
                location: location.clone(),
            };
            tracing::warn!("{warning}");
            report.warnings.push(warning);
        }
        partitions.retain_locations(|name| !unknown.contains(name));

        let total = partitions.record_count();
        if total == 0 {
            tracing::info!(%mode, "nothing to export");
            report.status = status_for(&report);
            return Ok(report);
        }
        if partitions
            .year_list()
            .into_iter()
            .any(|year| !self.store.document_path(layout, year).is_file())
        {
            self.store.ensure_template(layout)?;
        }

        let projector = CellProjector::new(layout)?;
        let mut completed = 0usize;

        for (year, locations) in partitions {
            let span = tracing::info_span!("export_year", %mode, year);
            let _guard = span.enter();

            let summary = self.export_year(
                layout,
                &projector,
                year,
                &locations,
                &mut report,
                &mut |date: NaiveDate| {
                    completed += 1;
                    if let Some(cb) = options.progress.as_mut() {
                        cb(ExportProgress {
                            completed,
                            total,
                            year,
                            date,
                        });
                    }
                },
            )?;
            report.records += summary.records;
            report.cells_written += summary.cells_written;
            report.years.push(summary);
        }

        report.status = status_for(&report);
        tracing::info!(
            %mode,
            records = report.records,
            cells = report.cells_written,
            warnings = report.warnings.len(),
            "export finished"
        );
        Ok(report)
    }

    fn export_year(
        &self,
        layout: &ModeLayout,
        projector: &CellProjector<'_>,
        year: i32,
        locations: &Measurements,
        report: &mut ExportReport,
        advance: &mut dyn FnMut(NaiveDate),
    ) -> Result<YearSummary, ExportError> {
        let mut doc = self.store.resolve(layout, year)?;
        report.warnings.extend(doc.take_warnings());

        let mut summary = YearSummary {
            year,
            path: doc.path().to_path_buf(),
            created: doc.created(),
            records: 0,
            cells_written: 0,
        };

        for (location, series) in locations {
            for (date, values) in series {
                match projector.project(&mut doc, location, *date, values) {
                    Ok(projection) => {
                        summary.records += 1;
                        summary.cells_written += projection.cells_written;
                        report.warnings.extend(projection.warnings);
                    }
                    Err(err) => {
                        tracing::error!(%location, %date, error = %err, "projection failed");
                        self.store.close(doc);
                        return Err(err);
                    }
                }
                advance(*date);
            }
        }

        if let Err(err) = self.store.save(&mut doc) {
            tracing::error!(path = %summary.path.display(), error = %err, "save failed");
            self.store.close(doc);
            return Err(err);
        }
        self.store.close(doc);
        Ok(summary)
    }
}

fn status_for(report: &ExportReport) -> ExportStatus {
    if report.has_warnings() {
        ExportStatus::CompletedWithWarnings
    } else {
        ExportStatus::Success
    }
}
