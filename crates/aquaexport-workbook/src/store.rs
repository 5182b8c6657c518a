use std::path::{Path, PathBuf};

use aquaexport_common::{CellRef, CellValue};
use aquaexport_layout::{Mode, ModeLayout};
use umya_spreadsheet::XlsxError;

use crate::backends::UmyaDocument;
use crate::error::{ExportError, ExportWarning, is_lock_violation};
use crate::storage::{AtomicFileStorage, DocumentStorage};

/// One open year document of one mode.
///
/// A document created from the template lives only in memory until the
/// first successful [`WorkbookStore::save`].
pub struct YearDocument {
    mode: Mode,
    year: i32,
    path: PathBuf,
    created: bool,
    document: UmyaDocument,
    warnings: Vec<ExportWarning>,
}

impl YearDocument {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the document did not exist on disk when it was resolved.
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.document.has_sheet(sheet)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.document.sheet_names()
    }

    pub fn read_cell(&self, sheet: &str, cell: CellRef) -> Option<CellValue> {
        self.document.read_cell(sheet, cell)
    }

    pub fn cell_formula(&self, sheet: &str, cell: CellRef) -> Option<String> {
        self.document.cell_formula(sheet, cell)
    }

    pub fn write_cell(
        &mut self,
        sheet: &str,
        cell: CellRef,
        value: &CellValue,
    ) -> Result<(), ExportError> {
        self.document
            .write_cell(sheet, cell, value)
            .map_err(|err| spreadsheet_error(&self.path, err))
    }

    /// Warnings raised while resolving the document.
    pub fn take_warnings(&mut self) -> Vec<ExportWarning> {
        std::mem::take(&mut self.warnings)
    }
}

/// Resolves, creates and saves the year documents under an export root.
///
/// Paths are canonical: `<export_root>/<mode dir>/<stem>_<year>.xlsx`.
pub struct WorkbookStore<S = AtomicFileStorage> {
    export_root: PathBuf,
    template_dir: PathBuf,
    storage: S,
}

impl WorkbookStore<AtomicFileStorage> {
    pub fn new(export_root: impl Into<PathBuf>, template_dir: impl Into<PathBuf>) -> Self {
        Self::with_storage(export_root, template_dir, AtomicFileStorage)
    }
}

impl<S: DocumentStorage> WorkbookStore<S> {
    pub fn with_storage(
        export_root: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
        storage: S,
    ) -> Self {
        Self {
            export_root: export_root.into(),
            template_dir: template_dir.into(),
            storage,
        }
    }

    pub fn export_root(&self) -> &Path {
        &self.export_root
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn mode_dir(&self, layout: &ModeLayout) -> PathBuf {
        self.export_root.join(&layout.document.directory)
    }

    pub fn document_path(&self, layout: &ModeLayout, year: i32) -> PathBuf {
        self.mode_dir(layout).join(layout.file_name(year))
    }

    pub fn template_path(&self, layout: &ModeLayout) -> PathBuf {
        self.template_dir.join(&layout.document.template)
    }

    /// Fails with `TemplateMissing` unless the mode's template is a file.
    pub fn ensure_template(&self, layout: &ModeLayout) -> Result<PathBuf, ExportError> {
        let path = self.template_path(layout);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ExportError::TemplateMissing {
                mode: layout.mode,
                path,
            })
        }
    }

    /// Open the year document, or build it in memory from the template.
    ///
    /// Creation stamps the year into every year-marker cell of every month
    /// sheet. Existing documents are never re-stamped.
    pub fn resolve(&self, layout: &ModeLayout, year: i32) -> Result<YearDocument, ExportError> {
        let path = self.document_path(layout, year);
        if path.is_file() {
            if let Err(err) = self.storage.probe_writable(&path) {
                return Err(self.classify_io(layout.mode, year, &path, err));
            }
            let document = UmyaDocument::open_path(&path)
                .map_err(|err| self.classify_xlsx(layout.mode, year, &path, err))?;
            tracing::debug!(path = %path.display(), year, "opened existing document");
            return Ok(YearDocument {
                mode: layout.mode,
                year,
                path,
                created: false,
                document,
                warnings: Vec::new(),
            });
        }

        let template = self.ensure_template(layout)?;
        let document = UmyaDocument::open_path(&template)
            .map_err(|err| spreadsheet_error(&template, err))?;
        let mut doc = YearDocument {
            mode: layout.mode,
            year,
            path,
            created: true,
            document,
            warnings: Vec::new(),
        };
        stamp_year(layout, &mut doc)?;
        tracing::info!(
            path = %doc.path.display(),
            template = %template.display(),
            year,
            "creating document from template"
        );
        Ok(doc)
    }

    /// Serialize and durably replace the document on disk.
    pub fn save(&self, doc: &mut YearDocument) -> Result<(), ExportError> {
        let bytes = doc
            .document
            .to_bytes()
            .map_err(|err| spreadsheet_error(&doc.path, err))?;
        self.storage
            .persist(&doc.path, &bytes)
            .map_err(|err| self.classify_io(doc.mode, doc.year, &doc.path, err))?;
        tracing::info!(path = %doc.path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }

    /// Release the document. Unsaved changes are discarded.
    pub fn close(&self, doc: YearDocument) {
        tracing::debug!(path = %doc.path.display(), "closed document");
        drop(doc);
    }

    fn classify_io(&self, mode: Mode, year: i32, path: &Path, err: std::io::Error) -> ExportError {
        if is_lock_violation(&err) {
            ExportError::DocumentLocked {
                path: path.to_path_buf(),
                year,
                mode,
            }
        } else {
            ExportError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    fn classify_xlsx(&self, mode: Mode, year: i32, path: &Path, err: XlsxError) -> ExportError {
        match err {
            XlsxError::Io(io) => self.classify_io(mode, year, path, io),
            other => spreadsheet_error(path, other),
        }
    }
}

fn stamp_year(layout: &ModeLayout, doc: &mut YearDocument) -> Result<(), ExportError> {
    let cells = layout.year_marker_cells()?;
    if cells.is_empty() {
        return Ok(());
    }
    let value = CellValue::from(doc.year);
    for sheet in layout.sheet_names() {
        if !doc.has_sheet(&sheet) {
            let warning = ExportWarning::MissingYearMarkerSheet {
                sheet,
                path: doc.path.clone(),
            };
            tracing::warn!("{warning}");
            doc.warnings.push(warning);
            continue;
        }
        for cell in &cells {
            doc.write_cell(&sheet, *cell, &value)?;
        }
    }
    Ok(())
}

fn spreadsheet_error(path: &Path, err: XlsxError) -> ExportError {
    ExportError::Spreadsheet {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
