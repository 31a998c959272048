use std::path::{Path, PathBuf};

use thiserror::Error;
use trustbook_model::{CellRef, MergeError, Workbook, Worksheet};
use trustbook_xlsx::{read_workbook, write_workbook, XlsxIoError};

use crate::config::{AnalysisConfig, ConfigError};
use crate::layout;
use crate::schema::{SchemaError, TrustSchema, TrustSource};

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),
    #[error("`{path}`: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
    #[error("`{path}`: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: MergeError,
    },
}

/// A workbook file opened for editing its trust sheet.
///
/// The whole workbook is kept in memory and [`save`](Self::save) rewrites the file in place.
#[derive(Debug)]
pub struct TrustWorkbook {
    path: PathBuf,
    workbook: Workbook,
    sheet: usize,
    schema: TrustSchema,
}

impl TrustWorkbook {
    /// Load `path`, validate the trust sheet and restore its conditional formats.
    ///
    /// Conditional formats are not read back from the file, so the rules the editor
    /// and analyser own are re-derived from the sheet content.
    pub fn open(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Self, WorkbookError> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let workbook = read_workbook(&path)?;
        let sheet = workbook
            .sheet_index(&config.sheet_name)
            .ok_or_else(|| WorkbookError::Schema {
                path: path.clone(),
                source: SchemaError::MissingSheet {
                    name: config.sheet_name.clone(),
                },
            })?;
        let schema = TrustSchema::validate(&workbook.sheets()[sheet]).map_err(|source| {
            WorkbookError::Schema {
                path: path.clone(),
                source,
            }
        })?;

        let mut book = Self {
            path,
            workbook,
            sheet,
            schema,
        };
        book.restore_layout(config)?;
        log::debug!(
            "opened `{}` ({} data rows)",
            book.path.display(),
            book.schema.rows.len()
        );
        Ok(book)
    }

    fn restore_layout(&mut self, config: &AnalysisConfig) -> Result<(), WorkbookError> {
        let schema = self.schema;
        let sheet = self.sheet_mut();

        let has_estimates = schema.rows.rows().any(|row| {
            TrustSource::ALL
                .iter()
                .any(|s| !sheet.value(CellRef::at_row(row, s.column())).is_empty())
        });
        if has_estimates {
            layout::apply_trust_coloring(sheet, schema.rows);
        }
        if layout::has_diff_layout(sheet) {
            let restored = layout::apply_diff_layout(sheet, schema.rows, config.diff_tolerance);
            restored.map_err(|source| WorkbookError::Layout {
                path: self.path.clone(),
                source,
            })?;
        }
        let sheet = self.sheet_mut();
        if layout::has_summary_layout(sheet, &schema) {
            layout::apply_summary_layout(sheet, &schema);
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.workbook.sheets_mut()[self.sheet]
    }

    /// The trust sheet together with its schema, for edits that need both.
    pub fn parts_mut(&mut self) -> (&mut Worksheet, &TrustSchema) {
        (&mut self.workbook.sheets_mut()[self.sheet], &self.schema)
    }

    /// Rewrite the whole workbook to its original path.
    pub fn save(&self) -> Result<(), WorkbookError> {
        write_workbook(&self.path, &self.workbook)?;
        log::debug!("saved `{}`", self.path.display());
        Ok(())
    }
}
