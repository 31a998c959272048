//! Population and validated single-cell updates of the fTi/fTa columns.

use std::path::Path;

use rand::Rng;
use thiserror::Error;
use trustbook_model::{CellRef, Worksheet};

use crate::config::AnalysisConfig;
use crate::layout::apply_trust_coloring;
use crate::schema::{TrustSchema, TrustSource, FIRST_DATA_ROW};
use crate::workbook::{TrustWorkbook, WorkbookError};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("value must be between -1 and 1")]
    ValueOutOfRange { value: f64 },
    #[error("info id {info_id} targets row {row}, past the last populated row {last_row}")]
    IndexOutOfRange { info_id: u32, row: u32, last_row: u32 },
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

/// Overwrite `E` and `F` of every data row with uniform values in `[-1, 1]`.
///
/// Returns the number of rows written.
pub fn randomize<R: Rng>(sheet: &mut Worksheet, schema: &TrustSchema, rng: &mut R) -> u32 {
    apply_trust_coloring(sheet, schema.rows);
    for row in schema.rows.rows() {
        for source in TrustSource::ALL {
            let u: f64 = rng.random();
            sheet.set_value(schema.trust_cell(row, source), 2.0 * u - 1.0);
        }
    }
    schema.rows.len()
}

/// Write one validated trust value at `info_id` (0 is the first data row).
///
/// The sign coloring is applied before validation, so it is present even when the
/// edit is rejected.
pub fn set_trust_value(
    sheet: &mut Worksheet,
    schema: &TrustSchema,
    source: TrustSource,
    value: f64,
    info_id: u32,
) -> Result<CellRef, EditError> {
    apply_trust_coloring(sheet, schema.rows);

    if !(-1.0..=1.0).contains(&value) {
        return Err(EditError::ValueOutOfRange { value });
    }
    let row = info_id.saturating_add(FIRST_DATA_ROW);
    if row > schema.rows.last() {
        return Err(EditError::IndexOutOfRange {
            info_id,
            row,
            last_row: schema.rows.last(),
        });
    }

    let cell = schema.trust_cell(row, source);
    sheet.set_value(cell, value);
    Ok(cell)
}

/// Randomize the fTi/fTa columns of the workbook at `path` and save it.
pub fn insert_random_values<R: Rng>(
    path: impl AsRef<Path>,
    rng: &mut R,
    config: &AnalysisConfig,
) -> Result<u32, WorkbookError> {
    let mut book = TrustWorkbook::open(path, config)?;
    let (sheet, schema) = book.parts_mut();
    let rows = randomize(sheet, schema, rng);
    book.save()?;
    log::info!("randomized {rows} rows in `{}`", book.path().display());
    Ok(rows)
}

/// Validated single-cell update of the workbook at `path`.
///
/// The workbook is saved before a validation error is returned.
pub fn insert_trust(
    path: impl AsRef<Path>,
    source: TrustSource,
    value: f64,
    info_id: u32,
    config: &AnalysisConfig,
) -> Result<CellRef, EditError> {
    let mut book = TrustWorkbook::open(path, config)?;
    let (sheet, schema) = book.parts_mut();
    let outcome = set_trust_value(sheet, schema, source, value, info_id);
    book.save()?;
    match &outcome {
        Ok(cell) => log::info!("set {} {cell} = {value} in `{}`", source.label(), book.path().display()),
        Err(err) => log::warn!("rejected {} update in `{}`: {err}", source.label(), book.path().display()),
    }
    outcome
}

pub fn insert_fti(
    path: impl AsRef<Path>,
    value: f64,
    info_id: u32,
    config: &AnalysisConfig,
) -> Result<CellRef, EditError> {
    insert_trust(path, TrustSource::Initial, value, info_id, config)
}

pub fn insert_fta(
    path: impl AsRef<Path>,
    value: f64,
    info_id: u32,
    config: &AnalysisConfig,
) -> Result<CellRef, EditError> {
    insert_trust(path, TrustSource::Actual, value, info_id, config)
}
