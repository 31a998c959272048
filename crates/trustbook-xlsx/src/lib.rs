//! `.xlsx` import/export for [`trustbook_model::Workbook`].
//!
//! Reading goes through `calamine` for values, formula text and merged regions,
//! plus a `zip`/`quick-xml` pass over the styles and worksheet parts for cell
//! formatting and column widths. Writing goes through `rust_xlsxwriter` and
//! regenerates the full package from the model, including conditional formats.

use std::path::PathBuf;

use thiserror::Error;
use trustbook_model::AddSheetError;

mod read;
mod styles;
mod write;

pub use read::read_workbook;
pub use write::write_workbook;

#[derive(Debug, Error)]
pub enum XlsxIoError {
    #[error("failed to read workbook `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },
    #[error(transparent)]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Sheet(#[from] AddSheetError),
    #[error("column {col} in sheet `{sheet}` is beyond the writable range")]
    ColumnOutOfBounds { sheet: String, col: u32 },
}
