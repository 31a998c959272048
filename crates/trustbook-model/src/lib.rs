//! `trustbook-model` defines the in-memory spreadsheet structures the trust
//! editor and analyser operate on.
//!
//! The model is deliberately small: cell values (including spreadsheet error
//! values), per-cell formatting, merged regions, column widths and
//! fill-only conditional formatting rules. Reading and writing `.xlsx` files
//! lives in `trustbook-xlsx`.

mod address;
pub mod conditional_formatting;
mod style;
mod value;
mod workbook;
mod worksheet;

pub use address::{column_index, column_name, A1ParseError, CellRef, Range, MAX_COLS, MAX_ROWS};
pub use conditional_formatting::{resolve_fill, CellIsOperator, CfRule, CfRuleKind};
pub use style::{Border, BorderEdge, BorderStyle, Color, Font, HorizontalAlignment, Style};
pub use value::{CellValue, ErrorValue};
pub use workbook::{AddSheetError, Workbook};
pub use worksheet::{Cell, MergeError, Worksheet};
