//! Trust worksheet editing and analysis.
//!
//! The [`editor`] populates and validates the `fTi`/`fTa` estimate columns; the
//! [`analyzer`] derives the per-row differences against the four reference
//! measures, writes the summary statistics and renders one histogram figure per
//! measure. Both work on a [`TrustWorkbook`], which loads the whole file into
//! memory and rewrites it in place on save.

pub mod analyzer;
pub mod config;
pub mod editor;
pub mod histogram;
pub mod layout;
pub mod render;
pub mod report;
pub mod schema;
pub mod stats;
mod workbook;

pub use analyzer::{analyze, run_analysis, AnalysisError, SheetAnalysis};
pub use config::{AnalysisConfig, ConfigError, HistogramConfig};
pub use editor::{insert_fta, insert_fti, insert_random_values, insert_trust, EditError};
pub use histogram::{BinSeverity, HistogramFigure};
pub use render::{BitmapRenderer, HistogramRenderer, PlotError};
pub use report::AnalysisReport;
pub use schema::{ReferenceMeasure, SchemaError, TrustSchema, TrustSource, TrustValue};
pub use workbook::{TrustWorkbook, WorkbookError};
