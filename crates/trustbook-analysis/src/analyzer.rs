use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trustbook_model::{CellRef, MergeError, Worksheet};

use crate::config::{AnalysisConfig, HistogramConfig};
use crate::histogram::{Histogram, HistogramFigure, HistogramPanel};
use crate::layout;
use crate::render::{HistogramRenderer, PlotError};
use crate::report::{AnalysisReport, ColumnReport, MeasureReport};
use crate::schema::{DiffColumn, ReferenceMeasure, TrustSchema, TrustSource, TrustValue};
use crate::stats::{summarize_abs, AbsDiffSummary, StatKind};
use crate::workbook::{TrustWorkbook, WorkbookError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error("failed to lay out derived columns: {0}")]
    Layout(#[from] MergeError),
    #[error("failed to create output directory `{path}`: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render `{path}`: {source}")]
    Plot {
        path: PathBuf,
        #[source]
        source: PlotError,
    },
}

/// The computed differences of one derived column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnAnalysis {
    pub column: DiffColumn,
    /// One entry per data row, top to bottom.
    pub values: Vec<TrustValue>,
    pub summary: Option<AbsDiffSummary>,
}

impl ColumnAnalysis {
    pub fn missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    pub fn histogram(&self, config: &HistogramConfig) -> Histogram {
        Histogram::from_values(self.values.iter().copied(), config)
    }
}

/// Both derived columns against one reference measure.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureAnalysis {
    pub measure: ReferenceMeasure,
    pub initial: ColumnAnalysis,
    pub actual: ColumnAnalysis,
}

impl MeasureAnalysis {
    pub fn figure(&self, config: &HistogramConfig) -> HistogramFigure {
        let panel = |c: &ColumnAnalysis| HistogramPanel {
            column: c.column,
            title: c.column.header(),
            histogram: c.histogram(config),
        };
        HistogramFigure {
            measure: self.measure,
            panels: [panel(&self.initial), panel(&self.actual)],
            x_range: (config.min, config.max),
            x_step: config.bin_width(),
            size: (config.width, config.height),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SheetAnalysis {
    pub data_rows: u32,
    pub measures: Vec<MeasureAnalysis>,
}

/// Fill `O..=V` with `source - T(x)` for every data row.
///
/// A missing estimate in `E` (or `F`) makes all four of its differences missing; a
/// missing reference value only affects its own difference.
pub fn fill_diff_columns(sheet: &mut Worksheet, schema: &TrustSchema) -> Vec<ColumnAnalysis> {
    let mut columns: Vec<ColumnAnalysis> = DiffColumn::all()
        .map(|column| ColumnAnalysis {
            column,
            values: Vec::with_capacity(schema.rows.len() as usize),
            summary: None,
        })
        .collect();

    for row in schema.rows.rows() {
        for column in &mut columns {
            let DiffColumn { source, measure } = column.column;
            let estimate = schema.read(sheet, row, source.column());
            let diff = match estimate {
                TrustValue::Missing => TrustValue::Missing,
                present => present.minus(schema.read(sheet, row, measure.column())),
            };
            sheet.set_value(CellRef::at_row(row, column.column.column()), diff.to_cell());
            column.values.push(diff);
        }
    }

    for column in &mut columns {
        column.summary = summarize_abs(column.values.iter().copied());
    }
    columns
}

/// Write the statistics of each derived column into the summary block.
///
/// A column without any present difference gets `#NUM!` for every statistic.
pub fn write_summary(sheet: &mut Worksheet, schema: &TrustSchema, columns: &[ColumnAnalysis]) {
    layout::apply_summary_layout(sheet, schema);
    for column in columns {
        for kind in StatKind::ALL {
            let value = match column.summary {
                Some(summary) => TrustValue::Present(summary.get(kind)),
                None => TrustValue::Missing,
            };
            let cell = CellRef::at_row(schema.summary_row(kind), column.column.column());
            sheet.set_value(cell, value.to_cell());
        }
    }
}

/// Lay out, compute and summarize the derived columns of an in-memory trust sheet.
pub fn analyze(
    sheet: &mut Worksheet,
    schema: &TrustSchema,
    config: &AnalysisConfig,
) -> Result<SheetAnalysis, MergeError> {
    layout::apply_diff_layout(sheet, schema.rows, config.diff_tolerance)?;
    let columns = fill_diff_columns(sheet, schema);
    write_summary(sheet, schema, &columns);

    let mut columns = columns.into_iter();
    let mut measures = Vec::with_capacity(ReferenceMeasure::ALL.len());
    // `DiffColumn::all` yields the fTi/fTa pair of each measure back to back.
    while let (Some(initial), Some(actual)) = (columns.next(), columns.next()) {
        debug_assert_eq!(initial.column.source, TrustSource::Initial);
        measures.push(MeasureAnalysis {
            measure: initial.column.measure,
            initial,
            actual,
        });
    }

    Ok(SheetAnalysis {
        data_rows: schema.rows.len(),
        measures,
    })
}

/// Analyse the workbook at `path`: derived columns, summary block, one histogram
/// image per reference measure in `output_dir`, then save the workbook in place.
pub fn run_analysis(
    path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    renderer: &mut impl HistogramRenderer,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let output_dir = output_dir.as_ref();
    let mut book = TrustWorkbook::open(path, config)?;

    let (sheet, schema) = book.parts_mut();
    let analysis = analyze(sheet, schema, config)?;
    log::debug!(
        "computed differences for {} rows of `{}`",
        analysis.data_rows,
        book.path().display()
    );

    fs::create_dir_all(output_dir).map_err(|source| AnalysisError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut measures = Vec::with_capacity(analysis.measures.len());
    for measure in &analysis.measures {
        let figure = measure.figure(&config.histogram);
        let image = output_dir.join(figure.file_name());
        renderer
            .render(&figure, &image)
            .map_err(|source| AnalysisError::Plot {
                path: image.clone(),
                source,
            })?;

        let [initial, actual] = &figure.panels;
        measures.push(MeasureReport {
            measure: measure.measure,
            image,
            initial: ColumnReport::new(&measure.initial, &initial.histogram),
            actual: ColumnReport::new(&measure.actual, &actual.histogram),
        });
    }

    book.save()?;
    log::info!(
        "analysed `{}` ({} rows, {} histograms)",
        book.path().display(),
        analysis.data_rows,
        measures.len()
    );

    Ok(AnalysisReport {
        workbook: book.path().to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        data_rows: analysis.data_rows,
        measures,
    })
}
