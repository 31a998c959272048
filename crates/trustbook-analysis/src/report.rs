use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::analyzer::ColumnAnalysis;
use crate::histogram::{Bin, Histogram};
use crate::schema::ReferenceMeasure;
use crate::stats::AbsDiffSummary;

/// Outcome of analysing one workbook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub workbook: PathBuf,
    pub output_dir: PathBuf,
    pub data_rows: u32,
    pub measures: Vec<MeasureReport>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeasureReport {
    pub measure: ReferenceMeasure,
    pub image: PathBuf,
    pub initial: ColumnReport,
    pub actual: ColumnReport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnReport {
    pub header: String,
    pub present: usize,
    pub missing: usize,
    /// `None` when the column has no present value.
    pub summary: Option<AbsDiffSummary>,
    pub bins: Vec<Bin>,
    pub out_of_range: usize,
}

impl ColumnReport {
    pub fn new(column: &ColumnAnalysis, histogram: &Histogram) -> Self {
        let missing = column.missing();
        Self {
            header: column.column.header(),
            present: column.values.len() - missing,
            missing,
            summary: column.summary,
            bins: histogram.bins.clone(),
            out_of_range: histogram.out_of_range,
        }
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} data rows, histograms in {}",
            self.workbook.display(),
            self.data_rows,
            self.output_dir.display()
        )?;
        for measure in &self.measures {
            for column in [&measure.initial, &measure.actual] {
                write!(f, "  {:<12}", column.header)?;
                match &column.summary {
                    Some(s) => writeln!(
                        f,
                        " mean {:.4}  var {:.4}  sd {:.4}  (n={}, missing={})",
                        s.mean, s.variance, s.std_dev, s.count, column.missing
                    )?,
                    None => writeln!(f, " no values (missing={})", column.missing)?,
                }
            }
        }
        Ok(())
    }
}
