#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use trustbook_analysis::histogram::HistogramFigure;
use trustbook_analysis::{HistogramRenderer, PlotError, ReferenceMeasure};
use trustbook_model::{CellRef, CellValue, ErrorValue, Workbook, Worksheet};
use trustbook_xlsx::{read_workbook, write_workbook};

/// `#NUM!` as the generator writes it.
pub fn num() -> CellValue {
    CellValue::Error(ErrorValue::Num)
}

pub fn a1(s: &str) -> CellRef {
    CellRef::from_a1(s).unwrap()
}

/// One data row: fTi, fTa and the four reference values T(a)..T(d).
#[derive(Clone, Debug)]
pub struct Row {
    pub fti: CellValue,
    pub fta: CellValue,
    pub refs: [CellValue; 4],
}

impl Row {
    pub fn new(fti: impl Into<CellValue>, fta: impl Into<CellValue>, refs: [f64; 4]) -> Self {
        Self {
            fti: fti.into(),
            fta: fta.into(),
            refs: refs.map(CellValue::Number),
        }
    }
}

/// A trust sheet laid out like the generator's output.
pub fn trust_sheet(rows: &[Row]) -> Worksheet {
    let mut sheet = Worksheet::new("Trust");
    for (col, title) in ["Time", "Message", "#Arg", "#Rep", "fTi", "fTa"]
        .into_iter()
        .enumerate()
    {
        sheet.set_value(CellRef::new(0, col as u32), title);
    }
    for measure in ReferenceMeasure::ALL {
        let col = measure.column();
        sheet.set_value(CellRef::new(0, col - 1), format!("T({})", measure.key()));
        sheet.set_value(CellRef::new(1, col - 1), "iT");
        sheet.set_value(CellRef::new(1, col), "T");
    }

    for (i, row) in rows.iter().enumerate() {
        let r = 3 + i as u32;
        sheet.set_value(CellRef::at_row(r, 0), 1000.0 * f64::from(r));
        sheet.set_value(CellRef::at_row(r, 1), format!("message {i}"));
        sheet.set_value(CellRef::at_row(r, 4), row.fti.clone());
        sheet.set_value(CellRef::at_row(r, 5), row.fta.clone());
        for (measure, value) in ReferenceMeasure::ALL.iter().zip(&row.refs) {
            sheet.set_value(CellRef::at_row(r, measure.column()), value.clone());
        }
    }
    sheet
}

/// Write a workbook with an extra sheet ahead of the trust sheet.
pub fn write_fixture(dir: &Path, name: &str, rows: &[Row]) -> PathBuf {
    let mut overview = Worksheet::new("Overview");
    overview.set_value(a1("A1"), "conversation");
    overview.set_value(a1("B1"), 42.0);

    let mut wb = Workbook::new();
    wb.add_sheet(overview).unwrap();
    wb.add_sheet(trust_sheet(rows)).unwrap();

    let path = dir.join(name);
    write_workbook(&path, &wb).unwrap();
    path
}

pub fn reload_trust(path: &Path) -> Worksheet {
    read_workbook(path)
        .unwrap()
        .sheet("Trust")
        .unwrap()
        .clone()
}

/// Captures figures instead of drawing them; leaves an empty file at each target path.
#[derive(Default)]
pub struct RecordingRenderer {
    pub figures: Vec<(HistogramFigure, PathBuf)>,
}

impl HistogramRenderer for RecordingRenderer {
    fn render(&mut self, figure: &HistogramFigure, path: &Path) -> Result<(), PlotError> {
        fs::write(path, b"")?;
        self.figures.push((figure.clone(), path.to_path_buf()));
        Ok(())
    }
}
