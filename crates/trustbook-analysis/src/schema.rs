//! Positional layout of the trust worksheet.
//!
//! Columns are fixed: `A` marks populated rows, `E`/`F` hold the initial and
//! actual trust estimates, `H`/`J`/`L`/`N` the four reference measures, and
//! `O..=V` the derived differences. Rows 1-2 are headers; data starts at row 3.

use serde::Serialize;
use thiserror::Error;
use trustbook_model::{CellRef, CellValue, ErrorValue, Range, Worksheet};

use crate::stats::StatKind;

/// First data row (1-based).
pub const FIRST_DATA_ROW: u32 = 3;

/// Column whose populated cells determine the sheet length.
pub const ROW_MARKER_COLUMN: u32 = 0;
/// First derived difference column (`O`).
pub const FIRST_DIFF_COLUMN: u32 = 14;
/// Column holding the summary block labels (`N`).
pub const SUMMARY_LABEL_COLUMN: u32 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("workbook has no `{name}` sheet")]
    MissingSheet { name: String },
    #[error("expected `{expected}` in {cell}, found `{found}`")]
    UnexpectedHeader {
        cell: String,
        expected: &'static str,
        found: String,
    },
    #[error("reference measure T({key}) has no header in {cell}")]
    MissingReferenceHeader { key: &'static str, cell: String },
}

/// Which trust estimate a value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustSource {
    /// `fTi`, column `E`.
    Initial,
    /// `fTa`, column `F`.
    Actual,
}

impl TrustSource {
    pub const ALL: [TrustSource; 2] = [TrustSource::Initial, TrustSource::Actual];

    pub const fn column(self) -> u32 {
        match self {
            TrustSource::Initial => 4,
            TrustSource::Actual => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TrustSource::Initial => "fTi",
            TrustSource::Actual => "fTa",
        }
    }

    const fn offset(self) -> u32 {
        match self {
            TrustSource::Initial => 0,
            TrustSource::Actual => 1,
        }
    }
}

/// One of the four externally sourced reference trust measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMeasure {
    A,
    B,
    C,
    D,
}

impl ReferenceMeasure {
    pub const ALL: [ReferenceMeasure; 4] = [
        ReferenceMeasure::A,
        ReferenceMeasure::B,
        ReferenceMeasure::C,
        ReferenceMeasure::D,
    ];

    pub const fn index(self) -> u32 {
        match self {
            ReferenceMeasure::A => 0,
            ReferenceMeasure::B => 1,
            ReferenceMeasure::C => 2,
            ReferenceMeasure::D => 3,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            ReferenceMeasure::A => "a",
            ReferenceMeasure::B => "b",
            ReferenceMeasure::C => "c",
            ReferenceMeasure::D => "d",
        }
    }

    /// `H`, `J`, `L`, `N`.
    pub const fn column(self) -> u32 {
        7 + 2 * self.index()
    }
}

/// A derived `source - T(measure)` column in `O..=V`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DiffColumn {
    pub source: TrustSource,
    pub measure: ReferenceMeasure,
}

impl DiffColumn {
    pub const fn new(source: TrustSource, measure: ReferenceMeasure) -> Self {
        Self { source, measure }
    }

    /// All eight columns in worksheet order (`O` through `V`).
    pub fn all() -> impl Iterator<Item = DiffColumn> {
        ReferenceMeasure::ALL.into_iter().flat_map(|measure| {
            TrustSource::ALL
                .into_iter()
                .map(move |source| DiffColumn::new(source, measure))
        })
    }

    pub const fn column(self) -> u32 {
        FIRST_DIFF_COLUMN + 2 * self.measure.index() + self.source.offset()
    }

    /// The left column of each measure's pair carries the group separator border.
    pub const fn starts_group(self) -> bool {
        matches!(self.source, TrustSource::Initial)
    }

    /// Row-2 sub-header, also the histogram panel title.
    pub fn header(self) -> String {
        format!("{} - T({})", self.source.label(), self.measure.key())
    }
}

/// The data rows of a sheet: row 3 through the last populated row of column `A`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RowSpan {
    last: u32,
}

impl RowSpan {
    /// `last_populated` is 1-based; anything before the first data row yields an empty span.
    pub const fn new(last_populated: u32) -> Self {
        let header_end = FIRST_DATA_ROW - 1;
        Self {
            last: if last_populated < header_end {
                header_end
            } else {
                last_populated
            },
        }
    }

    pub fn of_sheet(sheet: &Worksheet) -> Self {
        Self::new(
            sheet
                .last_row_in_column(ROW_MARKER_COLUMN)
                .map_or(0, |row| row + 1),
        )
    }

    /// 1-based last populated row (`l`); at least the last header row.
    pub const fn last(self) -> u32 {
        self.last
    }

    pub const fn len(self) -> u32 {
        self.last + 1 - FIRST_DATA_ROW
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub const fn contains(self, row: u32) -> bool {
        row >= FIRST_DATA_ROW && row <= self.last
    }

    /// 1-based data rows.
    pub fn rows(self) -> std::ops::RangeInclusive<u32> {
        FIRST_DATA_ROW..=self.last
    }

    /// The data rows of columns `first_col..=last_col`, or `None` when there are no data rows.
    pub fn cells(self, first_col: u32, last_col: u32) -> Option<Range> {
        (!self.is_empty()).then(|| {
            Range::new(
                CellRef::at_row(FIRST_DATA_ROW, first_col),
                CellRef::at_row(self.last, last_col),
            )
        })
    }
}

/// A numeric trust cell, or the `#NUM!` "no value" marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TrustValue {
    Present(f64),
    Missing,
}

impl TrustValue {
    /// Anything that is not a finite number reads as missing.
    pub fn from_cell(value: &CellValue) -> Self {
        match value.as_number() {
            Some(n) if n.is_finite() => TrustValue::Present(n),
            _ => TrustValue::Missing,
        }
    }

    pub fn to_cell(self) -> CellValue {
        match self {
            TrustValue::Present(n) => CellValue::Number(n),
            TrustValue::Missing => CellValue::Error(ErrorValue::Num),
        }
    }

    pub const fn as_f64(self) -> Option<f64> {
        match self {
            TrustValue::Present(n) => Some(n),
            TrustValue::Missing => None,
        }
    }

    pub const fn is_missing(self) -> bool {
        matches!(self, TrustValue::Missing)
    }

    /// `self - other`; missing on either side gives missing.
    pub fn minus(self, other: TrustValue) -> TrustValue {
        match (self, other) {
            (TrustValue::Present(a), TrustValue::Present(b)) => TrustValue::Present(a - b),
            _ => TrustValue::Missing,
        }
    }
}

/// Validated view of the trust sheet's structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrustSchema {
    pub rows: RowSpan,
}

impl TrustSchema {
    /// Check the fixed headers and measure the data rows.
    pub fn validate(sheet: &Worksheet) -> Result<Self, SchemaError> {
        for source in TrustSource::ALL {
            let cell = CellRef::new(0, source.column());
            let found = header_text(sheet, cell);
            if !found.eq_ignore_ascii_case(source.label()) {
                return Err(SchemaError::UnexpectedHeader {
                    cell: cell.to_a1(),
                    expected: source.label(),
                    found,
                });
            }
        }
        for measure in ReferenceMeasure::ALL {
            let cell = CellRef::new(1, measure.column());
            if header_text(sheet, cell).is_empty() {
                return Err(SchemaError::MissingReferenceHeader {
                    key: measure.key(),
                    cell: cell.to_a1(),
                });
            }
        }
        Ok(Self {
            rows: RowSpan::of_sheet(sheet),
        })
    }

    pub fn trust_cell(&self, row: u32, source: TrustSource) -> CellRef {
        CellRef::at_row(row, source.column())
    }

    pub fn read(&self, sheet: &Worksheet, row: u32, col: u32) -> TrustValue {
        TrustValue::from_cell(sheet.value(CellRef::at_row(row, col)))
    }

    /// 1-based row of a statistic in the summary block (`l+3..=l+5`).
    pub fn summary_row(&self, kind: StatKind) -> u32 {
        self.rows.last() + 3 + kind.index()
    }
}

fn header_text(sheet: &Worksheet, cell: CellRef) -> String {
    match sheet.value(cell) {
        CellValue::Empty => String::new(),
        CellValue::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trustbook_model::column_name;

    #[test]
    fn diff_columns_run_o_through_v() {
        let names: Vec<String> = DiffColumn::all().map(|c| column_name(c.column())).collect();
        assert_eq!(names, ["O", "P", "Q", "R", "S", "T", "U", "V"]);
        let headers: Vec<String> = DiffColumn::all().take(2).map(DiffColumn::header).collect();
        assert_eq!(headers, ["fTi - T(a)", "fTa - T(a)"]);
    }

    #[test]
    fn reference_columns_are_h_j_l_n() {
        let names: Vec<String> = ReferenceMeasure::ALL
            .iter()
            .map(|m| column_name(m.column()))
            .collect();
        assert_eq!(names, ["H", "J", "L", "N"]);
    }

    #[test]
    fn row_span_bounds() {
        let span = RowSpan::new(7);
        assert_eq!(span.len(), 5);
        assert!(span.contains(3) && span.contains(7));
        assert!(!span.contains(2) && !span.contains(8));

        assert!(RowSpan::new(0).is_empty());
        assert!(RowSpan::new(2).is_empty());
        assert_eq!(RowSpan::new(1).last(), 2);
    }

    #[test]
    fn trust_values_round_trip_through_cells() {
        assert_eq!(TrustValue::from_cell(&CellValue::Number(0.5)), TrustValue::Present(0.5));
        assert_eq!(TrustValue::from_cell(&CellValue::Error(ErrorValue::Num)), TrustValue::Missing);
        assert_eq!(TrustValue::from_cell(&CellValue::String("#NUM!".into())), TrustValue::Missing);
        assert_eq!(TrustValue::from_cell(&CellValue::Number(f64::NAN)), TrustValue::Missing);
        assert_eq!(TrustValue::Missing.to_cell(), CellValue::Error(ErrorValue::Num));
        assert_eq!(
            TrustValue::Present(0.75).minus(TrustValue::Present(0.25)),
            TrustValue::Present(0.5)
        );
        assert_eq!(TrustValue::Present(0.75).minus(TrustValue::Missing), TrustValue::Missing);
    }

    fn headed_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Trust");
        sheet.set_value(CellRef::new(0, 0), "Time");
        sheet.set_value(CellRef::new(0, 4), "fTi");
        sheet.set_value(CellRef::new(0, 5), "fTa");
        for measure in ReferenceMeasure::ALL {
            sheet.set_value(CellRef::new(1, measure.column()), "T");
        }
        sheet
    }

    #[test]
    fn validate_measures_rows_from_column_a() {
        let mut sheet = headed_sheet();
        for row in 3..=6 {
            sheet.set_value(CellRef::at_row(row, 0), f64::from(row));
        }
        let schema = TrustSchema::validate(&sheet).unwrap();
        assert_eq!(schema.rows.last(), 6);
        assert_eq!(schema.summary_row(StatKind::Mean), 9);
        assert_eq!(schema.summary_row(StatKind::StdDev), 11);
    }

    #[test]
    fn validate_rejects_wrong_headers() {
        let mut sheet = headed_sheet();
        sheet.set_value(CellRef::new(0, 5), "Actual");
        assert_eq!(
            TrustSchema::validate(&sheet),
            Err(SchemaError::UnexpectedHeader {
                cell: "F1".into(),
                expected: "fTa",
                found: "Actual".into(),
            })
        );

        let mut sheet = headed_sheet();
        sheet.set_value(CellRef::new(1, 11), CellValue::Empty);
        assert!(matches!(
            TrustSchema::validate(&sheet),
            Err(SchemaError::MissingReferenceHeader { key: "c", .. })
        ));
    }

    #[test]
    fn data_cells_cover_rows_three_to_last() {
        assert_eq!(
            RowSpan::new(12).cells(4, 5),
            Some(Range::from_a1("E3:F12").unwrap())
        );
        assert_eq!(RowSpan::new(2).cells(4, 5), None);
    }
}
