//! Formatting owned by the trust sheet: conditional coloring, the derived-column
//! headers and the summary block decoration.
//!
//! Every function here is idempotent, so it can run on each load and on each
//! edit without stacking rules or styles.

use trustbook_model::{
    BorderEdge, BorderStyle, CellIsOperator, CellRef, CfRule, Color, HorizontalAlignment,
    MergeError, Range, Worksheet,
};

use crate::schema::{
    DiffColumn, ReferenceMeasure, RowSpan, TrustSchema, TrustSource, SUMMARY_LABEL_COLUMN,
};
use crate::stats::StatKind;

pub const RED: Color = Color::rgb(0xFF5F5F);
pub const GREEN: Color = Color::rgb(0x339966);
pub const YELLOW: Color = Color::rgb(0xFFF59E);

/// Signed two-decimal format of the difference cells.
pub const DIFF_NUMBER_FORMAT: &str = "+0.00;-0.00;0.00";

const TITLE_FONT_PT: f64 = 18.0;

fn not_a_number(range: Range) -> CfRule {
    let formula = format!("NOT(ISNUMBER({}))", range.start.to_a1());
    CfRule::expression(range, formula, YELLOW)
}

/// Sign coloring of trust estimates, in priority order.
///
/// The non-numeric rule comes first so text markers never reach the numeric comparisons.
pub fn trust_rules(range: Range) -> [CfRule; 4] {
    [
        not_a_number(range),
        CfRule::cell_is(range, CellIsOperator::LessThan, &[0.0], RED),
        CfRule::cell_is(range, CellIsOperator::GreaterThan, &[0.0], GREEN),
        CfRule::cell_is(range, CellIsOperator::Equal, &[0.0], YELLOW),
    ]
}

/// Pass/fail coloring of differences against `tolerance`, in priority order.
pub fn diff_rules(range: Range, tolerance: f64) -> [CfRule; 3] {
    let bounds = [-tolerance, tolerance];
    [
        not_a_number(range),
        CfRule::cell_is(range, CellIsOperator::NotBetween, &bounds, RED),
        CfRule::cell_is(range, CellIsOperator::Between, &bounds, GREEN),
    ]
}

/// Add the sign coloring to `E3:F{l}`. Returns the number of rules that were not already present.
pub fn apply_trust_coloring(sheet: &mut Worksheet, rows: RowSpan) -> usize {
    let Some(range) = rows.cells(TrustSource::Initial.column(), TrustSource::Actual.column())
    else {
        return 0;
    };
    trust_rules(range)
        .into_iter()
        .filter(|rule| sheet.add_conditional_format(rule.clone()))
        .count()
}

fn medium_left(color: Color) -> Option<BorderEdge> {
    Some(BorderEdge::new(BorderStyle::Medium, color))
}

fn first_diff_column() -> u32 {
    DiffColumn::new(TrustSource::Initial, ReferenceMeasure::A).column()
}

fn last_diff_column() -> u32 {
    DiffColumn::new(TrustSource::Actual, ReferenceMeasure::D).column()
}

/// Headers, cell formatting and pass/fail coloring of the derived columns `O..=V`.
pub fn apply_diff_layout(
    sheet: &mut Worksheet,
    rows: RowSpan,
    tolerance: f64,
) -> Result<(), MergeError> {
    for measure in ReferenceMeasure::ALL {
        let left = DiffColumn::new(TrustSource::Initial, measure).column();
        let title = CellRef::new(0, left);
        sheet.merge_range(Range::new(title, CellRef::new(0, left + 1)))?;
        sheet.set_value(title, format!("diffs({})", measure.key()));
        sheet.style_mut(title).font.set_size_pt(TITLE_FONT_PT);
    }

    for column in DiffColumn::all() {
        let col = column.column();
        sheet.set_value(CellRef::new(1, col), column.header());
        for header_row in 0..2 {
            let style = sheet.style_mut(CellRef::new(header_row, col));
            style.alignment = HorizontalAlignment::Center;
            if column.starts_group() {
                style.border.left = medium_left(Color::black());
            }
        }

        for row in rows.rows() {
            let style = sheet.style_mut(CellRef::at_row(row, col));
            style.alignment = HorizontalAlignment::Center;
            style.number_format = Some(DIFF_NUMBER_FORMAT.to_string());
            if column.starts_group() {
                style.border.left = medium_left(Color::white());
            }
        }
    }

    if let Some(range) = rows.cells(first_diff_column(), last_diff_column()) {
        for rule in diff_rules(range, tolerance) {
            sheet.add_conditional_format(rule);
        }
    }
    Ok(())
}

/// Labels and cell formatting of the summary block below the data.
pub fn apply_summary_layout(sheet: &mut Worksheet, schema: &TrustSchema) {
    for kind in StatKind::ALL {
        let row = schema.summary_row(kind);
        let label = CellRef::at_row(row, SUMMARY_LABEL_COLUMN);
        sheet.set_value(label, kind.label());
        sheet.style_mut(label).alignment = HorizontalAlignment::Right;

        for column in DiffColumn::all() {
            let style = sheet.style_mut(CellRef::at_row(row, column.column()));
            style.alignment = HorizontalAlignment::Center;
            if column.starts_group() {
                style.border.left = medium_left(Color::black());
            }
        }
    }

    let width = StatKind::ALL
        .iter()
        .map(|k| k.label().chars().count())
        .max()
        .unwrap_or_default();
    sheet.set_column_width(SUMMARY_LABEL_COLUMN, width as f64);
}

/// Whether the derived-column headers were written by an earlier analysis.
pub fn has_diff_layout(sheet: &Worksheet) -> bool {
    sheet.value(CellRef::new(0, first_diff_column())).as_str() == Some("diffs(a)")
}

/// Whether the summary block labels were written by an earlier analysis.
pub fn has_summary_layout(sheet: &Worksheet, schema: &TrustSchema) -> bool {
    let cell = CellRef::at_row(schema.summary_row(StatKind::Mean), SUMMARY_LABEL_COLUMN);
    sheet.value(cell).as_str() == Some(StatKind::Mean.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trustbook_model::{CellValue, ErrorValue};

    fn a1(s: &str) -> CellRef {
        CellRef::from_a1(s).unwrap()
    }

    #[test]
    fn trust_coloring_classifies_signs_and_markers() {
        let mut sheet = Worksheet::new("Trust");
        sheet.set_value(a1("E3"), -0.4);
        sheet.set_value(a1("F3"), 0.4);
        sheet.set_value(a1("E4"), 0.0);
        sheet.set_value(a1("F4"), ErrorValue::Num);
        sheet.set_value(a1("E5"), CellValue::String("#NUM!".into()));

        assert_eq!(apply_trust_coloring(&mut sheet, RowSpan::new(5)), 4);
        assert_eq!(apply_trust_coloring(&mut sheet, RowSpan::new(5)), 0);
        assert_eq!(sheet.conditional_formats().len(), 4);

        assert_eq!(sheet.conditional_fill(a1("E3")), Some(RED));
        assert_eq!(sheet.conditional_fill(a1("F3")), Some(GREEN));
        assert_eq!(sheet.conditional_fill(a1("E4")), Some(YELLOW));
        assert_eq!(sheet.conditional_fill(a1("F4")), Some(YELLOW));
        assert_eq!(sheet.conditional_fill(a1("E5")), Some(YELLOW));
        // Outside E3:F5.
        assert_eq!(sheet.conditional_fill(a1("E6")), None);
    }

    #[test]
    fn trust_coloring_needs_data_rows() {
        let mut sheet = Worksheet::new("Trust");
        assert_eq!(apply_trust_coloring(&mut sheet, RowSpan::new(2)), 0);
        assert!(sheet.conditional_formats().is_empty());
    }

    #[test]
    fn diff_layout_writes_headers_and_borders() {
        let mut sheet = Worksheet::new("Trust");
        apply_diff_layout(&mut sheet, RowSpan::new(4), 0.5).unwrap();
        apply_diff_layout(&mut sheet, RowSpan::new(4), 0.5).unwrap();

        assert_eq!(
            sheet.merged_regions(),
            &[
                Range::from_a1("O1:P1").unwrap(),
                Range::from_a1("Q1:R1").unwrap(),
                Range::from_a1("S1:T1").unwrap(),
                Range::from_a1("U1:V1").unwrap(),
            ]
        );
        assert_eq!(sheet.value(a1("S1")).as_str(), Some("diffs(c)"));
        assert_eq!(sheet.value(a1("V2")).as_str(), Some("fTa - T(d)"));
        assert_eq!(sheet.style(a1("O1")).unwrap().font.size_pt(), Some(18.0));
        assert!(has_diff_layout(&sheet));

        let header = sheet.style(a1("Q2")).unwrap();
        assert_eq!(header.border.left, medium_left(Color::black()));
        assert_eq!(sheet.style(a1("R2")).unwrap().border.left, None);

        let data = sheet.style(a1("U4")).unwrap();
        assert_eq!(data.alignment, HorizontalAlignment::Center);
        assert_eq!(data.number_format.as_deref(), Some(DIFF_NUMBER_FORMAT));
        assert_eq!(data.border.left, medium_left(Color::white()));

        assert_eq!(sheet.conditional_formats().len(), 3);
    }

    #[test]
    fn diff_coloring_uses_the_tolerance() {
        let mut sheet = Worksheet::new("Trust");
        apply_diff_layout(&mut sheet, RowSpan::new(3), 0.5).unwrap();
        sheet.set_value(a1("O3"), 0.5);
        sheet.set_value(a1("P3"), -0.51);
        sheet.set_value(a1("Q3"), ErrorValue::Num);
        assert_eq!(sheet.conditional_fill(a1("O3")), Some(GREEN));
        assert_eq!(sheet.conditional_fill(a1("P3")), Some(RED));
        assert_eq!(sheet.conditional_fill(a1("Q3")), Some(YELLOW));
    }

    #[test]
    fn summary_layout_labels_rows_below_the_data() {
        let mut sheet = Worksheet::new("Trust");
        let schema = TrustSchema {
            rows: RowSpan::new(5),
        };
        apply_summary_layout(&mut sheet, &schema);

        assert_eq!(sheet.value(a1("N8")).as_str(), Some("Mean of |fT_ - F(mode)|"));
        assert_eq!(
            sheet.value(a1("N10")).as_str(),
            Some("Standard deviation of |fT_ - F(mode)|")
        );
        assert_eq!(
            sheet.style(a1("N9")).unwrap().alignment,
            HorizontalAlignment::Right
        );
        assert_eq!(sheet.column_widths().collect::<Vec<_>>(), vec![(13, 37.0)]);
        assert_eq!(
            sheet.style(a1("S9")).unwrap().border.left,
            medium_left(Color::black())
        );
        assert!(has_summary_layout(&sheet, &schema));
    }
}
