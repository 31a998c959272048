use std::path::Path;

use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, ConditionalFormatFormula, Format,
    FormatAlign, FormatBorder, Formula,
};
use trustbook_model::{
    BorderStyle, CellIsOperator, CellRef, CellValue, CfRule, CfRuleKind, HorizontalAlignment,
    Range, Style, Workbook, Worksheet,
};

use crate::XlsxIoError;

/// Write `workbook` to `path`, replacing any existing file.
///
/// The whole package is regenerated from the model: values, formulas, cell
/// formatting, merged regions, column widths and conditional formats.
pub fn write_workbook(path: impl AsRef<Path>, workbook: &Workbook) -> Result<(), XlsxIoError> {
    let path = path.as_ref();
    let mut out = rust_xlsxwriter::Workbook::new();
    for sheet in workbook.sheets() {
        let mut ws = rust_xlsxwriter::Worksheet::new();
        ws.set_name(sheet.name())?;
        write_sheet(&mut ws, sheet)?;
        out.push_worksheet(ws);
    }
    out.save(path)?;
    log::debug!(
        "saved {} sheet(s) to `{}`",
        workbook.sheets().len(),
        path.display()
    );
    Ok(())
}

fn write_sheet(ws: &mut rust_xlsxwriter::Worksheet, sheet: &Worksheet) -> Result<(), XlsxIoError> {
    for (col, width) in sheet.column_widths() {
        ws.set_column_width(col_num(sheet, col)?, width)?;
    }

    // Merges go first: `merge_range` writes the anchor, which the cell pass then overwrites
    // with the real value and formatting.
    for region in sheet.merged_regions() {
        let (r1, c1) = (region.start.row, col_num(sheet, region.start.col)?);
        let (r2, c2) = (region.end.row, col_num(sheet, region.end.col)?);
        let format = sheet.style(region.start).map(cell_format).unwrap_or_else(Format::new);
        ws.merge_range(r1, c1, r2, c2, "", &format)?;
    }

    for (cell, stored) in sheet.iter_cells() {
        if is_merge_interior(sheet.merged_regions(), cell) {
            continue;
        }
        let (row, col) = (cell.row, col_num(sheet, cell.col)?);
        let format = cell_format(&stored.style);

        if let Some(formula) = &stored.formula {
            let formula = Formula::new(formula).set_result(stored.value.to_string());
            ws.write_formula_with_format(row, col, formula, &format)?;
            continue;
        }

        match &stored.value {
            CellValue::Empty => {
                ws.write_blank(row, col, &format)?;
            }
            CellValue::Number(n) => {
                ws.write_number_with_format(row, col, *n, &format)?;
            }
            CellValue::String(s) => {
                ws.write_string_with_format(row, col, s, &format)?;
            }
            CellValue::Boolean(b) => {
                ws.write_boolean_with_format(row, col, *b, &format)?;
            }
            CellValue::Error(err) => {
                // There is no literal error cell in the writer API; an error-constant formula
                // with the matching cached result reads back as a native error everywhere.
                let formula = Formula::new(format!("={}", err.as_str())).set_result(err.as_str());
                ws.write_formula_with_format(row, col, formula, &format)?;
            }
        }
    }

    for rule in sheet.conditional_formats() {
        write_conditional_format(ws, sheet, rule)?;
    }

    Ok(())
}

fn write_conditional_format(
    ws: &mut rust_xlsxwriter::Worksheet,
    sheet: &Worksheet,
    rule: &CfRule,
) -> Result<(), XlsxIoError> {
    let Range { start, end } = rule.applies_to;
    let (c1, c2) = (col_num(sheet, start.col)?, col_num(sheet, end.col)?);
    let format = Format::new().set_background_color(Color::RGB(rule.fill.rgb_value()));

    match &rule.kind {
        CfRuleKind::CellIs { operator, operands } => {
            let a = operands.first().copied().unwrap_or_default();
            let b = operands.get(1).copied().unwrap_or_default();
            let cell_rule = match operator {
                CellIsOperator::GreaterThan => ConditionalFormatCellRule::GreaterThan(a),
                CellIsOperator::GreaterThanOrEqual => {
                    ConditionalFormatCellRule::GreaterThanOrEqualTo(a)
                }
                CellIsOperator::LessThan => ConditionalFormatCellRule::LessThan(a),
                CellIsOperator::LessThanOrEqual => ConditionalFormatCellRule::LessThanOrEqualTo(a),
                CellIsOperator::Equal => ConditionalFormatCellRule::EqualTo(a),
                CellIsOperator::NotEqual => ConditionalFormatCellRule::NotEqualTo(a),
                CellIsOperator::Between => ConditionalFormatCellRule::Between(a, b),
                CellIsOperator::NotBetween => ConditionalFormatCellRule::NotBetween(a, b),
            };
            let cf = ConditionalFormatCell::new()
                .set_rule(cell_rule)
                .set_format(&format)
                .set_stop_if_true(rule.stop_if_true);
            ws.add_conditional_format(start.row, c1, end.row, c2, &cf)?;
        }
        CfRuleKind::Expression { formula } => {
            let cf = ConditionalFormatFormula::new()
                .set_rule(formula.as_str())
                .set_format(&format)
                .set_stop_if_true(rule.stop_if_true);
            ws.add_conditional_format(start.row, c1, end.row, c2, &cf)?;
        }
    }
    Ok(())
}

fn cell_format(style: &Style) -> Format {
    let mut format = Format::new();
    let font = &style.font;
    if let Some(name) = &font.name {
        format = format.set_font_name(name);
    }
    if let Some(points) = font.size_pt() {
        format = format.set_font_size(points);
    }
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if let Some(color) = font.color {
        format = format.set_font_color(Color::RGB(color.rgb_value()));
    }
    format = match style.alignment {
        HorizontalAlignment::General => format,
        HorizontalAlignment::Left => format.set_align(FormatAlign::Left),
        HorizontalAlignment::Center => format.set_align(FormatAlign::Center),
        HorizontalAlignment::Right => format.set_align(FormatAlign::Right),
        HorizontalAlignment::Justify => format.set_align(FormatAlign::Justify),
    };
    if style.wrap_text {
        format = format.set_text_wrap();
    }

    let border = &style.border;
    if let Some(edge) = border.left {
        format = format
            .set_border_left(border_style(edge.style))
            .set_border_left_color(Color::RGB(edge.color.rgb_value()));
    }
    if let Some(edge) = border.right {
        format = format
            .set_border_right(border_style(edge.style))
            .set_border_right_color(Color::RGB(edge.color.rgb_value()));
    }
    if let Some(edge) = border.top {
        format = format
            .set_border_top(border_style(edge.style))
            .set_border_top_color(Color::RGB(edge.color.rgb_value()));
    }
    if let Some(edge) = border.bottom {
        format = format
            .set_border_bottom(border_style(edge.style))
            .set_border_bottom_color(Color::RGB(edge.color.rgb_value()));
    }

    if let Some(fill) = style.fill {
        format = format.set_background_color(Color::RGB(fill.rgb_value()));
    }
    if let Some(num_format) = &style.number_format {
        format = format.set_num_format(num_format);
    }
    format
}

fn border_style(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Hair => FormatBorder::Hair,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Double => FormatBorder::Double,
    }
}

fn is_merge_interior(merged: &[Range], cell: CellRef) -> bool {
    merged
        .iter()
        .any(|region| region.contains(cell) && region.start != cell)
}

fn col_num(sheet: &Worksheet, col: u32) -> Result<u16, XlsxIoError> {
    u16::try_from(col).map_err(|_| XlsxIoError::ColumnOutOfBounds {
        sheet: sheet.name().to_string(),
        col,
    })
}
