use std::path::Path;

use calamine::{open_workbook, CellErrorType, Data, Reader, Xlsx};
use trustbook_model::{CellRef, CellValue, ErrorValue, Range, Workbook, Worksheet, MAX_COLS, MAX_ROWS};

use crate::styles::{PackageFormats, SheetFormats};
use crate::XlsxIoError;

/// Load every sheet of an `.xlsx` workbook: cell values, formula text, merged
/// regions, cell formatting and column widths.
///
/// Conditional formats are not read back; callers that own a layout re-apply
/// them after loading. A package whose formatting parts cannot be decoded still
/// loads, without formatting.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Workbook, XlsxIoError> {
    let path = path.as_ref();
    let read_err = |source| XlsxIoError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut xlsx: Xlsx<_> = open_workbook(path).map_err(read_err)?;
    let sheet_names = xlsx.sheet_names();
    let merges_loaded = match xlsx.load_merged_regions() {
        Ok(()) => true,
        Err(err) => {
            log::warn!("ignoring merged regions in `{}`: {err}", path.display());
            false
        }
    };

    let formats = PackageFormats::read(path).unwrap_or_else(|err| {
        log::warn!("ignoring cell formatting in `{}`: {err}", path.display());
        PackageFormats::default()
    });

    let mut workbook = Workbook::new();
    for name in sheet_names {
        let mut sheet = Worksheet::new(name.clone());

        let range = xlsx.worksheet_range(&name).map_err(read_err)?;
        let start = range.start().unwrap_or((0, 0));
        for (row, col, value) in range.used_cells() {
            let Some(cell) = to_cell_ref(start, row, col) else {
                log::warn!("skipping out-of-bounds cell in sheet `{name}` at ({row},{col})");
                continue;
            };
            sheet.set_value(cell, convert_value(value));
        }

        match xlsx.worksheet_formula(&name) {
            Ok(formulas) => {
                let start = formulas.start().unwrap_or((0, 0));
                for (row, col, formula) in formulas.used_cells() {
                    let Some(cell) = to_cell_ref(start, row, col) else {
                        continue;
                    };
                    let formula = normalize_formula(formula);
                    if !formula.is_empty() {
                        sheet.set_formula(cell, Some(formula));
                    }
                }
            }
            Err(err) => log::warn!("failed to read formulas for sheet `{name}`: {err}"),
        }

        if merges_loaded {
            let regions: Vec<Range> = xlsx
                .merged_regions_by_sheet(&name)
                .into_iter()
                .map(|(_, _, dim)| {
                    Range::new(
                        CellRef::new(dim.start.0, dim.start.1),
                        CellRef::new(dim.end.0, dim.end.1),
                    )
                })
                .collect();
            for region in regions {
                if let Err(err) = sheet.merge_range(region) {
                    log::warn!("dropping merged region in sheet `{name}`: {err}");
                }
            }
        }

        if let Some(sheet_formats) = formats.sheet(&name) {
            apply_formats(&mut sheet, sheet_formats, &formats);
        }

        log::debug!(
            "loaded sheet `{name}` ({} cells, {} merged regions)",
            sheet.iter_cells().count(),
            sheet.merged_regions().len()
        );
        workbook.add_sheet(sheet)?;
    }

    Ok(workbook)
}

fn apply_formats(sheet: &mut Worksheet, sheet_formats: &SheetFormats, formats: &PackageFormats) {
    for &(col, width) in &sheet_formats.column_widths {
        sheet.set_column_width(col, width);
    }
    for &(cell, xf) in &sheet_formats.cell_styles {
        match formats.style(xf) {
            Some(style) if !style.is_default() => *sheet.style_mut(cell) = style.clone(),
            Some(_) => {}
            None => log::debug!(
                "cell {} in sheet `{}` names unknown style {xf}",
                cell.to_a1(),
                sheet.name()
            ),
        }
    }
}

fn to_cell_ref(start: (u32, u32), row: usize, col: usize) -> Option<CellRef> {
    // calamine `Range` iterators yield coordinates relative to `range.start()`.
    let row = start.0.checked_add(u32::try_from(row).ok()?)?;
    let col = start.1.checked_add(u32::try_from(col).ok()?)?;
    if row >= MAX_ROWS || col >= MAX_COLS {
        return None;
    }
    Some(CellRef::new(row, col))
}

fn normalize_formula(formula: &str) -> String {
    let trimmed = formula.trim();
    if trimmed.is_empty() || trimmed.starts_with('=') {
        trimmed.to_owned()
    } else {
        format!("={trimmed}")
    }
}

fn convert_value(value: &Data) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::Bool(v) => CellValue::Boolean(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::String(v) => CellValue::String(v.clone()),
        Data::Error(e) => CellValue::Error(convert_error(e)),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::DateTimeIso(v) | Data::DurationIso(v) => CellValue::String(v.clone()),
    }
}

fn convert_error(err: &CellErrorType) -> ErrorValue {
    match err {
        CellErrorType::Div0 => ErrorValue::Div0,
        CellErrorType::NA => ErrorValue::NA,
        CellErrorType::Name => ErrorValue::Name,
        CellErrorType::Null => ErrorValue::Null,
        CellErrorType::Num => ErrorValue::Num,
        CellErrorType::Ref => ErrorValue::Ref,
        CellErrorType::Value => ErrorValue::Value,
        CellErrorType::GettingData => ErrorValue::GettingData,
    }
}
