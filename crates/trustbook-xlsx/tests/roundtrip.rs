use pretty_assertions::assert_eq;
use trustbook_model::{
    BorderEdge, BorderStyle, CellIsOperator, CellRef, CellValue, CfRule, Color, ErrorValue,
    HorizontalAlignment, Range, Workbook, Worksheet,
};
use trustbook_xlsx::{read_workbook, write_workbook};

fn a1(s: &str) -> CellRef {
    CellRef::from_a1(s).unwrap()
}

fn trust_sheet() -> Worksheet {
    let mut sheet = Worksheet::new("Trust");
    sheet.set_value(a1("A1"), "Time");
    sheet.set_value(a1("E1"), "fTi");
    sheet.set_value(a1("F1"), "fTa");
    sheet.set_value(a1("A3"), 1.0);
    sheet.set_value(a1("E3"), 0.5);
    sheet.set_value(a1("F3"), -0.75);
    sheet.set_value(a1("A4"), 2.0);
    sheet.set_value(a1("E4"), ErrorValue::Num);
    sheet.set_value(a1("B4"), "Hello there");
    sheet
}

#[test]
fn values_and_num_markers_survive_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trust.xlsx");

    let mut wb = Workbook::new();
    wb.add_sheet(trust_sheet()).unwrap();
    write_workbook(&path, &wb).unwrap();

    let loaded = read_workbook(&path).unwrap();
    let sheet = loaded.sheet("Trust").unwrap();
    assert_eq!(sheet.value(a1("E1")), &CellValue::String("fTi".into()));
    assert_eq!(sheet.value(a1("E3")).as_number(), Some(0.5));
    assert_eq!(sheet.value(a1("F3")).as_number(), Some(-0.75));
    assert_eq!(sheet.value(a1("B4")).as_str(), Some("Hello there"));
    assert_eq!(sheet.value(a1("E4")).as_error(), Some(ErrorValue::Num));
    assert_eq!(sheet.value(a1("F4")), &CellValue::Empty);
    assert_eq!(sheet.last_row_in_column(0), Some(3));
}

#[test]
fn merges_and_other_sheets_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.xlsx");

    let mut trust = trust_sheet();
    trust.set_value(a1("O1"), "diffs(a)");
    trust.style_mut(a1("O1")).font.set_size_pt(18.0);
    trust.style_mut(a1("O1")).alignment = HorizontalAlignment::Center;
    trust.style_mut(a1("O1")).border.left =
        Some(BorderEdge::new(BorderStyle::Medium, Color::black()));
    trust.merge_range(Range::from_a1("O1:P1").unwrap()).unwrap();
    trust.set_column_width(13, 40.0);
    trust.add_conditional_format(CfRule::cell_is(
        Range::from_a1("E3:F4").unwrap(),
        CellIsOperator::LessThan,
        &[0.0],
        Color::rgb(0xFF5F5F),
    ));
    trust.add_conditional_format(CfRule::expression(
        Range::from_a1("E3:F4").unwrap(),
        "NOT(ISNUMBER(E3))",
        Color::rgb(0xFFF59E),
    ));

    let mut notes = Worksheet::new("Notes");
    notes.set_value(a1("A1"), "kept as-is");
    notes.set_value(a1("B2"), true);

    let mut wb = Workbook::new();
    wb.add_sheet(notes).unwrap();
    wb.add_sheet(trust).unwrap();
    write_workbook(&path, &wb).unwrap();

    let loaded = read_workbook(&path).unwrap();
    assert_eq!(loaded.sheet_names().collect::<Vec<_>>(), vec!["Notes", "Trust"]);

    let notes = loaded.sheet("Notes").unwrap();
    assert_eq!(notes.value(a1("A1")).as_str(), Some("kept as-is"));
    assert_eq!(notes.value(a1("B2")), &CellValue::Boolean(true));

    let trust = loaded.sheet("Trust").unwrap();
    assert_eq!(trust.value(a1("O1")).as_str(), Some("diffs(a)"));
    assert_eq!(trust.merged_regions(), &[Range::from_a1("O1:P1").unwrap()]);

    let title = trust.style(a1("O1")).unwrap();
    assert_eq!(title.font.size_pt(), Some(18.0));
    assert_eq!(title.alignment, HorizontalAlignment::Center);
    assert_eq!(
        title.border.left,
        Some(BorderEdge::new(BorderStyle::Medium, Color::black()))
    );
    assert!(trust.column_widths().any(|(col, width)| col == 13 && width == 40.0));
}

#[test]
fn formatting_from_another_tool_survives_a_load_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("styled.xlsx");
    let resaved = dir.path().join("resaved.xlsx");

    let mut sheet = trust_sheet();
    {
        let header = sheet.style_mut(a1("A1"));
        header.font.bold = true;
        header.font.italic = true;
        header.font.color = Some(Color::rgb(0x1F4E78));
        header.fill = Some(Color::rgb(0x123456));
        header.wrap_text = true;
        header.border.bottom = Some(BorderEdge::new(BorderStyle::Double, Color::rgb(0xC00000)));
    }
    sheet.style_mut(a1("A3")).number_format = Some("0.000".to_string());
    sheet.set_column_width(1, 60.0);
    sheet.set_column_width(3, 20.0);

    let mut wb = Workbook::new();
    wb.add_sheet(sheet).unwrap();
    write_workbook(&original, &wb).unwrap();

    let loaded = read_workbook(&original).unwrap();
    write_workbook(&resaved, &loaded).unwrap();

    for path in [&original, &resaved] {
        let reloaded = read_workbook(path).unwrap();
        let sheet = reloaded.sheet("Trust").unwrap();

        let header = sheet.style(a1("A1")).unwrap();
        assert!(header.font.bold && header.font.italic, "{}", path.display());
        assert_eq!(header.font.color, Some(Color::rgb(0x1F4E78)));
        assert_eq!(header.fill, Some(Color::rgb(0x123456)));
        assert!(header.wrap_text);
        assert_eq!(
            header.border.bottom,
            Some(BorderEdge::new(BorderStyle::Double, Color::rgb(0xC00000)))
        );
        assert_eq!(header.border.left, None);

        assert_eq!(
            sheet.style(a1("A3")).unwrap().number_format.as_deref(),
            Some("0.000")
        );
        assert!(sheet.style(a1("E3")).map_or(true, |style| style.is_default()));

        let widths: Vec<(u32, f64)> = sheet.column_widths().collect();
        assert_eq!(widths, vec![(1, 60.0), (3, 20.0)], "{}", path.display());
    }

    assert_eq!(loaded.sheet("Trust").unwrap().value(a1("A1")).as_str(), Some("Time"));
}

#[test]
fn missing_files_report_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.xlsx");
    let err = read_workbook(&path).unwrap_err();
    assert!(err.to_string().contains("absent.xlsx"), "{err}");
}
