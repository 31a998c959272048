//! Cell formatting and column widths, read from the package parts directly.
//!
//! `calamine` only reports values. This pass decodes `xl/styles.xml` into model
//! [`Style`]s indexed like `cellXfs`, then collects each worksheet's `<col>`
//! widths and the `s` style index of every `<c>` element.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use trustbook_model::{
    Border, BorderEdge, BorderStyle, CellRef, Color, Font, HorizontalAlignment, Style, MAX_COLS,
};
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub(crate) enum FormattingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] ZipError),
    #[error("malformed `{part}`: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },
}

/// Formatting of one worksheet part.
#[derive(Debug, Default)]
pub(crate) struct SheetFormats {
    /// `cellXfs` index of every cell that names a non-default one.
    pub cell_styles: Vec<(CellRef, u32)>,
    /// 0-based column and width in character units.
    pub column_widths: Vec<(u32, f64)>,
}

#[derive(Debug, Default)]
pub(crate) struct PackageFormats {
    styles: Vec<Style>,
    sheets: HashMap<String, SheetFormats>,
}

impl PackageFormats {
    pub fn read(path: &Path) -> Result<Self, FormattingError> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let styles = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_styles(&xml).map_err(|source| xml_error("xl/styles.xml", source))?,
            None => Vec::new(),
        };

        let mut sheets = HashMap::new();
        for (name, part) in sheet_parts(&mut archive)? {
            let Some(xml) = read_part(&mut archive, &part)? else {
                log::warn!("worksheet part `{part}` for sheet `{name}` is missing");
                continue;
            };
            let formats = parse_sheet(&xml).map_err(|source| xml_error(&part, source))?;
            sheets.insert(name, formats);
        }

        Ok(Self { styles, sheets })
    }

    /// The style behind a `cellXfs` index.
    pub fn style(&self, xf: u32) -> Option<&Style> {
        self.styles.get(xf as usize)
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetFormats> {
        self.sheets.get(name)
    }
}

fn xml_error(part: &str, source: quick_xml::Error) -> FormattingError {
    FormattingError::Xml {
        part: part.to_string(),
        source,
    }
}

fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> Result<Option<String>, FormattingError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Sheet names mapped to their worksheet part paths, via `workbook.xml` and its relationships.
fn sheet_parts(archive: &mut ZipArchive<File>) -> Result<Vec<(String, String)>, FormattingError> {
    const WORKBOOK: &str = "xl/workbook.xml";
    const RELS: &str = "xl/_rels/workbook.xml.rels";

    let Some(workbook) = read_part(archive, WORKBOOK)? else {
        return Ok(Vec::new());
    };
    let rels = read_part(archive, RELS)?.unwrap_or_default();

    let targets = parse_relationships(&rels).map_err(|source| xml_error(RELS, source))?;
    let sheets = parse_workbook_sheets(&workbook).map_err(|source| xml_error(WORKBOOK, source))?;
    Ok(sheets
        .into_iter()
        .filter_map(|(name, rel_id)| {
            let target = targets.get(&rel_id)?;
            Some((name, resolve_target(target)))
        })
        .collect())
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<u32>, quick_xml::Error> {
    Ok(attr(e, key)?.and_then(|v| v.trim().parse().ok()))
}

fn parse_xml_bool(value: &str) -> bool {
    !matches!(value.trim(), "0" | "false")
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event()? {
            // `r:id` matches on its local name.
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attr(&e, b"name")?, attr(&e, b"id")?) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    /// `cellStyleXfs`, `dxfs` and friends reuse the element names above.
    Skipped,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Default)]
struct ParsedFill {
    solid: bool,
    color: Option<Color>,
}

struct ParsedEdge {
    side: Side,
    style: BorderStyle,
    color: Option<Color>,
}

/// Decode `styles.xml` into one [`Style`] per `cellXfs` entry.
fn parse_styles(xml: &str) -> Result<Vec<Style>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut section = Section::None;

    let mut num_fmts: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<ParsedFill> = Vec::new();
    let mut borders: Vec<Border> = Vec::new();
    let mut edge: Option<ParsedEdge> = None;
    let mut styles: Vec<Style> = Vec::new();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs"
                    | b"cellStyleXfs" | b"dxfs" | b"colors" | b"extLst" => section = Section::None,
                    b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" => {
                        if let (Some(parsed), Some(border)) = (edge.take(), borders.last_mut()) {
                            set_edge(border, parsed);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let name = e.local_name();
        match (section, name.as_ref()) {
            (_, b"numFmts") if !empty => section = Section::NumFmts,
            (_, b"fonts") if !empty => section = Section::Fonts,
            (_, b"fills") if !empty => section = Section::Fills,
            (_, b"borders") if !empty => section = Section::Borders,
            (_, b"cellXfs") if !empty => section = Section::CellXfs,
            (_, b"cellStyleXfs" | b"dxfs" | b"colors" | b"extLst") if !empty => {
                section = Section::Skipped
            }

            (Section::NumFmts, b"numFmt") => {
                let id = attr_u32(&e, b"numFmtId")?;
                if let (Some(id), Some(code)) = (id, attr(&e, b"formatCode")?) {
                    num_fmts.insert(id, code);
                }
            }

            (Section::Fonts, b"font") => fonts.push(Font::default()),
            (Section::Fonts, child) => {
                let Some(font) = fonts.last_mut() else {
                    continue;
                };
                match child {
                    b"b" => font.bold = attr(&e, b"val")?.map_or(true, |v| parse_xml_bool(&v)),
                    b"i" => font.italic = attr(&e, b"val")?.map_or(true, |v| parse_xml_bool(&v)),
                    b"sz" => {
                        if let Some(points) = attr(&e, b"val")?.and_then(|v| v.parse().ok()) {
                            font.set_size_pt(points);
                        }
                    }
                    b"name" => font.name = attr(&e, b"val")?,
                    b"color" => font.color = parse_color(&e)?,
                    _ => {}
                }
            }

            (Section::Fills, b"fill") => fills.push(ParsedFill::default()),
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = fills.last_mut() {
                    fill.solid = attr(&e, b"patternType")?.as_deref() == Some("solid");
                }
            }
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = fills.last_mut() {
                    fill.color = parse_color(&e)?;
                }
            }

            (Section::Borders, b"border") => borders.push(Border::default()),
            (
                Section::Borders,
                side @ (b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom"),
            ) => {
                let side = match side {
                    b"left" | b"start" => Side::Left,
                    b"right" | b"end" => Side::Right,
                    b"top" => Side::Top,
                    _ => Side::Bottom,
                };
                let parsed = ParsedEdge {
                    side,
                    style: attr(&e, b"style")?.map_or(BorderStyle::None, |s| border_style(&s)),
                    color: None,
                };
                if empty {
                    if let Some(border) = borders.last_mut() {
                        set_edge(border, parsed);
                    }
                } else {
                    edge = Some(parsed);
                }
            }
            (Section::Borders, b"color") => {
                if let Some(parsed) = edge.as_mut() {
                    parsed.color = parse_color(&e)?;
                }
            }

            (Section::CellXfs, b"xf") => {
                let mut style = Style::default();
                // Font 0 is the workbook default; cells using it inherit rather than copy it.
                if let Some(font) = attr_u32(&e, b"fontId")?.filter(|&id| id > 0) {
                    style.font = fonts.get(font as usize).cloned().unwrap_or_default();
                }
                if let Some(fill) = attr_u32(&e, b"fillId")?.and_then(|id| fills.get(id as usize)) {
                    style.fill = fill.color.filter(|_| fill.solid);
                }
                if let Some(border) = attr_u32(&e, b"borderId")? {
                    style.border = borders.get(border as usize).cloned().unwrap_or_default();
                }
                if let Some(id) = attr_u32(&e, b"numFmtId")? {
                    style.number_format = num_fmts
                        .get(&id)
                        .cloned()
                        .or_else(|| builtin_num_format(id).map(str::to_string));
                }
                styles.push(style);
            }
            (Section::CellXfs, b"alignment") => {
                if let Some(style) = styles.last_mut() {
                    style.alignment = attr(&e, b"horizontal")?
                        .map_or(HorizontalAlignment::General, |h| horizontal_alignment(&h));
                    style.wrap_text = attr(&e, b"wrapText")?.is_some_and(|v| parse_xml_bool(&v));
                }
            }

            _ => {}
        }
    }

    Ok(styles)
}

fn set_edge(border: &mut Border, parsed: ParsedEdge) {
    if parsed.style == BorderStyle::None {
        return;
    }
    let edge = Some(BorderEdge::new(
        parsed.style,
        parsed.color.unwrap_or_else(Color::black),
    ));
    match parsed.side {
        Side::Left => border.left = edge,
        Side::Right => border.right = edge,
        Side::Top => border.top = edge,
        Side::Bottom => border.bottom = edge,
    }
}

/// Only explicit `rgb` colors are kept; theme and indexed colors need the theme part.
fn parse_color(e: &BytesStart<'_>) -> Result<Option<Color>, quick_xml::Error> {
    Ok(attr(e, b"rgb")?.and_then(|hex| parse_argb(&hex)))
}

fn parse_argb(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        8 => Some(Color::new_argb(value)),
        6 => Some(Color::rgb(value)),
        _ => None,
    }
}

fn border_style(value: &str) -> BorderStyle {
    match value {
        "none" => BorderStyle::None,
        "hair" => BorderStyle::Hair,
        "dotted" => BorderStyle::Dotted,
        "dashed" | "dashDot" | "dashDotDot" | "slantDashDot" => BorderStyle::Dashed,
        "medium" | "mediumDashed" | "mediumDashDot" | "mediumDashDotDot" => BorderStyle::Medium,
        "thick" => BorderStyle::Thick,
        "double" => BorderStyle::Double,
        _ => BorderStyle::Thin,
    }
}

fn horizontal_alignment(value: &str) -> HorizontalAlignment {
    match value {
        "left" => HorizontalAlignment::Left,
        "center" | "centerContinuous" => HorizontalAlignment::Center,
        "right" => HorizontalAlignment::Right,
        "justify" | "distributed" => HorizontalAlignment::Justify,
        _ => HorizontalAlignment::General,
    }
}

/// Format codes of the implicit built-in `numFmtId`s that carry meaning for numbers and dates.
fn builtin_num_format(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        49 => "@",
        _ => return None,
    })
}

fn parse_sheet(xml: &str) -> Result<SheetFormats, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut formats = SheetFormats::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" => {
                    if attr(&e, b"customWidth")?.is_some_and(|v| !parse_xml_bool(&v)) {
                        continue;
                    }
                    let (Some(min), Some(width)) = (
                        attr_u32(&e, b"min")?,
                        attr(&e, b"width")?.and_then(|w| w.parse::<f64>().ok()),
                    ) else {
                        continue;
                    };
                    let max = attr_u32(&e, b"max")?.unwrap_or(min).min(MAX_COLS);
                    let Some(width) = character_width(width) else {
                        continue;
                    };
                    for col in min.max(1)..=max {
                        formats.column_widths.push((col - 1, width));
                    }
                }
                b"c" => {
                    let Some(xf) = attr_u32(&e, b"s")?.filter(|&s| s > 0) else {
                        continue;
                    };
                    match attr(&e, b"r")?.map(|r| CellRef::from_a1(&r)) {
                        Some(Ok(cell)) => formats.cell_styles.push((cell, xf)),
                        _ => log::debug!("skipping styled cell without a usable reference"),
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(formats)
}

/// Convert a stored `<col width>` back to the character width a writer is given.
///
/// Stored widths include the cell padding of the default font (5px on a 7px digit),
/// so writing the result again reproduces the same stored width.
fn character_width(stored: f64) -> Option<f64> {
    const DIGIT_PX: f64 = 7.0;
    const PADDING_PX: f64 = 5.0;

    if !(stored.is_finite() && stored > 0.0) {
        return None;
    }
    let pixels = (stored * DIGIT_PX).round();
    let width = if pixels >= DIGIT_PX + PADDING_PX {
        (pixels - PADDING_PX) / DIGIT_PX
    } else {
        pixels / (DIGIT_PX + PADDING_PX)
    };
    Some((width * 100.0).round() / 100.0).filter(|w| *w > 0.0)
}
