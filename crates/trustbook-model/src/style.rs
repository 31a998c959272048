use core::fmt;

use serde::{Deserialize, Serialize};

/// An ARGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub argb: u32,
}

impl Color {
    pub const fn new_argb(argb: u32) -> Self {
        Self { argb }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn rgb(rgb: u32) -> Self {
        Self {
            argb: 0xFF00_0000 | (rgb & 0x00FF_FFFF),
        }
    }

    pub const fn black() -> Self {
        Self::rgb(0x000000)
    }

    pub const fn white() -> Self {
        Self::rgb(0xFFFFFF)
    }

    /// The `0xRRGGBB` part of the color, dropping alpha.
    pub const fn rgb_value(self) -> u32 {
        self.argb & 0x00FF_FFFF
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.argb)
    }
}

/// Font formatting (subset).
///
/// `None` fields inherit the workbook's default font.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Font {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Font size in 1/100 points (e.g. 1800 = 18pt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_100pt: Option<u16>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Font {
    pub fn set_size_pt(&mut self, points: f64) {
        let hundredths = (points * 100.0).round();
        self.size_100pt =
            (1.0..=f64::from(u16::MAX)).contains(&hundredths).then_some(hundredths as u16);
    }

    pub fn size_pt(&self) -> Option<f64> {
        self.size_100pt.map(|s| f64::from(s) / 100.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Justify,
}

/// Border line style.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    None,
    Hair,
    Dotted,
    Dashed,
    Thin,
    Medium,
    Thick,
    Double,
}

/// One edge of a cell border.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderEdge {
    pub style: BorderStyle,
    pub color: Color,
}

impl BorderEdge {
    pub const fn new(style: BorderStyle, color: Color) -> Self {
        Self { style, color }
    }
}

/// Border formatting; diagonal borders are not modelled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Border {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderEdge>,
}

/// A cell's complete formatting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub font: Font,
    #[serde(default)]
    pub alignment: HorizontalAlignment,
    #[serde(default)]
    pub wrap_text: bool,
    #[serde(default)]
    pub border: Border,
    /// Solid background fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl Style {
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}
