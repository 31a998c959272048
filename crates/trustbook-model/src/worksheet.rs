use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conditional_formatting::resolve_fill;
use crate::{CellRef, CellValue, CfRule, Color, Range, Style};

static EMPTY_VALUE: CellValue = CellValue::Empty;

/// A stored cell: value, optional formula text, and formatting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    /// Formula text including the leading `=`; `value` holds the cached result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default)]
    pub style: Style,
}

impl Cell {
    fn is_vacant(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.style.is_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot merge single cell {0}")]
    SingleCell(Range),
    #[error("merge {requested} overlaps existing merged region {existing}")]
    Overlap { requested: Range, existing: Range },
}

/// A sparse worksheet.
///
/// Only non-vacant cells are stored; reading any other cell yields [`CellValue::Empty`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, Cell>,
    merged: Vec<Range>,
    column_widths: BTreeMap<u32, f64>,
    conditional_formats: Vec<CfRule>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.cells.get(&cell)
    }

    pub fn value(&self, cell: CellRef) -> &CellValue {
        self.cells.get(&cell).map_or(&EMPTY_VALUE, |c| &c.value)
    }

    /// Set a literal value, dropping any formula previously stored in the cell.
    pub fn set_value(&mut self, cell: CellRef, value: impl Into<CellValue>) {
        let entry = self.cells.entry(cell).or_default();
        entry.value = value.into();
        entry.formula = None;
        if entry.is_vacant() {
            self.cells.remove(&cell);
        }
    }

    /// Set (or clear) formula text; the current value is kept as the cached result.
    pub fn set_formula(&mut self, cell: CellRef, formula: Option<String>) {
        let entry = self.cells.entry(cell).or_default();
        entry.formula = formula;
        if entry.is_vacant() {
            self.cells.remove(&cell);
        }
    }

    pub fn style(&self, cell: CellRef) -> Option<&Style> {
        self.cells.get(&cell).map(|c| &c.style)
    }

    pub fn style_mut(&mut self, cell: CellRef) -> &mut Style {
        &mut self.cells.entry(cell).or_default().style
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    /// 0-based row of the last non-empty value in `col`.
    pub fn last_row_in_column(&self, col: u32) -> Option<u32> {
        self.cells
            .iter()
            .filter(|(k, c)| k.col == col && !c.value.is_empty())
            .map(|(k, _)| k.row)
            .max()
    }

    pub fn merged_regions(&self) -> &[Range] {
        &self.merged
    }

    /// Merge `range`. Re-merging an identical range is a no-op.
    pub fn merge_range(&mut self, range: Range) -> Result<(), MergeError> {
        if range.is_single_cell() {
            return Err(MergeError::SingleCell(range));
        }
        if self.merged.contains(&range) {
            return Ok(());
        }
        if let Some(existing) = self.merged.iter().find(|m| m.intersects(&range)) {
            return Err(MergeError::Overlap {
                requested: range,
                existing: *existing,
            });
        }
        self.merged.push(range);
        Ok(())
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(c, w)| (*c, *w))
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn conditional_formats(&self) -> &[CfRule] {
        &self.conditional_formats
    }

    /// Append a rule (lowest priority so far) unless an identical condition already
    /// covers the same range. Returns `true` if the rule was added.
    pub fn add_conditional_format(&mut self, rule: CfRule) -> bool {
        if self
            .conditional_formats
            .iter()
            .any(|existing| existing.same_condition(&rule))
        {
            return false;
        }
        self.conditional_formats.push(rule);
        true
    }

    /// Fill painted on `cell` by the sheet's conditional formats.
    pub fn conditional_fill(&self, cell: CellRef) -> Option<Color> {
        resolve_fill(&self.conditional_formats, cell, self.value(cell))
    }
}
