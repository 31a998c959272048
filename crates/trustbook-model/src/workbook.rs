use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Worksheet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddSheetError {
    #[error("sheet name cannot be blank")]
    EmptyName,
    #[error("sheet name already exists: {0}")]
    DuplicateName(String),
}

/// An ordered collection of worksheets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet and return its index.
    ///
    /// Names are compared case-insensitively, matching spreadsheet applications.
    pub fn add_sheet(&mut self, sheet: Worksheet) -> Result<usize, AddSheetError> {
        if sheet.name().trim().is_empty() {
            return Err(AddSheetError::EmptyName);
        }
        if self.sheet_index(sheet.name()).is_some() {
            return Err(AddSheetError::DuplicateName(sheet.name().to_string()));
        }
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Worksheet] {
        &mut self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Worksheet::name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.sheets[i])
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        let idx = self.sheet_index(name)?;
        self.sheets.get_mut(idx)
    }
}
