use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Spreadsheet error values (`#NUM!`, `#DIV/0!`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorValue {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
}

impl ErrorValue {
    /// The literal text spreadsheet applications display (and store) for this error.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorValue::Null => "#NULL!",
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::Value => "#VALUE!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Num => "#NUM!",
            ErrorValue::NA => "#N/A",
            ErrorValue::GettingData => "#GETTING_DATA",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = match s.trim() {
            "#NULL!" => ErrorValue::Null,
            "#DIV/0!" => ErrorValue::Div0,
            "#VALUE!" => ErrorValue::Value,
            "#REF!" => ErrorValue::Ref,
            "#NAME?" => ErrorValue::Name,
            "#NUM!" => ErrorValue::Num,
            "#N/A" => ErrorValue::NA,
            "#GETTING_DATA" => ErrorValue::GettingData,
            _ => return Err(()),
        };
        Ok(err)
    }
}

/// Scalar cell value.
///
/// The enum uses an explicit `{type, value}` tagged layout so run reports stay stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    String(String),
    Boolean(bool),
    Error(ErrorValue),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric payload, if the cell holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Error payload, including text cells whose content is an error literal.
    ///
    /// Some writers store error markers as plain strings; both spellings read the same here.
    pub fn as_error(&self) -> Option<ErrorValue> {
        match self {
            CellValue::Error(e) => Some(*e),
            CellValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<ErrorValue> for CellValue {
    fn from(value: ErrorValue) -> Self {
        CellValue::Error(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => f.write_str(s),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_literals_parse_back() {
        for err in [
            ErrorValue::Null,
            ErrorValue::Div0,
            ErrorValue::Value,
            ErrorValue::Ref,
            ErrorValue::Name,
            ErrorValue::Num,
            ErrorValue::NA,
            ErrorValue::GettingData,
        ] {
            assert_eq!(err.as_str().parse::<ErrorValue>(), Ok(err));
        }
        assert!("#NUM".parse::<ErrorValue>().is_err());
    }

    #[test]
    fn text_error_markers_read_as_errors() {
        assert_eq!(CellValue::from("#NUM!").as_error(), Some(ErrorValue::Num));
        assert_eq!(
            CellValue::Error(ErrorValue::Num).as_error(),
            Some(ErrorValue::Num)
        );
        assert_eq!(CellValue::from("NUM").as_error(), None);
        assert_eq!(CellValue::Number(1.0).as_error(), None);
    }

    #[test]
    fn serde_layout_is_tagged() {
        let json = serde_json::to_string(&CellValue::Number(0.5)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":0.5}"#);
        let json = serde_json::to_string(&CellValue::Error(ErrorValue::Num)).unwrap();
        assert_eq!(json, r#"{"type":"error","value":"Num"}"#);
    }
}
