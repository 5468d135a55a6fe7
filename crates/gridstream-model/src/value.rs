use serde::{Deserialize, Serialize};
use std::fmt;

/// The value stored in a single cell.
///
/// The enum uses an explicit `{type, value}` tagged layout for stable IPC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Empty / unset cell value.
    Empty,
    /// IEEE-754 double precision number.
    Number(f64),
    /// Plain string (not rich text).
    Text(String),
    /// Boolean.
    Boolean(bool),
    /// Excel error value.
    Error(ErrorValue),
    /// Formula with an optional cached result.
    Formula(Formula),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Returns true if the value is [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
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
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<ErrorValue> for CellValue {
    fn from(value: ErrorValue) -> Self {
        CellValue::Error(value)
    }
}

impl From<Formula> for CellValue {
    fn from(value: Formula) -> Self {
        CellValue::Formula(value)
    }
}

/// A cell formula plus its optionally cached result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// Formula text without the leading `=`.
    pub text: String,
    /// Cached result, if the caller has one.
    pub result: Option<Box<CellValue>>,
    /// Whether the formula participates in the sheet's shared-formula table.
    ///
    /// The first cell carrying a given shared text becomes the master; later
    /// cells with the same text are written as references to its index.
    pub shared: bool,
}

impl Formula {
    /// A plain (non-shared) formula.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            result: None,
            shared: false,
        }
    }

    /// A formula that participates in the shared-formula table.
    pub fn shared(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            result: None,
            shared: true,
        }
    }

    /// Attach a cached result.
    pub fn with_result(mut self, result: impl Into<CellValue>) -> Self {
        self.result = Some(Box::new(result.into()));
        self
    }
}

/// Excel error literals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorValue {
    Div0,
    NA,
    Name,
    Null,
    Num,
    Ref,
    Value,
}

impl ErrorValue {
    /// The on-disk literal, e.g. `#DIV/0!`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::NA => "#N/A",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Null => "#NULL!",
            ErrorValue::Num => "#NUM!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Value => "#VALUE!",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(CellValue::from(1.5), CellValue::Number(1.5));
        assert_eq!(CellValue::from("a"), CellValue::Text("a".to_string()));
        assert!(CellValue::default().is_empty());
    }

    #[test]
    fn tagged_serde_layout() {
        let json = serde_json::to_value(CellValue::Number(2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "number", "value": 2.5}));

        let back: CellValue =
            serde_json::from_value(serde_json::json!({"type": "error", "value": "div0"})).unwrap();
        assert_eq!(back, CellValue::Error(ErrorValue::Div0));
    }

    #[test]
    fn formula_result() {
        let f = Formula::new("A1+A2").with_result(3.0);
        assert_eq!(f.result, Some(Box::new(CellValue::Number(3.0))));
        assert!(!f.shared);
        assert!(Formula::shared("A1+A2").shared);
    }
}
