//! FILENAME: core/style-engine/src/value.rs
//! PURPOSE: Defines the raw cell values and column dtypes read from a source table.
//! CONTEXT: Values are owned copies handed out by the source table collaborator.
//! Missing values (empty cells and NaN numbers) are treated alike for sorting
//! and statistics.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The raw data within a cell of the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

/// Column data types as reported by the host table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Object,
}

impl DType {
    /// Numeric and not boolean. Only these columns have (min, max) bounds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Object => "object",
        }
    }
}

impl CellValue {
    pub fn number(n: f64) -> Self {
        CellValue::Number(n)
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Empty cells and NaN numbers.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// The numeric value, if this is a non-NaN number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// Returns the display value of the cell as a String.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.is_nan() {
                    "nan".to_string()
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Format without unnecessary decimal places
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => (if *b { "True" } else { "False" }).to_string(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            CellValue::Boolean(_) => 0,
            CellValue::Number(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::Empty => 3,
        }
    }

    /// Total order used for sorting: missing values last regardless of
    /// direction, mixed types ordered by type before value.
    pub fn sort_cmp(&self, other: &CellValue, ascending: bool) -> Ordering {
        match (self.is_missing(), other.is_missing()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let ordering = match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        };

        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(CellValue::Number(42.0).display_value(), "42");
        assert_eq!(CellValue::Number(1.5).display_value(), "1.5");
        assert_eq!(CellValue::Number(f64::NAN).display_value(), "nan");
        assert_eq!(CellValue::Boolean(true).display_value(), "True");
        assert_eq!(CellValue::Empty.display_value(), "");
    }

    #[test]
    fn test_missing_values() {
        assert!(CellValue::Empty.is_missing());
        assert!(CellValue::Number(f64::NAN).is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_sort_cmp_puts_missing_last_in_both_directions() {
        let nan = CellValue::Number(f64::NAN);
        let one = CellValue::Number(1.0);
        assert_eq!(nan.sort_cmp(&one, true), Ordering::Greater);
        assert_eq!(nan.sort_cmp(&one, false), Ordering::Greater);
        assert_eq!(one.sort_cmp(&CellValue::Number(2.0), false), Ordering::Greater);
    }

    #[test]
    fn test_dtype_numeric() {
        assert!(DType::Int64.is_numeric());
        assert!(DType::Float64.is_numeric());
        assert!(!DType::Bool.is_numeric());
        assert!(!DType::Object.is_numeric());
    }
}
