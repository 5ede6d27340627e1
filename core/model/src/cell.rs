//! FILENAME: core/model/src/cell.rs
//! PURPOSE: Defines the value stored at one cube coordinate.
//! CONTEXT: The data source hands cell values back as `CellValue`. The calc
//! layer converts them to its own value type when an expression reads
//! "the current cell".

use serde::{Deserialize, Serialize};

/// Represents the possible errors a cell can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellError {
    Value, // Non-numeric fact under a roll-up
}

/// Represents the value at one coordinate of the cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Returns the display value of the cell as a String.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
            CellValue::Error(e) => format!("#{:?}", e).to_uppercase(),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}
