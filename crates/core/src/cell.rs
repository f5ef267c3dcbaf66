use chrono::NaiveDateTime;
use serde::Serialize;

/// A single typed cell as loaded from a raw file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Build a text cell, mapping the empty string to `Empty`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// The string a spreadsheet shows for this cell.
    ///
    /// Integral numbers render without decimals, timestamps as
    /// `YYYY-MM-DD HH:MM:SS`, booleans as `TRUE`/`FALSE`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Equality key used for exact-duplicate detection.
    ///
    /// Tagged by variant so that the text "1" and the number 1 never collide.
    pub fn identity_key(&self) -> String {
        match self {
            CellValue::Empty => "e:".to_string(),
            CellValue::Text(s) => format!("t:{s}"),
            CellValue::Number(n) => format!("n:{}", n.to_bits()),
            CellValue::Bool(b) => format!("b:{b}"),
            CellValue::DateTime(dt) => format!("d:{}", dt.and_utc().timestamp_micros()),
        }
    }
}

/// Format a number nicely: integers without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
