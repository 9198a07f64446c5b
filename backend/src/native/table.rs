//! Columnar tabular frame

use crate::bridge::ForeignValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn from_foreign(value: &ForeignValue) -> Self {
        match value {
            ForeignValue::Null => CellValue::Null,
            ForeignValue::Bool(b) => CellValue::Bool(*b),
            ForeignValue::Int(i) => CellValue::Int(*i),
            ForeignValue::Float(f) if f.is_nan() => CellValue::Null,
            ForeignValue::Float(f) => CellValue::Float(*f),
            ForeignValue::Str(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NaN"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Bool,
    Int64,
    Float64,
    Object,
    /// Every cell is null
    Empty,
}

impl Dtype {
    /// Infer from non-null cells: ints widen to float, anything mixed is object
    pub fn infer(values: &[CellValue]) -> Self {
        let mut dtype = Dtype::Empty;
        for value in values {
            let cell = match value {
                CellValue::Null => continue,
                CellValue::Bool(_) => Dtype::Bool,
                CellValue::Int(_) => Dtype::Int64,
                CellValue::Float(_) => Dtype::Float64,
                CellValue::Text(_) => Dtype::Object,
            };
            dtype = match (dtype, cell) {
                (Dtype::Empty, c) => c,
                (d, c) if d == c => d,
                (Dtype::Int64, Dtype::Float64) | (Dtype::Float64, Dtype::Int64) => Dtype::Float64,
                _ => Dtype::Object,
            };
        }
        dtype
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::Object => "object",
            Dtype::Empty => "empty",
        }
    }
}

/// Named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn dtype(&self) -> Dtype {
        Dtype::infer(&self.values)
    }
}

/// Column-ordered table
///
/// # Invariant
///
/// Every column holds exactly `row_count` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl TabularFrame {
    /// Build from columns; shorter columns are padded with nulls
    pub fn new(mut columns: Vec<Column>, row_count: usize) -> Self {
        for column in &mut columns {
            column.values.resize(row_count, CellValue::Null);
        }
        Self { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.columns.get(col)?.values.get(row)
    }

    pub fn dtypes(&self) -> Vec<(String, Dtype)> {
        self.columns.iter().map(|c| (c.name.clone(), c.dtype())).collect()
    }

    pub fn null_count(&self) -> usize {
        self.columns
            .iter()
            .flat_map(|c| c.values.iter())
            .filter(|v| v.is_null())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_inference() {
        assert_eq!(Dtype::infer(&[CellValue::Int(1), CellValue::Null]), Dtype::Int64);
        assert_eq!(Dtype::infer(&[CellValue::Int(1), CellValue::Float(2.5)]), Dtype::Float64);
        assert_eq!(Dtype::infer(&[CellValue::Int(1), CellValue::Text("a".into())]), Dtype::Object);
        assert_eq!(Dtype::infer(&[CellValue::Null]), Dtype::Empty);
        assert_eq!(Dtype::infer(&[]), Dtype::Empty);
    }

    #[test]
    fn test_frame_pads_short_columns() {
        let frame = TabularFrame::new(vec![Column::new("a", vec![CellValue::Int(1)])], 3);
        assert_eq!(frame.shape(), (3, 1));
        assert_eq!(frame.cell(2, 0), Some(&CellValue::Null));
        assert_eq!(frame.null_count(), 2);
    }

    #[test]
    fn test_nan_float_becomes_null() {
        assert!(CellValue::from_foreign(&ForeignValue::Float(f64::NAN)).is_null());
    }
}
