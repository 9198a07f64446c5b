//! TableConverter - foreign table → [`TabularFrame`]
//!
//! # Algorithm
//!
//! 1. Read row and column counts (failure aborts the conversion)
//! 2. Resolve column headers, falling back to `Column_{i}` for every column
//!    if any header read fails
//! 3. Read every `(row, column)` cell; a failed cell becomes null
//! 4. Assemble columns and attach metadata
//!
//! Only the counts are structural; everything after them degrades
//! gracefully.

use super::{read_title, ConvertOptions, Converter};
use crate::bridge::{require_capability, try_get_capability, ForeignObject, ForeignValue};
use crate::config::DisplayConfig;
use crate::native::{CellValue, Column, TabularFrame};
use crate::probe::patterns::{is_table_like, TABLE_CELL, TABLE_COLUMN_COUNT, TABLE_COLUMN_HEADER, TABLE_ROW_COUNT};
use crate::result::{ConversionError, ConversionResult, NativeValue, ResultKind};
use serde_json::{Map, Value};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct TableConverter;

impl TableConverter {
    fn try_convert(&self, handle: &dyn ForeignObject) -> Result<ConversionResult, ConversionError> {
        let row_count = require_capability(handle, TABLE_ROW_COUNT)?.call_usize()?;
        let column_count = require_capability(handle, TABLE_COLUMN_COUNT)?.call_usize()?;

        let names = column_names(handle, column_count);
        let mut null_cells = 0usize;

        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let values = (0..row_count)
                    .map(|row| {
                        let cell = read_cell(handle, row, col);
                        if cell.is_null() {
                            null_cells += 1;
                        }
                        cell
                    })
                    .collect();
                Column::new(name.clone(), values)
            })
            .collect();

        let frame = TabularFrame::new(columns, row_count);
        let dtypes: Map<String, Value> = frame
            .dtypes()
            .into_iter()
            .map(|(name, dtype)| (name, Value::from(dtype.as_str())))
            .collect();

        info!(
            "Converted {} to {}x{} frame",
            handle.type_name(),
            row_count,
            column_count
        );

        let mut result = ConversionResult::success(NativeValue::Table(frame), handle.type_name())
            .with_metadata("row_count", row_count)
            .with_metadata("column_count", column_count)
            .with_metadata("column_names", names)
            .with_metadata("dtypes", Value::Object(dtypes))
            .with_metadata("null_cells", null_cells);

        if let Some(title) = read_title(handle) {
            result.insert_metadata("title", title);
        }
        Ok(result)
    }
}

impl Converter for TableConverter {
    fn name(&self) -> &str {
        "table"
    }

    fn predicate_name(&self) -> &str {
        "is_table_like"
    }

    fn converter_name(&self) -> &str {
        "convert_table"
    }

    fn accepts(&self, handle: &dyn ForeignObject) -> bool {
        is_table_like(handle)
    }

    fn convert(&self, handle: &dyn ForeignObject, _options: &ConvertOptions, _config: &DisplayConfig) -> ConversionResult {
        self.try_convert(handle)
            .unwrap_or_else(|e| ConversionResult::failure(ResultKind::Table, e, handle.type_name()))
    }
}

/// Header names, or synthetic `Column_{i}` names if any header read fails
fn column_names(handle: &dyn ForeignObject, column_count: usize) -> Vec<String> {
    let synthetic = || -> Vec<String> { (0..column_count).map(|i| format!("Column_{}", i)).collect() };

    let Some(header) = try_get_capability(handle, TABLE_COLUMN_HEADER) else {
        return synthetic();
    };

    let mut names = Vec::with_capacity(column_count);
    for col in 0..column_count {
        match header.call(&[ForeignValue::Int(col as i64)]) {
            Ok(ForeignValue::Str(name)) if !name.is_empty() => names.push(name),
            Ok(other) => {
                debug!(
                    "Column header {} of {} is {:?}; using synthetic names",
                    col,
                    handle.type_name(),
                    other
                );
                return synthetic();
            }
            Err(e) => {
                debug!(
                    "Column header {} of {} failed: {}; using synthetic names",
                    col,
                    handle.type_name(),
                    e
                );
                return synthetic();
            }
        }
    }
    names
}

/// Read one cell; failures are logged and become null
fn read_cell(handle: &dyn ForeignObject, row: usize, col: usize) -> CellValue {
    match handle.invoke(TABLE_CELL, &[ForeignValue::Int(col as i64), ForeignValue::Int(row as i64)]) {
        Ok(value) => CellValue::from_foreign(&value),
        Err(e) => {
            debug!("Cell ({}, {}) of {} unreadable: {}", row, col, handle.type_name(), e);
            CellValue::Null
        }
    }
}
