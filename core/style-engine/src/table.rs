//! FILENAME: core/style-engine/src/table.rs
//! PURPOSE: The source table collaborator and an in-memory implementation.
//! CONTEXT: The engine never owns the bulk data. Everything it reads goes
//! through the `SourceTable` trait, which host adapters implement against
//! their own containers. `DataTable` is the column-oriented implementation
//! used by the bridge and the tests.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::describe::{describe_column, ColumnDescription};
use crate::error::{EngineError, EngineResult};
use crate::value::{CellValue, DType};

/// Read-only access to the host table.
///
/// Coordinates are source positions (0-based). Implementations must be
/// cheap for `value_at` and the label lookups, as they are called per cell.
pub trait SourceTable {
    /// Stable identity of the underlying table object.
    fn identity(&self) -> u64;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn value_at(&self, row: usize, col: usize) -> CellValue;

    fn row_label(&self, row: usize) -> String;

    fn column_label(&self, col: usize) -> String;

    fn dtype(&self, col: usize) -> DType;

    /// Name of the row index, shown in the legend.
    fn index_name(&self) -> Option<String> {
        None
    }

    /// Name of the column axis, shown in the legend.
    fn columns_name(&self) -> Option<String> {
        None
    }

    /// The host's own NaN predicate.
    fn is_nan(&self, value: &CellValue) -> Result<bool, String> {
        Ok(value.is_missing())
    }

    /// (min, max) over the non-missing values of a numeric, non-boolean
    /// column. `Ok(None)` for other dtypes and for columns without values.
    fn column_bounds(&self, col: usize) -> Result<Option<(f64, f64)>, String> {
        if !self.dtype(col).is_numeric() {
            return Ok(None);
        }

        let mut bounds: Option<(f64, f64)> = None;
        for row in 0..self.row_count() {
            let value = self.value_at(row, col);
            if value.is_missing() {
                continue;
            }
            let n = match value {
                CellValue::Number(n) => n,
                other => {
                    return Err(format!(
                        "non-numeric value {:?} in numeric column {}",
                        other, col
                    ))
                }
            };
            bounds = Some(match bounds {
                None => (n, n),
                Some((lo, hi)) => (lo.min(n), hi.max(n)),
            });
        }
        Ok(bounds)
    }

    /// Descriptive statistics of one column.
    fn describe(&self, col: usize) -> Result<ColumnDescription, String> {
        let values: Vec<CellValue> = (0..self.row_count()).map(|row| self.value_at(row, col)).collect();
        Ok(describe_column(self.dtype(col), &values))
    }
}

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// One column of a `DataTable`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub label: String,
    pub dtype: DType,
    pub values: Vec<CellValue>,
}

/// Column-oriented in-memory table.
#[derive(Debug, Clone)]
pub struct DataTable {
    identity: u64,
    row_labels: Vec<String>,
    columns: Vec<TableColumn>,
    index_name: Option<String>,
    columns_name: Option<String>,
}

impl DataTable {
    /// Creates a table without columns and the given row labels.
    pub fn new(row_labels: Vec<String>) -> Self {
        DataTable {
            identity: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            row_labels,
            columns: Vec::new(),
            index_name: None,
            columns_name: None,
        }
    }

    /// Creates a table with row labels "0", "1", ...
    pub fn with_default_index(rows: usize) -> Self {
        DataTable::new((0..rows).map(|r| r.to_string()).collect())
    }

    /// Builds a Float64 table from row-major numbers; columns are labelled
    /// "0", "1", ...
    pub fn from_numbers(rows: &[Vec<f64>]) -> EngineResult<Self> {
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut table = DataTable::with_default_index(rows.len());
        for col in 0..col_count {
            let values = rows
                .iter()
                .map(|row| row.get(col).copied().map(CellValue::Number).unwrap_or(CellValue::Empty))
                .collect();
            table.add_column(col.to_string(), DType::Float64, values)?;
        }
        Ok(table)
    }

    /// Appends a column. The number of values must match the row count.
    pub fn add_column(
        &mut self,
        label: impl Into<String>,
        dtype: DType,
        values: Vec<CellValue>,
    ) -> EngineResult<()> {
        let label = label.into();
        if values.len() != self.row_labels.len() {
            return Err(EngineError::InvalidArgument(format!(
                "column '{}' has {} values, table has {} rows",
                label,
                values.len(),
                self.row_labels.len()
            )));
        }
        self.columns.push(TableColumn { label, dtype, values });
        Ok(())
    }

    /// Builder form of `add_column`.
    pub fn with_column(
        mut self,
        label: impl Into<String>,
        dtype: DType,
        values: Vec<CellValue>,
    ) -> EngineResult<Self> {
        self.add_column(label, dtype, values)?;
        Ok(self)
    }

    pub fn set_index_name(&mut self, name: impl Into<String>) {
        self.index_name = Some(name.into());
    }

    pub fn set_columns_name(&mut self, name: impl Into<String>) {
        self.columns_name = Some(name.into());
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }
}

impl SourceTable for DataTable {
    fn identity(&self) -> u64 {
        self.identity
    }

    fn row_count(&self) -> usize {
        self.row_labels.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn value_at(&self, row: usize, col: usize) -> CellValue {
        self.columns
            .get(col)
            .and_then(|c| c.values.get(row))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    fn row_label(&self, row: usize) -> String {
        self.row_labels.get(row).cloned().unwrap_or_default()
    }

    fn column_label(&self, col: usize) -> String {
        self.columns.get(col).map(|c| c.label.clone()).unwrap_or_default()
    }

    fn dtype(&self, col: usize) -> DType {
        self.columns.get(col).map(|c| c.dtype).unwrap_or(DType::Object)
    }

    fn index_name(&self) -> Option<String> {
        self.index_name.clone()
    }

    fn columns_name(&self) -> Option<String> {
        self.columns_name.clone()
    }
}
