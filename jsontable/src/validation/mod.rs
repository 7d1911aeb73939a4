use crate::adapter::PersistenceAdapter;
use crate::document::Table;
use crate::error::{JsonTableError, Result};
use crate::schema::{normalize_name, ID_COLUMN};
use crate::store::Store;
use crate::value::Row;

/// Rows checked against a table's schema, ready for `insert` or `update`.
///
/// Only obtainable through [`RowBatch::new`], so the store never sees rows
/// that failed validation. Keys are upper-cased on construction.
#[derive(Debug, Clone)]
pub struct RowBatch {
    table: String,
    rows: Vec<Row>,
}

impl RowBatch {
    /// Validate `rows` against the current schema of `table_name`.
    ///
    /// Fails with `InvalidArgument` if the table does not exist, `InvalidKey`
    /// if a row names an undeclared column, and `InvalidType` if a value does
    /// not match its column's declared type.
    pub fn new<A: PersistenceAdapter>(
        store: &Store<A>,
        table_name: &str,
        rows: Vec<Row>,
    ) -> Result<Self> {
        let table = store.get_table(table_name)?;
        check_columns(&table, table_name, &rows)?;
        check_types(&table, &rows)?;

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (normalize_name(&key), value))
                    .collect()
            })
            .collect();

        Ok(RowBatch {
            table: normalize_name(table_name),
            rows,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Every key of every row must be a declared column.
pub fn check_columns(table: &Table, table_name: &str, rows: &[Row]) -> Result<()> {
    for row in rows {
        for key in row.keys() {
            if !table.has_column(key) {
                return Err(JsonTableError::InvalidKey(format!(
                    "The '{key}' key does not exist in the columns of '{}', add the column first",
                    normalize_name(table_name)
                )));
            }
        }
    }
    Ok(())
}

/// Every value must match its column's declared type.
pub fn check_types(table: &Table, rows: &[Row]) -> Result<()> {
    for row in rows {
        for (key, value) in row {
            let Some(expected) = table.column_type(key) else {
                continue;
            };
            if !value.matches(expected) {
                return Err(JsonTableError::InvalidType(format!(
                    "The '{key}' value must be of type '{expected}', '{}' provided",
                    value.describe_type()
                )));
            }
        }
    }
    Ok(())
}

/// Result of auditing the rows already stored in a table
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Audit stored rows against the table's current schema.
///
/// Stored data is never coerced when a column is retyped, so rows can drift
/// from the schema. Mismatched values, undeclared keys and bad IDs are
/// errors; null cells (left by `add_column`) are warnings.
pub fn audit_table(table: &Table) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (index, row) in table.rows().iter().enumerate() {
        match row.get(ID_COLUMN).and_then(|v| v.as_i64()) {
            Some(_) => {}
            None => result
                .errors
                .push(format!("Row #{index} has no integer '{ID_COLUMN}'")),
        }

        for (key, value) in row {
            if key == ID_COLUMN {
                continue;
            }
            match table.column_type(key) {
                None => result
                    .errors
                    .push(format!("Row #{index} has undeclared column '{key}'")),
                Some(_) if value.is_null() => result
                    .warnings
                    .push(format!("Row #{index} has no value for '{key}'")),
                Some(expected) if !value.matches(expected) => result.errors.push(format!(
                    "Row #{index} column '{key}' expected {expected}, got {}",
                    value.describe_type()
                )),
                Some(_) => {}
            }
        }
    }

    result
}
