use crate::document::Table;
use crate::error::{JsonTableError, Result};
use crate::schema::{normalize_columns, normalize_name, ColumnType, ID_COLUMN};
use crate::value::{Row, Value};
use std::collections::BTreeMap;

/// A change to a table's schema, applied to the schema and every stored row.
///
/// The constructors normalize names and reject bad input early. `apply`
/// normalizes again, so a change built from the variants directly still
/// upper-cases names and never touches `ID`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaChange {
    AddColumns(BTreeMap<String, ColumnType>),
    RemoveColumns(Vec<String>),
    RenameColumns(BTreeMap<String, String>),
    RetypeColumns(BTreeMap<String, ColumnType>),
}

impl SchemaChange {
    /// New columns. An `ID` entry is ignored.
    pub fn add_columns<I, K, V>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let columns: Vec<(K, V)> = columns.into_iter().collect();
        if columns.is_empty() {
            return Err(JsonTableError::InvalidArgument("No columns to add".into()));
        }
        Ok(SchemaChange::AddColumns(normalize_columns(columns)?))
    }

    /// Columns to drop. `ID` is silently left out of the list.
    pub fn remove_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = columns.into_iter().collect();
        if names.is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "No columns to remove".into(),
            ));
        }
        Ok(SchemaChange::RemoveColumns(removal_list(&names)?))
    }

    /// Old name -> new name. `ID` can be neither.
    pub fn rename_columns<I, K, V>(renames: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let normalized = rename_map(renames)?;
        if normalized.is_empty() {
            return Err(JsonTableError::InvalidArgument("No columns to rename".into()));
        }
        Ok(SchemaChange::RenameColumns(normalized))
    }

    /// Column -> new type. An `ID` entry is ignored, it stays `int`.
    pub fn retype_columns<I, K, V>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let columns: Vec<(K, V)> = columns.into_iter().collect();
        if columns.is_empty() {
            return Err(JsonTableError::InvalidArgument("No columns to retype".into()));
        }
        Ok(SchemaChange::RetypeColumns(normalize_columns(columns)?))
    }

    /// The same change with upper-cased names and `ID` entries dropped,
    /// or refused for renames.
    pub fn normalized(&self) -> Result<Self> {
        Ok(match self {
            SchemaChange::AddColumns(columns) => SchemaChange::AddColumns(typed_columns(columns)?),
            SchemaChange::RemoveColumns(names) => SchemaChange::RemoveColumns(removal_list(names)?),
            SchemaChange::RenameColumns(renames) => SchemaChange::RenameColumns(rename_map(renames)?),
            SchemaChange::RetypeColumns(columns) => {
                SchemaChange::RetypeColumns(typed_columns(columns)?)
            }
        })
    }

    /// Human-readable description of this change.
    pub fn describe(&self) -> String {
        match self {
            SchemaChange::AddColumns(columns) if columns.is_empty() => {
                "No columns added".to_string()
            }
            SchemaChange::AddColumns(columns) => {
                format!("Added columns {}", describe_types(columns))
            }
            SchemaChange::RemoveColumns(columns) if columns.is_empty() => {
                "No columns removed".to_string()
            }
            SchemaChange::RemoveColumns(columns) => {
                format!("Removed columns {}", columns.join(", "))
            }
            SchemaChange::RenameColumns(renames) => {
                let pairs: Vec<String> = renames
                    .iter()
                    .map(|(old, new)| format!("{old} -> {new}"))
                    .collect();
                format!("Renamed columns {}", pairs.join(", "))
            }
            SchemaChange::RetypeColumns(columns) if columns.is_empty() => {
                "No column types changed".to_string()
            }
            SchemaChange::RetypeColumns(columns) => {
                format!("Changed column types {} (data not converted)", describe_types(columns))
            }
        }
    }

    /// Apply this change to a table in place. On error the table may be
    /// partially changed; callers discard it rather than saving.
    pub fn apply(&self, table: &mut Table) -> Result<()> {
        match &self.normalized()? {
            SchemaChange::AddColumns(columns) => {
                for (name, column_type) in columns {
                    table.columns_mut().insert(name.clone(), *column_type);
                    for row in table.rows_mut() {
                        row.entry(name.clone()).or_insert(Value::Null);
                    }
                }
            }
            SchemaChange::RemoveColumns(columns) => {
                ensure_declared(table, columns.iter())?;
                for name in columns {
                    table.columns_mut().remove(name);
                    for row in table.rows_mut() {
                        row.remove(name);
                    }
                }
            }
            SchemaChange::RenameColumns(renames) => {
                ensure_declared(table, renames.keys())?;

                let mut columns = BTreeMap::new();
                for (name, column_type) in table.columns() {
                    let target = renames.get(name).unwrap_or(name);
                    if columns.insert(target.clone(), *column_type).is_some() {
                        return Err(JsonTableError::InvalidArgument(format!(
                            "Renaming would give two columns the name '{target}'"
                        )));
                    }
                }
                *table.columns_mut() = columns;

                for row in table.rows_mut() {
                    let taken = std::mem::take(row);
                    *row = rename_keys(taken, renames);
                }
            }
            SchemaChange::RetypeColumns(columns) => {
                ensure_declared(table, columns.keys())?;
                for (name, column_type) in columns {
                    table.columns_mut().insert(name.clone(), *column_type);
                }
            }
        }
        Ok(())
    }
}

/// Upper-case the names of a typed column map, dropping `ID`.
fn typed_columns(columns: &BTreeMap<String, ColumnType>) -> Result<BTreeMap<String, ColumnType>> {
    let mut normalized = BTreeMap::new();
    for (name, column_type) in columns {
        let key = checked_name(name)?;
        if key != ID_COLUMN {
            normalized.insert(key, *column_type);
        }
    }
    Ok(normalized)
}

/// Upper-cased, deduplicated names to drop, without `ID`.
fn removal_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    let mut kept = Vec::with_capacity(names.len());
    for name in names {
        let name = checked_name(name.as_ref())?;
        if name != ID_COLUMN && !kept.contains(&name) {
            kept.push(name);
        }
    }
    Ok(kept)
}

fn rename_map<I, K, V>(renames: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut normalized = BTreeMap::new();
    for (old, new) in renames {
        let (old, new) = (checked_name(old.as_ref())?, checked_name(new.as_ref())?);
        if old == ID_COLUMN || new == ID_COLUMN {
            return Err(JsonTableError::InvalidArgument(format!(
                "The '{ID_COLUMN}' column cannot be renamed or overwritten"
            )));
        }
        normalized.insert(old, new);
    }
    Ok(normalized)
}

fn checked_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(JsonTableError::InvalidArgument(
            "Column names cannot be empty".into(),
        ));
    }
    Ok(normalize_name(name))
}

fn ensure_declared<'a>(table: &Table, names: impl Iterator<Item = &'a String>) -> Result<()> {
    for name in names {
        if !table.has_column(name) {
            return Err(JsonTableError::InvalidKey(format!(
                "The column '{name}' does not exist"
            )));
        }
    }
    Ok(())
}

fn describe_types(columns: &BTreeMap<String, ColumnType>) -> String {
    columns
        .iter()
        .map(|(name, column_type)| format!("{name} ({column_type})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rename keys of a row, descending into nested objects and arrays.
fn rename_keys(row: Row, renames: &BTreeMap<String, String>) -> Row {
    row.into_iter()
        .map(|(key, value)| {
            let normalized = normalize_name(&key);
            let key = match renames.get(&normalized) {
                Some(new) => new.clone(),
                None => key,
            };
            (key, rename_nested(value, renames))
        })
        .collect()
}

fn rename_nested(value: Value, renames: &BTreeMap<String, String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(rename_keys(map, renames)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_nested(item, renames))
                .collect(),
        ),
        other => other,
    }
}
