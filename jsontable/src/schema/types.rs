use crate::error::{JsonTableError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved identifier column, present in every table and always `int`.
pub const ID_COLUMN: &str = "ID";

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "double")]
    Float,
    #[serde(alias = "bool")]
    Boolean,
}

impl ColumnType {
    pub const ALLOWED: [&'static str; 4] = ["string", "int", "float", "boolean"];

    /// Parse a declared type name, case-insensitively.
    /// `integer`, `double` and `bool` are accepted as aliases.
    pub fn parse(raw: &str) -> Result<Self> {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "" => Err(JsonTableError::InvalidArgument(
                "Column type cannot be empty".into(),
            )),
            "string" => Ok(ColumnType::String),
            "int" | "integer" => Ok(ColumnType::Int),
            "float" | "double" => Ok(ColumnType::Float),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            _ => Err(JsonTableError::InvalidType(format!(
                "'{raw}' is not a valid column type, expected one of: {}",
                Self::ALLOWED.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case a table or column name for storage and lookup.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}

/// A validated table definition ready to be created in a document.
///
/// Only obtainable through [`TableSchema::build`], so the name is always
/// upper-cased and `ID: int` is always declared.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: BTreeMap<String, ColumnType>,
}

impl TableSchema {
    /// Build a table schema from a name and a column -> type map.
    ///
    /// Names are upper-cased, types validated, and the `ID: int` column is
    /// injected (or corrected if declared with another type).
    pub fn build<I, K, V>(table_name: &str, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if table_name.trim().is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "Table name cannot be empty".into(),
            ));
        }

        let mut normalized = normalize_columns(columns)?;
        normalized.insert(ID_COLUMN.to_string(), ColumnType::Int);

        Ok(TableSchema {
            name: normalize_name(table_name),
            columns: normalized,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &BTreeMap<String, ColumnType> {
        &self.columns
    }
}

/// Normalize a column -> type map: upper-case names, parse types.
/// Any `ID` entry is dropped; callers decide how the reserved column is handled.
pub(crate) fn normalize_columns<I, K, V>(columns: I) -> Result<BTreeMap<String, ColumnType>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut normalized = BTreeMap::new();

    for (name, raw_type) in columns {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "Column name cannot be empty".into(),
            ));
        }

        let key = normalize_name(name);
        if key == ID_COLUMN {
            continue;
        }

        let column_type = ColumnType::parse(raw_type.as_ref())?;
        normalized.insert(key, column_type);
    }

    Ok(normalized)
}

/// Schema file: table name -> column name -> type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub tables: BTreeMap<String, BTreeMap<String, String>>,
}

impl SchemaDefinition {
    /// Run every declared table through the schema builder.
    pub fn build(&self) -> Result<Vec<TableSchema>> {
        self.tables
            .iter()
            .map(|(name, columns)| TableSchema::build(name, columns))
            .collect()
    }
}
