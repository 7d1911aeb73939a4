// Document model - the whole database as written to a single JSON file

use crate::schema::{normalize_name, ColumnType, TableSchema, ID_COLUMN};
use crate::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full persisted collection of tables, keyed by upper-cased table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    tables: BTreeMap<String, Table>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table by name, case-insensitively.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&normalize_name(name))
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&normalize_name(name))
    }

    /// Insert or replace a table. Returns the previous table under that name.
    pub(crate) fn put_table(&mut self, name: &str, table: Table) -> Option<Table> {
        self.tables.insert(normalize_name(name), table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A table: its schema, its rows in storage order, and the next ID to assign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "COLUMNS", default)]
    columns: BTreeMap<String, ColumnType>,
    #[serde(rename = "VALUES", default)]
    rows: Vec<Row>,
    #[serde(rename = "ID", default)]
    cursor: Option<i64>,
}

impl Table {
    pub(crate) fn from_schema(schema: &TableSchema) -> Self {
        Table {
            columns: schema.columns().clone(),
            rows: Vec::new(),
            cursor: None,
        }
    }

    pub fn columns(&self) -> &BTreeMap<String, ColumnType> {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The identifier the next insert will receive. `None` until the first insert.
    pub fn next_id(&self) -> Option<i64> {
        self.cursor
    }

    /// A table entry with no schema, rows or cursor, e.g. `"PERSON": {}`.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty() && self.cursor.is_none()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(&normalize_name(name)).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&normalize_name(name))
    }

    /// Position of the row carrying the given ID.
    pub fn position_of(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|row| row_id(row) == Some(id))
    }

    /// Assign the next ID to `row`, advance the cursor and append the row.
    pub(crate) fn append(&mut self, mut row: Row) -> i64 {
        let id = self.cursor.unwrap_or(0);
        row.insert(ID_COLUMN.to_string(), Value::Int(id));
        self.rows.push(row);
        self.cursor = Some(id + 1);
        id
    }

    /// Drop every row and restart ID assignment at 0.
    pub(crate) fn clear(&mut self) {
        self.rows.clear();
        self.cursor = Some(0);
    }

    pub(crate) fn columns_mut(&mut self) -> &mut BTreeMap<String, ColumnType> {
        &mut self.columns
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }
}

/// The `ID` of a row, if it carries an integer one.
pub fn row_id(row: &Row) -> Option<i64> {
    row.get(ID_COLUMN).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn person_table() -> Table {
        let schema = TableSchema::build("person", [("first_name", "string")]).unwrap();
        Table::from_schema(&schema)
    }

    #[test]
    fn test_new_table_serializes_with_null_cursor() {
        let mut doc = Document::new();
        doc.put_table("person", person_table());

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "PERSON": {
                    "COLUMNS": { "FIRST_NAME": "string", "ID": "int" },
                    "VALUES": [],
                    "ID": null
                }
            })
        );
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let mut table = person_table();
        assert_eq!(table.next_id(), None);

        for expected in 0..3 {
            let id = table.append(Row::from([("FIRST_NAME".to_string(), Value::from("x"))]));
            assert_eq!(id, expected);
        }

        assert_eq!(table.next_id(), Some(3));
        assert_eq!(table.position_of(2), Some(2));
        assert_eq!(table.rows()[1]["ID"], Value::Int(1));
    }

    #[test]
    fn test_clear_resets_cursor_to_zero() {
        let mut table = person_table();
        table.append(Row::new());
        table.append(Row::new());

        table.clear();
        assert!(table.rows().is_empty());
        assert_eq!(table.next_id(), Some(0));
        assert_eq!(table.append(Row::new()), 0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut doc = Document::new();
        doc.put_table("Person", person_table());

        assert!(doc.table("person").is_some());
        assert!(doc.table("PERSON").is_some());
        assert_eq!(doc.table_names().collect::<Vec<_>>(), vec!["PERSON"]);
        assert!(doc.table("person").unwrap().has_column("first_name"));
    }

    #[test]
    fn test_empty_table_entry_loads() {
        let doc: Document = serde_json::from_str(r#"{"PERSON": {}}"#).unwrap();
        assert!(doc.table("person").unwrap().is_empty());
    }
}
