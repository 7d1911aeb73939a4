use crate::adapter::{FileAdapter, MemoryAdapter, PersistenceAdapter};
use crate::document::{row_id, Document, Table};
use crate::error::{JsonTableError, Result};
use crate::migration::SchemaChange;
use crate::schema::{normalize_name, ColumnType, SchemaDefinition, TableSchema, ID_COLUMN};
use crate::validation::{self, RowBatch, ValidationResult};
use std::collections::BTreeMap;
use std::path::Path;

/// The main entry point: a table store over one persisted document.
///
/// Every mutation loads the whole document, changes one table and saves the
/// whole document back. Nothing is saved when any step fails. There is no
/// locking; concurrent writers to the same resource can lose updates.
pub struct Store<A: PersistenceAdapter = FileAdapter> {
    adapter: A,
}

impl Store<FileAdapter> {
    /// Open a store backed by a JSON file. The file is not required to exist
    /// yet; it is created by the first `create` or `create_table`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Store::with_adapter(FileAdapter::new(path)?))
    }
}

impl Store<MemoryAdapter> {
    /// A store holding its document in memory.
    pub fn in_memory() -> Self {
        Store::with_adapter(MemoryAdapter::new())
    }
}

impl<A: PersistenceAdapter> Store<A> {
    pub fn with_adapter(adapter: A) -> Self {
        Store { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Whether the backing document exists.
    pub fn exists(&self) -> bool {
        self.adapter.exists()
    }

    /// Load the full document.
    pub fn load(&self) -> Result<Document> {
        self.adapter.load()
    }

    /// Names of all tables in the document.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let document = self.adapter.load()?;
        Ok(document.table_names().map(str::to_string).collect())
    }

    // ── Tables ──────────────────────────────────────────────────────

    /// Create a brand new document holding only this table.
    /// Fails with `Runtime` if the document already exists.
    pub fn create(&self, schema: &TableSchema) -> Result<()> {
        if self.adapter.exists() {
            return Err(JsonTableError::Runtime(
                "The database already exists".into(),
            ));
        }

        let mut document = Document::new();
        document.put_table(schema.name(), Table::from_schema(schema));
        self.adapter.save(&document)?;

        log::info!("Created database with table {}", schema.name());
        Ok(())
    }

    /// Add a table to the document, creating the document if needed.
    /// A table already present under the same name is replaced by an empty one.
    pub fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let mut document = if self.adapter.exists() {
            self.adapter.load()?
        } else {
            Document::new()
        };

        if document
            .put_table(schema.name(), Table::from_schema(schema))
            .is_some()
        {
            log::warn!("Table {} already existed and was replaced", schema.name());
        }
        self.adapter.save(&document)?;

        log::info!(
            "Created table {} with {} columns",
            schema.name(),
            schema.columns().len()
        );
        Ok(())
    }

    /// Create every table of a schema definition that the document lacks.
    /// Existing tables are left untouched; empty placeholder entries such as
    /// `"PERSON": {}` are filled in. Returns the names created.
    pub fn apply_schema(&self, definition: &SchemaDefinition) -> Result<Vec<String>> {
        let schemas = definition.build()?;

        let mut document = if self.adapter.exists() {
            self.adapter.load()?
        } else {
            Document::new()
        };

        let mut created = Vec::new();
        for schema in &schemas {
            if verified_table(&document, schema.name()).is_err() {
                document.put_table(schema.name(), Table::from_schema(schema));
                created.push(schema.name().to_string());
            }
        }

        if !created.is_empty() || !self.adapter.exists() {
            self.adapter.save(&document)?;
        }

        log::info!("Schema applied, created tables: {created:?}");
        Ok(created)
    }

    /// Fetch a table by name, case-insensitively.
    pub fn get_table(&self, name: &str) -> Result<Table> {
        check_table_name(name)?;
        let document = self.adapter.load()?;
        verified_table(&document, name).cloned()
    }

    /// The column -> type map of a table, `ID` included.
    pub fn get_columns(&self, name: &str) -> Result<BTreeMap<String, ColumnType>> {
        Ok(self.get_table(name)?.columns().clone())
    }

    /// The identifier the next insert into this table will receive,
    /// `None` before the first insert.
    pub fn next_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.get_table(name)?.next_id())
    }

    // ── Rows ────────────────────────────────────────────────────────

    /// Append validated rows, assigning IDs in order from the table's cursor.
    /// Returns the assigned IDs.
    pub fn insert(&self, batch: RowBatch) -> Result<Vec<i64>> {
        let table_name = batch.table_name().to_string();
        let rows = batch.into_rows();

        let ids = self.mutate(&table_name, |table| {
            Ok(rows.into_iter().map(|row| table.append(row)).collect::<Vec<_>>())
        })?;

        log::debug!("Inserted {} rows into {table_name}, ids {ids:?}", ids.len());
        Ok(ids)
    }

    /// Merge validated rows into stored rows with the same `ID`.
    ///
    /// Fields absent from an update row are left as they are. Update rows
    /// whose `ID` matches no stored row are skipped. Returns the number of
    /// rows applied.
    pub fn update(&self, batch: RowBatch) -> Result<usize> {
        if batch.is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "Nothing to update, no rows given".into(),
            ));
        }
        if batch.rows().iter().any(|row| row_id(row).is_none()) {
            return Err(JsonTableError::InvalidArgument(format!(
                "Every update row needs an '{ID_COLUMN}'"
            )));
        }

        let table_name = batch.table_name().to_string();
        let rows = batch.into_rows();

        let applied = self.mutate(&table_name, |table| {
            let mut applied = 0;
            for update in rows {
                let Some(id) = row_id(&update) else {
                    continue;
                };
                let Some(position) = table.position_of(id) else {
                    log::warn!("No row with {ID_COLUMN} {id} in {table_name}, update skipped");
                    continue;
                };

                let stored = &mut table.rows_mut()[position];
                for (key, value) in update {
                    if key != ID_COLUMN {
                        stored.insert(key, value);
                    }
                }
                applied += 1;
            }
            Ok(applied)
        })?;

        log::debug!("Updated {applied} rows in {table_name}");
        Ok(applied)
    }

    /// Remove one row by `id`, or every row with `remove_all`.
    ///
    /// Removing one row leaves the cursor alone, so its ID is never reused.
    /// Removing all rows resets the cursor to 0. Returns the number of rows removed.
    pub fn remove(&self, table_name: &str, id: Option<i64>, remove_all: bool) -> Result<usize> {
        let removed = match (id, remove_all) {
            (Some(_), true) => {
                return Err(JsonTableError::InvalidArgument(
                    "Give either an id or remove_all, not both".into(),
                ));
            }
            (None, false) => {
                return Err(JsonTableError::InvalidArgument(
                    "Give an id to remove, or remove_all".into(),
                ));
            }
            (None, true) => self.mutate(table_name, |table| {
                let count = table.rows().len();
                table.clear();
                Ok(count)
            })?,
            (Some(id), false) => self.mutate(table_name, |table| {
                let position = table.position_of(id).ok_or_else(|| {
                    JsonTableError::InvalidArgument(format!(
                        "No row with {ID_COLUMN} {id} in '{}'",
                        normalize_name(table_name)
                    ))
                })?;
                table.rows_mut().remove(position);
                Ok(1)
            })?,
        };

        log::debug!("Removed {removed} rows from {}", normalize_name(table_name));
        Ok(removed)
    }

    // ── Schema evolution ────────────────────────────────────────────

    /// Declare new columns; existing rows get `null` for each.
    pub fn add_column<I, K, V>(&self, table_name: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.alter(table_name, &SchemaChange::add_columns(columns)?)
    }

    /// Drop columns from the schema and from every row. `ID` is never dropped.
    pub fn remove_column<I, S>(&self, table_name: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.alter(table_name, &SchemaChange::remove_columns(columns)?)
    }

    /// Rename columns (old -> new) in the schema and in every row.
    pub fn rename_column<I, K, V>(&self, table_name: &str, renames: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.alter(table_name, &SchemaChange::rename_columns(renames)?)
    }

    /// Change the declared type of columns. Stored values are not converted.
    pub fn update_column_type<I, K, V>(&self, table_name: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.alter(table_name, &SchemaChange::retype_columns(columns)?)
    }

    /// Apply a schema change to one table through a load-modify-save cycle.
    /// Names are normalized and `ID` is protected however `change` was built.
    pub fn alter(&self, table_name: &str, change: &SchemaChange) -> Result<()> {
        let change = change.normalized()?;
        self.mutate(table_name, |table| change.apply(table))?;
        log::info!("{}: {}", normalize_name(table_name), change.describe());
        Ok(())
    }

    // ── Maintenance ─────────────────────────────────────────────────

    /// Audit the stored rows of every table against its current schema.
    pub fn validate_all(&self) -> Result<BTreeMap<String, ValidationResult>> {
        let document = self.adapter.load()?;
        Ok(document
            .table_names()
            .filter_map(|name| {
                document
                    .table(name)
                    .map(|table| (name.to_string(), validation::audit_table(table)))
            })
            .collect())
    }

    /// Load, hand the named table to `f`, and save only if `f` succeeds.
    fn mutate<R>(&self, table_name: &str, f: impl FnOnce(&mut Table) -> Result<R>) -> Result<R> {
        check_table_name(table_name)?;
        let mut document = self.adapter.load()?;
        verified_table(&document, table_name)?;

        let table = document
            .table_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        let result = f(table)?;

        self.adapter.save(&document)?;
        Ok(result)
    }
}

fn check_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(JsonTableError::InvalidArgument(
            "Table name cannot be empty".into(),
        ));
    }
    Ok(())
}

/// A table that is present and not an empty placeholder.
pub(crate) fn verified_table<'d>(document: &'d Document, name: &str) -> Result<&'d Table> {
    match document.table(name) {
        Some(table) if !table.is_empty() => Ok(table),
        _ => Err(table_not_found(name)),
    }
}

fn table_not_found(name: &str) -> JsonTableError {
    JsonTableError::InvalidArgument(format!(
        "The table '{}' does not exist",
        normalize_name(name)
    ))
}
