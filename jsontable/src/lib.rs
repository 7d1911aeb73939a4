pub mod adapter;
pub mod document;
pub mod error;
pub mod migration;
pub mod query;
pub mod schema;
pub mod store;
pub mod validation;
pub mod value;

pub use adapter::{FileAdapter, MemoryAdapter, PersistenceAdapter};
pub use document::{Document, Table};
pub use error::{ErrorKind, JsonTableError, Result};
pub use migration::SchemaChange;
pub use query::{FilterCriterion, Pattern};
pub use schema::{ColumnType, SchemaDefinition, TableSchema, ID_COLUMN};
pub use store::Store;
pub use validation::{RowBatch, ValidationResult};
pub use value::{Row, Value};
