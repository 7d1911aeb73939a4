mod parser;
mod types;

pub use parser::{parse_schema, parse_schema_str};
pub(crate) use types::normalize_columns;
pub use types::{normalize_name, ColumnType, SchemaDefinition, TableSchema, ID_COLUMN};
