use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonTableError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Broad error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidKey,
    InvalidType,
    Runtime,
}

impl JsonTableError {
    /// Collapse wrapper variants (I/O, encoding) into the runtime category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JsonTableError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            JsonTableError::InvalidKey(_) => ErrorKind::InvalidKey,
            JsonTableError::InvalidType(_) => ErrorKind::InvalidType,
            JsonTableError::Runtime(_)
            | JsonTableError::Io(_)
            | JsonTableError::Json(_)
            | JsonTableError::Yaml(_) => ErrorKind::Runtime,
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonTableError>;
