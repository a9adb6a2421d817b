use thiserror::Error;

use crate::schema::DataType;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("flatten is not supported on primitive root column '{column}' ({data_type:?})")]
    UnsupportedRootType { column: String, data_type: DataType },

    #[error("leaf column '{column}' has no flat output type for {data_type}")]
    UnsupportedLeafType { column: String, data_type: String },

    #[error("invalid list offsets in '{column}': {detail}")]
    OffsetRange { column: String, detail: String },

    #[error("lists '{first}' and '{second}' both repeat at level {level}")]
    ConflictingRepetition {
        level: usize,
        first: String,
        second: String,
    },

    #[error("duplicate output column '{0}'")]
    DuplicateColumn(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
