use thiserror::Error;

/// Error type shared across schemafs crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure while reading or writing the schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Statement or query failure reported by the executor.
    #[error("database error: {0}")]
    Db(String),
    /// A column default looks like a serial sequence but its type has no serial shorthand.
    #[error("serial mapping not found for {data_type} ({table}.{column})")]
    SerialMapping {
        table: String,
        column: String,
        data_type: String,
    },
    /// A file failed again before any other file could be replayed.
    #[error("error processing file {file}: {message}")]
    Restore { file: String, message: String },
    /// A catalog row could not be turned into a typed record.
    #[error("invalid catalog record: {0}")]
    InvalidRecord(String),
}

/// Convenience alias for results returned by schemafs crates.
pub type Result<T> = std::result::Result<T, Error>;
