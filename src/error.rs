//! Error types for rowmap.

use thiserror::Error;

/// The main error type for mapping operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// The record type was never passed to `add_table`.
    #[error("Unknown table for type: {0}")]
    UnregisteredType(&'static str),

    /// A column descriptor failed validation at registration time.
    #[error("Invalid column for table `{table}`: {message}")]
    InvalidColumn { table: String, message: String },

    /// Every column of the record was unset, so there is nothing to insert.
    #[error("Nothing to insert into `{table}`: every mapped field is empty")]
    NothingToInsert { table: String },

    /// The update data touched no mapped column.
    #[error("Nothing to update in `{table}`: no mapped column in update data")]
    NothingToUpdate { table: String },

    /// An update needs at least one primary key column to build its WHERE clause.
    #[error("Table `{table}` has no primary key column")]
    MissingPrimaryKey { table: String },

    /// Raw insert with mismatched column and value lists.
    #[error("Expected {expected} values, got {got}")]
    ValueCount { expected: usize, got: usize },

    /// A stored value does not fit the field it is written into.
    #[error("Cannot convert column `{column}`: expected {expected}, found {found}")]
    Conversion {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// JSON encoding of a serialize-flagged column failed.
    #[error("Failed to encode column `{column}`: {source}")]
    Serialize {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON decoding of a serialize-flagged column failed.
    #[error("Failed to decode column `{column}`: {source}")]
    Deserialize {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    /// The executor reported a failure.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of a [`MapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Programmer misuse: unregistered types, bad descriptors, empty statements.
    Configuration,
    /// The database rejected or failed to run a statement.
    Execution,
    /// A value could not be encoded, decoded or converted.
    Serialization,
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnregisteredType(_)
            | Self::InvalidColumn { .. }
            | Self::NothingToInsert { .. }
            | Self::NothingToUpdate { .. }
            | Self::MissingPrimaryKey { .. }
            | Self::ValueCount { .. }
            | Self::Config(_)
            | Self::Io(_) => ErrorKind::Configuration,
            Self::Execution(_) => ErrorKind::Execution,
            Self::Conversion { .. } | Self::Serialize { .. } | Self::Deserialize { .. } => {
                ErrorKind::Serialization
            }
        }
    }

    /// Create an invalid column error for the given table.
    pub fn invalid_column(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidColumn {
            table: table.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for MapError {
    fn from(err: sqlx::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

/// Result type alias for mapping operations.
pub type MapResult<T> = Result<T, MapError>;
