//! Error types for all cinefeed operations.

use std::io;
use thiserror::Error;

/// Top-level error type for cinefeed operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} \"{id}\" not found.")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no id greater than the last issued one is available")]
    IdSpaceExhausted,
}

/// Coarse classification of an [`Error`], used at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StoreWrite,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::StoreWrite => "StoreWriteError",
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }
}

impl Error {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Error::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Query(_) | Error::Validation(_) => ErrorKind::InvalidArgument,
            Error::Storage(_) | Error::IdSpaceExhausted => ErrorKind::StoreWrite,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupted journal: {0}")]
    Corrupted(String),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("journal file is locked")]
    FileLocked,

    #[error("journal is unusable after a failed write could not be rolled back")]
    JournalPoisoned,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("limit must be a positive integer (got {0})")]
    InvalidLimit(i64),

    #[error("\"after\" and \"before\" cursors cannot be used together")]
    ConflictingCursors,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("{entity}: missing required attribute '{attribute}'")]
    MissingAttribute { entity: String, attribute: String },

    #[error("{entity}: unknown attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("{entity}: attribute '{attribute}' is managed by the store")]
    ReservedAttribute { entity: String, attribute: String },

    #[error("{entity}: attribute '{attribute}' must be a {expected}")]
    TypeMismatch {
        entity: String,
        attribute: String,
        expected: &'static str,
    },

    #[error("{entity}: input must be a JSON object")]
    NotAnObject { entity: String },
}

pub type Result<T> = std::result::Result<T, Error>;
