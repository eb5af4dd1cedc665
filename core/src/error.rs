use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Unknown record kind '{name}'")]
    UnknownKind { name: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a snapshot candidate was refused by the import gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatViolation {
    #[error("snapshot is not a JSON object")]
    NotAnObject,

    #[error("snapshot has no version tag")]
    MissingVersion,

    #[error("snapshot has no actions field")]
    MissingActions,

    #[error("field '{field}' must be an array")]
    NotAnArray { field: &'static str },

    #[error("record {index} in '{field}' is malformed: {reason}")]
    BadRecord {
        field: &'static str,
        index: usize,
        reason: String,
    },

    #[error("currentGameDay is not a number: {found}")]
    BadGameDay { found: String },
}

/// A rejected import. State is untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Import text is not valid JSON: {0}")]
    Parse(String),

    #[error("Invalid snapshot format: {0}")]
    Format(#[from] FormatViolation),
}
