//! Error types for the mail crate

use std::path::PathBuf;

/// Errors produced while building queries, extracting messages and
/// performing actions on them.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// A date filter used mixed separators, did not parse, or is not in the past
    #[error("Date argument {value:?} {reason}")]
    InvalidDateFormat { value: String, reason: String },

    /// No search terms were supplied
    #[error("No search terms provided")]
    EmptyQuery,

    /// Maximum result count outside 1..=500
    #[error("Invalid max {0}. Must be integer between 1 and 500 inclusive.")]
    InvalidMaxResults(usize),

    /// Two search fields claim the same command-line alias
    #[error("Alias {alias:?} used by both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: &'static str,
        second: &'static str,
    },

    /// Target directory or file is not writable
    #[error("{} is not a valid path, or you lack write permission", .0.display())]
    InvalidPath(PathBuf),

    /// A key path did not resolve to a list of strings in a JSON document
    #[error("Key error parsing JSON file: {0}")]
    JsonIndex(String),

    /// A label with the requested name already exists and overwriting is disabled
    #[error("Label {0:?} already in use, but overwriting is disabled")]
    LabelExists(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by the Gmail API client or the OAuth flow
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_date(value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDateFormat {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
