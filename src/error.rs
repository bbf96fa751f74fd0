use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(String),
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unsupported attachment type: {0}")]
    UnsupportedAttachment(String),
    #[error("Failed to read attachment {name}: {source}")]
    Attachment {
        name: String,
        source: std::io::Error,
    },
    #[error("Authentication required")]
    AuthRequired,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Chat stream failed: {0}")]
    Stream(String),
}
impl WorkbenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkbenchError::Io {
            path: path.into(),
            source,
        }
    }
    pub(crate) fn pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        WorkbenchError::InvalidPattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}
pub type Result<T> = std::result::Result<T, WorkbenchError>;
