use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BerthError {
    /// The document at the given path does not exist. Callers that treat
    /// absence as "fall back to defaults" match on this variant.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0}")]
    ExternalCommand(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl BerthError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BerthError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BerthError>;
