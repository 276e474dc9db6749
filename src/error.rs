//! Error types for schema storage

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema storage errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema not found: {name}")]
    NotFound { name: String },

    #[error("Invalid schema name: {0}")]
    InvalidName(String),

    #[error("Invalid schema file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// True when the schema (or its import file) does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(SchemaError::not_found("sales").is_not_found());
        assert!(!SchemaError::InvalidName("Sales".into()).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!SchemaError::from(io).is_not_found());
    }

    #[test]
    fn test_display() {
        let err = SchemaError::not_found("sales");
        assert_eq!(err.to_string(), "Schema not found: sales");
    }
}
