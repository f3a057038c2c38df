//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or rendering configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A field holds a value the engine cannot use
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the offending field, e.g. `chain.ceiling`.
        field: String,
        /// Description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid value error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn read_file_display() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
    }

    #[test]
    fn invalid_value_display() {
        let err = ConfigError::invalid("stream.buffer_size", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid value for 'stream.buffer_size': must be greater than 0"
        );
    }

    #[test]
    fn read_file_source_is_some() {
        let err = ConfigError::read_file("/x", mock_io_err());
        assert!(err.source().is_some(), "ReadFile must expose I/O source");
    }

    #[test]
    fn invalid_value_source_is_none() {
        let err = ConfigError::invalid("filter.center_freq", "r");
        assert!(err.source().is_none());
    }
}
