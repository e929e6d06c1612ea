//! Error types for the CLI.
//!
//! Every stage of a run (config, input, generation, output) has its own
//! error enum; [`CliError`] wraps them all.

use std::path::PathBuf;
use thiserror::Error;
use zebrapack::{GenError, SchemaError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error reading the identities input.
    #[error("Failed to load identities: {0}")]
    Load(#[from] LoadError),

    /// Error during code generation.
    #[error("Failed to generate code: {0}")]
    Generate(#[from] GenerateError),

    /// Error exporting the schema descriptor.
    #[error("Failed to export schema: {0}")]
    Schema(#[from] SchemaError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error writing output files.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// Refused to proceed (for example, an existing file without `--force`).
    #[error("{0}")]
    Validation(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error reading the identities input.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not a valid identities document.
    #[error("Invalid identities JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    /// Input parsed but holds no identities.
    #[error("No identities found in {path}")]
    Empty { path: PathBuf },
}

/// Error during code generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The core generator failed for the whole batch.
    #[error("{0}")]
    Core(#[from] GenError),

    /// Some identities failed and `--keep-going` was not given.
    #[error("{} identity(ies) failed: {}", .names.len(), .names.join(", "))]
    Failed { names: Vec<String> },
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error writing output files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output sink failed while generated code streamed into it.
    #[error("Output for {path} failed: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: GenError,
    },
}

impl LoadError {
    /// Create an invalid JSON error.
    pub fn invalid_json(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            path,
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_lists_names() {
        let err = GenerateError::Failed {
            names: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "2 identity(ies) failed: A, B");
    }

    #[test]
    fn test_core_error_wraps_into_cli_error() {
        let err: CliError = GenerateError::from(GenError::missing_zid("P", "x")).into();
        assert!(err.to_string().starts_with("Failed to generate code: struct 'P'"));
    }

    #[test]
    fn test_sink_error_names_target() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no space");
        let err: CliError = WriteError::Sink {
            path: PathBuf::from("gen/out.rs"),
            source: GenError::sink(&io),
        }
        .into();
        let text = err.to_string();
        assert!(text.starts_with("Failed to write output: Output for gen/out.rs failed"));
        assert!(text.contains("no space"));
    }
}
