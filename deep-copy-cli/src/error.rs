//! Error types for the CLI.
//!
//! This module defines all error types used throughout the CLI,
//! providing detailed error messages with context for debugging.

use deep_copy::{DestinationError, GenerateError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error while loading the Go package.
    #[error("Failed to analyze package: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error during routine generation.
    #[error("Failed to generate copy routines: {0}")]
    Generate(#[from] GenerateError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Generated output is out of date (`--check`).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DestinationError> for CliError {
    fn from(error: DestinationError) -> Self {
        Self::Generate(GenerateError::Destination(error))
    }
}

/// Error while discovering, reading or parsing Go sources.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Package path does not exist.
    #[error("Package not found: {path}")]
    PackageNotFound { path: PathBuf },

    /// No Go files to analyze.
    #[error("No Go source files found in: {path}")]
    NoSourceFiles { path: PathBuf },

    /// Invalid glob pattern.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Syntax error in Go source.
    #[error("Syntax error in {file}:{line}:{column}: {message}")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Files declare different packages.
    #[error("Found packages {first} and {second} in {file}")]
    MixedPackages {
        first: String,
        second: String,
        file: PathBuf,
    },

    /// The same type is declared twice.
    #[error("Type '{name}' redeclared in {file}:{line}")]
    DuplicateType {
        name: String,
        file: PathBuf,
        line: usize,
    },

    /// IO error reading a file.
    #[error("Failed to read {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from ignore crate walker.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// Multiple errors collected.
    #[error("Multiple analysis errors:\n{}", format_errors(.0))]
    Multiple(Vec<AnalysisError>),
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

impl AnalysisError {
    /// Create a syntax error.
    pub fn syntax(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a package not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::PackageNotFound { path: path.into() }
    }

    /// Create a no source files error.
    pub fn no_source_files(path: impl Into<PathBuf>) -> Self {
        Self::NoSourceFiles { path: path.into() }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of errors into one.
    pub fn from_many(mut errors: Vec<AnalysisError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path: path.into(),
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

/// Format multiple errors for display.
fn format_errors(errors: &[AnalysisError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = AnalysisError::syntax("pkg/a.go", 3, 7, "expected type, found '}'");
        assert_eq!(
            err.to_string(),
            "Syntax error in pkg/a.go:3:7: expected type, found '}'"
        );
    }

    #[test]
    fn test_from_many() {
        assert!(AnalysisError::from_many(vec![]).is_none());

        let single = AnalysisError::from_many(vec![AnalysisError::not_found("x")]).unwrap();
        assert!(matches!(single, AnalysisError::PackageNotFound { .. }));

        let many = AnalysisError::from_many(vec![
            AnalysisError::no_source_files("a"),
            AnalysisError::no_source_files("b"),
        ])
        .unwrap();
        let message = many.to_string();
        assert!(message.contains("  1. No Go source files found in: a"));
        assert!(message.contains("  2. No Go source files found in: b"));
    }

    #[test]
    fn test_cli_error_wraps_destination() {
        let err: CliError = DestinationError::Open {
            path: PathBuf::from("out.go"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }
        .into();
        assert!(matches!(
            err,
            CliError::Generate(GenerateError::Destination(_))
        ));
    }
}
