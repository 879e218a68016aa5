//! Error types for the generation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Error raised while planning, synthesizing or emitting routines.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A requested or referenced type is not declared in the package.
    #[error("Type '{name}' not found{}", fmt_referenced(.referenced_from))]
    TypeNotFound {
        name: String,
        referenced_from: Option<String>,
    },

    /// The routine name is already taken on the target type.
    #[error("Cannot generate {method} for '{type_name}': {reason}")]
    RoutineNameCollision {
        type_name: String,
        method: String,
        reason: String,
    },

    /// The type cannot carry a generated routine.
    #[error("Unsupported type '{type_name}': {reason}")]
    Unsupported { type_name: String, reason: String },

    /// The generation request itself is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The destination could not be opened or written.
    #[error(transparent)]
    Destination(#[from] DestinationError),
}

impl GenerateError {
    pub fn not_found(name: impl Into<String>, referenced_from: Option<&str>) -> Self {
        Self::TypeNotFound {
            name: name.into(),
            referenced_from: referenced_from.map(String::from),
        }
    }

    pub fn collision(
        type_name: impl Into<String>,
        method: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RoutineNameCollision {
            type_name: type_name.into(),
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Error opening or writing the output destination.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// Failed to open (or create) the destination file.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the output unit.
    #[error("Failed to write {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

fn fmt_referenced(from: &Option<String>) -> String {
    match from {
        Some(owner) => format!(" (referenced from '{owner}')"),
        None => String::new(),
    }
}
