//! # deep-copy-cli
//!
//! CLI library for generating Go deep-copy methods from Go source files.
//!
//! This crate provides the Go front end of the `deep-copy` tool: it finds a
//! package's sources, parses their declarations into the type model of the
//! [`deep_copy`] engine, and writes the generated routines.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`scanner`] - Source file discovery
//! - [`lexer`] - Go tokenizer with automatic semicolon insertion
//! - [`parser`] - Go declaration parsing and type extraction
//! - [`loader`] - Merging parsed files into one package
//! - [`writer`] - Output and check-mode support
//! - [`error`] - Error types and handling

pub mod config;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod scanner;
pub mod writer;

// Re-export main types for convenience
pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use loader::PackageLoader;
pub use parser::{GoParser, ParsedFile};
pub use scanner::{SourceFile, SourceScanner};
pub use writer::{OutputWriter, WriteResult};
