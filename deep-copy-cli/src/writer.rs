//! Output writer for generated routines.
//!
//! Writes the rendered unit to stdout or a file, or in check mode compares it
//! with what is already on disk without touching anything.

use crate::error::{CliResult, ConfigError};
use deep_copy::{Destination, DestinationError, Generator, OutputMode, OutputUnit};
use std::path::{Path, PathBuf};

/// Result of a write operation.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteResult {
    /// Routines were written.
    Written {
        /// Destination file, `None` for stdout.
        path: Option<PathBuf>,
        /// Number of bytes written.
        bytes: usize,
        /// Whether the file header was written.
        wrote_header: bool,
    },
    /// Check mode compared the destination with fresh output.
    Checked {
        /// Compared file.
        path: PathBuf,
        /// Whether the file matches.
        up_to_date: bool,
    },
}

/// Writer with check-mode support.
#[derive(Debug)]
pub struct OutputWriter {
    /// Whether to compare instead of writing.
    check: bool,
}

impl OutputWriter {
    /// Create a new writer.
    pub fn new(check: bool) -> Self {
        Self { check }
    }

    /// Write or check the unit against `target` (`None` means stdout).
    pub fn write(
        &self,
        generator: &Generator,
        unit: &OutputUnit,
        target: Option<&Path>,
    ) -> CliResult<WriteResult> {
        if self.check {
            return self.check_file(generator, unit, target);
        }

        if let Some(path) = target {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|source| DestinationError::Open {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
            }
        }

        let mut destination = Destination::resolve(target)?;
        let report = generator.emit(unit, &mut destination)?;

        Ok(WriteResult::Written {
            path: destination.path().map(Path::to_path_buf),
            bytes: report.bytes,
            wrote_header: report.wrote_header,
        })
    }

    fn check_file(
        &self,
        generator: &Generator,
        unit: &OutputUnit,
        target: Option<&Path>,
    ) -> CliResult<WriteResult> {
        let Some(path) = target else {
            return Err(ConfigError::invalid_value("check", "requires an output file").into());
        };
        if generator.config().mode == OutputMode::Append {
            return Err(
                ConfigError::invalid_value("check", "cannot be combined with append").into(),
            );
        }

        let up_to_date = match std::fs::read_to_string(path) {
            Ok(existing) => existing == unit.render(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        Ok(WriteResult::Checked {
            path: path.to_path_buf(),
            up_to_date,
        })
    }
}
