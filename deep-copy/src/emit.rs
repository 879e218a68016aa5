//! Emitter.
//!
//! Writes an [`OutputUnit`] to a [`Destination`]. Files are opened read/write
//! up front without truncation; content is only replaced or extended once the
//! whole unit has been synthesized.

use crate::config::OutputMode;
use crate::error::DestinationError;
use crate::synth::OutputUnit;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Where the output unit goes.
#[derive(Debug)]
pub enum Destination {
    Stdout,
    File { path: PathBuf, file: File },
}

impl Destination {
    /// Resolve a destination argument; `-` means standard output.
    pub fn resolve(target: Option<&Path>) -> Result<Self, DestinationError> {
        match target {
            None => Ok(Self::Stdout),
            Some(path) if path.as_os_str() == "-" => Ok(Self::Stdout),
            Some(path) => Self::open(path),
        }
    }

    /// Open (creating if absent) a file without touching its content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DestinationError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| DestinationError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::File {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::File { path, .. } => Some(path),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Stdout => "stdout".to_string(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }
}

/// What an emission wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmitReport {
    pub bytes: usize,
    /// Whether the header, package clause and imports were written.
    pub wrote_header: bool,
}

/// Writes output units with truncate or append semantics.
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    mode: OutputMode,
}

impl Emitter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn emit(
        &self,
        unit: &OutputUnit,
        destination: &mut Destination,
    ) -> Result<EmitReport, DestinationError> {
        let target = destination.describe();
        let wrap = |source: io::Error| DestinationError::Write {
            target: target.clone(),
            source,
        };

        let report = match destination {
            Destination::Stdout => {
                let content = unit.render();
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes()).map_err(wrap)?;
                stdout.flush().map_err(wrap)?;
                EmitReport {
                    bytes: content.len(),
                    wrote_header: true,
                }
            }
            Destination::File { file, .. } => self.write_file(unit, file).map_err(wrap)?,
        };

        tracing::debug!(
            target = %target,
            bytes = report.bytes,
            header = report.wrote_header,
            "wrote output unit"
        );
        Ok(report)
    }

    fn write_file(&self, unit: &OutputUnit, file: &mut File) -> io::Result<EmitReport> {
        let wrote_header = match self.mode {
            OutputMode::Truncate => {
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                true
            }
            OutputMode::Append => file.seek(SeekFrom::End(0))? == 0,
        };
        let content = if wrote_header {
            unit.render()
        } else {
            unit.body()
        };

        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(EmitReport {
            bytes: content.len(),
            wrote_header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::RenderedRoutine;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn unit() -> OutputUnit {
        OutputUnit {
            package: "demo".to_string(),
            imports: BTreeMap::new(),
            routines: vec![RenderedRoutine {
                type_name: "A".to_string(),
                code: "func (o *A) DeepCopy() *A {\n\tcp := *o\n\treturn &cp\n}\n".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_stdout() {
        assert!(matches!(Destination::resolve(None).unwrap(), Destination::Stdout));
        assert!(matches!(
            Destination::resolve(Some(Path::new("-"))).unwrap(),
            Destination::Stdout
        ));
    }

    #[test]
    fn test_open_creates_without_truncating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.go");
        fs::write(&path, "keep me").unwrap();

        let dest = Destination::open(&path).unwrap();
        assert_eq!(dest.path(), Some(path.as_path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        let fresh = dir.path().join("fresh.go");
        Destination::open(&fresh).unwrap();
        assert!(fresh.exists());
    }

    #[test]
    fn test_open_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.go");
        let err = Destination::open(&path).unwrap_err();
        assert!(matches!(err, DestinationError::Open { .. }));
    }

    #[test]
    fn test_truncate_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.go");
        fs::write(&path, "x".repeat(4096)).unwrap();

        let mut dest = Destination::open(&path).unwrap();
        let report = Emitter::new(OutputMode::Truncate)
            .emit(&unit(), &mut dest)
            .unwrap();

        assert!(report.wrote_header);
        assert_eq!(fs::read_to_string(&path).unwrap(), unit().render());
    }

    #[test]
    fn test_append_keeps_existing_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.go");
        fs::write(&path, "package demo\n").unwrap();

        let mut dest = Destination::open(&path).unwrap();
        let report = Emitter::new(OutputMode::Append)
            .emit(&unit(), &mut dest)
            .unwrap();

        assert!(!report.wrote_header);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("package demo\n{}", unit().body()));
    }

    #[test]
    fn test_append_to_empty_file_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.go");

        let mut dest = Destination::open(&path).unwrap();
        let report = Emitter::new(OutputMode::Append)
            .emit(&unit(), &mut dest)
            .unwrap();

        assert!(report.wrote_header);
        assert_eq!(fs::read_to_string(&path).unwrap(), unit().render());
    }

    #[test]
    fn test_append_twice_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.go");
        let emitter = Emitter::new(OutputMode::Append);

        for _ in 0..2 {
            let mut dest = Destination::open(&path).unwrap();
            emitter.emit(&unit(), &mut dest).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("func (o *A) DeepCopy()").count(), 2);
        assert_eq!(content.matches("package demo").count(), 1);
    }
}
