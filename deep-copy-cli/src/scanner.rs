//! Source file scanner for discovering Go files.
//!
//! The package argument may name a directory (its `.go` files, not
//! recursive), a single file, or a glob pattern. Test files are never
//! analyzed; an excluded file (the destination when it gets replaced) is
//! left out as well.

use crate::error::AnalysisError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// A discovered source file with its content.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,

    /// File content.
    pub content: String,
}

/// Scanner for discovering Go source files.
#[derive(Debug)]
pub struct SourceScanner {
    /// Directory, file or glob pattern.
    target: String,

    /// File to leave out, normally the output destination.
    exclude: Option<PathBuf>,
}

impl SourceScanner {
    /// Create a new scanner for the given package argument.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            exclude: None,
        }
    }

    /// Skip the given file, if it is among the scanned ones.
    pub fn with_exclude(mut self, path: Option<&Path>) -> Self {
        self.exclude = path.map(Path::to_path_buf);
        self
    }

    /// Resolve the target and read every matching file, sorted by path.
    pub fn scan(&self) -> Result<Vec<SourceFile>, AnalysisError> {
        let paths = if is_pattern(&self.target) {
            self.expand_pattern()?
        } else {
            let root = Path::new(&self.target);
            if root.is_dir() {
                self.walk_dir(root)?
            } else if root.is_file() {
                vec![root.to_path_buf()]
            } else {
                return Err(AnalysisError::not_found(root));
            }
        };

        let mut files = Vec::new();
        for path in paths {
            if self.is_excluded(&path) {
                tracing::debug!(file = %path.display(), "skipping destination file");
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| AnalysisError::Io {
                file: path.clone(),
                source: e,
            })?;
            files.push(SourceFile { path, content });
        }

        if files.is_empty() {
            return Err(AnalysisError::no_source_files(&self.target));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn walk_dir(&self, root: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        let walker = WalkBuilder::new(root)
            .max_depth(Some(1))
            .standard_filters(false)
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_go_source(path) {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }

    fn expand_pattern(&self) -> Result<Vec<PathBuf>, AnalysisError> {
        let entries = glob::glob(&self.target)
            .map_err(|e| AnalysisError::invalid_pattern(&self.target, e.to_string()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let file = e.path().to_path_buf();
                AnalysisError::Io {
                    file,
                    source: e.into(),
                }
            })?;
            if path.is_file() && is_go_source(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(exclude) = &self.exclude else {
            return false;
        };
        match (path.canonicalize(), exclude.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => path == exclude,
        }
    }
}

/// Whether the argument contains glob metacharacters.
fn is_pattern(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

/// A `.go` file that is not a test file.
fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}
