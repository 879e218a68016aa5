//! Package loading.
//!
//! Turns the parsed files of one Go package into the [`Universe`] the
//! generator queries: one declaration per type name, each carrying the
//! import table of the file it was declared in and the methods declared on
//! it anywhere in the package.

use crate::error::AnalysisError;
use crate::parser::{GoParser, ParsedFile};
use crate::scanner::SourceFile;
use deep_copy::Universe;
use std::collections::BTreeSet;

/// Builds a [`Universe`] from source files.
#[derive(Debug, Default)]
pub struct PackageLoader {
    parser: GoParser,
}

impl PackageLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and merge the given files.
    ///
    /// Every file is parsed before failing so that all syntax errors are reported together.
    pub fn load(&self, files: &[SourceFile]) -> Result<Universe, AnalysisError> {
        let (parsed, errors) = self.parser.parse_files(files);
        if let Some(error) = AnalysisError::from_many(errors) {
            return Err(error);
        }
        Self::build(parsed)
    }

    /// Merge already parsed files into one package.
    pub fn build(files: Vec<ParsedFile>) -> Result<Universe, AnalysisError> {
        let files: Vec<ParsedFile> = files
            .into_iter()
            .filter(|file| {
                let external_test = file.package.ends_with("_test");
                if external_test {
                    tracing::debug!(file = %file.path.display(), "skipping external test package");
                }
                !external_test
            })
            .collect();

        let package = match files.first() {
            Some(first) => first.package.clone(),
            None => return Err(AnalysisError::no_source_files(".")),
        };

        let mut universe = Universe::new(package.clone());
        let mut declared = BTreeSet::new();
        let mut methods = Vec::new();

        for file in files {
            if file.package != package {
                return Err(AnalysisError::MixedPackages {
                    first: package,
                    second: file.package,
                    file: file.path,
                });
            }

            for parsed in file.types {
                let name = parsed.decl.name.clone();
                if name == "_" {
                    continue;
                }
                if !declared.insert(name.clone()) {
                    return Err(AnalysisError::DuplicateType {
                        name,
                        file: parsed.location.file,
                        line: parsed.location.line,
                    });
                }

                let mut decl = parsed.decl;
                decl.imports = file.imports.clone();
                universe.insert(decl);
            }

            methods.extend(file.methods);
        }

        for method in methods {
            match universe.get_mut(&method.receiver) {
                Some(decl) => {
                    decl.methods.insert(method.name, method.decl);
                }
                None => tracing::trace!(
                    receiver = %method.receiver,
                    method = %method.name,
                    "method on undeclared receiver"
                ),
            }
        }

        tracing::debug!(package = %package, types = universe.len(), "loaded package");
        Ok(universe)
    }
}
