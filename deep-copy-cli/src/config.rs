//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `deep-copy.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use deep_copy::config::is_identifier;
use deep_copy::{GeneratorConfig, OutputMode, DEFAULT_METHOD};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "deep-copy.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Routine generation settings.
    pub generator: GeneratorSection,

    /// Output settings.
    pub output: OutputSection,
}

/// Routine generation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Name of the generated method.
    pub method: String,

    /// Whether routines use pointer receivers.
    pub pointer_receiver: bool,

    /// Whether unexported fields are deep-copied.
    pub export_private: bool,

    /// Recursion bound; 0 means unlimited.
    pub max_depth: usize,
}

/// Output settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Destination file; stdout when unset.
    pub path: Option<PathBuf>,

    /// Append to the destination instead of truncating it.
    pub append: bool,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            pointer_receiver: true,
            export_private: false,
            max_depth: 0,
        }
    }
}

impl Config {
    /// Check values that TOML typing cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.generator.method) {
            return Err(ConfigError::invalid_value(
                "generator.method",
                format!("'{}' is not a valid Go identifier", self.generator.method),
            ));
        }
        if self.output.path.as_deref() == Some(Path::new("")) {
            return Err(ConfigError::invalid_value(
                "output.path",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Build the engine configuration, adding the per-root skip lists.
    pub fn generator_config(&self, skip_lists: Vec<BTreeSet<String>>) -> GeneratorConfig {
        let mode = if self.output.append {
            OutputMode::Append
        } else {
            OutputMode::Truncate
        };
        GeneratorConfig {
            skip_lists,
            ..GeneratorConfig::new()
                .with_method(self.generator.method.clone())
                .with_pointer_receiver(self.generator.pointer_receiver)
                .with_export_private(self.generator.export_private)
                .with_max_depth(self.generator.max_depth)
                .with_mode(mode)
        }
    }

    /// Destination path, `None` for stdout.
    pub fn destination(&self) -> Option<&Path> {
        self.output
            .path
            .as_deref()
            .filter(|path| *path != Path::new("-"))
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            if path.is_some() {
                return Err(ConfigError::Io {
                    path: config_path,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "configuration file does not exist",
                    ),
                }
                .into());
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(&config_path, e.to_string()))?;
        config.validate()?;

        tracing::debug!(path = %config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref method) = args.method {
            config.generator.method = method.clone();
        }

        if let Some(pointer_receiver) = args.pointer_receiver {
            config.generator.pointer_receiver = pointer_receiver;
        }

        if let Some(export_private) = args.export_private {
            config.generator.export_private = export_private;
        }

        if let Some(max_depth) = args.max_depth {
            config.generator.max_depth = max_depth;
        }

        if let Some(ref output) = args.output {
            config.output.path = Some(output.clone());
        }

        if let Some(append) = args.append {
            config.output.append = append;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# deep-copy configuration file

[generator]
# Name of the generated method
method = "DeepCopy"

# Generate `func (o *T) DeepCopy() *T` instead of `func (o T) DeepCopy() T`
pointer_receiver = true

# Deep-copy unexported fields as well
export_private = false

# Stop generating nested routines past this depth (0 = unlimited)
max_depth = 0

[output]
# Destination file; omit to print to stdout
# path = "deepcopy_gen.go"

# Append to the destination instead of replacing it
append = false
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Method name override.
    pub method: Option<String>,

    /// Receiver form override.
    pub pointer_receiver: Option<bool>,

    /// Unexported field handling override.
    pub export_private: Option<bool>,

    /// Depth bound override.
    pub max_depth: Option<usize>,

    /// Destination override.
    pub output: Option<PathBuf>,

    /// Append mode override.
    pub append: Option<bool>,
}

/// Split `--skip` values into per-root field sets.
///
/// Each value holds the comma-separated fields of the root at the same
/// position; an empty value keeps its slot with no selectors.
pub fn parse_skip_lists(values: &[String]) -> Vec<BTreeSet<String>> {
    values
        .iter()
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(String::from)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generator.method, "DeepCopy");
        assert!(config.generator.pointer_receiver);
        assert!(!config.generator.export_private);
        assert_eq!(config.generator.max_depth, 0);
        assert_eq!(config.output.path, None);
        assert!(!config.output.append);
        assert_eq!(config.destination(), None);
    }

    #[test]
    fn test_default_content_matches_defaults() {
        let parsed: Config = toml::from_str(ConfigManager::default_config_content()).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.generator.method, defaults.generator.method);
        assert_eq!(
            parsed.generator.pointer_receiver,
            defaults.generator.pointer_receiver
        );
        assert_eq!(parsed.generator.max_depth, defaults.generator.max_depth);
        assert_eq!(parsed.output.path, defaults.output.path);
        assert_eq!(parsed.output.append, defaults.output.append);
    }

    #[test]
    fn test_merge_cli_args_override() {
        let config = Config::default();
        let args = CliArgs {
            method: Some("Clone".to_string()),
            pointer_receiver: Some(false),
            max_depth: Some(3),
            output: Some(PathBuf::from("out.go")),
            append: Some(true),
            ..Default::default()
        };

        let merged = ConfigManager::merge_cli_args(config, &args);
        assert_eq!(merged.generator.method, "Clone");
        assert!(!merged.generator.pointer_receiver);
        assert_eq!(merged.generator.max_depth, 3);
        assert_eq!(merged.destination(), Some(Path::new("out.go")));
        assert!(merged.output.append);
    }

    #[test]
    fn test_merge_cli_args_preserves_unset() {
        let mut config = Config::default();
        config.generator.export_private = true;
        config.output.path = Some(PathBuf::from("gen.go"));

        let merged = ConfigManager::merge_cli_args(config, &CliArgs::default());
        assert!(merged.generator.export_private);
        assert_eq!(merged.output.path, Some(PathBuf::from("gen.go")));
    }

    #[test]
    fn test_dash_means_stdout() {
        let args = CliArgs {
            output: Some(PathBuf::from("-")),
            ..Default::default()
        };
        let merged = ConfigManager::merge_cli_args(Config::default(), &args);
        assert_eq!(merged.destination(), None);
    }

    #[test]
    fn test_generator_config() {
        let mut config = Config::default();
        config.generator.method = "Copy".to_string();
        config.generator.max_depth = 2;
        config.output.append = true;

        let skip: BTreeSet<String> = ["Ctl".to_string()].into_iter().collect();
        let engine = config.generator_config(vec![skip.clone()]);
        assert_eq!(engine.method, "Copy");
        assert_eq!(engine.max_depth, 2);
        assert_eq!(engine.mode, OutputMode::Append);
        assert_eq!(engine.skip_lists, vec![skip]);
        assert!(engine.pointer_receiver);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = ConfigManager::load(Some(&dir.path().join(CONFIG_FILENAME)));
        assert!(config.is_err());

        let config = ConfigManager::load(None).unwrap();
        assert_eq!(config.generator.method, "DeepCopy");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[generator]\nmax_depth = 4\n").unwrap();

        let config = ConfigManager::load(Some(&path)).unwrap();
        assert_eq!(config.generator.max_depth, 4);
        assert_eq!(config.generator.method, "DeepCopy");
        assert!(!config.output.append);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);

        fs::write(&path, "[generator]\nmethod = \"deep copy\"\n").unwrap();
        let err = ConfigManager::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("generator.method"));

        fs::write(&path, "[generator\nmethod = 1\n").unwrap();
        let err = ConfigManager::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_parse_skip_lists() {
        let lists = parse_skip_lists(&[
            "Ctl, Sessions".to_string(),
            String::new(),
            "Owner".to_string(),
        ]);
        assert_eq!(lists.len(), 3);
        assert!(lists[0].contains("Ctl") && lists[0].contains("Sessions"));
        assert!(lists[1].is_empty());
        assert_eq!(lists[2].iter().collect::<Vec<_>>(), vec!["Owner"]);
    }
}
