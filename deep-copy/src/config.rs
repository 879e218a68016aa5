//! Generator configuration.

use serde::Serialize;
use std::collections::BTreeSet;

/// Default routine name.
pub const DEFAULT_METHOD: &str = "DeepCopy";

/// How the output unit is written to its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Replace any existing content.
    #[default]
    Truncate,

    /// Add the routines after existing content.
    Append,
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorConfig {
    /// Generate `func (o *T)` routines returning `*T` (otherwise `func (o T)` returning `T`).
    pub pointer_receiver: bool,

    /// Deep-copy unexported fields too.
    pub export_private: bool,

    /// Name of the generated routine.
    pub method: String,

    /// Field-name sets, positionally aligned with the root types.
    pub skip_lists: Vec<BTreeSet<String>>,

    /// Maximum depth of generated copy logic; 0 is unbounded.
    pub max_depth: usize,

    pub mode: OutputMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pointer_receiver: true,
            export_private: false,
            method: DEFAULT_METHOD.to_string(),
            skip_lists: Vec::new(),
            max_depth: 0,
            mode: OutputMode::Truncate,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointer_receiver(mut self, pointer_receiver: bool) -> Self {
        self.pointer_receiver = pointer_receiver;
        self
    }

    pub fn with_export_private(mut self, export_private: bool) -> Self {
        self.export_private = export_private;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Append the selector set for the next root.
    pub fn with_skip_list<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_lists
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether `depth` lies beyond the configured bound.
    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth > 0 && depth > self.max_depth
    }
}

/// Whether `name` is a valid Go identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert!(config.pointer_receiver);
        assert!(!config.export_private);
        assert_eq!(config.method, "DeepCopy");
        assert!(config.skip_lists.is_empty());
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.mode, OutputMode::Truncate);
    }

    #[test]
    fn test_builders() {
        let config = GeneratorConfig::new()
            .with_pointer_receiver(false)
            .with_export_private(true)
            .with_method("Clone")
            .with_skip_list(["Map", "Slice"])
            .with_skip_list(Vec::<String>::new())
            .with_max_depth(3)
            .with_mode(OutputMode::Append);

        assert!(!config.pointer_receiver);
        assert!(config.export_private);
        assert_eq!(config.method, "Clone");
        assert_eq!(config.skip_lists.len(), 2);
        assert!(config.skip_lists[0].contains("Slice"));
        assert!(config.skip_lists[1].is_empty());
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.mode, OutputMode::Append);
    }

    #[test]
    fn test_exceeds_depth() {
        let unbounded = GeneratorConfig::default();
        assert!(!unbounded.exceeds_depth(1_000));

        let bounded = GeneratorConfig::default().with_max_depth(2);
        assert!(!bounded.exceeds_depth(2));
        assert!(bounded.exceeds_depth(3));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("DeepCopy"));
        assert!(is_identifier("_clone2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2copy"));
        assert!(!is_identifier("Deep-Copy"));
    }
}
