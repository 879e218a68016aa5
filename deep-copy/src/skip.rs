//! Skip rules.
//!
//! Decides whether a struct field keeps the source's reference instead of
//! being deep-copied. Two sources of truth exist:
//!
//! - the `deepcopy:"-"` override tag, honored on every struct everywhere;
//! - skip selectors, one set of field names per requested root, honored only
//!   for the fields of that root's own routine.

use crate::error::{GenerateError, GenerateResult};
use crate::model::{FieldDescriptor, TypeDescriptor, TypeOracle};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Why a field or position is copied by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShallowReason {
    /// `deepcopy:"-"` on the field.
    OverrideTag,
    /// Field named by the root's skip selector.
    SkipSelector,
    /// Unexported field with private copying disabled.
    Private,
    /// Position lies beyond the maximum depth.
    DepthLimit,
    /// Interface value without a copy capability.
    Interface,
    /// Re-entry into a named pointer type that is being expanded inline.
    Recursive,
}

/// A selector that matched no field of its root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnusedSelector {
    pub root: String,
    pub field: String,
}

/// Root types with their skip selectors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkipRules {
    roots: Vec<String>,
    selectors: BTreeMap<String, BTreeSet<String>>,
}

impl SkipRules {
    /// Align selector sets with root names.
    ///
    /// Duplicate roots keep their first position and merge their selectors.
    /// Roots without a selector set get an empty one.
    pub fn build(roots: &[String], skip_lists: &[BTreeSet<String>]) -> GenerateResult<Self> {
        if skip_lists.len() > roots.len() {
            return Err(GenerateError::invalid(format!(
                "{} skip selector sets given for {} root types",
                skip_lists.len(),
                roots.len()
            )));
        }

        let mut rules = Self::default();
        for (index, root) in roots.iter().enumerate() {
            let selectors = rules.selectors.entry(root.clone()).or_insert_with(|| {
                rules.roots.push(root.clone());
                BTreeSet::new()
            });
            if let Some(list) = skip_lists.get(index) {
                selectors.extend(list.iter().cloned());
            }
        }
        Ok(rules)
    }

    /// Deduplicated roots, in request order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn is_root(&self, name: &str) -> bool {
        self.selectors.contains_key(name)
    }

    pub fn selectors(&self, root: &str) -> Option<&BTreeSet<String>> {
        self.selectors.get(root)
    }

    /// Decide whether `field` is copied by reference.
    ///
    /// `root` is the requested root whose own routine contains the field, or
    /// `None` for fields of nested types.
    pub fn should_shallow_copy(
        &self,
        root: Option<&str>,
        field: &FieldDescriptor,
    ) -> Option<ShallowReason> {
        if field.shallow {
            return Some(ShallowReason::OverrideTag);
        }
        let selectors = root.and_then(|root| self.selectors.get(root))?;
        selectors
            .contains(&field.name)
            .then_some(ShallowReason::SkipSelector)
    }

    /// Selectors naming no field of their root's outermost struct.
    pub fn unused_selectors<O: TypeOracle + ?Sized>(&self, oracle: &O) -> Vec<UnusedSelector> {
        let mut unused = Vec::new();
        for root in &self.roots {
            let fields = root_fields(oracle, root);
            for selector in &self.selectors[root] {
                if !fields.contains(selector.as_str()) {
                    unused.push(UnusedSelector {
                        root: root.clone(),
                        field: selector.clone(),
                    });
                }
            }
        }
        unused
    }
}

/// Field names of the struct underlying `name`, following named and alias chains.
fn root_fields<'a, O: TypeOracle + ?Sized>(oracle: &'a O, name: &str) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::new();
    let mut current = name.to_string();
    while seen.insert(current.clone()) {
        let Some(decl) = oracle.lookup(&current) else {
            break;
        };
        match &decl.underlying {
            TypeDescriptor::Named { name } => current = name.clone(),
            TypeDescriptor::Struct { fields } => {
                return fields.iter().map(|f| f.name.as_str()).collect();
            }
            _ => break,
        }
    }
    BTreeSet::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TypeDecl, Universe};

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn roots(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selectors_align_with_roots() {
        let rules = SkipRules::build(&roots(&["A", "B"]), &[set(&["X"])]).unwrap();
        assert_eq!(rules.roots(), ["A".to_string(), "B".to_string()]);
        assert_eq!(rules.selectors("A"), Some(&set(&["X"])));
        assert_eq!(rules.selectors("B"), Some(&BTreeSet::new()));
        assert_eq!(rules.selectors("C"), None);
    }

    #[test]
    fn test_too_many_selector_sets() {
        let err = SkipRules::build(&roots(&["A"]), &[set(&["X"]), set(&["Y"])]).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest { .. }));
    }

    #[test]
    fn test_duplicate_roots_merge() {
        let rules =
            SkipRules::build(&roots(&["A", "B", "A"]), &[set(&["X"]), set(&[]), set(&["Y"])])
                .unwrap();
        assert_eq!(rules.roots(), ["A".to_string(), "B".to_string()]);
        assert_eq!(rules.selectors("A"), Some(&set(&["X", "Y"])));
    }

    #[test]
    fn test_override_tag_applies_everywhere() {
        let rules = SkipRules::build(&roots(&["A"]), &[]).unwrap();
        let field = FieldDescriptor::new("Ctl", TypeDescriptor::named("Ctl"))
            .with_tag("`deepcopy:\"-\"`");

        assert_eq!(
            rules.should_shallow_copy(None, &field),
            Some(ShallowReason::OverrideTag)
        );
        assert_eq!(
            rules.should_shallow_copy(Some("A"), &field),
            Some(ShallowReason::OverrideTag)
        );
    }

    #[test]
    fn test_selectors_are_root_scoped() {
        let rules = SkipRules::build(&roots(&["A"]), &[set(&["Map"])]).unwrap();
        let field = FieldDescriptor::new(
            "Map",
            TypeDescriptor::map(TypeDescriptor::basic("string"), TypeDescriptor::basic("int")),
        );

        assert_eq!(
            rules.should_shallow_copy(Some("A"), &field),
            Some(ShallowReason::SkipSelector)
        );
        assert_eq!(rules.should_shallow_copy(None, &field), None);
        assert_eq!(rules.should_shallow_copy(Some("B"), &field), None);
    }

    #[test]
    fn test_unused_selectors() {
        let universe = Universe::new("pkg")
            .with_decl(TypeDecl::new(
                "A",
                TypeDescriptor::structure(vec![FieldDescriptor::new(
                    "Map",
                    TypeDescriptor::basic("int"),
                )]),
            ))
            .with_decl(TypeDecl::new("B", TypeDescriptor::named("A")));

        let rules = SkipRules::build(
            &roots(&["A", "B"]),
            &[set(&["Map", "Missing"]), set(&["Map"])],
        )
        .unwrap();

        assert_eq!(
            rules.unused_selectors(&universe),
            vec![UnusedSelector {
                root: "A".to_string(),
                field: "Missing".to_string(),
            }]
        );
    }
}
