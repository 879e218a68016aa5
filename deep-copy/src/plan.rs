//! Traversal planner.
//!
//! Expands the requested roots depth-first into a [`GenerationPlan`]: one
//! [`Routine`] per named type that needs generated copy logic, each holding a
//! tree of [`CopyOp`] fix-ups applied on top of a shallow value copy.
//!
//! Memoization by type identity is checked before the depth bound, so a type
//! that already has a routine is always called, and every cycle terminates at
//! its first repeated named type.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::model::{FieldDescriptor, TypeDecl, TypeDescriptor, TypeOracle};
use crate::skip::{ShallowReason, SkipRules};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle of a plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    /// Requested root, not yet expanded.
    Pending,
    /// Being expanded; references to it become calls.
    InProgress,
    /// Routine recorded.
    Emitted,
}

/// One identity in the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub state: PlanState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine: Option<Routine>,
}

/// Shape of the value a routine copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Struct,
    Array,
    Slice,
    Map,
    /// Underlying basic, qualified or opaque type.
    Value,
}

/// Copy logic for one named type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routine {
    pub type_name: String,
    pub kind: RoutineKind,
    pub body: CopyOp,
    /// Depth at which the type was first reached.
    pub depth: usize,
    pub root: bool,
}

/// A planned struct field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPlan {
    pub name: String,
    pub op: CopyOp,
}

/// Fix-up instructions for one position.
///
/// The destination always starts as a shallow copy of the source; trivial ops
/// leave it untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CopyOp {
    /// Value type; the shallow copy is already deep.
    Assign,

    /// Composite kept by reference.
    Shallow { reason: ShallowReason },

    /// Call the routine of a named type.
    Call {
        target: String,
        returns_pointer: bool,
        /// Hand-written method already present in the sources.
        provided: bool,
    },

    /// Nil-guarded call through an interface declaring the routine.
    InterfaceCall,

    /// Fresh pointee, then `elem` on it.
    Pointer { elem: Box<CopyOp> },

    /// New backing storage, then `elem` per element.
    Slice { elem: Box<CopyOp> },

    /// `elem` per element of the copied array.
    Array { elem: Box<CopyOp> },

    /// New map of type `map_type`, then `value` per entry.
    Map {
        map_type: TypeDescriptor,
        value: Box<CopyOp>,
    },

    Struct { fields: Vec<FieldPlan> },
}

impl CopyOp {
    /// Whether the op emits no statements.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Self::Assign | Self::Shallow { .. })
    }

    fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}

/// Identity-keyed plan for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationPlan {
    entries: BTreeMap<String, PlanEntry>,

    /// Named types whose hand-written routine is called.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    provided: BTreeSet<String>,
}

impl GenerationPlan {
    pub fn state(&self, name: &str) -> Option<PlanState> {
        self.entries.get(name).map(|entry| entry.state)
    }

    pub fn routine(&self, name: &str) -> Option<&Routine> {
        self.entries.get(name).and_then(|entry| entry.routine.as_ref())
    }

    /// Emitted routines in lexicographic order of identity.
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.entries
            .values()
            .filter(|entry| entry.state == PlanState::Emitted)
            .filter_map(|entry| entry.routine.as_ref())
    }

    pub fn provided(&self) -> &BTreeSet<String> {
        &self.provided
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn mark_pending(&mut self, name: &str) {
        self.entries
            .entry(name.to_string())
            .or_insert(PlanEntry {
                state: PlanState::Pending,
                routine: None,
            });
    }

    fn mark_in_progress(&mut self, name: &str) {
        debug_assert!(matches!(
            self.state(name),
            None | Some(PlanState::Pending)
        ));
        self.entries.insert(
            name.to_string(),
            PlanEntry {
                state: PlanState::InProgress,
                routine: None,
            },
        );
    }

    fn mark_emitted(&mut self, routine: Routine) {
        debug_assert_eq!(
            self.state(&routine.type_name),
            Some(PlanState::InProgress)
        );
        self.entries.insert(
            routine.type_name.clone(),
            PlanEntry {
                state: PlanState::Emitted,
                routine: Some(routine),
            },
        );
    }
}

/// Follow defined-type declarations down to a structural type.
pub(crate) fn underlying_of<'a, O: TypeOracle + ?Sized>(
    oracle: &'a O,
    decl: &'a TypeDecl,
) -> GenerateResult<&'a TypeDescriptor> {
    let mut seen = BTreeSet::new();
    let mut current = &decl.underlying;
    while let TypeDescriptor::Named { name } = current {
        if !seen.insert(name.as_str()) {
            return Err(GenerateError::unsupported(&decl.name, "invalid recursive type"));
        }
        let next = oracle
            .lookup(name)
            .ok_or_else(|| GenerateError::not_found(name, Some(&decl.name)))?;
        current = &next.underlying;
    }
    Ok(current)
}

/// A name after alias resolution.
enum Resolved<'a> {
    Decl(&'a TypeDecl),
    /// Alias of an unnamed type expression.
    Structural(&'a TypeDescriptor),
}

/// Builds a [`GenerationPlan`] for a set of roots.
pub struct Planner<'a, O: TypeOracle + ?Sized> {
    oracle: &'a O,
    config: &'a GeneratorConfig,
    rules: &'a SkipRules,
    plan: GenerationPlan,
    /// Routines being expanded, innermost last.
    routine_stack: Vec<String>,
    /// Named pointer types being expanded inline.
    inline_stack: Vec<String>,
}

impl<'a, O: TypeOracle + ?Sized> Planner<'a, O> {
    pub fn new(oracle: &'a O, config: &'a GeneratorConfig, rules: &'a SkipRules) -> Self {
        Self {
            oracle,
            config,
            rules,
            plan: GenerationPlan::default(),
            routine_stack: Vec::new(),
            inline_stack: Vec::new(),
        }
    }

    /// Validate every root, then expand them in request order.
    pub fn plan_roots(mut self) -> GenerateResult<GenerationPlan> {
        let rules = self.rules;
        let roots = rules.roots();
        for root in roots {
            self.validate_root(root)?;
        }

        for name in roots {
            self.plan.mark_pending(name);
        }
        for name in roots {
            if self.plan.state(name) == Some(PlanState::Pending) {
                self.plan_routine(name, 0)?;
            }
        }
        Ok(self.plan)
    }

    /// Check that a root can carry a generated routine.
    fn validate_root(&self, root: &str) -> GenerateResult<()> {
        let decl = match self.resolve(root, None)? {
            Resolved::Decl(decl) => decl,
            Resolved::Structural(_) => {
                return Err(GenerateError::unsupported(
                    root,
                    "alias of an unnamed type cannot declare methods",
                ))
            }
        };
        if decl.name != root {
            return Err(GenerateError::unsupported(
                root,
                format!("alias of '{}'; request the aliased type instead", decl.name),
            ));
        }
        if decl.generic {
            return Err(GenerateError::unsupported(
                &decl.name,
                "generic types are not supported",
            ));
        }
        if decl.methods.contains_key(&self.config.method) {
            return Err(GenerateError::collision(
                &decl.name,
                &self.config.method,
                format!("method '{}' is already declared", self.config.method),
            ));
        }
        match self.underlying(decl)? {
            TypeDescriptor::Pointer { .. } => Err(GenerateError::unsupported(
                &decl.name,
                "named pointer types cannot declare methods",
            )),
            TypeDescriptor::Interface { .. } => Err(GenerateError::unsupported(
                &decl.name,
                "interface types cannot declare methods",
            )),
            _ => Ok(()),
        }
    }

    /// Follow alias declarations to the identity they denote.
    fn resolve(&self, name: &str, referenced_from: Option<&str>) -> GenerateResult<Resolved<'a>> {
        let mut seen = BTreeSet::new();
        let mut current = name;
        loop {
            if !seen.insert(current.to_string()) {
                return Err(GenerateError::unsupported(name, "alias cycle"));
            }
            let decl = self
                .oracle
                .lookup(current)
                .ok_or_else(|| GenerateError::not_found(current, referenced_from))?;
            if !decl.alias {
                return Ok(Resolved::Decl(decl));
            }
            match &decl.underlying {
                TypeDescriptor::Named { name } => current = name,
                other => return Ok(Resolved::Structural(other)),
            }
        }
    }

    /// The structural type underlying a declaration.
    fn underlying(&self, decl: &'a TypeDecl) -> GenerateResult<&'a TypeDescriptor> {
        underlying_of(self.oracle, decl)
    }

    fn current_routine(&self) -> Option<&str> {
        self.routine_stack.last().map(String::as_str)
    }

    /// Expand the routine of `name`, first reached at `depth`.
    fn plan_routine(&mut self, name: &str, depth: usize) -> GenerateResult<()> {
        let decl = self
            .oracle
            .lookup(name)
            .ok_or_else(|| GenerateError::not_found(name, self.current_routine()))?;
        let root = self.rules.is_root(name);

        tracing::debug!(type_name = %name, depth, root, "planning routine");
        self.plan.mark_in_progress(name);
        self.routine_stack.push(name.to_string());

        let underlying = self.underlying(decl)?;
        let (kind, body) = match underlying {
            TypeDescriptor::Struct { fields } => {
                let scope = root.then_some(name);
                let fields = self.plan_fields(fields, depth, scope)?;
                (RoutineKind::Struct, CopyOp::Struct { fields })
            }
            TypeDescriptor::Array { elem, .. } => {
                let elem = self.plan_type(elem, depth + 1)?;
                let body = if elem.is_trivial() {
                    CopyOp::Assign
                } else {
                    CopyOp::Array { elem: elem.boxed() }
                };
                (RoutineKind::Array, body)
            }
            TypeDescriptor::Slice { elem } => {
                let elem = self.plan_type(elem, depth + 1)?;
                (RoutineKind::Slice, CopyOp::Slice { elem: elem.boxed() })
            }
            TypeDescriptor::Map { value, .. } => {
                let value = self.plan_type(value, depth + 1)?;
                let body = CopyOp::Map {
                    map_type: TypeDescriptor::named(name),
                    value: value.boxed(),
                };
                (RoutineKind::Map, body)
            }
            TypeDescriptor::Basic { .. }
            | TypeDescriptor::Qualified { .. }
            | TypeDescriptor::Opaque { .. } => (RoutineKind::Value, CopyOp::Assign),
            TypeDescriptor::Pointer { .. }
            | TypeDescriptor::Interface { .. }
            | TypeDescriptor::Named { .. } => {
                return Err(GenerateError::unsupported(
                    name,
                    "type cannot declare methods",
                ))
            }
        };

        self.routine_stack.pop();
        self.plan.mark_emitted(Routine {
            type_name: name.to_string(),
            kind,
            body,
            depth,
            root,
        });
        Ok(())
    }

    /// Plan each field of a struct located at `depth`.
    ///
    /// `root` is set only for the outermost struct of a root's routine.
    fn plan_fields(
        &mut self,
        fields: &[FieldDescriptor],
        depth: usize,
        root: Option<&str>,
    ) -> GenerateResult<Vec<FieldPlan>> {
        let mut planned = Vec::with_capacity(fields.len());
        for field in fields {
            let op = if let Some(reason) = self.rules.should_shallow_copy(root, field) {
                CopyOp::Shallow { reason }
            } else if !field.exported && !self.config.export_private {
                if field.ty.is_composite() {
                    CopyOp::Shallow {
                        reason: ShallowReason::Private,
                    }
                } else {
                    CopyOp::Assign
                }
            } else {
                self.plan_type(&field.ty, depth + 1)?
            };
            planned.push(FieldPlan {
                name: field.name.clone(),
                op,
            });
        }
        Ok(planned)
    }

    /// Plan a position of type `ty` located at `depth`.
    fn plan_type(&mut self, ty: &TypeDescriptor, depth: usize) -> GenerateResult<CopyOp> {
        match ty {
            TypeDescriptor::Basic { .. }
            | TypeDescriptor::Qualified { .. }
            | TypeDescriptor::Opaque { .. } => Ok(CopyOp::Assign),
            TypeDescriptor::Interface { .. } => Ok(CopyOp::Shallow {
                reason: ShallowReason::Interface,
            }),
            TypeDescriptor::Named { name } => self.plan_named(name, depth),
            // Past the bound, a pointer only survives as a call to an existing routine.
            TypeDescriptor::Pointer { elem } if self.config.exceeds_depth(depth) => {
                match self.plan_type(elem, depth)? {
                    call @ CopyOp::Call { .. } => Ok(CopyOp::Pointer { elem: call.boxed() }),
                    _ => Ok(CopyOp::Shallow {
                        reason: ShallowReason::DepthLimit,
                    }),
                }
            }
            _ if self.config.exceeds_depth(depth) => {
                tracing::trace!(depth, ty = %ty, "depth limit reached");
                Ok(CopyOp::Shallow {
                    reason: ShallowReason::DepthLimit,
                })
            }
            _ => self.plan_structural(ty, depth),
        }
    }

    /// Plan an unnamed composite type.
    fn plan_structural(&mut self, ty: &TypeDescriptor, depth: usize) -> GenerateResult<CopyOp> {
        let op = match ty {
            // A pointer and its pointee share one level.
            TypeDescriptor::Pointer { elem } => CopyOp::Pointer {
                elem: self.plan_type(elem, depth)?.boxed(),
            },
            TypeDescriptor::Slice { elem } => CopyOp::Slice {
                elem: self.plan_type(elem, depth + 1)?.boxed(),
            },
            TypeDescriptor::Array { elem, .. } => {
                let elem = self.plan_type(elem, depth + 1)?;
                if elem.is_trivial() {
                    CopyOp::Assign
                } else {
                    CopyOp::Array { elem: elem.boxed() }
                }
            }
            TypeDescriptor::Map { value, .. } => CopyOp::Map {
                map_type: ty.clone(),
                value: self.plan_type(value, depth + 1)?.boxed(),
            },
            TypeDescriptor::Struct { fields } => {
                let fields = self.plan_fields(fields, depth, None)?;
                if fields.iter().all(|field| field.op.is_trivial()) {
                    CopyOp::Assign
                } else {
                    CopyOp::Struct { fields }
                }
            }
            _ => CopyOp::Assign,
        };
        Ok(op)
    }

    /// Plan a position referring to a declared type by name.
    fn plan_named(&mut self, name: &str, depth: usize) -> GenerateResult<CopyOp> {
        let decl = match self.resolve(name, self.current_routine())? {
            Resolved::Decl(decl) => decl,
            Resolved::Structural(ty) => return self.plan_inline(name, ty, depth),
        };
        if decl.generic {
            return Ok(CopyOp::Assign);
        }
        let name = decl.name.as_str();

        let underlying = self.underlying(decl)?;
        match underlying {
            TypeDescriptor::Basic { .. }
            | TypeDescriptor::Qualified { .. }
            | TypeDescriptor::Opaque { .. } => return Ok(CopyOp::Assign),
            TypeDescriptor::Interface { methods, .. } => {
                let capable = methods.iter().any(|m| {
                    m.name == self.config.method && m.params.trim().is_empty() && m.results == name
                });
                return Ok(if capable {
                    CopyOp::InterfaceCall
                } else {
                    CopyOp::Shallow {
                        reason: ShallowReason::Interface,
                    }
                });
            }
            TypeDescriptor::Pointer { .. } => return self.plan_inline(name, underlying, depth),
            _ => {}
        }

        let call = CopyOp::Call {
            target: name.to_string(),
            returns_pointer: self.config.pointer_receiver,
            provided: false,
        };
        match self.plan.state(name) {
            Some(PlanState::Emitted) | Some(PlanState::InProgress) => {
                tracing::trace!(type_name = %name, "reusing routine");
                return Ok(call);
            }
            // Requested roots are always planned from depth 0.
            Some(PlanState::Pending) => {
                self.plan_routine(name, 0)?;
                return Ok(call);
            }
            None => {}
        }

        if let Some(method) = decl.methods.get(&self.config.method) {
            tracing::debug!(type_name = %name, "calling hand-written routine");
            self.plan.provided.insert(name.to_string());
            return Ok(CopyOp::Call {
                target: name.to_string(),
                returns_pointer: method.pointer_result,
                provided: true,
            });
        }

        if self.config.exceeds_depth(depth) {
            tracing::debug!(type_name = %name, depth, "depth limit reached, copying by reference");
            return Ok(CopyOp::Shallow {
                reason: ShallowReason::DepthLimit,
            });
        }

        self.plan_routine(name, depth)?;
        Ok(call)
    }

    /// Expand a named type that cannot carry a routine in place.
    fn plan_inline(
        &mut self,
        name: &str,
        ty: &TypeDescriptor,
        depth: usize,
    ) -> GenerateResult<CopyOp> {
        if self.inline_stack.iter().any(|n| n == name) {
            return Ok(CopyOp::Shallow {
                reason: ShallowReason::Recursive,
            });
        }
        self.inline_stack.push(name.to_string());
        let op = self.plan_type(ty, depth);
        self.inline_stack.pop();
        op
    }
}
