//! Code synthesizer.
//!
//! Renders one Go method per emitted plan entry. Every routine starts from a
//! shallow value copy of the receiver and then applies the fix-ups recorded in
//! its [`CopyOp`] tree, so trivial positions produce no statements at all.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::model::{TypeDescriptor, TypeOracle};
use crate::plan::{underlying_of, CopyOp, GenerationPlan, Routine, RoutineKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Header line marking the output as generated.
pub const GENERATED_HEADER: &str = "// Code generated by deep-copy; DO NOT EDIT.";

/// Source of a single rendered method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRoutine {
    pub type_name: String,
    pub code: String,
}

/// A complete generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputUnit {
    pub package: String,

    /// Import path to the qualifier used in the code.
    pub imports: BTreeMap<String, String>,

    /// Routines in lexicographic order of type identity.
    pub routines: Vec<RenderedRoutine>,
}

impl OutputUnit {
    /// Header comment, package clause and import block.
    pub fn header(&self) -> String {
        let mut out = format!("{GENERATED_HEADER}\n\npackage {}\n", self.package);
        if self.imports.is_empty() {
            return out;
        }

        out.push('\n');
        let specs: Vec<String> = self
            .imports
            .iter()
            .map(|(path, qualifier)| import_spec(path, qualifier))
            .collect();
        if let [single] = specs.as_slice() {
            let _ = writeln!(out, "import {single}");
        } else {
            out.push_str("import (\n");
            for spec in &specs {
                let _ = writeln!(out, "\t{spec}");
            }
            out.push_str(")\n");
        }
        out
    }

    /// The routines only, each preceded by a blank line.
    pub fn body(&self) -> String {
        let mut out = String::new();
        for routine in &self.routines {
            out.push('\n');
            out.push_str(&routine.code);
        }
        out
    }

    /// The complete file.
    pub fn render(&self) -> String {
        let mut out = self.header();
        out.push_str(&self.body());
        out
    }
}

fn import_spec(path: &str, qualifier: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    if last == qualifier {
        format!("\"{path}\"")
    } else {
        format!("{qualifier} \"{path}\"")
    }
}

/// Renders a [`GenerationPlan`] into an [`OutputUnit`].
pub struct Synthesizer<'a, O: TypeOracle + ?Sized> {
    oracle: &'a O,
    config: &'a GeneratorConfig,
}

impl<'a, O: TypeOracle + ?Sized> Synthesizer<'a, O> {
    pub fn new(oracle: &'a O, config: &'a GeneratorConfig) -> Self {
        Self { oracle, config }
    }

    /// Render every emitted routine of the plan.
    pub fn synthesize(&self, plan: &GenerationPlan) -> GenerateResult<OutputUnit> {
        let mut imports = BTreeMap::new();
        let mut receivers = BTreeSet::new();
        let mut routines = Vec::new();

        for routine in plan.routines() {
            self.check_collisions(routine)?;
            if !receivers.insert(routine.type_name.as_str()) {
                return Err(GenerateError::collision(
                    &routine.type_name,
                    &self.config.method,
                    "routine planned twice",
                ));
            }

            let mut writer = RoutineWriter::new(&self.config.method);
            let code = writer.routine(routine, self.config.pointer_receiver);
            for qualifier in writer.qualifiers {
                let path = self
                    .oracle
                    .import_path(&qualifier, &routine.type_name)
                    .ok_or_else(|| {
                        GenerateError::unsupported(
                            &routine.type_name,
                            format!("no import found for package qualifier '{qualifier}'"),
                        )
                    })?;
                imports.insert(path, qualifier);
            }

            tracing::trace!(type_name = %routine.type_name, "rendered routine");
            routines.push(RenderedRoutine {
                type_name: routine.type_name.clone(),
                code,
            });
        }

        tracing::debug!(routines = routines.len(), imports = imports.len(), "synthesized output unit");
        Ok(OutputUnit {
            package: self.oracle.package_name().to_string(),
            imports,
            routines,
        })
    }

    /// The routine name must be free on the receiver type.
    fn check_collisions(&self, routine: &Routine) -> GenerateResult<()> {
        let method = &self.config.method;
        let decl = self
            .oracle
            .lookup(&routine.type_name)
            .ok_or_else(|| GenerateError::not_found(&routine.type_name, None))?;

        if decl.methods.contains_key(method) {
            return Err(GenerateError::collision(
                &routine.type_name,
                method,
                format!("method '{method}' is already declared"),
            ));
        }
        if let TypeDescriptor::Struct { fields } = underlying_of(self.oracle, decl)? {
            if fields.iter().any(|field| &field.name == method) {
                return Err(GenerateError::collision(
                    &routine.type_name,
                    method,
                    format!("struct has a field named '{method}'"),
                ));
            }
        }
        Ok(())
    }
}

/// Writes the statements of one routine.
struct RoutineWriter<'m> {
    method: &'m str,
    out: String,
    qualifiers: BTreeSet<String>,
}

impl<'m> RoutineWriter<'m> {
    fn new(method: &'m str) -> Self {
        Self {
            method,
            out: String::new(),
            qualifiers: BTreeSet::new(),
        }
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn routine(&mut self, routine: &Routine, pointer_receiver: bool) -> String {
        let name = &routine.type_name;
        let method = self.method;

        if pointer_receiver {
            self.line(0, &format!("// {method} generates a deep copy of *{name}"));
            self.line(0, &format!("func (o *{name}) {method}() *{name} {{"));
            self.line(1, "cp := *o");
            // Field selectors auto-dereference; other kinds need an explicit one.
            let src = match routine.kind {
                RoutineKind::Struct => "o",
                _ => "(*o)",
            };
            self.op(&routine.body, "cp", src, 1, 1);
            self.line(1, "return &cp");
        } else {
            self.line(0, &format!("// {method} generates a deep copy of {name}"));
            self.line(0, &format!("func (o {name}) {method}() {name} {{"));
            self.line(1, "cp := o");
            self.op(&routine.body, "cp", "o", 1, 1);
            self.line(1, "return cp");
        }
        self.line(0, "}");
        std::mem::take(&mut self.out)
    }

    /// Emit fix-ups turning `dst`, a shallow copy of `src`, into a deep copy.
    ///
    /// `level` numbers the temporaries introduced at this nesting level.
    fn op(&mut self, op: &CopyOp, dst: &str, src: &str, indent: usize, level: usize) {
        let method = self.method;
        match op {
            CopyOp::Assign | CopyOp::Shallow { .. } => {}
            CopyOp::Call {
                returns_pointer, ..
            } => {
                if *returns_pointer {
                    self.line(indent, &format!("{dst} = *{src}.{method}()"));
                } else {
                    self.line(indent, &format!("{dst} = {src}.{method}()"));
                }
            }
            CopyOp::InterfaceCall => {
                self.line(indent, &format!("if {src} != nil {{"));
                self.line(indent + 1, &format!("{dst} = {src}.{method}()"));
                self.line(indent, "}");
            }
            CopyOp::Pointer { elem } => {
                self.line(indent, &format!("if {src} != nil {{"));
                match elem.as_ref() {
                    CopyOp::Call {
                        returns_pointer: true,
                        ..
                    } => {
                        self.line(indent + 1, &format!("{dst} = {src}.{method}()"));
                    }
                    CopyOp::Call {
                        returns_pointer: false,
                        ..
                    } => {
                        let tmp = format!("v{level}");
                        self.line(indent + 1, &format!("{tmp} := {src}.{method}()"));
                        self.line(indent + 1, &format!("{dst} = &{tmp}"));
                    }
                    inner => {
                        let tmp = format!("p{level}");
                        self.line(indent + 1, &format!("{tmp} := *{src}"));
                        let inner_src = match inner {
                            CopyOp::Struct { .. } => src.to_string(),
                            _ => format!("(*{src})"),
                        };
                        self.op(inner, &tmp, &inner_src, indent + 1, level + 1);
                        self.line(indent + 1, &format!("{dst} = &{tmp}"));
                    }
                }
                self.line(indent, "}");
            }
            CopyOp::Slice { elem } => {
                self.line(indent, &format!("if {src} != nil {{"));
                self.line(
                    indent + 1,
                    &format!("{dst} = append({src}[:0:0], {src}...)"),
                );
                self.elements(elem, dst, src, indent + 1, level);
                self.line(indent, "}");
            }
            CopyOp::Array { elem } => self.elements(elem, dst, src, indent, level),
            CopyOp::Map { map_type, value } => {
                self.qualifiers.extend(map_type.qualifiers());
                let (key, val) = (format!("k{level}"), format!("v{level}"));
                self.line(indent, &format!("if {src} != nil {{"));
                self.line(
                    indent + 1,
                    &format!("{dst} = make({map_type}, len({src}))"),
                );
                self.line(indent + 1, &format!("for {key}, {val} := range {src} {{"));
                if value.is_trivial() {
                    self.line(indent + 2, &format!("{dst}[{key}] = {val}"));
                } else {
                    let tmp = format!("c{level}");
                    self.line(indent + 2, &format!("{tmp} := {val}"));
                    self.op(value, &tmp, &val, indent + 2, level + 1);
                    self.line(indent + 2, &format!("{dst}[{key}] = {tmp}"));
                }
                self.line(indent + 1, "}");
                self.line(indent, "}");
            }
            CopyOp::Struct { fields } => {
                for field in fields {
                    let name = &field.name;
                    self.op(
                        &field.op,
                        &format!("{dst}.{name}"),
                        &format!("{src}.{name}"),
                        indent,
                        level,
                    );
                }
            }
        }
    }

    fn elements(&mut self, elem: &CopyOp, dst: &str, src: &str, indent: usize, level: usize) {
        if elem.is_trivial() {
            return;
        }
        let index = format!("i{level}");
        self.line(indent, &format!("for {index} := range {src} {{"));
        self.op(
            elem,
            &format!("{dst}[{index}]"),
            &format!("{src}[{index}]"),
            indent + 1,
            level + 1,
        );
        self.line(indent, "}");
    }
}
