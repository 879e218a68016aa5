//! # deep-copy
//!
//! Planner and code synthesizer for Go deep-copy methods.
//!
//! Given the declarations of a Go package (through a [`TypeOracle`]) and a
//! list of root type names, the engine plans which named types need a
//! generated copy routine and renders one `DeepCopy`-style method for each.
//!
//! ## Architecture
//!
//! - [`model`] - Type descriptors and the [`TypeOracle`] seam
//! - [`skip`] - Override tags and per-root skip selectors
//! - [`plan`] - Memoized depth-first traversal into a [`GenerationPlan`]
//! - [`synth`] - Go rendering of planned routines
//! - [`emit`] - Truncating or appending output to a destination
//! - [`config`] - Generator options
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust
//! use deep_copy::{FieldDescriptor, Generator, GeneratorConfig, TypeDecl, TypeDescriptor, Universe};
//!
//! let universe = Universe::new("geo").with_decl(TypeDecl::new(
//!     "Path",
//!     TypeDescriptor::structure(vec![FieldDescriptor::new(
//!         "Points",
//!         TypeDescriptor::slice(TypeDescriptor::basic("float64")),
//!     )]),
//! ));
//!
//! let generation = Generator::new(GeneratorConfig::default())
//!     .generate(&universe, &["Path".to_string()])
//!     .unwrap();
//! assert!(generation.unit.render().contains("func (o *Path) DeepCopy() *Path {"));
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod model;
pub mod plan;
pub mod skip;
pub mod synth;

pub use config::{GeneratorConfig, OutputMode, DEFAULT_METHOD};
pub use emit::{Destination, EmitReport, Emitter};
pub use error::{DestinationError, GenerateError, GenerateResult};
pub use model::{
    FieldDescriptor, MethodDecl, MethodSig, TypeDecl, TypeDescriptor, TypeOracle, Universe,
};
pub use plan::{CopyOp, GenerationPlan, PlanState, Planner, Routine};
pub use skip::{ShallowReason, SkipRules, UnusedSelector};
pub use synth::{OutputUnit, Synthesizer};

use serde::Serialize;

/// Summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Requested roots after deduplication.
    pub roots: Vec<String>,

    /// Types that received a generated routine, in output order.
    pub routines: Vec<String>,

    /// Types whose hand-written routine is called.
    pub provided: Vec<String>,

    /// Skip selectors that matched no field.
    pub unused_selectors: Vec<UnusedSelector>,
}

/// Result of planning and synthesis.
#[derive(Debug, Clone)]
pub struct Generation {
    pub plan: GenerationPlan,
    pub unit: OutputUnit,
    pub report: GenerationReport,
}

/// Runs the plan, synthesize and emit pipeline.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Plan the routines needed for `roots`.
    pub fn plan<O: TypeOracle + ?Sized>(
        &self,
        oracle: &O,
        roots: &[String],
    ) -> GenerateResult<(GenerationPlan, SkipRules)> {
        self.validate(roots)?;
        let rules = SkipRules::build(roots, &self.config.skip_lists)?;
        let plan = Planner::new(oracle, &self.config, &rules).plan_roots()?;
        Ok((plan, rules))
    }

    /// Plan and render the output unit for `roots`.
    pub fn generate<O: TypeOracle + ?Sized>(
        &self,
        oracle: &O,
        roots: &[String],
    ) -> GenerateResult<Generation> {
        let (plan, rules) = self.plan(oracle, roots)?;
        let unit = Synthesizer::new(oracle, &self.config).synthesize(&plan)?;

        let unused_selectors = rules.unused_selectors(oracle);
        for unused in &unused_selectors {
            tracing::warn!(root = %unused.root, field = %unused.field, "skip selector matches no field");
        }

        let report = GenerationReport {
            roots: rules.roots().to_vec(),
            routines: unit.routines.iter().map(|r| r.type_name.clone()).collect(),
            provided: plan.provided().iter().cloned().collect(),
            unused_selectors,
        };
        tracing::debug!(
            roots = report.roots.len(),
            routines = report.routines.len(),
            "generation planned"
        );
        Ok(Generation { plan, unit, report })
    }

    /// Write a synthesized unit with the configured output mode.
    pub fn emit(&self, unit: &OutputUnit, destination: &mut Destination) -> GenerateResult<EmitReport> {
        Ok(Emitter::new(self.config.mode).emit(unit, destination)?)
    }

    /// Generate and write in one step; nothing is written on failure.
    pub fn generate_to<O: TypeOracle + ?Sized>(
        &self,
        oracle: &O,
        roots: &[String],
        destination: &mut Destination,
    ) -> GenerateResult<(Generation, EmitReport)> {
        let generation = self.generate(oracle, roots)?;
        let emitted = self.emit(&generation.unit, destination)?;
        Ok((generation, emitted))
    }

    fn validate(&self, roots: &[String]) -> GenerateResult<()> {
        if roots.is_empty() {
            return Err(GenerateError::invalid("no root types requested"));
        }
        if !config::is_identifier(&self.config.method) {
            return Err(GenerateError::invalid(format!(
                "'{}' is not a valid method name",
                self.config.method
            )));
        }
        if let Some(root) = roots.iter().find(|root| !config::is_identifier(root)) {
            return Err(GenerateError::invalid(format!(
                "'{root}' is not a valid type name"
            )));
        }
        Ok(())
    }
}
