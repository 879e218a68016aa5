//! Integration tests for the deep-copy engine.
//!
//! These tests drive the whole pipeline (plan, synthesize, emit) over
//! hand-built universes and check the generated Go source.

use std::fs;
use tempfile::TempDir;

use deep_copy::{
    CopyOp, Destination, FieldDescriptor, GenerateError, Generator, GeneratorConfig, OutputMode,
    PlanState, ShallowReason, TypeDecl, TypeDescriptor, Universe,
};

/// The `Player`/`Basic`/`Ctl` package.
fn player_universe() -> Universe {
    Universe::new("testdata")
        .with_decl(TypeDecl::new(
            "Basic",
            TypeDescriptor::structure(vec![FieldDescriptor::new(
                "Level",
                TypeDescriptor::basic("int32"),
            )]),
        ))
        .with_decl(TypeDecl::new(
            "Player",
            TypeDescriptor::structure(vec![
                FieldDescriptor::new("PlayerID", TypeDescriptor::basic("int64"))
                    .with_tag("`bson:\"_id\"`"),
                FieldDescriptor::new("SessionID", TypeDescriptor::basic("int64"))
                    .with_tag("`bson:\"-\"`"),
                FieldDescriptor::new("Ctl", TypeDescriptor::named("Ctl"))
                    .with_tag("`deepcopy:\"-\"`"),
                FieldDescriptor::new("Basic", TypeDescriptor::pointer(TypeDescriptor::named("Basic"))),
            ]),
        ))
        .with_decl(TypeDecl::new(
            "Ctl",
            TypeDescriptor::interface(vec![deep_copy::MethodSig::new(
                "GetOpenTime",
                "",
                "int64",
            )]),
        ))
}

fn roots(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Player scenario
// =============================================================================

#[test]
fn test_player_scenario_output() {
    let generation = Generator::default()
        .generate(&player_universe(), &roots(&["Player"]))
        .unwrap();

    let rendered = generation.unit.render();
    assert!(rendered.starts_with("// Code generated by deep-copy; DO NOT EDIT.\n\npackage testdata\n"));
    assert!(rendered.find("*Basic) DeepCopy").unwrap() < rendered.find("*Player) DeepCopy").unwrap());
    assert!(!rendered.contains("o.Ctl"));
    assert_eq!(
        generation.report.routines,
        vec!["Basic".to_string(), "Player".to_string()]
    );
}

#[test]
fn test_player_scenario_plan() {
    let (plan, _) = Generator::default()
        .plan(&player_universe(), &roots(&["Player"]))
        .unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.state("Basic"), Some(PlanState::Emitted));
    assert_eq!(plan.state("Ctl"), None);

    let CopyOp::Struct { fields } = &plan.routine("Player").unwrap().body else {
        panic!("Player routine should copy a struct");
    };
    let ops: Vec<(&str, &CopyOp)> = fields.iter().map(|f| (f.name.as_str(), &f.op)).collect();
    assert_eq!(ops[0], ("PlayerID", &CopyOp::Assign));
    assert_eq!(ops[1], ("SessionID", &CopyOp::Assign));
    assert_eq!(
        ops[2],
        (
            "Ctl",
            &CopyOp::Shallow {
                reason: ShallowReason::OverrideTag
            }
        )
    );
    assert!(matches!(ops[3], ("Basic", CopyOp::Pointer { .. })));
}

#[test]
fn test_player_value_receivers() {
    let config = GeneratorConfig::default().with_pointer_receiver(false);
    let generation = Generator::new(config)
        .generate(&player_universe(), &roots(&["Player"]))
        .unwrap();

    let rendered = generation.unit.render();
    assert!(rendered.contains("func (o Player) DeepCopy() Player {\n\tcp := o\n"));
    assert!(rendered.contains("\t\tv1 := o.Basic.DeepCopy()\n\t\tcp.Basic = &v1\n"));
    assert!(rendered.contains("\treturn cp\n"));
}

#[test]
fn test_custom_method_name() {
    let config = GeneratorConfig::default().with_method("Clone");
    let generation = Generator::new(config)
        .generate(&player_universe(), &roots(&["Player"]))
        .unwrap();

    let rendered = generation.unit.render();
    assert!(rendered.contains("// Clone generates a deep copy of *Player"));
    assert!(rendered.contains("cp.Basic = o.Basic.Clone()"));
    assert!(!rendered.contains("DeepCopy"));
}

// =============================================================================
// Skip selectors
// =============================================================================

fn nested_universe() -> Universe {
    let data = || TypeDescriptor::map(TypeDescriptor::basic("string"), TypeDescriptor::basic("int"));
    Universe::new("nest")
        .with_decl(TypeDecl::new(
            "Outer",
            TypeDescriptor::structure(vec![
                FieldDescriptor::new("Data", data()),
                FieldDescriptor::new("Inner", TypeDescriptor::pointer(TypeDescriptor::named("Inner"))),
            ]),
        ))
        .with_decl(TypeDecl::new(
            "Inner",
            TypeDescriptor::structure(vec![FieldDescriptor::new("Data", data())]),
        ))
}

#[test]
fn test_selector_does_not_reach_nested_routines() {
    let config = GeneratorConfig::default().with_skip_list(["Data"]);
    let generation = Generator::new(config)
        .generate(&nested_universe(), &roots(&["Outer"]))
        .unwrap();

    let outer = &generation.unit.routines[1];
    assert_eq!(outer.type_name, "Outer");
    assert!(!outer.code.contains("cp.Data"));

    let inner = &generation.unit.routines[0];
    assert_eq!(inner.type_name, "Inner");
    assert!(inner.code.contains("cp.Data = make(map[string]int, len(o.Data))"));
}

#[test]
fn test_selector_follows_root_position() {
    let config = GeneratorConfig::default()
        .with_skip_list(Vec::<String>::new())
        .with_skip_list(["Data"]);
    let generation = Generator::new(config)
        .generate(&nested_universe(), &roots(&["Outer", "Inner"]))
        .unwrap();

    let code = |name: &str| {
        generation
            .unit
            .routines
            .iter()
            .find(|r| r.type_name == name)
            .map(|r| r.code.clone())
            .unwrap()
    };
    assert!(code("Outer").contains("cp.Data = make"));
    assert!(!code("Inner").contains("cp.Data = make"));
}

#[test]
fn test_unused_selector_is_reported() {
    let config = GeneratorConfig::default().with_skip_list(["Data", "Typo"]);
    let generation = Generator::new(config)
        .generate(&nested_universe(), &roots(&["Outer"]))
        .unwrap();

    assert_eq!(generation.report.unused_selectors.len(), 1);
    assert_eq!(generation.report.unused_selectors[0].field, "Typo");
}

// =============================================================================
// Cycles, depth and determinism
// =============================================================================

fn tree_universe() -> Universe {
    Universe::new("tree")
        .with_decl(TypeDecl::new(
            "Node",
            TypeDescriptor::structure(vec![
                FieldDescriptor::new("Name", TypeDescriptor::basic("string")),
                FieldDescriptor::new("Parent", TypeDescriptor::pointer(TypeDescriptor::named("Node"))),
                FieldDescriptor::new(
                    "Children",
                    TypeDescriptor::slice(TypeDescriptor::pointer(TypeDescriptor::named("Node"))),
                ),
                FieldDescriptor::new("Meta", TypeDescriptor::pointer(TypeDescriptor::named("Meta"))),
            ]),
        ))
        .with_decl(TypeDecl::new(
            "Meta",
            TypeDescriptor::structure(vec![
                FieldDescriptor::new(
                    "Labels",
                    TypeDescriptor::map(
                        TypeDescriptor::basic("string"),
                        TypeDescriptor::slice(TypeDescriptor::basic("string")),
                    ),
                ),
                FieldDescriptor::new("Owner", TypeDescriptor::pointer(TypeDescriptor::named("Owner"))),
            ]),
        ))
        .with_decl(TypeDecl::new(
            "Owner",
            TypeDescriptor::structure(vec![FieldDescriptor::new(
                "Emails",
                TypeDescriptor::slice(TypeDescriptor::basic("string")),
            )]),
        ))
}

#[test]
fn test_self_reference_terminates_with_one_routine() {
    let generation = Generator::default()
        .generate(&tree_universe(), &roots(&["Node"]))
        .unwrap();

    let node_routines = generation
        .unit
        .routines
        .iter()
        .filter(|r| r.type_name == "Node")
        .count();
    assert_eq!(node_routines, 1);
    assert_eq!(
        generation.report.routines,
        vec!["Meta".to_string(), "Node".to_string(), "Owner".to_string()]
    );
}

#[test]
fn test_max_depth_bounds_generated_routines() {
    let config = GeneratorConfig::default().with_max_depth(1);
    let generation = Generator::new(config)
        .generate(&tree_universe(), &roots(&["Node"]))
        .unwrap();

    // Meta sits at depth 1; Owner would sit at depth 2.
    assert_eq!(
        generation.report.routines,
        vec!["Meta".to_string(), "Node".to_string()]
    );
    // Meta's own fields sit at depth 2 and are kept by reference.
    let meta = &generation.unit.routines[0].code;
    assert!(!meta.contains("Owner"));
    assert!(!meta.contains("Labels"));
    // Node still calls its own routine past the bound.
    let node = &generation.unit.routines[1].code;
    assert!(node.contains("cp.Children[i1] = o.Children[i1].DeepCopy()"));
}

#[test]
fn test_output_is_deterministic() {
    let config = GeneratorConfig::default().with_max_depth(3);
    let first = Generator::new(config.clone())
        .generate(&tree_universe(), &roots(&["Node", "Owner"]))
        .unwrap();
    let second = Generator::new(config)
        .generate(&tree_universe(), &roots(&["Owner", "Node"]))
        .unwrap();

    assert_eq!(first.unit.render(), second.unit.render());
}

#[test]
fn test_missing_root_produces_no_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.go");
    fs::write(&path, "previous").unwrap();

    let mut destination = Destination::open(&path).unwrap();
    let err = Generator::default()
        .generate_to(&player_universe(), &roots(&["Ghost"]), &mut destination)
        .unwrap_err();

    assert!(matches!(err, GenerateError::TypeNotFound { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
}

// =============================================================================
// Destination modes
// =============================================================================

#[test]
fn test_truncate_then_append() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deepcopy_gen.go");

    let mut destination = Destination::open(&path).unwrap();
    Generator::default()
        .generate_to(&player_universe(), &roots(&["Basic"]), &mut destination)
        .unwrap();

    let appender = Generator::new(GeneratorConfig::default().with_mode(OutputMode::Append));
    let owner = Universe::new("testdata").with_decl(TypeDecl::new(
        "Owner",
        TypeDescriptor::structure(vec![FieldDescriptor::new(
            "Emails",
            TypeDescriptor::slice(TypeDescriptor::basic("string")),
        )]),
    ));
    let mut destination = Destination::open(&path).unwrap();
    let (_, emitted) = appender
        .generate_to(&owner, &roots(&["Owner"]), &mut destination)
        .unwrap();
    assert!(!emitted.wrote_header);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("// Code generated by deep-copy").count(), 1);
    assert!(content.contains("func (o *Basic) DeepCopy() *Basic {"));
    assert!(content.contains("func (o *Owner) DeepCopy() *Owner {"));
    assert!(content.find("*Basic").unwrap() < content.find("*Owner").unwrap());
}

#[test]
fn test_truncate_replaces_previous_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deepcopy_gen.go");
    fs::write(&path, "// stale content that is much longer than anything else\n".repeat(50)).unwrap();

    let mut destination = Destination::open(&path).unwrap();
    let (generation, _) = Generator::default()
        .generate_to(&player_universe(), &roots(&["Player"]), &mut destination)
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), generation.unit.render());
}
