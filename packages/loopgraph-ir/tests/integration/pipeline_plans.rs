// Pipeline-level behavior: batch analysis, plan serialization, the
// commutativity sidecar, profile-driven loop selection and input errors

#[path = "../common/mod.rs"]
mod common;
use common::{
    assert_technique, increment_loop, nested_loops, pointer_chase_loop, quiet_config,
    reduction_loop, scc_containing, sidecar_json, single_loop,
};

use loopgraph_ir::features::technique_selection::{RecordedProfile, Technique};
use loopgraph_ir::features::dependence_graph::infrastructure::CommutativityAnnotations;
use loopgraph_ir::shared::models::FunctionBuilder;
use loopgraph_ir::{
    analyze_function, analyze_functions, Collaborators, LoopgraphError,
    ParallelizationPlan,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_batch_is_sorted_and_deterministic() {
    let functions = vec![
        reduction_loop("reduce").0,
        pointer_chase_loop("chase", 0).0,
        increment_loop("inc").0,
    ];
    let parallel = quiet_config().parallel_functions(true);
    let sequential = quiet_config().parallel_functions(false);

    let a = analyze_functions(&functions, &Collaborators::default(), &parallel).unwrap();
    let b = analyze_functions(&functions, &Collaborators::default(), &sequential).unwrap();

    let names: Vec<&str> = a.iter().map(|p| p.function.as_str()).collect();
    assert_eq!(names, vec!["chase", "inc", "reduce"]);
    assert_eq!(a, b);
}

#[test]
fn test_empty_function_is_an_input_error() {
    let err = FunctionBuilder::new("empty").build().unwrap_err();
    assert!(err.is_input_error());
    assert!(matches!(err, LoopgraphError::MalformedInput(_)));
}

#[test]
fn test_empty_batch() {
    let plans = analyze_functions(&[], &Collaborators::default(), &quiet_config()).unwrap();
    assert!(plans.is_empty());
}

#[test]
fn test_plan_json_roundtrip() {
    let (f, _) = reduction_loop("reduce");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();

    let json = plan.to_json().unwrap();
    assert!(json.contains("\"function\": \"reduce\""));
    assert!(json.contains("DOALL"));

    let loaded = ParallelizationPlan::from_json(&json).unwrap();
    assert_eq!(loaded, plan);
}

#[test]
fn test_rejected_plan_json_roundtrip() {
    let (f, _) = pointer_chase_loop("chase", 0);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let loaded = ParallelizationPlan::from_json(&plan.to_json().unwrap()).unwrap();
    assert_eq!(loaded.loops[0].verdicts, plan.loops[0].verdicts);
}

#[test]
fn test_malformed_plan_json_is_an_error() {
    let err = ParallelizationPlan::from_json("{ \"function\": 3 }").unwrap_err();
    assert!(matches!(err, LoopgraphError::Json(_)));
    assert!(!err.is_input_error());
}

#[test]
fn test_sidecar_splits_annotated_cycle() {
    let (f, [_, sum, s2]) = reduction_loop("reduce");

    let plain = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plain);
    assert_eq!(scc_containing(lp, sum).id, scc_containing(lp, s2).id);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(sidecar_json("reduce", &[(s2, sum)]).as_bytes())
        .unwrap();
    let annotations = CommutativityAnnotations::from_path(file.path()).unwrap();
    assert_eq!(annotations.len(), 1);

    let collaborators = Collaborators::default().with_annotations(&annotations);
    let annotated = analyze_function(&f, &collaborators, &quiet_config()).unwrap();
    let lp = single_loop(&annotated);
    assert_ne!(scc_containing(lp, sum).id, scc_containing(lp, s2).id);
}

#[test]
fn test_sidecar_for_another_function_is_ignored() {
    let (f, [_, sum, s2]) = reduction_loop("reduce");
    let annotations =
        CommutativityAnnotations::from_json_str(&sidecar_json("other", &[(s2, sum)])).unwrap();
    let collaborators = Collaborators::default().with_annotations(&annotations);
    let plan = analyze_function(&f, &collaborators, &quiet_config()).unwrap();
    let lp = single_loop(&plan);
    assert_eq!(scc_containing(lp, sum).id, scc_containing(lp, s2).id);
}

#[test]
fn test_missing_sidecar_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CommutativityAnnotations::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, LoopgraphError::Io(_)));
}

#[test]
fn test_parallelizable_loop_is_selected() {
    let (f, _) = reduction_loop("reduce");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);
    assert!(lp.estimated_savings > 0.0);
    assert!(lp.selected);
    assert_eq!(plan.selected_loops, vec![lp.loop_id]);
}

#[test]
fn test_selection_threshold_excludes_small_savings() {
    let (f, _) = reduction_loop("reduce");
    let config = quiet_config().techniques(|t| t.min_time_saved_fraction(1.0));
    let plan = analyze_function(&f, &Collaborators::default(), &config).unwrap();
    let lp = single_loop(&plan);
    assert_technique(lp, Some(Technique::Doall));
    assert!(!lp.selected);
    assert!(plan.selected_loops.is_empty());
}

#[test]
fn test_recorded_profile_scales_savings() {
    let (f, _) = reduction_loop("reduce");
    let static_plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();

    let header = static_plan.loops[0].header;
    let profile = RecordedProfile::new().with_loop(header.0, 1, 100);
    let collaborators = Collaborators::default().with_profile(&profile);
    let profiled = analyze_function(&f, &collaborators, &quiet_config()).unwrap();

    let before = static_plan.loops[0].estimated_savings;
    let after = profiled.loops[0].estimated_savings;
    assert!((after - before * 100.0).abs() < 1e-9, "{} vs {}", after, before);
    assert!(profiled.loops[0].selected);
}

#[test]
fn test_rejected_loop_is_never_selected() {
    let (f, _) = pointer_chase_loop("chase", 0);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    assert_technique(single_loop(&plan), None);
    assert!(plan.selected_loops.is_empty());
}

#[test]
fn test_nested_loops_are_planned_separately() {
    let (f, [_, j]) = nested_loops("nest");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    assert_eq!(plan.loops.len(), 2);

    let mut levels: Vec<u32> = plan.loops.iter().map(|l| l.nesting_level).collect();
    levels.sort_unstable();
    assert_eq!(levels, vec![1, 2]);

    let inner = plan.loops.iter().find(|l| l.nesting_level == 2).unwrap();
    assert_technique(inner, Some(Technique::Doall));
    let governing = inner.governing_iv.as_ref().expect("inner governing IV");
    assert_eq!(governing.induction_variable.header_phi, j);
}

#[test]
fn test_function_without_loops_has_empty_plan() {
    let mut b = FunctionBuilder::new("straight");
    let entry = b.block("entry");
    b.switch_to(entry);
    b.ret(None);
    let f = b.build().unwrap();

    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    assert!(plan.loops.is_empty());
    assert!(plan.selected_loops.is_empty());
}
