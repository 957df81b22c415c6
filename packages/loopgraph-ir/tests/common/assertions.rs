//! Custom assertions over parallelization plans

use loopgraph_ir::features::partition::SccDagPartition;
use loopgraph_ir::features::scc_classifier::SccType;
use loopgraph_ir::features::technique_selection::{DisqualifyingReason, Technique};
use loopgraph_ir::pipeline::{LoopPlan, ParallelizationPlan, SccSummary};
use loopgraph_ir::shared::models::ValueId;

/// The plan of the only loop of a function
pub fn single_loop(plan: &ParallelizationPlan) -> &LoopPlan {
    assert_eq!(
        plan.loops.len(),
        1,
        "Expected exactly one loop in '{}', got {}",
        plan.function,
        plan.loops.len()
    );
    &plan.loops[0]
}

/// The SCC summary holding `value`
pub fn scc_containing(lp: &LoopPlan, value: ValueId) -> &SccSummary {
    lp.sccs
        .iter()
        .find(|s| s.members.contains(&value))
        .unwrap_or_else(|| panic!("no SCC contains {} in loop {}", value, lp.loop_id))
}

/// Assert that `value` sits in an SCC of the given type
pub fn assert_scc_type(lp: &LoopPlan, value: ValueId, expected: SccType) {
    let scc = scc_containing(lp, value);
    assert_eq!(
        scc.scc_type, expected,
        "Expected {} to be {:?}, its SCC {} is {:?}",
        value, expected, scc.id, scc.scc_type
    );
}

/// Assert the chosen technique
pub fn assert_technique(lp: &LoopPlan, expected: Option<Technique>) {
    assert_eq!(
        lp.technique,
        expected,
        "Unexpected technique for loop {}. Verdicts: {:?}",
        lp.loop_id,
        lp.verdicts
    );
}

/// Reason `technique` was rejected, failing when it was legal or never evaluated
pub fn rejection(lp: &LoopPlan, technique: Technique) -> DisqualifyingReason {
    let verdict = lp
        .verdicts
        .iter()
        .find(|v| v.technique == technique)
        .unwrap_or_else(|| panic!("{} was not evaluated for loop {}", technique, lp.loop_id));
    verdict
        .legality
        .reason()
        .unwrap_or_else(|| panic!("{} is legal for loop {}", technique, lp.loop_id))
}

/// Assert that the subset graph has no cycle and every subset is non-empty
pub fn assert_partition_well_formed(partition: &SccDagPartition) {
    assert!(partition.is_acyclic(), "subset graph has a cycle");
    for subset in partition.subsets() {
        assert!(!subset.is_empty(), "{} is empty", subset.id);
        for scc in &subset.sccs {
            assert_eq!(partition.subset_of(*scc), Some(subset.id));
        }
    }
}
