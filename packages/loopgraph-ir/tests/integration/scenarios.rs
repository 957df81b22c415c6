// End-to-end loop scenarios: classification, partition merges and
// technique selection on small hand-built loops

#[path = "../common/mod.rs"]
mod common;
use common::{
    assert_partition_well_formed, assert_scc_type, assert_technique, dead_address_loop,
    graph_from_edges, increment_loop, pointer_chase_loop, quiet_config, reduction_loop, rejection,
    scale_loop, scc_containing, single_loop, AllDisjoint, LoopFixture,
};

use loopgraph_ir::features::dependence_graph::DependenceKind;
use loopgraph_ir::features::partition::SccDagPartition;
use loopgraph_ir::features::scc_classifier::{SccType, StepValue};
use loopgraph_ir::features::scc_dag::SccDag;
use loopgraph_ir::features::technique_selection::{DisqualifyingReason, Technique};
use loopgraph_ir::shared::models::{CmpPredicate, Operand, ValueId};
use loopgraph_ir::{analyze_function, Collaborators};
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════════
// a[i] = a[i] + 1
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_disjoint_array_update_is_doall() {
    let (f, h) = increment_loop("inc");
    let collaborators = Collaborators::default().with_iteration_domain(&AllDisjoint);
    let plan = analyze_function(&f, &collaborators, &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    assert_technique(lp, Some(Technique::Doall));
    assert_eq!(lp.verdicts.len(), 1);

    let iv = scc_containing(lp, h.i);
    assert!(iv.is_induction_variable);
    assert!(iv.is_clonable);
    assert_eq!(iv.scc_type, SccType::Sequential);
    assert!(iv.members.contains(&h.next));
    assert!(iv.members.contains(&h.cmp));

    for value in [h.x, h.y, h.store] {
        assert_scc_type(lp, value, SccType::Independent);
    }
    assert_ne!(scc_containing(lp, h.x).id, scc_containing(lp, h.store).id);

    let governing = lp.governing_iv.as_ref().expect("governing IV");
    assert_eq!(governing.start_value(), Operand::int(0));
    assert_eq!(governing.step(), Some(StepValue::Constant(1)));
    assert_eq!(governing.predicate, CmpPredicate::Slt);
    assert_eq!(governing.induction_variable.header_phi, h.i);

    let doall = lp.doall.as_ref().expect("DOALL plan");
    assert_eq!(doall.governing_iv.header_cmp, h.cmp);
}

#[test]
fn test_unproven_array_update_blocks_doall() {
    let (f, h) = increment_loop("inc");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    let update = scc_containing(lp, h.x);
    assert!(update.members.contains(&h.y));
    assert!(update.members.contains(&h.store));
    assert_eq!(update.scc_type, SccType::Sequential);
    assert!(!update.is_clonable);

    assert_eq!(
        rejection(lp, Technique::Doall),
        DisqualifyingReason::BlockingScc { scc: update.id }
    );
    assert_ne!(lp.technique, Some(Technique::Doall));
    assert!(lp.doall.is_none());
}

#[test]
fn test_address_sccs_are_clonable_only_with_consumers() {
    let (f, h) = increment_loop("inc");
    let collaborators = Collaborators::default().with_iteration_domain(&AllDisjoint);
    let plan = analyze_function(&f, &collaborators, &quiet_config()).unwrap();
    let address = scc_containing(single_loop(&plan), h.ptr);
    assert_eq!(address.members, vec![h.ptr]);
    assert!(address.is_clonable);

    let (f, ptr) = dead_address_loop("dead");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let address = scc_containing(single_loop(&plan), ptr);
    assert_eq!(address.members, vec![ptr]);
    assert_eq!(address.scc_type, SccType::Independent);
    assert!(!address.is_clonable);
}

// ═══════════════════════════════════════════════════════════════════════════
// y = a[i] * 2, last y read after the loop
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_live_out_of_independent_scc_keeps_doall() {
    let (f, [ptr, x, y]) = scale_loop("scale");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    for value in [x, y] {
        assert_scc_type(lp, value, SccType::Independent);
    }
    assert!(scc_containing(lp, ptr).is_clonable);
    assert!(!scc_containing(lp, y).is_reducible);
    assert_technique(lp, Some(Technique::Doall));
    assert!(lp.doall.is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// sum += a[i]
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reduction_scc_is_commutative() {
    let (f, [_, sum, s2]) = reduction_loop("reduce");
    let fixture = LoopFixture::new(f);
    let config = quiet_config();
    let content = fixture.content(&Collaborators::default(), &config);

    let id = content.sccdag.scc_of_value(sum).unwrap();
    let attrs = content.attrs.attrs(id).unwrap();
    assert_eq!(attrs.scc_type, SccType::Commutative);
    assert!(attrs.is_reducible);
    assert_eq!(attrs.phis, vec![sum]);
    assert_eq!(attrs.accumulators, vec![s2]);

    // s2 = sum + x: one operand from the SCC, one from outside
    let scc = content.sccdag.scc(id).unwrap();
    let operands: Vec<bool> = fixture
        .function
        .instruction(s2)
        .unwrap()
        .operands
        .iter()
        .map(|o| o.as_value().map_or(false, |v| scc.contains(v)))
        .collect();
    assert_eq!(operands, vec![true, false]);
}

#[test]
fn test_reduction_is_doall() {
    let (f, [_, sum, _]) = reduction_loop("reduce");
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);
    assert_technique(lp, Some(Technique::Doall));
    assert!(scc_containing(lp, sum).is_reducible);
    assert_eq!(lp.environment.live_outs.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// node = node->next
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_pointer_chase_blocks_doall() {
    let (f, [node, next]) = pointer_chase_loop("chase", 0);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    let chase = scc_containing(lp, node);
    assert!(chase.members.contains(&next));
    assert!(!chase.is_induction_variable);
    assert!(!chase.is_clonable);
    assert_eq!(chase.scc_type, SccType::Sequential);
    assert_eq!(
        rejection(lp, Technique::Doall),
        DisqualifyingReason::BlockingScc { scc: chase.id }
    );
    assert!(lp.governing_iv.is_none());
}

#[test]
fn test_pointer_chase_with_side_work_is_pipelined() {
    let (f, [node, _]) = pointer_chase_loop("chase", 2);
    let plan = analyze_function(&f, &Collaborators::default(), &quiet_config()).unwrap();
    let lp = single_loop(&plan);

    assert_technique(lp, Some(Technique::Dswp));
    assert!(matches!(
        rejection(lp, Technique::Doall),
        DisqualifyingReason::BlockingScc { .. }
    ));
    assert_eq!(rejection(lp, Technique::Helix), DisqualifyingReason::TooSynchronized);

    let chase = scc_containing(lp, node).id;
    let dswp = lp.dswp.as_ref().expect("DSWP plan");
    assert!(!dswp.stages.is_empty());
    assert!(dswp.stages.iter().any(|s| s.sccs.contains(&chase)));
    assert_eq!(lp.stages, dswp.stages);
}

// ═══════════════════════════════════════════════════════════════════════════
// Partition merges
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_memory_dependent_subsets_share_a_stage() {
    // 0 -mem-> 1 -var-> 2
    let dg = graph_from_edges(
        3,
        &[(0, 1, DependenceKind::MustMemory), (1, 2, DependenceKind::Variable)],
    );
    let dag = SccDag::new(&dg);
    let scc = |v: u32| dag.scc_of_value(ValueId(v)).unwrap();
    let mut partition = SccDagPartition::new(&dag);
    for v in 0..3 {
        partition.create_subset([scc(v)]).unwrap();
    }

    partition.merge_subsets_requiring_mem_sync().unwrap();

    assert_eq!(partition.number_of_subsets(), 2);
    assert_eq!(partition.subset_of(scc(0)), partition.subset_of(scc(1)));
    assert_ne!(partition.subset_of(scc(1)), partition.subset_of(scc(2)));
    assert_partition_well_formed(&partition);
}

#[test]
fn test_subset_cycle_collapses() {
    // chain 0 -> 1 -> 2 -> 3 with S1 = {0, 3}, S2 = {1}, S3 = {2}
    let dg = graph_from_edges(
        4,
        &[
            (0, 1, DependenceKind::Variable),
            (1, 2, DependenceKind::Variable),
            (2, 3, DependenceKind::Variable),
        ],
    );
    let dag = SccDag::new(&dg);
    let scc = |v: u32| dag.scc_of_value(ValueId(v)).unwrap();
    let mut partition = SccDagPartition::new(&dag);
    partition.create_subset([scc(0), scc(3)]).unwrap();
    partition.create_subset([scc(1)]).unwrap();
    partition.create_subset([scc(2)]).unwrap();
    assert!(!partition.is_acyclic());

    partition.merge_subsets_forming_cycles().unwrap();

    assert_eq!(partition.number_of_subsets(), 1);
    let only = partition.subsets().next().unwrap();
    assert_eq!(only.len(), 4);
    assert_partition_well_formed(&partition);
}
