//! Property-based tests over random dependence graphs
//!
//! Invariants that must hold for ALL graphs:
//! - Condensation: the SCCDAG is acyclic and partitions the nodes
//! - Partition: merges never leave a cycle in the subset graph
//! - Merge size: merging k subsets removes exactly k - 1 of them
//! - Subgraph: the internal nodes of a subgraph are exactly the requested values

#[path = "../common/mod.rs"]
mod common;
use common::{assert_partition_well_formed, graph_from_edges};

use loopgraph_ir::features::dependence_graph::{DependenceGraph, DependenceKind};
use loopgraph_ir::features::partition::{SccDagPartition, SubsetId};
use loopgraph_ir::features::scc_dag::SccDag;
use loopgraph_ir::shared::models::ValueId;
use proptest::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

const MAX_NODES: u32 = 12;

fn kind_strategy() -> impl Strategy<Value = DependenceKind> {
    prop_oneof![
        3 => Just(DependenceKind::Variable),
        1 => Just(DependenceKind::MayMemory),
        1 => Just(DependenceKind::MustMemory),
        1 => Just(DependenceKind::Control),
    ]
}

/// (node count, edges between existing nodes)
fn graph_strategy() -> impl Strategy<Value = (u32, Vec<(u32, u32, DependenceKind)>)> {
    (1..=MAX_NODES).prop_flat_map(|nodes| {
        let edge = (0..nodes, 0..nodes, kind_strategy());
        (Just(nodes), prop::collection::vec(edge, 0..(nodes as usize * 3)))
    })
}

fn random_graph() -> impl Strategy<Value = (u32, DependenceGraph)> {
    graph_strategy().prop_map(|(nodes, edges)| (nodes, graph_from_edges(nodes, &edges)))
}

fn singleton_partition(dag: &SccDag) -> SccDagPartition {
    let mut partition = SccDagPartition::new(dag);
    for id in dag.scc_ids() {
        partition
            .create_subset([id])
            .expect("fresh SCC");
    }
    partition
}

proptest! {
    #[test]
    fn prop_condensation_is_acyclic_and_covers_every_node((nodes, dg) in random_graph()) {
        let dag = SccDag::new(&dg);
        prop_assert!(dag.is_acyclic());

        let covered: usize = dag.sccs().map(|(_, scc)| scc.num_internal_nodes()).sum();
        prop_assert_eq!(covered, nodes as usize);
        for n in 0..nodes {
            let id = dag.scc_of_value(ValueId(n));
            prop_assert!(id.is_some());
            let owners = dag
                .sccs()
                .filter(|(_, scc)| scc.contains(ValueId(n)))
                .count();
            prop_assert_eq!(owners, 1);
        }
    }

    #[test]
    fn prop_cross_scc_edges_become_summary_edges((_, dg) in random_graph()) {
        let dag = SccDag::new(&dg);
        for (_, edge) in dg.edges() {
            let src = dag.scc_of_value(edge.src).unwrap();
            let dst = dag.scc_of_value(edge.dst).unwrap();
            if src != dst {
                prop_assert!(dag.edge_between(src, dst).is_some());
                prop_assert!(!dag.ordered_before(dst, src));
            }
        }
    }

    #[test]
    fn prop_mem_sync_merges_keep_partition_acyclic((_, dg) in random_graph()) {
        let dag = SccDag::new(&dg);
        let mut partition = singleton_partition(&dag);
        partition.merge_subsets_requiring_mem_sync().unwrap();
        prop_assert!(partition.is_acyclic());
        assert_partition_well_formed(&partition);

        let covered: usize = partition.subsets().map(|s| s.len()).sum();
        prop_assert_eq!(covered, dag.num_sccs());
    }

    #[test]
    fn prop_cycle_merges_keep_partition_acyclic(
        (_, dg) in random_graph(),
        groups in 1usize..5,
    ) {
        let dag = SccDag::new(&dg);
        let mut partition = SccDagPartition::new(&dag);
        for g in 0..groups {
            let members: Vec<_> = dag.scc_ids().filter(|id| id.index() % groups == g).collect();
            if !members.is_empty() {
                partition.create_subset(members).unwrap();
            }
        }

        partition.merge_subsets_forming_cycles().unwrap();
        prop_assert!(partition.is_acyclic());
        assert_partition_well_formed(&partition);
    }

    #[test]
    fn prop_merging_k_subsets_removes_k_minus_one(
        (_, dg) in random_graph(),
        picks in prop::collection::btree_set(0usize..MAX_NODES as usize, 2..5),
    ) {
        let dag = SccDag::new(&dg);
        let mut partition = singleton_partition(&dag);
        let ids = partition.subset_ids();
        let chosen: Vec<SubsetId> = picks
            .iter()
            .filter_map(|i| ids.get(*i).copied())
            .collect();
        prop_assume!(chosen.len() >= 2);

        let before = partition.number_of_subsets();
        let merged = partition.merge_all(&chosen).unwrap();
        prop_assert_eq!(partition.number_of_subsets(), before - (chosen.len() - 1));
        prop_assert!(!ids.contains(&merged));
        prop_assert_eq!(partition.subset(merged).unwrap().len(), chosen.len());
    }

    #[test]
    fn prop_single_subset_merge_is_rejected((_, dg) in random_graph()) {
        let dag = SccDag::new(&dg);
        let mut partition = singleton_partition(&dag);
        let first = partition.subset_ids()[0];
        let before = partition.number_of_subsets();
        prop_assert!(partition.merge_all(&[first]).is_err());
        prop_assert!(partition.merge_all(&[first, first]).is_err());
        prop_assert_eq!(partition.number_of_subsets(), before);
    }

    #[test]
    fn prop_subgraph_internal_nodes_are_the_requested_values(
        (nodes, dg) in random_graph(),
        mask in prop::collection::vec(any::<bool>(), MAX_NODES as usize),
    ) {
        let values: Vec<ValueId> = (0..nodes)
            .filter(|n| mask[*n as usize])
            .map(ValueId)
            .collect();
        prop_assume!(!values.is_empty());

        let sub = dg
            .create_subgraph_from_values(&values, true, &FxHashSet::default())
            .unwrap();
        let internal: BTreeSet<ValueId> = sub.internal_values().into_iter().collect();
        let expected: BTreeSet<ValueId> = values.iter().copied().collect();
        prop_assert_eq!(internal, expected.clone());

        for (_, edge) in sub.edges() {
            prop_assert!(expected.contains(&edge.src) || expected.contains(&edge.dst));
        }
    }
}
