/*
 * SCCDAG
 *
 * Condensation of a dependence graph:
 * - one node per strongly connected component (dense SccId)
 * - one summary edge per ordered pair of dependent SCCs, holding the
 *   instruction-level sub-edges it stands for
 * - transitive reachability for ordering queries
 *
 * Merging SCCs rebuilds the whole structure from the pooled members.
 */

use super::scc::Scc;
use super::tarjan::strongly_connected_components;
use crate::errors::{LoopgraphError, Result};
use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::features::scc_dag::domain::{SccId, SummaryEdge};
use crate::shared::models::ValueId;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SccDag {
    source: DependenceGraph,
    sccs: Vec<Scc>,
    graph: DiGraph<SccId, SummaryEdge>,
    value_to_scc: FxHashMap<ValueId, SccId>,
    reachable: Vec<FxHashSet<SccId>>,
}

impl SccDag {
    pub fn new(source: &DependenceGraph) -> Self {
        let components = strongly_connected_components(source);
        let sccs = Scc::from_components(source, components);

        let mut dag = Self {
            source: source.clone(),
            sccs,
            graph: DiGraph::new(),
            value_to_scc: FxHashMap::default(),
            reachable: Vec::new(),
        };
        dag.rebuild();
        debug!(
            sccs = dag.num_sccs(),
            edges = dag.graph.edge_count(),
            "SCCDAG built"
        );
        dag
    }

    fn rebuild(&mut self) {
        self.mark_values_in_scc();
        self.mark_edges_and_sub_edges();
        self.compute_reachability_among_sccs();
    }

    fn mark_values_in_scc(&mut self) {
        self.value_to_scc.clear();
        for (i, scc) in self.sccs.iter().enumerate() {
            for value in scc.internal_values() {
                self.value_to_scc.insert(*value, SccId(i as u32));
            }
        }
    }

    fn mark_edges_and_sub_edges(&mut self) {
        let mut graph = DiGraph::with_capacity(self.sccs.len(), 0);
        for i in 0..self.sccs.len() {
            graph.add_node(SccId(i as u32));
        }

        let mut summary: FxHashMap<(SccId, SccId), EdgeIndex> = FxHashMap::default();
        for (i, scc) in self.sccs.iter().enumerate() {
            let from = SccId(i as u32);
            for edge in scc.outgoing_external_edges() {
                let Some(&to) = self.value_to_scc.get(&edge.dst) else {
                    continue;
                };
                let idx = *summary.entry((from, to)).or_insert_with(|| {
                    graph.add_edge(
                        NodeIndex::new(from.index()),
                        NodeIndex::new(to.index()),
                        SummaryEdge::new(from, to),
                    )
                });
                if let Some(weight) = graph.edge_weight_mut(idx) {
                    weight.sub_edges.push(edge.clone());
                }
            }
        }
        self.graph = graph;
    }

    fn compute_reachability_among_sccs(&mut self) {
        self.reachable = (0..self.sccs.len())
            .map(|i| {
                let mut seen = FxHashSet::default();
                let mut queue = VecDeque::new();
                queue.push_back(NodeIndex::new(i));
                while let Some(node) = queue.pop_front() {
                    for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                        if seen.insert(SccId(next.index() as u32)) {
                            queue.push_back(next);
                        }
                    }
                }
                seen
            })
            .collect();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Merging
    // ═══════════════════════════════════════════════════════════════════════

    /// Pool the members of `ids` into one SCC and rebuild the DAG.
    ///
    /// Returns the id of the merged SCC. Every other id may change.
    pub fn merge_sccs(&mut self, ids: &[SccId]) -> Result<SccId> {
        let mut unique: Vec<SccId> = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if let Some(bad) = unique.iter().find(|id| id.index() >= self.sccs.len()) {
            return Err(LoopgraphError::internal(format!("merge of unknown SCC {}", bad)));
        }
        match unique.as_slice() {
            [] => return Err(LoopgraphError::internal("merge of an empty SCC set")),
            [single] => return Ok(*single),
            _ => {}
        }

        let order: FxHashMap<ValueId, usize> =
            self.source.values().enumerate().map(|(i, v)| (v, i)).collect();
        let merged: FxHashSet<SccId> = unique.iter().copied().collect();

        let mut pooled: Vec<ValueId> = Vec::new();
        let mut kept: Vec<Scc> = Vec::with_capacity(self.sccs.len());
        for (i, scc) in std::mem::take(&mut self.sccs).into_iter().enumerate() {
            if merged.contains(&SccId(i as u32)) {
                pooled.extend_from_slice(scc.internal_values());
            } else {
                kept.push(scc);
            }
        }
        pooled.sort_by_key(|v| order.get(v).copied().unwrap_or(usize::MAX));

        kept.push(Scc::new(&self.source, pooled));
        self.sccs = kept;
        self.rebuild();

        let id = SccId((self.sccs.len() - 1) as u32);
        debug!(merged = unique.len(), into = %id, "SCCs merged");
        Ok(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// The condensed dependence graph
    pub fn source(&self) -> &DependenceGraph {
        &self.source
    }

    pub fn num_sccs(&self) -> usize {
        self.sccs.len()
    }

    pub fn scc(&self, id: SccId) -> Option<&Scc> {
        self.sccs.get(id.index())
    }

    pub fn sccs(&self) -> impl Iterator<Item = (SccId, &Scc)> + '_ {
        self.sccs
            .iter()
            .enumerate()
            .map(|(i, s)| (SccId(i as u32), s))
    }

    pub fn scc_ids(&self) -> impl Iterator<Item = SccId> {
        (0..self.sccs.len() as u32).map(SccId)
    }

    pub fn internal_sccs(&self) -> impl Iterator<Item = (SccId, &Scc)> + '_ {
        self.sccs().filter(|(_, s)| s.is_internal())
    }

    pub fn scc_of_value(&self, value: ValueId) -> Option<SccId> {
        self.value_to_scc.get(&value).copied()
    }

    pub fn does_it_contain(&self, value: ValueId) -> bool {
        self.value_to_scc.contains_key(&value)
    }

    /// Summary edges in creation order
    pub fn edges(&self) -> impl Iterator<Item = &SummaryEdge> + '_ {
        self.graph.edge_weights()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    fn directed(&self, id: SccId, dir: Direction) -> Vec<&SummaryEdge> {
        if id.index() >= self.sccs.len() {
            return Vec::new();
        }
        let mut edges: Vec<(EdgeIndex, &SummaryEdge)> = self
            .graph
            .edges_directed(NodeIndex::new(id.index()), dir)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(idx, _)| *idx);
        edges.into_iter().map(|(_, e)| e).collect()
    }

    pub fn outgoing_edges(&self, id: SccId) -> Vec<&SummaryEdge> {
        self.directed(id, Direction::Outgoing)
    }

    pub fn incoming_edges(&self, id: SccId) -> Vec<&SummaryEdge> {
        self.directed(id, Direction::Incoming)
    }

    pub fn edge_between(&self, src: SccId, dst: SccId) -> Option<&SummaryEdge> {
        self.outgoing_edges(src).into_iter().find(|e| e.dst == dst)
    }

    /// SCCs that directly depend on `id`
    pub fn dependents(&self, id: SccId) -> Vec<SccId> {
        self.outgoing_edges(id).iter().map(|e| e.dst).collect()
    }

    /// SCCs `id` directly depends on
    pub fn dependencies(&self, id: SccId) -> Vec<SccId> {
        self.incoming_edges(id).iter().map(|e| e.src).collect()
    }

    /// Internal SCCs without incoming edges
    pub fn top_level_sccs(&self) -> Vec<SccId> {
        self.internal_sccs()
            .map(|(id, _)| id)
            .filter(|id| self.incoming_edges(*id).is_empty())
            .collect()
    }

    /// Internal SCCs without outgoing edges
    pub fn leaf_sccs(&self) -> Vec<SccId> {
        self.internal_sccs()
            .map(|(id, _)| id)
            .filter(|id| self.outgoing_edges(*id).is_empty())
            .collect()
    }

    /// `a` must run before `b`: `b` is reachable from `a`
    pub fn ordered_before(&self, a: SccId, b: SccId) -> bool {
        self.reachable
            .get(a.index())
            .map_or(false, |set| set.contains(&b))
    }

    /// Members of internal SCCs
    pub fn number_of_instructions(&self) -> usize {
        self.internal_sccs().map(|(_, s)| s.num_internal_nodes()).sum()
    }

    /// Stops at the first `true` from `visitor`
    pub fn iterate_over_sccs(&self, mut visitor: impl FnMut(SccId, &Scc) -> bool) -> bool {
        for (id, scc) in self.sccs() {
            if visitor(id, scc) {
                return true;
            }
        }
        false
    }

    /// Members of internal SCCs; stops at the first `true` from `visitor`
    pub fn iterate_over_instructions(&self, mut visitor: impl FnMut(ValueId) -> bool) -> bool {
        for (_, scc) in self.internal_sccs() {
            for value in scc.internal_values() {
                if visitor(*value) {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }
}
