/*
 * Dependence Graph
 *
 * Directed multigraph over function values:
 * - Nodes are internal (inside the region of interest) or external
 *   (boundary values referenced by internal nodes)
 * - Edges carry a kind (control / variable / must-memory / may-memory),
 *   a data hazard (RAW / WAW / WAR) and a loop-carried flag
 *
 * Storage:
 * - petgraph DiGraph + ValueId -> NodeIndex map
 * - nodes are never removed, so NodeIndex order is insertion order
 * - subgraphs are new, independently owned graphs
 */

use crate::config::ControlEdgePolicy;
use crate::features::dependence_graph::domain::{
    DataDependenceType, DependenceEdge, DependenceKind, DependenceNode, DependenceStats, EdgeKey,
};
use crate::shared::models::{Function, LoopStructure, ValueId};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Serializable DTO for DependenceGraph
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DependenceGraphDto {
    pub nodes: Vec<DependenceNode>,
    pub edges: Vec<DependenceEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct DependenceGraph {
    graph: DiGraph<DependenceNode, DependenceEdge>,
    node_map: FxHashMap<ValueId, NodeIndex>,
}

impl serde::Serialize for DependenceGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let dto = DependenceGraphDto {
            nodes: self.graph.node_weights().copied().collect(),
            edges: self.graph.edge_weights().cloned().collect(),
        };
        dto.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for DependenceGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let dto = DependenceGraphDto::deserialize(deserializer)?;
        let mut dg = DependenceGraph::new();
        for node in dto.nodes {
            dg.add_node(node.value, node.internal);
        }
        for edge in dto.edges {
            dg.add_edge(edge);
        }
        Ok(dg)
    }
}

impl DependenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a node, or promote an existing external node to internal
    pub fn add_node(&mut self, value: ValueId, internal: bool) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&value) {
            if internal {
                self.graph[idx].internal = true;
            }
            return idx;
        }
        let idx = self.graph.add_node(DependenceNode { value, internal });
        self.node_map.insert(value, idx);
        idx
    }

    /// Add an edge between existing nodes (ignored if an endpoint is unknown)
    pub fn add_edge(&mut self, edge: DependenceEdge) -> Option<EdgeIndex> {
        let src = *self.node_map.get(&edge.src)?;
        let dst = *self.node_map.get(&edge.dst)?;
        Some(self.graph.add_edge(src, dst, edge))
    }

    pub fn add_dependence(
        &mut self,
        src: ValueId,
        dst: ValueId,
        kind: DependenceKind,
        data_type: DataDependenceType,
    ) -> Option<EdgeIndex> {
        self.add_edge(DependenceEdge::new(src, dst, kind, data_type))
    }

    pub fn set_loop_carried(&mut self, edge: EdgeIndex, loop_carried: bool) {
        if let Some(weight) = self.graph.edge_weight_mut(edge) {
            weight.loop_carried = loop_carried;
        }
    }

    /// Keep only the edges for which `keep` holds. Edge order is preserved.
    pub fn retain_edges(&mut self, mut keep: impl FnMut(EdgeIndex, &DependenceEdge) -> bool) {
        let mut graph = DiGraph::with_capacity(self.graph.node_count(), self.graph.edge_count());
        for node in self.graph.node_weights() {
            graph.add_node(*node);
        }
        for (i, edge) in self.graph.raw_edges().iter().enumerate() {
            if keep(EdgeIndex::new(i), &edge.weight) {
                graph.add_edge(edge.source(), edge.target(), edge.weight.clone());
            }
        }
        self.graph = graph;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn contains(&self, value: ValueId) -> bool {
        self.node_map.contains_key(&value)
    }

    pub fn is_internal(&self, value: ValueId) -> bool {
        self.node_map
            .get(&value)
            .map_or(false, |idx| self.graph[*idx].internal)
    }

    pub fn is_external(&self, value: ValueId) -> bool {
        self.node_map
            .get(&value)
            .map_or(false, |idx| !self.graph[*idx].internal)
    }

    /// All values in insertion order
    pub fn values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.graph.node_weights().map(|n| n.value)
    }

    pub fn internal_values(&self) -> Vec<ValueId> {
        self.graph
            .node_weights()
            .filter(|n| n.internal)
            .map(|n| n.value)
            .collect()
    }

    pub fn external_values(&self) -> Vec<ValueId> {
        self.graph
            .node_weights()
            .filter(|n| !n.internal)
            .map(|n| n.value)
            .collect()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_internal_nodes(&self) -> usize {
        self.graph.node_weights().filter(|n| n.internal).count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &DependenceEdge)> + '_ {
        self.graph
            .edge_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&DependenceEdge> {
        self.graph.edge_weight(idx)
    }

    fn directed_edges(&self, value: ValueId, dir: Direction) -> Vec<(EdgeIndex, &DependenceEdge)> {
        let Some(&idx) = self.node_map.get(&value) else {
            return Vec::new();
        };
        let mut edges: Vec<(EdgeIndex, &DependenceEdge)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges
    }

    /// Edges whose consumer is `value`, in insertion order
    pub fn incoming_edges(&self, value: ValueId) -> Vec<(EdgeIndex, &DependenceEdge)> {
        self.directed_edges(value, Direction::Incoming)
    }

    /// Edges whose producer is `value`, in insertion order
    pub fn outgoing_edges(&self, value: ValueId) -> Vec<(EdgeIndex, &DependenceEdge)> {
        self.directed_edges(value, Direction::Outgoing)
    }

    pub fn edges_between(&self, src: ValueId, dst: ValueId) -> Vec<&DependenceEdge> {
        self.outgoing_edges(src)
            .into_iter()
            .filter(|(_, e)| e.dst == dst)
            .map(|(_, e)| e)
            .collect()
    }

    pub fn has_edge(&self, src: ValueId, dst: ValueId, kind: DependenceKind) -> bool {
        self.edges_between(src, dst).iter().any(|e| e.kind == kind)
    }

    fn kind_selected(
        kind: DependenceKind,
        include_control: bool,
        include_memory: bool,
        include_variable: bool,
    ) -> bool {
        match kind {
            DependenceKind::Control => include_control,
            DependenceKind::Variable => include_variable,
            DependenceKind::MustMemory | DependenceKind::MayMemory => include_memory,
        }
    }

    /// Visit the dependences produced by `value` (consumers of `value`).
    ///
    /// Stops as soon as `visitor` returns `true`; the return value tells
    /// whether the walk was cut short.
    pub fn iterate_over_dependences_from(
        &self,
        value: ValueId,
        include_control: bool,
        include_memory: bool,
        include_variable: bool,
        mut visitor: impl FnMut(ValueId, &DependenceEdge) -> bool,
    ) -> bool {
        for (_, edge) in self.outgoing_edges(value) {
            if !Self::kind_selected(edge.kind, include_control, include_memory, include_variable) {
                continue;
            }
            if visitor(edge.dst, edge) {
                return true;
            }
        }
        false
    }

    /// Visit the dependences consumed by `value` (producers of `value`).
    pub fn iterate_over_dependences_to(
        &self,
        value: ValueId,
        include_control: bool,
        include_memory: bool,
        include_variable: bool,
        mut visitor: impl FnMut(ValueId, &DependenceEdge) -> bool,
    ) -> bool {
        for (_, edge) in self.incoming_edges(value) {
            if !Self::kind_selected(edge.kind, include_control, include_memory, include_variable) {
                continue;
            }
            if visitor(edge.src, edge) {
                return true;
            }
        }
        false
    }

    /// Whether `to` is reachable from `from`
    pub fn is_reachable(&self, from: ValueId, to: ValueId, include_control: bool) -> bool {
        if from == to {
            return self.contains(from);
        }
        let mut visited: FxHashSet<ValueId> = FxHashSet::default();
        let mut worklist = VecDeque::new();
        worklist.push_back(from);
        visited.insert(from);

        while let Some(current) = worklist.pop_front() {
            for (_, edge) in self.outgoing_edges(current) {
                if edge.is_control() && !include_control {
                    continue;
                }
                if edge.dst == to {
                    return true;
                }
                if visited.insert(edge.dst) {
                    worklist.push_back(edge.dst);
                }
            }
        }
        false
    }

    /// Whether the edges among internal nodes form a cycle
    pub fn has_cycle(&self, policy: ControlEdgePolicy) -> bool {
        let filtered = self.graph.filter_map(
            |_, node| if node.internal { Some(*node) } else { None },
            |_, edge| {
                if edge.is_control() && !policy.includes_control() {
                    None
                } else {
                    Some(())
                }
            },
        );
        petgraph::algo::is_cyclic_directed(&filtered)
    }

    pub fn stats(&self) -> DependenceStats {
        let mut stats = DependenceStats::default();
        for node in self.graph.node_weights() {
            if node.internal {
                stats.internal_nodes += 1;
            } else {
                stats.external_nodes += 1;
            }
        }
        for edge in self.graph.edge_weights() {
            match edge.kind {
                DependenceKind::Control => stats.control_edges += 1,
                DependenceKind::Variable => stats.variable_edges += 1,
                DependenceKind::MustMemory => stats.must_memory_edges += 1,
                DependenceKind::MayMemory => stats.may_memory_edges += 1,
            }
            if edge.loop_carried {
                stats.loop_carried_edges += 1;
            }
        }
        stats
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subgraphs
    // ═══════════════════════════════════════════════════════════════════════

    /// New graph whose internal nodes are exactly `values`.
    ///
    /// Edges touching at least one of `values` are copied. Their other
    /// endpoint becomes an external node when `link_to_external` is set;
    /// otherwise such edges are dropped. Edges listed in `edges_to_ignore`
    /// are never copied.
    pub fn create_subgraph_from_values(
        &self,
        values: &[ValueId],
        link_to_external: bool,
        edges_to_ignore: &FxHashSet<EdgeKey>,
    ) -> Option<DependenceGraph> {
        if values.is_empty() {
            return None;
        }

        let mut sub = DependenceGraph::new();
        let members: FxHashSet<ValueId> = values.iter().copied().collect();
        for value in values {
            sub.add_node(*value, true);
        }

        for (_, edge) in self.edges() {
            if edges_to_ignore.contains(&edge.key()) {
                continue;
            }
            let src_in = members.contains(&edge.src);
            let dst_in = members.contains(&edge.dst);
            if !src_in && !dst_in {
                continue;
            }
            if !(src_in && dst_in) && !link_to_external {
                continue;
            }
            if !src_in {
                sub.add_node(edge.src, false);
            }
            if !dst_in {
                sub.add_node(edge.dst, false);
            }
            sub.add_edge(edge.clone());
        }

        Some(sub)
    }

    /// Loop-level view: the loop's instructions, linked to their boundary values
    pub fn create_loop_subgraph(
        &self,
        function: &Function,
        lp: &LoopStructure,
    ) -> Option<DependenceGraph> {
        self.create_subgraph_from_values(&lp.instructions(function), true, &FxHashSet::default())
    }

    /// Function-level view: arguments and instructions of `function`
    pub fn create_function_subgraph(&self, function: &Function) -> Option<DependenceGraph> {
        let values: Vec<ValueId> = function
            .arguments()
            .map(|a| a.id)
            .chain(function.instructions().map(|i| i.id))
            .filter(|v| self.contains(*v))
            .collect();
        self.create_subgraph_from_values(&values, false, &FxHashSet::default())
    }
}
