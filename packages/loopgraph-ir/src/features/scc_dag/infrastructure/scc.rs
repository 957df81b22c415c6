//! Strongly connected component
//!
//! Owns a subgraph re-derived from the condensed graph: its members are the
//! internal nodes, the values they touch in other components are external.

use crate::config::ControlEdgePolicy;
use crate::features::dependence_graph::domain::DependenceEdge;
use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::shared::models::{Function, Instruction, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub struct Scc {
    members: Vec<ValueId>,
    graph: DependenceGraph,
    internal: bool,
}

impl Scc {
    pub(crate) fn new(source: &DependenceGraph, members: Vec<ValueId>) -> Self {
        let graph = source
            .create_subgraph_from_values(&members, true, &FxHashSet::default())
            .unwrap_or_default();
        let internal = members.iter().any(|v| source.is_internal(*v));
        Self {
            members,
            graph,
            internal,
        }
    }

    /// One SCC per component, from a single pass over the source edges.
    ///
    /// Each edge lands in the bucket of the component owning its source and,
    /// when different, of the one owning its destination.
    pub(crate) fn from_components(source: &DependenceGraph, components: Vec<Vec<ValueId>>) -> Vec<Self> {
        let mut owner: FxHashMap<ValueId, usize> = FxHashMap::default();
        for (i, members) in components.iter().enumerate() {
            owner.extend(members.iter().map(|v| (*v, i)));
        }

        let mut buckets: Vec<Vec<&DependenceEdge>> = vec![Vec::new(); components.len()];
        for (_, edge) in source.edges() {
            let src = owner.get(&edge.src).copied();
            let dst = owner.get(&edge.dst).copied();
            if let Some(i) = src {
                buckets[i].push(edge);
            }
            if let Some(i) = dst.filter(|d| src != Some(*d)) {
                buckets[i].push(edge);
            }
        }

        components
            .into_iter()
            .zip(buckets)
            .map(|(members, edges)| Self::from_bucket(source, members, edges))
            .collect()
    }

    fn from_bucket(source: &DependenceGraph, members: Vec<ValueId>, edges: Vec<&DependenceEdge>) -> Self {
        let mut graph = DependenceGraph::new();
        for value in &members {
            graph.add_node(*value, true);
        }
        for edge in edges {
            graph.add_node(edge.src, false);
            graph.add_node(edge.dst, false);
            graph.add_edge(edge.clone());
        }
        let internal = members.iter().any(|v| source.is_internal(*v));
        Self {
            members,
            graph,
            internal,
        }
    }

    /// Member values, in graph insertion order
    pub fn internal_values(&self) -> &[ValueId] {
        &self.members
    }

    pub fn external_values(&self) -> Vec<ValueId> {
        self.graph.external_values()
    }

    pub fn num_internal_nodes(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.graph.is_internal(value)
    }

    /// Whether any member was internal to the condensed graph
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn graph(&self) -> &DependenceGraph {
        &self.graph
    }

    /// Cycle among members, counting control edges only under `IncludeControl`
    pub fn has_cycle(&self, policy: ControlEdgePolicy) -> bool {
        self.graph.has_cycle(policy)
    }

    /// Edges with both endpoints in this SCC
    pub fn internal_edges(&self) -> impl Iterator<Item = &DependenceEdge> + '_ {
        self.graph
            .edges()
            .map(|(_, e)| e)
            .filter(move |e| self.contains(e.src) && self.contains(e.dst))
    }

    /// Edges from a member to a value outside this SCC
    pub fn outgoing_external_edges(&self) -> impl Iterator<Item = &DependenceEdge> + '_ {
        self.graph
            .edges()
            .map(|(_, e)| e)
            .filter(move |e| self.contains(e.src) && !self.contains(e.dst))
    }

    /// Edges from a value outside this SCC to a member
    pub fn incoming_external_edges(&self) -> impl Iterator<Item = &DependenceEdge> + '_ {
        self.graph
            .edges()
            .map(|(_, e)| e)
            .filter(move |e| !self.contains(e.src) && self.contains(e.dst))
    }

    pub fn instructions<'f>(&'f self, function: &'f Function) -> impl Iterator<Item = &'f Instruction> + 'f {
        self.members.iter().filter_map(move |v| function.instruction(*v))
    }

    pub fn number_of_instructions(&self, function: &Function) -> usize {
        self.instructions(function).count()
    }
}
