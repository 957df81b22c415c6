/*
 * SCCDAG Partition
 *
 * Groups SCCs into subsets (future pipeline stages). The subset graph is
 * induced by the SCCDAG edges; SCCs left out of every subset (clonable ones)
 * are looked through when relating subsets.
 *
 * Merges:
 * - memory synchronization: subsets linked by a memory dependence share a stage
 * - cycles: every cycle of the subset graph collapses into one subset
 *
 * All collections are ordered so that merges are reproducible.
 */

use crate::errors::{LoopgraphError, Result};
use crate::features::partition::domain::{Subset, SubsetId};
use crate::features::scc_dag::domain::SccId;
use crate::features::scc_dag::infrastructure::SccDag;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SccEdge {
    src: SccId,
    dst: SccId,
    memory: bool,
}

#[derive(Debug, Clone)]
pub struct SccDagPartition {
    num_sccs: usize,
    edges: Vec<SccEdge>,
    successors: Vec<Vec<SccId>>,
    predecessors: Vec<Vec<SccId>>,
    subsets: BTreeMap<SubsetId, Subset>,
    scc_to_subset: BTreeMap<SccId, SubsetId>,
    next_id: u32,
}

impl SccDagPartition {
    pub fn new(sccdag: &SccDag) -> Self {
        let num_sccs = sccdag.num_sccs();
        let edges: Vec<SccEdge> = sccdag
            .edges()
            .map(|e| SccEdge {
                src: e.src,
                dst: e.dst,
                memory: e.has_memory_dependence(),
            })
            .collect();
        let mut successors = vec![Vec::new(); num_sccs];
        let mut predecessors = vec![Vec::new(); num_sccs];
        for edge in &edges {
            successors[edge.src.index()].push(edge.dst);
            predecessors[edge.dst.index()].push(edge.src);
        }
        Self {
            num_sccs,
            edges,
            successors,
            predecessors,
            subsets: BTreeMap::new(),
            scc_to_subset: BTreeMap::new(),
            next_id: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subsets
    // ═══════════════════════════════════════════════════════════════════════

    /// Register `sccs` as a new subset
    pub fn create_subset(&mut self, sccs: impl IntoIterator<Item = SccId>) -> Result<SubsetId> {
        let sccs: BTreeSet<SccId> = sccs.into_iter().collect();
        if sccs.is_empty() {
            return Err(LoopgraphError::internal("subset without SCCs"));
        }
        for scc in &sccs {
            if scc.index() >= self.num_sccs {
                return Err(LoopgraphError::internal(format!("unknown SCC {}", scc)));
            }
            if let Some(owner) = self.scc_to_subset.get(scc) {
                return Err(LoopgraphError::internal(format!(
                    "{} already belongs to {}",
                    scc, owner
                )));
            }
        }
        Ok(self.insert_subset(sccs))
    }

    fn insert_subset(&mut self, sccs: BTreeSet<SccId>) -> SubsetId {
        let id = SubsetId(self.next_id);
        self.next_id += 1;
        for scc in &sccs {
            self.scc_to_subset.insert(*scc, id);
        }
        self.subsets.insert(id, Subset::new(id, sccs));
        id
    }

    pub fn merge_subsets(&mut self, a: SubsetId, b: SubsetId) -> Result<SubsetId> {
        self.merge_all(&[a, b])
    }

    /// Replace `ids` by one fresh subset holding all their SCCs
    pub fn merge_all(&mut self, ids: &[SubsetId]) -> Result<SubsetId> {
        let unique: BTreeSet<SubsetId> = ids.iter().copied().collect();
        if unique.len() < 2 || unique.len() != ids.len() {
            return Err(LoopgraphError::internal(format!(
                "merge needs at least two distinct subsets, got {:?}",
                ids
            )));
        }
        if let Some(unknown) = unique.iter().find(|id| !self.subsets.contains_key(id)) {
            return Err(LoopgraphError::internal(format!("merge of unknown {}", unknown)));
        }

        let mut pooled = BTreeSet::new();
        for id in &unique {
            if let Some(subset) = self.subsets.remove(id) {
                pooled.extend(subset.sccs);
            }
        }
        let merged = self.insert_subset(pooled);
        debug!(merged = unique.len(), into = %merged, "subsets merged");
        Ok(merged)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn subsets(&self) -> impl Iterator<Item = &Subset> + '_ {
        self.subsets.values()
    }

    pub fn subset(&self, id: SubsetId) -> Option<&Subset> {
        self.subsets.get(&id)
    }

    pub fn subset_ids(&self) -> Vec<SubsetId> {
        self.subsets.keys().copied().collect()
    }

    pub fn subset_of(&self, scc: SccId) -> Option<SubsetId> {
        self.scc_to_subset.get(&scc).copied()
    }

    pub fn number_of_subsets(&self) -> usize {
        self.subsets.len()
    }

    /// Subsets reached from `id` through SCC edges, looking through SCCs
    /// that belong to no subset
    pub fn dependents(&self, id: SubsetId) -> BTreeSet<SubsetId> {
        self.related(id, &self.successors)
    }

    pub fn ancestors(&self, id: SubsetId) -> BTreeSet<SubsetId> {
        self.related(id, &self.predecessors)
    }

    fn related(&self, id: SubsetId, adjacency: &[Vec<SccId>]) -> BTreeSet<SubsetId> {
        let mut related = BTreeSet::new();
        let Some(subset) = self.subsets.get(&id) else {
            return related;
        };
        let mut visited: BTreeSet<SccId> = BTreeSet::new();
        let mut queue: VecDeque<SccId> = subset.sccs.iter().copied().collect();
        while let Some(scc) = queue.pop_front() {
            if !visited.insert(scc) {
                continue;
            }
            match self.subset_of(scc) {
                Some(other) if other != id => {
                    related.insert(other);
                    continue;
                }
                _ => {}
            }
            if let Some(kin) = adjacency.get(scc.index()) {
                queue.extend(kin.iter().copied());
            }
        }
        related
    }

    pub fn top_level_subsets(&self) -> Vec<SubsetId> {
        self.subsets
            .keys()
            .copied()
            .filter(|id| self.ancestors(*id).is_empty())
            .collect()
    }

    /// Dependents of `id` that do not depend on another dependent of `id`
    pub fn next_level_subsets(&self, id: SubsetId) -> Vec<SubsetId> {
        let dependents = self.dependents(id);
        dependents
            .iter()
            .copied()
            .filter(|dep| self.ancestors(*dep).is_disjoint(&dependents))
            .collect()
    }

    /// SCCDAG edges from SCCs of `a` to SCCs of `b`
    pub fn num_edges_between(&self, a: SubsetId, b: SubsetId) -> usize {
        self.edges
            .iter()
            .filter(|e| self.subset_of(e.src) == Some(a) && self.subset_of(e.dst) == Some(b))
            .count()
    }

    fn subset_graph(&self) -> BTreeMap<SubsetId, BTreeSet<SubsetId>> {
        self.subsets
            .keys()
            .map(|id| (*id, self.dependents(*id)))
            .collect()
    }

    /// Longest-path depth of every subset outside a cycle
    fn depths(&self) -> BTreeMap<SubsetId, usize> {
        let graph = self.subset_graph();
        let mut in_degree: BTreeMap<SubsetId, usize> = graph.keys().map(|id| (*id, 0)).collect();
        for deps in graph.values() {
            for dep in deps {
                *in_degree.entry(*dep).or_default() += 1;
            }
        }

        let mut depths: BTreeMap<SubsetId, usize> = BTreeMap::new();
        let mut ready: VecDeque<SubsetId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in &ready {
            depths.insert(*id, 0);
        }
        while let Some(id) = ready.pop_front() {
            let depth = depths.get(&id).copied().unwrap_or(0);
            for dep in graph.get(&id).into_iter().flatten() {
                let entry = depths.entry(*dep).or_insert(0);
                *entry = (*entry).max(depth + 1);
                if let Some(d) = in_degree.get_mut(dep) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push_back(*dep);
                    }
                }
            }
        }
        depths.retain(|id, _| in_degree.get(id).copied() == Some(0));
        depths
    }

    /// Longest path from a subset without ancestors; `None` inside a cycle
    pub fn depth(&self, id: SubsetId) -> Option<usize> {
        self.depths().get(&id).copied()
    }

    /// Subsets by increasing depth, then id
    pub fn depth_ordered_subsets(&self) -> Vec<SubsetId> {
        let mut ordered: Vec<(usize, SubsetId)> =
            self.depths().into_iter().map(|(id, d)| (d, id)).collect();
        ordered.sort_unstable();
        ordered.into_iter().map(|(_, id)| id).collect()
    }

    pub fn is_acyclic(&self) -> bool {
        self.find_cycle().is_none()
    }

    /// Whether merging `a` and `b` keeps the subset graph acyclic
    pub fn can_merge_subsets(&self, a: SubsetId, b: SubsetId) -> bool {
        !self.reaches_indirectly(a, b) && !self.reaches_indirectly(b, a)
    }

    /// Path `from -> x -> ... -> to` through at least one other subset
    fn reaches_indirectly(&self, from: SubsetId, to: SubsetId) -> bool {
        let mut visited: BTreeSet<SubsetId> = BTreeSet::new();
        let mut queue: VecDeque<SubsetId> = self
            .dependents(from)
            .into_iter()
            .filter(|s| *s != to)
            .collect();
        while let Some(s) = queue.pop_front() {
            if !visited.insert(s) {
                continue;
            }
            for dep in self.dependents(s) {
                if dep == to {
                    return true;
                }
                if dep != from {
                    queue.push_back(dep);
                }
            }
        }
        false
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Merging strategies
    // ═══════════════════════════════════════════════════════════════════════

    /// First subset reached from `id` by an SCCDAG edge carrying a memory dependence
    fn first_memory_dependent(&self, id: SubsetId) -> Option<SubsetId> {
        let subset = self.subsets.get(&id)?;
        for scc in &subset.sccs {
            for edge in self.edges.iter().filter(|e| e.src == *scc && e.memory) {
                match self.subset_of(edge.dst) {
                    Some(other) if other != id => return Some(other),
                    _ => {}
                }
            }
        }
        None
    }

    /// Put subsets that synchronize through memory in the same stage
    pub fn merge_subsets_requiring_mem_sync(&mut self) -> Result<()> {
        let mut queue: VecDeque<SubsetId> = self.top_level_subsets().into();
        if queue.is_empty() {
            queue.extend(self.subsets.keys().next().copied());
        }
        let mut visited: BTreeSet<SubsetId> = BTreeSet::new();

        while let Some(id) = queue.pop_front() {
            if !self.subsets.contains_key(&id) || !visited.insert(id) {
                continue;
            }
            let Some(target) = self.first_memory_dependent(id) else {
                queue.extend(self.dependents(id));
                continue;
            };

            let merged = self.merge_subsets(id, target)?;
            let anchor = self.subsets.get(&merged).and_then(|s| s.sccs.iter().next().copied());
            if !self.is_acyclic() {
                self.merge_subsets_forming_cycles()?;
            }
            if let Some(current) = anchor.and_then(|scc| self.subset_of(scc)) {
                queue.push_front(current);
            }
        }

        self.merge_subsets_forming_cycles()
    }

    /// Collapse every cycle of the subset graph
    pub fn merge_subsets_forming_cycles(&mut self) -> Result<()> {
        let rounds = self.subsets.len() + 1;
        for _ in 0..rounds {
            let Some(cycle) = self.find_cycle() else {
                return Ok(());
            };
            debug!(length = cycle.len(), "collapsing subset cycle");
            self.merge_all(&cycle)?;
        }
        error!(
            subsets = self.subsets.len(),
            "subset cycles survive after {} rounds", rounds
        );
        Err(LoopgraphError::internal("subset graph cycles could not be collapsed"))
    }

    /// Subsets on the first cycle met by a depth-first walk from the roots
    /// (or from the lowest id when every subset has an ancestor)
    fn find_cycle(&self) -> Option<Vec<SubsetId>> {
        let graph = self.subset_graph();
        let mut done: BTreeSet<SubsetId> = BTreeSet::new();
        let seeds = self
            .top_level_subsets()
            .into_iter()
            .chain(self.subsets.keys().copied());

        for seed in seeds {
            if done.contains(&seed) {
                continue;
            }
            let children = |id: SubsetId| -> std::vec::IntoIter<SubsetId> {
                graph
                    .get(&id)
                    .map(|deps| deps.iter().copied().collect::<Vec<_>>())
                    .unwrap_or_default()
                    .into_iter()
            };
            let mut path: Vec<SubsetId> = vec![seed];
            let mut on_path: BTreeSet<SubsetId> = BTreeSet::from([seed]);
            let mut stack = vec![children(seed)];

            loop {
                let next = match stack.last_mut() {
                    Some(it) => it.next(),
                    None => break,
                };
                match next {
                    Some(child) if on_path.contains(&child) => {
                        let start = path.iter().position(|p| *p == child)?;
                        return Some(path[start..].to_vec());
                    }
                    Some(child) if done.contains(&child) => {}
                    Some(child) => {
                        path.push(child);
                        on_path.insert(child);
                        stack.push(children(child));
                    }
                    None => {
                        stack.pop();
                        if let Some(finished) = path.pop() {
                            on_path.remove(&finished);
                            done.insert(finished);
                        }
                    }
                }
            }
        }
        None
    }
}
