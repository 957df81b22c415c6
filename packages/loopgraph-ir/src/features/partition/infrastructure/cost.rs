//! Partition cost balancing
//!
//! The cost of an SCC is the number of dynamic executions of its
//! instructions (one per instruction without a profile). While there are
//! more subsets than allowed stages, the cheapest parent/child pair whose
//! merge keeps the subset graph acyclic is merged.

use super::partition::SccDagPartition;
use crate::errors::Result;
use crate::features::partition::domain::SubsetId;
use crate::features::scc_dag::domain::SccId;
use crate::features::scc_dag::infrastructure::SccDag;
use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::Function;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PartitionCostAnalysis {
    scc_costs: Vec<u64>,
}

impl PartitionCostAnalysis {
    pub fn new(function: &Function, sccdag: &SccDag, profile: &dyn ProfileOracle) -> Self {
        let scc_costs = sccdag
            .sccs()
            .map(|(_, scc)| {
                scc.internal_values()
                    .iter()
                    .filter(|v| function.is_instruction(**v))
                    .map(|v| profile.instruction_executions(function, *v).unwrap_or(1))
                    .sum()
            })
            .collect();
        Self { scc_costs }
    }

    pub fn from_costs(scc_costs: Vec<u64>) -> Self {
        Self { scc_costs }
    }

    pub fn scc_cost(&self, id: SccId) -> u64 {
        self.scc_costs.get(id.index()).copied().unwrap_or(0)
    }

    pub fn subset_cost(&self, partition: &SccDagPartition, id: SubsetId) -> u64 {
        partition
            .subset(id)
            .map_or(0, |s| s.sccs.iter().map(|scc| self.scc_cost(*scc)).sum())
    }

    /// Cheapest mergeable parent/child pair, ties broken by the smaller ids
    fn cheapest_pair(&self, partition: &SccDagPartition) -> Option<(SubsetId, SubsetId)> {
        let mut best: Option<(u64, SubsetId, SubsetId)> = None;
        for parent in partition.subset_ids() {
            for child in partition.dependents(parent) {
                if !partition.can_merge_subsets(parent, child) {
                    continue;
                }
                let cost = self.subset_cost(partition, parent) + self.subset_cost(partition, child);
                let (a, b) = if parent < child { (parent, child) } else { (child, parent) };
                let candidate = (cost, a, b);
                if best.map_or(true, |current| candidate < current) {
                    best = Some(candidate);
                }
            }
        }
        best.map(|(_, a, b)| (a, b))
    }

    /// Merge until at most `max_stages` subsets remain; returns the merges done
    pub fn balance(&self, partition: &mut SccDagPartition, max_stages: usize) -> Result<usize> {
        let mut merges = 0;
        while partition.number_of_subsets() > max_stages.max(1) {
            let Some((a, b)) = self.cheapest_pair(partition) else {
                debug!(
                    subsets = partition.number_of_subsets(),
                    max_stages, "no mergeable pair left"
                );
                break;
            };
            partition.merge_subsets(a, b)?;
            merges += 1;
        }
        Ok(merges)
    }
}
