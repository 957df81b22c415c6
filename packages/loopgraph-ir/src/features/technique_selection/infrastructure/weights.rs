//! Dynamic weight of a loop and of its SCCs
//!
//! Instructions without a recorded count are assumed to run once per
//! iteration of the loop.

use super::context::SelectionContext;
use crate::features::scc_classifier::infrastructure::SccDagAttrs;
use crate::features::scc_dag::domain::SccId;
use crate::features::scc_dag::infrastructure::SccDag;
use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::{Function, LoopStructure, ValueId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct LoopWeights {
    total: u64,
    iterations: u64,
    invocations: u64,
    per_instruction: FxHashMap<ValueId, u64>,
    scc_weights: Vec<u64>,
}

impl LoopWeights {
    pub fn new(
        function: &Function,
        lp: &LoopStructure,
        sccdag: &SccDag,
        profile: &dyn ProfileOracle,
    ) -> Self {
        let iterations = profile.loop_iterations(function, lp).unwrap_or(1).max(1);
        let invocations = profile.loop_invocations(function, lp).unwrap_or(1).max(1);

        let per_instruction: FxHashMap<ValueId, u64> = lp
            .instructions(function)
            .into_iter()
            .map(|v| (v, profile.instruction_executions(function, v).unwrap_or(iterations)))
            .collect();
        let total = per_instruction.values().sum();

        let scc_weights = sccdag
            .sccs()
            .map(|(_, scc)| {
                scc.internal_values()
                    .iter()
                    .filter_map(|v| per_instruction.get(v))
                    .sum()
            })
            .collect();

        Self {
            total,
            iterations,
            invocations,
            per_instruction,
            scc_weights,
        }
    }

    pub fn from_context(ctx: &SelectionContext<'_>) -> Self {
        Self::new(ctx.function, ctx.lp, ctx.sccdag, ctx.profile)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn instruction_weight(&self, value: ValueId) -> u64 {
        self.per_instruction.get(&value).copied().unwrap_or(0)
    }

    pub fn scc_weight(&self, id: SccId) -> u64 {
        self.scc_weights.get(id.index()).copied().unwrap_or(0)
    }

    /// Weight of one iteration
    pub fn instructions_per_iteration(&self) -> f64 {
        self.total as f64 / self.iterations as f64
    }

    /// Share of the loop taken by `weight`, 0 for an empty loop
    pub fn fraction(&self, weight: u64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        weight as f64 / self.total as f64
    }

    pub fn biggest_scc_share(&self) -> f64 {
        self.fraction(self.scc_weights.iter().copied().max().unwrap_or(0))
    }

    /// Share of the loop spent in SCCs that must run in iteration order
    pub fn sequential_fraction(&self, attrs: &SccDagAttrs) -> f64 {
        let sequential = (0..self.scc_weights.len())
            .map(|i| SccId(i as u32))
            .filter(|id| attrs.attrs(*id).map_or(false, |a| a.requires_synchronization()))
            .map(|id| self.scc_weight(id))
            .sum();
        self.fraction(sequential)
    }

    pub fn biggest_sequential_scc_weight(&self, attrs: &SccDagAttrs) -> u64 {
        (0..self.scc_weights.len())
            .map(|i| SccId(i as u32))
            .filter(|id| attrs.attrs(*id).map_or(false, |a| a.requires_synchronization()))
            .map(|id| self.scc_weight(id))
            .max()
            .unwrap_or(0)
    }

    /// Time saved by running everything but the biggest sequential SCC in
    /// parallel
    pub fn estimated_savings(&self, attrs: &SccDagAttrs) -> f64 {
        let per_iteration = self.instructions_per_iteration();
        let sequential_per_iteration =
            self.biggest_sequential_scc_weight(attrs) as f64 / self.iterations as f64;
        (per_iteration - sequential_per_iteration).max(0.0) * self.iterations as f64
    }
}
