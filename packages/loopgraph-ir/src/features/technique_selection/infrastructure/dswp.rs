//! DSWP legality
//!
//! The partition subsets become pipeline stages connected by queues. Each
//! stage recomputes the clonable SCCs it needs.

use super::context::SelectionContext;
use super::weights::LoopWeights;
use crate::features::technique_selection::domain::{
    DisqualifyingReason, DswpPlan, Legality, Stage,
};
use crate::shared::models::Opcode;

/// Checks shared by the pipelining techniques
pub fn base_violation(ctx: &SelectionContext<'_>) -> Option<DisqualifyingReason> {
    if ctx.lp.exit_blocks(ctx.function).is_empty() {
        return Some(DisqualifyingReason::NoExitBlock);
    }
    let has_invoke = ctx
        .lp
        .instructions(ctx.function)
        .into_iter()
        .filter_map(|v| ctx.function.instruction(v))
        .any(|inst| matches!(inst.opcode, Opcode::Invoke { .. }));
    if has_invoke {
        return Some(DisqualifyingReason::HasInvoke);
    }
    None
}

/// Depth-ordered partition subsets
pub fn partition_stages(ctx: &SelectionContext<'_>) -> Vec<Stage> {
    ctx.partition
        .depth_ordered_subsets()
        .into_iter()
        .filter_map(|id| {
            let subset = ctx.partition.subset(id)?;
            Some(Stage {
                subset: id,
                depth: ctx.partition.depth(id).unwrap_or(0),
                sccs: subset.sccs.iter().copied().collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DswpSelector;

impl DswpSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn legality(&self, ctx: &SelectionContext<'_>) -> Legality {
        match self.first_violation(ctx) {
            Some(reason) => Legality::Illegal(reason),
            None => Legality::Legal,
        }
    }

    pub fn plan(&self, ctx: &SelectionContext<'_>) -> Option<DswpPlan> {
        if !self.legality(ctx).is_legal() {
            return None;
        }
        Some(DswpPlan {
            stages: partition_stages(ctx),
            clonable_sccs: ctx.attrs.clonable_sccs(),
        })
    }

    fn first_violation(&self, ctx: &SelectionContext<'_>) -> Option<DisqualifyingReason> {
        if let Some(reason) = base_violation(ctx) {
            return Some(reason);
        }

        let has_sequential = ctx
            .sccdag
            .scc_ids()
            .any(|id| ctx.attrs.attrs(id).map_or(false, |a| a.requires_synchronization()));
        if !has_sequential {
            return Some(DisqualifyingReason::NoSequentialScc);
        }

        if ctx.config.force_parallelization {
            return None;
        }

        let weights = LoopWeights::from_context(ctx);
        if weights.biggest_scc_share() >= ctx.config.max_biggest_scc_coverage {
            return Some(DisqualifyingReason::UnbalancedPipeline);
        }

        if weights.instructions_per_iteration() < ctx.config.min_average_instructions
            && weights.sequential_fraction(ctx.attrs) < ctx.config.dswp_min_sequential_fraction
        {
            return Some(DisqualifyingReason::NotWorthPipelining);
        }

        None
    }
}
