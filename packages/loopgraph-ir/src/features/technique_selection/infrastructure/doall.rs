//! DOALL legality
//!
//! Iterations run independently in chunks. The checks run in order and the
//! first failure disqualifies the loop.

use super::context::SelectionContext;
use crate::features::scc_dag::domain::SccId;
use crate::features::technique_selection::domain::{DisqualifyingReason, DoallPlan, Legality};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct DoallSelector;

impl DoallSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn legality(&self, ctx: &SelectionContext<'_>) -> Legality {
        match self.first_violation(ctx) {
            Some(reason) => Legality::Illegal(reason),
            None => Legality::Legal,
        }
    }

    /// Parameters of a legal DOALL loop, `None` otherwise
    pub fn plan(&self, ctx: &SelectionContext<'_>) -> Option<DoallPlan> {
        if !self.legality(ctx).is_legal() {
            return None;
        }
        let governing_iv = ctx.induction_variables.loop_governing_iv_attribution()?.clone();
        Some(DoallPlan {
            cores: ctx.config.max_cores,
            chunk_size: ctx.config.doall_chunk_size,
            governing_iv,
        })
    }

    fn first_violation(&self, ctx: &SelectionContext<'_>) -> Option<DisqualifyingReason> {
        if ctx.effective_exit_blocks().len() != 1 {
            return Some(DisqualifyingReason::MoreThanOneExitBlock);
        }

        if let Some(value) = ctx
            .attrs
            .first_non_reducible_live_out(ctx.environment, ctx.sccdag)
        {
            return Some(DisqualifyingReason::LiveOutNotReducible { value });
        }

        for scc in ctx.attrs.get_sccs_with_loop_carried_data_dependencies() {
            if self.is_blocking(ctx, scc) {
                return Some(DisqualifyingReason::BlockingScc { scc });
            }
        }

        let Some(governing) = ctx.induction_variables.loop_governing_iv_attribution() else {
            return Some(DisqualifyingReason::NoGoverningInductionVariable);
        };

        if !ctx.induction_variables.all_steps_loop_invariant() {
            return Some(DisqualifyingReason::NonInvariantInductionStep);
        }

        let condition_invariant = ctx.invariance.is_operand_invariant(governing.condition_value)
            && governing
                .condition_value_derivation
                .iter()
                .all(|v| ctx.invariance.is_loop_invariant(*v));
        if !condition_invariant {
            return Some(DisqualifyingReason::ExitConditionNotInvariant);
        }

        None
    }

    fn is_blocking(&self, ctx: &SelectionContext<'_>, scc: SccId) -> bool {
        if ctx.attrs.is_reducible(scc)
            || ctx.attrs.is_clonable(scc)
            || ctx.attrs.is_scc_contained_in_subloop(scc)
        {
            return false;
        }

        let carried: Vec<_> = ctx
            .attrs
            .loop_carried_dependences(scc)
            .iter()
            .filter(|e| !e.is_control())
            .collect();
        let attested = !carried.is_empty()
            && carried.iter().all(|e| {
                e.is_memory()
                    && ctx
                        .iteration_domain
                        .disjoint_across_iterations(ctx.function, ctx.lp, e.src, e.dst)
            });
        if attested {
            debug!(%scc, edges = carried.len(), "loop-carried memory attested disjoint");
        }
        !attested
    }
}
