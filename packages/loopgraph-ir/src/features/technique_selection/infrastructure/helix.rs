//! HELIX legality and sequential segments
//!
//! Iterations are spread across cores. Every SCC that must observe
//! iteration order becomes a sequential segment: a core waits at the
//! segment entries for the previous iteration's signal and signals at the
//! exits. Entries and exits live in the loop itself; instructions of a
//! sub-loop are represented by the sub-loop's boundary.

use super::context::SelectionContext;
use super::dswp::{base_violation, partition_stages};
use super::reachability::IterationReachability;
use super::weights::LoopWeights;
use crate::features::partition::domain::SubsetId;
use crate::features::scc_dag::domain::SccId;
use crate::features::technique_selection::domain::{
    DisqualifyingReason, HelixPlan, Legality, SequentialSegment,
};
use crate::shared::models::{BlockId, LoopStructure, ValueId};
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct HelixSelector;

impl HelixSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn legality(&self, ctx: &SelectionContext<'_>) -> Legality {
        let segments = self.sequential_segments(ctx);
        match self.first_violation(ctx, &segments) {
            Some(reason) => Legality::Illegal(reason),
            None => Legality::Legal,
        }
    }

    pub fn plan(&self, ctx: &SelectionContext<'_>) -> Option<HelixPlan> {
        let segments = self.sequential_segments(ctx);
        if self.first_violation(ctx, &segments).is_some() {
            return None;
        }
        Some(HelixPlan {
            cores: ctx.config.max_cores,
            stages: partition_stages(ctx),
            segments,
        })
    }

    /// One segment per depth-ordered subset holding an SCC that needs
    /// synchronization
    pub fn sequential_segments(&self, ctx: &SelectionContext<'_>) -> Vec<SequentialSegment> {
        let builder = SegmentBuilder::new(ctx);
        let iv_governed = ctx
            .induction_variables
            .loop_governing_iv_attribution()
            .is_some();

        let mut segments = Vec::new();
        for subset in ctx.partition.depth_ordered_subsets() {
            let Some(members) = ctx.partition.subset(subset) else {
                continue;
            };
            let sccs: Vec<SccId> = members
                .sccs
                .iter()
                .copied()
                .filter(|id| {
                    ctx.attrs
                        .attrs(*id)
                        .map_or(false, |a| a.requires_synchronization())
                })
                .filter(|id| !iv_governed || !ctx.attrs.loop_carried_dependences(*id).is_empty())
                .collect();
            if sccs.is_empty() {
                continue;
            }
            if let Some(segment) = builder.build(segments.len(), subset, sccs) {
                segments.push(segment);
            }
        }
        segments
    }

    fn first_violation(
        &self,
        ctx: &SelectionContext<'_>,
        segments: &[SequentialSegment],
    ) -> Option<DisqualifyingReason> {
        if let Some(reason) = base_violation(ctx) {
            return Some(reason);
        }

        if let Some(segment) = segments.iter().find(|s| !s.has_consistent_frontier()) {
            return Some(DisqualifyingReason::InconsistentSegmentFrontier {
                segment: segment.id,
            });
        }

        if ctx.config.force_parallelization {
            return None;
        }

        let weights = LoopWeights::from_context(ctx);
        let sequential: u64 = segments
            .iter()
            .flat_map(|s| s.instructions.iter())
            .map(|v| weights.instruction_weight(*v))
            .sum();
        if weights.instructions_per_iteration() < ctx.config.min_average_instructions
            && weights.fraction(sequential) >= ctx.config.helix_max_sequential_fraction
        {
            return Some(DisqualifyingReason::TooSynchronized);
        }

        None
    }
}

struct SegmentBuilder<'c, 'a> {
    ctx: &'c SelectionContext<'a>,
    reachability: IterationReachability,
    layout: FxHashMap<ValueId, usize>,
}

impl<'c, 'a> SegmentBuilder<'c, 'a> {
    fn new(ctx: &'c SelectionContext<'a>) -> Self {
        let layout = ctx
            .lp
            .instructions(ctx.function)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();
        Self {
            ctx,
            reachability: IterationReachability::new(ctx.function, ctx.lp),
            layout,
        }
    }

    fn build(&self, id: usize, subset: SubsetId, sccs: Vec<SccId>) -> Option<SequentialSegment> {
        let mut instructions: Vec<ValueId> = sccs
            .iter()
            .filter_map(|scc| self.ctx.sccdag.scc(*scc))
            .flat_map(|scc| scc.internal_values().iter().copied())
            .filter(|v| {
                self.ctx
                    .function
                    .instruction(*v)
                    .map_or(false, |inst| !inst.is_phi())
            })
            .collect();
        self.sort_by_layout(&mut instructions);
        if instructions.is_empty() {
            debug!(segment = id, %subset, "segment of PHIs only, nothing to synchronize");
            return None;
        }

        let mut entry_anchors: Vec<ValueId> = instructions
            .iter()
            .flat_map(|v| self.entry_anchors(*v))
            .collect();
        self.sort_by_layout(&mut entry_anchors);
        let mut exit_anchors: Vec<ValueId> = instructions
            .iter()
            .flat_map(|v| self.exit_anchors(*v))
            .collect();
        self.sort_by_layout(&mut exit_anchors);

        let mut entries = self.entries(&entry_anchors);
        let mut exits = self.exits(&exit_anchors);
        self.extend_through_unrelated_blocks(&entry_anchors, &exit_anchors, &mut entries, &mut exits);
        self.add_function_exits(&mut exits);

        let mut entries: Vec<ValueId> = entries.into_iter().map(|v| self.skip_phis(v)).collect();
        let mut exits: Vec<ValueId> = exits.into_iter().map(|v| self.skip_phis(v)).collect();
        self.sort_by_layout(&mut entries);
        self.sort_by_layout(&mut exits);

        debug!(
            segment = id,
            %subset,
            instructions = instructions.len(),
            entries = entries.len(),
            exits = exits.len(),
            "sequential segment"
        );
        Some(SequentialSegment {
            id,
            subset,
            sccs,
            instructions,
            entries,
            exits,
        })
    }

    fn precedes(&self, src: ValueId, dst: ValueId) -> bool {
        src != dst && self.reachability.can_reach(src, dst)
    }

    /// Anchors nobody else precedes, minus those an earlier entry dominates
    fn entries(&self, anchors: &[ValueId]) -> Vec<ValueId> {
        let mut accepted: Vec<ValueId> = Vec::new();
        for &candidate in anchors {
            if anchors
                .iter()
                .any(|other| *other != candidate && self.precedes(*other, candidate))
            {
                continue;
            }
            if accepted.iter().any(|entry| {
                self.ctx
                    .doms
                    .instruction_dominates(self.ctx.function, *entry, candidate)
            }) {
                continue;
            }
            accepted.push(candidate);
        }
        accepted
    }

    /// Anchors nobody else follows, minus those an earlier exit can precede
    fn exits(&self, anchors: &[ValueId]) -> Vec<ValueId> {
        let mut accepted: Vec<ValueId> = Vec::new();
        for &candidate in anchors {
            if anchors
                .iter()
                .any(|other| *other != candidate && self.precedes(candidate, *other))
            {
                continue;
            }
            if accepted.iter().any(|exit| self.precedes(*exit, candidate)) {
                continue;
            }
            accepted.push(candidate);
        }
        accepted
    }

    /// Paths through blocks the segment can neither reach nor be reached
    /// from still have to wait and signal once per iteration
    fn extend_through_unrelated_blocks(
        &self,
        entry_anchors: &[ValueId],
        exit_anchors: &[ValueId],
        entries: &mut Vec<ValueId>,
        exits: &mut Vec<ValueId>,
    ) {
        let function = self.ctx.function;
        let anchors: Vec<ValueId> = entry_anchors
            .iter()
            .chain(exit_anchors.iter())
            .copied()
            .collect();

        for block in self.ctx.lp.ordered_blocks(function) {
            if self.in_subloop(block) {
                continue;
            }
            let Some(first) = function.first_non_phi(block) else {
                continue;
            };
            let related = anchors.iter().any(|s| {
                function.block_of(*s) == Some(block)
                    || self.precedes(*s, first)
                    || self.precedes(first, *s)
            });
            if related {
                continue;
            }
            if !entries.contains(&first) {
                entries.push(first);
            }
            if !exits.contains(&first) {
                exits.push(first);
            }
        }
    }

    fn add_function_exits(&self, exits: &mut Vec<ValueId>) {
        let function = self.ctx.function;
        for block in self.ctx.lp.ordered_blocks(function) {
            if !function.is_function_exit(block) {
                continue;
            }
            if let Some(terminator) = function.terminator(block) {
                if !exits.contains(&terminator.id) {
                    exits.push(terminator.id);
                }
            }
        }
    }

    fn entry_anchors(&self, inst: ValueId) -> Vec<ValueId> {
        let function = self.ctx.function;
        match self.outermost_subloop(inst) {
            None => vec![inst],
            Some(sub) => function
                .predecessors(sub.header)
                .iter()
                .filter(|b| !sub.contains_block(**b) && self.ctx.lp.contains_block(**b))
                .filter_map(|b| function.terminator(*b))
                .map(|t| t.id)
                .collect(),
        }
    }

    fn exit_anchors(&self, inst: ValueId) -> Vec<ValueId> {
        let function = self.ctx.function;
        match self.outermost_subloop(inst) {
            None => vec![inst],
            Some(sub) => sub
                .exit_blocks(function)
                .into_iter()
                .filter(|b| self.ctx.lp.contains_block(*b))
                .filter_map(|b| function.first_non_phi(b))
                .collect(),
        }
    }

    /// Child of the analyzed loop that contains `inst`, if any
    fn outermost_subloop(&self, inst: ValueId) -> Option<&'a LoopStructure> {
        let forest = self.ctx.forest;
        let mut current = forest.innermost_loop_of(self.ctx.function, inst)?;
        loop {
            if current == self.ctx.lp.id {
                return None;
            }
            let lp = forest.get(current)?;
            if lp.parent == Some(self.ctx.lp.id) {
                return Some(lp);
            }
            current = lp.parent?;
        }
    }

    fn in_subloop(&self, block: BlockId) -> bool {
        self.ctx
            .forest
            .innermost_loop_of_block(block)
            .map_or(false, |id| id != self.ctx.lp.id)
    }

    fn skip_phis(&self, inst: ValueId) -> ValueId {
        let function = self.ctx.function;
        match function.instruction(inst) {
            Some(i) if i.is_phi() => function.first_non_phi(i.block).unwrap_or(inst),
            _ => inst,
        }
    }

    fn sort_by_layout(&self, values: &mut Vec<ValueId>) {
        values.sort_by_key(|v| (self.layout.get(v).copied().unwrap_or(usize::MAX), *v));
        values.dedup();
    }
}
