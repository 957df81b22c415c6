//! Intra-iteration reachability
//!
//! Backward dataflow over the instructions of a loop:
//! `OUT(i) = ⋃ (succ ∪ OUT(succ))` for every successor of `i` inside the
//! loop. The first instruction of the header is never a successor, so
//! nothing flows across the back edge.

use crate::shared::models::{Function, LoopStructure, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
pub struct IterationReachability {
    after: FxHashMap<ValueId, FxHashSet<ValueId>>,
}

impl IterationReachability {
    pub fn new(function: &Function, lp: &LoopStructure) -> Self {
        let instructions = lp.instructions(function);
        let header_first = function.first_instruction(lp.header);

        let successors: FxHashMap<ValueId, Vec<ValueId>> = instructions
            .iter()
            .map(|&inst| (inst, Self::successors(function, lp, inst, header_first)))
            .collect();

        let mut after: FxHashMap<ValueId, FxHashSet<ValueId>> = instructions
            .iter()
            .map(|inst| (*inst, FxHashSet::default()))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for inst in instructions.iter().rev() {
                let mut out: FxHashSet<ValueId> = FxHashSet::default();
                for succ in successors.get(inst).map_or(&[][..], |s| s.as_slice()) {
                    out.insert(*succ);
                    if let Some(succ_out) = after.get(succ) {
                        out.extend(succ_out.iter().copied());
                    }
                }
                let current = after.entry(*inst).or_default();
                if out.len() != current.len() {
                    *current = out;
                    changed = true;
                }
            }
        }
        Self { after }
    }

    fn successors(
        function: &Function,
        lp: &LoopStructure,
        inst: ValueId,
        header_first: Option<ValueId>,
    ) -> Vec<ValueId> {
        let Some(instruction) = function.instruction(inst) else {
            return Vec::new();
        };
        if !instruction.is_terminator() {
            let next = function
                .position(inst)
                .and_then(|pos| function.block(instruction.block)?.instructions.get(pos + 1).copied());
            return next.into_iter().collect();
        }
        function
            .successors(instruction.block)
            .iter()
            .filter(|b| lp.contains_block(**b))
            .filter_map(|b| function.first_instruction(*b))
            .filter(|first| Some(*first) != header_first)
            .collect()
    }

    /// Whether `dst` can run after `src` in the same iteration
    pub fn can_reach(&self, src: ValueId, dst: ValueId) -> bool {
        self.after.get(&src).map_or(false, |out| out.contains(&dst))
    }

    pub fn reachable_from(&self, src: ValueId) -> impl Iterator<Item = ValueId> + '_ {
        self.after.get(&src).into_iter().flat_map(|out| out.iter().copied())
    }
}
