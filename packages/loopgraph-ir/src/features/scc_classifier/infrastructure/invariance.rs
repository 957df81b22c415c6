//! Loop invariance
//!
//! An operand is invariant in a loop when it is a constant, an argument, an
//! instruction outside the loop, or a side-effect-free in-loop computation
//! over invariant operands. PHIs, memory accesses and terminators inside the
//! loop are never invariant.

use crate::shared::models::{Function, Instruction, LoopStructure, Opcode, Operand, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub struct LoopInvariance<'f> {
    function: &'f Function,
    lp: &'f LoopStructure,
    memo: FxHashMap<ValueId, bool>,
}

impl<'f> LoopInvariance<'f> {
    pub fn new(function: &'f Function, lp: &'f LoopStructure) -> Self {
        let mut invariance = Self {
            function,
            lp,
            memo: FxHashMap::default(),
        };
        for inst in lp.instructions(function) {
            invariance.evaluate(inst);
        }
        invariance
    }

    pub fn is_loop_invariant(&self, value: ValueId) -> bool {
        if !self.lp.contains_instruction(self.function, value) {
            return true;
        }
        self.memo.get(&value).copied().unwrap_or(false)
    }

    pub fn is_operand_invariant(&self, operand: Operand) -> bool {
        match operand {
            Operand::Constant(_) => true,
            Operand::Value(v) => self.is_loop_invariant(v),
        }
    }

    /// In-loop instructions proven invariant, in layout order
    pub fn invariant_instructions(&self) -> Vec<ValueId> {
        self.lp
            .instructions(self.function)
            .into_iter()
            .filter(|v| self.memo.get(v).copied().unwrap_or(false))
            .collect()
    }

    fn may_be_invariant(inst: &Instruction) -> bool {
        !(inst.is_phi() || inst.is_terminator() || inst.accesses_memory() || inst.has_side_effects())
            && !matches!(inst.opcode, Opcode::Alloca)
    }

    fn evaluate(&mut self, root: ValueId) -> bool {
        let mut in_progress: FxHashSet<ValueId> = FxHashSet::default();
        let mut worklist: Vec<(ValueId, bool)> = vec![(root, false)];

        while let Some((value, expanded)) = worklist.pop() {
            if self.memo.contains_key(&value) {
                continue;
            }
            let Some(inst) = self
                .function
                .instruction(value)
                .filter(|i| self.lp.contains_block(i.block))
            else {
                self.memo.insert(value, true);
                continue;
            };
            if !Self::may_be_invariant(inst) {
                self.memo.insert(value, false);
                continue;
            }

            if expanded {
                let invariant = inst.value_operands().all(|op| {
                    !self.lp.contains_instruction(self.function, op)
                        || self.memo.get(&op).copied().unwrap_or(false)
                });
                self.memo.insert(value, invariant);
                continue;
            }
            if !in_progress.insert(value) {
                // cycle without a PHI: unreachable code, leave it undecided
                continue;
            }
            worklist.push((value, true));
            for op in inst.value_operands() {
                if !self.memo.contains_key(&op) {
                    worklist.push((op, false));
                }
            }
        }

        self.memo.get(&root).copied().unwrap_or(false)
    }
}
