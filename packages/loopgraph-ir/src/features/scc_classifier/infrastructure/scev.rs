//! Structural scalar evolution
//!
//! Evolution shapes read off the IR alone. A loop header PHI is an
//! add-recurrence when every in-loop incoming value is the same
//! `phi + step` (or `phi - step`) with a loop-invariant step; the PHI and
//! that update are both `AddRec`. Other integer arithmetic maps to its
//! expression shape, everything else is `Unknown`.

use super::invariance::LoopInvariance;
use crate::features::scc_classifier::domain::{ScevShape, StepValue};
use crate::features::scc_classifier::ports::ScalarEvolution;
use crate::shared::models::{
    BinaryOp, CastKind, Function, Instruction, LoopForest, LoopStructure, Opcode, Operand, ValueId,
};
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct StructuralScalarEvolution {
    shapes: FxHashMap<ValueId, ScevShape>,
    steps: FxHashMap<ValueId, StepValue>,
}

impl StructuralScalarEvolution {
    pub fn analyze(function: &Function, forest: &LoopForest) -> Self {
        let mut steps = FxHashMap::default();
        let mut recurrences = FxHashMap::default();

        for lp in forest.loops() {
            let invariance = LoopInvariance::new(function, lp);
            let Some(header) = function.block(lp.header) else {
                continue;
            };
            for phi in header
                .instructions
                .iter()
                .filter_map(|id| function.instruction(*id))
                .filter(|i| i.is_phi())
            {
                if let Some((accumulator, step)) = add_recurrence(function, lp, &invariance, phi) {
                    steps.insert(phi.id, step);
                    recurrences.insert(phi.id, ScevShape::AddRec);
                    recurrences.insert(accumulator, ScevShape::AddRec);
                }
            }
        }

        let shapes = function
            .instructions()
            .map(|inst| {
                let shape = recurrences
                    .get(&inst.id)
                    .copied()
                    .unwrap_or_else(|| expression_shape(inst));
                (inst.id, shape)
            })
            .collect();

        debug!(
            function = function.name(),
            recurrences = steps.len(),
            "structural scalar evolution"
        );
        Self { shapes, steps }
    }

    pub fn num_recurrences(&self) -> usize {
        self.steps.len()
    }
}

impl ScalarEvolution for StructuralScalarEvolution {
    fn shape(&self, _function: &Function, value: ValueId) -> ScevShape {
        self.shapes.get(&value).copied().unwrap_or(ScevShape::Unknown)
    }

    fn step_recurrence(&self, _function: &Function, phi: ValueId) -> Option<StepValue> {
        self.steps.get(&phi).copied()
    }
}

/// `(update, step)` when `phi` is `phi = [start, outside] [update, latch...]`
/// with `update = phi ± invariant`
fn add_recurrence(
    function: &Function,
    lp: &LoopStructure,
    invariance: &LoopInvariance<'_>,
    phi: &Instruction,
) -> Option<(ValueId, StepValue)> {
    let mut from_outside = 0;
    let mut update: Option<ValueId> = None;
    for (value, block) in phi.incoming() {
        if !lp.contains_block(block) {
            from_outside += 1;
            continue;
        }
        let v = value.as_value()?;
        match update {
            None => update = Some(v),
            Some(u) if u == v => {}
            Some(_) => return None,
        }
    }
    if from_outside == 0 {
        return None;
    }

    let update = update?;
    let inst = function.instruction(update).filter(|i| lp.contains_block(i.block))?;
    let op = inst.binary_op()?;
    let (lhs, rhs) = match inst.operands.as_slice() {
        [lhs, rhs] => (*lhs, *rhs),
        _ => return None,
    };
    let phi_operand = Operand::Value(phi.id);
    let step_operand = match op {
        BinaryOp::Add if lhs == phi_operand => rhs,
        BinaryOp::Add if rhs == phi_operand => lhs,
        BinaryOp::Sub if lhs == phi_operand => rhs,
        _ => return None,
    };
    if step_operand == phi_operand || !invariance.is_operand_invariant(step_operand) {
        return None;
    }

    let negate = op == BinaryOp::Sub;
    let step = match step_operand {
        Operand::Constant(c) => {
            let c = c.as_int()?;
            StepValue::Constant(if negate { c.checked_neg()? } else { c })
        }
        Operand::Value(v) if negate || lp.contains_instruction(function, v) => StepValue::Composite,
        Operand::Value(v) => StepValue::Invariant(v),
    };
    Some((update, step))
}

fn expression_shape(inst: &Instruction) -> ScevShape {
    match &inst.opcode {
        Opcode::Binary(BinaryOp::Add | BinaryOp::Sub) | Opcode::Gep => ScevShape::Add,
        Opcode::Binary(BinaryOp::Mul) => ScevShape::Mul,
        Opcode::Binary(BinaryOp::UDiv) => ScevShape::UDiv,
        Opcode::Cast(CastKind::Trunc) => ScevShape::Truncate,
        Opcode::Cast(CastKind::ZExt) => ScevShape::ZeroExtend,
        Opcode::Cast(CastKind::SExt) => ScevShape::SignExtend,
        _ => ScevShape::Unknown,
    }
}
