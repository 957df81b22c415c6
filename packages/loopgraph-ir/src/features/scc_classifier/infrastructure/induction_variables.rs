//! Induction variables of one loop
//!
//! Every header PHI whose evolution is an add-recurrence becomes an
//! [`InductionVariable`]: the PHI plus the in-SCC data chain that feeds its
//! back-edge values. The IV that controls the loop exit, if any, gets a
//! [`LoopGoverningIvAttribution`].

use super::invariance::LoopInvariance;
use crate::features::dependence_graph::domain::DependenceKind;
use crate::features::scc_classifier::domain::{
    InductionVariable, IvOperand, LoopGoverningIvAttribution, ScevShape, StepValue,
};
use crate::features::scc_classifier::ports::ScalarEvolution;
use crate::features::scc_dag::infrastructure::{Scc, SccDag};
use crate::shared::models::{Function, InstructionRole, LoopId, LoopStructure, Operand, ValueId};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct InductionVariableManager {
    loop_id: LoopId,
    induction_variables: Vec<InductionVariable>,
    governing: Option<LoopGoverningIvAttribution>,
}

impl InductionVariableManager {
    pub fn new(
        function: &Function,
        lp: &LoopStructure,
        sccdag: &SccDag,
        scev: &dyn ScalarEvolution,
        invariance: &LoopInvariance<'_>,
    ) -> Self {
        let header_phis: Vec<ValueId> = function
            .block(lp.header)
            .map(|b| {
                b.instructions
                    .iter()
                    .copied()
                    .filter(|v| function.instruction(*v).map_or(false, |i| i.is_phi()))
                    .collect()
            })
            .unwrap_or_default();

        let induction_variables: Vec<InductionVariable> = header_phis
            .into_iter()
            .filter(|phi| scev.shape(function, *phi) == ScevShape::AddRec)
            .filter_map(|phi| build_induction_variable(function, lp, sccdag, scev, invariance, phi))
            .collect();

        let governing = induction_variables
            .iter()
            .find_map(|iv| attribute_governing_iv(function, lp, sccdag, iv));

        debug!(
            function = function.name(),
            loop_id = %lp.id,
            ivs = induction_variables.len(),
            governed = governing.is_some(),
            "induction variables"
        );
        Self {
            loop_id: lp.id,
            induction_variables,
            governing,
        }
    }

    pub fn loop_id(&self) -> LoopId {
        self.loop_id
    }

    pub fn induction_variables(&self) -> &[InductionVariable] {
        &self.induction_variables
    }

    pub fn induction_variable_of(&self, header_phi: ValueId) -> Option<&InductionVariable> {
        self.induction_variables
            .iter()
            .find(|iv| iv.header_phi == header_phi)
    }

    pub fn loop_governing_iv_attribution(&self) -> Option<&LoopGoverningIvAttribution> {
        self.governing.as_ref()
    }

    pub fn governing_induction_variable(&self) -> Option<&InductionVariable> {
        self.governing.as_ref().map(|g| &g.induction_variable)
    }

    /// Whether `value` belongs to any induction variable
    pub fn is_induction_variable_instruction(&self, value: ValueId) -> bool {
        self.induction_variables.iter().any(|iv| iv.contains(value))
    }

    pub fn all_steps_loop_invariant(&self) -> bool {
        self.induction_variables
            .iter()
            .all(|iv| iv.step_is_loop_invariant)
    }
}

fn build_induction_variable(
    function: &Function,
    lp: &LoopStructure,
    sccdag: &SccDag,
    scev: &dyn ScalarEvolution,
    invariance: &LoopInvariance<'_>,
    phi: ValueId,
) -> Option<InductionVariable> {
    let scc_id = sccdag.scc_of_value(phi)?;
    let scc = sccdag.scc(scc_id)?;
    let step = scev.step_recurrence(function, phi);
    let inst = function.instruction(phi)?;
    let start_value = inst
        .incoming()
        .find(|(_, block)| !lp.contains_block(*block))
        .map(|(value, _)| value)?;

    let mut members: BTreeSet<ValueId> = BTreeSet::new();
    members.insert(phi);
    let mut worklist: Vec<ValueId> = inst
        .incoming()
        .filter(|(_, block)| lp.contains_block(*block))
        .filter_map(|(value, _)| value.as_value())
        .collect();
    while let Some(value) = worklist.pop() {
        if !scc.contains(value) || !members.insert(value) {
            continue;
        }
        for (_, edge) in scc.graph().incoming_edges(value) {
            if edge.kind == DependenceKind::Variable && scc.contains(edge.src) {
                worklist.push(edge.src);
            }
        }
    }
    let all_instructions: Vec<ValueId> = members.into_iter().collect();

    let phis: Vec<ValueId> = all_instructions
        .iter()
        .copied()
        .filter(|v| function.instruction(*v).map_or(false, |i| i.is_phi()))
        .collect();
    let accumulators: Vec<ValueId> = all_instructions
        .iter()
        .copied()
        .filter(|v| {
            function
                .instruction(*v)
                .map_or(false, |i| matches!(i.role(), InstructionRole::Accumulator(_)))
        })
        .collect();

    let step_is_loop_invariant = match step {
        None => false,
        Some(StepValue::Constant(_)) => true,
        Some(StepValue::Invariant(v)) => invariance.is_loop_invariant(v),
        Some(StepValue::Composite) => accumulators.iter().all(|acc| {
            function.instruction(*acc).map_or(false, |i| {
                i.operands
                    .iter()
                    .filter(|op| op.as_value().map_or(true, |v| !all_instructions.contains(&v)))
                    .all(|op| invariance.is_operand_invariant(*op))
            })
        }),
    };

    Some(InductionVariable {
        header_phi: phi,
        start_value,
        step,
        step_is_loop_invariant,
        phis,
        accumulators,
        all_instructions,
        scc: scc_id,
    })
}

fn attribute_governing_iv(
    function: &Function,
    lp: &LoopStructure,
    sccdag: &SccDag,
    iv: &InductionVariable,
) -> Option<LoopGoverningIvAttribution> {
    iv.step.and_then(|s| s.as_constant())?;
    let scc = sccdag.scc(iv.scc)?;

    let mut conditional_branches = scc
        .instructions(function)
        .filter(|i| i.is_conditional_branch());
    let branch = conditional_branches.next()?;
    if conditional_branches.next().is_some() {
        return None;
    }

    let cmp = branch
        .operands
        .first()
        .and_then(Operand::as_value)
        .and_then(|v| function.instruction(v))
        .filter(|i| i.is_cmp() && scc.contains(i.id))?;
    let predicate = cmp.cmp_predicate()?;
    let (lhs, rhs) = match cmp.operands.as_slice() {
        [l, r] => (*l, *r),
        _ => return None,
    };
    let in_iv = |o: Operand| o.as_value().map_or(false, |v| iv.contains(v));
    let (iv_operand, iv_value, condition_value) = match (in_iv(lhs), in_iv(rhs)) {
        (true, false) => (IvOperand::Lhs, lhs.as_value()?, rhs),
        (false, true) => (IvOperand::Rhs, rhs.as_value()?, lhs),
        _ => return None,
    };

    let exits: Vec<_> = branch
        .successors()
        .iter()
        .copied()
        .filter(|b| !lp.contains_block(*b))
        .collect();
    let exit_block = match exits.as_slice() {
        [single] => *single,
        _ => return None,
    };

    let condition_value_derivation = derivation_of(function, lp, condition_value);
    if condition_value_derivation.iter().any(|v| iv.contains(*v)) {
        return None;
    }

    if !only_governs_the_loop(function, scc, iv, cmp.id, branch.id) {
        debug!(iv = %iv.header_phi, "IV SCC holds unrelated instructions");
        return None;
    }

    Some(LoopGoverningIvAttribution {
        induction_variable: iv.clone(),
        header_cmp: cmp.id,
        predicate,
        header_branch: branch.id,
        iv_operand,
        iv_value,
        condition_value,
        exit_block,
        condition_value_derivation,
    })
}

/// In-loop instructions `operand` is computed from, itself included
fn derivation_of(function: &Function, lp: &LoopStructure, operand: Operand) -> Vec<ValueId> {
    let mut derivation: BTreeSet<ValueId> = BTreeSet::new();
    let mut worklist: Vec<ValueId> = operand.as_value().into_iter().collect();
    while let Some(value) = worklist.pop() {
        if !lp.contains_instruction(function, value) || !derivation.insert(value) {
            continue;
        }
        if let Some(inst) = function.instruction(value) {
            worklist.extend(inst.value_operands());
        }
    }
    derivation.into_iter().collect()
}

/// The SCC is the IV, its exit test and clonable bookkeeping only
fn only_governs_the_loop(
    function: &Function,
    scc: &Scc,
    iv: &InductionVariable,
    cmp: ValueId,
    branch: ValueId,
) -> bool {
    scc.internal_values().iter().all(|v| {
        if iv.contains(*v) || *v == cmp || *v == branch {
            return true;
        }
        function.instruction(*v).map_or(false, |i| {
            matches!(
                i.role(),
                InstructionRole::Gep | InstructionRole::Phi | InstructionRole::Cast
            )
        })
    })
}
