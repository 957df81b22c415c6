//! SCC classification domain types

use crate::features::scc_dag::domain::SccId;
use crate::shared::models::{BlockId, CmpPredicate, Operand, ValueId};
use serde::{Deserialize, Serialize};

/// Parallel-execution semantics of an SCC (exactly one per SCC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SccType {
    /// No dependence cycle: iterations can run in any order
    Independent,
    /// Reduction whose per-task partials combine in any order
    Commutative,
    /// Must run in iteration order
    Sequential,
}

impl SccType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SccType::Independent => "independent",
            SccType::Commutative => "commutative",
            SccType::Sequential => "sequential",
        }
    }
}

/// Bounds of a `for (i = start; i <cmp> cmp_to; i += ±1)` induction variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleIvInfo {
    pub phi: ValueId,
    pub accumulator: ValueId,
    pub cmp: ValueId,
    pub branch: ValueId,
    pub start: Operand,
    pub step: i64,
    pub cmp_to: Operand,
    /// The comparison reads the updated value rather than the PHI
    pub is_cmp_on_accum: bool,
    pub is_cmp_iv_lhs: bool,
    /// Correction from `cmp_to` to the first value the IV never takes
    pub end_offset: i64,
}

/// Derived per-SCC attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SccAttrs {
    pub scc_type: SccType,
    pub is_clonable: bool,
    pub is_induction_variable: bool,
    pub is_simple_iv: bool,
    /// Commutative, or sequential with an evolution that tasks can reduce
    pub is_reducible: bool,
    pub phis: Vec<ValueId>,
    pub accumulators: Vec<ValueId>,
    pub simple_iv_info: Option<SimpleIvInfo>,
}

impl SccAttrs {
    pub(crate) fn new() -> Self {
        Self {
            scc_type: SccType::Sequential,
            is_clonable: false,
            is_induction_variable: false,
            is_simple_iv: false,
            is_reducible: false,
            phis: Vec::new(),
            accumulators: Vec::new(),
            simple_iv_info: None,
        }
    }

    pub fn single_phi(&self) -> Option<ValueId> {
        match self.phis.as_slice() {
            [phi] => Some(*phi),
            _ => None,
        }
    }

    pub fn single_accumulator(&self) -> Option<ValueId> {
        match self.accumulators.as_slice() {
            [acc] => Some(*acc),
            _ => None,
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.scc_type == SccType::Sequential
    }

    /// Sequential and not removable by cloning
    pub fn requires_synchronization(&self) -> bool {
        self.is_sequential() && !self.is_clonable
    }
}

/// Shape of a scalar evolution expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScevShape {
    Constant,
    Truncate,
    ZeroExtend,
    SignExtend,
    SMax,
    UMax,
    UDiv,
    Add,
    Mul,
    AddRec,
    Unknown,
    CouldNotCompute,
}

impl ScevShape {
    /// Shapes an induction-variable SCC may contain
    pub fn is_analyzable(&self) -> bool {
        !matches!(self, ScevShape::Unknown | ScevShape::CouldNotCompute)
    }
}

/// Per-iteration increment of an induction variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepValue {
    Constant(i64),
    Invariant(ValueId),
    /// Computed inside the loop from invariant values
    Composite,
}

impl StepValue {
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            StepValue::Constant(c) => Some(*c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductionVariable {
    pub header_phi: ValueId,
    pub start_value: Operand,
    /// `None` when no step can be derived
    pub step: Option<StepValue>,
    pub step_is_loop_invariant: bool,
    pub phis: Vec<ValueId>,
    pub accumulators: Vec<ValueId>,
    pub all_instructions: Vec<ValueId>,
    pub scc: SccId,
}

impl InductionVariable {
    pub fn contains(&self, value: ValueId) -> bool {
        self.all_instructions.contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IvOperand {
    Lhs,
    Rhs,
}

/// An induction variable bound to the compare/branch that exits the loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopGoverningIvAttribution {
    pub induction_variable: InductionVariable,
    pub header_cmp: ValueId,
    pub predicate: CmpPredicate,
    pub header_branch: ValueId,
    pub iv_operand: IvOperand,
    /// Intermediate IV value compared against the condition value
    pub iv_value: ValueId,
    pub condition_value: Operand,
    pub exit_block: BlockId,
    /// Loop instructions the condition value is computed from
    pub condition_value_derivation: Vec<ValueId>,
}

impl LoopGoverningIvAttribution {
    pub fn step(&self) -> Option<StepValue> {
        self.induction_variable.step
    }

    pub fn start_value(&self) -> Operand {
        self.induction_variable.start_value
    }
}
