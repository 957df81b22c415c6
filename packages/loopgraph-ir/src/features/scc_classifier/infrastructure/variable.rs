/*
 * Loop-Carried Variable Evolution
 *
 * A variable is a loop header PHI together with the values that update it
 * from one iteration to the next. Starting from the SCC that contains the
 * PHI, two narrower views are derived:
 * - the variable-only SCC: loop-carried dependences not consumed by the PHI
 *   are dropped, so unrelated cycles fall away
 * - the data/memory SCC: values producing control dependences are dropped
 *   too, leaving only the updates themselves
 *
 * The evolution is reducible across iterations when partial results of
 * different tasks can be combined afterwards: no internal value steers the
 * evolution, no update overrides the variable, every pair of updates is
 * commutative and associative, and nothing else in the loop reads an
 * intermediate value.
 */

use crate::features::dependence_graph::domain::EdgeKey;
use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::features::scc_dag::infrastructure::{Scc, SccDag};
use crate::shared::models::{BinaryOp, Function, LoopStructure, Opcode, Operand, ValueId};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Coarse kind of an update instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Binary(BinaryOp),
    Phi,
    Select,
    Call,
    /// `true` when every user of the comparison is a select
    Cmp { only_feeds_selects: bool },
    Store,
    Other,
}

/// One instruction that changes the value of a loop-carried variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableUpdate {
    instruction: ValueId,
    kind: UpdateKind,
    new_value: Operand,
    /// Operand indices whose value belongs to the variable's data/memory SCC
    internal_operands: Vec<usize>,
    /// Every other operand index (including constants)
    external_operands: Vec<usize>,
}

impl VariableUpdate {
    pub fn new(function: &Function, instruction: ValueId, data_memory_scc: &Scc) -> Option<Self> {
        let inst = function.instruction(instruction)?;
        let kind = match &inst.opcode {
            Opcode::Binary(op) => UpdateKind::Binary(*op),
            Opcode::Phi { .. } => UpdateKind::Phi,
            Opcode::Select => UpdateKind::Select,
            Opcode::Call { .. } | Opcode::Invoke { .. } => UpdateKind::Call,
            Opcode::Cmp(_) => UpdateKind::Cmp {
                only_feeds_selects: function.users(instruction).iter().all(|u| {
                    function
                        .instruction(*u)
                        .map_or(false, |i| matches!(i.opcode, Opcode::Select))
                }),
            },
            Opcode::Store => UpdateKind::Store,
            _ => UpdateKind::Other,
        };

        if kind == UpdateKind::Store {
            return Some(Self {
                instruction,
                kind,
                new_value: inst.operands.first().copied()?,
                internal_operands: Vec::new(),
                external_operands: Vec::new(),
            });
        }

        let (internal_operands, external_operands): (Vec<usize>, Vec<usize>) =
            (0..inst.operands.len()).partition(|idx| {
                inst.operands[*idx]
                    .as_value()
                    .map_or(false, |v| data_memory_scc.contains(v))
            });
        Some(Self {
            instruction,
            kind,
            new_value: Operand::Value(instruction),
            internal_operands,
            external_operands,
        })
    }

    pub fn instruction(&self) -> ValueId {
        self.instruction
    }

    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    pub fn new_value(&self) -> Operand {
        self.new_value
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        match self.kind {
            UpdateKind::Binary(op) => Some(op),
            _ => None,
        }
    }

    /// Whether the update can replace the variable instead of evolving it
    pub fn may_be_override(&self) -> bool {
        match self.kind {
            UpdateKind::Select | UpdateKind::Phi => !self.external_operands.is_empty(),
            UpdateKind::Call => true,
            UpdateKind::Binary(_) => self.internal_operands.is_empty(),
            UpdateKind::Cmp { only_feeds_selects } => !only_feeds_selects,
            UpdateKind::Store | UpdateKind::Other => true,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self.binary_op(), Some(BinaryOp::Add | BinaryOp::FAdd))
    }

    pub fn is_sub(&self) -> bool {
        self.binary_op().map_or(false, |op| op.is_sub())
    }

    pub fn is_mul(&self) -> bool {
        self.binary_op().map_or(false, |op| op.is_mul())
    }

    /// `x - e` with `e` outside the variable is `x + (-e)`
    pub fn is_sub_transformable_to_add(&self) -> bool {
        self.is_sub() && self.external_operands.contains(&1)
    }

    pub fn is_commutative_with_self(&self) -> bool {
        !self.may_be_override() && self.binary_op().map_or(false, |op| op.is_commutative())
    }

    pub fn is_transformably_commutative_with_self(&self) -> bool {
        if self.may_be_override() {
            return false;
        }
        self.binary_op().map_or(false, |op| op.is_commutative()) || self.is_sub_transformable_to_add()
    }

    pub fn is_associative_with_self(&self) -> bool {
        if self.may_be_override() {
            return false;
        }
        self.binary_op().map_or(false, |op| op.is_associative())
            || self.is_add()
            || self.is_mul()
            || self.is_sub_transformable_to_add()
    }

    pub fn is_transformably_commutative_with(&self, other: &VariableUpdate) -> bool {
        self.is_transformably_commutative_with_self()
            && other.is_transformably_commutative_with_self()
            && self.is_compatible_operation(other)
    }

    pub fn is_associative_with(&self, other: &VariableUpdate) -> bool {
        self.is_associative_with_self()
            && other.is_associative_with_self()
            && self.is_compatible_operation(other)
    }

    fn is_compatible_operation(&self, other: &VariableUpdate) -> bool {
        self.is_both_add_or_sub(other)
            || self.is_both_mul(other)
            || self.is_both_same_bitwise_logical_op(other)
    }

    fn is_both_add_or_sub(&self, other: &VariableUpdate) -> bool {
        (self.is_add() || self.is_sub()) && (other.is_add() || other.is_sub())
    }

    fn is_both_mul(&self, other: &VariableUpdate) -> bool {
        self.is_mul() && other.is_mul()
    }

    fn is_both_same_bitwise_logical_op(&self, other: &VariableUpdate) -> bool {
        match (self.binary_op(), other.binary_op()) {
            (Some(a), Some(b)) => a.is_bitwise_logic() && b.is_bitwise_logic() && a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopCarriedVariable {
    declaration: ValueId,
    initial_value: Operand,
    scc_of_variable_only: Scc,
    scc_of_data_and_memory_only: Scc,
    control_values: BTreeSet<ValueId>,
    updates: Vec<VariableUpdate>,
    loop_carried_updates: Vec<ValueId>,
    consumers_in_loop: BTreeSet<ValueId>,
}

impl LoopCarriedVariable {
    /// `None` when `declaration` is not a PHI of `scc` fed from the preheader
    pub fn new(
        function: &Function,
        lp: &LoopStructure,
        loop_dg: &DependenceGraph,
        scc: &Scc,
        declaration: ValueId,
    ) -> Option<Self> {
        let phi = function.instruction(declaration).filter(|i| i.is_phi())?;
        if !scc.contains(declaration) {
            return None;
        }
        let preheader = lp.preheader(function)?;
        let initial_value = phi.incoming_value_for(preheader)?;

        let mut loop_carried_values: FxHashSet<ValueId> = FxHashSet::default();
        let mut other_loop_carried: FxHashSet<EdgeKey> = FxHashSet::default();
        for (_, edge) in loop_dg.edges() {
            if !edge.loop_carried {
                continue;
            }
            if edge.dst == declaration {
                loop_carried_values.insert(edge.src);
            } else {
                other_loop_carried.insert(edge.key());
            }
        }

        let variable_dg =
            loop_dg.create_subgraph_from_values(scc.internal_values(), true, &other_loop_carried)?;
        let variable_sccdag = SccDag::new(&variable_dg);
        let scc_of_variable_only = variable_sccdag
            .scc(variable_sccdag.scc_of_value(declaration)?)?
            .clone();

        let data_memory_values: Vec<ValueId> = variable_dg
            .internal_values()
            .into_iter()
            .filter(|v| {
                !variable_dg
                    .outgoing_edges(*v)
                    .iter()
                    .any(|(_, e)| e.is_control())
            })
            .collect();
        let data_memory_dg =
            variable_dg.create_subgraph_from_values(&data_memory_values, true, &FxHashSet::default())?;
        let data_memory_sccdag = SccDag::new(&data_memory_dg);
        let scc_of_data_and_memory_only = data_memory_sccdag
            .scc(data_memory_sccdag.scc_of_value(declaration)?)?
            .clone();

        let mut control_values = BTreeSet::new();
        for value in scc_of_variable_only.graph().values() {
            if let Some(inst) = function.instruction(value) {
                if matches!(inst.opcode, Opcode::Select) {
                    if let Some(Operand::Value(cond)) = inst.operands.first() {
                        control_values.insert(*cond);
                    }
                    continue;
                }
            }
            let produces_control = scc_of_variable_only
                .graph()
                .outgoing_edges(value)
                .iter()
                .any(|(_, e)| e.is_control());
            if produces_control {
                control_values.insert(value);
            }
        }

        let mut updates = Vec::new();
        let mut loop_carried_updates = Vec::new();
        for value in scc_of_data_and_memory_only.internal_values() {
            if *value == declaration {
                continue;
            }
            let Some(inst) = function.instruction(*value) else {
                continue;
            };
            if matches!(inst.opcode, Opcode::Load | Opcode::Cast(_)) {
                continue;
            }
            if let Some(update) = VariableUpdate::new(function, *value, &scc_of_data_and_memory_only) {
                if loop_carried_values.contains(value) {
                    loop_carried_updates.push(*value);
                }
                updates.push(update);
            }
        }

        let mut consumers_in_loop = BTreeSet::new();
        let graph = scc_of_variable_only.graph();
        for external in graph.external_values() {
            if !function.is_instruction(external) || !lp.contains_instruction(function, external) {
                continue;
            }
            let fed_from_inside = graph
                .incoming_edges(external)
                .iter()
                .any(|(_, e)| scc_of_variable_only.contains(e.src));
            if fed_from_inside {
                consumers_in_loop.insert(external);
            }
        }

        Some(Self {
            declaration,
            initial_value,
            scc_of_variable_only,
            scc_of_data_and_memory_only,
            control_values,
            updates,
            loop_carried_updates,
            consumers_in_loop,
        })
    }

    pub fn declaration(&self) -> ValueId {
        self.declaration
    }

    pub fn initial_value(&self) -> Operand {
        self.initial_value
    }

    pub fn updates(&self) -> &[VariableUpdate] {
        &self.updates
    }

    /// Updates whose value reaches the declaration across the back edge
    pub fn loop_carried_updates(&self) -> &[ValueId] {
        &self.loop_carried_updates
    }

    pub fn control_values(&self) -> &BTreeSet<ValueId> {
        &self.control_values
    }

    pub fn scc_of_variable_only(&self) -> &Scc {
        &self.scc_of_variable_only
    }

    pub fn scc_of_data_and_memory_only(&self) -> &Scc {
        &self.scc_of_data_and_memory_only
    }

    /// Loop instructions outside the variable reading one of its values
    pub fn consumers_in_loop(&self) -> &BTreeSet<ValueId> {
        &self.consumers_in_loop
    }

    pub fn is_evolution_reducible_across_iterations(&self) -> bool {
        if self
            .control_values
            .iter()
            .any(|v| self.scc_of_variable_only.contains(*v))
        {
            return false;
        }
        if self.updates.iter().any(|u| u.may_be_override()) {
            return false;
        }

        let arithmetic: Vec<&VariableUpdate> = self
            .updates
            .iter()
            .filter(|u| !matches!(u.kind(), UpdateKind::Phi | UpdateKind::Select))
            .collect();
        // a value that is only propagated does not evolve
        if arithmetic.is_empty() {
            return false;
        }
        for update in &arithmetic {
            for other in &arithmetic {
                if !update.is_transformably_commutative_with(other) || !update.is_associative_with(other) {
                    return false;
                }
            }
        }

        self.consumers_in_loop.is_empty()
    }
}
