/*
 * SCCDAG Attributes
 *
 * Classifies every SCC of a loop SCCDAG in a single pass:
 * 1. collect the PHIs and the accumulators (fails closed on anything else)
 * 2. induction variable check (scalar evolution shapes), then simple IV
 * 3. clonable check
 * 4. independent (acyclic under the control-edge policy)
 * 5. commutative (reduction) when not independent
 * 6. sequential otherwise (reducible when the header PHI evolves by
 *    commutative updates only)
 *
 * Loop-carried dependences of the condensed graph are attributed to both the
 * producer and the consumer SCC.
 */

use crate::config::{ClassifierConfig, ControlEdgePolicy};
use crate::features::dependence_graph::domain::DependenceEdge;
use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::features::scc_classifier::domain::{SccAttrs, SccType, SimpleIvInfo};
use crate::features::scc_classifier::infrastructure::environment::LoopEnvironment;
use crate::features::scc_classifier::infrastructure::variable::LoopCarriedVariable;
use crate::features::scc_classifier::ports::ScalarEvolution;
use crate::features::scc_dag::domain::SccId;
use crate::features::scc_dag::infrastructure::{Scc, SccDag};
use crate::shared::models::{
    CmpPredicate, Function, Instruction, InstructionRole, LoopForest, LoopId, LoopStructure,
    Opcode, Operand, ValueId,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Everything the classifier reads
pub struct ClassifierInput<'a> {
    pub function: &'a Function,
    pub forest: &'a LoopForest,
    pub lp: &'a LoopStructure,
    /// Loop graph with loop-carried flags and external values linked
    pub loop_dg: &'a DependenceGraph,
    pub scev: &'a dyn ScalarEvolution,
    pub config: &'a ClassifierConfig,
}

#[derive(Debug, Clone)]
pub struct SccDagAttrs {
    loop_id: LoopId,
    attrs: Vec<SccAttrs>,
    loop_carried: Vec<Vec<DependenceEdge>>,
    in_subloop: Vec<bool>,
    reducible_evolution: Vec<bool>,
    top_level: Vec<SccId>,
}

impl SccDagAttrs {
    pub fn new(input: &ClassifierInput<'_>, sccdag: &SccDag) -> Self {
        let n = sccdag.num_sccs();
        let mut loop_carried: Vec<Vec<DependenceEdge>> = vec![Vec::new(); n];
        for (_, edge) in sccdag.source().edges() {
            if !edge.loop_carried {
                continue;
            }
            let (Some(producer), Some(consumer)) =
                (sccdag.scc_of_value(edge.src), sccdag.scc_of_value(edge.dst))
            else {
                continue;
            };
            loop_carried[producer.index()].push(edge.clone());
            if consumer != producer {
                loop_carried[consumer.index()].push(edge.clone());
            }
        }

        let mut attrs = Vec::with_capacity(n);
        let mut in_subloop = Vec::with_capacity(n);
        let mut reducible_evolution = Vec::with_capacity(n);
        for (id, scc) in sccdag.sccs() {
            let mut scc_attrs = classify_scc(input, sccdag, id, scc);
            let reducible = has_reducible_evolution(input, scc, &scc_attrs);
            if reducible && scc_attrs.scc_type == SccType::Sequential {
                scc_attrs.is_reducible = true;
            }
            debug!(
                scc = %id,
                members = scc.num_internal_nodes(),
                kind = scc_attrs.scc_type.as_str(),
                clonable = scc_attrs.is_clonable,
                reducible = scc_attrs.is_reducible,
                iv = scc_attrs.is_induction_variable,
                "SCC classified"
            );
            reducible_evolution.push(reducible);
            in_subloop.push(is_contained_in_subloop(input, scc));
            attrs.push(scc_attrs);
        }

        Self {
            loop_id: input.lp.id,
            attrs,
            loop_carried,
            in_subloop,
            reducible_evolution,
            top_level: sccdag.top_level_sccs(),
        }
    }

    pub fn loop_id(&self) -> LoopId {
        self.loop_id
    }

    pub fn num_sccs(&self) -> usize {
        self.attrs.len()
    }

    pub fn attrs(&self, id: SccId) -> Option<&SccAttrs> {
        self.attrs.get(id.index())
    }

    pub fn scc_type(&self, id: SccId) -> Option<SccType> {
        self.attrs(id).map(|a| a.scc_type)
    }

    pub fn is_clonable(&self, id: SccId) -> bool {
        self.attrs(id).map_or(false, |a| a.is_clonable)
    }

    pub fn is_induction_variable_scc(&self, id: SccId) -> bool {
        self.attrs(id).map_or(false, |a| a.is_induction_variable)
    }

    pub fn is_commutative(&self, id: SccId) -> bool {
        self.scc_type(id) == Some(SccType::Commutative)
    }

    /// Commutative, or sequential with an evolution that tasks can reduce
    pub fn is_reducible(&self, id: SccId) -> bool {
        self.attrs(id).map_or(false, |a| a.is_reducible)
    }

    /// Loop-carried dependences produced or consumed by `id`
    pub fn loop_carried_dependences(&self, id: SccId) -> &[DependenceEdge] {
        self.loop_carried.get(id.index()).map_or(&[], |v| v.as_slice())
    }

    /// Non-independent SCCs together with every SCC carrying a loop-carried
    /// data (register or memory) dependence
    pub fn get_sccs_with_loop_carried_data_dependencies(&self) -> BTreeSet<SccId> {
        (0..self.attrs.len())
            .map(|i| SccId(i as u32))
            .filter(|id| {
                self.scc_type(*id) != Some(SccType::Independent)
                    || self
                        .loop_carried_dependences(*id)
                        .iter()
                        .any(|e| !e.is_control())
            })
            .collect()
    }

    /// A single top-level SCC (independent ones looked through) that is an
    /// induction variable
    pub fn loop_has_induction_variable(&self, sccdag: &SccDag) -> bool {
        let mut roots: BTreeSet<SccId> = BTreeSet::new();
        let mut worklist: Vec<SccId> = self.top_level.clone();
        let mut visited: BTreeSet<SccId> = BTreeSet::new();
        while let Some(id) = worklist.pop() {
            if !visited.insert(id) {
                continue;
            }
            if self.scc_type(id) == Some(SccType::Independent) && !self.is_induction_variable_scc(id) {
                worklist.extend(sccdag.dependents(id));
                continue;
            }
            roots.insert(id);
        }
        match roots.iter().collect::<Vec<_>>().as_slice() {
            [single] => self.is_induction_variable_scc(**single),
            _ => false,
        }
    }

    /// Every member lives in a loop nested inside the analyzed one
    pub fn is_scc_contained_in_subloop(&self, id: SccId) -> bool {
        self.in_subloop.get(id.index()).copied().unwrap_or(false)
    }

    /// The SCC's header PHI evolves by commutative, associative updates only
    pub fn has_reducible_evolution(&self, id: SccId) -> bool {
        self.reducible_evolution.get(id.index()).copied().unwrap_or(false)
    }

    pub fn clonable_sccs(&self) -> Vec<SccId> {
        (0..self.attrs.len())
            .map(|i| SccId(i as u32))
            .filter(|id| self.is_clonable(*id))
            .collect()
    }

    /// First live-out whose producer is loop-carried and cannot be reduced.
    ///
    /// Producers in independent SCCs carry nothing across iterations;
    /// induction variables are recomputed from the last iteration.
    pub fn first_non_reducible_live_out(&self, env: &LoopEnvironment, sccdag: &SccDag) -> Option<ValueId> {
        env.live_outs().iter().copied().find(|producer| {
            !sccdag.scc_of_value(*producer).map_or(false, |id| {
                self.scc_type(id) == Some(SccType::Independent)
                    || self.is_reducible(id)
                    || self.is_induction_variable_scc(id)
            })
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Per-SCC state machine
// ═══════════════════════════════════════════════════════════════════════════

fn classify_scc(input: &ClassifierInput<'_>, sccdag: &SccDag, id: SccId, scc: &Scc) -> SccAttrs {
    let function = input.function;
    let mut attrs = SccAttrs::new();

    if let Some((phis, accumulators)) = collect_phis_and_accumulators(function, scc) {
        attrs.phis = phis;
        attrs.accumulators = accumulators;
    }

    attrs.is_induction_variable = check_if_induction_variable_scc(input, scc, &attrs);
    if attrs.is_induction_variable {
        if let Some(info) = check_if_simple_iv(input, scc, &attrs) {
            attrs.is_simple_iv = true;
            attrs.simple_iv_info = Some(info);
        }
    }

    let has_dependents = !sccdag.outgoing_edges(id).is_empty();
    attrs.is_clonable = check_if_clonable(function, scc, &attrs, has_dependents);

    if check_if_independent(scc, input.config.independence_control_policy) {
        attrs.scc_type = SccType::Independent;
    } else if check_if_commutative(function, scc, &attrs) {
        attrs.scc_type = SccType::Commutative;
        attrs.is_reducible = true;
    } else {
        attrs.scc_type = SccType::Sequential;
    }
    attrs
}

/// `None` when the SCC holds an instruction that is neither bookkeeping nor
/// an accumulation
fn collect_phis_and_accumulators(function: &Function, scc: &Scc) -> Option<(Vec<ValueId>, Vec<ValueId>)> {
    let mut phis = Vec::new();
    let mut accumulators = Vec::new();
    for value in scc.internal_values() {
        let inst = function.instruction(*value)?;
        match inst.role() {
            InstructionRole::Comparison
            | InstructionRole::Terminator
            | InstructionRole::Gep
            | InstructionRole::Cast => continue,
            InstructionRole::Phi => phis.push(*value),
            InstructionRole::Accumulator(_) => accumulators.push(*value),
            InstructionRole::Call | InstructionRole::Memory | InstructionRole::Other => return None,
        }
    }
    Some((phis, accumulators))
}

fn check_if_induction_variable_scc(input: &ClassifierInput<'_>, scc: &Scc, attrs: &SccAttrs) -> bool {
    if attrs.phis.is_empty() {
        return false;
    }
    scc.internal_values().iter().all(|value| {
        if input.scev.shape(input.function, *value).is_analyzable() {
            return true;
        }
        input
            .function
            .instruction(*value)
            .map_or(false, |i| i.is_cmp() || i.is_terminator())
    })
}

fn check_if_simple_iv(input: &ClassifierInput<'_>, scc: &Scc, attrs: &SccAttrs) -> Option<SimpleIvInfo> {
    let function = input.function;
    let phi_id = attrs.single_phi()?;
    let accumulator_id = attrs.single_accumulator()?;
    let phi = function.instruction(phi_id)?;
    let accumulator = function.instruction(accumulator_id)?;
    if phi.operands.len() != 2 {
        return None;
    }

    let mut cmp: Option<&Instruction> = None;
    let mut branch: Option<&Instruction> = None;
    for inst in scc.instructions(function) {
        if inst.is_cmp() {
            if cmp.is_some() {
                return None;
            }
            cmp = Some(inst);
        } else if matches!(inst.opcode, Opcode::Branch { .. }) {
            if !inst.is_conditional_branch() {
                continue;
            }
            if branch.is_some() {
                return None;
            }
            branch = Some(inst);
        }
    }
    let (cmp, branch) = (cmp?, branch?);

    let accumulator_operand = Operand::Value(accumulator_id);
    let phi_operand = Operand::Value(phi_id);
    let start = if phi.operands[0] == accumulator_operand {
        phi.operands[1]
    } else {
        phi.operands[0]
    };

    let step_operand = match accumulator.operands.as_slice() {
        [a, b] if *a == phi_operand => *b,
        [a, _] => *a,
        _ => return None,
    };
    let step = step_operand.as_int()?;
    if step != 1 && step != -1 {
        return None;
    }

    let (lhs, rhs) = match cmp.operands.as_slice() {
        [l, r] => (*l, *r),
        _ => return None,
    };
    let is_cmp_iv_lhs = lhs == phi_operand || lhs == accumulator_operand;
    let (cmp_to, iv_side) = if is_cmp_iv_lhs { (rhs, lhs) } else { (lhs, rhs) };
    let is_cmp_on_accum = iv_side == accumulator_operand;

    let end_offset = check_simple_iv_end_value(input, cmp, branch, step, is_cmp_iv_lhs, is_cmp_on_accum)?;

    Some(SimpleIvInfo {
        phi: phi_id,
        accumulator: accumulator_id,
        cmp: cmp.id,
        branch: branch.id,
        start,
        step,
        cmp_to,
        is_cmp_on_accum,
        is_cmp_iv_lhs,
        end_offset,
    })
}

/// Offset between the compared bound and the first value the IV never takes
fn check_simple_iv_end_value(
    input: &ClassifierInput<'_>,
    cmp: &Instruction,
    branch: &Instruction,
    step: i64,
    is_cmp_iv_lhs: bool,
    is_cmp_on_accum: bool,
) -> Option<i64> {
    let branch_loop = input
        .forest
        .innermost_loop_of(input.function, branch.id)
        .and_then(|id| input.forest.get(id))
        .unwrap_or(input.lp);
    let (taken, not_taken) = match branch.successors() {
        [t, f] => (*t, *f),
        _ => return None,
    };
    let taken_in_loop = branch_loop.contains_block(taken);
    if taken_in_loop == branch_loop.contains_block(not_taken) {
        return None;
    }
    let exit_on_cmp = !taken_in_loop;

    let predicate = to_signed(cmp.cmp_predicate()?);
    let predicate = if is_cmp_iv_lhs { predicate } else { predicate.swapped() };

    use CmpPredicate::*;
    let offset = match (exit_on_cmp, step, predicate) {
        (false, 1, Sle) => 1,
        (false, 1, Ne | Slt) => 0,
        (false, -1, Sge) => -1,
        (false, -1, Ne | Sgt) => 0,
        (true, 1, Sgt) => 1,
        (true, 1, Sge | Eq) => 0,
        (true, -1, Slt) => -1,
        (true, -1, Sle | Eq) => 0,
        _ => {
            debug!(
                cmp = %cmp.id,
                predicate = predicate.as_str(),
                "comparison of simple IV not understood"
            );
            return None;
        }
    };
    Some(offset - step * i64::from(is_cmp_on_accum))
}

fn to_signed(predicate: CmpPredicate) -> CmpPredicate {
    match predicate {
        CmpPredicate::Ugt => CmpPredicate::Sgt,
        CmpPredicate::Uge => CmpPredicate::Sge,
        CmpPredicate::Ult => CmpPredicate::Slt,
        CmpPredicate::Ule => CmpPredicate::Sle,
        other => other,
    }
}

fn check_if_clonable(function: &Function, scc: &Scc, attrs: &SccAttrs, has_dependents: bool) -> bool {
    let members = scc.num_internal_nodes();

    // Syntactic sugar recomputed by every consumer
    if members == 1 && has_dependents {
        let sugar = scc.instructions(function).next().map_or(false, |i| {
            matches!(
                i.role(),
                InstructionRole::Phi | InstructionRole::Gep | InstructionRole::Cast
            )
        });
        if sugar {
            return true;
        }
    }

    if members > 1 && has_dependents && attrs.is_induction_variable {
        return true;
    }

    members > 0
        && scc.number_of_instructions(function) == members
        && scc.instructions(function).all(|i| i.is_cmp() || i.is_terminator())
}

fn check_if_independent(scc: &Scc, policy: ControlEdgePolicy) -> bool {
    !scc.has_cycle(policy)
}

fn check_if_commutative(function: &Function, scc: &Scc, attrs: &SccAttrs) -> bool {
    // Nothing downstream may consume an intermediate value
    if scc.outgoing_external_edges().any(|e| !e.is_control()) {
        return false;
    }

    let Some(phi) = attrs.single_phi() else {
        return false;
    };
    if attrs.accumulators.is_empty() {
        return false;
    }

    let graph = scc.graph();
    let mut multiplicative: Option<bool> = None;
    for accumulator in &attrs.accumulators {
        let Some(inst) = function.instruction(*accumulator) else {
            return false;
        };
        let Some(op) = inst.binary_op().filter(|op| op.is_accumulator()) else {
            return false;
        };
        if inst.has_side_effects() {
            return false;
        }

        let internal_uses = graph
            .incoming_edges(*accumulator)
            .iter()
            .filter(|(_, e)| scc.contains(e.src))
            .count();
        let internal_users = graph
            .outgoing_edges(*accumulator)
            .iter()
            .filter(|(_, e)| scc.contains(e.dst))
            .count();
        if internal_uses != 1 || internal_users != 1 {
            return false;
        }

        let [lhs, rhs] = match inst.operands.as_slice() {
            [l, r] => [*l, *r],
            _ => return false,
        };
        let is_internal = |o: Operand| o.as_value().map_or(false, |v| scc.contains(v));
        let is_phi_or_accumulator = |o: Operand| {
            o.as_value()
                .map_or(false, |v| v == phi || attrs.accumulators.contains(&v))
        };
        if is_internal(lhs) == is_internal(rhs) {
            return false;
        }
        if is_phi_or_accumulator(lhs) == is_phi_or_accumulator(rhs) {
            return false;
        }

        match multiplicative {
            None => multiplicative = Some(op.is_mul()),
            Some(m) if m != op.is_mul() => return false,
            Some(_) => {}
        }
        if op.is_sub() && is_internal(rhs) {
            return false;
        }
    }
    true
}

fn is_contained_in_subloop(input: &ClassifierInput<'_>, scc: &Scc) -> bool {
    let members = scc.internal_values();
    !members.is_empty()
        && members.iter().all(|v| {
            input
                .forest
                .innermost_loop_of(input.function, *v)
                .map_or(false, |l| l != input.lp.id)
        })
}

fn has_reducible_evolution(input: &ClassifierInput<'_>, scc: &Scc, attrs: &SccAttrs) -> bool {
    if attrs.is_induction_variable {
        return false;
    }
    let header_phis = scc.instructions(input.function).filter(|i| i.is_phi() && i.block == input.lp.header);
    let mut phis = header_phis.map(|i| i.id);
    match (phis.next(), phis.next()) {
        (Some(phi), None) => LoopCarriedVariable::new(input.function, input.lp, input.loop_dg, scc, phi)
            .map_or(false, |v| v.is_evolution_reducible_across_iterations()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dependence_graph::infrastructure::{
        mark_loop_carried_dependences, ConservativeAliasOracle, DependenceGraphBuilder,
    };
    use crate::features::scc_classifier::domain::{ScevShape, StepValue};
    use crate::features::scc_classifier::infrastructure::scev::StructuralScalarEvolution;
    use crate::shared::models::{BinaryOp, DominatorSummary, FunctionBuilder};
    use rustc_hash::FxHashSet;

    /// Reports every value as an add-recurrence with step 1
    struct EverythingAddRec;

    impl ScalarEvolution for EverythingAddRec {
        fn shape(&self, _function: &Function, _value: ValueId) -> ScevShape {
            ScevShape::AddRec
        }

        fn step_recurrence(&self, _function: &Function, _phi: ValueId) -> Option<StepValue> {
            Some(StepValue::Constant(1))
        }
    }

    struct Fixture {
        function: Function,
        forest: LoopForest,
        loop_dg: DependenceGraph,
        scev: StructuralScalarEvolution,
    }

    impl Fixture {
        fn new(function: Function) -> Self {
            let ds = DominatorSummary::new(&function);
            let forest = LoopForest::discover(&function, &ds);
            let pdg = DependenceGraphBuilder::new()
                .with_alias_oracle(&ConservativeAliasOracle)
                .build(&function, &ds)
                .unwrap();
            let lp = forest.loops()[0].clone();
            let mut loop_dg = pdg.create_loop_subgraph(&function, &lp).unwrap();
            mark_loop_carried_dependences(&mut loop_dg, &function, &forest, &lp, &ds);
            let scev = StructuralScalarEvolution::analyze(&function, &forest);
            Self {
                function,
                forest,
                loop_dg,
                scev,
            }
        }

        fn classify(&self, policy: ControlEdgePolicy) -> (SccDag, SccDagAttrs) {
            self.classify_with(policy, &self.scev)
        }

        fn classify_with(
            &self,
            policy: ControlEdgePolicy,
            scev: &dyn ScalarEvolution,
        ) -> (SccDag, SccDagAttrs) {
            let config = ClassifierConfig::default().independence_control_policy(policy);
            let lp = &self.forest.loops()[0];
            let internal = self
                .loop_dg
                .create_subgraph_from_values(&self.loop_dg.internal_values(), false, &FxHashSet::default())
                .unwrap();
            let sccdag = SccDag::new(&internal);
            let input = ClassifierInput {
                function: &self.function,
                forest: &self.forest,
                lp,
                loop_dg: &self.loop_dg,
                scev,
                config: &config,
            };
            let attrs = SccDagAttrs::new(&input, &sccdag);
            (sccdag, attrs)
        }
    }

    /// for i in 0..n { sum += a[i] }, returns [i, next, c, sum, s2]
    fn sum_loop(predicate: CmpPredicate) -> (Function, [ValueId; 5]) {
        let mut b = FunctionBuilder::new("sum");
        let a = b.argument("a");
        let n = b.argument("n");
        let entry = b.block("entry");
        let body = b.block("body");
        let exit = b.block("exit");
        b.switch_to(entry);
        b.br(body);
        b.switch_to(body);
        let i = b.phi("i");
        let sum = b.phi("sum");
        let ptr = b.gep(a, i, "ptr");
        let x = b.load(ptr, "x");
        let s2 = b.binary(BinaryOp::Add, sum, x, "s2");
        let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
        let c = b.cmp(predicate, next, n, "c");
        b.cond_br(c, body, exit);
        b.switch_to(exit);
        b.ret(Some(s2.into()));
        b.add_incoming(i, Operand::int(0), entry);
        b.add_incoming(i, next, body);
        b.add_incoming(sum, Operand::int(0), entry);
        b.add_incoming(sum, s2, body);
        (b.build().unwrap(), [i, next, c, sum, s2])
    }

    #[test]
    fn test_induction_variable_is_clonable_sequential_simple_iv() {
        let (f, [i, next, c, _, _]) = sum_loop(CmpPredicate::Slt);
        let fx = Fixture::new(f);
        let (sccdag, attrs) = fx.classify(ControlEdgePolicy::IgnoreControl);

        let iv = sccdag.scc_of_value(i).unwrap();
        assert_eq!(sccdag.scc_of_value(next), Some(iv));
        assert_eq!(sccdag.scc_of_value(c), Some(iv));
        let a = attrs.attrs(iv).unwrap();
        assert_eq!(a.scc_type, SccType::Sequential);
        assert!(a.is_induction_variable);
        assert!(a.is_clonable);
        assert!(a.is_simple_iv);

        let info = a.simple_iv_info.as_ref().unwrap();
        assert_eq!(info.start, Operand::int(0));
        assert_eq!(info.step, 1);
        assert!(info.is_cmp_iv_lhs);
        assert!(info.is_cmp_on_accum);
        assert_eq!(info.end_offset, -1);
        assert!(attrs.loop_has_induction_variable(&sccdag));
        assert!(attrs.clonable_sccs().contains(&iv));
    }

    #[test]
    fn test_sum_reduction_is_commutative() {
        let (f, [_, _, _, sum, s2]) = sum_loop(CmpPredicate::Slt);
        let fx = Fixture::new(f);
        let (sccdag, attrs) = fx.classify(ControlEdgePolicy::IgnoreControl);

        let red = sccdag.scc_of_value(sum).unwrap();
        assert_eq!(sccdag.scc_of_value(s2), Some(red));
        let a = attrs.attrs(red).unwrap();
        assert_eq!(a.scc_type, SccType::Commutative);
        assert!(a.is_reducible);
        assert_eq!(a.phis, vec![sum]);
        assert_eq!(a.accumulators, vec![s2]);
        assert!(!a.is_clonable);
        assert!(attrs.has_reducible_evolution(red));
        assert!(attrs.get_sccs_with_loop_carried_data_dependencies().contains(&red));
    }

    #[test]
    fn test_unsupported_predicate_is_not_simple_iv() {
        let (f, [i, ..]) = sum_loop(CmpPredicate::Sgt);
        let fx = Fixture::new(f);
        let (sccdag, attrs) = fx.classify(ControlEdgePolicy::IgnoreControl);
        let a = attrs.attrs(sccdag.scc_of_value(i).unwrap()).unwrap();
        assert!(a.is_induction_variable);
        assert!(!a.is_simple_iv);
        assert!(a.simple_iv_info.is_none());
    }

    #[test]
    fn test_element_sccs_are_independent() {
        let (f, _) = sum_loop(CmpPredicate::Slt);
        let fx = Fixture::new(f);
        let (sccdag, attrs) = fx.classify(ControlEdgePolicy::IgnoreControl);
        for (id, scc) in sccdag.sccs() {
            if scc.num_internal_nodes() == 1 {
                assert_eq!(attrs.scc_type(id), Some(SccType::Independent), "{}", id);
            }
        }
    }

    #[test]
    fn test_sub_of_the_accumulator_is_not_commutative() {
        // sum = x - sum
        let mut b = FunctionBuilder::new("negsum");
        let x = b.argument("x");
        let n = b.argument("n");
        let entry = b.block("entry");
        let body = b.block("body");
        let exit = b.block("exit");
        b.switch_to(entry);
        b.br(body);
        b.switch_to(body);
        let i = b.phi("i");
        let sum = b.phi("sum");
        let s2 = b.binary(BinaryOp::Sub, x, sum, "s2");
        let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
        let c = b.cmp(CmpPredicate::Slt, next, n, "c");
        b.cond_br(c, body, exit);
        b.switch_to(exit);
        b.ret(Some(s2.into()));
        b.add_incoming(i, Operand::int(0), entry);
        b.add_incoming(i, next, body);
        b.add_incoming(sum, Operand::int(0), entry);
        b.add_incoming(sum, s2, body);
        let fx = Fixture::new(b.build().unwrap());
        let (sccdag, attrs) = fx.classify(ControlEdgePolicy::IgnoreControl);
        let red = sccdag.scc_of_value(sum).unwrap();
        assert_eq!(attrs.scc_type(red), Some(SccType::Sequential));
        assert!(!attrs.is_commutative(red));
    }

    #[test]
    fn test_control_policy_decides_terminator_self_loop() {
        // while (x < n) with the compare fed only by arguments: br -> br
        let mut b = FunctionBuilder::new("spin");
        let x = b.argument("x");
        let n = b.argument("n");
        let entry = b.block("entry");
        let body = b.block("body");
        let exit = b.block("exit");
        b.switch_to(entry);
        b.br(body);
        b.switch_to(body);
        let c = b.cmp(CmpPredicate::Slt, x, n, "c");
        let br = b.cond_br(c, body, exit);
        b.switch_to(exit);
        b.ret(None);
        let fx = Fixture::new(b.build().unwrap());

        let (sccdag, ignore) = fx.classify(ControlEdgePolicy::IgnoreControl);
        let id = sccdag.scc_of_value(br).unwrap();
        assert_eq!(ignore.scc_type(id), Some(SccType::Independent));

        let (sccdag, include) = fx.classify(ControlEdgePolicy::IncludeControl);
        let id = sccdag.scc_of_value(br).unwrap();
        assert_eq!(include.scc_type(id), Some(SccType::Sequential));
        assert!(include.is_clonable(id));
    }

    #[test]
    fn test_induction_variable_through_a_merge_phi() {
        // i = phi [0, k]; if (x < y) {} else {}; k = phi [d, d]; with d = i + 1
        let mut b = FunctionBuilder::new("merged_iv");
        let x = b.argument("x");
        let y = b.argument("y");
        let n = b.argument("n");
        let entry = b.block("entry");
        let header = b.block("header");
        let left = b.block("left");
        let right = b.block("right");
        let latch = b.block("latch");
        let exit = b.block("exit");
        b.switch_to(entry);
        b.br(header);
        b.switch_to(header);
        let i = b.phi("i");
        let d = b.binary(BinaryOp::Add, i, Operand::int(1), "d");
        let flag = b.cmp(CmpPredicate::Slt, x, y, "flag");
        b.cond_br(flag, left, right);
        b.switch_to(left);
        b.br(latch);
        b.switch_to(right);
        b.br(latch);
        b.switch_to(latch);
        let k = b.phi("k");
        let t = b.binary(BinaryOp::Mul, k, Operand::int(2), "t");
        let c = b.cmp(CmpPredicate::Slt, k, n, "c");
        b.cond_br(c, header, exit);
        b.switch_to(exit);
        b.ret(Some(t.into()));
        b.add_incoming(i, Operand::int(0), entry);
        b.add_incoming(i, k, latch);
        b.add_incoming(k, d, left);
        b.add_incoming(k, d, right);
        let fx = Fixture::new(b.build().unwrap());

        let (sccdag, attrs) = fx.classify_with(ControlEdgePolicy::IgnoreControl, &EverythingAddRec);
        let iv = sccdag.scc_of_value(i).unwrap();
        assert_eq!(sccdag.scc_of_value(k), Some(iv));
        assert_eq!(sccdag.scc_of_value(d), Some(iv));
        let a = attrs.attrs(iv).unwrap();
        assert!(a.phis.contains(&i));
        assert!(a.phis.contains(&k));
        assert!(a.is_induction_variable);
        assert!(a.is_clonable);
        assert!(!a.is_simple_iv);
    }
}
