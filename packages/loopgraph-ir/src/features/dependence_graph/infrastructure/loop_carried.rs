//! Loop-carried dependence marking
//!
//! A dependence between two instructions of a loop is loop-carried when the
//! consumer can observe the producer of an earlier iteration:
//! - the producer is the consumer, or does not dominate it
//! - for register dependences, the producer can reach the header before the
//!   consumer (otherwise the consumer always sees this iteration's value)
//! - memory dependences through different pointers, or through a pointer
//!   computed inside the loop, cannot be disambiguated by dominance

use super::graph::DependenceGraph;
use crate::features::dependence_graph::domain::DependenceEdge;
use crate::features::dependence_graph::ports::IterationDomainOracle;
use crate::shared::models::{
    BlockId, DominatorSummary, Function, LoopForest, LoopId, LoopStructure, Operand, ValueId,
};
use petgraph::graph::EdgeIndex;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Set the `loop_carried` flag of every edge of `dg` that carries a value
/// across iterations of `lp` (or of one of its subloops).
pub fn mark_loop_carried_dependences(
    dg: &mut DependenceGraph,
    function: &Function,
    forest: &LoopForest,
    lp: &LoopStructure,
    doms: &DominatorSummary,
) -> usize {
    let carried: Vec<EdgeIndex> = dg
        .edges()
        .filter(|(_, edge)| is_loop_carried(edge, function, forest, lp, doms))
        .map(|(idx, _)| idx)
        .collect();

    for idx in &carried {
        dg.set_loop_carried(*idx, true);
    }
    debug!(
        function = function.name(),
        header = %lp.header,
        loop_carried = carried.len(),
        "loop-carried dependences marked"
    );
    carried.len()
}

/// Innermost loop of `inst` restricted to the loop tree rooted at `root`
fn innermost_within(
    function: &Function,
    forest: &LoopForest,
    root: &LoopStructure,
    inst: ValueId,
) -> Option<LoopId> {
    let block = function.block_of(inst)?;
    if !root.contains_block(block) {
        return None;
    }
    forest
        .innermost_loop_of_block(block)
        .filter(|l| forest.is_nested_in(*l, root.id))
        .or(Some(root.id))
}

fn is_loop_carried(
    edge: &DependenceEdge,
    function: &Function,
    forest: &LoopForest,
    lp: &LoopStructure,
    doms: &DominatorSummary,
) -> bool {
    let (Some(producer), Some(consumer)) =
        (function.instruction(edge.src), function.instruction(edge.dst))
    else {
        return false;
    };

    let (Some(producer_loop), Some(consumer_loop)) = (
        innermost_within(function, forest, lp, producer.id),
        innermost_within(function, forest, lp, consumer.id),
    ) else {
        return false;
    };

    if edge.is_control() && producer_loop != lp.id && consumer_loop != lp.id {
        return false;
    }

    if edge.is_memory() && !touch_same_element_per_iteration(function, lp, producer.id, consumer.id) {
        return true;
    }

    if producer.id != consumer.id && doms.instruction_dominates(function, producer.id, consumer.id) {
        return false;
    }

    if !edge.is_memory() && !edge.is_control() {
        let Some(consumer_structure) = forest.get(consumer_loop) else {
            return false;
        };
        if !can_block_reach_header_before_other(
            function,
            consumer_structure,
            producer.block,
            consumer.block,
        ) {
            return false;
        }

        // A PHI that runs before the producer, in a block the header's
        // branch dominates, takes its value from elsewhere on the next
        // iteration.
        let header_branch = function.terminator(lp.header).map(|t| t.id);
        if consumer.is_phi()
            && doms.instruction_dominates(function, consumer.id, producer.id)
            && header_branch.map_or(false, |t| doms.instruction_dominates(function, t, consumer.id))
        {
            return false;
        }
    }

    true
}

/// Both instructions access through the same pointer, and that pointer is
/// fixed for the whole loop.
fn touch_same_element_per_iteration(
    function: &Function,
    lp: &LoopStructure,
    producer: ValueId,
    consumer: ValueId,
) -> bool {
    let pointer_of = |v: ValueId| function.instruction(v).and_then(|i| i.pointer_operand());
    let (Some(p), Some(c)) = (pointer_of(producer), pointer_of(consumer)) else {
        return false;
    };
    if p != c {
        return false;
    }
    match p {
        Operand::Value(ptr) => match function.instruction(ptr) {
            Some(inst) => !lp.contains_block(inst.block),
            None => false,
        },
        Operand::Constant(_) => false,
    }
}

/// Breadth-first walk from `from`: does it hit the header before `to`?
/// Exit blocks and `to` are not expanded. The same block means a later
/// iteration.
pub fn can_block_reach_header_before_other(
    function: &Function,
    lp: &LoopStructure,
    from: BlockId,
    to: BlockId,
) -> bool {
    if from == to {
        return true;
    }
    let exits: FxHashSet<BlockId> = lp.exit_blocks(function).into_iter().collect();
    let mut queue = VecDeque::new();
    let mut enqueued = FxHashSet::default();
    queue.push_back(from);
    enqueued.insert(from);

    while let Some(block) = queue.pop_front() {
        if block == lp.header {
            return true;
        }
        if exits.contains(&block) || block == to {
            continue;
        }
        for succ in function.successors(block) {
            if enqueued.insert(*succ) {
                queue.push_back(*succ);
            }
        }
    }
    false
}

/// Whether `dst` can execute after `src` within one iteration of `lp`
/// (without passing through the header).
pub fn can_precede_in_iteration(
    function: &Function,
    lp: &LoopStructure,
    src: ValueId,
    dst: ValueId,
) -> bool {
    if src == dst {
        return false;
    }
    let (Some(src_block), Some(dst_block)) = (function.block_of(src), function.block_of(dst)) else {
        return false;
    };
    if src_block == dst_block {
        if let (Some(a), Some(b)) = (function.position(src), function.position(dst)) {
            if a < b {
                return true;
            }
        }
    }

    let mut visited = FxHashSet::default();
    let mut worklist: Vec<BlockId> = function
        .successors(src_block)
        .iter()
        .copied()
        .filter(|b| *b != lp.header && lp.contains_block(*b))
        .collect();
    while let Some(block) = worklist.pop() {
        if !visited.insert(block) {
            continue;
        }
        if block == dst_block {
            return true;
        }
        for succ in function.successors(block) {
            if *succ != lp.header && lp.contains_block(*succ) {
                worklist.push(*succ);
            }
        }
    }
    false
}

/// Drop or downgrade loop-carried memory dependences that the iteration
/// domain oracle proves disjoint across iterations. The edge survives as an
/// intra-iteration dependence when the consumer can follow the producer in
/// the same iteration.
pub fn refine_with_iteration_domain(
    dg: &mut DependenceGraph,
    function: &Function,
    lp: &LoopStructure,
    oracle: &dyn IterationDomainOracle,
) {
    let mut downgrade = Vec::new();
    let mut remove: FxHashSet<EdgeIndex> = FxHashSet::default();

    for (idx, edge) in dg.edges() {
        if !edge.is_memory() || !edge.loop_carried {
            continue;
        }
        if !dg.is_internal(edge.src) || !dg.is_internal(edge.dst) {
            continue;
        }
        if !oracle.disjoint_across_iterations(function, lp, edge.src, edge.dst) {
            continue;
        }
        if can_precede_in_iteration(function, lp, edge.src, edge.dst) {
            downgrade.push(idx);
        } else {
            remove.insert(idx);
        }
    }

    for idx in &downgrade {
        dg.set_loop_carried(*idx, false);
    }
    if !remove.is_empty() {
        dg.retain_edges(|idx, _| !remove.contains(&idx));
    }
    debug!(
        header = %lp.header,
        downgraded = downgrade.len(),
        removed = remove.len(),
        "iteration domain refinement"
    );
}
