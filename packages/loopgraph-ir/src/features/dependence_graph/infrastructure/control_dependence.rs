//! Control dependences from the post-dominator relation
//!
//! For every block `B`, every block `D` post-dominated by `B`, and every
//! predecessor `P` of `D`: if `P` branches (more than one successor) and `B`
//! does not strictly post-dominate `P`, then every instruction of `B` is
//! control dependent on `P`'s terminator.
//!
//! PHIs additionally inherit the control producers of the incoming blocks
//! whose value is not computed inside that block.

use super::graph::DependenceGraph;
use crate::features::dependence_graph::domain::{DependenceEdge, DependenceKind};
use crate::shared::models::{DominatorSummary, Function, Operand, ValueId};
use rustc_hash::FxHashSet;
use tracing::debug;

pub fn add_control_dependences(
    function: &Function,
    doms: &DominatorSummary,
    dg: &mut DependenceGraph,
) {
    let mut added: FxHashSet<(ValueId, ValueId)> = FxHashSet::default();

    for block in function.blocks() {
        let b = block.id;
        for d in doms.post_dominated_by(b) {
            for &p in function.predecessors(d) {
                let Some(terminator) = function.terminator(p) else {
                    continue;
                };
                if terminator.successors().len() <= 1 {
                    continue;
                }
                if doms.properly_post_dominates(b, p) {
                    continue;
                }
                for &inst in &block.instructions {
                    if added.insert((terminator.id, inst)) {
                        dg.add_edge(DependenceEdge::control(terminator.id, inst));
                    }
                }
            }
        }
    }

    add_phi_control_dependences(function, dg, &mut added);
    debug!(
        function = function.name(),
        edges = added.len(),
        "control dependences added"
    );
}

fn add_phi_control_dependences(
    function: &Function,
    dg: &mut DependenceGraph,
    added: &mut FxHashSet<(ValueId, ValueId)>,
) {
    for phi in function.instructions().filter(|i| i.is_phi()) {
        for (incoming, block) in phi.incoming() {
            // A value computed in the incoming block already carries that
            // block's control dependences.
            let defined_in_block = match incoming {
                Operand::Value(v) => function.block_of(v) == Some(block),
                Operand::Constant(_) => false,
            };
            if defined_in_block {
                continue;
            }
            let Some(terminator) = function.terminator(block) else {
                continue;
            };

            let mut producers = Vec::new();
            dg.iterate_over_dependences_to(terminator.id, true, false, false, |src, edge| {
                if edge.kind == DependenceKind::Control {
                    producers.push(src);
                }
                false
            });

            for producer in producers {
                if added.insert((producer, phi.id)) {
                    dg.add_edge(DependenceEdge::control(producer, phi.id));
                }
            }
        }
    }
}
