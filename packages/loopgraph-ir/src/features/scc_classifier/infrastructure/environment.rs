//! Loop environment: values exchanged between a loop and the surrounding code
//!
//! Indices are dense: live-ins sorted by value id first, then live-outs
//! sorted by value id.

use crate::features::dependence_graph::domain::DependenceKind;
use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::shared::models::{Function, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopEnvironment {
    producers: Vec<ValueId>,
    consumers: Vec<Vec<ValueId>>,
    num_live_ins: usize,
}

impl LoopEnvironment {
    /// Live-ins and live-outs of the loop whose instructions are the internal
    /// nodes of `loop_dg`
    pub fn new(function: &Function, loop_dg: &DependenceGraph) -> Self {
        let mut live_ins: BTreeMap<ValueId, BTreeSet<ValueId>> = BTreeMap::new();
        let mut live_outs: BTreeMap<ValueId, BTreeSet<ValueId>> = BTreeMap::new();

        for (_, edge) in loop_dg.edges() {
            if edge.kind != DependenceKind::Variable {
                continue;
            }
            let src_internal = loop_dg.is_internal(edge.src);
            let dst_internal = loop_dg.is_internal(edge.dst);
            if !src_internal && dst_internal {
                live_ins.entry(edge.src).or_default().insert(edge.dst);
            } else if src_internal && !dst_internal && function.is_instruction(edge.dst) {
                live_outs.entry(edge.src).or_default().insert(edge.dst);
            }
        }

        let num_live_ins = live_ins.len();
        let (producers, consumers) = live_ins
            .into_iter()
            .chain(live_outs)
            .map(|(producer, users)| (producer, users.into_iter().collect::<Vec<_>>()))
            .unzip();
        Self {
            producers,
            consumers,
            num_live_ins,
        }
    }

    pub fn live_in_indices(&self) -> Range<usize> {
        0..self.num_live_ins
    }

    pub fn live_out_indices(&self) -> Range<usize> {
        self.num_live_ins..self.producers.len()
    }

    pub fn size(&self) -> usize {
        self.producers.len()
    }

    pub fn producer(&self, index: usize) -> Option<ValueId> {
        self.producers.get(index).copied()
    }

    pub fn index_of(&self, value: ValueId) -> Option<usize> {
        self.producers.iter().position(|p| *p == value)
    }

    /// For a live-in: loop instructions reading it. For a live-out: the
    /// instructions after the loop reading it.
    pub fn consumers_of(&self, index: usize) -> &[ValueId] {
        self.consumers.get(index).map_or(&[], |c| c.as_slice())
    }

    pub fn live_ins(&self) -> &[ValueId] {
        &self.producers[..self.num_live_ins]
    }

    pub fn live_outs(&self) -> &[ValueId] {
        &self.producers[self.num_live_ins..]
    }

    pub fn is_live_in(&self, index: usize) -> bool {
        index < self.num_live_ins
    }
}
