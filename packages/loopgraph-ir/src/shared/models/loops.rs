//! Natural loop discovery
//!
//! A back edge is `tail -> header` where `header` dominates `tail`. The body
//! of the loop is every block that reaches `tail` without going through
//! `header`. Back edges sharing a header describe one loop.

use super::cfg::DominatorSummary;
use super::ir::{BlockId, Function, LoopId, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One natural loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStructure {
    pub id: LoopId,
    pub header: BlockId,
    pub blocks: BTreeSet<BlockId>,
    pub latches: Vec<BlockId>,
    pub parent: Option<LoopId>,
    pub children: Vec<LoopId>,
    /// 1 for outermost loops
    pub nesting_level: u32,
}

impl LoopStructure {
    pub fn contains_block(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    pub fn contains_instruction(&self, function: &Function, inst: ValueId) -> bool {
        function
            .block_of(inst)
            .map_or(false, |b| self.contains_block(b))
    }

    /// Blocks in function layout order, header first
    pub fn ordered_blocks(&self, function: &Function) -> Vec<BlockId> {
        let mut out = vec![self.header];
        out.extend(
            function
                .blocks()
                .iter()
                .map(|b| b.id)
                .filter(|b| *b != self.header && self.contains_block(*b)),
        );
        out
    }

    /// Instructions of the loop, header block first
    pub fn instructions(&self, function: &Function) -> Vec<ValueId> {
        self.ordered_blocks(function)
            .into_iter()
            .filter_map(|b| function.block(b))
            .flat_map(|b| b.instructions.iter().copied())
            .collect()
    }

    pub fn num_instructions(&self, function: &Function) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| function.block(*b))
            .map(|b| b.instructions.len())
            .sum()
    }

    /// Blocks outside the loop with a predecessor inside, sorted
    pub fn exit_blocks(&self, function: &Function) -> Vec<BlockId> {
        let mut exits = BTreeSet::new();
        for block in &self.blocks {
            for succ in function.successors(*block) {
                if !self.contains_block(*succ) {
                    exits.insert(*succ);
                }
            }
        }
        exits.into_iter().collect()
    }

    /// Loop blocks with a successor outside the loop
    pub fn exiting_blocks(&self, function: &Function) -> Vec<BlockId> {
        self.blocks
            .iter()
            .copied()
            .filter(|b| {
                function
                    .successors(*b)
                    .iter()
                    .any(|s| !self.contains_block(*s))
            })
            .collect()
    }

    /// Unique predecessor of the header outside the loop
    pub fn preheader(&self, function: &Function) -> Option<BlockId> {
        let outside: Vec<BlockId> = function
            .predecessors(self.header)
            .iter()
            .copied()
            .filter(|p| !self.contains_block(*p))
            .collect();
        match outside.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }
}

/// All natural loops of a function with their nesting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopForest {
    loops: Vec<LoopStructure>,
}

impl LoopForest {
    pub fn discover(function: &Function, doms: &DominatorSummary) -> Self {
        // header -> (body, latches)
        let mut by_header: BTreeMap<BlockId, (BTreeSet<BlockId>, Vec<BlockId>)> = BTreeMap::new();

        for block in function.blocks() {
            let tail = block.id;
            if !doms.is_reachable(tail) {
                continue;
            }
            for &header in function.successors(tail) {
                if !doms.dominates(header, tail) {
                    continue;
                }
                let entry = by_header.entry(header).or_default();
                entry.0.extend(natural_loop_body(function, header, tail));
                if !entry.1.contains(&tail) {
                    entry.1.push(tail);
                }
            }
        }

        let mut loops: Vec<LoopStructure> = by_header
            .into_iter()
            .enumerate()
            .map(|(idx, (header, (blocks, latches)))| LoopStructure {
                id: LoopId(idx as u32),
                header,
                blocks,
                latches,
                parent: None,
                children: Vec::new(),
                nesting_level: 1,
            })
            .collect();

        // Parent = smallest strictly enclosing loop
        let n = loops.len();
        for i in 0..n {
            let parent = (0..n)
                .filter(|&j| {
                    j != i
                        && loops[j].blocks.len() > loops[i].blocks.len()
                        && loops[i].blocks.is_subset(&loops[j].blocks)
                })
                .min_by_key(|&j| loops[j].blocks.len());
            loops[i].parent = parent.map(|j| loops[j].id);
        }
        for i in 0..n {
            if let Some(parent) = loops[i].parent {
                let child = loops[i].id;
                loops[parent.index()].children.push(child);
            }
        }
        for i in 0..n {
            let mut level = 1;
            let mut cur = loops[i].parent;
            while let Some(p) = cur {
                level += 1;
                cur = loops[p.index()].parent;
            }
            loops[i].nesting_level = level;
        }

        Self { loops }
    }

    pub fn loops(&self) -> &[LoopStructure] {
        &self.loops
    }

    pub fn get(&self, id: LoopId) -> Option<&LoopStructure> {
        self.loops.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn top_level_loops(&self) -> impl Iterator<Item = &LoopStructure> + '_ {
        self.loops.iter().filter(|l| l.parent.is_none())
    }

    /// Innermost loop that contains `block`
    pub fn innermost_loop_of_block(&self, block: BlockId) -> Option<LoopId> {
        self.loops
            .iter()
            .filter(|l| l.contains_block(block))
            .max_by_key(|l| l.nesting_level)
            .map(|l| l.id)
    }

    pub fn innermost_loop_of(&self, function: &Function, inst: ValueId) -> Option<LoopId> {
        function
            .block_of(inst)
            .and_then(|b| self.innermost_loop_of_block(b))
    }

    /// Whether `inner` is `outer` or nested inside it
    pub fn is_nested_in(&self, inner: LoopId, outer: LoopId) -> bool {
        let mut cur = Some(inner);
        while let Some(id) = cur {
            if id == outer {
                return true;
            }
            cur = self.get(id).and_then(|l| l.parent);
        }
        false
    }

    /// Loops strictly nested inside `id`, depth first
    pub fn descendants(&self, id: LoopId) -> Vec<LoopId> {
        let mut out = Vec::new();
        let mut stack: Vec<LoopId> = self
            .get(id)
            .map(|l| l.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(l) = self.get(next) {
                stack.extend(l.children.iter().rev().copied());
            }
        }
        out
    }
}

fn natural_loop_body(function: &Function, header: BlockId, tail: BlockId) -> BTreeSet<BlockId> {
    let mut body = BTreeSet::new();
    body.insert(header);
    if header == tail {
        return body;
    }
    let mut worklist = vec![tail];
    body.insert(tail);
    while let Some(block) = worklist.pop() {
        for &pred in function.predecessors(block) {
            if body.insert(pred) {
                worklist.push(pred);
            }
        }
    }
    body
}
