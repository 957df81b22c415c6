//! Control flow graph view and dominator summaries
//!
//! Dominators are computed with petgraph's Cooper-Harvey-Kennedy
//! implementation (`simple_fast`). Post-dominators run the same algorithm on
//! the reversed CFG, rooted at a virtual exit that every returning block
//! feeds into.

use super::ir::{BlockId, Function, ValueId};
use petgraph::algo::dominators::{self, Dominators};
use petgraph::graph::{DiGraph, NodeIndex};

/// Block-level CFG as a petgraph graph. Node `i` is block `BlockId(i)`.
#[derive(Debug, Clone)]
pub struct Cfg {
    graph: DiGraph<BlockId, ()>,
}

impl Cfg {
    pub fn new(function: &Function) -> Self {
        let mut graph = DiGraph::with_capacity(function.num_blocks(), function.num_blocks());
        for block in function.blocks() {
            graph.add_node(block.id);
        }
        for block in function.blocks() {
            for succ in function.successors(block.id) {
                graph.add_edge(
                    NodeIndex::new(block.id.index()),
                    NodeIndex::new(succ.index()),
                    (),
                );
            }
        }
        Self { graph }
    }

    pub fn graph(&self) -> &DiGraph<BlockId, ()> {
        &self.graph
    }

    /// Reversed CFG plus a virtual exit node (the last node) that links to
    /// every block without successors.
    fn reversed_with_virtual_exit(&self) -> (DiGraph<Option<BlockId>, ()>, NodeIndex) {
        let mut rev: DiGraph<Option<BlockId>, ()> = DiGraph::new();
        for idx in self.graph.node_indices() {
            rev.add_node(Some(self.graph[idx]));
        }
        let exit = rev.add_node(None);
        for edge in self.graph.raw_edges() {
            rev.add_edge(edge.target(), edge.source(), ());
        }
        for idx in self.graph.node_indices() {
            if self.graph.neighbors(idx).next().is_none() {
                rev.add_edge(exit, idx, ());
            }
        }
        (rev, exit)
    }
}

/// Forward and post dominator trees for one function
#[derive(Debug, Clone)]
pub struct DominatorSummary {
    /// Immediate dominator per block (None for the entry and unreachable blocks)
    idom: Vec<Option<BlockId>>,
    /// Immediate post-dominator per block (None when it is the virtual exit)
    ipdom: Vec<Option<BlockId>>,
    reachable: Vec<bool>,
    post_reachable: Vec<bool>,
}

impl DominatorSummary {
    pub fn new(function: &Function) -> Self {
        let cfg = Cfg::new(function);
        let n = function.num_blocks();

        let entry = NodeIndex::new(function.entry_block().index());
        let doms: Dominators<NodeIndex> = dominators::simple_fast(cfg.graph(), entry);
        let mut idom = vec![None; n];
        let mut reachable = vec![false; n];
        for idx in cfg.graph().node_indices() {
            if idx == entry {
                reachable[idx.index()] = true;
                continue;
            }
            if let Some(d) = doms.immediate_dominator(idx) {
                idom[idx.index()] = Some(BlockId(d.index() as u32));
                reachable[idx.index()] = true;
            }
        }

        let (rev, exit) = cfg.reversed_with_virtual_exit();
        let pdoms = dominators::simple_fast(&rev, exit);
        let mut ipdom = vec![None; n];
        let mut post_reachable = vec![false; n];
        for idx in rev.node_indices() {
            if idx == exit {
                continue;
            }
            if let Some(d) = pdoms.immediate_dominator(idx) {
                post_reachable[idx.index()] = true;
                ipdom[idx.index()] = rev[d];
            }
        }

        Self {
            idom,
            ipdom,
            reachable,
            post_reachable,
        }
    }

    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.idom.get(block.index()).copied().flatten()
    }

    pub fn immediate_post_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.ipdom.get(block.index()).copied().flatten()
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable.get(block.index()).copied().unwrap_or(false)
    }

    /// Reflexive block dominance
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if !self.is_reachable(b) {
            return true;
        }
        let mut cur = Some(b);
        while let Some(block) = cur {
            if block == a {
                return true;
            }
            cur = self.immediate_dominator(block);
        }
        false
    }

    pub fn properly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Reflexive block post-dominance
    pub fn post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return true;
        }
        if !self.post_reachable.get(b.index()).copied().unwrap_or(false) {
            return false;
        }
        let mut cur = self.immediate_post_dominator(b);
        while let Some(block) = cur {
            if block == a {
                return true;
            }
            cur = self.immediate_post_dominator(block);
        }
        false
    }

    pub fn properly_post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.post_dominates(a, b)
    }

    /// Blocks post-dominated by `block`, itself included, in block order
    pub fn post_dominated_by(&self, block: BlockId) -> Vec<BlockId> {
        (0..self.idom.len() as u32)
            .map(BlockId)
            .filter(|b| self.post_dominates(block, *b))
            .collect()
    }

    /// Instruction-level dominance.
    ///
    /// An instruction never dominates itself. Within a block, earlier
    /// instructions dominate later ones, except that a PHI is only dominated
    /// by definitions that dominate its whole block.
    pub fn instruction_dominates(&self, function: &Function, def: ValueId, user: ValueId) -> bool {
        if def == user {
            return false;
        }
        let (Some(def_inst), Some(user_inst)) =
            (function.instruction(def), function.instruction(user))
        else {
            return false;
        };
        if !self.is_reachable(user_inst.block) {
            return true;
        }
        if !self.is_reachable(def_inst.block) {
            return false;
        }
        if def_inst.block != user_inst.block {
            return self.dominates(def_inst.block, user_inst.block);
        }
        if user_inst.is_phi() {
            return false;
        }
        match (function.position(def), function.position(user)) {
            (Some(d), Some(u)) => d < u,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{BinaryOp, CmpPredicate, FunctionBuilder, Operand};

    /// entry -> header -> {then, else} -> latch -> header | exit
    fn diamond_loop() -> (Function, [BlockId; 6]) {
        let mut b = FunctionBuilder::new("diamond");
        let n = b.argument("n");
        let entry = b.block("entry");
        let header = b.block("header");
        let then_bb = b.block("then");
        let else_bb = b.block("else");
        let latch = b.block("latch");
        let exit = b.block("exit");

        b.switch_to(entry);
        b.br(header);
        b.switch_to(header);
        let i = b.phi("i");
        let c = b.cmp(CmpPredicate::Slt, i, Operand::int(10), "c");
        b.cond_br(c, then_bb, else_bb);
        b.switch_to(then_bb);
        b.br(latch);
        b.switch_to(else_bb);
        b.br(latch);
        b.switch_to(latch);
        let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
        let done = b.cmp(CmpPredicate::Slt, next, n, "done");
        b.cond_br(done, header, exit);
        b.switch_to(exit);
        b.ret(None);
        b.add_incoming(i, Operand::int(0), entry);
        b.add_incoming(i, next, latch);

        let f = b.build().unwrap();
        (f, [entry, header, then_bb, else_bb, latch, exit])
    }

    #[test]
    fn test_dominators() {
        let (f, [entry, header, then_bb, else_bb, latch, exit]) = diamond_loop();
        let ds = DominatorSummary::new(&f);

        assert!(ds.dominates(entry, exit));
        assert!(ds.dominates(header, latch));
        assert!(!ds.dominates(then_bb, latch));
        assert!(!ds.dominates(else_bb, latch));
        assert_eq!(ds.immediate_dominator(latch), Some(header));
        assert_eq!(ds.immediate_dominator(entry), None);
    }

    #[test]
    fn test_post_dominators() {
        let (f, [entry, header, then_bb, else_bb, latch, exit]) = diamond_loop();
        let ds = DominatorSummary::new(&f);

        assert!(ds.post_dominates(latch, then_bb));
        assert!(ds.post_dominates(latch, header));
        assert!(ds.post_dominates(exit, entry));
        assert!(!ds.post_dominates(then_bb, header));
        assert_eq!(ds.immediate_post_dominator(header), Some(latch));
        assert_eq!(ds.immediate_post_dominator(exit), None);

        let by_latch = ds.post_dominated_by(latch);
        assert!(by_latch.contains(&latch));
        assert!(by_latch.contains(&header));
        assert!(!by_latch.contains(&exit));
    }

    #[test]
    fn test_instruction_dominance() {
        let (f, [_, header, _, _, latch, _]) = diamond_loop();
        let ds = DominatorSummary::new(&f);
        let phi = f.first_instruction(header).unwrap();
        let cmp = f.block(header).unwrap().instructions[1];
        let next = f.first_instruction(latch).unwrap();

        assert!(ds.instruction_dominates(&f, phi, cmp));
        assert!(!ds.instruction_dominates(&f, cmp, phi));
        assert!(ds.instruction_dominates(&f, phi, next));
        assert!(!ds.instruction_dominates(&f, next, phi));
        assert!(!ds.instruction_dominates(&f, phi, phi));
    }
}
