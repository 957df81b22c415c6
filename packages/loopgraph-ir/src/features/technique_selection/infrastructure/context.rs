//! Borrowed view of one analyzed loop, shared by every selector

use crate::config::{TechniqueConfig, Verbosity};
use crate::features::dependence_graph::ports::IterationDomainOracle;
use crate::features::partition::infrastructure::SccDagPartition;
use crate::features::scc_classifier::infrastructure::{
    InductionVariableManager, LoopEnvironment, LoopInvariance, SccDagAttrs,
};
use crate::features::scc_dag::infrastructure::SccDag;
use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::{BlockId, DominatorSummary, Function, LoopForest, LoopStructure};

#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    pub function: &'a Function,
    pub forest: &'a LoopForest,
    pub lp: &'a LoopStructure,
    pub doms: &'a DominatorSummary,
    pub sccdag: &'a SccDag,
    pub attrs: &'a SccDagAttrs,
    pub environment: &'a LoopEnvironment,
    pub induction_variables: &'a InductionVariableManager,
    pub invariance: &'a LoopInvariance<'a>,
    pub partition: &'a SccDagPartition,
    pub iteration_domain: &'a dyn IterationDomainOracle,
    pub profile: &'a dyn ProfileOracle,
    pub config: &'a TechniqueConfig,
    pub verbosity: Verbosity,
}

impl<'a> SelectionContext<'a> {
    /// Exit blocks of the loop, ignoring blocks that end the program through
    /// a call to `exit` right before their terminator
    pub fn effective_exit_blocks(&self) -> Vec<BlockId> {
        self.lp
            .exit_blocks(self.function)
            .into_iter()
            .filter(|block| !self.calls_exit_before_terminator(*block))
            .collect()
    }

    fn calls_exit_before_terminator(&self, block: BlockId) -> bool {
        let Some(bb) = self.function.block(block) else {
            return false;
        };
        let n = bb.instructions.len();
        n >= 2
            && self
                .function
                .instruction(bb.instructions[n - 2])
                .map_or(false, |inst| inst.calls("exit"))
    }
}
