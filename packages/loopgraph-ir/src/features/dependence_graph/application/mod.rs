//! Dependence Graph Application Layer
//!
//! Main entry points:
//! - `build_function_dependence_graph()`: whole-function PDG
//! - `build_loop_dependence_graph()`: loop view with loop-carried flags

use crate::errors::Result;
use crate::features::dependence_graph::infrastructure::{
    mark_loop_carried_dependences, refine_with_iteration_domain, DependenceGraph,
    DependenceGraphBuilder,
};
use crate::features::dependence_graph::ports::{AliasOracle, IterationDomainOracle};
use crate::shared::models::{DominatorSummary, Function, LoopForest, LoopStructure};

pub use crate::features::dependence_graph::infrastructure::{
    CommutativityAnnotations, ConservativeAliasOracle, NoIterationDomain,
};

pub fn build_function_dependence_graph(
    function: &Function,
    doms: &DominatorSummary,
    alias: &dyn AliasOracle,
) -> Result<DependenceGraph> {
    DependenceGraphBuilder::new()
        .with_alias_oracle(alias)
        .build(function, doms)
}

/// Inputs of the loop-level use case
pub struct LoopDependenceInput<'a> {
    pub function: &'a Function,
    pub doms: &'a DominatorSummary,
    pub forest: &'a LoopForest,
    pub lp: &'a LoopStructure,
    pub iteration_domain: &'a dyn IterationDomainOracle,
}

/// Extract the loop view of `function_dg`, then flag and refine its
/// loop-carried dependences. `None` for a loop without instructions.
pub fn build_loop_dependence_graph(
    function_dg: &DependenceGraph,
    input: &LoopDependenceInput<'_>,
) -> Option<DependenceGraph> {
    let mut loop_dg = function_dg.create_loop_subgraph(input.function, input.lp)?;
    mark_loop_carried_dependences(&mut loop_dg, input.function, input.forest, input.lp, input.doms);
    refine_with_iteration_domain(&mut loop_dg, input.function, input.lp, input.iteration_domain);
    Some(loop_dg)
}
