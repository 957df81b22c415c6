//! Test fixtures
//!
//! Collaborator stubs plus a front-half pipeline that stops at the loop
//! content, for tests that need the classifier or partition directly.

use loopgraph_ir::config::{AnalysisConfig, Verbosity};
use loopgraph_ir::features::dependence_graph::{
    build_function_dependence_graph, ConservativeAliasOracle, DependenceGraph,
    IterationDomainOracle,
};
use loopgraph_ir::features::scc_classifier::StructuralScalarEvolution;
use loopgraph_ir::pipeline::{Collaborators, FunctionContext, LoopContent};
use loopgraph_ir::shared::models::{
    DominatorSummary, Function, LoopForest, LoopStructure, ValueId,
};

/// Attests every pair of memory accesses disjoint across iterations
#[derive(Debug, Clone, Copy, Default)]
pub struct AllDisjoint;

impl IterationDomainOracle for AllDisjoint {
    fn disjoint_across_iterations(
        &self,
        _function: &Function,
        _lp: &LoopStructure,
        _src: ValueId,
        _dst: ValueId,
    ) -> bool {
        true
    }
}

/// Default configuration without rejection logging
pub fn quiet_config() -> AnalysisConfig {
    AnalysisConfig::default().verbosity(Verbosity::Disabled)
}

/// Commutativity sidecar declaring `src -> dst` edges of `function`
pub fn sidecar_json(function: &str, pairs: &[(ValueId, ValueId)]) -> String {
    let entries: Vec<String> = pairs
        .iter()
        .map(|(src, dst)| {
            format!(
                r#"{{ "function": "{}", "src": {}, "dst": {} }}"#,
                function, src.0, dst.0
            )
        })
        .collect();
    format!(r#"{{ "commutative": [ {} ] }}"#, entries.join(", "))
}

/// Function-level analyses, kept alive for the loop content borrowing them
pub struct LoopFixture {
    pub function: Function,
    pub doms: DominatorSummary,
    pub forest: LoopForest,
    pub function_dg: DependenceGraph,
    pub scev: StructuralScalarEvolution,
}

impl LoopFixture {
    pub fn new(function: Function) -> Self {
        let doms = DominatorSummary::new(&function);
        let forest = LoopForest::discover(&function, &doms);
        let function_dg =
            build_function_dependence_graph(&function, &doms, &ConservativeAliasOracle)
                .expect("function dependence graph");
        let scev = StructuralScalarEvolution::analyze(&function, &forest);
        Self {
            function,
            doms,
            forest,
            function_dg,
            scev,
        }
    }

    /// Analysis of the first (outermost) loop
    pub fn content<'a>(
        &'a self,
        collaborators: &Collaborators<'_>,
        config: &AnalysisConfig,
    ) -> LoopContent<'a> {
        let fcx = FunctionContext {
            function: &self.function,
            doms: &self.doms,
            forest: &self.forest,
            function_dg: &self.function_dg,
            scev: &self.scev,
        };
        LoopContent::new(&fcx, &self.forest.loops()[0], collaborators, config)
            .expect("loop analysis")
            .expect("loop with instructions")
    }
}
