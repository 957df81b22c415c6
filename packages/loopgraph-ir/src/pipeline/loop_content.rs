//! Per-loop analysis bundle
//!
//! Everything the technique selectors need about one loop, built stage by
//! stage: loop dependence graph, SCCDAG, classification, environment,
//! induction variables and partition.

use crate::config::AnalysisConfig;
use crate::errors::{LoopgraphError, Result};
use crate::features::dependence_graph::application::{
    build_loop_dependence_graph, LoopDependenceInput,
};
use crate::features::dependence_graph::infrastructure::{
    CommutativityAnnotations, ConservativeAliasOracle, DependenceGraph, NoIterationDomain,
};
use crate::features::dependence_graph::ports::{AliasOracle, IterationDomainOracle};
use crate::features::partition::application::Partitioner;
use crate::features::partition::infrastructure::SccDagPartition;
use crate::features::scc_classifier::infrastructure::{
    ClassifierInput, InductionVariableManager, LoopEnvironment, LoopInvariance, SccDagAttrs,
};
use crate::features::scc_classifier::ports::ScalarEvolution;
use crate::features::scc_dag::infrastructure::SccDag;
use crate::features::technique_selection::infrastructure::{SelectionContext, StaticProfile};
use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::{DominatorSummary, Function, LoopForest, LoopStructure};
use rustc_hash::FxHashSet;
use tracing::{debug, error};

/// External analyses consulted by the pipeline
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub alias: &'a dyn AliasOracle,
    pub iteration_domain: &'a dyn IterationDomainOracle,
    pub profile: &'a dyn ProfileOracle,
    /// `None` runs the structural evolution analysis per function
    pub scev: Option<&'a dyn ScalarEvolution>,
    pub annotations: Option<&'a CommutativityAnnotations>,
}

impl Default for Collaborators<'static> {
    fn default() -> Self {
        Self {
            alias: &ConservativeAliasOracle,
            iteration_domain: &NoIterationDomain,
            profile: &StaticProfile,
            scev: None,
            annotations: None,
        }
    }
}

impl<'a> Collaborators<'a> {
    pub fn with_alias(mut self, alias: &'a dyn AliasOracle) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_iteration_domain(mut self, oracle: &'a dyn IterationDomainOracle) -> Self {
        self.iteration_domain = oracle;
        self
    }

    pub fn with_profile(mut self, profile: &'a dyn ProfileOracle) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_scev(mut self, scev: &'a dyn ScalarEvolution) -> Self {
        self.scev = Some(scev);
        self
    }

    pub fn with_annotations(mut self, annotations: &'a CommutativityAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// Function-level inputs shared by all of its loops
#[derive(Clone, Copy)]
pub struct FunctionContext<'f> {
    pub function: &'f Function,
    pub doms: &'f DominatorSummary,
    pub forest: &'f LoopForest,
    pub function_dg: &'f DependenceGraph,
    pub scev: &'f dyn ScalarEvolution,
}

pub struct LoopContent<'f> {
    pub function: &'f Function,
    pub forest: &'f LoopForest,
    pub lp: &'f LoopStructure,
    pub doms: &'f DominatorSummary,
    pub loop_dg: DependenceGraph,
    pub sccdag: SccDag,
    pub attrs: SccDagAttrs,
    pub environment: LoopEnvironment,
    pub invariance: LoopInvariance<'f>,
    pub induction_variables: InductionVariableManager,
    pub partition: SccDagPartition,
}

impl<'f> LoopContent<'f> {
    /// Analyze `lp`. `None` when the loop has no instructions to analyze.
    pub fn new(
        fcx: &FunctionContext<'f>,
        lp: &'f LoopStructure,
        collaborators: &Collaborators<'_>,
        config: &AnalysisConfig,
    ) -> Result<Option<Self>> {
        let function = fcx.function;
        let input = LoopDependenceInput {
            function,
            doms: fcx.doms,
            forest: fcx.forest,
            lp,
            iteration_domain: collaborators.iteration_domain,
        };
        let Some(loop_dg) = build_loop_dependence_graph(fcx.function_dg, &input) else {
            debug!(function = function.name(), header = %lp.header, "empty loop skipped");
            return Ok(None);
        };

        let edges_to_ignore = collaborators
            .annotations
            .map(|a| a.edges_to_ignore(function.name(), &loop_dg))
            .unwrap_or_else(FxHashSet::default);
        let internal = loop_dg
            .create_subgraph_from_values(&loop_dg.internal_values(), false, &edges_to_ignore)
            .ok_or_else(|| {
                error!(function = function.name(), header = %lp.header, "loop without internal nodes");
                LoopgraphError::internal(format!(
                    "loop at {} of '{}' has no internal nodes",
                    lp.header,
                    function.name()
                ))
            })?;
        let sccdag = SccDag::new(&internal);

        let attrs = SccDagAttrs::new(
            &ClassifierInput {
                function,
                forest: fcx.forest,
                lp,
                loop_dg: &loop_dg,
                scev: fcx.scev,
                config: &config.classifier,
            },
            &sccdag,
        );
        let environment = LoopEnvironment::new(function, &loop_dg);
        let invariance = LoopInvariance::new(function, lp);
        let induction_variables =
            InductionVariableManager::new(function, lp, &sccdag, fcx.scev, &invariance);
        let partition = Partitioner::new(&config.partition).partition_loop(
            function,
            &sccdag,
            &attrs,
            collaborators.profile,
        )?;

        Ok(Some(Self {
            function,
            forest: fcx.forest,
            lp,
            doms: fcx.doms,
            loop_dg,
            sccdag,
            attrs,
            environment,
            invariance,
            induction_variables,
            partition,
        }))
    }

    /// View handed to the technique selectors
    pub fn selection_context<'s>(
        &'s self,
        collaborators: &Collaborators<'s>,
        config: &'s AnalysisConfig,
    ) -> SelectionContext<'s> {
        SelectionContext {
            function: self.function,
            forest: self.forest,
            lp: self.lp,
            doms: self.doms,
            sccdag: &self.sccdag,
            attrs: &self.attrs,
            environment: &self.environment,
            induction_variables: &self.induction_variables,
            invariance: &self.invariance,
            partition: &self.partition,
            iteration_domain: collaborators.iteration_domain,
            profile: collaborators.profile,
            config: &config.techniques,
            verbosity: config.verbosity,
        }
    }
}
