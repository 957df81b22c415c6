//! Function-level driver
//!
//! DependenceGraph → SCCDAG → classification → partition → technique, for
//! every loop of a function, then loop selection over the results.

use super::loop_content::{Collaborators, FunctionContext, LoopContent};
use super::plan::{LoopPlan, ParallelizationPlan};
use crate::config::AnalysisConfig;
use crate::errors::{LoopgraphError, Result};
use crate::features::dependence_graph::application::build_function_dependence_graph;
use crate::features::scc_classifier::infrastructure::StructuralScalarEvolution;
use crate::features::scc_classifier::ports::ScalarEvolution;
use crate::features::technique_selection::application::select_technique;
use crate::features::technique_selection::infrastructure::{
    LoopCandidate, LoopSelector, LoopWeights,
};
use crate::shared::models::{DominatorSummary, Function, LoopForest};
use std::time::Instant;
use tracing::{debug, info};

pub fn analyze_function(
    function: &Function,
    collaborators: &Collaborators<'_>,
    config: &AnalysisConfig,
) -> Result<ParallelizationPlan> {
    let start = Instant::now();
    if function.blocks().is_empty() {
        return Err(LoopgraphError::malformed(format!(
            "function '{}' has no blocks",
            function.name()
        )));
    }

    let doms = DominatorSummary::new(function);
    let forest = LoopForest::discover(function, &doms);
    if forest.is_empty() {
        debug!(function = function.name(), "no loops");
        return Ok(ParallelizationPlan {
            function: function.name().to_string(),
            loops: Vec::new(),
            selected_loops: Vec::new(),
        });
    }

    let function_dg = build_function_dependence_graph(function, &doms, collaborators.alias)?;
    let structural;
    let scev: &dyn ScalarEvolution = match collaborators.scev {
        Some(scev) => scev,
        None => {
            structural = StructuralScalarEvolution::analyze(function, &forest);
            &structural
        }
    };
    let fcx = FunctionContext {
        function,
        doms: &doms,
        forest: &forest,
        function_dg: &function_dg,
        scev,
    };

    let mut loops = Vec::with_capacity(forest.len());
    let mut candidates = Vec::new();
    for lp in forest.loops() {
        let Some(content) = LoopContent::new(&fcx, lp, collaborators, config)? else {
            continue;
        };
        let ctx = content.selection_context(collaborators, config);
        let decision = select_technique(&ctx);
        let savings = LoopWeights::from_context(&ctx).estimated_savings(&content.attrs);
        if decision.chosen.is_some() {
            candidates.push(LoopCandidate {
                loop_id: lp.id,
                nesting_level: lp.nesting_level,
                savings,
            });
        }
        loops.push(LoopPlan::from_content(&content, decision, savings));
    }

    let total = total_weight(function, collaborators);
    let selected = LoopSelector::new(&config.techniques).select(&candidates, total);
    let selected_loops: Vec<_> = selected.iter().map(|c| c.loop_id).collect();
    for plan in &mut loops {
        plan.selected = selected_loops.contains(&plan.loop_id);
    }

    info!(
        function = function.name(),
        loops = loops.len(),
        parallelizable = candidates.len(),
        selected = selected_loops.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "function analyzed"
    );
    Ok(ParallelizationPlan {
        function: function.name().to_string(),
        loops,
        selected_loops,
    })
}

/// Dynamic instructions of the whole function
fn total_weight(function: &Function, collaborators: &Collaborators<'_>) -> f64 {
    function
        .instructions()
        .map(|inst| {
            collaborators
                .profile
                .instruction_executions(function, inst.id)
                .unwrap_or(1)
        })
        .sum::<u64>() as f64
}
