//! Batch driver over independent functions
//!
//! Functions share nothing, so with `parallel_functions` they are analyzed
//! on the rayon pool. Plans come back sorted by function name.

use super::analyzer::analyze_function;
use super::loop_content::Collaborators;
use super::plan::ParallelizationPlan;
use crate::config::AnalysisConfig;
use crate::errors::Result;
use crate::shared::models::Function;
use std::time::Instant;
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub fn analyze_functions(
    functions: &[Function],
    collaborators: &Collaborators<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<ParallelizationPlan>> {
    let start = Instant::now();
    let mut plans = if config.parallel_functions {
        analyze_parallel(functions, collaborators, config)?
    } else {
        analyze_sequential(functions, collaborators, config)?
    };
    plans.sort_by(|a, b| a.function.cmp(&b.function));

    info!(
        functions = plans.len(),
        loops = plans.iter().map(|p| p.loops.len()).sum::<usize>(),
        selected = plans.iter().map(|p| p.selected_loops.len()).sum::<usize>(),
        parallel = config.parallel_functions,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch analyzed"
    );
    Ok(plans)
}

fn analyze_sequential(
    functions: &[Function],
    collaborators: &Collaborators<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<ParallelizationPlan>> {
    functions
        .iter()
        .map(|f| analyze_function(f, collaborators, config))
        .collect()
}

#[cfg(feature = "parallel")]
fn analyze_parallel(
    functions: &[Function],
    collaborators: &Collaborators<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<ParallelizationPlan>> {
    functions
        .par_iter()
        .map(|f| analyze_function(f, collaborators, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn analyze_parallel(
    functions: &[Function],
    collaborators: &Collaborators<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<ParallelizationPlan>> {
    analyze_sequential(functions, collaborators, config)
}
