//! Loop selection by estimated savings

use crate::config::TechniqueConfig;
use crate::shared::models::LoopId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopCandidate {
    pub loop_id: LoopId,
    pub nesting_level: u32,
    pub savings: f64,
}

pub struct LoopSelector<'a> {
    config: &'a TechniqueConfig,
}

impl<'a> LoopSelector<'a> {
    pub fn new(config: &'a TechniqueConfig) -> Self {
        Self { config }
    }

    /// Whether a loop saving `savings` out of `total` is worth parallelizing
    pub fn is_worth_it(&self, savings: f64, total: f64) -> bool {
        if total <= 0.0 {
            return false;
        }
        savings / total >= self.config.min_time_saved_fraction
    }

    /// Profitable candidates, most savings first, outermost first on ties
    pub fn select(&self, candidates: &[LoopCandidate], total: f64) -> Vec<LoopCandidate> {
        let mut selected: Vec<LoopCandidate> = candidates
            .iter()
            .copied()
            .filter(|c| {
                let keep = self.is_worth_it(c.savings, total);
                if !keep {
                    debug!(
                        loop_id = c.loop_id.0,
                        savings = c.savings,
                        total,
                        "loop saves too little"
                    );
                }
                keep
            })
            .collect();
        selected.sort_by(|a, b| {
            b.savings
                .partial_cmp(&a.savings)
                .unwrap_or(Ordering::Equal)
                .then(a.nesting_level.cmp(&b.nesting_level))
                .then(a.loop_id.cmp(&b.loop_id))
        });
        selected
    }
}
