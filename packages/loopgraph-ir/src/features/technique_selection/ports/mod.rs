//! Ports (trait interfaces) for technique selection
//!
//! Execution profiles are collected elsewhere; the heuristics only read them.

use crate::shared::models::{Function, LoopStructure, ValueId};

/// Dynamic execution counts
pub trait ProfileOracle: Send + Sync {
    /// Total executions of `value` across the profiled run
    fn instruction_executions(&self, function: &Function, value: ValueId) -> Option<u64>;

    /// Total iterations of `lp` across all its invocations
    fn loop_iterations(&self, function: &Function, lp: &LoopStructure) -> Option<u64>;

    fn loop_invocations(&self, function: &Function, lp: &LoopStructure) -> Option<u64>;

    /// Whether the counts come from a real run
    fn is_available(&self) -> bool {
        true
    }
}
