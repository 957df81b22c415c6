//! Profiles

use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::{Function, LoopStructure, ValueId};
use rustc_hash::FxHashMap;

/// Every instruction runs once, every loop runs one iteration once
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProfile;

impl ProfileOracle for StaticProfile {
    fn instruction_executions(&self, function: &Function, value: ValueId) -> Option<u64> {
        function.is_instruction(value).then_some(1)
    }

    fn loop_iterations(&self, _function: &Function, _lp: &LoopStructure) -> Option<u64> {
        Some(1)
    }

    fn loop_invocations(&self, _function: &Function, _lp: &LoopStructure) -> Option<u64> {
        Some(1)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Counts recorded per value and per loop header
#[derive(Debug, Clone, Default)]
pub struct RecordedProfile {
    pub instructions: FxHashMap<ValueId, u64>,
    pub iterations: FxHashMap<u32, u64>,
    pub invocations: FxHashMap<u32, u64>,
}

impl RecordedProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruction(mut self, value: ValueId, executions: u64) -> Self {
        self.instructions.insert(value, executions);
        self
    }

    /// Counts for the loop whose header block is `header`
    pub fn with_loop(mut self, header: u32, invocations: u64, iterations: u64) -> Self {
        self.invocations.insert(header, invocations);
        self.iterations.insert(header, iterations);
        self
    }
}

impl ProfileOracle for RecordedProfile {
    fn instruction_executions(&self, _function: &Function, value: ValueId) -> Option<u64> {
        self.instructions.get(&value).copied()
    }

    fn loop_iterations(&self, _function: &Function, lp: &LoopStructure) -> Option<u64> {
        self.iterations.get(&lp.header.0).copied()
    }

    fn loop_invocations(&self, _function: &Function, lp: &LoopStructure) -> Option<u64> {
        self.invocations.get(&lp.header.0).copied()
    }
}
