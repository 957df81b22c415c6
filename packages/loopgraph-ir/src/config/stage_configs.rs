//! Stage-specific configuration types
//!
//! Each analysis stage has its own configuration struct with validation and
//! builder-style setters.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};

// ============================================================================
// Shared enums
// ============================================================================

/// Whether control dependences count as cycles when deciding SCC independence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlEdgePolicy {
    /// Only data dependences can make an SCC non-independent
    IgnoreControl,
    /// Every dependence counts (legacy behavior)
    IncludeControl,
}

impl ControlEdgePolicy {
    pub fn includes_control(&self) -> bool {
        matches!(self, ControlEdgePolicy::IncludeControl)
    }
}

impl Default for ControlEdgePolicy {
    fn default() -> Self {
        ControlEdgePolicy::IgnoreControl
    }
}

/// How much detail is logged about rejected loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Disabled,
    Minimal,
    Maximal,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Minimal
    }
}

// ============================================================================
// SCC classification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub independence_control_policy: ControlEdgePolicy,
}

impl ClassifierConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Conservative => Self {
                independence_control_policy: ControlEdgePolicy::IncludeControl,
            },
            Preset::Balanced | Preset::Aggressive | Preset::Custom => Self {
                independence_control_policy: ControlEdgePolicy::IgnoreControl,
            },
        }
    }

    pub fn independence_control_policy(mut self, policy: ControlEdgePolicy) -> Self {
        self.independence_control_policy = policy;
        self
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for ClassifierConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "ClassifierConfig"
    }
}

// ============================================================================
// Partitioning
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Upper bound on pipeline stages (1..=1024)
    pub max_stages: usize,

    /// Merge cheap neighbouring subsets until `max_stages` holds
    pub enable_cost_balancing: bool,
}

impl PartitionConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let cores = num_cpus::get().clamp(1, 1024);
        match preset {
            Preset::Conservative | Preset::Balanced | Preset::Custom => Self {
                max_stages: cores,
                enable_cost_balancing: true,
            },
            Preset::Aggressive => Self {
                max_stages: 1024,
                enable_cost_balancing: false,
            },
        }
    }

    pub fn max_stages(mut self, value: usize) -> Self {
        self.max_stages = value;
        self
    }

    pub fn enable_cost_balancing(mut self, value: bool) -> Self {
        self.enable_cost_balancing = value;
        self
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for PartitionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_stages == 0 || self.max_stages > 1024 {
            return Err(ConfigError::range_with_hint(
                "max_stages",
                self.max_stages,
                1,
                1024,
                "A pipeline needs at least one stage",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "PartitionConfig"
    }
}

// ============================================================================
// Technique selection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechniqueConfig {
    pub enable_doall: bool,
    pub enable_dswp: bool,
    pub enable_helix: bool,

    /// Skip the profitability heuristics of DSWP and HELIX
    pub force_parallelization: bool,

    /// Cores handed to the generated code (1..=1024)
    pub max_cores: usize,

    /// Iterations per DOALL chunk (1..=65536)
    pub doall_chunk_size: usize,

    /// Reject pipelines whose biggest SCC covers at least this share (0.0..=1.0)
    pub max_biggest_scc_coverage: f64,

    /// Loops with fewer instructions per iteration need extra justification
    pub min_average_instructions: f64,

    /// DSWP needs at least this sequential share on small loops (0.0..=1.0)
    pub dswp_min_sequential_fraction: f64,

    /// HELIX rejects small loops at or above this sequential share (0.0..=1.0)
    pub helix_max_sequential_fraction: f64,

    /// Minimum share of total time a loop must save to be selected (0.0..=1.0)
    pub min_time_saved_fraction: f64,
}

impl TechniqueConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let cores = num_cpus::get().clamp(1, 1024);
        let balanced = Self {
            enable_doall: true,
            enable_dswp: true,
            enable_helix: true,
            force_parallelization: false,
            max_cores: cores,
            doall_chunk_size: 8,
            max_biggest_scc_coverage: 0.8,
            min_average_instructions: 20.0,
            dswp_min_sequential_fraction: 0.5,
            helix_max_sequential_fraction: 0.2,
            min_time_saved_fraction: 0.02,
        };
        match preset {
            Preset::Conservative => Self {
                enable_dswp: false,
                enable_helix: false,
                min_time_saved_fraction: 0.05,
                ..balanced
            },
            Preset::Balanced | Preset::Custom => balanced,
            Preset::Aggressive => Self {
                force_parallelization: true,
                doall_chunk_size: 1,
                min_time_saved_fraction: 0.0,
                ..balanced
            },
        }
    }

    pub fn enable_doall(mut self, value: bool) -> Self {
        self.enable_doall = value;
        self
    }

    pub fn enable_dswp(mut self, value: bool) -> Self {
        self.enable_dswp = value;
        self
    }

    pub fn enable_helix(mut self, value: bool) -> Self {
        self.enable_helix = value;
        self
    }

    pub fn force_parallelization(mut self, value: bool) -> Self {
        self.force_parallelization = value;
        self
    }

    pub fn max_cores(mut self, value: usize) -> Self {
        self.max_cores = value;
        self
    }

    pub fn doall_chunk_size(mut self, value: usize) -> Self {
        self.doall_chunk_size = value;
        self
    }

    pub fn max_biggest_scc_coverage(mut self, value: f64) -> Self {
        self.max_biggest_scc_coverage = value;
        self
    }

    pub fn min_average_instructions(mut self, value: f64) -> Self {
        self.min_average_instructions = value;
        self
    }

    pub fn min_time_saved_fraction(mut self, value: f64) -> Self {
        self.min_time_saved_fraction = value;
        self
    }
}

impl Default for TechniqueConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

fn check_fraction(field: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::range_with_hint(
            field,
            value,
            0.0,
            1.0,
            "Fractions are expressed between 0.0 and 1.0",
        ));
    }
    Ok(())
}

impl Validatable for TechniqueConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_cores == 0 || self.max_cores > 1024 {
            return Err(ConfigError::range_with_hint(
                "max_cores",
                self.max_cores,
                1,
                1024,
                "At least one core is required",
            ));
        }
        if self.doall_chunk_size == 0 || self.doall_chunk_size > 65536 {
            return Err(ConfigError::range_with_hint(
                "doall_chunk_size",
                self.doall_chunk_size,
                1,
                65536,
                "Chunks must contain at least one iteration",
            ));
        }
        if !(self.min_average_instructions >= 0.0) {
            return Err(ConfigError::range_with_hint(
                "min_average_instructions",
                self.min_average_instructions,
                0.0,
                f64::MAX,
                "Instruction counts cannot be negative",
            ));
        }
        check_fraction("max_biggest_scc_coverage", self.max_biggest_scc_coverage)?;
        check_fraction("dswp_min_sequential_fraction", self.dswp_min_sequential_fraction)?;
        check_fraction("helix_max_sequential_fraction", self.helix_max_sequential_fraction)?;
        check_fraction("min_time_saved_fraction", self.min_time_saved_fraction)?;
        if !self.enable_doall && !self.enable_dswp && !self.enable_helix {
            return Err(ConfigError::Conflict {
                issue: "every parallelization technique is disabled".to_string(),
                fix: "enable at least one of enable_doall, enable_dswp, enable_helix".to_string(),
            });
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "TechniqueConfig"
    }
}
