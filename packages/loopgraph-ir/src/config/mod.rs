//! Configuration system
//!
//! Three levels, from simplest to most complete:
//! - Preset: `AnalysisConfig::preset(Preset::Balanced)`
//! - Stage override: `.techniques(|t| t.doall_chunk_size(16))`
//! - YAML: `AnalysisConfig::from_yaml("loopgraph.yaml")`
//!
//! # Examples
//!
//! ```rust,ignore
//! use loopgraph_ir::config::{AnalysisConfig, Preset};
//!
//! let config = AnalysisConfig::preset(Preset::Balanced)
//!     .partition(|p| p.max_stages(4))
//!     .build()?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod stage_configs;
pub mod validation;

pub use analysis_config::AnalysisConfig;
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use stage_configs::{
    ClassifierConfig, ControlEdgePolicy, PartitionConfig, TechniqueConfig, Verbosity,
};
pub use validation::Validatable;
