//! Configuration I/O (YAML schema types)

use super::stage_configs::{ClassifierConfig, PartitionConfig, TechniqueConfig, Verbosity};
use serde::{Deserialize, Serialize};

/// YAML Schema v1
///
/// `version` is optional at the serde level so that a missing version can be
/// reported as `ConfigError::MissingVersion` instead of a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub techniques: Option<TechniqueConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_functions: Option<bool>,
}
