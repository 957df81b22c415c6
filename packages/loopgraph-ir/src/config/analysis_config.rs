//! Top-level analysis configuration
//!
//! `AnalysisConfig` is built once (preset, setters, or YAML), validated, and
//! then passed by shared reference to every stage. Nothing mutates it after
//! construction.

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides};
use super::preset::Preset;
use super::stage_configs::{ClassifierConfig, PartitionConfig, TechniqueConfig, Verbosity};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub preset: Preset,
    pub classifier: ClassifierConfig,
    pub partition: PartitionConfig,
    pub techniques: TechniqueConfig,
    pub verbosity: Verbosity,
    /// Analyze independent functions on the rayon pool
    pub parallel_functions: bool,
}

impl AnalysisConfig {
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            classifier: ClassifierConfig::from_preset(preset),
            partition: PartitionConfig::from_preset(preset),
            techniques: TechniqueConfig::from_preset(preset),
            verbosity: Verbosity::default(),
            parallel_functions: true,
        }
    }

    pub fn classifier(mut self, f: impl FnOnce(ClassifierConfig) -> ClassifierConfig) -> Self {
        self.classifier = f(self.classifier);
        self
    }

    pub fn partition(mut self, f: impl FnOnce(PartitionConfig) -> PartitionConfig) -> Self {
        self.partition = f(self.partition);
        self
    }

    pub fn techniques(mut self, f: impl FnOnce(TechniqueConfig) -> TechniqueConfig) -> Self {
        self.techniques = f(self.techniques);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn parallel_functions(mut self, enabled: bool) -> Self {
        self.parallel_functions = enabled;
        self
    }

    /// Validate every stage config
    pub fn build(self) -> ConfigResult<Self> {
        self.classifier.validate()?;
        self.partition.validate()?;
        self.techniques.validate()?;
        Ok(self)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(1) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![1],
                })
            }
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;
        let mut config = Self::preset(preset);

        if let Some(overrides) = export.overrides {
            if let Some(classifier) = overrides.classifier {
                config.classifier = classifier;
            }
            if let Some(partition) = overrides.partition {
                config.partition = partition;
            }
            if let Some(techniques) = overrides.techniques {
                config.techniques = techniques;
            }
            if let Some(verbosity) = overrides.verbosity {
                config.verbosity = verbosity;
            }
            if let Some(parallel) = overrides.parallel_functions {
                config.parallel_functions = parallel;
            }
        }

        config.build()
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                classifier: Some(self.classifier.clone()),
                partition: Some(self.partition.clone()),
                techniques: Some(self.techniques.clone()),
                verbosity: Some(self.verbosity),
                parallel_functions: Some(self.parallel_functions),
            }),
        };
        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}
