// Loading analysis configuration from YAML files and running with it

#[path = "../common/mod.rs"]
mod common;
use common::{pointer_chase_loop, rejection, single_loop};

use loopgraph_ir::config::{ConfigError, ControlEdgePolicy, Verbosity};
use loopgraph_ir::features::technique_selection::{DisqualifyingReason, Technique};
use loopgraph_ir::{analyze_function, AnalysisConfig, Collaborators, Preset};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_conservative_yaml_disables_pipelining() {
    let file = yaml_file("version: 1\npreset: conservative\noverrides:\n  verbosity: disabled\n");
    let config = AnalysisConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.preset, Preset::Conservative);
    assert_eq!(config.verbosity, Verbosity::Disabled);
    assert_eq!(
        config.classifier.independence_control_policy,
        ControlEdgePolicy::IncludeControl
    );

    let (f, _) = pointer_chase_loop("chase", 2);
    let plan = analyze_function(&f, &Collaborators::default(), &config).unwrap();
    let lp = single_loop(&plan);
    assert_eq!(lp.technique, None);
    assert_eq!(lp.verdicts.len(), 1);
    assert!(matches!(
        rejection(lp, Technique::Doall),
        DisqualifyingReason::BlockingScc { .. }
    ));
}

#[test]
fn test_yaml_overrides_apply_on_top_of_preset() {
    let file = yaml_file(
        "version: 1\npreset: balanced\noverrides:\n  partition:\n    max_stages: 3\n  parallel_functions: false\n",
    );
    let config = AnalysisConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.partition.max_stages, 3);
    assert!(config.partition.enable_cost_balancing);
    assert!(!config.parallel_functions);
}

#[test]
fn test_saved_config_reloads_identically() {
    let config = AnalysisConfig::preset(Preset::Aggressive).verbosity(Verbosity::Maximal);
    let file = yaml_file(&config.to_yaml().unwrap());
    assert_eq!(AnalysisConfig::from_yaml(file.path()).unwrap(), config);
}

#[test]
fn test_yaml_errors() {
    let missing = yaml_file("preset: balanced\n");
    assert!(matches!(
        AnalysisConfig::from_yaml(missing.path()),
        Err(ConfigError::MissingVersion)
    ));

    let future = yaml_file("version: 2\npreset: balanced\n");
    assert!(matches!(
        AnalysisConfig::from_yaml(future.path()),
        Err(ConfigError::UnsupportedVersion { found: 2, .. })
    ));

    let unknown = yaml_file("version: 1\npreset: reckless\n");
    assert!(matches!(
        AnalysisConfig::from_yaml(unknown.path()),
        Err(ConfigError::UnknownPreset(_))
    ));

    let out_of_range = yaml_file(
        "version: 1\npreset: balanced\noverrides:\n  partition:\n    max_stages: 0\n",
    );
    assert!(AnalysisConfig::from_yaml(out_of_range.path()).is_err());
}
