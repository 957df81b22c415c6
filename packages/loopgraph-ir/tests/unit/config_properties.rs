//! Property-based tests for the analysis configuration
//!
//! Invariants that should hold for ALL inputs:
//! - Validity: every in-range value validates
//! - Rejection: every out-of-range value is refused with the field named
//! - Roundtrip: from_yaml(to_yaml(x)) == x

use loopgraph_ir::config::*;
use proptest::prelude::*;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn preset_from(idx: u8) -> Preset {
    match idx % 4 {
        0 => Preset::Conservative,
        1 => Preset::Balanced,
        2 => Preset::Aggressive,
        _ => Preset::Custom,
    }
}

// ============================================================================
// QuickCheck Tests
// ============================================================================

#[quickcheck]
fn qc_technique_config_range_invariants(cores: usize, chunk: usize, preset_idx: u8) -> TestResult {
    if cores == 0 || cores > 1024 || chunk == 0 || chunk > 65536 {
        return TestResult::discard();
    }

    let config = TechniqueConfig::from_preset(preset_from(preset_idx))
        .max_cores(cores)
        .doall_chunk_size(chunk);

    TestResult::from_bool(config.validate().is_ok())
}

#[quickcheck]
fn qc_partition_config_range_invariants(stages: usize, balancing: bool) -> TestResult {
    if stages == 0 || stages > 1024 {
        return TestResult::discard();
    }

    let config = PartitionConfig::default()
        .max_stages(stages)
        .enable_cost_balancing(balancing);

    TestResult::from_bool(config.validate().is_ok())
}

#[quickcheck]
fn qc_out_of_range_stages_are_rejected(stages: usize) -> TestResult {
    if (1..=1024).contains(&stages) {
        return TestResult::discard();
    }

    match PartitionConfig::default().max_stages(stages).validate() {
        Err(err) => TestResult::from_bool(err.to_string().contains("max_stages")),
        Ok(()) => TestResult::failed(),
    }
}

#[quickcheck]
fn qc_any_enabled_technique_avoids_conflict(doall: bool, dswp: bool, helix: bool) -> bool {
    let result = TechniqueConfig::default()
        .enable_doall(doall)
        .enable_dswp(dswp)
        .enable_helix(helix)
        .validate();

    match result {
        Ok(()) => doall || dswp || helix,
        Err(ConfigError::Conflict { .. }) => !(doall || dswp || helix),
        Err(_) => false,
    }
}

#[quickcheck]
fn qc_preset_yaml_roundtrip(preset_idx: u8, parallel: bool) -> TestResult {
    let config = AnalysisConfig::preset(preset_from(preset_idx)).parallel_functions(parallel);

    let yaml = match config.to_yaml() {
        Ok(yaml) => yaml,
        Err(_) => return TestResult::failed(),
    };
    match AnalysisConfig::from_yaml_str(&yaml) {
        Ok(recovered) => TestResult::from_bool(recovered == config),
        Err(_) => TestResult::failed(),
    }
}

// ============================================================================
// PropTest Tests (fraction fields)
// ============================================================================

proptest! {
    #[test]
    fn prop_fractions_in_unit_interval_validate(
        coverage in 0.0f64..=1.0,
        time_saved in 0.0f64..=1.0,
        instructions in 0.0f64..1.0e6,
    ) {
        let config = TechniqueConfig::default()
            .max_biggest_scc_coverage(coverage)
            .min_time_saved_fraction(time_saved)
            .min_average_instructions(instructions);
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn prop_fractions_above_one_are_rejected(excess in 1.0e-6f64..1.0e6) {
        let err = TechniqueConfig::default()
            .min_time_saved_fraction(1.0 + excess)
            .validate()
            .unwrap_err();
        prop_assert!(err.to_string().contains("min_time_saved_fraction"));
    }

    #[test]
    fn prop_negative_instruction_floor_is_rejected(floor in -1.0e6f64..-1.0e-9) {
        let err = TechniqueConfig::default()
            .min_average_instructions(floor)
            .validate()
            .unwrap_err();
        prop_assert!(err.to_string().contains("min_average_instructions"));
    }

    #[test]
    fn prop_yaml_overrides_survive_roundtrip(stages in 1usize..=1024, chunk in 1usize..=65536) {
        let config = AnalysisConfig::default()
            .partition(|p| p.max_stages(stages))
            .techniques(|t| t.doall_chunk_size(chunk));
        let recovered = AnalysisConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        prop_assert_eq!(recovered.partition.max_stages, stages);
        prop_assert_eq!(recovered.techniques.doall_chunk_size, chunk);
    }
}
