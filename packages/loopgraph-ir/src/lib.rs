/*
 * Loopgraph IR - Loop Parallelization Planning Core
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : IR model (values, blocks, CFG, dominators, loops)
 * - features/    : Vertical slices (dependence graph → SCCDAG → classifier → partition → technique)
 * - pipeline/    : Orchestration and the parallelization plan
 * - config/      : Presets, stage configs, YAML
 *
 * Performance:
 * - Functions analyzed independently on the rayon pool
 * - petgraph-backed dependence graphs
 */

#![allow(clippy::too_many_arguments)] // Analysis entry points take every collaborator
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::unnecessary_map_or)] // map_or style for compatibility
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules (analysis stages)
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisConfig, Preset};
pub use errors::{LoopgraphError, Result};
pub use pipeline::{analyze_function, analyze_functions, Collaborators, ParallelizationPlan};
