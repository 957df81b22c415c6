//! Common test utilities for loopgraph-ir
//!
//! Shared IR builders, fixtures and assertions for the integration and
//! property tests. Every test crate pulls in the whole module, so some
//! helpers go unused in some crates.

#![allow(dead_code)]

mod fixtures;
mod assertions;
mod builders;

// Re-export all utilities
pub use fixtures::*;
pub use assertions::*;
pub use builders::*;
