//! Partition feature
//!
//! Groups the SCCs of a loop into acyclic subsets (pipeline stages).
//!
//! # Architecture (Hexagonal)
//!
//! ```text
//! application/    Partitioner::partition_loop
//!      ↓
//! domain/         SubsetId, Subset
//!      ↑
//! infrastructure/ SccDagPartition (merges, depth order), PartitionCostAnalysis
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::Partitioner;
pub use domain::{Subset, SubsetId};
pub use infrastructure::{PartitionCostAnalysis, SccDagPartition};
