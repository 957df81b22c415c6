//! Partition infrastructure

pub mod cost;
pub mod partition;

pub use cost::PartitionCostAnalysis;
pub use partition::SccDagPartition;
