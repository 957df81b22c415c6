//! Partition Application Layer
//!
//! `Partitioner::partition_loop()` builds the stage partition of one loop:
//! one subset per non-clonable SCC, then memory-sync merges, cycle merges
//! and (optionally) cost balancing.

use crate::config::PartitionConfig;
use crate::errors::Result;
use crate::features::partition::infrastructure::{PartitionCostAnalysis, SccDagPartition};
use crate::features::scc_classifier::infrastructure::SccDagAttrs;
use crate::features::scc_dag::infrastructure::SccDag;
use crate::features::technique_selection::ports::ProfileOracle;
use crate::shared::models::Function;
use tracing::info;

pub struct Partitioner<'a> {
    config: &'a PartitionConfig,
}

impl<'a> Partitioner<'a> {
    pub fn new(config: &'a PartitionConfig) -> Self {
        Self { config }
    }

    pub fn partition_loop(
        &self,
        function: &Function,
        sccdag: &SccDag,
        attrs: &SccDagAttrs,
        profile: &dyn ProfileOracle,
    ) -> Result<SccDagPartition> {
        let mut partition = SccDagPartition::new(sccdag);
        for (id, _) in sccdag.internal_sccs() {
            if attrs.is_clonable(id) {
                continue;
            }
            partition.create_subset([id])?;
        }
        let initial = partition.number_of_subsets();

        partition.merge_subsets_requiring_mem_sync()?;
        partition.merge_subsets_forming_cycles()?;

        let mut balanced = 0;
        if self.config.enable_cost_balancing {
            let costs = PartitionCostAnalysis::new(function, sccdag, profile);
            balanced = costs.balance(&mut partition, self.config.max_stages)?;
        }

        info!(
            function = function.name(),
            initial,
            subsets = partition.number_of_subsets(),
            balanced,
            "loop partitioned"
        );
        Ok(partition)
    }
}
