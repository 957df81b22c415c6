//! Built-in memory collaborators

use crate::features::dependence_graph::ports::{AliasOracle, AliasVerdict, IterationDomainOracle};
use crate::shared::models::{Function, LoopStructure, ValueId};

/// Alias oracle that knows nothing: every pair of memory instructions may
/// alias, and an instruction always aliases itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeAliasOracle;

impl AliasOracle for ConservativeAliasOracle {
    fn alias(&self, _function: &Function, src: ValueId, dst: ValueId) -> AliasVerdict {
        if src == dst {
            AliasVerdict::MustAlias
        } else {
            AliasVerdict::MayAlias
        }
    }
}

/// Iteration domain oracle that never attests disjointness
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIterationDomain;

impl IterationDomainOracle for NoIterationDomain {
    fn disjoint_across_iterations(
        &self,
        _function: &Function,
        _lp: &LoopStructure,
        _src: ValueId,
        _dst: ValueId,
    ) -> bool {
        false
    }
}
