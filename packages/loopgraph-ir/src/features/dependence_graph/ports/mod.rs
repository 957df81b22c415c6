//! Dependence graph ports
//!
//! Memory disambiguation is delegated to collaborators behind these traits.
//! Implementations must be `Send + Sync` so functions can be analyzed on the
//! rayon pool.

use crate::shared::models::{Function, LoopStructure, ValueId};
use serde::{Deserialize, Serialize};

/// Answer of an alias query between two memory instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasVerdict {
    NoAlias,
    MayAlias,
    MustAlias,
}

/// Memory alias collaborator
pub trait AliasOracle: Send + Sync {
    /// Can `src` and `dst` touch the same location?
    fn alias(&self, function: &Function, src: ValueId, dst: ValueId) -> AliasVerdict;
}

/// Loop-aware memory disambiguation (iteration domain analysis)
pub trait IterationDomainOracle: Send + Sync {
    /// `true` when `src` in one iteration and `dst` in a later iteration of
    /// `lp` are proven to access disjoint locations.
    fn disjoint_across_iterations(
        &self,
        function: &Function,
        lp: &LoopStructure,
        src: ValueId,
        dst: ValueId,
    ) -> bool;
}
