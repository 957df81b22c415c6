//! Partition domain types

use crate::features::scc_dag::domain::SccId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Subset handle; merged subsets always get a fresh one
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SubsetId(pub u32);

impl fmt::Display for SubsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subset{}", self.0)
    }
}

/// SCCs executed together as one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subset {
    pub id: SubsetId,
    pub sccs: BTreeSet<SccId>,
}

impl Subset {
    pub fn new(id: SubsetId, sccs: BTreeSet<SccId>) -> Self {
        Self { id, sccs }
    }

    pub fn contains(&self, scc: SccId) -> bool {
        self.sccs.contains(&scc)
    }

    pub fn len(&self) -> usize {
        self.sccs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sccs.is_empty()
    }
}
