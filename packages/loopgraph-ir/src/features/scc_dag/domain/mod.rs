//! SCCDAG domain types

use crate::features::dependence_graph::domain::DependenceEdge;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense SCC index, valid until the next merge
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SccId(pub u32);

impl SccId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SccId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scc{}", self.0)
    }
}

/// Dependence between two SCCs, with the instruction-level edges it stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEdge {
    pub src: SccId,
    pub dst: SccId,
    pub sub_edges: Vec<DependenceEdge>,
}

impl SummaryEdge {
    pub fn new(src: SccId, dst: SccId) -> Self {
        Self {
            src,
            dst,
            sub_edges: Vec::new(),
        }
    }

    pub fn has_memory_dependence(&self) -> bool {
        self.sub_edges.iter().any(|e| e.is_memory())
    }

    pub fn has_data_dependence(&self) -> bool {
        self.sub_edges.iter().any(|e| e.kind.is_data())
    }

    pub fn has_loop_carried_dependence(&self) -> bool {
        self.sub_edges.iter().any(|e| e.loop_carried)
    }

    pub fn is_control_only(&self) -> bool {
        self.sub_edges.iter().all(|e| e.is_control())
    }
}
