//! Dependence graph domain types

use crate::shared::models::ValueId;
use serde::{Deserialize, Serialize};

/// Kind of a dependence edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependenceKind {
    /// Control dependence (terminator decides whether the consumer runs)
    Control,
    /// Register (SSA def-use) dependence
    Variable,
    /// Memory dependence on a location both sides certainly access
    MustMemory,
    /// Memory dependence on a location both sides may access
    MayMemory,
}

impl DependenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependenceKind::Control => "CONTROL",
            DependenceKind::Variable => "VARIABLE",
            DependenceKind::MustMemory => "MUST_MEMORY",
            DependenceKind::MayMemory => "MAY_MEMORY",
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, DependenceKind::Control)
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, DependenceKind::MustMemory | DependenceKind::MayMemory)
    }

    /// Variable or memory
    pub fn is_data(&self) -> bool {
        !self.is_control()
    }
}

/// Data hazard carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataDependenceType {
    Raw,
    Waw,
    War,
    None,
}

impl DataDependenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataDependenceType::Raw => "RAW",
            DataDependenceType::Waw => "WAW",
            DataDependenceType::War => "WAR",
            DataDependenceType::None => "NONE",
        }
    }
}

/// Dependence from `src` (producer) to `dst` (consumer)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependenceEdge {
    pub src: ValueId,
    pub dst: ValueId,
    pub kind: DependenceKind,
    pub data_type: DataDependenceType,
    pub loop_carried: bool,
}

impl DependenceEdge {
    pub fn new(src: ValueId, dst: ValueId, kind: DependenceKind, data_type: DataDependenceType) -> Self {
        Self {
            src,
            dst,
            kind,
            data_type,
            loop_carried: false,
        }
    }

    pub fn control(src: ValueId, dst: ValueId) -> Self {
        Self::new(src, dst, DependenceKind::Control, DataDependenceType::None)
    }

    pub fn variable(src: ValueId, dst: ValueId) -> Self {
        Self::new(src, dst, DependenceKind::Variable, DataDependenceType::Raw)
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            src: self.src,
            dst: self.dst,
            kind: self.kind,
        }
    }

    pub fn is_memory(&self) -> bool {
        self.kind.is_memory()
    }

    pub fn is_control(&self) -> bool {
        self.kind.is_control()
    }
}

/// Identity of an edge that survives subgraph extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub src: ValueId,
    pub dst: ValueId,
    pub kind: DependenceKind,
}

/// Node of the dependence graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenceNode {
    pub value: ValueId,
    /// Inside the region of interest (as opposed to a boundary value)
    pub internal: bool,
}

/// Summary counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenceStats {
    pub internal_nodes: usize,
    pub external_nodes: usize,
    pub control_edges: usize,
    pub variable_edges: usize,
    pub must_memory_edges: usize,
    pub may_memory_edges: usize,
    pub loop_carried_edges: usize,
}

impl DependenceStats {
    pub fn total_edges(&self) -> usize {
        self.control_edges + self.variable_edges + self.must_memory_edges + self.may_memory_edges
    }
}
