//! Technique selection domain types

use crate::features::partition::domain::SubsetId;
use crate::features::scc_classifier::domain::LoopGoverningIvAttribution;
use crate::features::scc_dag::domain::SccId;
use crate::shared::models::ValueId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Technique {
    Doall,
    Dswp,
    Helix,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Doall => "DOALL",
            Technique::Dswp => "DSWP",
            Technique::Helix => "HELIX",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a technique cannot be applied to a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DisqualifyingReason {
    // DOALL
    MoreThanOneExitBlock,
    LiveOutNotReducible { value: ValueId },
    BlockingScc { scc: SccId },
    NoGoverningInductionVariable,
    NonInvariantInductionStep,
    ExitConditionNotInvariant,

    // DSWP and HELIX
    NoExitBlock,
    HasInvoke,
    NoSequentialScc,
    UnbalancedPipeline,
    NotWorthPipelining,
    InconsistentSegmentFrontier { segment: usize },
    TooSynchronized,
}

impl DisqualifyingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisqualifyingReason::MoreThanOneExitBlock => "the loop does not have exactly one exit block",
            DisqualifyingReason::LiveOutNotReducible { .. } => "a live-out value is not reducible",
            DisqualifyingReason::BlockingScc { .. } => "an SCC carries a dependence across iterations",
            DisqualifyingReason::NoGoverningInductionVariable => "no induction variable governs the loop exit",
            DisqualifyingReason::NonInvariantInductionStep => "an induction variable step is not loop invariant",
            DisqualifyingReason::ExitConditionNotInvariant => "the exit condition value is not loop invariant",
            DisqualifyingReason::NoExitBlock => "the loop has no exit block",
            DisqualifyingReason::HasInvoke => "the loop contains an invoke",
            DisqualifyingReason::NoSequentialScc => "no sequential SCC to pipeline",
            DisqualifyingReason::UnbalancedPipeline => "the biggest SCC dominates the loop",
            DisqualifyingReason::NotWorthPipelining => "too little work per iteration to pipeline",
            DisqualifyingReason::InconsistentSegmentFrontier { .. } => "a sequential segment has no entry or no exit",
            DisqualifyingReason::TooSynchronized => "too much of a small loop is sequential",
        }
    }
}

impl fmt::Display for DisqualifyingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisqualifyingReason::LiveOutNotReducible { value } => {
                write!(f, "{} ({})", self.as_str(), value)
            }
            DisqualifyingReason::BlockingScc { scc } => write!(f, "{} ({})", self.as_str(), scc),
            DisqualifyingReason::InconsistentSegmentFrontier { segment } => {
                write!(f, "{} (segment {})", self.as_str(), segment)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Legality {
    Legal,
    Illegal(DisqualifyingReason),
}

impl Legality {
    pub fn is_legal(&self) -> bool {
        matches!(self, Legality::Legal)
    }

    pub fn reason(&self) -> Option<DisqualifyingReason> {
        match self {
            Legality::Legal => None,
            Legality::Illegal(reason) => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoallPlan {
    pub cores: usize,
    pub chunk_size: usize,
    pub governing_iv: LoopGoverningIvAttribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub subset: SubsetId,
    pub depth: usize,
    pub sccs: Vec<SccId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DswpPlan {
    pub stages: Vec<Stage>,
    /// Recomputed by every stage that needs them
    pub clonable_sccs: Vec<SccId>,
}

/// Span of a HELIX iteration that runs in iteration order across cores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialSegment {
    pub id: usize,
    pub subset: SubsetId,
    pub sccs: Vec<SccId>,
    pub instructions: Vec<ValueId>,
    /// Wait points: the segment starts right before each of them
    pub entries: Vec<ValueId>,
    /// Signal points: the segment ends right after each of them
    pub exits: Vec<ValueId>,
}

impl SequentialSegment {
    pub fn has_consistent_frontier(&self) -> bool {
        !self.entries.is_empty() && !self.exits.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelixPlan {
    pub cores: usize,
    pub stages: Vec<Stage>,
    pub segments: Vec<SequentialSegment>,
}

/// Outcome of one technique's legality check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueVerdict {
    pub technique: Technique,
    pub legality: Legality,
}

/// Technique chosen for a loop, with the verdicts that led there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueDecision {
    pub chosen: Option<Technique>,
    pub verdicts: Vec<TechniqueVerdict>,
    pub doall: Option<DoallPlan>,
    pub dswp: Option<DswpPlan>,
    pub helix: Option<HelixPlan>,
}

impl TechniqueDecision {
    pub fn verdict(&self, technique: Technique) -> Option<Legality> {
        self.verdicts
            .iter()
            .find(|v| v.technique == technique)
            .map(|v| v.legality)
    }
}
