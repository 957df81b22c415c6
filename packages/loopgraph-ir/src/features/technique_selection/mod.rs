//! Technique selection feature
//!
//! Decides how a loop can run in parallel (DOALL, HELIX or DSWP), with a
//! named reason for every rejection, and which loops are worth it.
//!
//! # Architecture (Hexagonal)
//!
//! ```text
//! application/    select_technique (DOALL, then HELIX, then DSWP)
//!      ↓
//! domain/         Technique, Legality, DisqualifyingReason, plans, SequentialSegment
//!      ↑
//! ports/          ProfileOracle
//!      ↑
//! infrastructure/ DoallSelector, DswpSelector, HelixSelector, LoopSelector,
//!                 IterationReachability, LoopWeights, StaticProfile
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::select_technique;
pub use domain::{
    DisqualifyingReason, DoallPlan, DswpPlan, HelixPlan, Legality, SequentialSegment, Stage,
    Technique, TechniqueDecision, TechniqueVerdict,
};
pub use infrastructure::{
    DoallSelector, DswpSelector, HelixSelector, LoopCandidate, LoopSelector, LoopWeights,
    RecordedProfile, SelectionContext, StaticProfile,
};
pub use ports::ProfileOracle;
