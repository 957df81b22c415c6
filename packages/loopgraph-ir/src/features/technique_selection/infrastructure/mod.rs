//! Technique selection infrastructure

pub mod context;
pub mod doall;
pub mod dswp;
pub mod helix;
pub mod loop_selector;
pub mod profile;
pub mod reachability;
pub mod weights;

pub use context::SelectionContext;
pub use doall::DoallSelector;
pub use dswp::DswpSelector;
pub use helix::HelixSelector;
pub use loop_selector::{LoopCandidate, LoopSelector};
pub use profile::{RecordedProfile, StaticProfile};
pub use reachability::IterationReachability;
pub use weights::LoopWeights;
