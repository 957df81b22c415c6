//! Pipeline orchestration
//!
//! `analyze_function()` runs every stage on the loops of one function;
//! `analyze_functions()` fans a batch out over the rayon pool.

pub mod analyzer;
pub mod batch;
pub mod loop_content;
pub mod plan;

pub use analyzer::analyze_function;
pub use batch::analyze_functions;
pub use loop_content::{Collaborators, FunctionContext, LoopContent};
pub use plan::{EnvironmentSummary, LoopPlan, ParallelizationPlan, SccSummary};
