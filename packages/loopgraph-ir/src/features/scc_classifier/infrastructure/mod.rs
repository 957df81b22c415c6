//! SCC classifier infrastructure

pub mod classifier;
pub mod environment;
pub mod induction_variables;
pub mod invariance;
pub mod scev;
pub mod variable;

pub use classifier::{ClassifierInput, SccDagAttrs};
pub use environment::LoopEnvironment;
pub use induction_variables::InductionVariableManager;
pub use invariance::LoopInvariance;
pub use scev::StructuralScalarEvolution;
pub use variable::{LoopCarriedVariable, UpdateKind, VariableUpdate};
