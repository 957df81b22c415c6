//! SCC classifier feature
//!
//! Labels every SCC of a loop SCCDAG (independent, commutative, sequential),
//! finds induction variables and the loop environment.
//!
//! # Architecture (Hexagonal)
//!
//! ```text
//! domain/         SccType, SccAttrs, InductionVariable, LoopGoverningIvAttribution
//!      ↓
//! ports/          ScalarEvolution
//!      ↑
//! infrastructure/ SccDagAttrs, LoopEnvironment, InductionVariableManager,
//!                 LoopInvariance, StructuralScalarEvolution, LoopCarriedVariable
//! ```

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{
    InductionVariable, IvOperand, LoopGoverningIvAttribution, SccAttrs, SccType, ScevShape,
    SimpleIvInfo, StepValue,
};
pub use infrastructure::{
    ClassifierInput, InductionVariableManager, LoopCarriedVariable, LoopEnvironment,
    LoopInvariance, SccDagAttrs, StructuralScalarEvolution,
};
pub use ports::ScalarEvolution;
