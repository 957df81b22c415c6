//! Scalar evolution port
//!
//! The classifier asks a collaborator for the shape of each value's
//! evolution and for the step of induction PHIs.

use crate::features::scc_classifier::domain::{ScevShape, StepValue};
use crate::shared::models::{Function, ValueId};

pub trait ScalarEvolution: Send + Sync {
    fn shape(&self, function: &Function, value: ValueId) -> ScevShape;

    /// Step of an add-recurrence PHI, `None` when it cannot be derived
    fn step_recurrence(&self, function: &Function, phi: ValueId) -> Option<StepValue>;
}
