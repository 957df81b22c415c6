//! Dependence graph infrastructure

pub mod annotations;
pub mod builder;
pub mod control_dependence;
pub mod graph;
pub mod loop_carried;
pub mod oracles;

pub use annotations::{CommutativeAnnotation, CommutativityAnnotations};
pub use builder::DependenceGraphBuilder;
pub use control_dependence::add_control_dependences;
pub use graph::{DependenceGraph, DependenceGraphDto};
pub use loop_carried::{
    can_block_reach_header_before_other, can_precede_in_iteration, mark_loop_carried_dependences,
    refine_with_iteration_domain,
};
pub use oracles::{ConservativeAliasOracle, NoIterationDomain};
