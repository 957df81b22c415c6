//! Dependence graph feature
//!
//! Program and loop dependence graphs over function values.
//!
//! # Architecture (Hexagonal)
//!
//! ```text
//! application/   build_function_dependence_graph, build_loop_dependence_graph
//!      ↓
//! domain/        DependenceEdge, DependenceKind, EdgeKey
//!      ↓
//! ports/         AliasOracle, IterationDomainOracle
//!      ↑
//! infrastructure/ DependenceGraph, builder, control dependence, loop-carried marking
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{
    build_function_dependence_graph, build_loop_dependence_graph, LoopDependenceInput,
};
pub use domain::{
    DataDependenceType, DependenceEdge, DependenceKind, DependenceNode, DependenceStats, EdgeKey,
};
pub use infrastructure::{
    CommutativeAnnotation, CommutativityAnnotations, ConservativeAliasOracle, DependenceGraph,
    DependenceGraphBuilder, NoIterationDomain,
};
pub use ports::{AliasOracle, AliasVerdict, IterationDomainOracle};
