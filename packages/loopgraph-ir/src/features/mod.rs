//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure analysis types (no external dependencies)
//! - ports/      - Collaborator interfaces (traits)
//! - application/ - Use cases
//! - infrastructure/ - Algorithms and default collaborators
//!
//! Stages run in this order, each reading the previous one's output:
//! dependence_graph → scc_dag → scc_classifier → partition → technique_selection

pub mod dependence_graph;
pub mod partition;
pub mod scc_classifier;
pub mod scc_dag;
pub mod technique_selection;
