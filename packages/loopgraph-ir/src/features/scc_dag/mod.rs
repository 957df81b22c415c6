//! SCC condensation feature
//!
//! Collapses a loop dependence graph into its strongly connected components.
//! The resulting DAG orders the components and keeps, on every summary
//! edge, the instruction-level dependences it summarizes.
//!
//! # Usage
//!
//! ```ignore
//! let sccdag = SccDag::new(&loop_internal_dg);
//! let iv = sccdag.scc_of_value(phi);
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::{SccId, SummaryEdge};
pub use infrastructure::{strongly_connected_components, Scc, SccDag};
