//! SCCDAG infrastructure

pub mod scc;
pub mod sccdag;
pub mod tarjan;

pub use scc::Scc;
pub use sccdag::SccDag;
pub use tarjan::strongly_connected_components;
