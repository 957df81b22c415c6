//! Commutativity annotations sidecar
//!
//! JSON file listing dependences that the front end declared commutative:
//!
//! ```json
//! { "commutative": [ { "function": "main", "src": 12, "dst": 17 } ] }
//! ```
//!
//! Matching loop-internal edges are left out of the SCCDAG input.

use super::graph::DependenceGraph;
use crate::errors::Result;
use crate::features::dependence_graph::domain::EdgeKey;
use crate::shared::models::ValueId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommutativeAnnotation {
    pub function: String,
    pub src: ValueId,
    pub dst: ValueId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SidecarFile {
    #[serde(default)]
    commutative: Vec<CommutativeAnnotation>,
}

/// Loaded once, read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct CommutativityAnnotations {
    by_function: FxHashMap<String, FxHashSet<(ValueId, ValueId)>>,
}

impl CommutativityAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: SidecarFile = serde_json::from_str(json)?;
        Ok(Self::from_annotations(file.commutative))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let annotations = Self::from_json_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            annotations = annotations.len(),
            "commutativity sidecar loaded"
        );
        Ok(annotations)
    }

    pub fn from_annotations(annotations: impl IntoIterator<Item = CommutativeAnnotation>) -> Self {
        let mut by_function: FxHashMap<String, FxHashSet<(ValueId, ValueId)>> = FxHashMap::default();
        for a in annotations {
            by_function.entry(a.function).or_default().insert((a.src, a.dst));
        }
        Self { by_function }
    }

    pub fn len(&self) -> usize {
        self.by_function.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_commutative(&self, function: &str, src: ValueId, dst: ValueId) -> bool {
        self.by_function
            .get(function)
            .map_or(false, |pairs| pairs.contains(&(src, dst)))
    }

    /// Edges of `dg` between internal nodes that the sidecar marks commutative
    pub fn edges_to_ignore(&self, function: &str, dg: &DependenceGraph) -> FxHashSet<EdgeKey> {
        let Some(pairs) = self.by_function.get(function) else {
            return FxHashSet::default();
        };
        dg.edges()
            .filter(|(_, e)| dg.is_internal(e.src) && dg.is_internal(e.dst))
            .filter(|(_, e)| pairs.contains(&(e.src, e.dst)))
            .map(|(_, e)| e.key())
            .collect()
    }
}
