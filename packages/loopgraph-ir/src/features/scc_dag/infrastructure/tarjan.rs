//! Strongly Connected Component Detection
//!
//! Tarjan's algorithm over every edge of a dependence graph. The DFS is
//! iterative so long dependence chains cannot exhaust the stack.
//!
//! Output is deterministic:
//! - roots are tried in node insertion order
//! - successors are followed in edge insertion order
//! - members are sorted by insertion order, components by their first member
//!
//! # References
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)

use crate::features::dependence_graph::infrastructure::DependenceGraph;
use crate::shared::models::ValueId;
use rustc_hash::FxHashMap;
use std::cmp::min;

/// Components of `dg`, each a list of values
pub fn strongly_connected_components(dg: &DependenceGraph) -> Vec<Vec<ValueId>> {
    let order: Vec<ValueId> = dg.values().collect();
    let position: FxHashMap<ValueId, usize> =
        order.iter().enumerate().map(|(i, v)| (*v, i)).collect();

    let adj: Vec<Vec<usize>> = order
        .iter()
        .map(|v| {
            dg.outgoing_edges(*v)
                .into_iter()
                .filter_map(|(_, e)| position.get(&e.dst).copied())
                .collect()
        })
        .collect();

    let mut state = TarjanState::new(order.len());
    for node in 0..order.len() {
        if state.index[node].is_none() {
            state.strong_connect(node, &adj);
        }
    }

    let mut components = state.sccs;
    for component in &mut components {
        component.sort_unstable();
    }
    components.sort_by_key(|c| c.first().copied());

    components
        .into_iter()
        .map(|c| c.into_iter().map(|i| order[i]).collect())
        .collect()
}

struct TarjanState {
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    current_index: usize,
    sccs: Vec<Vec<usize>>,
}

impl TarjanState {
    fn new(nodes: usize) -> Self {
        Self {
            index: vec![None; nodes],
            lowlink: vec![0; nodes],
            on_stack: vec![false; nodes],
            stack: Vec::new(),
            current_index: 0,
            sccs: Vec::new(),
        }
    }

    fn open(&mut self, v: usize) {
        self.index[v] = Some(self.current_index);
        self.lowlink[v] = self.current_index;
        self.current_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn strong_connect(&mut self, root: usize, adj: &[Vec<usize>]) {
        self.open(root);
        // (node, next successor to look at)
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = frames.last_mut() {
            let (v, cursor) = *frame;
            if let Some(&w) = adj[v].get(cursor) {
                frame.1 += 1;
                match self.index[w] {
                    None => {
                        self.open(w);
                        frames.push((w, 0));
                    }
                    Some(w_index) if self.on_stack[w] => {
                        self.lowlink[v] = min(self.lowlink[v], w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                self.lowlink[parent] = min(self.lowlink[parent], self.lowlink[v]);
            }

            if self.index[v] == Some(self.lowlink[v]) {
                let mut scc = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                self.sccs.push(scc);
            }
        }
    }
}
