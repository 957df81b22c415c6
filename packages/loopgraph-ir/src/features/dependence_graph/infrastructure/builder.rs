//! Function-level dependence graph construction
//!
//! One node per argument and instruction, then:
//! 1. variable edges from def-use chains (one per register use)
//! 2. control edges from post-dominance
//! 3. memory edges from the alias collaborator

use super::control_dependence::add_control_dependences;
use super::graph::DependenceGraph;
use crate::errors::{LoopgraphError, Result};
use crate::features::dependence_graph::domain::{DataDependenceType, DependenceEdge, DependenceKind};
use crate::features::dependence_graph::ports::{AliasOracle, AliasVerdict};
use crate::shared::models::{DominatorSummary, Function, Instruction};
use tracing::{debug, info};

/// Builder for function dependence graphs
pub struct DependenceGraphBuilder<'a> {
    alias: Option<&'a dyn AliasOracle>,
}

impl<'a> DependenceGraphBuilder<'a> {
    pub fn new() -> Self {
        Self { alias: None }
    }

    pub fn with_alias_oracle(mut self, alias: &'a dyn AliasOracle) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn build(&self, function: &Function, doms: &DominatorSummary) -> Result<DependenceGraph> {
        if function.num_blocks() == 0 {
            return Err(LoopgraphError::malformed(format!(
                "function '{}' has no blocks",
                function.name()
            )));
        }
        if function.first_instruction(function.entry_block()).is_none() {
            return Err(LoopgraphError::malformed(format!(
                "function '{}': entry instruction cannot be resolved",
                function.name()
            )));
        }

        let memory: Vec<&Instruction> = function
            .instructions()
            .filter(|i| i.accesses_memory())
            .collect();
        if !memory.is_empty() && self.alias.is_none() {
            return Err(LoopgraphError::malformed(format!(
                "function '{}' accesses memory but no alias oracle was supplied",
                function.name()
            )));
        }

        let mut dg = DependenceGraph::new();
        for arg in function.arguments() {
            dg.add_node(arg.id, true);
        }
        for inst in function.instructions() {
            dg.add_node(inst.id, true);
        }

        self.add_variable_dependences(function, &mut dg);
        add_control_dependences(function, doms, &mut dg);
        if let Some(alias) = self.alias {
            Self::add_memory_dependences(function, alias, &memory, &mut dg);
        }

        let stats = dg.stats();
        info!(
            function = function.name(),
            nodes = dg.num_nodes(),
            variable = stats.variable_edges,
            control = stats.control_edges,
            memory = stats.must_memory_edges + stats.may_memory_edges,
            "dependence graph built"
        );
        Ok(dg)
    }

    fn add_variable_dependences(&self, function: &Function, dg: &mut DependenceGraph) {
        for inst in function.instructions() {
            for used in inst.value_operands() {
                dg.add_edge(DependenceEdge::variable(used, inst.id));
            }
        }
    }

    fn add_memory_dependences(
        function: &Function,
        alias: &dyn AliasOracle,
        memory: &[&Instruction],
        dg: &mut DependenceGraph,
    ) {
        let mut count = 0usize;
        for src in memory {
            for dst in memory {
                let src_writes = src.may_write_memory();
                let dst_writes = dst.may_write_memory();
                if !src_writes && !dst_writes {
                    continue;
                }
                if src.id == dst.id && !src_writes {
                    continue;
                }

                let kind = match alias.alias(function, src.id, dst.id) {
                    AliasVerdict::NoAlias => continue,
                    AliasVerdict::MayAlias => DependenceKind::MayMemory,
                    AliasVerdict::MustAlias => DependenceKind::MustMemory,
                };
                let data_type = if src_writes && dst_writes {
                    DataDependenceType::Waw
                } else if src_writes {
                    DataDependenceType::Raw
                } else {
                    DataDependenceType::War
                };
                dg.add_edge(DependenceEdge::new(src.id, dst.id, kind, data_type));
                count += 1;
            }
        }
        debug!(function = function.name(), edges = count, "memory dependences added");
    }
}

impl Default for DependenceGraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
