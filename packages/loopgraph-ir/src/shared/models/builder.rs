//! Fluent construction of `Function`s
//!
//! ```rust,ignore
//! let mut b = FunctionBuilder::new("count");
//! let n = b.argument("n");
//! let entry = b.block("entry");
//! let header = b.block("header");
//! let exit = b.block("exit");
//!
//! b.switch_to(entry);
//! b.br(header);
//! b.switch_to(header);
//! let i = b.phi("i");
//! let next = b.binary(BinaryOp::Add, i, Operand::int(1), "i.next");
//! b.add_incoming(i, Operand::int(0), entry);
//! b.add_incoming(i, next, header);
//! let cond = b.cmp(CmpPredicate::Slt, next, n, "cond");
//! b.cond_br(cond, header, exit);
//! b.switch_to(exit);
//! b.ret(None);
//! let function = b.build()?;
//! ```

use super::ir::{
    Argument, BasicBlock, BinaryOp, BlockId, CastKind, CmpPredicate, Function, Instruction,
    Opcode, Operand, ValueData, ValueId,
};
use crate::errors::{LoopgraphError, Result};
use rustc_hash::FxHashMap;

/// Builder for `Function`
///
/// Values and blocks may be referenced before they are defined; everything
/// is checked once in `build()`.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    values: Vec<ValueData>,
    blocks: Vec<BasicBlock>,
    current: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            blocks: Vec::new(),
            current: None,
        }
    }

    pub fn argument(&mut self, name: impl Into<String>) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData::Argument(Argument {
            id,
            name: name.into(),
        }));
        id
    }

    /// Create a new block; the first block created is the entry block
    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            name: name.into(),
            instructions: Vec::new(),
        });
        if self.current.is_none() {
            self.current = Some(id);
        }
        id
    }

    /// Subsequent instructions are appended to `block`
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current
    }

    /// Append an arbitrary instruction to the current block
    pub fn push(&mut self, opcode: Opcode, operands: Vec<Operand>, name: Option<String>) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        // An instruction emitted before any block exists lands in an
        // unreachable slot and is reported by `build()`.
        let block = self.current.unwrap_or(BlockId(u32::MAX));
        self.values.push(ValueData::Instruction(Instruction {
            id,
            block,
            opcode,
            operands,
            name,
        }));
        if let Some(b) = self.blocks.get_mut(block.index()) {
            b.instructions.push(id);
        }
        id
    }

    fn named(name: &str) -> Option<String> {
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Empty PHI; fill with `add_incoming`
    pub fn phi(&mut self, name: &str) -> ValueId {
        self.push(
            Opcode::Phi {
                incoming_blocks: Vec::new(),
            },
            Vec::new(),
            Self::named(name),
        )
    }

    pub fn add_incoming(&mut self, phi: ValueId, value: impl Into<Operand>, block: BlockId) {
        if let Some(ValueData::Instruction(inst)) = self.values.get_mut(phi.index()) {
            if let Opcode::Phi { incoming_blocks } = &mut inst.opcode {
                incoming_blocks.push(block);
                inst.operands.push(value.into());
            }
        }
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
        name: &str,
    ) -> ValueId {
        self.push(
            Opcode::Binary(op),
            vec![lhs.into(), rhs.into()],
            Self::named(name),
        )
    }

    pub fn cmp(
        &mut self,
        predicate: CmpPredicate,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
        name: &str,
    ) -> ValueId {
        self.push(
            Opcode::Cmp(predicate),
            vec![lhs.into(), rhs.into()],
            Self::named(name),
        )
    }

    pub fn br(&mut self, target: BlockId) -> ValueId {
        self.push(
            Opcode::Branch {
                targets: vec![target],
            },
            Vec::new(),
            None,
        )
    }

    pub fn cond_br(
        &mut self,
        condition: impl Into<Operand>,
        if_true: BlockId,
        if_false: BlockId,
    ) -> ValueId {
        self.push(
            Opcode::Branch {
                targets: vec![if_true, if_false],
            },
            vec![condition.into()],
            None,
        )
    }

    pub fn switch(
        &mut self,
        scrutinee: impl Into<Operand>,
        default: BlockId,
        cases: &[BlockId],
    ) -> ValueId {
        let mut targets = vec![default];
        targets.extend_from_slice(cases);
        self.push(Opcode::Switch { targets }, vec![scrutinee.into()], None)
    }

    pub fn ret(&mut self, value: Option<Operand>) -> ValueId {
        self.push(Opcode::Return, value.into_iter().collect(), None)
    }

    pub fn unreachable(&mut self) -> ValueId {
        self.push(Opcode::Unreachable, Vec::new(), None)
    }

    pub fn gep(&mut self, base: impl Into<Operand>, index: impl Into<Operand>, name: &str) -> ValueId {
        self.push(
            Opcode::Gep,
            vec![base.into(), index.into()],
            Self::named(name),
        )
    }

    pub fn cast(&mut self, kind: CastKind, value: impl Into<Operand>, name: &str) -> ValueId {
        self.push(Opcode::Cast(kind), vec![value.into()], Self::named(name))
    }

    pub fn load(&mut self, pointer: impl Into<Operand>, name: &str) -> ValueId {
        self.push(Opcode::Load, vec![pointer.into()], Self::named(name))
    }

    pub fn store(&mut self, value: impl Into<Operand>, pointer: impl Into<Operand>) -> ValueId {
        self.push(Opcode::Store, vec![value.into(), pointer.into()], None)
    }

    pub fn call(
        &mut self,
        callee: &str,
        args: Vec<Operand>,
        reads_memory: bool,
        writes_memory: bool,
        name: &str,
    ) -> ValueId {
        self.push(
            Opcode::Call {
                callee: callee.to_string(),
                reads_memory,
                writes_memory,
            },
            args,
            Self::named(name),
        )
    }

    pub fn invoke(
        &mut self,
        callee: &str,
        args: Vec<Operand>,
        normal: BlockId,
        unwind: BlockId,
    ) -> ValueId {
        self.push(
            Opcode::Invoke {
                callee: callee.to_string(),
                targets: vec![normal, unwind],
            },
            args,
            None,
        )
    }

    pub fn select(
        &mut self,
        condition: impl Into<Operand>,
        if_true: impl Into<Operand>,
        if_false: impl Into<Operand>,
        name: &str,
    ) -> ValueId {
        self.push(
            Opcode::Select,
            vec![condition.into(), if_true.into(), if_false.into()],
            Self::named(name),
        )
    }

    pub fn alloca(&mut self, name: &str) -> ValueId {
        self.push(Opcode::Alloca, Vec::new(), Self::named(name))
    }

    /// Validate and freeze the function
    pub fn build(self) -> Result<Function> {
        let name = self.name;
        if self.blocks.is_empty() {
            return Err(LoopgraphError::malformed(format!(
                "function '{}' has no blocks",
                name
            )));
        }

        let values = self.values;

        let num_blocks = self.blocks.len();
        let num_values = values.len();
        let mut positions = FxHashMap::default();
        let mut predecessors: Vec<Vec<BlockId>> = vec![Vec::new(); num_blocks];

        for data in &values {
            if let ValueData::Instruction(inst) = data {
                if inst.block.index() >= num_blocks {
                    return Err(LoopgraphError::malformed(format!(
                        "function '{}': instruction {} is not inside a block",
                        name, inst.id
                    )));
                }
            }
        }

        for block in &self.blocks {
            let Some(&last) = block.instructions.last() else {
                return Err(LoopgraphError::malformed(format!(
                    "function '{}': block '{}' is empty",
                    name, block.name
                )));
            };

            let mut seen_non_phi = false;
            for (pos, id) in block.instructions.iter().enumerate() {
                let ValueData::Instruction(inst) = &values[id.index()] else {
                    continue;
                };
                positions.insert(*id, pos);

                if inst.is_terminator() && *id != last {
                    return Err(LoopgraphError::malformed(format!(
                        "function '{}': terminator {} in the middle of block '{}'",
                        name, id, block.name
                    )));
                }

                if inst.is_phi() {
                    if seen_non_phi {
                        return Err(LoopgraphError::malformed(format!(
                            "function '{}': PHI {} is not at the start of block '{}'",
                            name, id, block.name
                        )));
                    }
                    if inst.operands.len() != inst.incoming_blocks().len() {
                        return Err(LoopgraphError::malformed(format!(
                            "function '{}': PHI {} has mismatched incoming arity",
                            name, id
                        )));
                    }
                } else {
                    seen_non_phi = true;
                }

                for operand in &inst.operands {
                    if let Some(v) = operand.as_value() {
                        if v.index() >= num_values {
                            return Err(LoopgraphError::malformed(format!(
                                "function '{}': {} uses unknown value {}",
                                name, id, v
                            )));
                        }
                    }
                }

                let referenced = inst.successors().iter().chain(inst.incoming_blocks());
                for target in referenced {
                    if target.index() >= num_blocks {
                        return Err(LoopgraphError::malformed(format!(
                            "function '{}': {} refers to unknown block {}",
                            name, id, target
                        )));
                    }
                }
            }

            let is_terminated = matches!(
                &values[last.index()],
                ValueData::Instruction(inst) if inst.is_terminator()
            );
            if !is_terminated {
                return Err(LoopgraphError::malformed(format!(
                    "function '{}': block '{}' does not end with a terminator",
                    name, block.name
                )));
            }

            if let ValueData::Instruction(term) = &values[last.index()] {
                for succ in term.successors() {
                    let preds = &mut predecessors[succ.index()];
                    if !preds.contains(&block.id) {
                        preds.push(block.id);
                    }
                }
            }
        }

        let mut users: Vec<Vec<ValueId>> = vec![Vec::new(); num_values];
        for block in &self.blocks {
            for id in &block.instructions {
                if let ValueData::Instruction(inst) = &values[id.index()] {
                    for used in inst.value_operands() {
                        let list = &mut users[used.index()];
                        if !list.contains(id) {
                            list.push(*id);
                        }
                    }
                }
            }
        }

        Ok(Function {
            name,
            values,
            blocks: self.blocks,
            predecessors,
            users,
            positions,
        })
    }
}
