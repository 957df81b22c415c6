//! SSA-form IR model consumed by the analyses
//!
//! A `Function` owns its arguments, blocks, and instructions in arenas. Every
//! other structure in the crate refers to them through the copyable handles
//! defined here (`ValueId`, `BlockId`), never by reference.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Handles
// ═══════════════════════════════════════════════════════════════════════════

/// Handle of an argument or instruction of a function
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Handle of a basic block
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Handle of a natural loop inside a `LoopForest`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LoopId(pub u32);

impl LoopId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operands
// ═══════════════════════════════════════════════════════════════════════════

/// Compile-time constant operand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Null,
    Undef,
}

impl Constant {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Value(ValueId),
    Constant(Constant),
}

impl Operand {
    pub fn int(v: i64) -> Self {
        Operand::Constant(Constant::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Operand::Constant(Constant::Float(v))
    }

    pub fn as_value(&self) -> Option<ValueId> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Constant(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Operand::Constant(c) => c.as_int(),
            Operand::Value(_) => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Constant(_))
    }
}

impl From<ValueId> for Operand {
    fn from(v: ValueId) -> Self {
        Operand::Value(v)
    }
}

impl From<Constant> for Operand {
    fn from(c: Constant) -> Self {
        Operand::Constant(c)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Constant(Constant::Int(i)) => write!(f, "{}", i),
            Operand::Constant(Constant::Float(x)) => write!(f, "{:?}", x),
            Operand::Constant(Constant::Null) => write!(f, "null"),
            Operand::Constant(Constant::Undef) => write!(f, "undef"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Opcodes
// ═══════════════════════════════════════════════════════════════════════════

/// Binary arithmetic and logic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::FAdd => "fadd",
            BinaryOp::Sub => "sub",
            BinaryOp::FSub => "fsub",
            BinaryOp::Mul => "mul",
            BinaryOp::FMul => "fmul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::URem => "urem",
            BinaryOp::SRem => "srem",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    /// Operators that can fold a reduction (add/sub family and mul family)
    pub fn is_accumulator(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::FAdd
                | BinaryOp::Sub
                | BinaryOp::FSub
                | BinaryOp::Mul
                | BinaryOp::FMul
        )
    }

    pub fn is_add_or_sub(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::FAdd | BinaryOp::Sub | BinaryOp::FSub
        )
    }

    pub fn is_sub(&self) -> bool {
        matches!(self, BinaryOp::Sub | BinaryOp::FSub)
    }

    pub fn is_mul(&self) -> bool {
        matches!(self, BinaryOp::Mul | BinaryOp::FMul)
    }

    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::FAdd
                | BinaryOp::Mul
                | BinaryOp::FMul
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Xor
        )
    }

    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Mul | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
        )
    }

    pub fn is_bitwise_logic(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// Identity element of a reduction over this operator
    pub fn identity(&self) -> Option<Constant> {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => {
                Some(Constant::Int(0))
            }
            BinaryOp::FAdd | BinaryOp::FSub => Some(Constant::Float(0.0)),
            BinaryOp::Mul => Some(Constant::Int(1)),
            BinaryOp::FMul => Some(Constant::Float(1.0)),
            BinaryOp::And => Some(Constant::Int(-1)),
            _ => None,
        }
    }
}

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl CmpPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Ugt => "ugt",
            CmpPredicate::Uge => "uge",
            CmpPredicate::Ult => "ult",
            CmpPredicate::Ule => "ule",
            CmpPredicate::Sgt => "sgt",
            CmpPredicate::Sge => "sge",
            CmpPredicate::Slt => "slt",
            CmpPredicate::Sle => "sle",
        }
    }

    /// Predicate after swapping the operands (`a < b` becomes `b > a`)
    pub fn swapped(&self) -> Self {
        match self {
            CmpPredicate::Eq => CmpPredicate::Eq,
            CmpPredicate::Ne => CmpPredicate::Ne,
            CmpPredicate::Ugt => CmpPredicate::Ult,
            CmpPredicate::Uge => CmpPredicate::Ule,
            CmpPredicate::Ult => CmpPredicate::Ugt,
            CmpPredicate::Ule => CmpPredicate::Uge,
            CmpPredicate::Sgt => CmpPredicate::Slt,
            CmpPredicate::Sge => CmpPredicate::Sle,
            CmpPredicate::Slt => CmpPredicate::Sgt,
            CmpPredicate::Sle => CmpPredicate::Sge,
        }
    }

    /// Logical negation of the predicate
    pub fn inverse(&self) -> Self {
        match self {
            CmpPredicate::Eq => CmpPredicate::Ne,
            CmpPredicate::Ne => CmpPredicate::Eq,
            CmpPredicate::Ugt => CmpPredicate::Ule,
            CmpPredicate::Uge => CmpPredicate::Ult,
            CmpPredicate::Ult => CmpPredicate::Uge,
            CmpPredicate::Ule => CmpPredicate::Ugt,
            CmpPredicate::Sgt => CmpPredicate::Sle,
            CmpPredicate::Sge => CmpPredicate::Slt,
            CmpPredicate::Slt => CmpPredicate::Sge,
            CmpPredicate::Sle => CmpPredicate::Sgt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    Trunc,
    ZExt,
    SExt,
    BitCast,
    IntToPtr,
    PtrToInt,
    FpToSi,
    SiToFp,
}

/// Closed set of instruction kinds the analyses understand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    /// Operands are parallel to `incoming_blocks`
    Phi { incoming_blocks: Vec<BlockId> },
    Binary(BinaryOp),
    Cmp(CmpPredicate),
    /// One target: unconditional. Two targets: operand 0 is the condition and
    /// `targets[0]` is taken when it holds.
    Branch { targets: Vec<BlockId> },
    /// Operand 0 is the scrutinee; `targets[0]` is the default destination
    Switch { targets: Vec<BlockId> },
    Return,
    Unreachable,
    /// `targets` is `[normal, unwind]`
    Invoke { callee: String, targets: Vec<BlockId> },
    Gep,
    Cast(CastKind),
    /// Operand 0 is the pointer
    Load,
    /// Operands are `[value, pointer]`
    Store,
    Call {
        callee: String,
        reads_memory: bool,
        writes_memory: bool,
    },
    Select,
    Alloca,
    Other(String),
}

impl Opcode {
    pub fn name(&self) -> &str {
        match self {
            Opcode::Phi { .. } => "phi",
            Opcode::Binary(op) => op.as_str(),
            Opcode::Cmp(_) => "icmp",
            Opcode::Branch { .. } => "br",
            Opcode::Switch { .. } => "switch",
            Opcode::Return => "ret",
            Opcode::Unreachable => "unreachable",
            Opcode::Invoke { .. } => "invoke",
            Opcode::Gep => "getelementptr",
            Opcode::Cast(_) => "cast",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Call { .. } => "call",
            Opcode::Select => "select",
            Opcode::Alloca => "alloca",
            Opcode::Other(name) => name,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Branch { .. }
                | Opcode::Switch { .. }
                | Opcode::Return
                | Opcode::Unreachable
                | Opcode::Invoke { .. }
        )
    }
}

/// Coarse role of an instruction, used by SCC classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionRole {
    Phi,
    Accumulator(BinaryOp),
    Comparison,
    Terminator,
    Gep,
    Cast,
    Call,
    Memory,
    Other,
}

// ═══════════════════════════════════════════════════════════════════════════
// Instructions, blocks, functions
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: ValueId,
    pub block: BlockId,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub name: Option<String>,
}

impl Instruction {
    pub fn role(&self) -> InstructionRole {
        match &self.opcode {
            Opcode::Phi { .. } => InstructionRole::Phi,
            Opcode::Binary(op) if op.is_accumulator() => InstructionRole::Accumulator(*op),
            Opcode::Cmp(_) => InstructionRole::Comparison,
            Opcode::Gep => InstructionRole::Gep,
            Opcode::Cast(_) => InstructionRole::Cast,
            Opcode::Call { .. } => InstructionRole::Call,
            Opcode::Load | Opcode::Store => InstructionRole::Memory,
            op if op.is_terminator() => InstructionRole::Terminator,
            _ => InstructionRole::Other,
        }
    }

    pub fn is_phi(&self) -> bool {
        matches!(self.opcode, Opcode::Phi { .. })
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }

    pub fn is_cmp(&self) -> bool {
        matches!(self.opcode, Opcode::Cmp(_))
    }

    pub fn is_conditional_branch(&self) -> bool {
        matches!(&self.opcode, Opcode::Branch { targets } if targets.len() == 2)
    }

    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self.opcode {
            Opcode::Binary(op) => Some(op),
            _ => None,
        }
    }

    pub fn cmp_predicate(&self) -> Option<CmpPredicate> {
        match self.opcode {
            Opcode::Cmp(p) => Some(p),
            _ => None,
        }
    }

    /// Successor blocks of a terminator (empty for other instructions)
    pub fn successors(&self) -> &[BlockId] {
        match &self.opcode {
            Opcode::Branch { targets }
            | Opcode::Switch { targets }
            | Opcode::Invoke { targets, .. } => targets,
            _ => &[],
        }
    }

    pub fn incoming_blocks(&self) -> &[BlockId] {
        match &self.opcode {
            Opcode::Phi { incoming_blocks } => incoming_blocks,
            _ => &[],
        }
    }

    /// PHI incoming (operand, block) pairs
    pub fn incoming(&self) -> impl Iterator<Item = (Operand, BlockId)> + '_ {
        self.operands
            .iter()
            .copied()
            .zip(self.incoming_blocks().iter().copied())
    }

    pub fn incoming_value_for(&self, block: BlockId) -> Option<Operand> {
        self.incoming().find(|(_, b)| *b == block).map(|(op, _)| op)
    }

    /// Operands that refer to other values
    pub fn value_operands(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.operands.iter().filter_map(Operand::as_value)
    }

    pub fn may_read_memory(&self) -> bool {
        match &self.opcode {
            Opcode::Load => true,
            Opcode::Call { reads_memory, .. } => *reads_memory,
            Opcode::Invoke { .. } => true,
            _ => false,
        }
    }

    pub fn may_write_memory(&self) -> bool {
        match &self.opcode {
            Opcode::Store => true,
            Opcode::Call { writes_memory, .. } => *writes_memory,
            Opcode::Invoke { .. } => true,
            _ => false,
        }
    }

    pub fn accesses_memory(&self) -> bool {
        self.may_read_memory() || self.may_write_memory()
    }

    /// Pointer operand of a load or store
    pub fn pointer_operand(&self) -> Option<Operand> {
        match self.opcode {
            Opcode::Load => self.operands.first().copied(),
            Opcode::Store => self.operands.get(1).copied(),
            _ => None,
        }
    }

    pub fn has_side_effects(&self) -> bool {
        self.may_write_memory() || matches!(self.opcode, Opcode::Call { .. })
    }

    pub fn calls(&self, name: &str) -> bool {
        match &self.opcode {
            Opcode::Call { callee, .. } | Opcode::Invoke { callee, .. } => callee == name,
            _ => false,
        }
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} = {}", name, self.opcode.name()),
            None => format!("{} = {}", self.id, self.opcode.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub id: ValueId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub instructions: Vec<ValueId>,
}

/// Arena slot of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    Argument(Argument),
    Instruction(Instruction),
}

/// A validated function. Construct with `FunctionBuilder`.
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) values: Vec<ValueData>,
    pub(crate) blocks: Vec<BasicBlock>,
    pub(crate) predecessors: Vec<Vec<BlockId>>,
    pub(crate) users: Vec<Vec<ValueId>>,
    /// Instruction -> index inside its block
    pub(crate) positions: FxHashMap<ValueId, usize>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_block(&self) -> BlockId {
        BlockId(0)
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn value(&self, id: ValueId) -> Option<&ValueData> {
        self.values.get(id.index())
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn instruction(&self, id: ValueId) -> Option<&Instruction> {
        match self.values.get(id.index()) {
            Some(ValueData::Instruction(inst)) => Some(inst),
            _ => None,
        }
    }

    pub fn is_instruction(&self, id: ValueId) -> bool {
        self.instruction(id).is_some()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.values.iter().filter_map(|v| match v {
            ValueData::Argument(arg) => Some(arg),
            ValueData::Instruction(_) => None,
        })
    }

    /// Instructions in block layout order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| b.instructions.iter())
            .filter_map(move |id| self.instruction(*id))
    }

    pub fn num_instructions(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }

    pub fn terminator(&self, block: BlockId) -> Option<&Instruction> {
        self.block(block)
            .and_then(|b| b.instructions.last())
            .and_then(|id| self.instruction(*id))
    }

    pub fn first_instruction(&self, block: BlockId) -> Option<ValueId> {
        self.block(block).and_then(|b| b.instructions.first().copied())
    }

    /// First instruction of the block that is not a PHI
    pub fn first_non_phi(&self, block: BlockId) -> Option<ValueId> {
        self.block(block)?
            .instructions
            .iter()
            .copied()
            .find(|id| self.instruction(*id).map_or(false, |i| !i.is_phi()))
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.terminator(block).map_or(&[], |t| t.successors())
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.predecessors
            .get(block.index())
            .map_or(&[], |p| p.as_slice())
    }

    /// Instructions that use `value` as an operand, in layout order
    pub fn users(&self, value: ValueId) -> &[ValueId] {
        self.users.get(value.index()).map_or(&[], |u| u.as_slice())
    }

    /// Index of an instruction inside its block
    pub fn position(&self, inst: ValueId) -> Option<usize> {
        self.positions.get(&inst).copied()
    }

    pub fn block_of(&self, value: ValueId) -> Option<BlockId> {
        self.instruction(value).map(|i| i.block)
    }

    pub fn value_name(&self, id: ValueId) -> String {
        match self.value(id) {
            Some(ValueData::Argument(arg)) => arg.name.clone(),
            Some(ValueData::Instruction(inst)) => {
                inst.name.clone().unwrap_or_else(|| id.to_string())
            }
            None => id.to_string(),
        }
    }

    /// Whether the block ends the function (no successors)
    pub fn is_function_exit(&self, block: BlockId) -> bool {
        self.successors(block).is_empty()
    }
}
