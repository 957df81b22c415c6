//! Shared models: the IR consumed by every analysis stage

pub mod builder;
pub mod cfg;
pub mod ir;
pub mod loops;

pub use builder::FunctionBuilder;
pub use cfg::{Cfg, DominatorSummary};
pub use ir::{
    Argument, BasicBlock, BinaryOp, BlockId, CastKind, CmpPredicate, Constant, Function,
    Instruction, InstructionRole, LoopId, Opcode, Operand, ValueData, ValueId,
};
pub use loops::{LoopForest, LoopStructure};
