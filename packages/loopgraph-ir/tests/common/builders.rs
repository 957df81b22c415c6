//! IR and graph builders
//!
//! Each loop builder returns the function plus the handles the tests assert
//! on, in source order.

use loopgraph_ir::features::dependence_graph::{
    DataDependenceType, DependenceEdge, DependenceGraph, DependenceKind,
};
use loopgraph_ir::shared::models::{
    BinaryOp, CmpPredicate, Function, FunctionBuilder, Operand, ValueId,
};

/// Handles of `a[i] = a[i] + 1`
#[derive(Debug, Clone, Copy)]
pub struct IncrementHandles {
    pub i: ValueId,
    pub ptr: ValueId,
    pub x: ValueId,
    pub y: ValueId,
    pub store: ValueId,
    pub next: ValueId,
    pub cmp: ValueId,
}

/// for i in 0..n { a[i] = a[i] + 1 }
pub fn increment_loop(name: &str) -> (Function, IncrementHandles) {
    let mut b = FunctionBuilder::new(name);
    let a = b.argument("a");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let i = b.phi("i");
    let ptr = b.gep(a, i, "ptr");
    let x = b.load(ptr, "x");
    let y = b.binary(BinaryOp::Add, x, Operand::int(1), "y");
    let store = b.store(y, ptr);
    let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
    let cmp = b.cmp(CmpPredicate::Slt, next, n, "c");
    b.cond_br(cmp, body, exit);
    b.switch_to(exit);
    b.ret(None);
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, next, body);
    let function = b.build().expect("increment loop");
    (
        function,
        IncrementHandles {
            i,
            ptr,
            x,
            y,
            store,
            next,
            cmp,
        },
    )
}

/// for i in 0..n { sum += a[i] } return sum; returns [i, sum, s2]
pub fn reduction_loop(name: &str) -> (Function, [ValueId; 3]) {
    let mut b = FunctionBuilder::new(name);
    let a = b.argument("a");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let i = b.phi("i");
    let sum = b.phi("sum");
    let ptr = b.gep(a, i, "ptr");
    let x = b.load(ptr, "x");
    let s2 = b.binary(BinaryOp::Add, sum, x, "s2");
    let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
    let c = b.cmp(CmpPredicate::Slt, next, n, "c");
    b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(Some(s2.into()));
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, next, body);
    b.add_incoming(sum, Operand::int(0), entry);
    b.add_incoming(sum, s2, body);
    (b.build().expect("reduction loop"), [i, sum, s2])
}

/// while node != null { node = node->next }; returns [node, next]
///
/// `side_work` appends that many arithmetic instructions on `node` that
/// nothing else in the loop consumes.
pub fn pointer_chase_loop(name: &str, side_work: usize) -> (Function, [ValueId; 2]) {
    let mut b = FunctionBuilder::new(name);
    let head = b.argument("head");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let node = b.phi("node");
    let mut work: Operand = node.into();
    for k in 0..side_work {
        let w = b.binary(BinaryOp::Mul, work, Operand::int(3), &format!("w{}", k));
        work = w.into();
    }
    let addr = b.gep(node, Operand::int(1), "addr");
    let next = b.load(addr, "next");
    let c = b.cmp(CmpPredicate::Ne, next, Operand::int(0), "c");
    b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(None);
    b.add_incoming(node, head, entry);
    b.add_incoming(node, next, body);
    (b.build().expect("pointer chase loop"), [node, next])
}

/// for i in 0..n { y = a[i] * 2 } return y; returns [ptr, x, y]
pub fn scale_loop(name: &str) -> (Function, [ValueId; 3]) {
    let mut b = FunctionBuilder::new(name);
    let a = b.argument("a");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let i = b.phi("i");
    let ptr = b.gep(a, i, "ptr");
    let x = b.load(ptr, "x");
    let y = b.binary(BinaryOp::Mul, x, Operand::int(2), "y");
    let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
    let c = b.cmp(CmpPredicate::Slt, next, n, "c");
    b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(Some(y.into()));
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, next, body);
    (b.build().expect("scale loop"), [ptr, x, y])
}

/// for i in 0..n { p = &a[i] } with `p` never read; returns the GEP
pub fn dead_address_loop(name: &str) -> (Function, ValueId) {
    let mut b = FunctionBuilder::new(name);
    let a = b.argument("a");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let i = b.phi("i");
    let ptr = b.gep(a, i, "p");
    let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
    let c = b.cmp(CmpPredicate::Slt, next, n, "c");
    b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(None);
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, next, body);
    (b.build().expect("dead address loop"), ptr)
}

/// acc = phi; u1 = acc <op1> x; u2 = u1 <op2> y; returns [acc, u1, u2]
pub fn two_update_loop(name: &str, op1: BinaryOp, op2: BinaryOp) -> (Function, [ValueId; 3]) {
    let mut b = FunctionBuilder::new(name);
    let x = b.argument("x");
    let y = b.argument("y");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let i = b.phi("i");
    let acc = b.phi("acc");
    let u1 = b.binary(op1, acc, x, "u1");
    let u2 = b.binary(op2, u1, y, "u2");
    let next = b.binary(BinaryOp::Add, i, Operand::int(1), "next");
    let c = b.cmp(CmpPredicate::Slt, next, n, "c");
    b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(Some(u2.into()));
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, next, body);
    b.add_incoming(acc, Operand::int(0), entry);
    b.add_incoming(acc, u2, body);
    (b.build().expect("two update loop"), [acc, u1, u2])
}

/// while x < n {} with a compare fed only by arguments; returns the branch
pub fn spin_loop(name: &str) -> (Function, ValueId) {
    let mut b = FunctionBuilder::new(name);
    let x = b.argument("x");
    let n = b.argument("n");
    let entry = b.block("entry");
    let body = b.block("body");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(body);
    b.switch_to(body);
    let c = b.cmp(CmpPredicate::Slt, x, n, "c");
    let br = b.cond_br(c, body, exit);
    b.switch_to(exit);
    b.ret(None);
    (b.build().expect("spin loop"), br)
}

/// for i in 0..n { for j in 0..m { t = j * 2 } }; returns [i, j]
pub fn nested_loops(name: &str) -> (Function, [ValueId; 2]) {
    let mut b = FunctionBuilder::new(name);
    let n = b.argument("n");
    let m = b.argument("m");
    let entry = b.block("entry");
    let outer = b.block("outer");
    let inner = b.block("inner");
    let latch = b.block("latch");
    let exit = b.block("exit");
    b.switch_to(entry);
    b.br(outer);
    b.switch_to(outer);
    let i = b.phi("i");
    b.br(inner);
    b.switch_to(inner);
    let j = b.phi("j");
    b.binary(BinaryOp::Mul, j, Operand::int(2), "t");
    let j_next = b.binary(BinaryOp::Add, j, Operand::int(1), "j.next");
    let cj = b.cmp(CmpPredicate::Slt, j_next, m, "cj");
    b.cond_br(cj, inner, latch);
    b.switch_to(latch);
    let i_next = b.binary(BinaryOp::Add, i, Operand::int(1), "i.next");
    let ci = b.cmp(CmpPredicate::Slt, i_next, n, "ci");
    b.cond_br(ci, outer, exit);
    b.switch_to(exit);
    b.ret(None);
    b.add_incoming(i, Operand::int(0), entry);
    b.add_incoming(i, i_next, latch);
    b.add_incoming(j, Operand::int(0), outer);
    b.add_incoming(j, j_next, inner);
    (b.build().expect("nested loops"), [i, j])
}

/// Dependence graph over `nodes` internal values `%0..%nodes`
pub fn graph_from_edges(nodes: u32, edges: &[(u32, u32, DependenceKind)]) -> DependenceGraph {
    let mut dg = DependenceGraph::new();
    for n in 0..nodes {
        dg.add_node(ValueId(n), true);
    }
    for (src, dst, kind) in edges {
        let data_type = match kind {
            DependenceKind::Control => DataDependenceType::None,
            _ => DataDependenceType::Raw,
        };
        dg.add_edge(DependenceEdge::new(ValueId(*src), ValueId(*dst), *kind, data_type));
    }
    dg
}
