//! Loop-invariant code motion (§4.3.4). Does not touch the CFG: only
//! instructions move, from inside a loop to immediately before its
//! pre-header's terminator.

use crate::analysis::{find_loops, Dominators};
use crate::ir::{Function, InstId, InstKind, MathOp, Value};
use crate::opt::Pass;

pub struct Licm;

impl Pass for Licm {
    fn name(&self) -> &'static str {
        "licm"
    }

    fn required_analyses(&self) -> &'static [&'static str] {
        &["dead_blocks"]
    }

    fn preserves_cfg(&self) -> bool {
        true
    }

    fn run(&self, func: &mut Function) -> bool {
        let dom = Dominators::compute(func);
        let loops = find_loops(func, &dom);
        let mut changed = false;

        for lp in &loops {
            let Some(preheader) = lp.preheader else { continue };

            // Pre-order on the dominator tree, restricted to this loop's
            // own blocks (nested loops are skipped here — they get handled
            // as their own entry in `loops`), guarantees that by the time
            // an instruction is considered, everything it could depend on
            // that is itself eligible has already been hoisted.
            for block in dom.preorder(func, &lp.blocks) {
                let inst_ids: Vec<InstId> = func.blocks[block].insts.clone();
                for id in inst_ids {
                    if is_hoistable(func, id, lp) {
                        hoist(func, id, preheader);
                        changed = true;
                    }
                }
            }
        }

        changed
    }
}

fn is_hoistable(func: &Function, id: InstId, lp: &crate::analysis::Loop) -> bool {
    let inst = &func.insts[id];
    match &inst.kind {
        // Division/remainder can trap; only hoist when the divisor is a
        // known-nonzero constant, since speculating past a real zero
        // divisor would be observable (§4.3.4, point 2).
        InstKind::Math { op: MathOp::SDiv | MathOp::SRem, rhs, .. } => {
            matches!(rhs.as_const(), Some(v) if v != 0) && all_invariant(func, &inst.kind, lp)
        }
        InstKind::Math { .. } | InstKind::Cmp { .. } | InstKind::ZExt(_) | InstKind::Not(_) | InstKind::IntCast(_) | InstKind::CharCast(_) | InstKind::Gep { .. } => {
            all_invariant(func, &inst.kind, lp)
        }
        // Everything else (load/store/call/alloca/phi/terminators) either
        // has a side effect, can trap beyond what's checked above, or
        // isn't in the hoistable opcode set at all.
        _ => false,
    }
}

fn all_invariant(func: &Function, kind: &InstKind, lp: &crate::analysis::Loop) -> bool {
    kind.operands().iter().all(|v| is_loop_invariant(func, *v, lp))
}

fn is_loop_invariant(func: &Function, v: Value, lp: &crate::analysis::Loop) -> bool {
    match v {
        Value::Constant { .. } | Value::Argument(_) | Value::GlobalString(_) => true,
        Value::Inst(id) => !lp.blocks.contains(&func.insts[id].block),
    }
}

fn hoist(func: &mut Function, id: InstId, preheader: crate::ir::BlockId) {
    let cur_block = func.insts[id].block;
    func.blocks[cur_block].insts.retain(|&i| i != id);
    func.insts[id].block = preheader;

    // Insert immediately before the terminator; since every previously
    // hoisted instruction in this run was inserted the same way, this
    // also preserves their relative order (each new arrival lands right
    // before the terminator, i.e. right after everything hoisted so far).
    let term_pos = func.blocks[preheader].insts.len() - 1;
    func.blocks[preheader].insts.insert(term_pos, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Incoming};
    use mucc_sem::Type;
    use mucc_util::Symbol;

    /// `while (i < 10) { s = s + (2*3); i = i+1; }` — `2*3` (already folded
    /// by `ConstantOps` in the real pipeline, built directly as a `Math`
    /// here) is loop-invariant and should move to the pre-header.
    #[test]
    fn hoists_invariant_math_out_of_loop_body() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let preheader = func.add_block();
        func.entry = preheader;
        let header = func.add_block();
        let body = func.add_block();
        let exit = func.add_block();

        func.push_inst(preheader, Type::Void, InstKind::Br(header));
        func.add_edge(preheader, header);

        let i_phi = func.prepend_phi(header, Type::Int);
        let cond = func.push_inst(header, Type::Int, InstKind::Cmp { op: CmpOp::Slt, lhs: Value::Inst(i_phi), rhs: Value::const_int(10) });
        func.push_inst(header, Type::Void, InstKind::CondBr { cond: Value::Inst(cond), then_block: body, else_block: exit });
        func.add_edge(header, body);
        func.add_edge(header, exit);

        let invariant = func.push_inst(body, Type::Int, InstKind::Math { op: MathOp::Mul, lhs: Value::const_int(2), rhs: Value::const_int(3) });
        let i_next = func.push_inst(body, Type::Int, InstKind::Math { op: MathOp::Add, lhs: Value::Inst(i_phi), rhs: Value::const_int(1) });
        func.push_inst(body, Type::Void, InstKind::Br(header));
        func.add_edge(body, header);

        func.insts[i_phi].kind =
            InstKind::Phi(vec![Incoming { value: Value::const_int(0), pred: preheader }, Incoming { value: Value::Inst(i_next), pred: body }]);

        func.push_inst(exit, Type::Void, InstKind::Ret(None));

        assert!(Licm.run(&mut func));
        assert!(func.blocks[preheader].insts.contains(&invariant));
        assert!(!func.blocks[body].insts.contains(&invariant));
        // the induction update depends on the loop-carried phi, so it must
        // stay in the body.
        assert!(func.blocks[body].insts.contains(&i_next));
    }

    #[test]
    fn does_not_hoist_division_by_unproven_divisor() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let preheader = func.add_block();
        func.entry = preheader;
        let header = func.add_block();
        let body = func.add_block();
        let exit = func.add_block();

        func.push_inst(preheader, Type::Void, InstKind::Br(header));
        func.add_edge(preheader, header);
        let i_phi = func.prepend_phi(header, Type::Int);
        let cond = func.push_inst(header, Type::Int, InstKind::Cmp { op: CmpOp::Slt, lhs: Value::Inst(i_phi), rhs: Value::const_int(10) });
        func.push_inst(header, Type::Void, InstKind::CondBr { cond: Value::Inst(cond), then_block: body, else_block: exit });
        func.add_edge(header, body);
        func.add_edge(header, exit);

        // divisor is an argument (loop-invariant) but not a proven-nonzero
        // constant: must not speculate.
        let div = func.push_inst(body, Type::Int, InstKind::Math { op: MathOp::SDiv, lhs: Value::const_int(100), rhs: Value::Argument(0) });
        let i_next = func.push_inst(body, Type::Int, InstKind::Math { op: MathOp::Add, lhs: Value::Inst(i_phi), rhs: Value::const_int(1) });
        func.push_inst(body, Type::Void, InstKind::Br(header));
        func.add_edge(body, header);
        func.insts[i_phi].kind =
            InstKind::Phi(vec![Incoming { value: Value::const_int(0), pred: preheader }, Incoming { value: Value::Inst(i_next), pred: body }]);
        func.push_inst(exit, Type::Void, InstKind::Ret(None));

        Licm.run(&mut func);
        assert!(func.blocks[body].insts.contains(&div));
    }
}
