//! Constant-branch folding (§4.3.2): a conditional branch whose condition
//! has already been folded to a constant by `ConstantOps` becomes an
//! unconditional branch, and the not-taken successor loses this block as a
//! predecessor.

use crate::ir::{BlockId, Function, InstKind};
use crate::opt::cfg_edit::remove_predecessor;
use crate::opt::Pass;

pub struct ConstantBranch;

impl Pass for ConstantBranch {
    fn name(&self) -> &'static str {
        "constant_branch"
    }

    fn required_analyses(&self) -> &'static [&'static str] {
        &["constant_ops"]
    }

    fn preserves_cfg(&self) -> bool {
        false
    }

    fn run(&self, func: &mut Function) -> bool {
        let mut changed = false;
        let block_ids: Vec<BlockId> = func.block_ids().collect();

        for block in block_ids {
            let term = *func.blocks[block].insts.last().expect("block has no terminator");
            let (cond_bits, then_block, else_block) = match &func.insts[term].kind {
                InstKind::CondBr { cond, then_block, else_block } => match cond.as_const() {
                    Some(bits) => (bits, *then_block, *else_block),
                    None => continue,
                },
                _ => continue,
            };

            let (taken, not_taken) = if cond_bits != 0 { (then_block, else_block) } else { (else_block, then_block) };

            func.insts[term].kind = InstKind::Br(taken);
            remove_predecessor(func, not_taken, block);
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Incoming, Value};
    use mucc_sem::Type;
    use mucc_util::Symbol;

    #[test]
    fn folds_true_branch_and_drops_else_predecessor() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let then_block = func.add_block();
        let else_block = func.add_block();

        func.push_inst(entry, Type::Void, InstKind::CondBr { cond: Value::const_i1(true), then_block, else_block });
        func.add_edge(entry, then_block);
        func.add_edge(entry, else_block);

        func.push_inst(then_block, Type::Void, InstKind::Ret(Some(Value::const_int(1))));
        func.push_inst(else_block, Type::Void, InstKind::Ret(Some(Value::const_int(2))));

        assert!(ConstantBranch.run(&mut func));

        assert!(matches!(
            func.insts[*func.blocks[entry].insts.last().unwrap()].kind,
            InstKind::Br(b) if b == then_block
        ));
        assert!(!func.blocks[else_block].preds.contains(&entry));
    }

    /// A PHI at the not-taken successor loses its incoming for the folded
    /// block's edge and, if that leaves only one distinct value, collapses
    /// — the open question from §9 resolved inline rather than with a
    /// separate CFG-simplify sweep.
    #[test]
    fn dropping_a_predecessor_collapses_a_trivial_phi() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let then_block = func.add_block();
        let other_pred = func.add_block();
        let merge = func.add_block();

        func.push_inst(entry, Type::Void, InstKind::CondBr { cond: Value::const_i1(true), then_block, else_block: merge });
        func.add_edge(entry, then_block);
        func.add_edge(entry, merge);

        func.push_inst(other_pred, Type::Void, InstKind::Br(merge));
        func.add_edge(other_pred, merge);

        func.push_inst(then_block, Type::Void, InstKind::Ret(Some(Value::const_int(1))));

        let phi = func.prepend_phi(merge, Type::Int);
        func.insts[phi].kind = InstKind::Phi(vec![
            Incoming { value: Value::const_int(7), pred: entry },
            Incoming { value: Value::const_int(7), pred: other_pred },
        ]);
        func.push_inst(merge, Type::Void, InstKind::Ret(Some(Value::Inst(phi))));

        assert!(ConstantBranch.run(&mut func));

        assert!(!func.blocks[merge].preds.contains(&entry));
        match &func.insts[*func.blocks[merge].insts.last().unwrap()].kind {
            InstKind::Ret(Some(Value::Constant { bits, .. })) => assert_eq!(*bits, 7),
            other => panic!("expected the trivial phi to collapse into its return, got {other:?}"),
        }
    }
}
