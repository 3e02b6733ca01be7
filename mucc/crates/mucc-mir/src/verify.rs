//! Structural verification of emitted and optimized IR (§7): checks the
//! invariants P1-P4 that the SSA builder and optimizer passes are supposed
//! to maintain, rather than trusting them silently. A violation here means a
//! compiler bug, not an error in the input program, so the driver runs this
//! between every pipeline stage and treats a failure as fatal (§6).

use thiserror::Error;

use crate::ir::{BlockId, Function, InstId, InstKind, Module, Value};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("function `{func}`: block {block:?} lists predecessor {pred:?}, but {pred:?}'s terminator does not target it")]
    StalePredecessor { func: String, block: BlockId, pred: BlockId },

    #[error("function `{func}`: block {block:?}'s terminator targets {succ:?}, which does not list it as a predecessor")]
    MissingPredecessor { func: String, block: BlockId, succ: BlockId },

    #[error("function `{func}`: phi {phi:?} in block {block:?} has {operands} operand(s) for {preds} predecessor(s)")]
    PhiArityMismatch { func: String, block: BlockId, phi: InstId, operands: usize, preds: usize },

    #[error("function `{func}`: phi {phi:?} in block {block:?} has a duplicate or missing incoming for predecessor {pred:?}")]
    PhiPredecessorMismatch { func: String, block: BlockId, phi: InstId, pred: BlockId },

    #[error("function `{func}`: instruction {user:?} in block {user_block:?} uses {def:?}, defined in block {def_block:?} which does not dominate it")]
    UseNotDominated { func: String, user: InstId, user_block: BlockId, def: InstId, def_block: BlockId },

    #[error("function `{func}`: phi {phi:?} in block {block:?} is trivial (every incoming is the same value or itself)")]
    TrivialPhi { func: String, block: BlockId, phi: InstId },
}

pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    for func in module.functions.as_slice() {
        if func.is_extern {
            continue;
        }
        verify_function(func)?;
    }
    Ok(())
}

pub fn verify_function(func: &Function) -> Result<(), VerifyError> {
    verify_predecessors(func)?;
    verify_phis(func)?;
    verify_dominance(func)?;
    Ok(())
}

/// P1: a block's recorded predecessor list and the set of blocks whose
/// terminator actually targets it must agree exactly, in both directions.
fn verify_predecessors(func: &Function) -> Result<(), VerifyError> {
    let name = func.name.to_string();

    for block in func.block_ids() {
        for succ in func.successors(block) {
            if !func.blocks[succ].preds.contains(&block) {
                return Err(VerifyError::MissingPredecessor { func: name, block, succ });
            }
        }
    }
    for block in func.block_ids() {
        for &pred in &func.blocks[block].preds {
            if !func.successors(pred).contains(&block) {
                return Err(VerifyError::StalePredecessor { func: name, block, pred });
            }
        }
    }
    Ok(())
}

/// P2 and P4: every PHI's incoming set matches its block's predecessor set
/// one-for-one, and no PHI has collapsed to a single value without having
/// actually been removed.
fn verify_phis(func: &Function) -> Result<(), VerifyError> {
    let name = func.name.to_string();

    for block in func.block_ids() {
        for phi in func.phis(block) {
            let InstKind::Phi(incoming) = &func.insts[phi].kind else { unreachable!() };
            let preds = &func.blocks[block].preds;

            if incoming.len() != preds.len() {
                return Err(VerifyError::PhiArityMismatch {
                    func: name,
                    block,
                    phi,
                    operands: incoming.len(),
                    preds: preds.len(),
                });
            }
            for &pred in preds {
                if incoming.iter().filter(|inc| inc.pred == pred).count() != 1 {
                    return Err(VerifyError::PhiPredecessorMismatch { func: name, block, phi, pred });
                }
            }

            let phi_value = Value::Inst(phi);
            let mut distinct: Vec<Value> = Vec::new();
            for inc in incoming {
                if inc.value != phi_value && !distinct.contains(&inc.value) {
                    distinct.push(inc.value);
                }
            }
            if distinct.len() <= 1 && !incoming.is_empty() {
                return Err(VerifyError::TrivialPhi { func: name, block, phi });
            }
        }
    }
    Ok(())
}

/// P3: every use of an instruction's result must sit in a block the
/// instruction's own block dominates — except a PHI incoming value, whose
/// use is attributed to the named predecessor block rather than the block
/// the PHI itself sits in, since the value only needs to be live on that
/// specific edge.
fn verify_dominance(func: &Function) -> Result<(), VerifyError> {
    let name = func.name.to_string();
    let dom = crate::analysis::Dominators::compute(func);

    for block in func.block_ids() {
        for &id in &func.blocks[block].insts {
            match &func.insts[id].kind {
                InstKind::Phi(incoming) => {
                    for inc in incoming {
                        if let Value::Inst(def) = inc.value {
                            let def_block = func.insts[def].block;
                            if !dom.dominates(def_block, inc.pred) {
                                return Err(VerifyError::UseNotDominated {
                                    func: name,
                                    user: id,
                                    user_block: inc.pred,
                                    def,
                                    def_block,
                                });
                            }
                        }
                    }
                }
                kind => {
                    for operand in kind.operands() {
                        if let Value::Inst(def) = operand {
                            let def_block = func.insts[def].block;
                            let dominates = if def_block == block {
                                same_block_precedes(func, block, def, id)
                            } else {
                                dom.dominates(def_block, block)
                            };
                            if !dominates {
                                return Err(VerifyError::UseNotDominated {
                                    func: name,
                                    user: id,
                                    user_block: block,
                                    def,
                                    def_block,
                                });
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Within one block, `def` must appear before `user` in instruction order.
fn same_block_precedes(func: &Function, block: BlockId, def: InstId, user: InstId) -> bool {
    for &id in &func.blocks[block].insts {
        if id == def {
            return true;
        }
        if id == user {
            return false;
        }
    }
    unreachable!("both instructions must belong to this block")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Incoming};
    use mucc_sem::Type;
    use mucc_util::Symbol;

    #[test]
    fn well_formed_function_verifies() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let then_block = func.add_block();
        let else_block = func.add_block();
        let merge = func.add_block();

        let cond = func.push_inst(entry, Type::Int, InstKind::Cmp { op: CmpOp::Eq, lhs: Value::const_int(1), rhs: Value::const_int(1) });
        func.push_inst(entry, Type::Void, InstKind::CondBr { cond: Value::Inst(cond), then_block, else_block });
        func.add_edge(entry, then_block);
        func.add_edge(entry, else_block);

        func.push_inst(then_block, Type::Void, InstKind::Br(merge));
        func.add_edge(then_block, merge);
        func.push_inst(else_block, Type::Void, InstKind::Br(merge));
        func.add_edge(else_block, merge);

        let phi = func.prepend_phi(merge, Type::Int);
        func.insts[phi].kind = InstKind::Phi(vec![
            Incoming { value: Value::const_int(1), pred: then_block },
            Incoming { value: Value::const_int(2), pred: else_block },
        ]);
        func.push_inst(merge, Type::Void, InstKind::Ret(Some(Value::Inst(phi))));

        assert!(verify_function(&func).is_ok());
    }

    #[test]
    fn detects_phi_arity_mismatch() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let then_block = func.add_block();
        let else_block = func.add_block();
        let merge = func.add_block();

        let cond = func.push_inst(entry, Type::Int, InstKind::Cmp { op: CmpOp::Eq, lhs: Value::const_int(1), rhs: Value::const_int(1) });
        func.push_inst(entry, Type::Void, InstKind::CondBr { cond: Value::Inst(cond), then_block, else_block });
        func.add_edge(entry, then_block);
        func.add_edge(entry, else_block);
        func.push_inst(then_block, Type::Void, InstKind::Br(merge));
        func.add_edge(then_block, merge);
        func.push_inst(else_block, Type::Void, InstKind::Br(merge));
        func.add_edge(else_block, merge);

        let phi = func.prepend_phi(merge, Type::Int);
        func.insts[phi].kind = InstKind::Phi(vec![Incoming { value: Value::const_int(1), pred: then_block }]);
        func.push_inst(merge, Type::Void, InstKind::Ret(Some(Value::Inst(phi))));

        assert!(matches!(verify_function(&func), Err(VerifyError::PhiArityMismatch { .. })));
    }

    #[test]
    fn detects_use_not_dominated() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let a = func.add_block();
        let c = func.add_block();
        let merge = func.add_block();

        let cond = func.push_inst(entry, Type::Int, InstKind::Cmp { op: CmpOp::Eq, lhs: Value::const_int(1), rhs: Value::const_int(1) });
        func.push_inst(entry, Type::Void, InstKind::CondBr { cond: Value::Inst(cond), then_block: a, else_block: c });
        func.add_edge(entry, a);
        func.add_edge(entry, c);

        let defined_in_a = func.push_inst(a, Type::Int, InstKind::Math { op: crate::ir::MathOp::Add, lhs: Value::const_int(1), rhs: Value::const_int(1) });
        func.push_inst(a, Type::Void, InstKind::Br(merge));
        func.add_edge(a, merge);
        func.push_inst(c, Type::Void, InstKind::Br(merge));
        func.add_edge(c, merge);

        // `merge` is reachable via both `a` and `c`, so a direct (non-phi)
        // use of a value defined only in `a` is not dominated.
        func.push_inst(merge, Type::Void, InstKind::Ret(Some(Value::Inst(defined_in_a))));

        assert!(matches!(verify_function(&func), Err(VerifyError::UseNotDominated { .. })));
    }
}
