//! Constant folding / propagation (§4.3.1). Required first in the
//! pipeline: every later pass (`ConstantBranch` most directly) depends on
//! constants having already been folded and propagated into every use,
//! including terminator operands.

use mucc_sem::Type;

use crate::ir::{BlockId, CmpOp, Function, InstId, InstKind, MathOp, Value};
use crate::opt::Pass;

pub struct ConstantOps;

impl Pass for ConstantOps {
    fn name(&self) -> &'static str {
        "constant_ops"
    }

    fn required_analyses(&self) -> &'static [&'static str] {
        &[]
    }

    fn preserves_cfg(&self) -> bool {
        true
    }

    /// Folds to a fixpoint within the function: folding one instruction can
    /// turn a user into an all-constant instruction too (propagation), so a
    /// single top-to-bottom pass isn't enough in general.
    fn run(&self, func: &mut Function) -> bool {
        let mut changed = false;
        loop {
            let mut folded_any = false;
            let block_ids: Vec<BlockId> = func.block_ids().collect();
            for block in block_ids {
                let inst_ids: Vec<InstId> = func.blocks[block].insts.clone();
                for id in inst_ids {
                    if let Some(folded) = try_fold(func, id) {
                        func.replace_all_uses(Value::Inst(id), folded);
                        func.remove_inst(id);
                        folded_any = true;
                    }
                }
            }
            changed |= folded_any;
            if !folded_any {
                break;
            }
        }
        changed
    }
}

fn try_fold(func: &Function, id: InstId) -> Option<Value> {
    let inst = &func.insts[id];
    match &inst.kind {
        InstKind::Math { op, lhs, rhs } => fold_math(*op, lhs.as_const()?, rhs.as_const()?, &inst.result_ty),
        InstKind::Cmp { op, lhs, rhs } => Some(Value::const_int(fold_cmp(*op, lhs.as_const()?, rhs.as_const()?))),
        // The emitter's zero-extend is a no-op on this IR's representation
        // (a compare's result is already an `Int`-typed 0/1); folding it
        // through a constant operand is just propagating the bits.
        InstKind::ZExt(v) => Some(Value::const_int(v.as_const()?)),
        InstKind::Not(v) => Some(Value::const_int((v.as_const()? == 0) as i64)),
        InstKind::IntCast(v) | InstKind::CharCast(v) => {
            Some(Value::Constant { ty: inst.result_ty.clone(), bits: truncate_to_width(v.as_const()?, inst.result_ty.int_width()) })
        }
        _ => None,
    }
}

fn fold_math(op: MathOp, l: i64, r: i64, ty: &Type) -> Option<Value> {
    let result = match op {
        MathOp::Add => l.wrapping_add(r),
        MathOp::Sub => l.wrapping_sub(r),
        MathOp::Mul => l.wrapping_mul(r),
        // Leave the instruction in place rather than trap at compile time.
        MathOp::SDiv => {
            if r == 0 {
                return None;
            }
            l.wrapping_div(r)
        }
        MathOp::SRem => {
            if r == 0 {
                return None;
            }
            l.wrapping_rem(r)
        }
    };
    Some(Value::Constant { ty: ty.clone(), bits: truncate_to_width(result, ty.int_width()) })
}

fn fold_cmp(op: CmpOp, l: i64, r: i64) -> i64 {
    let (l, r) = (l as i32, r as i32);
    let result = match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        CmpOp::Slt => l < r,
        CmpOp::Sgt => l > r,
    };
    result as i64
}

/// Two's-complement wrap into a 32- or 8-bit signed range.
fn truncate_to_width(v: i64, width: u32) -> i64 {
    match width {
        8 => (v as i8) as i64,
        _ => (v as i32) as i64,
    }
}
