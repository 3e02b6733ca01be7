//! Shared CFG-editing helper for the two passes that drop predecessor
//! edges (`ConstantBranch`, `DeadBlocks`): removing an edge means dropping
//! the source from the target's predecessor list and, for every PHI at the
//! target, the incoming pair for that predecessor.
//!
//! §9's open question ("the constant-branch pass must update PHIs in the
//! dropped successor ... some PHIs may become trivial as a result") is
//! resolved here rather than with a separate CFG-simplify sweep: every PHI
//! touched by an edge removal is re-checked with
//! [`Function::try_remove_trivial_phi`], the same routine the SSA builder
//! uses, right at the edit site where the touched PHIs are already in
//! hand.

use crate::ir::{BlockId, Function, InstKind};

/// Drop the edge `pred -> block`: remove `pred` from `block`'s predecessor
/// list, drop its incoming pair from every PHI at the head of `block`, and
/// re-simplify any PHI that becomes trivial as a result.
pub(super) fn remove_predecessor(func: &mut Function, block: BlockId, pred: BlockId) {
    func.blocks[block].preds.retain(|&p| p != pred);

    let phi_ids: Vec<_> = func.phis(block).collect();
    for phi in phi_ids {
        if let InstKind::Phi(incoming) = &mut func.insts[phi].kind {
            incoming.retain(|inc| inc.pred != pred);
        }
        func.try_remove_trivial_phi(phi);
    }
}
