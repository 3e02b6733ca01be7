//! Dead-block elimination (§4.3.3): erase every block unreachable from the
//! entry by CFG edges, after first cleaning up its predecessor bookkeeping
//! in every successor (including other unreachable blocks — correctness
//! there doesn't matter since they are erased too, but skipping it would
//! leave a dangling predecessor reference on a still-live successor).

use crate::analysis::reachable_from_entry;
use crate::ir::Function;
use crate::opt::cfg_edit::remove_predecessor;
use crate::opt::Pass;

pub struct DeadBlocks;

impl Pass for DeadBlocks {
    fn name(&self) -> &'static str {
        "dead_blocks"
    }

    fn required_analyses(&self) -> &'static [&'static str] {
        &["constant_branch"]
    }

    fn preserves_cfg(&self) -> bool {
        false
    }

    fn run(&self, func: &mut Function) -> bool {
        let reachable = reachable_from_entry(func);
        let unreachable: Vec<_> = func.block_ids().filter(|b| !reachable.contains(b) && *b != func.entry).collect();
        if unreachable.is_empty() {
            return false;
        }

        for &block in &unreachable {
            for succ in func.successors(block) {
                remove_predecessor(func, succ, block);
            }
        }
        for &block in &unreachable {
            func.remove_block(block);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstKind, Value};
    use mucc_sem::Type;
    use mucc_util::Symbol;

    #[test]
    fn erases_unreachable_block_and_fixes_survivor_preds() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        let live = func.add_block();
        let dead = func.add_block();

        func.push_inst(entry, Type::Void, InstKind::Br(live));
        func.add_edge(entry, live);
        func.push_inst(live, Type::Void, InstKind::Ret(Some(Value::const_int(0))));

        // `dead` targets `live` too, but nothing branches to `dead` itself.
        func.push_inst(dead, Type::Void, InstKind::Br(live));
        func.add_edge(dead, live);

        assert!(DeadBlocks.run(&mut func));
        assert!(!func.block_ids().any(|b| b == dead));
        assert!(!func.blocks[live].preds.contains(&dead));
        assert_eq!(func.blocks[live].preds, vec![entry]);
    }

    #[test]
    fn self_loop_among_unreachable_blocks_does_not_hang() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        func.push_inst(entry, Type::Void, InstKind::Ret(None));

        let looped = func.add_block();
        func.push_inst(looped, Type::Void, InstKind::Br(looped));
        func.add_edge(looped, looped);

        assert!(DeadBlocks.run(&mut func));
        assert!(!func.block_ids().any(|b| b == looped));
    }

    #[test]
    fn leaves_entry_alone_even_if_unreferenced() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let entry = func.add_block();
        func.entry = entry;
        func.push_inst(entry, Type::Void, InstKind::Ret(None));

        assert!(!DeadBlocks.run(&mut func));
        assert!(func.block_ids().any(|b| b == entry));
    }
}
