//! Dominator tree and natural-loop discovery, the two analyses LICM depends
//! on. Dominance is computed with the textbook iterate-to-fixpoint
//! algorithm rather than Lengauer-Tarjan — functions in this pipeline are
//! small enough that the simpler algorithm's worse asymptotics never
//! matter, and it reads far closer to the definition.

use std::collections::VecDeque;

use mucc_util::{FxHashMap, FxHashSet};

use crate::ir::{BlockId, Function};

pub struct Dominators {
    entry: BlockId,
    idom: FxHashMap<BlockId, BlockId>,
}

impl Dominators {
    pub fn compute(func: &Function) -> Self {
        let blocks: Vec<BlockId> = func.block_ids().collect();
        let entry = func.entry;

        let mut doms: FxHashMap<BlockId, FxHashSet<BlockId>> = FxHashMap::default();
        for &b in &blocks {
            let set = if b == entry { [entry].into_iter().collect() } else { blocks.iter().copied().collect() };
            doms.insert(b, set);
        }

        let preds = predecessor_map(func, &blocks);

        let mut changed = true;
        while changed {
            changed = false;
            for &b in &blocks {
                if b == entry {
                    continue;
                }
                let mut new_dom: Option<FxHashSet<BlockId>> = None;
                for &p in preds.get(&b).into_iter().flatten() {
                    let pred_dom = &doms[&p];
                    new_dom = Some(match new_dom {
                        None => pred_dom.clone(),
                        Some(acc) => acc.intersection(pred_dom).copied().collect(),
                    });
                }
                let mut new_dom = new_dom.unwrap_or_default();
                new_dom.insert(b);
                if new_dom != doms[&b] {
                    doms.insert(b, new_dom);
                    changed = true;
                }
            }
        }

        let mut idom = FxHashMap::default();
        for &b in &blocks {
            if b == entry {
                continue;
            }
            // the immediate dominator is the one strict dominator that is
            // itself dominated by every other strict dominator of `b`.
            let strict: Vec<BlockId> = doms[&b].iter().copied().filter(|&d| d != b).collect();
            for &candidate in &strict {
                let dominates_all_others =
                    strict.iter().all(|&other| other == candidate || doms[&other].contains(&candidate));
                if dominates_all_others {
                    idom.insert(b, candidate);
                    break;
                }
            }
        }

        Self { entry, idom }
    }

    /// Does `a` dominate `b` (reflexively — every block dominates itself)?
    pub fn dominates(&self, a: BlockId, mut b: BlockId) -> bool {
        loop {
            if a == b {
                return true;
            }
            match self.idom.get(&b) {
                Some(&next) => b = next,
                None => return b == self.entry && a == self.entry,
            }
        }
    }

    pub fn immediate_dominator(&self, b: BlockId) -> Option<BlockId> {
        self.idom.get(&b).copied()
    }

    /// Dominator-tree pre-order, restricted to `within` (LICM uses this to
    /// visit exactly one loop's blocks so nested-loop blocks are handled
    /// once, as their own loop).
    pub fn preorder(&self, func: &Function, within: &FxHashSet<BlockId>) -> Vec<BlockId> {
        let mut children: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
        for &b in within {
            if let Some(&idom) = self.idom.get(&b) {
                children.entry(idom).or_default().push(b);
            }
        }

        let mut order = Vec::new();
        let start = if within.contains(&func.entry) {
            func.entry
        } else {
            match within.iter().min_by_key(|b| b.0) {
                Some(&b) => b,
                None => return order,
            }
        };
        let mut stack = vec![start];
        let mut visited = FxHashSet::default();
        while let Some(b) = stack.pop() {
            if !visited.insert(b) {
                continue;
            }
            if within.contains(&b) {
                order.push(b);
            }
            if let Some(kids) = children.get(&b) {
                for &k in kids.iter().rev() {
                    stack.push(k);
                }
            }
        }
        order
    }
}

/// Blocks reachable from the entry block by depth-first traversal of CFG
/// edges (`DeadBlocks`, §4.3.3). Handles self-loops and other cycles among
/// unreachable blocks without revisiting, since `visited` guards the walk.
pub fn reachable_from_entry(func: &Function) -> FxHashSet<BlockId> {
    let mut visited = FxHashSet::default();
    let mut stack = vec![func.entry];
    while let Some(b) = stack.pop() {
        if !visited.insert(b) {
            continue;
        }
        for succ in func.successors(b) {
            if !visited.contains(&succ) {
                stack.push(succ);
            }
        }
    }
    visited
}

fn predecessor_map(func: &Function, blocks: &[BlockId]) -> FxHashMap<BlockId, Vec<BlockId>> {
    let mut preds: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
    for &b in blocks {
        preds.entry(b).or_default();
    }
    for &b in blocks {
        for succ in func.successors(b) {
            preds.entry(succ).or_default().push(b);
        }
    }
    preds
}

/// A single natural loop: header plus every block that can reach a latch
/// (a predecessor of the header dominated by it) without passing back
/// through the header.
pub struct Loop {
    pub header: BlockId,
    pub blocks: FxHashSet<BlockId>,
    /// The loop's unique out-of-loop, header-dominating predecessor, if it
    /// has exactly one. `None` means LICM must skip this loop.
    pub preheader: Option<BlockId>,
}

pub fn find_loops(func: &Function, dom: &Dominators) -> Vec<Loop> {
    let blocks: Vec<BlockId> = func.block_ids().collect();
    let mut loops = Vec::new();

    for &header in &blocks {
        let latches: Vec<BlockId> =
            func.blocks[header].preds.iter().copied().filter(|&p| dom.dominates(header, p)).collect();
        if latches.is_empty() {
            continue;
        }

        let mut in_loop: FxHashSet<BlockId> = [header].into_iter().collect();
        let mut worklist: VecDeque<BlockId> = latches.iter().copied().collect();
        in_loop.extend(latches.iter().copied());
        while let Some(b) = worklist.pop_front() {
            if b == header {
                continue;
            }
            for &p in &func.blocks[b].preds {
                if in_loop.insert(p) {
                    worklist.push_back(p);
                }
            }
        }

        let out_of_loop_preds: Vec<BlockId> =
            func.blocks[header].preds.iter().copied().filter(|p| !in_loop.contains(p)).collect();
        let preheader = match out_of_loop_preds.as_slice() {
            [single] if dom.dominates(*single, header) => Some(*single),
            _ => None,
        };

        loops.push(Loop { header, blocks: in_loop, preheader });
    }

    loops
}
