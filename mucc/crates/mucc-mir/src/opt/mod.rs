//! The optimizer pass pipeline (§4.3): a fixed, dependency-respecting
//! schedule of function-level passes, each declaring what it requires and
//! whether it preserves the CFG's topology.
//!
//! Passes run in this order: constant folding/propagation, constant-branch
//! folding, dead-block elimination, loop-invariant code motion. Later
//! passes depend on earlier ones having already run on the same function;
//! the manager asserts this rather than silently reordering, since a
//! dependency violation here is a compiler bug, not a recoverable error
//! (§7).

mod cfg_edit;
mod constant_branch;
mod constant_ops;
mod dead_blocks;
mod licm;

pub use constant_branch::ConstantBranch;
pub use constant_ops::ConstantOps;
pub use dead_blocks::DeadBlocks;
pub use licm::Licm;

use mucc_util::FxHashSet;
use rayon::prelude::*;

use crate::ir::{Function, Module};

/// One optimizer pass. `required_analyses` names the passes (by
/// [`Pass::name`]) that must have run, and not since been invalidated, on
/// this function before this pass may run.
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;
    fn required_analyses(&self) -> &'static [&'static str];
    /// Whether this pass leaves the CFG topologically unchanged (same
    /// block set, same edges). A pass that answers `false` invalidates
    /// every previously-completed pass's currency, since CFG-derived
    /// analyses (dominators, loop info, predecessor lists) computed before
    /// the edit may no longer describe the function.
    fn preserves_cfg(&self) -> bool;
    /// Run the pass on one function, returning whether it changed
    /// anything.
    fn run(&self, func: &mut Function) -> bool;
}

/// Schedules and runs the fixed pass pipeline over one function or an
/// entire module.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::standard()
    }
}

impl PassManager {
    /// The pipeline from §2/§4.3: `ConstantOps → ConstantBranch →
    /// DeadBlocks → LICM`.
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Box::new(ConstantOps),
                Box::new(ConstantBranch),
                Box::new(DeadBlocks),
                Box::new(Licm),
            ],
        }
    }

    /// Run every scheduled pass on `func` in order, returning whether any
    /// pass changed it. Asserts each pass's `required_analyses` are
    /// satisfied before running it — a failure here means the pipeline
    /// itself is misconfigured, not that the input program is invalid.
    pub fn run_function(&self, func: &mut Function) -> bool {
        let mut valid: FxHashSet<&'static str> = FxHashSet::default();
        let mut changed_overall = false;

        for pass in &self.passes {
            for dep in pass.required_analyses() {
                assert!(
                    valid.contains(dep),
                    "optimizer pass `{}` scheduled before its required analysis `{}`",
                    pass.name(),
                    dep
                );
            }

            let changed = pass.run(func);
            changed_overall |= changed;

            if !pass.preserves_cfg() {
                valid.clear();
            }
            valid.insert(pass.name());

            tracing::debug!(pass = pass.name(), changed, "ran optimizer pass");
        }

        changed_overall
    }

    /// Run the pipeline over every non-extern function in `module`.
    /// Functions are independent (§5): each gets its own pipeline run,
    /// fanned out with `rayon` at the module level.
    pub fn run_module(&self, module: &mut Module) {
        module.functions.as_mut_slice().par_iter_mut().filter(|f| !f.is_extern).for_each(|func| {
            self.run_function(func);
        });
    }
}

/// Convenience entry point: build the standard pipeline and run it once
/// over every function in `module`.
pub fn optimize_module(module: &mut Module) {
    PassManager::standard().run_module(module);
}

/// Run the standard pipeline once over a single function.
pub fn optimize_function(func: &mut Function) -> bool {
    PassManager::standard().run_function(func)
}
