//! MIR crate: the SSA-form mid-level IR, its on-the-fly construction from an
//! AST, the optimizer pass pipeline, and structural verification.
//!
//! Layered as: [`ir`] (the data model) is built incrementally by [`ssa`]
//! (Braun-Buchwald-Hack construction) as [`emit`] walks an AST; [`analysis`]
//! computes dominance and loop structure for [`opt`]'s passes; [`verify`]
//! checks the invariants the builder and optimizer are meant to maintain.

pub mod analysis;
pub mod emit;
pub mod ir;
pub mod opt;
pub mod ssa;
pub mod verify;

pub use emit::emit_program;
pub use ir::*;
pub use opt::{optimize_function, optimize_module, Pass, PassManager};
pub use ssa::SsaBuilder;
pub use verify::{verify_function, verify_module, VerifyError};
