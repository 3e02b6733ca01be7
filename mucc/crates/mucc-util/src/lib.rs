//! mucc-util - Core Utilities and Foundation Types
//!
//! Fundamental utilities shared by every compiler stage: string interning
//! ([`symbol`]), typed arena indices ([`IndexVec`]/[`Idx`]), source locations
//! ([`span`]), diagnostics ([`diagnostic`]), and the crate's own error types
//! ([`error`]).
//!
//! None of these types are specific to μC; they are the load-bearing
//! scaffolding every other crate in the workspace builds on.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
