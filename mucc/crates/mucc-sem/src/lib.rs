//! mucc-sem - μC's type, identifier and AST surface.
//!
//! This crate is the narrow interface the emitter consumes (§6): a closed
//! [`Type`] tag set, the [`Identifier`]/[`SymbolTable`] contract, and the
//! closed [`ast`] node set the parser would hand the emitter. It does not
//! scan or parse μC source text; that front end is an external
//! collaborator assumed to exist upstream.

pub mod ast;
pub mod error;
pub mod ident;
pub mod types;

pub use error::{SemError, SemResult};
pub use ident::{AllocId, IdentId, Identifier, SymbolTable};
pub use types::Type;
