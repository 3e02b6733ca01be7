//! Parser-reported semantic errors (§7, regime 1).
//!
//! These are user errors accumulated while resolving identifiers and
//! checking types; when any are present, the emitter is never invoked. This
//! crate models the contract the real parser's semantic pass would satisfy,
//! for the hand-built ASTs it constructs in tests and the driver's debug
//! path.

use mucc_util::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemError {
    #[error("undefined identifier `{0}`")]
    UndefinedIdentifier(Symbol),

    #[error("`{0}` is not an array")]
    NotAnArray(Symbol),

    #[error("wrong argument count for `{name}`: expected {expected}, found {found}")]
    WrongArgumentCount {
        name: Symbol,
        expected: usize,
        found: usize,
    },

    #[error("duplicate declaration of `{0}` in this scope")]
    DuplicateDeclaration(Symbol),
}

pub type SemResult<T> = std::result::Result<T, SemError>;
