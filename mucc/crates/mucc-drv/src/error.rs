//! Driver-level error type (§4.4, §7). Wraps the errors from lower crates
//! with `#[from]` rather than re-modeling them; ambient failures (unknown
//! CLI input) get their own variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unknown scenario `{name}`; available: {available}")]
    UnknownScenario { name: String, available: String },

    #[error("missing value for `{0}`")]
    MissingFlagValue(String),

    #[error("unrecognized argument `{0}`")]
    UnrecognizedArgument(String),

    #[error("no `--ast` scenario given; pass one with `--ast <name>`")]
    NoScenarioGiven,

    #[error(transparent)]
    Verify(#[from] mucc_mir::VerifyError),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;
