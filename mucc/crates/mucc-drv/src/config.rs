//! Driver configuration (§4.4): a manual `Config` struct built by hand-rolled
//! argument parsing, with no CLI-parsing crate pulled in for this binary.

use crate::error::{DriverError, DriverResult};

/// Whether the optimizer pipeline runs at all. μC's pipeline is not staged
/// into multiple numbered levels (§4.3 runs the whole fixed schedule or none
/// of it), so this is a plain on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    /// Skip the optimizer; verify the emitted IR as-is.
    O0,
    /// Run the standard pass pipeline (§4.3).
    O1,
}

impl Default for OptLevel {
    fn default() -> Self {
        OptLevel::O1
    }
}

/// What to print after the pipeline runs. "emit-bitcode"/"emit-assembly"
/// from §6's flag surface collapse to this one textual form since the
/// backend is out of scope (§1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    /// Only run verification; print nothing but a status line.
    None,
    /// Print the module's IR in its textual debug form.
    Ir,
}

impl Default for EmitKind {
    fn default() -> Self {
        EmitKind::None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Name of a built-in `--ast` scenario standing in for a parsed source
    /// unit (§1: no lexer/parser in scope).
    pub scenario: Option<String>,
    pub opt_level: OptLevel,
    pub emit: EmitKind,
    pub verbose: bool,
}

/// Parse `mucc --ast <name> [--no-optimize] [--emit-ir] [-v|--verbose]`.
/// No CLI-parsing crate: every flag is matched by hand over a plain
/// argument iterator.
pub fn parse_args(args: &[String]) -> DriverResult<Config> {
    let mut config = Config::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ast" => {
                let name = iter.next().ok_or_else(|| DriverError::MissingFlagValue("--ast".to_string()))?;
                config.scenario = Some(name.clone());
            }
            "--no-optimize" => config.opt_level = OptLevel::O0,
            "--emit-ir" => config.emit = EmitKind::Ir,
            "-v" | "--verbose" => config.verbose = true,
            other => return Err(DriverError::UnrecognizedArgument(other.to_string())),
        }
    }

    Ok(config)
}
