//! mucc-drv - compiler driver
//!
//! Ties the emitter, optimizer and verifier together behind a small CLI
//! (§4.4): emit the chosen `--ast` scenario to IR, verify, optionally
//! optimize, verify again, and optionally print the result. No lexer or
//! parser lives here (§1); `--ast` stands in for both.

pub mod config;
pub mod error;
pub mod scenarios;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mucc_mir::{emit_program, optimize_module, verify_module, Module};

pub use config::{Config, EmitKind, OptLevel};
pub use error::{DriverError, DriverResult};

/// Run one compilation as configured: emit, verify, optionally optimize,
/// verify again (§7's "emit -> verify -> optimize -> verify" round-trip
/// law). Returns the built module so callers (tests, `main`) can inspect it
/// without re-parsing the textual dump.
pub fn compile(config: &Config) -> DriverResult<Module> {
    let name = config.scenario.as_deref().ok_or(DriverError::NoScenarioGiven)?;
    let (table, program) = scenarios::scenario(name).ok_or_else(|| DriverError::UnknownScenario {
        name: name.to_string(),
        available: scenarios::SCENARIO_NAMES.join(", "),
    })?;

    let mut module = tracing::info_span!("emit", scenario = name).in_scope(|| emit_program(&table, &program));

    tracing::info_span!("verify", stage = "post-emit").in_scope(|| verify_module(&module))?;

    if config.opt_level == OptLevel::O1 {
        tracing::info_span!("optimize").in_scope(|| optimize_module(&mut module));
        tracing::info_span!("verify", stage = "post-optimize").in_scope(|| verify_module(&module))?;
    }

    Ok(module)
}

/// Entry point shared by `main` and CLI-level tests: parse arguments, run
/// the pipeline, print output per `--emit-ir`.
pub fn run(args: &[String]) -> DriverResult<()> {
    let config = config::parse_args(args)?;
    let module = compile(&config)?;

    match config.emit {
        EmitKind::Ir => {
            for function in module.functions.as_slice() {
                println!("{function:#?}");
            }
        }
        EmitKind::None => println!("ok: `{}` verified", config.scenario.as_deref().unwrap_or("")),
    }

    Ok(())
}

/// Install the `tracing` subscriber (§4.4): `RUST_LOG`-driven level, `info`
/// by default, via the usual `fmt`+`EnvFilter` setup.
pub fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) };

    let _ = tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_scenario_emits_and_verifies_through_the_full_pipeline() {
        for &name in scenarios::SCENARIO_NAMES {
            let config = Config { scenario: Some(name.to_string()), ..Config::default() };
            compile(&config).unwrap_or_else(|e| panic!("scenario `{name}` failed: {e}"));
        }
    }

    #[test]
    fn unknown_scenario_is_a_driver_error() {
        let config = Config { scenario: Some("nope".to_string()), ..Config::default() };
        assert!(matches!(compile(&config), Err(DriverError::UnknownScenario { .. })));
    }

    #[test]
    fn no_scenario_given_is_a_driver_error() {
        let config = Config::default();
        assert!(matches!(compile(&config), Err(DriverError::NoScenarioGiven)));
    }

    #[test]
    fn licm_scenario_runs_through_optimize_without_error() {
        let config = Config { scenario: Some("licm_invariant".to_string()), opt_level: OptLevel::O1, ..Config::default() };
        let module = compile(&config).unwrap();
        assert_eq!(module.functions.len(), 1);
    }

    #[test]
    fn run_with_no_args_reports_missing_scenario() {
        assert!(matches!(run(&args(&[])), Err(DriverError::NoScenarioGiven)));
    }
}
