//! Kiln API - Execution orchestration layer
//!
//! Provides the hosted execution interface, including:
//! - Sessions wiring a CPU to the update handler and keyboard input
//! - Configuration abstraction (RunConfig)
//! - Unified error handling (KilnError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(program, &config)` API.

use kiln_log::{debug, info};

pub mod config;
pub use config::{config as get_config, config_or_default, init as init_config, is_initialized, RunConfig};

// Re-export config types from kiln_config
pub use kiln_config::{CpuConfig, KilnConfig, LimitConfig, LogLevel};

pub mod error;
pub mod input;
pub mod session;
pub mod types;
pub use error::{ErrorDetails, ErrorReport, KilnError};
pub use input::{InputRouter, Key};
pub use session::Session;
pub use types::ExecuteOutput;

// Re-export core types
pub use kiln_config;
pub use kiln_core::{Phase, Program, SliceStatus, Value};

/// Parse a compiled program from its JSON form
pub fn load_program(source: &str) -> Result<Program, KilnError> {
    Ok(Program::from_json(source)?)
}

/// Run `program` to completion under a simulated host clock
///
/// This is the recommended API for library users. Each tick advances the
/// frame clock by `frame_delta` and the physics clock by `fixed_delta`; the
/// run fails with [`KilnError::TickLimit`] if the program is still going after
/// `max_ticks` physics steps.
pub fn run(program: Program, config: &RunConfig) -> Result<ExecuteOutput, KilnError> {
    run_with_input(program, config, "")
}

/// Like [`run`], typing one character of `input` per tick while the program runs
pub fn run_with_input(program: Program, config: &RunConfig, input: &str) -> Result<ExecuteOutput, KilnError> {
    info!(config.logger, "Starting execution");

    let mut session = Session::new(config);
    session.load(program);

    if config.dump_program {
        info!(config.logger, "program listing:\n{}", session.code_fragment());
    }

    let mut keys = input.chars();
    let mut status = SliceStatus::Idle;
    while !session.is_idle() {
        if session.ticks() >= config.max_ticks {
            session.teardown();
            return Err(KilnError::TickLimit(config.max_ticks));
        }
        if let Some(ch) = keys.next() {
            session.press(Key::Char(ch));
        }
        if let Some(last) = session.tick(config)?.last() {
            status = last.status;
        }
    }
    debug!(config.logger, "finished after {} ticks", session.ticks());

    let output = ExecuteOutput {
        output: session.take_output(),
        ticks: session.ticks(),
        status,
        trigger_faults: session.take_trigger_faults(),
        nags: session.diagnostics().pending_nags(),
    };
    session.teardown();

    info!(config.logger, "Execution completed");
    Ok(output)
}

/// Load and run a JSON program (uses global config)
///
/// # Panics
/// If global config is not initialized
pub fn run_json(source: &str) -> Result<ExecuteOutput, KilnError> {
    let config = get_config();
    run(load_program(source)?, config)
}

/// Quick run with default config (auto-initializes if needed)
pub fn quick_run(program: Program) -> Result<ExecuteOutput, KilnError> {
    run(program, config_or_default())
}
