//! API-level configuration
//!
//! `RunConfig` bundles the engine configuration with the simulated host clock
//! used by [`run`](crate::run), plus a global singleton for CLI use.

use kiln_config::{CpuConfig, LimitConfig};
use kiln_log::Logger;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Execution configuration
#[derive(Clone)]
pub struct RunConfig {
    /// Per-update budgets
    pub cpu: CpuConfig,
    /// Stack and call depth limits
    pub limits: LimitConfig,
    /// Seconds per physics step
    pub fixed_delta: f64,
    /// Seconds per rendered frame
    pub frame_delta: f64,
    /// Physics steps before `run` gives up on an unfinished program
    pub max_ticks: u64,
    /// Log the program listing before running it
    pub dump_program: bool,
    pub logger: Arc<Logger>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("cpu", &self.cpu)
            .field("limits", &self.limits)
            .field("fixed_delta", &self.fixed_delta)
            .field("frame_delta", &self.frame_delta)
            .field("max_ticks", &self.max_ticks)
            .field("dump_program", &self.dump_program)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            limits: LimitConfig::default(),
            fixed_delta: 0.02,
            frame_delta: 1.0 / 60.0,
            max_ticks: 10_000,
            dump_program: false,
            logger: Logger::noop(),
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration (must be called once before any operation)
///
/// # Panics
/// If config is already initialized
pub fn init(config: RunConfig) {
    GLOBAL_CONFIG
        .set(config)
        .expect("Config already initialized");
}

/// Get global config reference
///
/// # Panics
/// If config is not initialized
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get().expect("Config not initialized")
}

/// Global config, initialized with defaults on first use
pub fn config_or_default() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert!(!cfg.dump_program);
        assert_eq!(cfg.fixed_delta, 0.02);
        assert_eq!(cfg.cpu.instructions_per_update, 200);
        assert_eq!(cfg.limits.max_stack_size, 1024);
        assert_eq!(cfg.limits.max_recursion_depth, 256);
    }

    #[test]
    fn test_run_config_debug() {
        let debug_str = format!("{:?}", RunConfig::default());
        assert!(debug_str.contains("fixed_delta"));
        assert!(debug_str.contains("max_ticks"));
        assert!(!debug_str.contains("logger"));
    }

    #[test]
    fn test_global_config_or_default() {
        let cfg = config_or_default();
        assert!(is_initialized());
        assert!(std::ptr::eq(cfg, config()));
    }
}
