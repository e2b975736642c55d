//! Kiln Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It is the shared configuration vocabulary of every Kiln crate, and every
//! type deserializes with defaults so a project file only has to name the
//! values it overrides.

use serde::{Deserialize, Serialize};

/// Per-tick execution budgets of the CPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Opcodes the main program may execute in one host update
    pub instructions_per_update: usize,
    /// Opcodes a trigger run may execute per update; the rest waits for the next one
    pub trigger_instruction_budget: usize,
}

/// Configuration for execution limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum operand stack depth
    pub max_stack_size: usize,
    /// Maximum call depth
    pub max_recursion_depth: usize,
}

/// Log level names accepted in project files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Runtime subsystem an error or log record belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Loader,
    Dispatch,
    Cpu,
    Trigger,
    Scheduler,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Loader => "loader",
            Phase::Dispatch => "dispatch",
            Phase::Cpu => "cpu",
            Phase::Trigger => "trigger",
            Phase::Scheduler => "scheduler",
        }
    }
}

/// Aggregate configuration as it appears in a project file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub cpu: CpuConfig,
    pub limits: LimitConfig,
    pub log_level: Option<LogLevel>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            instructions_per_update: 200,
            trigger_instruction_budget: 200,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 1024,
            max_recursion_depth: 256,
        }
    }
}
