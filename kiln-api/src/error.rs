//! API error types
//!
//! A unified error type plus a structured, serializable report for CLI and
//! tooling output.

use kiln_config::Phase;
use kiln_core::{ControlError, Fault, FaultKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KilnError {
    /// The program or project file could not be parsed
    #[error("failed to load: {message}")]
    Load {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// The main program faulted
    #[error("{0}")]
    Fault(#[from] Fault),

    #[error("program still running after {0} ticks")]
    TickLimit(u64),
}

impl From<serde_json::Error> for KilnError {
    fn from(err: serde_json::Error) -> Self {
        KilnError::Load {
            message: err.to_string(),
            line: Some(err.line()),
            column: Some(err.column()),
        }
    }
}

impl KilnError {
    pub fn line(&self) -> Option<usize> {
        match self {
            KilnError::Load { line, .. } => *line,
            KilnError::Fault(fault) => Some(fault.line() as usize),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            KilnError::Load { column, .. } => *column,
            KilnError::Fault(fault) => Some(fault.column() as usize),
            _ => None,
        }
    }

    /// Name of the subsystem that failed
    pub fn phase(&self) -> &'static str {
        match self {
            KilnError::Load { .. } => Phase::Loader.as_str(),
            KilnError::Config(_) => "config",
            KilnError::Fault(fault) => match fault.kind {
                FaultKind::Dispatch(_) => Phase::Dispatch.as_str(),
                FaultKind::Control(ControlError::WaitInTrigger) => Phase::Trigger.as_str(),
                FaultKind::Control(_) => Phase::Cpu.as_str(),
            },
            KilnError::TickLimit(_) => Phase::Scheduler.as_str(),
        }
    }

    /// Structured view for CLI printing or JSON output
    pub fn to_report(&self) -> ErrorReport {
        let (error_kind, message, details) = match self {
            KilnError::Load { message, .. } => ("LoadError".to_string(), message.clone(), None),
            KilnError::Config(msg) => ("ConfigError".to_string(), msg.clone(), None),
            KilnError::Fault(fault) => (
                fault_kind_name(&fault.kind),
                fault.kind.to_string(),
                Some(ErrorDetails::Location {
                    file: fault.location.file.clone(),
                    ip: fault.ip,
                }),
            ),
            KilnError::TickLimit(_) => ("TickLimit".to_string(), self.to_string(), None),
        };
        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            column: self.column(),
            error_kind,
            message,
            details,
        }
    }
}

/// Variant name of the inner error, e.g. `UnsupportedOperation`
fn fault_kind_name(kind: &FaultKind) -> String {
    let debug = match kind {
        FaultKind::Dispatch(e) => format!("{e:?}"),
        FaultKind::Control(e) => format!("{e:?}"),
    };
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Structured error report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Failing subsystem: loader, config, dispatch, cpu, scheduler
    pub phase: &'static str,
    /// 1-based line, if known
    pub line: Option<usize>,
    /// 1-based column, if known
    pub column: Option<usize>,
    /// Machine-readable error kind
    pub error_kind: String,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetails {
    /// Where in the program the fault happened
    Location { file: String, ip: usize },
}

impl std::fmt::Display for ErrorReport {
    /// CLI-friendly format
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                write!(f, "[{}:{}] {} error: {}", line, col, self.phase, self.message)
            }
            _ => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// One-line form without the phase
    pub fn to_short(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{}:{}: {}", line, col, self.message),
            _ => self.message.clone(),
        }
    }
}
