//! Runtime errors
//!
//! Dispatch errors come from operator and variable resolution, control errors
//! from the engine itself. Both are wrapped in a [`Fault`] that carries the
//! source location of the failing opcode.

use crate::calculator::{Operator, UnaryOperator};
use crate::program::SourceLocation;
use crate::value::{Value, ValueKind};
use thiserror::Error;

/// Operator dispatch and variable resolution failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("unsupported operation: cannot apply {op} ({symbol}) to {left} and {right}", symbol = .op.symbol())]
    UnsupportedOperation {
        op: Operator,
        left: String,
        right: String,
    },

    #[error("unsupported operation: cannot apply {op} to {operand}")]
    UnsupportedUnary { op: UnaryOperator, operand: String },

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("cannot convert {from} to {to}")]
    Conversion { from: String, to: ValueKind },
}

impl DispatchError {
    pub fn unsupported(op: Operator, left: &Value, right: &Value) -> Self {
        DispatchError::UnsupportedOperation {
            op,
            left: left.kind_name(),
            right: right.kind_name(),
        }
    }

    pub fn conversion(from: &Value, to: ValueKind) -> Self {
        DispatchError::Conversion {
            from: from.kind_name(),
            to,
        }
    }
}

/// Engine failures, fatal to the run they happen in
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("illegal jump target {target} (program has {len} instructions)")]
    IllegalJump { target: usize, len: usize },

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("operand stack overflow (limit {0})")]
    StackOverflow(usize),

    #[error("call depth exceeded (limit {0})")]
    CallDepthExceeded(usize),

    #[error("scope underflow: no lexical scope to pop")]
    ScopeUnderflow,

    #[error("wait is not allowed inside a trigger")]
    WaitInTrigger,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FaultKind {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Control(#[from] ControlError),
}

impl FaultKind {
    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::Dispatch(_) => "dispatch",
            FaultKind::Control(_) => "control",
        }
    }
}

/// A typed runtime fault tagged with the failing opcode's position
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {kind}")]
pub struct Fault {
    pub kind: FaultKind,
    pub location: SourceLocation,
    /// Instruction index of the failing opcode
    pub ip: usize,
}

impl Fault {
    pub fn new(kind: impl Into<FaultKind>, location: SourceLocation, ip: usize) -> Self {
        Self {
            kind: kind.into(),
            location,
            ip,
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self.kind, FaultKind::Dispatch(_))
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn column(&self) -> u32 {
        self.location.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vector3;

    #[test]
    fn test_unsupported_names_kinds_and_operator() {
        let err = DispatchError::unsupported(
            Operator::GreaterThan,
            &Value::from(1),
            &Value::from(Vector3::new(1.0, 0.0, 0.0)),
        );
        let msg = err.to_string();
        assert!(msg.contains("Scalar"));
        assert!(msg.contains("Vector"));
        assert!(msg.contains("GreaterThan"));
    }

    #[test]
    fn test_fault_display_has_location() {
        let fault = Fault::new(
            DispatchError::UndefinedVariable("x".into()),
            SourceLocation::new("boot.ks", 3, 7),
            4,
        );
        assert_eq!(fault.to_string(), "boot.ks:3:7: undefined variable 'x'");
        assert!(fault.is_dispatch());
        assert_eq!((fault.line(), fault.column()), (3, 7));
    }
}
