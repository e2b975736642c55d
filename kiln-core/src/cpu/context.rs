//! Resumable execution state of one context (the main program or a trigger run)

use crate::error::ControlError;
use crate::value::Value;
use crate::variable::ScopeStack;

/// Where a `Return` resumes and how many scopes it unwinds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    pub return_ip: usize,
    pub scope_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub ip: usize,
    pub stack: Vec<Value>,
    pub calls: Vec<CallFrame>,
    pub scopes: ScopeStack,
}

impl Context {
    pub fn at(entry: usize) -> Self {
        Self {
            ip: entry,
            ..Self::default()
        }
    }

    /// Trigger context: starts at `entry` with the payload already on the stack
    pub fn for_trigger(entry: usize, payload: Vec<Value>) -> Self {
        Self {
            ip: entry,
            stack: payload,
            ..Self::default()
        }
    }

    pub fn push(&mut self, value: Value, limit: usize) -> Result<(), ControlError> {
        if self.stack.len() >= limit {
            return Err(ControlError::StackOverflow(limit));
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, ControlError> {
        self.stack.pop().ok_or(ControlError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&Value, ControlError> {
        self.stack.last().ok_or(ControlError::StackUnderflow)
    }

    /// Lowest scope depth `PopScope` may unwind to in the current call
    pub fn scope_floor(&self) -> usize {
        self.calls.last().map_or(0, |frame| frame.scope_depth + 1)
    }
}
