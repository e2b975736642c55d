//! Opcode interpreter
//!
//! `Machine` borrows everything one slice needs from the CPU and steps a
//! [`Context`] forward. It never owns state, so a slice can stop after any
//! opcode and resume later from the context alone.

use super::context::{CallFrame, Context};
use crate::calculator::{Dispatcher, OperandPair};
use crate::error::{ControlError, Fault, FaultKind};
use crate::program::{Opcode, Program};
use crate::trigger::{Delegate, TriggerRegistry};
use crate::value::ScalarValue;
use crate::variable::{Environment, Scope};
use kiln_config::LimitConfig;
use kiln_log::Logger;

/// Result of one opcode
enum Step {
    Continue,
    Wait(f64),
    Break,
    End,
}

/// Why a run of opcodes stopped
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Halt {
    /// The budget ran out before anything else happened
    Budget,
    /// `Wait` popped this many seconds
    Wait(f64),
    Break,
    /// Outermost `Return` or end of program; carries the top of the operand stack
    End(Option<crate::Value>),
}

pub(crate) struct Machine<'a> {
    pub program: &'a Program,
    pub globals: &'a mut Scope,
    pub dispatcher: &'a Dispatcher,
    pub triggers: &'a mut TriggerRegistry,
    pub output: &'a mut Vec<String>,
    pub limits: &'a LimitConfig,
    pub logger: &'a Logger,
    pub in_trigger: bool,
}

impl Machine<'_> {
    /// Execute at most `budget` opcodes of `ctx`.
    ///
    /// Returns the number executed and why execution stopped. The end of the
    /// program is checked before the budget, so a run that consumes exactly
    /// its budget on the last opcode still reports `End`.
    pub fn run(&mut self, ctx: &mut Context, budget: usize) -> Result<(usize, Halt), Fault> {
        let mut executed = 0;
        loop {
            if ctx.ip >= self.program.len() {
                return Ok((executed, Halt::End(ctx.stack.last().cloned())));
            }
            if executed >= budget {
                return Ok((executed, Halt::Budget));
            }

            #[cfg(feature = "trace_execution")]
            self.trace_instruction(ctx);

            let ip = ctx.ip;
            let step = self
                .step(ctx)
                .map_err(|kind| Fault::new(kind, self.program.location(ip), ip))?;
            executed += 1;

            match step {
                Step::Continue => {}
                Step::Wait(seconds) => return Ok((executed, Halt::Wait(seconds))),
                Step::Break => return Ok((executed, Halt::Break)),
                Step::End => return Ok((executed, Halt::End(ctx.stack.last().cloned()))),
            }
        }
    }

    fn step(&mut self, ctx: &mut Context) -> Result<Step, FaultKind> {
        let program = self.program;
        let opcode = &program.instructions[ctx.ip].opcode;
        let limit = self.limits.max_stack_size;
        ctx.ip += 1;

        match opcode {
            // ===== stack =====
            Opcode::Push(literal) => ctx.push(literal.to_value(), limit)?,
            Opcode::PushVariable(name) => {
                let value = Environment::new(self.globals, &mut ctx.scopes).get(name)?.clone();
                ctx.push(value, limit)?;
            }
            Opcode::Pop => {
                ctx.pop()?;
            }
            Opcode::Dup => {
                let top = ctx.peek()?.clone();
                ctx.push(top, limit)?;
            }
            Opcode::Swap => {
                let b = ctx.pop()?;
                let a = ctx.pop()?;
                ctx.stack.push(b);
                ctx.stack.push(a);
            }

            // ===== variables =====
            Opcode::Store(name) => {
                let value = ctx.pop()?;
                Environment::new(self.globals, &mut ctx.scopes).set(name, value);
            }
            Opcode::StoreLocal(name) => {
                let value = ctx.pop()?;
                Environment::new(self.globals, &mut ctx.scopes).declare(name, value);
            }
            Opcode::Unset(name) => {
                Environment::new(self.globals, &mut ctx.scopes).undeclare(name)?;
            }

            // ===== operators =====
            Opcode::Binary(op) => {
                let right = ctx.pop()?;
                let left = ctx.pop()?;
                let result = self.dispatcher.evaluate(*op, &OperandPair { left, right })?;
                ctx.push(result, limit)?;
            }
            Opcode::Unary(op) => {
                let operand = ctx.pop()?;
                let result = self.dispatcher.evaluate_unary(*op, &operand)?;
                ctx.push(result, limit)?;
            }

            // ===== control =====
            Opcode::Jump(target) => ctx.ip = self.target(*target)?,
            Opcode::JumpIfFalse(target) => {
                if !ctx.pop()?.is_truthy() {
                    ctx.ip = self.target(*target)?;
                }
            }
            Opcode::JumpIfTrue(target) => {
                if ctx.pop()?.is_truthy() {
                    ctx.ip = self.target(*target)?;
                }
            }
            Opcode::Call(target) => {
                let target = self.target(*target)?;
                if ctx.calls.len() >= self.limits.max_recursion_depth {
                    return Err(ControlError::CallDepthExceeded(self.limits.max_recursion_depth).into());
                }
                ctx.calls.push(CallFrame {
                    return_ip: ctx.ip,
                    scope_depth: ctx.scopes.depth(),
                });
                ctx.scopes.push();
                ctx.ip = target;
            }
            Opcode::Return => match ctx.calls.pop() {
                Some(frame) => {
                    ctx.scopes.truncate(frame.scope_depth);
                    ctx.ip = frame.return_ip;
                }
                None => return Ok(Step::End),
            },

            // ===== scopes =====
            Opcode::PushScope => ctx.scopes.push(),
            Opcode::PopScope => {
                if ctx.scopes.depth() <= ctx.scope_floor() {
                    return Err(ControlError::ScopeUnderflow.into());
                }
                ctx.scopes.pop();
            }

            // ===== triggers =====
            Opcode::AddTrigger { entry, event } => {
                let delegate = Delegate::new(self.target(*entry)?);
                if self.triggers.register(delegate, event.clone()) {
                    kiln_log::debug!(self.logger, "registered {} on {}", delegate, event);
                }
            }
            Opcode::RemoveTrigger { entry } => {
                if self.triggers.unregister(Delegate::new(*entry)) {
                    kiln_log::debug!(self.logger, "removed delegate@{}", entry);
                }
            }

            // ===== host interaction =====
            Opcode::Wait => {
                let seconds = ScalarValue::create(&ctx.pop()?)?.as_f64();
                if self.in_trigger {
                    return Err(ControlError::WaitInTrigger.into());
                }
                return Ok(Step::Wait(seconds.max(0.0)));
            }
            Opcode::Print => {
                let value = ctx.pop()?;
                self.output.push(value.to_string());
            }
            Opcode::Break => return Ok(Step::Break),
            Opcode::Nop => {}
        }

        Ok(Step::Continue)
    }

    /// Validate an absolute target; the end of the program is a legal target
    fn target(&self, target: usize) -> Result<usize, ControlError> {
        if target > self.program.len() {
            return Err(ControlError::IllegalJump {
                target,
                len: self.program.len(),
            });
        }
        Ok(target)
    }

    #[cfg(feature = "trace_execution")]
    fn trace_instruction(&self, ctx: &Context) {
        kiln_log::trace!(
            self.logger,
            "{:04} {:<24} stack: {:?}",
            ctx.ip,
            self.program.instructions[ctx.ip].opcode.to_string(),
            ctx.stack
        );
    }
}
