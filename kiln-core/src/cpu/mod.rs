//! The CPU: cooperative execution engine
//!
//! The CPU never blocks its host. Each [`Cpu::update`] runs the triggers fired
//! since the last update, each on its own bounded budget, then advances the
//! main program by at most `instructions_per_update` opcodes. The main
//! program's state lives in a resumable [`Context`], so a slice can stop after
//! any opcode and pick up on the next call.
//!
//! A trigger that runs out of budget keeps its context and continues on the
//! next update. The main program stays paused until every due trigger has
//! returned.

mod context;
mod execution;

pub use context::{CallFrame, Context};

use crate::calculator::{Calculator, Dispatcher};
use crate::error::{ControlError, Fault};
use crate::program::Program;
use crate::trigger::{Delegate, PendingTrigger, TriggerEvent, TriggerRegistry};
use crate::update::{FixedUpdateObserver, UpdateHandler, UpdateObserver};
use crate::value::Value;
use crate::variable::Scope;
use execution::{Halt, Machine};
use kiln_config::{CpuConfig, LimitConfig};
use kiln_log::{debug, info, trace, warn, Logger};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

// ==================== State and outcomes ====================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionState {
    /// Nothing to run; a fresh `load` is required
    Idle,
    Running,
    /// Suspended by `Wait` until the physics clock reaches `until`
    Waiting { until: f64 },
}

/// Why a slice stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceStatus {
    BudgetExhausted,
    Waiting,
    Finished,
    Broken,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceOutcome {
    pub executed: usize,
    pub status: SliceStatus,
}

impl SliceOutcome {
    fn new(executed: usize, status: SliceStatus) -> Self {
        Self { executed, status }
    }
}

/// Frame and physics totals, advanced by the update handler
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Clock {
    pub frame: f64,
    pub physics: f64,
}

/// A fault contained to one trigger run
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerFault {
    pub delegate: Delegate,
    pub event: TriggerEvent,
    pub fault: Fault,
}

/// Everything that happened in one host update
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub triggers_run: usize,
    pub trigger_faults: Vec<TriggerFault>,
    pub slice: Result<SliceOutcome, Fault>,
}

// ==================== Cpu ====================

pub struct Cpu {
    config: CpuConfig,
    limits: LimitConfig,
    program: Program,
    state: ExecutionState,
    main: Context,
    globals: Scope,
    dispatcher: Dispatcher,
    triggers: TriggerRegistry,
    /// Fired runs not yet returned, in run order
    due: VecDeque<TriggerRun>,
    clock: Clock,
    tick: u64,
    output: Vec<String>,
    reports: Vec<TickReport>,
    logger: Arc<Logger>,
}

impl Cpu {
    pub fn new(config: CpuConfig, limits: LimitConfig, logger: Arc<Logger>) -> Self {
        Self {
            config,
            limits,
            program: Program::new(),
            state: ExecutionState::Idle,
            main: Context::default(),
            globals: Scope::new(),
            dispatcher: Dispatcher::new(),
            triggers: TriggerRegistry::new(),
            due: VecDeque::new(),
            clock: Clock::default(),
            tick: 0,
            output: Vec::new(),
            reports: Vec::new(),
            logger,
        }
    }

    /// Start a fresh run of `program`. Globals survive, triggers do not.
    pub fn load(&mut self, program: Program) {
        info!(self.logger, "loaded program ({} instructions)", program.len());
        self.program = program;
        self.main = Context::at(0);
        self.triggers.clear();
        self.due.clear();
        self.state = ExecutionState::Running;
    }

    pub fn clear_globals(&mut self) {
        self.globals.clear();
    }

    // ==================== Execution ====================

    /// Advance the main program by at most `max_instructions` opcodes.
    ///
    /// A dispatch or control fault aborts the run (the engine goes idle) and
    /// is returned to the caller.
    pub fn run_slice(&mut self, max_instructions: usize) -> Result<SliceOutcome, Fault> {
        match self.state {
            ExecutionState::Idle => return Ok(SliceOutcome::new(0, SliceStatus::Idle)),
            ExecutionState::Waiting { until } if self.clock.physics < until => {
                return Ok(SliceOutcome::new(0, SliceStatus::Waiting));
            }
            ExecutionState::Waiting { .. } => self.state = ExecutionState::Running,
            ExecutionState::Running => {}
        }

        let mut main = std::mem::take(&mut self.main);
        let result = self.machine(false).run(&mut main, max_instructions);
        self.main = main;

        match result {
            Ok((executed, Halt::Budget)) => Ok(SliceOutcome::new(executed, SliceStatus::BudgetExhausted)),
            Ok((executed, Halt::Wait(seconds))) => {
                let until = self.clock.physics + seconds;
                trace!(self.logger, "waiting {}s (until {})", seconds, until);
                self.state = ExecutionState::Waiting { until };
                Ok(SliceOutcome::new(executed, SliceStatus::Waiting))
            }
            Ok((executed, Halt::Break)) => {
                self.break_execution(false);
                Ok(SliceOutcome::new(executed, SliceStatus::Broken))
            }
            Ok((executed, Halt::End(_))) => {
                debug!(self.logger, "program finished");
                self.reset_run();
                Ok(SliceOutcome::new(executed, SliceStatus::Finished))
            }
            Err(fault) => {
                warn!(self.logger, "program aborted: {}", fault);
                self.reset_run();
                Err(fault)
            }
        }
    }

    /// Stop the main program immediately. Committed variable writes remain.
    pub fn break_execution(&mut self, manual: bool) {
        if self.state == ExecutionState::Idle {
            return;
        }
        if manual {
            info!(self.logger, "program aborted by user");
        } else {
            debug!(self.logger, "program stopped by break");
        }
        self.reset_run();
    }

    /// One host tick: due triggers first, then one main slice.
    ///
    /// The slice is skipped (0 executed, `BudgetExhausted`) while a trigger
    /// is still unfinished.
    pub fn update(&mut self) -> TickReport {
        self.tick += 1;
        self.logger.set_tick(self.tick);

        if self.state != ExecutionState::Idle {
            self.triggers.fire(&TriggerEvent::Tick, &[]);
        }
        let (triggers_run, trigger_faults) = self.run_due_triggers();
        let slice = if self.due.is_empty() || self.state == ExecutionState::Idle {
            self.run_slice(self.config.instructions_per_update)
        } else {
            trace!(self.logger, "main paused behind {} unfinished trigger(s)", self.due.len());
            Ok(SliceOutcome::new(0, SliceStatus::BudgetExhausted))
        };

        TickReport {
            tick: self.tick,
            triggers_run,
            trigger_faults,
            slice,
        }
    }

    /// Queue the newly fired runs behind the unfinished ones, then advance
    /// them in order until one runs out of budget.
    fn run_due_triggers(&mut self) -> (usize, Vec<TriggerFault>) {
        for pending in self.triggers.take_pending() {
            // a Tick trigger still mid-run is not queued again
            if pending.event == TriggerEvent::Tick
                && self.due.iter().any(|run| run.pending.delegate == pending.delegate)
            {
                continue;
            }
            self.due.push_back(TriggerRun::new(pending));
        }

        let mut ran = 0;
        let mut faults = Vec::new();

        while let Some(mut run) = self.due.pop_front() {
            ran += 1;
            match self.run_trigger(&mut run) {
                Ok(TriggerExit::Returned(keep)) => {
                    if run.pending.event == TriggerEvent::Tick && !keep {
                        self.triggers.unregister(run.pending.delegate);
                    }
                }
                Ok(TriggerExit::Unfinished) => {
                    debug!(self.logger, "{} on {} continues next update", run.pending.delegate, run.pending.event);
                    self.due.push_front(run);
                    break;
                }
                Ok(TriggerExit::Break) => {
                    self.break_execution(false);
                    break;
                }
                Err(fault) => {
                    let PendingTrigger { delegate, event, .. } = run.pending;
                    warn!(self.logger, "trigger {} on {} failed: {}", delegate, event, fault);
                    self.triggers.unregister(delegate);
                    faults.push(TriggerFault { delegate, event, fault });
                }
            }
        }
        (ran, faults)
    }

    fn run_trigger(&mut self, run: &mut TriggerRun) -> Result<TriggerExit, Fault> {
        let budget = self.config.trigger_instruction_budget;
        trace!(self.logger, "running {} for {} at {}", run.pending.delegate, run.pending.event, run.ctx.ip);

        let (_, halted) = self.machine(true).run(&mut run.ctx, budget)?;
        match halted {
            Halt::End(value) => Ok(TriggerExit::Returned(value.is_some_and(|v| v.is_truthy()))),
            Halt::Break => Ok(TriggerExit::Break),
            Halt::Budget => Ok(TriggerExit::Unfinished),
            // the machine rejects Wait inside triggers before yielding
            Halt::Wait(_) => {
                let ip = run.ctx.ip.saturating_sub(1);
                Err(Fault::new(ControlError::WaitInTrigger, self.program.location(ip), ip))
            }
        }
    }

    fn machine(&mut self, in_trigger: bool) -> Machine<'_> {
        Machine {
            program: &self.program,
            globals: &mut self.globals,
            dispatcher: &self.dispatcher,
            triggers: &mut self.triggers,
            output: &mut self.output,
            limits: &self.limits,
            logger: &self.logger,
            in_trigger,
        }
    }

    fn reset_run(&mut self) {
        self.state = ExecutionState::Idle;
        self.main = Context::default();
        self.triggers.clear();
        self.due.clear();
    }

    // ==================== Triggers ====================

    /// Schedule every trigger registered for `event`; returns how many were queued
    pub fn fire(&mut self, event: TriggerEvent, payload: Vec<Value>) -> usize {
        let queued = self.triggers.fire(&event, &payload);
        trace!(self.logger, "fired {} ({} queued)", event, queued);
        queued
    }

    pub fn add_trigger(&mut self, delegate: Delegate, event: TriggerEvent) -> bool {
        self.triggers.register(delegate, event)
    }

    pub fn remove_trigger(&mut self, delegate: Delegate) -> bool {
        self.triggers.unregister(delegate)
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// Trigger runs fired but not yet returned
    pub fn unfinished_triggers(&self) -> usize {
        self.due.len()
    }

    // ==================== Accessors ====================

    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.value(name)
    }

    pub fn set_global(&mut self, name: &str, value: impl Into<Value>) {
        self.globals.declare(name, value.into());
    }

    /// Take the text printed since the last call
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Take the reports of updates driven through the update handler
    pub fn take_reports(&mut self) -> Vec<TickReport> {
        std::mem::take(&mut self.reports)
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn advance_frame(&mut self, delta: f64) {
        self.clock.frame += delta.max(0.0);
    }

    pub fn advance_physics(&mut self, delta: f64) {
        self.clock.physics += delta.max(0.0);
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ExecutionState::Idle
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Main-program context, for inspection between slices
    pub fn context(&self) -> &Context {
        &self.main
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn register_calculator(&mut self, kind_name: impl Into<String>, calculator: impl Calculator + 'static) {
        self.dispatcher.register(kind_name, calculator);
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("ip", &self.main.ip)
            .field("program_len", &self.program.len())
            .field("tick", &self.tick)
            .field("clock", &self.clock)
            .field("triggers", &self.triggers.len())
            .field("due", &self.due.len())
            .finish_non_exhaustive()
    }
}

/// A fired trigger and its own execution context
struct TriggerRun {
    pending: PendingTrigger,
    ctx: Context,
}

impl TriggerRun {
    fn new(pending: PendingTrigger) -> Self {
        let ctx = Context::for_trigger(pending.delegate.entry, pending.payload.clone());
        Self { pending, ctx }
    }
}

enum TriggerExit {
    /// Carries the truthiness of the returned value
    Returned(bool),
    /// Budget ran out; the run continues on the next update
    Unfinished,
    Break,
}

/// The frame clock only advances the CPU's frame total
impl UpdateObserver for Cpu {
    fn update(&mut self, _handler: &UpdateHandler, delta: f64) {
        self.advance_frame(delta);
    }
}

/// Each physics step runs one CPU update
impl FixedUpdateObserver for Cpu {
    fn fixed_update(&mut self, _handler: &UpdateHandler, delta: f64) {
        self.advance_physics(delta);
        let report = Cpu::update(self);
        self.reports.push(report);
    }
}
