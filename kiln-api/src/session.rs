//! Hosted session
//!
//! Wires one CPU to an update handler the way a frame-driven host does: the
//! CPU observes both clocks, the input router observes the frame clock, and a
//! diagnostics context collects what the user should be told about.

use crate::config::RunConfig;
use crate::error::KilnError;
use crate::input::{InputRouter, Key};
use kiln_core::{
    Cpu, DiagnosticsContext, NagKind, ObserverHandle, Program, SliceOutcome, TickReport, TriggerFault,
    UpdateHandler,
};
use kiln_log::{info, Logger};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

pub struct Session {
    handler: UpdateHandler,
    cpu: Rc<RefCell<Cpu>>,
    input: Rc<RefCell<InputRouter>>,
    input_handle: ObserverHandle,
    diagnostics: DiagnosticsContext,
    trigger_faults: Vec<TriggerFault>,
    ticks: u64,
    logger: Arc<Logger>,
}

impl Session {
    pub fn new(config: &RunConfig) -> Self {
        let logger = config.logger.clone();
        let handler = UpdateHandler::new(logger.clone());
        let cpu = Rc::new(RefCell::new(Cpu::new(
            config.cpu.clone(),
            config.limits.clone(),
            logger.clone(),
        )));
        let input = Rc::new(RefCell::new(InputRouter::new(Rc::downgrade(&cpu), logger.clone())));

        handler.add_observer(&cpu);
        handler.add_fixed_observer(&cpu);
        let input_handle = handler.add_observer(&input);

        Self {
            handler,
            cpu,
            input,
            input_handle,
            diagnostics: DiagnosticsContext::new(),
            trigger_faults: Vec::new(),
            ticks: 0,
            logger,
        }
    }

    pub fn load(&mut self, program: Program) {
        self.cpu.borrow_mut().load(program);
    }

    /// Advance the frame clock (delivers queued keys)
    pub fn frame(&mut self, delta: f64) {
        self.handler.advance_variable(delta);
    }

    /// Advance the physics clock, running one CPU update.
    ///
    /// Trigger faults are recorded and turned into nags; a main-program fault
    /// is returned.
    pub fn physics_step(&mut self, delta: f64) -> Result<Vec<SliceOutcome>, KilnError> {
        self.handler.advance_fixed(delta);
        let reports = self.cpu.borrow_mut().take_reports();
        self.ticks += reports.len() as u64;

        let mut outcomes = Vec::with_capacity(reports.len());
        for report in reports {
            outcomes.push(self.absorb(report)?);
        }
        Ok(outcomes)
    }

    /// One host frame followed by one physics step
    pub fn tick(&mut self, config: &RunConfig) -> Result<Vec<SliceOutcome>, KilnError> {
        self.frame(config.frame_delta);
        self.physics_step(config.fixed_delta)
    }

    fn absorb(&mut self, report: TickReport) -> Result<SliceOutcome, KilnError> {
        for failed in report.trigger_faults {
            self.diagnostics.add_nag(
                NagKind::Once,
                format!("trigger {} on {} failed: {}", failed.delegate, failed.event, failed.fault),
            );
            self.trigger_faults.push(failed);
        }
        Ok(report.slice?)
    }

    pub fn press(&mut self, key: Key) {
        self.input.borrow_mut().press(key);
    }

    pub fn type_text(&mut self, text: &str) {
        let mut input = self.input.borrow_mut();
        for ch in text.chars() {
            input.press(Key::Char(ch));
        }
    }

    pub fn input(&self) -> RefMut<'_, InputRouter> {
        self.input.borrow_mut()
    }

    pub fn cpu(&self) -> Ref<'_, Cpu> {
        self.cpu.borrow()
    }

    pub fn cpu_mut(&self) -> RefMut<'_, Cpu> {
        self.cpu.borrow_mut()
    }

    pub fn handler(&self) -> &UpdateHandler {
        &self.handler
    }

    pub fn diagnostics(&mut self) -> &mut DiagnosticsContext {
        &mut self.diagnostics
    }

    pub fn is_idle(&self) -> bool {
        self.cpu.borrow().is_idle()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn take_output(&mut self) -> Vec<String> {
        self.cpu.borrow_mut().take_output()
    }

    pub fn take_trigger_faults(&mut self) -> Vec<TriggerFault> {
        std::mem::take(&mut self.trigger_faults)
    }

    /// Listing of the loaded program
    pub fn code_fragment(&self) -> String {
        self.diagnostics.code_fragment(self.cpu.borrow().program())
    }

    /// Abort the program, detach from the clocks and drop pending diagnostics
    pub fn teardown(&mut self) {
        self.cpu.borrow_mut().break_execution(true);
        self.handler.remove(&self.cpu);
        self.handler.remove_observer(self.input_handle);
        self.diagnostics.teardown();
        info!(self.logger, "session torn down after {} ticks", self.ticks);
    }
}
