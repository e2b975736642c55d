//! Keypress input router
//!
//! The console's input surface. Typed characters are queued and delivered on
//! the next frame tick as `Keypress` trigger firings; the break key aborts the
//! program right away. While locked, keys still reach triggers but are no
//! longer echoed into the typed line.

use kiln_core::{Cpu, TriggerEvent, UpdateHandler, UpdateObserver, Value};
use kiln_log::{debug, Logger};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Weak;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Abort the running program
    Break,
}

pub struct InputRouter {
    cpu: Weak<RefCell<Cpu>>,
    queue: VecDeque<Key>,
    typed: String,
    locked: bool,
    logger: Arc<Logger>,
}

impl InputRouter {
    pub fn new(cpu: Weak<RefCell<Cpu>>, logger: Arc<Logger>) -> Self {
        Self {
            cpu,
            queue: VecDeque::new(),
            typed: String::new(),
            locked: false,
            logger,
        }
    }

    pub fn press(&mut self, key: Key) {
        match key {
            Key::Break => {
                if !self.break_now() {
                    self.queue.push_back(Key::Break);
                }
            }
            Key::Char(ch) => {
                if !self.locked {
                    self.typed.push(ch);
                }
                self.queue.push_back(key);
            }
        }
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Text typed while unlocked since the last call
    pub fn take_typed(&mut self) -> String {
        std::mem::take(&mut self.typed)
    }

    /// False when the CPU is gone or busy (pressed from inside a CPU callback)
    fn break_now(&self) -> bool {
        let Some(cpu) = self.cpu.upgrade() else {
            return false;
        };
        let Ok(mut cpu) = cpu.try_borrow_mut() else {
            return false;
        };
        cpu.break_execution(true);
        true
    }

    fn flush(&mut self) {
        let Some(cpu) = self.cpu.upgrade() else {
            self.queue.clear();
            return;
        };
        let Ok(mut cpu) = cpu.try_borrow_mut() else {
            return;
        };
        for key in self.queue.drain(..) {
            match key {
                Key::Char(ch) => {
                    let queued = cpu.fire(TriggerEvent::Keypress, vec![Value::from(ch)]);
                    debug!(self.logger, "key {:?} fired {} trigger(s)", ch, queued);
                }
                Key::Break => cpu.break_execution(true),
            }
        }
    }
}

impl UpdateObserver for InputRouter {
    fn update(&mut self, _handler: &UpdateHandler, _delta: f64) {
        self.flush();
    }
}
