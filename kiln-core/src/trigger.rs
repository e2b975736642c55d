//! Trigger registry
//!
//! Triggers are bytecode entry points registered against an event. Firing an
//! event never runs anything inline: matching triggers are snapshotted into a
//! pending queue that the CPU drains between main-program slices.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Callable bytecode entry point; its identity is the entry index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delegate {
    pub entry: usize,
}

impl Delegate {
    pub const fn new(entry: usize) -> Self {
        Self { entry }
    }
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delegate@{}", self.entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// A key typed at the console; the payload is the character
    Keypress,
    /// Fired by the CPU on every update; the trigger stays armed while it returns true
    Tick,
    /// Host-defined event such as a timer
    Named(String),
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::Keypress => f.write_str("keypress"),
            TriggerEvent::Tick => f.write_str("tick"),
            TriggerEvent::Named(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub delegate: Delegate,
    pub event: TriggerEvent,
}

/// A fired trigger waiting for its run
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrigger {
    pub delegate: Delegate,
    pub event: TriggerEvent,
    pub payload: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
    pending: VecDeque<PendingTrigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger unless its delegate is already registered.
    ///
    /// Returns whether the registry changed.
    pub fn register(&mut self, delegate: Delegate, event: TriggerEvent) -> bool {
        if self.contains(delegate) {
            return false;
        }
        self.triggers.push(Trigger { delegate, event });
        true
    }

    /// Remove a trigger; runs already pending are unaffected
    pub fn unregister(&mut self, delegate: Delegate) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.delegate != delegate);
        self.triggers.len() != before
    }

    pub fn contains(&self, delegate: Delegate) -> bool {
        self.triggers.iter().any(|t| t.delegate == delegate)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// Schedule every trigger registered for `event`, in registration order.
    ///
    /// Returns how many runs were queued.
    pub fn fire(&mut self, event: &TriggerEvent, payload: &[Value]) -> usize {
        let before = self.pending.len();
        for trigger in self.triggers.iter().filter(|t| &t.event == event) {
            self.pending.push_back(PendingTrigger {
                delegate: trigger.delegate,
                event: trigger.event.clone(),
                payload: payload.to_vec(),
            });
        }
        self.pending.len() - before
    }

    /// Take the runs queued so far; anything fired afterwards waits for the next drain
    pub fn take_pending(&mut self) -> Vec<PendingTrigger> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
        self.pending.clear();
    }
}
