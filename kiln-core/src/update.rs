//! Update handler
//!
//! Delivers the variable-rate frame clock and the fixed-rate physics clock to
//! registered observers. Registrations hold observers weakly: a dropped
//! observer is pruned the next time its clock advances. Every pass iterates a
//! snapshot, so callbacks may register or remove observers (including
//! themselves); the change takes effect from the next pass.

use kiln_log::{trace, Logger};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Receives the variable-rate frame clock
pub trait UpdateObserver {
    fn update(&mut self, handler: &UpdateHandler, delta: f64);
}

/// Receives the fixed-rate physics clock
pub trait FixedUpdateObserver {
    fn fixed_update(&mut self, handler: &UpdateHandler, delta: f64);
}

/// Generational handle returned by registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle {
    index: u32,
    generation: u32,
}

// ==================== Registry ====================

struct Slot<T: ?Sized> {
    generation: u32,
    observer: Option<Weak<RefCell<T>>>,
}

/// Arena of weak registrations; freed slots are reused with a bumped generation
struct Registry<T: ?Sized> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T: ?Sized> Registry<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, observer: Weak<RefCell<T>>) -> ObserverHandle {
        if let Some(handle) = self.find(&observer) {
            return handle;
        }
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.observer = Some(observer);
                ObserverHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    observer: Some(observer),
                });
                ObserverHandle { index, generation: 0 }
            }
        }
    }

    fn find(&self, observer: &Weak<RefCell<T>>) -> Option<ObserverHandle> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.observer
                .as_ref()
                .filter(|w| Weak::ptr_eq(w, observer))
                .map(|_| ObserverHandle {
                    index: i as u32,
                    generation: slot.generation,
                })
        })
    }

    fn remove(&mut self, handle: ObserverHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.observer.is_some() => {
                slot.observer = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    fn snapshot(&self) -> Vec<(ObserverHandle, Weak<RefCell<T>>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.observer.as_ref().map(|w| {
                    (
                        ObserverHandle {
                            index: i as u32,
                            generation: slot.generation,
                        },
                        w.clone(),
                    )
                })
            })
            .collect()
    }

    fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.observer.as_ref().is_some_and(|w| w.strong_count() > 0))
            .count()
    }
}

// ==================== UpdateHandler ====================

pub struct UpdateHandler {
    observers: RefCell<Registry<dyn UpdateObserver>>,
    fixed_observers: RefCell<Registry<dyn FixedUpdateObserver>>,
    current_time: Cell<f64>,
    last_delta: Cell<f64>,
    current_fixed_time: Cell<f64>,
    last_fixed_delta: Cell<f64>,
    logger: Arc<Logger>,
}

impl UpdateHandler {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            observers: RefCell::new(Registry::new()),
            fixed_observers: RefCell::new(Registry::new()),
            current_time: Cell::new(0.0),
            last_delta: Cell::new(0.0),
            current_fixed_time: Cell::new(0.0),
            last_fixed_delta: Cell::new(0.0),
            logger,
        }
    }

    /// Register for frame ticks; registering the same observer again returns its handle
    pub fn add_observer<O: UpdateObserver + 'static>(&self, observer: &Rc<RefCell<O>>) -> ObserverHandle {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn UpdateObserver>> = weak;
        self.observers.borrow_mut().insert(weak)
    }

    pub fn add_fixed_observer<O: FixedUpdateObserver + 'static>(
        &self,
        observer: &Rc<RefCell<O>>,
    ) -> ObserverHandle {
        let weak = Rc::downgrade(observer);
        let weak: Weak<RefCell<dyn FixedUpdateObserver>> = weak;
        self.fixed_observers.borrow_mut().insert(weak)
    }

    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        self.observers.borrow_mut().remove(handle)
    }

    pub fn remove_fixed_observer(&self, handle: ObserverHandle) -> bool {
        self.fixed_observers.borrow_mut().remove(handle)
    }

    /// Remove an observer from both clocks
    pub fn remove<O: 'static>(&self, observer: &Rc<RefCell<O>>) -> bool
    where
        O: UpdateObserver + FixedUpdateObserver,
    {
        let weak = Rc::downgrade(observer);
        let frame: Weak<RefCell<dyn UpdateObserver>> = weak.clone();
        let fixed: Weak<RefCell<dyn FixedUpdateObserver>> = weak;
        let frame_handle = self.observers.borrow().find(&frame);
        let fixed_handle = self.fixed_observers.borrow().find(&fixed);
        let removed_frame = frame_handle.is_some_and(|h| self.remove_observer(h));
        let removed_fixed = fixed_handle.is_some_and(|h| self.remove_fixed_observer(h));
        removed_frame || removed_fixed
    }

    /// Advance the frame clock and notify every live frame observer
    pub fn advance_variable(&self, delta: f64) {
        let delta = delta.max(0.0);
        self.last_delta.set(delta);
        self.current_time.set(self.current_time.get() + delta);

        let snapshot = self.observers.borrow().snapshot();
        for (handle, weak) in snapshot {
            match weak.upgrade() {
                Some(observer) => match observer.try_borrow_mut() {
                    Ok(mut obs) => obs.update(self, delta),
                    Err(_) => trace!(self.logger, "frame observer {:?} busy, skipped", handle),
                },
                None => {
                    self.observers.borrow_mut().remove(handle);
                    trace!(self.logger, "pruned dead frame observer {:?}", handle);
                }
            }
        }
    }

    /// Advance the physics clock and notify every live fixed observer
    pub fn advance_fixed(&self, delta: f64) {
        let delta = delta.max(0.0);
        self.last_fixed_delta.set(delta);
        self.current_fixed_time.set(self.current_fixed_time.get() + delta);

        let snapshot = self.fixed_observers.borrow().snapshot();
        for (handle, weak) in snapshot {
            match weak.upgrade() {
                Some(observer) => match observer.try_borrow_mut() {
                    Ok(mut obs) => obs.fixed_update(self, delta),
                    Err(_) => trace!(self.logger, "fixed observer {:?} busy, skipped", handle),
                },
                None => {
                    self.fixed_observers.borrow_mut().remove(handle);
                    trace!(self.logger, "pruned dead fixed observer {:?}", handle);
                }
            }
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time.get()
    }

    pub fn last_delta(&self) -> f64 {
        self.last_delta.get()
    }

    pub fn current_fixed_time(&self) -> f64 {
        self.current_fixed_time.get()
    }

    pub fn last_fixed_delta(&self) -> f64 {
        self.last_fixed_delta.get()
    }

    /// Frame observers that are still alive (dead ones may not be pruned yet)
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().live_count()
    }

    pub fn fixed_observer_count(&self) -> usize {
        self.fixed_observers.borrow().live_count()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl Default for UpdateHandler {
    fn default() -> Self {
        Self::new(Logger::noop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        frames: usize,
        fixed: usize,
        last: f64,
    }

    impl UpdateObserver for Counter {
        fn update(&mut self, _handler: &UpdateHandler, delta: f64) {
            self.frames += 1;
            self.last = delta;
        }
    }

    impl FixedUpdateObserver for Counter {
        fn fixed_update(&mut self, _handler: &UpdateHandler, _delta: f64) {
            self.fixed += 1;
        }
    }

    #[test]
    fn test_notifies_and_accumulates() {
        let handler = UpdateHandler::default();
        let counter = Rc::new(RefCell::new(Counter::default()));
        handler.add_observer(&counter);
        handler.add_fixed_observer(&counter);

        handler.advance_variable(0.5);
        handler.advance_variable(0.25);
        handler.advance_fixed(0.02);

        assert_eq!(counter.borrow().frames, 2);
        assert_eq!(counter.borrow().fixed, 1);
        assert_eq!(counter.borrow().last, 0.25);
        assert_eq!(handler.current_time(), 0.75);
        assert_eq!(handler.last_delta(), 0.25);
        assert_eq!(handler.current_fixed_time(), 0.02);
    }

    #[test]
    fn test_duplicate_registration_collapses() {
        let handler = UpdateHandler::default();
        let counter = Rc::new(RefCell::new(Counter::default()));
        let a = handler.add_observer(&counter);
        let b = handler.add_observer(&counter);
        assert_eq!(a, b);
        handler.advance_variable(1.0);
        assert_eq!(counter.borrow().frames, 1);
    }

    #[test]
    fn test_dead_observer_is_pruned() {
        let handler = UpdateHandler::default();
        let counter = Rc::new(RefCell::new(Counter::default()));
        handler.add_observer(&counter);
        drop(counter);
        assert_eq!(handler.observer_count(), 0);
        handler.advance_variable(1.0);
        assert!(handler.observers.borrow().snapshot().is_empty());
    }

    #[test]
    fn test_stale_handle_does_not_remove_new_observer() {
        let handler = UpdateHandler::default();
        let first = Rc::new(RefCell::new(Counter::default()));
        let handle = handler.add_observer(&first);
        assert!(handler.remove_observer(handle));
        assert!(!handler.remove_observer(handle));

        let second = Rc::new(RefCell::new(Counter::default()));
        let reused = handler.add_observer(&second);
        assert_ne!(handle, reused);
        assert!(!handler.remove_observer(handle));
        handler.advance_variable(1.0);
        assert_eq!(second.borrow().frames, 1);
        assert_eq!(first.borrow().frames, 0);
    }

    #[test]
    fn test_remove_by_observer() {
        let handler = UpdateHandler::default();
        let counter = Rc::new(RefCell::new(Counter::default()));
        handler.add_observer(&counter);
        handler.add_fixed_observer(&counter);
        assert!(handler.remove(&counter));
        assert!(!handler.remove(&counter));
        handler.advance_variable(1.0);
        handler.advance_fixed(1.0);
        assert_eq!(counter.borrow().frames, 0);
        assert_eq!(counter.borrow().fixed, 0);
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let handler = UpdateHandler::default();
        handler.advance_variable(-1.0);
        assert_eq!(handler.current_time(), 0.0);
    }
}
