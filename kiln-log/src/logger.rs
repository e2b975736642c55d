//! Logger and the built-in sinks

use crate::record::{Level, Record};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Log output target
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// Logger configuration and state
pub struct Logger {
    level: AtomicU8,
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
    /// Host tick stamped onto every record
    tick: AtomicU64,
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
            tick: AtomicU64::new(0),
        })
    }

    /// Logger with no sinks at Error level
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }

    /// Builder-style sink registration
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        self.sinks().push(Box::new(sink));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Set the host tick stamped onto subsequent records
    pub fn set_tick(&self, tick: u64) {
        self.tick.store(tick, Ordering::Relaxed);
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }

        let record = Record::new(level, target, message).at_tick(self.tick());
        for sink in self.sinks().iter() {
            sink.write(&record);
        }
    }

    fn sinks(&self) -> MutexGuard<'_, Vec<Box<dyn LogSink>>> {
        // a sink that panicked mid-write leaves the list itself intact
        self.sinks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Forward into another logger, which applies its own level and sinks
impl LogSink for Arc<Logger> {
    fn write(&self, record: &Record) {
        if self.is_enabled(record.level) {
            for sink in self.sinks().iter() {
                sink.write(record);
            }
        }
    }
}

/// Append-mode file sink
#[cfg(feature = "file")]
pub struct FileSink {
    file: Mutex<std::fs::File>,
}

#[cfg(feature = "file")]
impl FileSink {
    pub fn new(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(FileSink {
            file: Mutex::new(file),
        })
    }
}

#[cfg(feature = "file")]
impl LogSink for FileSink {
    fn write(&self, record: &Record) {
        use std::io::Write;
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", record.format());
        }
    }
}
