//! Ring buffer sink kept for crash dumps

use crate::logger::LogSink;
use crate::record::Record;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded record buffer; once full, each new record evicts the oldest
pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicUsize::new(0),
        })
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<Record>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, record: Record) {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let mut inner = self.records();
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
    }

    /// All buffered records, oldest first
    pub fn dump_records(&self) -> Vec<Record> {
        self.records().iter().cloned().collect()
    }

    /// Buffered records formatted one per line
    pub fn dump(&self) -> String {
        self.records()
            .iter()
            .map(Record::format)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.records().clear();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for LogRingBuffer {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, Logger};

    #[test]
    fn test_overwrites_oldest_when_full() {
        let ring = LogRingBuffer::new(3);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());

        for i in 0..5 {
            logger.log(Level::Info, "test", format!("record {i}"));
        }

        let records = ring.dump_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "record 2");
        assert_eq!(records[2].message, "record 4");
        assert_eq!(ring.dropped_count(), 2);
        assert_eq!(ring.capacity(), 3);
    }

    #[test]
    fn test_clear_resets_counters() {
        let ring = LogRingBuffer::new(1);
        ring.write(&Record::new(Level::Info, "test", "a"));
        ring.write(&Record::new(Level::Info, "test", "b"));
        assert_eq!(ring.dropped_count(), 1);

        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.dropped_count(), 0);
    }

    #[test]
    fn test_zero_capacity_counts_drops() {
        let ring = LogRingBuffer::new(0);
        ring.write(&Record::new(Level::Info, "test", "lost"));
        assert!(ring.is_empty());
        assert_eq!(ring.dropped_count(), 1);
    }

    #[test]
    fn test_dump_joins_lines() {
        let ring = LogRingBuffer::new(4);
        ring.write(&Record::new(Level::Info, "test", "one"));
        ring.write(&Record::new(Level::Warn, "test", "two"));
        let dump = ring.dump();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("WARN"));
    }
}
