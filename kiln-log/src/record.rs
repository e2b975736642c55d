//! Log record definitions

use std::fmt;

/// Log level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Per-opcode tracing
    Trace = 0,
    /// Slice, trigger and scheduler bookkeeping
    Debug = 1,
    /// Program lifecycle
    Info = 2,
    /// Recoverable problems (trigger faults, pruned observers)
    Warn = 3,
    /// Faults that end a run
    Error = 4,
}

impl Level {
    /// Upper-case level name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Parse the `repr(u8)` discriminant back into a level
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Host tick the logger was stamped with when the record was written
    pub tick: u64,
    pub level: Level,
    /// Module path of the call site
    pub target: &'static str,
    pub message: String,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms: current_timestamp_ms(),
            tick: 0,
            level,
            target,
            message: message.into(),
        }
    }

    /// Stamp the record with a host tick
    pub fn at_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Render as `[hh:mm:ss.mmm] LEVEL target [tick=n]: message`
    pub fn format(&self) -> String {
        format!(
            "[{}] {} {} [tick={}]: {}",
            format_timestamp(self.timestamp_ms),
            self.level,
            self.target,
            self.tick,
            self.message
        )
    }
}

fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn format_timestamp(timestamp_ms: u64) -> String {
    let secs = timestamp_ms / 1000;
    let millis = timestamp_ms % 1000;

    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_u8() {
        assert_eq!(Level::from_u8(0), Some(Level::Trace));
        assert_eq!(Level::from_u8(4), Some(Level::Error));
        assert_eq!(Level::from_u8(5), None);
    }

    #[test]
    fn test_record_creation() {
        let record = Record::new(Level::Info, "kiln::cpu", "program loaded").at_tick(9);
        assert_eq!(record.level, Level::Info);
        assert_eq!(record.target, "kiln::cpu");
        assert_eq!(record.message, "program loaded");
        assert_eq!(record.tick, 9);
    }

    #[test]
    fn test_record_format() {
        let record = Record {
            timestamp_ms: 3_600_000 + 120_000 + 3_000 + 456,
            tick: 17,
            level: Level::Warn,
            target: "kiln::trigger",
            message: "trigger aborted".to_string(),
        };

        let formatted = record.format();
        assert!(formatted.starts_with("[01:02:03.456]"));
        assert!(formatted.contains("WARN"));
        assert!(formatted.contains("kiln::trigger"));
        assert!(formatted.contains("[tick=17]"));
        assert!(formatted.ends_with("trigger aborted"));
    }
}
