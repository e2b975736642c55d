//! kiln-log - structured logging for the Kiln runtime
//!
//! - **Explicit handles**: there is no global logger; every component receives
//!   an `Arc<Logger>` and the noop logger is the default.
//! - **Non-blocking**: the ring buffer overwrites its oldest records when full.
//! - **Tick stamped**: records carry the host tick the runtime was on when they
//!   were written, so a dump lines up with the simulation timeline.
//!
//! ```
//! use kiln_log::{debug, Level, LogRingBuffer, Logger};
//!
//! let ring = LogRingBuffer::new(64);
//! let logger = Logger::new(Level::Debug).with_sink(ring.clone());
//! logger.set_tick(3);
//! debug!(logger, "slice finished after {} opcodes", 12);
//! assert_eq!(ring.dump_records()[0].tick, 3);
//! ```

mod logger;
mod macros;
mod record;
mod ring_buffer;

#[cfg(feature = "file")]
pub use logger::FileSink;
pub use logger::{LogSink, Logger};
pub use record::{Level, Record};
pub use ring_buffer::LogRingBuffer;

/// Result type of fallible logging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sink could not be opened
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
