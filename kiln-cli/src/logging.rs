//! CLI logging setup
//!
//! Installs a `tracing-subscriber` registry and bridges the runtime's
//! `kiln-log` records into it, so CLI and runtime events share one output.

use crate::config::{to_log_level, LogConfig, LogFormat};
use kiln_log::{FileSink, LogRingBuffer, LogSink, Logger, Record};
use std::io;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Target of CLI events
pub const CLI_TARGET: &str = "kiln::cli";
/// Target of bridged runtime records
pub const RUNTIME_TARGET: &str = "kiln::runtime";
/// Runtime records kept for the report printed after a failed run
const CRASH_RECORDS: usize = 64;

/// Install the global subscriber and build the runtime logger that feeds it.
pub fn init(log_config: &LogConfig) -> (Arc<Logger>, Arc<LogRingBuffer>) {
    let targets = Targets::new()
        .with_target(CLI_TARGET, log_config.cli)
        .with_target(RUNTIME_TARGET, log_config.runtime);

    // diagnostics go to stderr; stdout carries program output only
    let layer = create_format_layer(log_config.format, io::stderr).with_filter(targets);
    tracing_subscriber::registry().with(layer).init();

    runtime_logger(log_config)
}

/// The runtime logger alone, without touching the global subscriber.
///
/// It records at debug level or finer into the returned ring buffer,
/// whatever the configured output level. The optional log file gets the
/// configured runtime level.
pub fn runtime_logger(log_config: &LogConfig) -> (Arc<Logger>, Arc<LogRingBuffer>) {
    let ring = LogRingBuffer::new(CRASH_RECORDS);
    let logger = Logger::new(to_log_level(log_config.runtime.max(Level::DEBUG)))
        .with_sink(TracingSink)
        .with_sink(ring.clone());

    if let Some(path) = &log_config.file {
        match FileSink::new(path) {
            Ok(sink) => logger.add_sink(Logger::new(to_log_level(log_config.runtime)).with_sink(sink)),
            Err(e) => tracing::warn!(target: CLI_TARGET, path = %path.display(), "log file disabled: {e}"),
        }
    }
    (logger, ring)
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

/// Re-emits `kiln-log` records as `tracing` events
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        let tick = record.tick;
        let module = record.target;
        let message = &record.message;
        match record.level {
            kiln_log::Level::Trace => tracing::trace!(target: RUNTIME_TARGET, tick, module, "{message}"),
            kiln_log::Level::Debug => tracing::debug!(target: RUNTIME_TARGET, tick, module, "{message}"),
            kiln_log::Level::Info => tracing::info!(target: RUNTIME_TARGET, tick, module, "{message}"),
            kiln_log::Level::Warn => tracing::warn!(target: RUNTIME_TARGET, tick, module, "{message}"),
            kiln_log::Level::Error => tracing::error!(target: RUNTIME_TARGET, tick, module, "{message}"),
        }
    }
}
