//! Tracer implementations
//!
//! ## 責務
//!
//! - `LogTracer`: report hub events through the `tracing` subscriber
//! - `WriterTracer`: write hub events as timestamped lines to a writer
//!   (stdout, a file, or a buffer in tests)

use std::{io::Write, sync::Mutex};

use kairo_shared::time::{Clock, SystemClock, timestamp_to_rfc3339};

use crate::domain::Tracer;

/// Target used for hub events emitted through `tracing`
pub const TRACE_TARGET: &str = "kairo_server::trace";

/// Tracer forwarding every event to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&self, event: &str) {
        tracing::debug!(target: TRACE_TARGET, "{}", event);
    }
}

/// Tracer writing one `<timestamp> <event>` line per event
///
/// ## 使用例
///
/// ```ignore
/// let tracer = WriterTracer::new(std::io::stdout());
/// let (hub, handle) = Hub::with_tracer(Arc::new(tracer));
/// ```
pub struct WriterTracer<W> {
    writer: Mutex<W>,
    clock: Box<dyn Clock>,
}

impl<W: Write + Send> WriterTracer<W> {
    /// Create a tracer stamping lines with the system clock
    pub fn new(writer: W) -> Self {
        Self::with_clock(writer, Box::new(SystemClock))
    }

    /// Create a tracer stamping lines with `clock`
    pub fn with_clock(writer: W, clock: Box<dyn Clock>) -> Self {
        Self {
            writer: Mutex::new(writer),
            clock,
        }
    }

    /// Consume the tracer and return the writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Tracer for WriterTracer<W> {
    fn trace(&self, event: &str) {
        let stamp = timestamp_to_rfc3339(self.clock.now_millis());
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // tracing must never take the hub down
        if let Err(e) = writeln!(writer, "{} {}", stamp, event).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to write trace event: {}", e);
        }
    }
}
