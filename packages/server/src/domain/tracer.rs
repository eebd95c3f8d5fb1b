//! Trace sink the hub reports its activity to.
//!
//! The hub only depends on the [`Tracer`] trait. Concrete sinks that write
//! somewhere live in `crate::infrastructure::tracer`.

use std::sync::Arc;

/// Receives a description of each event in the room
#[cfg_attr(test, mockall::automock)]
pub trait Tracer: Send + Sync {
    /// Record one event
    fn trace(&self, event: &str);
}

/// Tracer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&self, _event: &str) {}
}

/// Tracer used when tracing is disabled.
pub fn off() -> Arc<dyn Tracer> {
    Arc::new(NoopTracer)
}
