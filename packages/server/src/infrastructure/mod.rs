//! Infrastructure layer: concrete trace sinks.
//!
//! ## 概要
//!
//! The domain layer only knows the `Tracer` trait. This module provides
//! implementations that report somewhere:
//!
//! - `LogTracer`: forwards events to `tracing`
//! - `WriterTracer`: writes one timestamped line per event to any writer

pub mod tracer;

pub use tracer::{LogTracer, WriterTracer};
