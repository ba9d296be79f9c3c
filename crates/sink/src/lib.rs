//! Core output-sink abstractions for report export.
//!
//! This crate provides the fundamental traits and types format-specific
//! sinks implement:
//! - `OutputSink` trait for receiving resolved cells and lifecycle calls
//! - Resolved-cell types bridging the engine and the sinks
//! - `NullSink` (used by the silent pre-pass) and `RecordingSink`
//!   (re-exported for integration testing in downstream crates)

mod error;
mod null;
mod recording;
mod traits;
mod types;

pub use error::SinkError;
pub use null::NullSink;
pub use recording::{RecordingSink, SinkEvent};
pub use traits::OutputSink;
pub use types::{GridPosition, ResolvedCell, ResolvedContent, Span};
