//! The streaming band traversal engine.
//!
//! One `ResultExporter` drives one pass over a result cursor (plus, when
//! the layout declares forward references, one silent pre-pass), keeping
//! group and aggregate state as it goes and delivering resolved cells to
//! an abstract `OutputSink`:
//!
//! - **groups**: break detection, outer-to-inner cascade, row counters
//! - **aggregate** / **cache**: running aggregate instances and their
//!   registry, scoped per group or to the whole document
//! - **context**: the blended `var`/`param`/`col`/`agg` namespace
//!   expressions evaluate against
//! - **conditional**: effective-style resolution for one cell instance
//! - **crossing**: the forward-reference ("first crossing") cache
//! - **display**: display-pattern formatting
//! - **exporter**: the traversal itself

pub mod aggregate;
pub mod cache;
pub mod conditional;
pub mod context;
pub mod crossing;
pub mod display;
pub mod error;
pub mod exporter;
pub mod groups;
pub mod hooks;

pub use aggregate::{Aggregate, AggregateFactory, AggregateRegistry};
pub use cache::{FunctionCache, FunctionSlot};
pub use context::normalize_name;
pub use crossing::{CrossingCache, CrossingKey};
pub use error::ExportError;
pub use exporter::{ExportConfig, ExportOutcome, ExportSummary, ResultExporter, RowPositions};
pub use groups::GroupTracker;
pub use hooks::{SubreportSource, TraversalObserver};
