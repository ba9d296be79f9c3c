//! # brass
//!
//! A streaming band-driven report export engine with pluggable output
//! sinks.
//!
//! brass consumes a forward-only result cursor exactly once, walks a
//! banded layout (header, detail, group headers/footers, page bands,
//! document footer), maintains running aggregates per group, resolves
//! conditional formatting per cell, evaluates an embedded expression
//! language over a blended namespace, and hands fully resolved cells to
//! an [`OutputSink`]. Format painters (PDF, XLSX, CSV, ...) live behind
//! that trait and are not part of this core.
//!
//! Forward references — header cells that depend on aggregates over rows
//! not yet seen — are resolved by a deterministic silent pre-pass over
//! the data; see [`brass_engine::crossing`].
//!
//! ## Example
//!
//! ```ignore
//! use brass::{Band, CellDescriptor, ExporterBuilder, RecordingSink, ReportLayout, RowsCursor};
//! use serde_json::json;
//!
//! let layout = ReportLayout::new(
//!     "orders",
//!     Band::single(vec![Some(CellDescriptor::column("amount"))]),
//! );
//! let cursor = RowsCursor::new(vec!["amount".into()], vec![json!({"amount": 10})]);
//! let mut sink = RecordingSink::new();
//! let mut exporter = ExporterBuilder::new(layout, Box::new(cursor)).build();
//! exporter.export(&mut sink)?;
//! ```

// Re-export member crates
pub use brass_engine as engine;
pub use brass_expr as expr;
pub use brass_model as model;
pub use brass_sink as sink;
pub use brass_source as source;
pub use brass_style as style;
pub use brass_types as types;

// Re-export the types most integrations touch
pub use brass_engine::{
    Aggregate, AggregateRegistry, ExportConfig, ExportError, ExportOutcome, ExportSummary,
    ResultExporter, SubreportSource, TraversalObserver,
};
pub use brass_expr::FunctionRegistry;
pub use brass_model::{
    Band, BandKind, BandRow, CellDescriptor, CompareOp, ConditionalRule, ElementKind,
    GroupDef, ReportLayout, ReportVariable,
};
pub use brass_sink::{
    NullSink, OutputSink, RecordingSink, ResolvedCell, ResolvedContent, SinkError,
};
pub use brass_source::{CursorError, IteratorCursor, ResultCursor, RowsCursor};
pub use brass_style::{CellStyle, StyleOverride};
pub use brass_types::Color;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Assembles a [`ResultExporter`] from its collaborators.
///
/// Only the layout and the cursor are required; registries default to the
/// built-in catalogues and the configuration to a plain single-threaded
/// run with the pre-pass enabled.
pub struct ExporterBuilder {
    layout: ReportLayout,
    cursor: Box<dyn ResultCursor>,
    params: HashMap<String, Value>,
    aggregates: AggregateRegistry,
    scalars: FunctionRegistry,
    config: ExportConfig,
    observer: Option<Box<dyn TraversalObserver>>,
    subreports: Option<Box<dyn SubreportSource>>,
}

impl ExporterBuilder {
    pub fn new(layout: ReportLayout, cursor: Box<dyn ResultCursor>) -> Self {
        Self {
            layout,
            cursor,
            params: HashMap::new(),
            aggregates: AggregateRegistry::default(),
            scalars: FunctionRegistry::default(),
            config: ExportConfig::default(),
            observer: None,
            subreports: None,
        }
    }

    /// Binds one parameter value, reachable as `param.<name>`.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: HashMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn aggregates(mut self, registry: AggregateRegistry) -> Self {
        self.aggregates = registry;
        self
    }

    pub fn scalar_functions(mut self, registry: FunctionRegistry) -> Self {
        self.scalars = registry;
        self
    }

    pub fn config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Forces single-pass mode: the forward-reference pre-pass is never
    /// run, even when the layout would ask for it.
    pub fn single_pass(mut self) -> Self {
        self.config.single_pass = true;
        self
    }

    /// Installs a cooperative stop flag, polled on a fixed row cadence.
    pub fn stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.stop = Some(flag);
        self
    }

    pub fn observer(mut self, observer: Box<dyn TraversalObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn subreports(mut self, source: Box<dyn SubreportSource>) -> Self {
        self.subreports = Some(source);
        self
    }

    pub fn build(self) -> ResultExporter {
        let mut exporter = ResultExporter::new(
            self.layout,
            self.cursor,
            self.params,
            self.aggregates,
            self.scalars,
            self.config,
        );
        if let Some(observer) = self.observer {
            exporter.set_observer(observer);
        }
        if let Some(source) = self.subreports {
            exporter.set_subreports(source);
        }
        exporter
    }
}
