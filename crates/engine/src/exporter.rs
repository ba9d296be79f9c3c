//! The band traversal engine.
//!
//! `ResultExporter::export` consumes the bound result cursor exactly once
//! — plus, when the layout declares a forward reference, one additional
//! silent pre-pass — and delivers fully resolved cells to an abstract
//! output sink. Per-cell failures resolve the cell to null and are
//! logged; they never abort the pass.

use crate::aggregate::AggregateRegistry;
use crate::cache::FunctionCache;
use crate::conditional::{self, RuleCandidate};
use crate::context::{self, NamespaceInput};
use crate::crossing::{CrossingCache, CrossingKey};
use crate::display::apply_pattern;
use crate::error::ExportError;
use crate::groups::GroupTracker;
use crate::hooks::{SubreportSource, TraversalObserver};
use brass_expr::{EvaluationContext, ExprError, FunctionRegistry, evaluate, parse_expression};
use brass_model::{
    Band, BandKind, BandRow, CellDescriptor, ConditionalRule, ElementKind, FunctionDef,
    ReportLayout,
};
use brass_sink::{GridPosition, NullSink, OutputSink, ResolvedCell, ResolvedContent, Span};
use brass_source::ResultCursor;
use brass_style::CellStyle;
use brass_types::{display_string, is_blank, values_equal};
use itertools::Itertools;
use log::{debug, trace, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// External knobs for one export run.
#[derive(Clone)]
pub struct ExportConfig {
    /// Disables the forward-reference pre-pass entirely. For layouts
    /// without forward references this must not change any output.
    pub single_pass: bool,
    /// Cooperative stop signal, polled on a fixed row cadence.
    pub stop: Option<Arc<AtomicBool>>,
    /// How many rows between stop-flag polls.
    pub stop_poll_rows: usize,
    /// Voluntarily yield every N rows, to avoid starving a shared process.
    pub yield_every_rows: Option<usize>,
    /// How long to sleep at each yield point; zero means a bare yield.
    pub yield_for: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            single_pass: false,
            stop: None,
            stop_poll_rows: 1,
            yield_every_rows: None,
            yield_for: Duration::ZERO,
        }
    }
}

/// How an export run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed,
    /// The stop signal was raised; output was torn down gracefully.
    Stopped,
}

/// What an export run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub outcome: ExportOutcome,
    /// Result rows consumed by the (final) pass.
    pub rows: usize,
}

/// Cursor positions of the traversal in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPositions {
    /// Position in the fully expanded output grid.
    pub exporter_row: usize,
    /// Position in the underlying data, 1-based.
    pub result_row: usize,
    /// Position within the current page.
    pub page_row: usize,
    /// Current page, 1-based.
    pub page_no: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PassMode {
    /// The forward-reference pre-pass: group and aggregate machinery run,
    /// nothing reaches the sink, final values are recorded.
    Silent,
    /// The real pass.
    Render,
}

/// The row-driven band traversal engine.
pub struct ResultExporter {
    layout: Arc<ReportLayout>,
    cursor: Box<dyn ResultCursor>,
    params: HashMap<String, Value>,
    aggregates: AggregateRegistry,
    scalars: FunctionRegistry,
    config: ExportConfig,
    observer: Option<Box<dyn TraversalObserver>>,
    subreports: Option<Box<dyn SubreportSource>>,
    nested: bool,
    /// Captured from the sink at export start.
    paginates: bool,

    groups: GroupTracker,
    functions: FunctionCache,
    crossing: CrossingCache,

    exporter_row: usize,
    result_row: usize,
    page_row: usize,
    page_no: usize,
    /// Set once the first body (detail or group) row has been emitted;
    /// forced page breaks are suppressed before that, so a document never
    /// opens with a blank page.
    body_started: bool,
    /// Raw column values of the previous row, for break detection and
    /// footer contexts.
    prev_row: Option<Map<String, Value>>,
    /// Resolved column/expression values of the previous detail row, for
    /// repeated-value suppression.
    prev_resolved: HashMap<String, Value>,
}

impl ResultExporter {
    pub fn new(
        layout: ReportLayout,
        cursor: Box<dyn ResultCursor>,
        params: HashMap<String, Value>,
        aggregates: AggregateRegistry,
        scalars: FunctionRegistry,
        config: ExportConfig,
    ) -> Self {
        let break_columns: Vec<String> =
            layout.groups.iter().map(|g| g.column.clone()).collect();
        let functions = FunctionCache::build(&layout, &aggregates);
        Self {
            layout: Arc::new(layout),
            cursor,
            params,
            aggregates,
            scalars,
            config,
            observer: None,
            subreports: None,
            nested: false,
            paginates: false,
            groups: GroupTracker::new(&break_columns),
            functions,
            crossing: CrossingCache::new(),
            exporter_row: 0,
            result_row: 0,
            page_row: 0,
            page_no: 1,
            body_started: false,
            prev_row: None,
            prev_resolved: HashMap::new(),
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn TraversalObserver>) {
        self.observer = Some(observer);
    }

    pub fn set_subreports(&mut self, source: Box<dyn SubreportSource>) {
        self.subreports = Some(source);
    }

    pub fn positions(&self) -> RowPositions {
        RowPositions {
            exporter_row: self.exporter_row,
            result_row: self.result_row,
            page_row: self.page_row,
            page_no: self.page_no,
        }
    }

    /// Runs the export against the given sink.
    ///
    /// The cursor is consumed exactly once, plus one additional silent
    /// pass when the layout declares a forward reference. An empty result
    /// aborts with `NoDataFound` before any sink lifecycle call.
    pub fn export(&mut self, sink: &mut dyn OutputSink) -> Result<ExportSummary, ExportError> {
        self.layout.validate()?;
        self.paginates = sink.native_pagination();

        if !self.cursor.advance()? {
            return Err(ExportError::NoDataFound);
        }

        if !self.config.single_pass && self.layout.has_forward_reference() {
            debug!(
                "Layout '{}' declares forward references; running silent pre-pass",
                self.layout.name
            );
            let mut null_sink = NullSink;
            let outcome = self.run_pass(&mut null_sink, PassMode::Silent)?;
            if outcome == ExportOutcome::Stopped {
                return Ok(ExportSummary { outcome, rows: self.result_row });
            }
            self.crossing.mark_resolved();
            debug!("Pre-pass cached {} forward-reference values", self.crossing.len());

            self.cursor.rewind()?;
            self.reset_run_state();
            if !self.cursor.advance()? {
                return Err(ExportError::NoDataFound);
            }
        }

        let outcome = self.run_pass(sink, PassMode::Render)?;
        Ok(ExportSummary { outcome, rows: self.result_row })
    }

    /// Read-only view of the forward-reference cache, for inspection
    /// after an export.
    pub fn crossing_cache(&self) -> &CrossingCache {
        &self.crossing
    }

    fn reset_run_state(&mut self) {
        self.groups.reset();
        self.functions.reset_all();
        self.exporter_row = 0;
        self.result_row = 0;
        self.page_row = 0;
        self.page_no = 1;
        self.body_started = false;
        self.prev_row = None;
        self.prev_resolved.clear();
    }

    // --- Pass driver ---

    fn run_pass(
        &mut self,
        sink: &mut dyn OutputSink,
        mode: PassMode,
    ) -> Result<ExportOutcome, ExportError> {
        let render = mode == PassMode::Render;
        let layout = Arc::clone(&self.layout);

        if render {
            if !self.nested {
                sink.init_export(&layout.name)?;
            }
            // The first row is already current, so header bands may read
            // its columns.
            let first_row = self.snapshot_row();
            if !self.paginates {
                if let Some(band) = &layout.page_header {
                    self.print_band(band, BandKind::PageHeader, &first_row, sink)?;
                }
            }
            if let Some(band) = &layout.header {
                self.print_band(band, BandKind::Header, &first_row, sink)?;
            }
        }

        let mut first = true;
        let outcome = loop {
            let row = self.snapshot_row();
            self.result_row += 1;

            if first {
                for level in 0..layout.groups.len() {
                    self.open_group(level, &row, sink, render)?;
                }
                first = false;
            } else if let Some(broken) = self.groups.first_finished_level(&row) {
                // Detection walked outermost-first; footers emit
                // innermost-first.
                for level in (broken..layout.groups.len()).rev() {
                    self.close_group(level, sink, mode)?;
                }
                for level in broken..layout.groups.len() {
                    self.open_group(level, &row, sink, render)?;
                }
            }

            self.groups.detail_row();
            if render {
                self.print_band(&layout.detail, BandKind::Detail, &row, sink)?;
            }
            self.feed_aggregates(&row);
            self.prev_row = Some(row);

            if self.stop_requested() {
                debug!("Stop signal raised after {} rows", self.result_row);
                break ExportOutcome::Stopped;
            }
            self.maybe_yield();

            if !self.cursor.advance()? {
                break ExportOutcome::Completed;
            }
        };

        if outcome == ExportOutcome::Stopped {
            if render {
                sink.flush()?;
                if !self.nested {
                    sink.close()?;
                }
            }
            return Ok(ExportOutcome::Stopped);
        }

        for level in (0..layout.groups.len()).rev() {
            self.close_group(level, sink, mode)?;
        }
        if mode == PassMode::Silent {
            self.record_document_functions();
        }

        if render {
            let last_row = self.prev_row.clone().unwrap_or_default();
            if let Some(band) = &layout.footer {
                self.print_band(band, BandKind::Footer, &last_row, sink)?;
            }
            if !self.paginates {
                if let Some(band) = &layout.page_footer {
                    self.print_band(band, BandKind::PageFooter, &last_row, sink)?;
                }
            }
            if !self.nested {
                sink.flush()?;
                sink.finish_export()?;
                sink.close()?;
            }
        }
        Ok(ExportOutcome::Completed)
    }

    fn open_group(
        &mut self,
        level: usize,
        row: &Map<String, Value>,
        sink: &mut dyn OutputSink,
        render: bool,
    ) -> Result<(), ExportError> {
        self.groups.group_started(level, row);
        self.functions.reset_group(level);
        trace!(
            "Group {} started on {}",
            level,
            display_string(self.groups.break_value(level))
        );
        if render {
            let layout = Arc::clone(&self.layout);
            if let Some(band) = &layout.groups[level].header {
                self.print_band(band, BandKind::GroupHeader(level), row, sink)?;
            }
        }
        Ok(())
    }

    fn close_group(
        &mut self,
        level: usize,
        sink: &mut dyn OutputSink,
        mode: PassMode,
    ) -> Result<(), ExportError> {
        if mode == PassMode::Silent {
            self.record_group_functions(level);
        }
        if mode == PassMode::Render {
            let layout = Arc::clone(&self.layout);
            if let Some(band) = &layout.groups[level].footer {
                // The footer belongs to the rows already seen.
                let last_row = self.prev_row.clone().unwrap_or_default();
                self.print_band(band, BandKind::GroupFooter(level), &last_row, sink)?;
            }
        }
        trace!("Group {} finished", level);
        self.groups.group_finished(level);
        Ok(())
    }

    // --- Aggregates ---

    fn feed_aggregates(&mut self, row: &Map<String, Value>) {
        // Resolve every slot's feed value first; expression-sourced
        // aggregates evaluate against the current row.
        let feeds: Vec<Value> = self
            .functions
            .slots()
            .map(|slot| self.feed_value(&slot.def, row))
            .collect();
        for (slot, value) in self.functions.slots_mut().zip(feeds) {
            slot.compute(&value);
        }
    }

    fn feed_value(&self, def: &FunctionDef, row: &Map<String, Value>) -> Value {
        if def.is_expression {
            self.eval_or_null(&def.source, BandKind::Detail, "aggregate source", row, None, false)
        } else {
            row.get(&def.source).cloned().unwrap_or(Value::Null)
        }
    }

    fn record_group_functions(&mut self, level: usize) {
        let breadcrumb = self.groups.breadcrumb(level);
        let break_value = display_string(self.groups.break_value(level));
        trace!(
            "Recording group {} aggregates under [{}] / '{}'",
            level,
            breadcrumb.iter().join("/"),
            break_value
        );
        let mut entries = Vec::new();
        for slot in self.functions.group_slots(level) {
            let key =
                CrossingKey::for_group(breadcrumb.clone(), &slot.def, break_value.clone());
            entries.push((key, slot.computed_value()));
        }
        for (key, value) in entries {
            self.crossing.record(key, value);
        }
    }

    fn record_document_functions(&mut self) {
        let mut entries = Vec::new();
        for slot in self.functions.document_slots() {
            entries.push((CrossingKey::for_document(&slot.def), slot.computed_value()));
        }
        for (key, value) in entries {
            self.crossing.record(key, value);
        }
    }

    // --- Band printing ---

    fn print_band(
        &mut self,
        band: &Band,
        kind: BandKind,
        row: &Map<String, Value>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ExportError> {
        if let Some(obs) = self.observer.as_mut() {
            obs.band_started(kind);
        }
        let scope = self.band_scope(kind);
        let use_crossing = kind.is_header_region() && self.crossing.is_resolved();

        for (band_row_idx, band_row) in band.rows.iter().enumerate() {
            self.print_band_row(kind, band_row_idx, band_row, row, scope, use_crossing, sink)?;
        }

        if let Some(obs) = self.observer.as_mut() {
            obs.band_finished(kind);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn print_band_row(
        &mut self,
        kind: BandKind,
        band_row_idx: usize,
        band_row: &BandRow,
        row: &Map<String, Value>,
        scope: Option<usize>,
        use_crossing: bool,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ExportError> {
        // Rows with no populated cells are covered by spanning neighbours;
        // `fill_rows` already accounts for them.
        if band_row.populated().next().is_none() {
            return Ok(());
        }

        let is_page_band = matches!(kind, BandKind::PageHeader | BandKind::PageFooter);
        if band_row.starts_new_page && self.body_started && !is_page_band {
            self.page_break(row, sink)?;
        }

        // Resolve every populated cell's content up front; hide-all
        // detection needs the whole row.
        let mut resolved: Vec<(usize, &CellDescriptor, ResolvedContent)> = Vec::new();
        for (col, cell) in band_row.populated() {
            let content = self.resolve_content(cell, kind, scope, use_crossing, row, band_row_idx, col);
            resolved.push((col, cell, content));
        }

        // Hide-when: one declared hide expression puts the whole row
        // under visibility evaluation; cells without one default to
        // "hidden if blank".
        let any_hide = band_row.populated().any(|(_, c)| c.hide_when.is_some());
        let mut hidden = vec![false; resolved.len()];
        if any_hide {
            for (i, (col, cell, content)) in resolved.iter().enumerate() {
                hidden[i] = match &cell.hide_when {
                    Some(text) => {
                        let v = self.eval_or_null(
                            text,
                            kind,
                            &format!("hide-when at ({}, {})", band_row_idx, col),
                            row,
                            scope,
                            use_crossing,
                        );
                        brass_types::as_bool(&v)
                    }
                    None => content.value().map(is_blank).unwrap_or(false),
                };
            }
            if hidden.iter().all(|h| *h) {
                trace!("{} row {} entirely hidden; skipped", kind, band_row_idx);
                return Ok(());
            }
        }

        let column_count = band_row.cells.len();
        let mut max_row_span = 1;
        let mut remember: Vec<(String, Value)> = Vec::new();

        for (i, (col, cell, content)) in resolved.into_iter().enumerate() {
            let candidate = content.value().cloned().unwrap_or(Value::Null);

            if kind == BandKind::Detail {
                if let Some(key) = cell.reference_key() {
                    remember.push((key, candidate.clone()));
                }
            }

            let mut content = content;
            if hidden[i] {
                content = ResolvedContent::Value(Value::Null);
            } else if kind == BandKind::Detail && cell.suppress_repeated {
                if let Some(key) = cell.reference_key() {
                    if self
                        .prev_resolved
                        .get(&key)
                        .is_some_and(|prev| values_equal(prev, &candidate))
                    {
                        content = ResolvedContent::Value(Value::Null);
                    }
                }
            }

            let style = self.resolve_cell_style(
                band_row,
                cell,
                &candidate,
                col,
                column_count,
                kind,
                row,
                scope,
                use_crossing,
            );

            let patterned = match (&cell.pattern, &content) {
                (Some(pattern), ResolvedContent::Value(v)) if !v.is_null() => {
                    Some(apply_pattern(v, pattern))
                }
                _ => None,
            };
            if let Some(v) = patterned {
                content = ResolvedContent::Value(v);
            }

            let is_subreport = matches!(content, ResolvedContent::Subreport { .. });
            sink.cell(&ResolvedCell {
                band: kind,
                position: GridPosition { row: band_row_idx, col },
                span: Span { rows: cell.row_span, cols: cell.col_span },
                content,
                style,
            })?;
            if is_subreport {
                if let ElementKind::Subreport { name } = &cell.kind {
                    let name = name.clone();
                    self.run_subreport(&name, sink)?;
                }
            }
            max_row_span = max_row_span.max(cell.row_span);
        }

        sink.after_row(self.exporter_row)?;
        self.exporter_row += 1;
        self.page_row += 1;
        if matches!(
            kind,
            BandKind::Detail | BandKind::GroupHeader(_) | BandKind::GroupFooter(_)
        ) {
            self.body_started = true;
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.row_emitted(self.exporter_row - 1);
        }

        // Tell the sink to emit filler rows under the tallest cell.
        if max_row_span > 1 {
            sink.fill_rows(max_row_span - 1)?;
            self.exporter_row += max_row_span - 1;
            self.page_row += max_row_span - 1;
        }

        for (key, value) in remember {
            self.prev_resolved.insert(key, value);
        }
        Ok(())
    }

    fn band_scope(&self, kind: BandKind) -> Option<usize> {
        kind.group_level().or_else(|| {
            (kind == BandKind::Detail && !self.groups.is_empty())
                .then(|| self.groups.len() - 1)
        })
    }

    fn page_break(
        &mut self,
        row: &Map<String, Value>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ExportError> {
        let layout = Arc::clone(&self.layout);
        if !self.paginates {
            if let Some(band) = &layout.page_footer {
                self.print_band(band, BandKind::PageFooter, row, sink)?;
            }
        }
        sink.new_page()?;
        self.page_no += 1;
        self.page_row = 0;
        if !self.paginates {
            if let Some(band) = &layout.page_header {
                self.print_band(band, BandKind::PageHeader, row, sink)?;
            }
        }
        Ok(())
    }

    // --- Value resolution ---

    #[allow(clippy::too_many_arguments)]
    fn resolve_content(
        &self,
        cell: &CellDescriptor,
        kind: BandKind,
        scope: Option<usize>,
        use_crossing: bool,
        row: &Map<String, Value>,
        band_row_idx: usize,
        col: usize,
    ) -> ResolvedContent {
        match &cell.kind {
            ElementKind::Literal { value } => ResolvedContent::Value(value.clone()),
            ElementKind::Column { name } => {
                ResolvedContent::Value(row.get(name).cloned().unwrap_or(Value::Null))
            }
            ElementKind::Function { name, source, is_expression } => {
                let def = FunctionDef {
                    function: name.clone(),
                    source: source.clone(),
                    is_expression: *is_expression,
                };
                ResolvedContent::Value(self.function_value(&def, kind, scope, use_crossing))
            }
            ElementKind::Expression { name, text } => {
                let value = self.eval_or_null(
                    text,
                    kind,
                    &format!("expression '{}' at ({}, {})", name, band_row_idx, col),
                    row,
                    scope,
                    use_crossing,
                );
                ResolvedContent::Value(value)
            }
            ElementKind::Parameter { name } => ResolvedContent::Value(
                self.params.get(name).cloned().unwrap_or(Value::Null),
            ),
            ElementKind::Variable { variable } => {
                ResolvedContent::Value(self.namespace_input(row).variable(*variable))
            }
            ElementKind::Image { source } => {
                ResolvedContent::Image { source: source.clone() }
            }
            ElementKind::ColumnImage { column } => {
                let source = row
                    .get(column)
                    .map(display_string)
                    .unwrap_or_default();
                ResolvedContent::Image { source }
            }
            ElementKind::Chart { name } => ResolvedContent::Image { source: name.clone() },
            ElementKind::Barcode { column, symbology } => ResolvedContent::Barcode {
                value: row.get(column).cloned().unwrap_or(Value::Null),
                symbology: symbology.clone(),
            },
            ElementKind::Hyperlink { label, target } => ResolvedContent::Hyperlink {
                label: label.clone(),
                target: target.clone(),
            },
            ElementKind::Subreport { name } => {
                ResolvedContent::Subreport { name: name.clone() }
            }
        }
    }

    /// The value of an aggregate reference: the forward-reference cache
    /// for header regions after a pre-pass, the live instance otherwise.
    fn function_value(
        &self,
        def: &FunctionDef,
        kind: BandKind,
        scope: Option<usize>,
        use_crossing: bool,
    ) -> Value {
        if use_crossing {
            let key = match kind {
                BandKind::GroupHeader(level) => CrossingKey::for_group(
                    self.groups.breadcrumb(level),
                    def,
                    display_string(self.groups.break_value(level)),
                ),
                _ => CrossingKey::for_document(def),
            };
            return match self.crossing.get(&key) {
                Some(value) => value.clone(),
                None => {
                    warn!(
                        "Unresolved forward reference in {}: {}({}) has no cached value",
                        kind, def.function, def.source
                    );
                    Value::Null
                }
            };
        }
        match self.functions.lookup(scope, def) {
            Some(slot) => slot.computed_value(),
            None => {
                warn!(
                    "No aggregate instance for {}({}) in {}; cell renders null",
                    def.function, def.source, kind
                );
                Value::Null
            }
        }
    }

    // --- Conditional styles ---

    #[allow(clippy::too_many_arguments)]
    fn resolve_cell_style(
        &self,
        band_row: &BandRow,
        cell: &CellDescriptor,
        candidate: &Value,
        col: usize,
        column_count: usize,
        kind: BandKind,
        row: &Map<String, Value>,
        scope: Option<usize>,
        use_crossing: bool,
    ) -> CellStyle {
        if band_row.conditions.is_empty() && cell.conditions.is_empty() {
            return cell.style.clone();
        }
        let row_rules =
            self.rule_candidates(&band_row.conditions, candidate, kind, row, scope, use_crossing);
        let cell_rules =
            self.rule_candidates(&cell.conditions, candidate, kind, row, scope, use_crossing);
        conditional::resolve_style(&cell.style, &row_rules, &cell_rules, col, column_count)
    }

    fn rule_candidates<'r>(
        &self,
        rules: &'r [ConditionalRule],
        raw: &Value,
        kind: BandKind,
        row: &Map<String, Value>,
        scope: Option<usize>,
        use_crossing: bool,
    ) -> Vec<RuleCandidate<'r>> {
        rules
            .iter()
            .map(|rule| {
                let candidate = match &rule.expression {
                    Some(text) => self.eval_or_null(
                        text,
                        kind,
                        "conditional rule",
                        row,
                        scope,
                        use_crossing,
                    ),
                    None => raw.clone(),
                };
                RuleCandidate { rule, candidate }
            })
            .collect()
    }

    // --- Expression plumbing ---

    fn namespace_input<'a>(&'a self, row: &'a Map<String, Value>) -> NamespaceInput<'a> {
        NamespaceInput {
            row,
            params: &self.params,
            report_name: &self.layout.name,
            result_row: self.result_row,
            group_row: self.groups.innermost_group_row(),
            page_no: self.page_no,
            pagination_tokens: self.paginates,
        }
    }

    fn evaluate_expression(
        &self,
        text: &str,
        row: &Map<String, Value>,
        scope: Option<usize>,
        use_crossing: bool,
    ) -> Result<Value, ExprError> {
        let expr = parse_expression(text)?;
        let input = self.namespace_input(row);
        let mut agg = || self.aggregate_namespace(scope, use_crossing);
        let root = context::build_namespace(text, &input, &mut agg);
        let e_ctx = EvaluationContext { root: &root, functions: &self.scalars };
        evaluate(&expr, &e_ctx)
    }

    /// Evaluates and degrades failures to null, logging enough context to
    /// reproduce them.
    fn eval_or_null(
        &self,
        text: &str,
        band: BandKind,
        where_: &str,
        row: &Map<String, Value>,
        scope: Option<usize>,
        use_crossing: bool,
    ) -> Value {
        match self.evaluate_expression(text, row, scope, use_crossing) {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid expression in {} ({}): '{}': {}", band, where_, text, e);
                Value::Null
            }
        }
    }

    /// Builds the `agg` namespace for one evaluation: document slots
    /// first, then enclosing group scopes outermost to innermost, so the
    /// nearest scope wins a (function, source) collision.
    fn aggregate_namespace(&self, scope: Option<usize>, use_crossing: bool) -> Value {
        let mut agg = Map::new();
        for slot in self.functions.document_slots() {
            let value = if use_crossing {
                self.crossing
                    .get(&CrossingKey::for_document(&slot.def))
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                slot.computed_value()
            };
            context::insert_aggregate(&mut agg, &slot.def.function, &slot.def.source, value);
        }
        if let Some(level) = scope {
            for l in 0..=level {
                for slot in self.functions.group_slots(l) {
                    let value = if use_crossing {
                        let key = CrossingKey::for_group(
                            self.groups.breadcrumb(l),
                            &slot.def,
                            display_string(self.groups.break_value(l)),
                        );
                        self.crossing.get(&key).cloned().unwrap_or(Value::Null)
                    } else {
                        slot.computed_value()
                    };
                    context::insert_aggregate(
                        &mut agg,
                        &slot.def.function,
                        &slot.def.source,
                        value,
                    );
                }
            }
        }
        Value::Object(agg)
    }

    // --- Subreports ---

    fn run_subreport(
        &mut self,
        name: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ExportError> {
        let Some(source) = &self.subreports else {
            warn!("Subreport '{}' referenced but no subreport source configured", name);
            return Ok(());
        };
        let Some((layout, cursor)) = source.open(name) else {
            warn!("Unknown subreport '{}'", name);
            return Ok(());
        };
        let mut child = ResultExporter::new(
            layout,
            cursor,
            self.params.clone(),
            self.aggregates.clone(),
            self.scalars.clone(),
            self.config.clone(),
        );
        child.nested = true;
        match child.export(sink) {
            Ok(_) => Ok(()),
            Err(ExportError::NoDataFound) => {
                warn!("Subreport '{}' returned no data", name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // --- Cooperative scheduling ---

    fn stop_requested(&self) -> bool {
        let Some(flag) = &self.config.stop else {
            return false;
        };
        let cadence = self.config.stop_poll_rows.max(1);
        if self.result_row % cadence != 0 {
            return false;
        }
        flag.load(Ordering::Relaxed)
    }

    fn maybe_yield(&self) {
        let Some(every) = self.config.yield_every_rows else {
            return;
        };
        if every == 0 || self.result_row % every != 0 {
            return;
        }
        if self.config.yield_for.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.config.yield_for);
        }
    }

    fn snapshot_row(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for name in self.cursor.columns() {
            let value = self.cursor.value(name).cloned().unwrap_or(Value::Null);
            map.insert(name.clone(), value);
        }
        map
    }
}
