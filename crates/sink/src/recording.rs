//! A sink that records everything it receives, for tests and debugging.

use crate::error::SinkError;
use crate::traits::OutputSink;
use crate::types::{ResolvedCell, ResolvedContent};
use brass_model::BandKind;
use serde_json::Value;

/// Lifecycle events in the order the engine delivered them.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Init(String),
    Cell(ResolvedCell),
    AfterRow(usize),
    FillRows(usize),
    NewPage,
    Flush,
    Finish,
    Close,
}

/// Records every cell and lifecycle call. `native_pagination` is
/// configurable so tests can exercise the page-token passthrough contract.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub paginates_natively: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_pagination() -> Self {
        Self { events: Vec::new(), paginates_natively: true }
    }

    /// All recorded cells, in delivery order.
    pub fn cells(&self) -> Vec<&ResolvedCell> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Cell(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Recorded cells belonging to one band kind.
    pub fn cells_in(&self, band: BandKind) -> Vec<&ResolvedCell> {
        self.cells().into_iter().filter(|c| c.band == band).collect()
    }

    /// Plain values delivered for one band kind, in order.
    pub fn values_in(&self, band: BandKind) -> Vec<Value> {
        self.cells_in(band)
            .into_iter()
            .filter_map(|c| match &c.content {
                ResolvedContent::Value(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn page_breaks(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, SinkEvent::NewPage)).count()
    }

    pub fn was_closed(&self) -> bool {
        self.events.iter().any(|e| matches!(e, SinkEvent::Close))
    }
}

impl OutputSink for RecordingSink {
    fn init_export(&mut self, report_name: &str) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Init(report_name.to_string()));
        Ok(())
    }

    fn cell(&mut self, cell: &ResolvedCell) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Cell(cell.clone()));
        Ok(())
    }

    fn after_row(&mut self, row: usize) -> Result<(), SinkError> {
        self.events.push(SinkEvent::AfterRow(row));
        Ok(())
    }

    fn fill_rows(&mut self, count: usize) -> Result<(), SinkError> {
        self.events.push(SinkEvent::FillRows(count));
        Ok(())
    }

    fn new_page(&mut self) -> Result<(), SinkError> {
        self.events.push(SinkEvent::NewPage);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Flush);
        Ok(())
    }

    fn finish_export(&mut self) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Finish);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Close);
        Ok(())
    }

    fn native_pagination(&self) -> bool {
        self.paginates_natively
    }
}
