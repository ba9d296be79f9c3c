//! Optional collaborators handed to the engine at construction.

use brass_model::{BandKind, ReportLayout};
use brass_source::ResultCursor;

/// Explicit traversal observer, passed at construction instead of any
/// global listener registry. All callbacks default to no-ops.
pub trait TraversalObserver {
    fn band_started(&mut self, band: BandKind) {
        let _ = band;
    }

    fn band_finished(&mut self, band: BandKind) {
        let _ = band;
    }

    /// One exporter row was delivered to the sink.
    fn row_emitted(&mut self, exporter_row: usize) {
        let _ = exporter_row;
    }
}

/// Resolves a nested-report reference to its layout and sub-cursor. The
/// child engine runs independently against the same sink and shares
/// nothing with its parent beyond read-only parameter values.
pub trait SubreportSource {
    fn open(&self, name: &str) -> Option<(ReportLayout, Box<dyn ResultCursor>)>;
}
