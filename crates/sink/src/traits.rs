use crate::error::SinkError;
use crate::types::ResolvedCell;

/// A format-specific consumer of resolved cells.
///
/// The engine delivers one `cell` call per visible cell, `after_row` when
/// a band row is complete, and `fill_rows` when row spans require empty
/// filler rows. Lifecycle order is `init_export`, cells/rows, `flush` (at
/// the engine's discretion), `finish_export`, `close`.
pub trait OutputSink {
    fn init_export(&mut self, report_name: &str) -> Result<(), SinkError>;

    fn cell(&mut self, cell: &ResolvedCell) -> Result<(), SinkError>;

    /// A band row is complete; `row` is the exporter-row index.
    fn after_row(&mut self, row: usize) -> Result<(), SinkError>;

    /// Emit `count` filler rows for span bookkeeping.
    fn fill_rows(&mut self, count: usize) -> Result<(), SinkError> {
        let _ = count;
        Ok(())
    }

    fn new_page(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn finish_export(&mut self) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Whether this sink tracks live page numbers itself. When true, the
    /// engine leaves page-number and total-page-count variable tokens
    /// unresolved and the sink substitutes them at paint time.
    fn native_pagination(&self) -> bool {
        false
    }
}
