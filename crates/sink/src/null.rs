use crate::error::SinkError;
use crate::traits::OutputSink;
use crate::types::ResolvedCell;

/// A sink that discards everything. The forward-reference pre-pass runs
/// against this so aggregate state advances without producing output.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn init_export(&mut self, _report_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn cell(&mut self, _cell: &ResolvedCell) -> Result<(), SinkError> {
        Ok(())
    }

    fn after_row(&mut self, _row: usize) -> Result<(), SinkError> {
        Ok(())
    }

    fn finish_export(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
