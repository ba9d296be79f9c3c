pub mod fixtures;

use brass::{
    ExportError, ExportSummary, ExporterBuilder, RecordingSink, ReportLayout, ResultCursor,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Runs a full export into a `RecordingSink` and hands both back.
pub fn export_to_recording(
    layout: ReportLayout,
    cursor: Box<dyn ResultCursor>,
) -> Result<(RecordingSink, ExportSummary), ExportError> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut sink = RecordingSink::new();
    let mut exporter = ExporterBuilder::new(layout, cursor).build();
    let summary = exporter.export(&mut sink)?;
    Ok((sink, summary))
}
