//! Defines the unified error types for export operations.

use brass_model::LayoutError;
use brass_sink::SinkError;
use brass_source::CursorError;
use thiserror::Error;

/// The main error enum for a whole export run.
///
/// Per-cell failures (bad expressions, unresolved forward references) are
/// deliberately absent here: they resolve the cell to null and are logged,
/// never aborting the pass. Only cursor-level and initialisation failures
/// abort an export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No data found: the result set is empty")]
    NoDataFound,

    #[error("Layout declares a forward reference but the cursor cannot rewind")]
    RewindUnsupported,

    #[error("Cursor error: {0}")]
    Cursor(CursorError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

impl From<CursorError> for ExportError {
    fn from(e: CursorError) -> Self {
        match e {
            CursorError::RewindUnsupported => ExportError::RewindUnsupported,
            other => ExportError::Cursor(other),
        }
    }
}
