//! Result-cursor abstractions for the export engine.
//!
//! This module provides the `ResultCursor` trait and implementations for
//! feeding query results into an export.
//!
//! ## Available Cursors
//!
//! - `RowsCursor`: in-memory rows, rewindable
//! - `IteratorCursor`: wraps any row iterator, forward-only
//!
//! ## Example
//!
//! ```ignore
//! use brass_source::{ResultCursor, RowsCursor};
//! use serde_json::json;
//!
//! let mut cursor = RowsCursor::new(
//!     vec!["id".into()],
//!     vec![json!({"id": 1}), json!({"id": 2})],
//! );
//! while cursor.advance().unwrap() {
//!     println!("id = {:?}", cursor.value("id"));
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("Cursor does not support rewinding")]
    RewindUnsupported,
    #[error("Row access error: {0}")]
    Access(String),
}

/// A forward-only cursor over a query result.
///
/// The engine consumes a cursor exactly once per pass: `advance` moves to
/// the next row (returning `false` at the end), and `value` reads a named
/// column of the current row. The pre-pass additionally needs `rewind`,
/// which an implementation may refuse.
pub trait ResultCursor: Send {
    /// Move to the next row. Returns `false` when the result is exhausted.
    fn advance(&mut self) -> Result<bool, CursorError>;

    /// The value of a named column in the current row. `None` before the
    /// first `advance`, after exhaustion, or for an unknown column.
    fn value(&self, column: &str) -> Option<&Value>;

    /// Column names, in result order.
    fn columns(&self) -> &[String];

    /// Position of a named column, if present.
    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns().iter().position(|c| c == column)
    }

    /// Reset to before the first row, so the result can be consumed again.
    fn rewind(&mut self) -> Result<(), CursorError>;

    /// Total row count, when the source knows it up front.
    fn row_count(&self) -> Option<usize> {
        None
    }

    /// Check if the source has a known row count.
    fn row_count_known(&self) -> bool {
        self.row_count().is_some()
    }
}

/// An in-memory, rewindable cursor. Rows are JSON objects keyed by column
/// name. This is the simplest cursor, useful for small results or testing.
pub struct RowsCursor {
    columns: Vec<String>,
    rows: Vec<Value>,
    /// `None` before the first advance.
    position: Option<usize>,
}

impl RowsCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Value>) -> Self {
        Self { columns, rows, position: None }
    }

    /// Build from per-row value vectors in column order.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let objects = rows
            .into_iter()
            .map(|row| {
                let map = columns
                    .iter()
                    .cloned()
                    .zip(row)
                    .collect::<serde_json::Map<String, Value>>();
                Value::Object(map)
            })
            .collect();
        Self::new(columns, objects)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ResultCursor for RowsCursor {
    fn advance(&mut self) -> Result<bool, CursorError> {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value(&self, column: &str) -> Option<&Value> {
        let row = self.rows.get(self.position?)?;
        row.get(column)
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn rewind(&mut self) -> Result<(), CursorError> {
        self.position = None;
        Ok(())
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}

/// Wraps any row iterator as a forward-only cursor. Rewinding is
/// unsupported, so layouts with forward references must fail fast on it.
pub struct IteratorCursor<I>
where
    I: Iterator<Item = Value> + Send,
{
    inner: I,
    columns: Vec<String>,
    current: Option<Value>,
    started: bool,
}

impl<I> IteratorCursor<I>
where
    I: Iterator<Item = Value> + Send,
{
    pub fn new(columns: Vec<String>, inner: I) -> Self {
        Self { inner, columns, current: None, started: false }
    }
}

impl<I> ResultCursor for IteratorCursor<I>
where
    I: Iterator<Item = Value> + Send,
{
    fn advance(&mut self) -> Result<bool, CursorError> {
        self.started = true;
        self.current = self.inner.next();
        Ok(self.current.is_some())
    }

    fn value(&self, column: &str) -> Option<&Value> {
        self.current.as_ref()?.get(column)
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn rewind(&mut self) -> Result<(), CursorError> {
        if self.started {
            return Err(CursorError::RewindUnsupported);
        }
        Ok(())
    }
}

// Blanket implementation for Box<dyn ResultCursor>
impl ResultCursor for Box<dyn ResultCursor> {
    fn advance(&mut self) -> Result<bool, CursorError> {
        (**self).advance()
    }

    fn value(&self, column: &str) -> Option<&Value> {
        (**self).value(column)
    }

    fn columns(&self) -> &[String] {
        (**self).columns()
    }

    fn rewind(&mut self) -> Result<(), CursorError> {
        (**self).rewind()
    }

    fn row_count(&self) -> Option<usize> {
        (**self).row_count()
    }
}
