use brass_model::BandKind;
use brass_style::CellStyle;
use serde_json::Value;

/// Grid coordinates of a cell within its band occurrence, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

/// How many grid rows/columns a cell occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub rows: usize,
    pub cols: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

/// The resolved content of one visible cell. Painting is entirely the
/// sink's job; the engine only decides *what* the cell carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedContent {
    /// A plain value; `Null` renders as an empty cell.
    Value(Value),
    /// An image, addressed by source path/URL.
    Image { source: String },
    /// A barcode the sink renders from a value.
    Barcode { value: Value, symbology: String },
    /// A hyperlink.
    Hyperlink { label: String, target: String },
    /// Marks where a nested report was emitted inline.
    Subreport { name: String },
}

impl ResolvedContent {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolvedContent::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Everything a sink needs to paint one cell: where it sits, what it
/// carries, and the effective style after conditional formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCell {
    pub band: BandKind,
    pub position: GridPosition,
    pub span: Span,
    pub content: ResolvedContent,
    pub style: CellStyle,
}
