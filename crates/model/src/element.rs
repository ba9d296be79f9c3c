//! Band elements: the closed set of things a cell can contain.

use crate::condition::ConditionalRule;
use brass_style::CellStyle;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Report-provided variables a cell can reference directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportVariable {
    /// Position in the underlying result, 1-based.
    Row,
    /// Occurrences since the innermost group last started.
    GroupRow,
    /// Current page number, 1-based.
    PageNo,
    /// Total page count. Sinks with native pagination substitute this
    /// themselves at paint time.
    PageCount,
    /// The report layout's name.
    ReportName,
}

impl ReportVariable {
    /// The key this variable is bound under inside the `var` namespace.
    pub fn key(&self) -> &'static str {
        match self {
            ReportVariable::Row => "ROW",
            ReportVariable::GroupRow => "GROUP_ROW",
            ReportVariable::PageNo => "PAGE_NO",
            ReportVariable::PageCount => "PAGE_COUNT",
            ReportVariable::ReportName => "REPORT_NAME",
        }
    }

    /// The verbatim token handed to sinks that do their own pagination.
    pub fn token(&self) -> String {
        format!("var.{}", self.key())
    }
}

/// What one populated cell contains. A closed set: traversal, value
/// resolution and style building all match exhaustively on this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ElementKind {
    /// Fixed text or a fixed value.
    Literal { value: Value },
    /// The current row's value of a named result column.
    Column { name: String },
    /// An aggregate-function reference, e.g. sum over `amount`. When
    /// `isExpression` is set, `source` is an expression evaluated per row
    /// and fed to the aggregate instead of a raw column.
    Function {
        name: String,
        source: String,
        #[serde(default, rename = "isExpression")]
        is_expression: bool,
    },
    /// A named expression evaluated against the blended namespace.
    Expression { name: String, text: String },
    /// A bound parameter's value.
    Parameter { name: String },
    /// A report variable.
    Variable { variable: ReportVariable },
    /// A static image, addressed by source path/URL.
    Image { source: String },
    /// An image whose source comes from a result column.
    ColumnImage { column: String },
    /// A pre-rendered chart, addressed by name.
    Chart { name: String },
    /// A barcode rendered by the sink from a column value.
    Barcode { column: String, symbology: String },
    /// A hyperlink with a fixed label and target.
    Hyperlink { label: String, target: String },
    /// A nested report, run against its own sub-cursor.
    Subreport { name: String },
}

/// One populated cell of a band: its content plus static presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellDescriptor {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default = "default_span")]
    pub row_span: usize,
    #[serde(default = "default_span")]
    pub col_span: usize,
    #[serde(default)]
    pub style: CellStyle,
    /// Display pattern applied to the resolved value (numeric or date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// When this evaluates true, the cell renders as null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_when: Option<String>,
    /// Render null when the resolved value equals the previous detail
    /// row's value for the same reference.
    #[serde(default)]
    pub suppress_repeated: bool,
    /// Cell-level conditional formatting, applied after row-level rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionalRule>,
}

fn default_span() -> usize {
    1
}

impl CellDescriptor {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            row_span: 1,
            col_span: 1,
            style: CellStyle::default(),
            pattern: None,
            hide_when: None,
            suppress_repeated: false,
            conditions: Vec::new(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(ElementKind::Literal { value: value.into() })
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Column { name: name.into() })
    }

    pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(ElementKind::Function {
            name: name.into(),
            source: source.into(),
            is_expression: false,
        })
    }

    pub fn expression(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(ElementKind::Expression { name: name.into(), text: text.into() })
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Parameter { name: name.into() })
    }

    pub fn variable(variable: ReportVariable) -> Self {
        Self::new(ElementKind::Variable { variable })
    }

    pub fn with_span(mut self, rows: usize, cols: usize) -> Self {
        self.row_span = rows;
        self.col_span = cols;
        self
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_hide_when(mut self, expression: impl Into<String>) -> Self {
        self.hide_when = Some(expression.into());
        self
    }

    pub fn with_repeated_suppression(mut self) -> Self {
        self.suppress_repeated = true;
        self
    }

    pub fn with_condition(mut self, rule: ConditionalRule) -> Self {
        self.conditions.push(rule);
        self
    }

    /// The identity used for previous-row caching and repeated-value
    /// suppression. Only column and expression cells have one.
    pub fn reference_key(&self) -> Option<String> {
        match &self.kind {
            ElementKind::Column { name } => Some(format!("col:{}", name)),
            ElementKind::Expression { name, .. } => Some(format!("expr:{}", name)),
            _ => None,
        }
    }
}
