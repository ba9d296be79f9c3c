//! Group definitions and aggregate-function declarations.

use crate::band::Band;
use crate::element::ElementKind;
use serde::{Deserialize, Serialize};

/// One break-on-column-change report division. Groups are declared
/// outermost first; an inner group's "outer" group is the previous entry
/// in the declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupDef {
    /// The break column: the group restarts whenever this column's value
    /// changes between consecutive rows.
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Band>,
}

impl GroupDef {
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), header: None, footer: None }
    }

    pub fn with_header(mut self, band: Band) -> Self {
        self.header = Some(band);
        self
    }

    pub fn with_footer(mut self, band: Band) -> Self {
        self.footer = Some(band);
        self
    }
}

/// An aggregate declaration discovered by scanning a band for function
/// cells: which aggregate, over which column (or per-row expression).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDef {
    pub function: String,
    pub source: String,
    #[serde(default)]
    pub is_expression: bool,
}

impl FunctionDef {
    /// The (function, source) identity aggregates are cached under.
    /// Function names compare case-insensitively.
    pub fn key(&self) -> (String, String) {
        (self.function.to_lowercase(), self.source.clone())
    }

    /// Collects the distinct aggregate declarations a band references.
    pub fn scan(band: &Band) -> Vec<FunctionDef> {
        let mut found: Vec<FunctionDef> = Vec::new();
        for cell in band.cells() {
            if let ElementKind::Function { name, source, is_expression } = &cell.kind {
                let def = FunctionDef {
                    function: name.clone(),
                    source: source.clone(),
                    is_expression: *is_expression,
                };
                if !found.iter().any(|f| f.key() == def.key()) {
                    found.push(def);
                }
            }
        }
        found
    }
}
