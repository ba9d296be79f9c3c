//! Bands: named rectangular regions of the report layout.

use crate::condition::ConditionalRule;
use crate::element::CellDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which region of the report a band occupies. Group bands carry their
/// zero-based nesting level (0 = outermost).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "region", content = "level")]
pub enum BandKind {
    Header,
    Detail,
    Footer,
    PageHeader,
    PageFooter,
    GroupHeader(usize),
    GroupFooter(usize),
}

impl BandKind {
    /// Header-region bands are printed before the rows that feed their
    /// aggregates, which is what makes forward references forward.
    pub fn is_header_region(&self) -> bool {
        matches!(self, BandKind::Header | BandKind::GroupHeader(_))
    }

    /// The group level this band belongs to, if any.
    pub fn group_level(&self) -> Option<usize> {
        match self {
            BandKind::GroupHeader(level) | BandKind::GroupFooter(level) => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandKind::Header => write!(f, "HEADER"),
            BandKind::Detail => write!(f, "DETAIL"),
            BandKind::Footer => write!(f, "FOOTER"),
            BandKind::PageHeader => write!(f, "PAGE_HEADER"),
            BandKind::PageFooter => write!(f, "PAGE_FOOTER"),
            BandKind::GroupHeader(level) => write!(f, "GROUP_HEADER_{}", level),
            BandKind::GroupFooter(level) => write!(f, "GROUP_FOOTER_{}", level),
        }
    }
}

/// One row of a band's grid. `None` cells are covered by a spanning
/// neighbour and are never independently rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BandRow {
    pub cells: Vec<Option<CellDescriptor>>,
    /// Row-level conditional formatting, applied to every cell in the row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionalRule>,
    /// Force a page break before this row (except as the very first row
    /// of the document).
    #[serde(default)]
    pub starts_new_page: bool,
}

impl BandRow {
    pub fn new(cells: Vec<Option<CellDescriptor>>) -> Self {
        Self { cells, conditions: Vec::new(), starts_new_page: false }
    }

    pub fn with_condition(mut self, rule: ConditionalRule) -> Self {
        self.conditions.push(rule);
        self
    }

    pub fn starts_new_page(mut self) -> Self {
        self.starts_new_page = true;
        self
    }

    /// Populated cells with their column positions.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &CellDescriptor)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| cell.as_ref().map(|c| (col, c)))
    }
}

/// A rectangular grid of optional cell descriptors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub rows: Vec<BandRow>,
}

impl Band {
    pub fn new(rows: Vec<BandRow>) -> Self {
        Self { rows }
    }

    /// A single-row band, the common case.
    pub fn single(cells: Vec<Option<CellDescriptor>>) -> Self {
        Self { rows: vec![BandRow::new(cells)] }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.cells.iter().all(Option::is_none))
    }

    /// Every populated cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &CellDescriptor> {
        self.rows.iter().flat_map(|r| r.populated().map(|(_, c)| c))
    }
}
