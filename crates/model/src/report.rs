//! The report layout root: every band, group and declaration one export
//! consumes. Immutable for the duration of a run.

use crate::band::{Band, BandKind};
use crate::element::ElementKind;
use crate::group::{FunctionDef, GroupDef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Cell at {band} row {row} col {col} spans past the band's grid")]
    SpanOverflow { band: BandKind, row: usize, col: usize },
    #[error("Group {0} has an empty break column")]
    EmptyBreakColumn(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportLayout {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_header: Option<Band>,
    pub detail: Band,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_footer: Option<Band>,
    /// Outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDef>,
}

impl ReportLayout {
    pub fn new(name: impl Into<String>, detail: Band) -> Self {
        Self {
            name: name.into(),
            header: None,
            page_header: None,
            detail,
            footer: None,
            page_footer: None,
            groups: Vec::new(),
        }
    }

    pub fn with_header(mut self, band: Band) -> Self {
        self.header = Some(band);
        self
    }

    pub fn with_footer(mut self, band: Band) -> Self {
        self.footer = Some(band);
        self
    }

    pub fn with_page_header(mut self, band: Band) -> Self {
        self.page_header = Some(band);
        self
    }

    pub fn with_page_footer(mut self, band: Band) -> Self {
        self.page_footer = Some(band);
        self
    }

    pub fn with_group(mut self, group: GroupDef) -> Self {
        self.groups.push(group);
        self
    }

    /// Every declared band with its kind, document bands first, then
    /// group bands outermost to innermost.
    pub fn bands(&self) -> Vec<(BandKind, &Band)> {
        let mut out = Vec::new();
        if let Some(b) = &self.page_header {
            out.push((BandKind::PageHeader, b));
        }
        if let Some(b) = &self.header {
            out.push((BandKind::Header, b));
        }
        out.push((BandKind::Detail, &self.detail));
        if let Some(b) = &self.footer {
            out.push((BandKind::Footer, b));
        }
        if let Some(b) = &self.page_footer {
            out.push((BandKind::PageFooter, b));
        }
        for (level, group) in self.groups.iter().enumerate() {
            if let Some(b) = &group.header {
                out.push((BandKind::GroupHeader(level), b));
            }
            if let Some(b) = &group.footer {
                out.push((BandKind::GroupFooter(level), b));
            }
        }
        out
    }

    /// Checks the structural invariants: spans stay inside their band's
    /// grid, and every group names a break column.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (kind, band) in self.bands() {
            for (row_idx, row) in band.rows.iter().enumerate() {
                for (col_idx, cell) in row.populated() {
                    if col_idx + cell.col_span > row.cells.len()
                        || row_idx + cell.row_span > band.rows.len()
                    {
                        return Err(LayoutError::SpanOverflow {
                            band: kind,
                            row: row_idx,
                            col: col_idx,
                        });
                    }
                }
            }
        }
        for (level, group) in self.groups.iter().enumerate() {
            if group.column.trim().is_empty() {
                return Err(LayoutError::EmptyBreakColumn(level));
            }
        }
        Ok(())
    }

    /// The aggregate declarations scoped to one group: everything its
    /// header and footer bands reference.
    pub fn group_functions(&self, level: usize) -> Vec<FunctionDef> {
        let mut out: Vec<FunctionDef> = Vec::new();
        let Some(group) = self.groups.get(level) else {
            return out;
        };
        for band in [&group.footer, &group.header].into_iter().flatten() {
            for def in FunctionDef::scan(band) {
                if !out.iter().any(|f| f.key() == def.key()) {
                    out.push(def);
                }
            }
        }
        out
    }

    /// The aggregate declarations scoped to the whole stream: everything
    /// referenced outside group bands.
    pub fn document_functions(&self) -> Vec<FunctionDef> {
        let mut out: Vec<FunctionDef> = Vec::new();
        let mut document_bands: Vec<&Band> = vec![&self.detail];
        for band in [&self.header, &self.footer, &self.page_header, &self.page_footer]
            .into_iter()
            .flatten()
        {
            document_bands.push(band);
        }
        for band in document_bands {
            for def in FunctionDef::scan(band) {
                if !out.iter().any(|f| f.key() == def.key()) {
                    out.push(def);
                }
            }
        }
        out
    }

    /// Whether any header-region band depends on an aggregate whose final
    /// value is only known after the stream completes. This is what makes
    /// the silent pre-pass necessary.
    pub fn has_forward_reference(&self) -> bool {
        let mut header_bands: Vec<&Band> = Vec::new();
        if let Some(b) = &self.header {
            header_bands.push(b);
        }
        for group in &self.groups {
            if let Some(b) = &group.header {
                header_bands.push(b);
            }
        }
        header_bands.iter().any(|band| {
            band.cells().any(|cell| match &cell.kind {
                ElementKind::Function { .. } => true,
                ElementKind::Expression { text, .. } => text.contains("agg."),
                _ => false,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandRow;
    use crate::element::CellDescriptor;

    fn one_cell_band(cell: CellDescriptor) -> Band {
        Band::single(vec![Some(cell)])
    }

    #[test]
    fn test_validate_accepts_well_formed_layout() {
        let layout = ReportLayout::new(
            "orders",
            Band::single(vec![Some(CellDescriptor::column("amount")), None]),
        );
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_col_span_overflow() {
        let layout = ReportLayout::new(
            "orders",
            Band::single(vec![Some(CellDescriptor::column("amount").with_span(1, 3)), None]),
        );
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::SpanOverflow { band: BandKind::Detail, row: 0, col: 0 })
        ));
    }

    #[test]
    fn test_validate_rejects_row_span_overflow() {
        let layout = ReportLayout::new(
            "orders",
            Band::single(vec![Some(CellDescriptor::column("amount").with_span(2, 1))]),
        );
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_forward_reference_detection() {
        let plain = ReportLayout::new(
            "orders",
            one_cell_band(CellDescriptor::column("amount")),
        )
        .with_footer(one_cell_band(CellDescriptor::function("sum", "amount")));
        assert!(!plain.has_forward_reference());

        let forward = ReportLayout::new(
            "orders",
            one_cell_band(CellDescriptor::column("amount")),
        )
        .with_header(one_cell_band(CellDescriptor::function("sum", "amount")));
        assert!(forward.has_forward_reference());

        let via_expression = ReportLayout::new(
            "orders",
            one_cell_band(CellDescriptor::column("amount")),
        )
        .with_header(one_cell_band(CellDescriptor::expression(
            "avg_share",
            "agg.sum.amount / 2",
        )));
        assert!(via_expression.has_forward_reference());
    }

    #[test]
    fn test_function_scan_deduplicates() {
        let band = Band::single(vec![
            Some(CellDescriptor::function("sum", "amount")),
            Some(CellDescriptor::function("SUM", "amount")),
            Some(CellDescriptor::function("count", "id")),
        ]);
        let defs = FunctionDef::scan(&band);
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn test_layout_deserializes_from_json() {
        let layout: ReportLayout = serde_json::from_value(serde_json::json!({
            "name": "orders",
            "detail": { "rows": [ { "cells": [
                { "type": "column", "name": "region" },
                { "type": "column", "name": "amount", "suppressRepeated": true }
            ] } ] },
            "groups": [ { "column": "region" } ]
        }))
        .unwrap();
        assert_eq!(layout.groups.len(), 1);
        let cells: Vec<_> = layout.detail.cells().collect();
        assert!(cells[1].suppress_repeated);
    }
}
