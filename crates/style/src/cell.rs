//! The static style a cell declares, and the per-property patch a
//! conditional-formatting rule applies on top of it.

use crate::align::{HorizontalAlign, VerticalAlign};
use crate::border::{Border, BorderEdges};
use crate::font::{FontStyle, FontWeight};
use crate::padding::Padding;
use brass_types::Color;
use serde::{Deserialize, Serialize};

/// The complete style of one cell. Every property is optional; unset
/// properties are left to the sink's defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    // Font & text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    // Box
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borders: Option<BorderEdges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,

    // Placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_align: Option<HorizontalAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v_align: Option<VerticalAlign>,
}

impl CellStyle {
    /// Applies an override patch. Only the properties the patch sets are
    /// touched; everything else keeps its current value.
    pub fn apply(&mut self, patch: &StyleOverride) {
        if let Some(bg) = &patch.background {
            self.background = Some(bg.clone());
        }
        if let Some(fg) = &patch.foreground {
            self.color = Some(fg.clone());
        }
        if let Some(border) = &patch.border {
            self.borders = Some(BorderEdges::all(border.clone()));
        }
        if let Some(family) = &patch.font_family {
            self.font_family = Some(family.clone());
        }
        if let Some(size) = patch.font_size {
            self.font_size = Some(size);
        }
        if let Some(weight) = &patch.font_weight {
            self.font_weight = Some(weight.clone());
        }
        if let Some(style) = &patch.font_style {
            self.font_style = Some(style.clone());
        }
    }
}

/// What a conditional-formatting rule is allowed to change. Each field is
/// an independent per-property override; a later rule that sets the same
/// property wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

impl StyleOverride {
    pub fn background(color: Color) -> Self {
        Self { background: Some(color), ..Default::default() }
    }

    pub fn foreground(color: Color) -> Self {
        Self { foreground: Some(color), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_only_patched_properties() {
        let mut style = CellStyle {
            color: Some(Color::rgb(10, 10, 10)),
            font_size: Some(9.0),
            ..Default::default()
        };
        style.apply(&StyleOverride::background(Color::rgb(255, 0, 0)));
        assert_eq!(style.background, Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.color, Some(Color::rgb(10, 10, 10)));
        assert_eq!(style.font_size, Some(9.0));
    }

    #[test]
    fn test_later_patch_wins_per_property() {
        let mut style = CellStyle::default();
        style.apply(&StyleOverride::background(Color::rgb(255, 0, 0)));
        style.apply(&StyleOverride::background(Color::rgb(0, 0, 255)));
        assert_eq!(style.background, Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_border_patch_covers_all_edges() {
        let mut style = CellStyle::default();
        style.apply(&StyleOverride {
            border: Some(Border::hairline()),
            ..Default::default()
        });
        let edges = style.borders.unwrap();
        assert!(edges.top.is_some() && edges.bottom.is_some());
        assert!(edges.left.is_some() && edges.right.is_some());
    }
}
