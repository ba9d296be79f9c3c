use brass_types::Color;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
    None,
}

/// A single border edge: width in points, line style and color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    pub width: f32,
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default)]
    pub color: Color,
}

impl Eq for Border {}

impl Hash for Border {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.style.hash(state);
        self.color.hash(state);
    }
}

impl Border {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, style: BorderStyle::Solid, color }
    }

    pub fn hairline() -> Self {
        Self::new(0.5, Color::default())
    }
}

/// Per-edge borders for one cell. Unset edges inherit nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct BorderEdges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Border>,
}

impl BorderEdges {
    /// The same border on all four edges.
    pub fn all(border: Border) -> Self {
        Self {
            top: Some(border.clone()),
            right: Some(border.clone()),
            bottom: Some(border.clone()),
            left: Some(border),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_edges() {
        let edges = BorderEdges::all(Border::hairline());
        assert!(!edges.is_empty());
        assert_eq!(edges.top, edges.bottom);
        assert_eq!(edges.left, edges.right);
    }

    #[test]
    fn test_deserialize_border() {
        let b: Border = serde_json::from_str(r#"{"width":1.0,"color":"red"}"#).unwrap();
        assert_eq!(b.style, BorderStyle::Solid);
        assert_eq!(b.color, brass_types::Color::rgb(255, 0, 0));
    }
}
