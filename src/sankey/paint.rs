use super::{LayoutLink, NodeCategory};
use serde::Serialize;
use std::fmt;

/// Fallback for categories outside the palette.
pub const NEUTRAL_COLOR: &str = "#9ca3af";
const NEUTRAL_LINK_COLOR: &str = "rgba(156, 163, 175, 0.35)";

/// Horizontal cubic Bézier band from a source node's right edge to a target
/// node's left edge. Stroke it with `width`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkPath {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Shared x of both control points.
    pub mid_x: f64,
    pub width: f64,
}

impl LinkPath {
    pub fn svg_path(&self) -> String {
        self.to_string()
    }
}

/// SVG path data (`d` attribute).
impl fmt::Display for LinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M{},{}C{},{} {},{} {},{}",
            self.x0, self.y0, self.mid_x, self.y0, self.mid_x, self.y1, self.x1, self.y1
        )
    }
}

pub fn generate_path(link: &LayoutLink) -> LinkPath {
    LinkPath {
        x0: link.x0,
        y0: link.y0,
        x1: link.x1,
        y1: link.y1,
        mid_x: (link.x0 + link.x1) / 2.0,
        width: link.width,
    }
}

pub fn node_color(category: NodeCategory) -> &'static str {
    match category {
        NodeCategory::Root => "#475569",
        NodeCategory::FeatureSplitting => "#3b82f6",
        NodeCategory::SemanticDistance => "#10b981",
        NodeCategory::ScoreAgreement => "#f59e0b",
        NodeCategory::Unknown => NEUTRAL_COLOR,
    }
}

/// Links take a translucent version of their source node's color.
pub fn link_color(source_category: NodeCategory) -> &'static str {
    match source_category {
        NodeCategory::Root => "rgba(71, 85, 105, 0.35)",
        NodeCategory::FeatureSplitting => "rgba(59, 130, 246, 0.35)",
        NodeCategory::SemanticDistance => "rgba(16, 185, 129, 0.35)",
        NodeCategory::ScoreAgreement => "rgba(245, 158, 11, 0.35)",
        NodeCategory::Unknown => NEUTRAL_LINK_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_runs_between_node_edges() {
        let link = LayoutLink {
            index: 0,
            source: 0,
            target: 1,
            source_id: "root".into(),
            target_id: "split_true".into(),
            value: 5.0,
            width: 12.0,
            y0: 10.0,
            y1: 40.0,
            x0: 15.0,
            x1: 115.0,
            color: link_color(NodeCategory::Root),
            path: String::new(),
        };
        let path = generate_path(&link);
        assert_eq!(path.mid_x, 65.0);
        assert_eq!(path.width, 12.0);
        assert_eq!(path.svg_path(), "M15,10C65,10 65,40 115,40");
    }

    #[test]
    fn test_palette_with_neutral_fallback() {
        assert_eq!(node_color(NodeCategory::Unknown), NEUTRAL_COLOR);
        assert_ne!(node_color(NodeCategory::Root), NEUTRAL_COLOR);
        assert_ne!(
            link_color(NodeCategory::FeatureSplitting),
            link_color(NodeCategory::SemanticDistance)
        );
    }
}
