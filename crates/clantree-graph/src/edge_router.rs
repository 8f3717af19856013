use crate::geometry::Vec2;
use crate::hierarchy::NodeIndex;
use crate::layout::{LayoutEdge, PositionedTree};
use clantree_core::LayoutDirection;
use serde::Serialize;

/// Three-segment orthogonal connector between a parent and a child.
///
/// The path leaves the source along the depth axis, turns at the depth
/// midpoint, runs along the breadth axis to the target's column (or row),
/// then turns again into the target. All siblings of one parent share the
/// same horizontal bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElbowPath {
    pub start: Vec2,
    pub end: Vec2,
    /// Depth coordinate of the middle segment
    pub mid_depth: f32,
    pub direction: LayoutDirection,
}

impl ElbowPath {
    /// The four polyline vertices: start, both elbows, end.
    pub fn points(&self) -> [Vec2; 4] {
        match self.direction {
            LayoutDirection::Vertical => [
                self.start,
                Vec2::new(self.start.x, self.mid_depth),
                Vec2::new(self.end.x, self.mid_depth),
                self.end,
            ],
            LayoutDirection::Horizontal => [
                self.start,
                Vec2::new(self.mid_depth, self.start.y),
                Vec2::new(self.mid_depth, self.end.y),
                self.end,
            ],
        }
    }

    /// SVG path data using absolute move/line commands.
    pub fn to_svg_path(&self) -> String {
        let (s, e) = (self.start, self.end);
        match self.direction {
            LayoutDirection::Vertical => {
                format!("M{},{} V{} H{} V{}", s.x, s.y, self.mid_depth, e.x, e.y)
            }
            LayoutDirection::Horizontal => {
                format!("M{},{} H{} V{} H{}", s.x, s.y, self.mid_depth, e.y, e.x)
            }
        }
    }

    /// Total length of the three segments.
    pub fn length(&self) -> f32 {
        let p = self.points();
        (p[1] - p[0]).length() + (p[2] - p[1]).length() + (p[3] - p[2]).length()
    }
}

/// A routed edge, ready for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoutedEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub path: ElbowPath,
}

/// Stateless router producing [`ElbowPath`]s from edge endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeRouter {
    pub direction: LayoutDirection,
}

impl EdgeRouter {
    pub fn new(direction: LayoutDirection) -> Self {
        Self { direction }
    }

    pub fn route(&self, source: Vec2, target: Vec2) -> ElbowPath {
        let mid_depth = match self.direction {
            LayoutDirection::Vertical => (source.y + target.y) / 2.0,
            LayoutDirection::Horizontal => (source.x + target.x) / 2.0,
        };
        ElbowPath {
            start: source,
            end: target,
            mid_depth,
            direction: self.direction,
        }
    }

    pub fn route_edge(&self, edge: &LayoutEdge) -> RoutedEdge {
        RoutedEdge {
            source: edge.source,
            target: edge.target,
            path: self.route(edge.source_pos, edge.target_pos),
        }
    }

    /// Route every edge of `tree` using the tree's own direction.
    pub fn route_all(tree: &PositionedTree) -> Vec<RoutedEdge> {
        let router = Self::new(tree.direction());
        tree.edges().iter().map(|e| router.route_edge(e)).collect()
    }
}
