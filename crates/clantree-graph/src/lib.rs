pub mod edge_router;
pub mod geometry;
pub mod hierarchy;
pub mod hit_tester;
pub mod layout;

pub use edge_router::{EdgeRouter, ElbowPath, RoutedEdge};
pub use geometry::{Rect, Vec2};
pub use hierarchy::{Hierarchy, HierarchyBuilder, HierarchyNode, NodeIndex};
pub use hit_tester::{HitResult, HitTester};
pub use layout::{
    LayoutEdge, Layouter, NodeSpacing, PositionedNode, PositionedTree, Separation,
    TidyTreeLayouter, layout,
};
