use crate::geometry::{Rect, Vec2};
use crate::layout::PositionedTree;
use clantree_core::MemberId;

/// Result of a hit test at a layout-space position.
#[derive(Debug, Clone, PartialEq)]
pub enum HitResult {
    /// Inside the hit-target of a node.
    Node(MemberId),
    /// Canvas background.
    Background,
}

/// Node hit-targets for one positioned tree.
///
/// Each node owns a card-sized rectangle centered on its layout position.
/// When cards overlap, the node drawn last (later in pre-order) wins, which
/// matches the paint order of the renderer.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    targets: Vec<(MemberId, Rect)>,
    card_size: Vec2,
}

impl HitTester {
    pub fn new(card_size: Vec2) -> Self {
        Self {
            targets: Vec::new(),
            card_size,
        }
    }

    pub fn card_size(&self) -> Vec2 {
        self.card_size
    }

    /// Rebuild the hit-targets after a new layout.
    pub fn update(&mut self, tree: &PositionedTree) {
        self.targets.clear();
        self.targets.extend(tree.descendants().map(|node| {
            (
                node.id().clone(),
                Rect::from_center_size(node.position, self.card_size),
            )
        }));
    }

    pub fn from_tree(tree: &PositionedTree, card_size: Vec2) -> Self {
        let mut tester = Self::new(card_size);
        tester.update(tree);
        tester
    }

    pub fn hit_test(&self, pos: Vec2) -> HitResult {
        self.hit_test_node(pos)
            .map(|id| HitResult::Node(id.clone()))
            .unwrap_or(HitResult::Background)
    }

    pub fn hit_test_node(&self, pos: Vec2) -> Option<&MemberId> {
        self.targets
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(id, _)| id)
    }

    pub fn target(&self, id: &str) -> Option<Rect> {
        self.targets
            .iter()
            .find(|(target, _)| target.as_str() == id)
            .map(|(_, rect)| *rect)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
