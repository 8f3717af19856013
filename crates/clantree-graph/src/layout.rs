use crate::geometry::{Rect, Vec2};
use crate::hierarchy::{Hierarchy, NodeIndex};
use clantree_core::{LayoutDirection, MemberId, MemberRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance between neighbouring siblings (`width`) and between generations
/// (`height`) in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSpacing {
    pub width: f32,
    pub height: f32,
}

impl NodeSpacing {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for NodeSpacing {
    fn default() -> Self {
        Self {
            width: 250.0,
            height: 320.0,
        }
    }
}

/// Gap multipliers applied to `NodeSpacing::width`.
///
/// `siblings` is used between nodes sharing a parent, `cousins` between
/// adjacent nodes of the same generation with different parents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    pub siblings: f32,
    pub cousins: f32,
}

impl Default for Separation {
    fn default() -> Self {
        Self {
            siblings: 1.0,
            cousins: 2.0,
        }
    }
}

impl Separation {
    /// Gaps below one slot would let neighbours overlap.
    pub fn sanitized(self) -> Self {
        Self {
            siblings: self.siblings.max(1.0),
            cousins: self.cousins.max(1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionedNode {
    pub index: NodeIndex,
    pub parent: Option<NodeIndex>,
    pub depth: usize,
    pub position: Vec2,
    pub record: MemberRecord,
}

impl PositionedNode {
    pub fn id(&self) -> &MemberId {
        &self.record.id
    }
}

/// Parent to child connection between two positioned nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub source_pos: Vec2,
    pub target_pos: Vec2,
}

/// Output of a layout pass for one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionedTree {
    nodes: Vec<PositionedNode>,
    edges: Vec<LayoutEdge>,
    root: Option<NodeIndex>,
    direction: LayoutDirection,
    #[serde(skip)]
    order: Vec<NodeIndex>,
    #[serde(skip)]
    index: HashMap<MemberId, NodeIndex>,
}

impl PositionedTree {
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes indexed by `NodeIndex`.
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&PositionedNode> {
        self.nodes.get(index.0)
    }

    /// One edge per non-root node, in pre-order of the target.
    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn get(&self, id: &str) -> Option<&PositionedNode> {
        self.index.get(id).map(|&index| &self.nodes[index.0])
    }

    /// Nodes in pre-order (root first, children in input order).
    pub fn descendants(&self) -> impl Iterator<Item = &PositionedNode> + '_ {
        self.order.iter().map(|&index| &self.nodes[index.0])
    }

    /// Tight bounds of all node positions, `None` for an empty tree.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.nodes.first()?.position;
        Some(
            self.nodes
                .iter()
                .fold(Rect::from_min_max(first, first), |rect, node| {
                    rect.include(node.position)
                }),
        )
    }
}

pub trait Layouter {
    fn execute(&self, hierarchy: &Hierarchy) -> PositionedTree;
}

/// Tidy tree layout in the Reingold-Tilford family.
///
/// Uses Walker's linear-time formulation: a post-order pass computes
/// preliminary breadth positions and modifiers, pushing colliding subtrees
/// apart along their contours (threads) and spreading each shift over the
/// siblings in between; a pre-order pass accumulates the modifiers into final
/// positions. The root ends up at breadth 0 and every parent sits over the
/// midpoint of its first and last child.
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyTreeLayouter {
    pub spacing: NodeSpacing,
    pub separation: Separation,
    pub direction: LayoutDirection,
}

impl TidyTreeLayouter {
    pub fn new(spacing: NodeSpacing) -> Self {
        Self {
            spacing,
            ..Default::default()
        }
    }

    pub fn with_separation(mut self, separation: Separation) -> Self {
        self.separation = separation;
        self
    }

    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    fn place(&self, depth: usize, breadth: f32) -> Vec2 {
        let breadth = breadth * self.spacing.width;
        let depth = depth as f32 * self.spacing.height;
        match self.direction {
            LayoutDirection::Vertical => Vec2::new(breadth, depth),
            LayoutDirection::Horizontal => Vec2::new(depth, breadth),
        }
    }
}

impl Layouter for TidyTreeLayouter {
    fn execute(&self, hierarchy: &Hierarchy) -> PositionedTree {
        let Some(root) = hierarchy.root() else {
            return PositionedTree {
                direction: self.direction,
                ..Default::default()
            };
        };

        let breadth = Walker::run(hierarchy, root, self.separation.sanitized());
        let order = hierarchy.descendants();

        let nodes: Vec<PositionedNode> = hierarchy
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| PositionedNode {
                index: NodeIndex(i),
                parent: node.parent,
                depth: node.depth,
                position: self.place(node.depth, breadth[i]),
                record: node.record.clone(),
            })
            .collect();

        let edges = order
            .iter()
            .filter_map(|&target| {
                let parent = nodes[target.0].parent?;
                Some(LayoutEdge {
                    source: parent,
                    target,
                    source_pos: nodes[parent.0].position,
                    target_pos: nodes[target.0].position,
                })
            })
            .collect();

        let index = nodes
            .iter()
            .map(|node| (node.record.id.clone(), node.index))
            .collect();

        tracing::debug!(
            "Laid out {} nodes with spacing {}x{}",
            nodes.len(),
            self.spacing.width,
            self.spacing.height
        );

        PositionedTree {
            nodes,
            edges,
            root: Some(root),
            direction: self.direction,
            order,
            index,
        }
    }
}

/// Lay out `hierarchy` top to bottom with default separation.
pub fn layout(hierarchy: &Hierarchy, spacing: NodeSpacing) -> PositionedTree {
    TidyTreeLayouter::new(spacing).execute(hierarchy)
}

/// Working state of the two walks, stored per node in flat arrays.
///
/// Slot `n` (one past the last real node) is a virtual parent of the root so
/// the root can be treated like any other node.
struct Walker<'k> {
    kids: &'k [Vec<usize>],
    parent: Vec<usize>,
    /// Position among siblings
    number: Vec<usize>,
    separation: Separation,
    prelim: Vec<f32>,
    modifier: Vec<f32>,
    change: Vec<f32>,
    shift: Vec<f32>,
    thread: Vec<Option<usize>>,
    ancestor: Vec<usize>,
    default_ancestor: Vec<Option<usize>>,
}

impl<'k> Walker<'k> {
    fn run(hierarchy: &Hierarchy, root: NodeIndex, separation: Separation) -> Vec<f32> {
        let n = hierarchy.len();
        let virtual_root = n;

        let mut kids: Vec<Vec<usize>> = hierarchy
            .nodes()
            .iter()
            .map(|node| node.children.iter().map(|c| c.0).collect())
            .collect();
        kids.push(vec![root.0]);

        let mut parent = vec![virtual_root; n + 1];
        let mut number = vec![0; n + 1];
        for (p, children) in kids.iter().enumerate() {
            for (i, &child) in children.iter().enumerate() {
                parent[child] = p;
                number[child] = i;
            }
        }

        let mut walker = Walker {
            kids: &kids,
            parent,
            number,
            separation,
            prelim: vec![0.0; n + 1],
            modifier: vec![0.0; n + 1],
            change: vec![0.0; n + 1],
            shift: vec![0.0; n + 1],
            thread: vec![None; n + 1],
            ancestor: (0..=n).collect(),
            default_ancestor: vec![None; n + 1],
        };

        let pre_order: Vec<usize> = hierarchy.descendants().into_iter().map(|i| i.0).collect();
        for &v in &Self::post_order(&kids, root.0) {
            walker.first_walk(v);
        }

        walker.modifier[virtual_root] = -walker.prelim[root.0];
        let mut breadth = vec![0.0; n];
        for &v in &pre_order {
            let p = walker.parent[v];
            breadth[v] = walker.prelim[v] + walker.modifier[p];
            walker.modifier[v] += walker.modifier[p];
        }
        breadth
    }

    /// Children left to right, then the node itself.
    fn post_order(kids: &[Vec<usize>], root: usize) -> Vec<usize> {
        let mut order = Vec::with_capacity(kids.len());
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            order.push(v);
            stack.extend(kids[v].iter().copied());
        }
        order.reverse();
        order
    }

    fn gap(&self, a: usize, b: usize) -> f32 {
        if self.parent[a] == self.parent[b] {
            self.separation.siblings
        } else {
            self.separation.cousins
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.kids[v].first().copied().or(self.thread[v])
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.kids[v].last().copied().or(self.thread[v])
    }

    fn first_walk(&mut self, v: usize) {
        let kids = self.kids;
        let p = self.parent[v];
        let siblings = &kids[p];
        let left_sibling = match self.number[v] {
            0 => None,
            i => Some(siblings[i - 1]),
        };

        if let (Some(&first), Some(&last)) = (kids[v].first(), kids[v].last()) {
            self.execute_shifts(v);
            let midpoint = (self.prelim[first] + self.prelim[last]) / 2.0;
            match left_sibling {
                Some(w) => {
                    self.prelim[v] = self.prelim[w] + self.gap(v, w);
                    self.modifier[v] = self.prelim[v] - midpoint;
                }
                None => self.prelim[v] = midpoint,
            }
        } else if let Some(w) = left_sibling {
            self.prelim[v] = self.prelim[w] + self.gap(v, w);
        }

        let default_ancestor = self.default_ancestor[p].unwrap_or(siblings[0]);
        self.default_ancestor[p] = Some(self.apportion(v, left_sibling, default_ancestor));
    }

    /// Push the subtree of `v` right until its left contour clears the right
    /// contour of everything to its left.
    fn apportion(&mut self, v: usize, left_sibling: Option<usize>, ancestor: usize) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };
        let mut ancestor = ancestor;

        // i = inside, o = outside, p = right subtree (v), m = left subtrees
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.kids[self.parent[v]][0];
        let mut sip = self.modifier[vip];
        let mut sop = self.modifier[vop];
        let mut sim = self.modifier[vim];
        let mut som = self.modifier[vom];

        let mut next_vim = self.next_right(vim);
        let mut next_vip = self.next_left(vip);
        while let (Some(nim), Some(nip)) = (next_vim, next_vip) {
            vim = nim;
            vip = nip;
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.ancestor[vop] = v;

            let shift =
                self.prelim[vim] + sim - self.prelim[vip] - sip + self.gap(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }

            sim += self.modifier[vim];
            sip += self.modifier[vip];
            som += self.modifier[vom];
            sop += self.modifier[vop];

            next_vim = self.next_right(vim);
            next_vip = self.next_left(vip);
        }

        if let Some(nim) = next_vim {
            if self.next_right(vop).is_none() {
                self.thread[vop] = Some(nim);
                self.modifier[vop] += sim - sop;
            }
        }
        if let Some(nip) = next_vip {
            if self.next_left(vom).is_none() {
                self.thread[vom] = Some(nip);
                self.modifier[vom] += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.ancestor[vim];
        if self.parent[candidate] == self.parent[v] {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f32) {
        let subtrees = (self.number[wp] - self.number[wm]) as f32;
        let change = shift / subtrees;
        self.change[wp] -= change;
        self.shift[wp] += shift;
        self.change[wm] += change;
        self.prelim[wp] += shift;
        self.modifier[wp] += shift;
    }

    /// Apply the shifts recorded by `move_subtree` to the children of `v`.
    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for &w in self.kids[v].iter().rev() {
            self.prelim[w] += shift;
            self.modifier[w] += shift;
            change += self.change[w];
            shift += self.shift[w] + change;
        }
    }
}
