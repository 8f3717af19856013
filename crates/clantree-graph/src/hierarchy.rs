use clantree_core::{HierarchyError, MemberId, MemberRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::ops::Index;

/// Position of a node inside a [`Hierarchy`] arena.
///
/// Indices follow the order of the input records, so they are stable for a
/// given snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub record: MemberRecord,
    pub parent: Option<NodeIndex>,
    /// Children in input order
    pub children: Vec<NodeIndex>,
    /// Generation distance from the root (root = 0)
    pub depth: usize,
}

impl HierarchyNode {
    pub fn id(&self) -> &MemberId {
        &self.record.id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A validated, single-rooted tree built from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    root: Option<NodeIndex>,
    index: HashMap<MemberId, NodeIndex>,
}

impl Hierarchy {
    /// `None` only for an empty snapshot.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&HierarchyNode> {
        self.nodes.get(index.0)
    }

    pub fn get(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    /// All nodes in pre-order (parent before children, children in input order).
    pub fn descendants(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        order
    }

    /// Walk from `index` up to the root, starting with `index` itself.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(index), move |current| {
            self.nodes.get(current.0).and_then(|node| node.parent)
        })
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

impl Index<NodeIndex> for Hierarchy {
    type Output = HierarchyNode;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

/// Stratifies a flat list of parent-pointer records into a [`Hierarchy`].
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    /// Validate `records` and build the tree.
    ///
    /// Checks run in a fixed order: duplicate ids, multiple roots, dangling
    /// parents (a self reference counts as dangling), and finally parent
    /// chains that never reach the root. Without a root, a snapshot whose
    /// parents all resolve can only loop, so it is reported as a cycle.
    pub fn build(records: &[MemberRecord]) -> Result<Hierarchy, HierarchyError> {
        let n = records.len();
        let mut index: HashMap<MemberId, NodeIndex> = HashMap::with_capacity(n);
        for (i, record) in records.iter().enumerate() {
            match index.entry(record.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(HierarchyError::DuplicateId {
                        id: record.id.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(NodeIndex(i));
                }
            }
        }

        let mut root: Option<usize> = None;
        for (i, record) in records.iter().enumerate() {
            if !record.is_root() {
                continue;
            }
            if let Some(first) = root {
                return Err(HierarchyError::MultipleRoots {
                    first: records[first].id.clone(),
                    second: record.id.clone(),
                });
            }
            root = Some(i);
        }

        let mut parent_of: Vec<Option<usize>> = Vec::with_capacity(n);
        for record in records {
            let Some(parent_id) = &record.parent_id else {
                parent_of.push(None);
                continue;
            };
            match index.get(parent_id) {
                Some(&parent) if *parent_id != record.id => parent_of.push(Some(parent.0)),
                _ => {
                    return Err(HierarchyError::DanglingParent {
                        id: record.id.clone(),
                        parent_id: parent_id.clone(),
                    });
                }
            }
        }

        let Some(root) = root else {
            if n == 0 {
                return Ok(Hierarchy::default());
            }
            // Every parent resolved and nobody is parentless: the links loop.
            return Err(match Self::first_on_cycle(&parent_of) {
                Some(i) => HierarchyError::CyclicReference {
                    id: records[i].id.clone(),
                },
                None => HierarchyError::NoRoot,
            });
        };

        Self::check_reachability(records, &parent_of, root)?;

        let mut nodes: Vec<HierarchyNode> = records
            .iter()
            .zip(&parent_of)
            .map(|(record, parent)| HierarchyNode {
                record: record.clone(),
                parent: parent.map(NodeIndex),
                children: Vec::new(),
                depth: 0,
            })
            .collect();
        for (child, parent) in parent_of.iter().enumerate() {
            if let Some(parent) = parent {
                nodes[*parent].children.push(NodeIndex(child));
            }
        }

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let depth = nodes[current].depth + 1;
            for i in 0..nodes[current].children.len() {
                let child = nodes[current].children[i].0;
                nodes[child].depth = depth;
                stack.push(child);
            }
        }

        let hierarchy = Hierarchy {
            nodes,
            root: Some(NodeIndex(root)),
            index,
        };
        tracing::debug!(
            "Built hierarchy: {} members, {} generations deep",
            hierarchy.len(),
            hierarchy.max_depth() + 1
        );
        Ok(hierarchy)
    }

    /// Lowest input index whose parent chain leads back to itself.
    fn first_on_cycle(parent_of: &[Option<usize>]) -> Option<usize> {
        let n = parent_of.len();
        (0..n).find(|&start| {
            let mut current = start;
            for _ in 0..n {
                match parent_of[current] {
                    Some(parent) if parent == start => return true,
                    Some(parent) => current = parent,
                    None => return false,
                }
            }
            false
        })
    }

    /// Every node must reach `root` within `records.len()` parent hops.
    fn check_reachability(
        records: &[MemberRecord],
        parent_of: &[Option<usize>],
        root: usize,
    ) -> Result<(), HierarchyError> {
        let n = records.len();
        let mut reaches_root = vec![false; n];
        reaches_root[root] = true;

        let mut trail = Vec::new();
        for start in 0..n {
            trail.clear();
            let mut current = start;
            let mut hops = 0;
            while !reaches_root[current] {
                let parent = match parent_of[current] {
                    Some(parent) if hops < n => parent,
                    _ => {
                        return Err(HierarchyError::CyclicReference {
                            id: records[start].id.clone(),
                        });
                    }
                };
                trail.push(current);
                current = parent;
                hops += 1;
            }
            for &visited in &trail {
                reaches_root[visited] = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(id: &str, parent: &str) -> MemberRecord {
        let record = MemberRecord::new(id, id);
        if parent.is_empty() {
            record
        } else {
            record.with_parent(parent)
        }
    }

    #[test]
    fn test_build_simple_family() {
        let records = vec![rec("A", ""), rec("B", "A"), rec("C", "A"), rec("D", "B")];

        let tree = HierarchyBuilder::build(&records).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(tree[root].id().as_str(), "A");
        assert_eq!(tree[root].children, vec![NodeIndex(1), NodeIndex(2)]);
        assert_eq!(tree[NodeIndex(3)].parent, Some(NodeIndex(1)));
        assert_eq!(tree[NodeIndex(3)].depth, 2);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.get("C"), Some(NodeIndex(2)));
    }

    #[test]
    fn test_children_keep_input_order_when_root_is_not_first() {
        let records = vec![rec("C", "A"), rec("A", ""), rec("B", "A")];

        let tree = HierarchyBuilder::build(&records).unwrap();

        assert_eq!(tree.root(), Some(NodeIndex(1)));
        let ids: Vec<&str> = tree[NodeIndex(1)]
            .children
            .iter()
            .map(|&c| tree[c].id().as_str())
            .collect();
        assert_eq!(ids, vec!["C", "B"]);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let records = vec![rec("A", ""), rec("B", "A"), rec("C", "A"), rec("D", "B")];
        let tree = HierarchyBuilder::build(&records).unwrap();

        let ids: Vec<&str> = tree
            .descendants()
            .into_iter()
            .map(|i| tree[i].id().as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let records = vec![rec("A", ""), rec("B", "A"), rec("D", "B")];
        let tree = HierarchyBuilder::build(&records).unwrap();

        let path: Vec<NodeIndex> = tree.ancestors(NodeIndex(2)).collect();
        assert_eq!(path, vec![NodeIndex(2), NodeIndex(1), NodeIndex(0)]);
    }

    #[test]
    fn test_empty_snapshot_builds_empty_tree() {
        let tree = HierarchyBuilder::build(&[]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert!(tree.descendants().is_empty());
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let err = HierarchyBuilder::build(&[rec("A", ""), rec("B", "")]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::MultipleRoots {
                first: MemberId::from("A"),
                second: MemberId::from("B"),
            }
        );
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let err = HierarchyBuilder::build(&[rec("A", "Z")]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::DanglingParent {
                id: MemberId::from("A"),
                parent_id: MemberId::from("Z"),
            }
        );
    }

    #[test]
    fn test_self_parent_is_dangling() {
        let err = HierarchyBuilder::build(&[rec("R", ""), rec("A", "A")]).unwrap_err();
        assert!(matches!(err, HierarchyError::DanglingParent { .. }));
    }

    #[test]
    fn test_mutual_parents_without_root_are_cyclic() {
        let err = HierarchyBuilder::build(&[rec("A", "B"), rec("B", "A")]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::CyclicReference {
                id: MemberId::from("A"),
            }
        );
    }

    #[test]
    fn test_rootless_cycle_reports_first_member_on_loop() {
        // C hangs off the loop but is not part of it.
        let records = vec![rec("C", "A"), rec("A", "B"), rec("B", "A")];
        let err = HierarchyBuilder::build(&records).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::CyclicReference {
                id: MemberId::from("A"),
            }
        );
    }

    #[test]
    fn test_mutual_parent_cycle_beside_root_rejected() {
        let records = vec![rec("R", ""), rec("A", "B"), rec("B", "A")];
        let err = HierarchyBuilder::build(&records).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::CyclicReference {
                id: MemberId::from("A"),
            }
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = HierarchyBuilder::build(&[rec("A", ""), rec("A", "A")]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::DuplicateId {
                id: MemberId::from("A"),
            }
        );
    }

    #[test]
    fn test_build_does_not_mutate_input() {
        let records = vec![rec("A", ""), rec("B", "A")];
        let before = records.clone();
        let _ = HierarchyBuilder::build(&records).unwrap();
        assert_eq!(records, before);
    }

    /// Random valid forests: record `i` (i > 0) points at a parent in `0..i`.
    fn tree_records() -> impl Strategy<Value = Vec<MemberRecord>> {
        proptest::collection::vec(any::<prop::sample::Index>(), 0..60).prop_map(|picks| {
            let mut records = vec![rec("n0", "")];
            for (i, pick) in picks.iter().enumerate() {
                let parent = pick.index(i + 1);
                records.push(rec(&format!("n{}", i + 1), &format!("n{parent}")));
            }
            records
        })
    }

    proptest! {
        /// **Property: Uniqueness of root**
        ///
        /// Every valid snapshot yields exactly one parentless node.
        #[test]
        fn prop_single_root(records in tree_records()) {
            let tree = HierarchyBuilder::build(&records).unwrap();
            let parentless = tree.nodes().iter().filter(|n| n.parent.is_none()).count();
            prop_assert_eq!(parentless, 1);
        }

        /// **Property: Reachability**
        ///
        /// Following parent links from any node reaches the root in at most
        /// `records.len()` hops, and depth equals the hop count.
        #[test]
        fn prop_every_node_reaches_root(records in tree_records()) {
            let tree = HierarchyBuilder::build(&records).unwrap();
            let root = tree.root().unwrap();
            for i in 0..tree.len() {
                let path: Vec<NodeIndex> = tree.ancestors(NodeIndex(i)).collect();
                prop_assert!(path.len() <= records.len());
                prop_assert_eq!(*path.last().unwrap(), root);
                prop_assert_eq!(path.len() - 1, tree[NodeIndex(i)].depth);
            }
        }
    }
}
