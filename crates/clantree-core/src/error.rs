use crate::MemberId;
use thiserror::Error;

/// Structural problems that make a snapshot impossible to stratify.
///
/// All variants reject the snapshot as a whole; callers keep whatever they
/// were showing before.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("multiple root members: {first} and {second} both have no parent")]
    MultipleRoots { first: MemberId, second: MemberId },
    #[error("no root member: every record references a parent")]
    NoRoot,
    #[error("member {id} references missing parent {parent_id}")]
    DanglingParent { id: MemberId, parent_id: MemberId },
    #[error("member {id} does not reach the root; parent links form a cycle")]
    CyclicReference { id: MemberId },
    #[error("duplicate member id {id}")]
    DuplicateId { id: MemberId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    #[error("node {0} not found in the current layout")]
    NodeNotFound(MemberId),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}
