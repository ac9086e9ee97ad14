//! Node Data Structures
//!
//! This module defines the `Node` row model of a nested-set forest together
//! with the interval type that encodes its position.
//!
//! # Architecture
//!
//! - **Flat table**: Every node of every tree lives in one table
//! - **Interval encoding**: `left`/`right` bounds nest exactly like the tree
//! - **Parent pointer**: `parent_id` is kept alongside the bounds so direct
//!   children and siblings are equality lookups
//! - **Store-assigned identity**: A node has no id and no bounds until it
//!   has been created through the store
//!
//! # Examples
//!
//! ```rust
//! use nestedset_core::models::{Bounds, Node};
//!
//! let draft = Node::new();
//! assert!(!draft.is_persisted());
//! assert!(draft.scope().is_none());
//!
//! let saved = Node::from_row(7, None, Bounds::new(1, 4), None);
//! assert!(saved.is_persisted());
//! assert_eq!(saved.children_count(), Some(1));
//! ```

use serde::{Deserialize, Serialize};

/// Store-assigned node identifier
pub type NodeId = i64;

/// Closed integer interval `[left, right]` of a persisted node
///
/// For a valid node `left < right`, and the width `right - left + 1` is
/// always even because each node contributes two numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i64,
    pub right: i64,
}

impl Bounds {
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    /// Width of the interval, `right - left + 1`
    pub fn extent(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Whether `value` falls inside the closed interval
    pub fn covers(&self, value: i64) -> bool {
        self.left <= value && value <= self.right
    }

    /// Whether `other` sits strictly inside this interval
    pub fn strictly_contains(&self, other: &Bounds) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// Whether either endpoint of `other` falls inside this interval
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.covers(other.left) || self.covers(other.right)
    }

    /// Number of nodes strictly inside the interval
    pub fn inner_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }
}

/// One row of the nested-set table
///
/// # Fields
///
/// - `id`: Store-assigned identifier (`None` until created)
/// - `parent_id`: Parent node id, `None` for roots
/// - `bounds`: Interval, `None` until created
/// - `type_tag`: Discriminator copied to the store when the table is polymorphic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: Option<NodeId>,
    pub parent_id: Option<NodeId>,
    pub bounds: Option<Bounds>,
    pub type_tag: Option<String>,
}

impl Node {
    /// A new, unsaved node
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, unsaved node carrying a variant discriminator
    pub fn with_type(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: Some(type_tag.into()),
            ..Self::default()
        }
    }

    /// Build a node from persisted column values
    pub fn from_row(
        id: NodeId,
        parent_id: Option<NodeId>,
        bounds: Bounds,
        type_tag: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            parent_id,
            bounds: Some(bounds),
            type_tag,
        }
    }

    /// Whether the node has an id and assigned bounds
    pub fn is_persisted(&self) -> bool {
        self.id.is_some() && self.bounds.is_some()
    }

    /// Whether the node is a root of the forest
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn left(&self) -> Option<i64> {
        self.bounds.map(|b| b.left)
    }

    pub fn right(&self) -> Option<i64> {
        self.bounds.map(|b| b.right)
    }

    /// Number of nodes inside this node's interval, `(right - left - 1) / 2`
    ///
    /// `None` for unsaved nodes.
    pub fn children_count(&self) -> Option<u64> {
        self.bounds.map(|b| b.inner_count().max(0) as u64)
    }

    /// Persisted view of the node, used to build structural predicates
    ///
    /// Returns `None` for nodes that have never been saved, so no structural
    /// query can be issued for them.
    pub fn scope(&self) -> Option<NodeScope> {
        match (self.id, self.bounds) {
            (Some(id), Some(bounds)) => Some(NodeScope {
                id,
                parent_id: self.parent_id,
                bounds,
            }),
            _ => None,
        }
    }
}

/// The persisted coordinates of a node: id, parent and interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeScope {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub bounds: Bounds,
}

/// Result of a subtree deletion
///
/// # Examples
///
/// ```rust
/// # use nestedset_core::models::DeleteResult;
/// let result = DeleteResult::deleted(3);
/// assert!(result.existed);
///
/// // Row was already gone (idempotent success)
/// let result = DeleteResult::not_found();
/// assert_eq!(result.deleted_count, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    /// Whether the node still existed when the delete ran
    pub existed: bool,
    /// Rows removed, the node plus all of its descendants
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn deleted(deleted_count: u64) -> Self {
        Self {
            existed: true,
            deleted_count,
        }
    }

    pub fn not_found() -> Self {
        Self {
            existed: false,
            deleted_count: 0,
        }
    }
}
