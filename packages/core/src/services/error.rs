//! Service Layer Error Types
//!
//! This module defines the errors reported by nested-set operations.
//! Validation failures are raised before any write reaches the store; the
//! overlap check runs on bounds reloaded inside the move transaction and
//! aborts it.

use crate::db::StoreError;
use crate::models::NodeId;
use thiserror::Error;

/// Nested-set operation errors
#[derive(Error, Debug)]
pub enum TreeError {
    /// Operation requires a node that has been saved
    #[error("Node has not been persisted")]
    NotPersisted,

    /// Target lies inside the subtree being moved
    #[error("Impossible move: target {target_id} is inside the subtree of node {node_id}")]
    InvalidMoveTarget { node_id: NodeId, target_id: NodeId },

    /// Position is not one of child, left (before) or right (after)
    #[error("Position should be either child, left or right ('{0}' received)")]
    InvalidPosition(String),

    /// Row no longer exists
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// Variant resolver has no constructor for the discriminator
    #[error("No variant registered for type tag {type_tag:?}")]
    UnknownVariant { type_tag: Option<String> },

    /// Table configuration failed validation
    #[error("Invalid tree configuration: {0}")]
    InvalidConfig(String),

    /// Storage failed; any open transaction has been rolled back
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl TreeError {
    /// Create an invalid move target error
    pub fn invalid_move_target(node_id: NodeId, target_id: NodeId) -> Self {
        Self::InvalidMoveTarget { node_id, target_id }
    }

    /// Create an invalid position error
    pub fn invalid_position(position: impl Into<String>) -> Self {
        Self::InvalidPosition(position.into())
    }

    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create an unknown variant error
    pub fn unknown_variant(type_tag: Option<&str>) -> Self {
        Self::UnknownVariant {
            type_tag: type_tag.map(str::to_string),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
