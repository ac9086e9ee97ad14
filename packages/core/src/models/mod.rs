//! Data Models
//!
//! This module contains the row model shared by every layer:
//!
//! - `Node` - One row of the nested-set table
//! - `Bounds` - The `left`/`right` interval of a persisted node
//! - `NodeScope` - Persisted coordinates used to build structural queries
//! - `DeleteResult` - Outcome of a subtree deletion

mod node;

pub use node::{Bounds, DeleteResult, Node, NodeId, NodeScope};
