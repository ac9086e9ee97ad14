//! NestedSet Core
//!
//! This crate maintains forests of hierarchical records inside one flat table
//! using the nested-set (interval) encoding. Every node carries a
//! `left`/`right` pair; containment of intervals encodes ancestry, so any
//! subtree, ancestor chain or sibling group is a single range predicate.
//!
//! # Architecture
//!
//! - **Interval encoding**: numbering `1..=2N` without gaps, nested like the tree
//! - **One bulk update per move**: the whole subtree and the compensating
//!   zone are renumbered by a single conditional statement
//! - **Transactions everywhere**: create, move and delete reload bounds
//!   inside a transaction and roll back on any failure
//! - **libsql**: Embedded SQLite-compatible storage, with an in-memory store
//!   for tests
//!
//! # Modules
//!
//! - [`config`] - Table and column mapping
//! - [`models`] - Node rows and intervals
//! - [`tree`] - Predicates, move arithmetic, bulk updates, integrity checks
//! - [`db`] - Storage traits with in-memory and libsql implementations
//! - [`services`] - The `NestedSet` facade and variant resolution

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use config::TreeConfig;
pub use models::*;
pub use services::*;
pub use tree::MovePosition;
