//! TreeStore Traits - Storage Abstraction Layer
//!
//! This module defines the minimal contract the nested-set core needs from
//! a row store. Business logic in [`NestedSet`](crate::services::NestedSet)
//! is written against these traits only, so the same move and query code
//! runs on the in-memory store and on libsql.
//!
//! # Architecture
//!
//! - **TreeExecutor**: Reads and writes usable both inside and outside a
//!   transaction (ordered scans, counts, max aggregate, reload, insert,
//!   conditional bulk update, filtered delete)
//! - **TreeStore**: An executor that can open transactions
//! - **TreeTransaction**: An executor bound to one transaction, finished by
//!   `commit` or `rollback`; dropping it uncommitted discards its writes
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and remote
//!    backends share one interface
//! 2. **Structured filters**: Stores receive [`Predicate`] and [`BulkUpdate`]
//!    values, never SQL text
//! 3. **Isolation is the store's job**: A transaction must keep the rows it
//!    reads stable until it finishes (the in-memory store serializes
//!    transactions, libsql takes the write lock on `BEGIN IMMEDIATE`)
//!
//! # Examples
//!
//! ```rust,no_run
//! use nestedset_core::db::{MemoryTreeStore, TreeExecutor, TreeStore};
//! use nestedset_core::tree::Predicate;
//!
//! # async fn example() -> Result<(), nestedset_core::db::StoreError> {
//! let store = MemoryTreeStore::default();
//! let tx = store.begin().await?;
//! let roots = tx.scan(&Predicate::roots()).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::TreeConfig;
use crate::db::StoreError;
use crate::models::{Node, NodeId};
use crate::tree::{BulkUpdate, Column, Predicate};
use async_trait::async_trait;

/// Row operations shared by stores and transactions
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so futures holding them can move
/// between threads.
#[async_trait]
pub trait TreeExecutor: Send + Sync {
    /// Column mapping of the underlying table
    fn config(&self) -> &TreeConfig;

    /// Rows matching `predicate`, ordered by `left` ascending
    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError>;

    /// First row matching `predicate` in `left` order
    async fn first(&self, predicate: &Predicate) -> Result<Option<Node>, StoreError> {
        Ok(self.scan(predicate).await?.into_iter().next())
    }

    /// Number of rows matching `predicate`
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;

    /// Largest value of `column` across the table, `None` when empty
    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError>;

    /// Current persisted state of one row
    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError>;

    /// Insert a row with assigned bounds; returns it with its new id
    async fn insert(&self, node: &Node) -> Result<Node, StoreError>;

    /// Apply `update` to every row; returns the number of rows changed
    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError>;

    /// Delete rows matching `predicate`; returns the number removed
    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError>;
}

/// A store that can run transactions
#[async_trait]
pub trait TreeStore: TreeExecutor {
    /// Open a transaction
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>, StoreError>;
}

/// Executor bound to one open transaction
#[async_trait]
pub trait TreeTransaction: TreeExecutor {
    /// Make every write of the transaction visible
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write of the transaction
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
