//! MemoryTreeStore - In-Process TreeStore Implementation
//!
//! Keeps the whole table in a `BTreeMap` behind an async mutex. It evaluates
//! [`Predicate`] and [`BulkUpdate`] values directly, which makes it the
//! reference for what the SQL renderer has to produce, and the store used by
//! most service tests.
//!
//! # Transactions
//!
//! `begin()` takes the table lock for the lifetime of the transaction and
//! works on a private copy. `commit()` swaps the copy in; `rollback()` or
//! dropping the transaction discards it. Transactions are therefore fully
//! serialized, and plain reads wait for an open transaction to finish.

use crate::config::TreeConfig;
use crate::db::tree_store::{TreeExecutor, TreeStore, TreeTransaction};
use crate::db::StoreError;
use crate::models::{Node, NodeId};
use crate::tree::{BulkUpdate, Column, Predicate};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Rows of one table plus its id sequence
#[derive(Debug, Clone, Default)]
struct MemoryTable {
    rows: BTreeMap<NodeId, Node>,
    last_id: NodeId,
}

impl MemoryTable {
    fn scan(&self, predicate: &Predicate) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .rows
            .values()
            .filter(|node| predicate.matches(node))
            .cloned()
            .collect();
        nodes.sort_by_key(|node| node.left());
        nodes
    }

    fn count(&self, predicate: &Predicate) -> u64 {
        self.rows.values().filter(|node| predicate.matches(node)).count() as u64
    }

    fn max(&self, column: Column) -> Option<i64> {
        self.rows
            .values()
            .filter_map(|node| column.value_of(node))
            .max()
    }

    fn insert(&mut self, config: &TreeConfig, node: &Node) -> Result<Node, StoreError> {
        if node.bounds.is_none() {
            return Err(StoreError::invalid_row("node has no bounds to insert"));
        }

        self.last_id += 1;
        let mut row = node.clone();
        row.id = Some(self.last_id);
        if !config.is_polymorphic() {
            row.type_tag = None;
        }
        self.rows.insert(self.last_id, row.clone());
        Ok(row)
    }

    fn bulk_update(&mut self, update: &BulkUpdate) -> u64 {
        self.rows
            .values_mut()
            .map(|node| update.apply_to(node))
            .filter(|changed| *changed)
            .count() as u64
    }

    fn delete_where(&mut self, predicate: &Predicate) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|_, node| !predicate.matches(node));
        (before - self.rows.len()) as u64
    }
}

/// In-memory nested-set table
///
/// Cloning the store yields another handle onto the same table.
///
/// # Examples
///
/// ```rust
/// use nestedset_core::config::TreeConfig;
/// use nestedset_core::db::MemoryTreeStore;
///
/// let store = MemoryTreeStore::new(TreeConfig::for_table("categories"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeStore {
    config: TreeConfig,
    table: Arc<Mutex<MemoryTable>>,
}

impl MemoryTreeStore {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            table: Arc::new(Mutex::new(MemoryTable::default())),
        }
    }
}

#[async_trait]
impl TreeExecutor for MemoryTreeStore {
    fn config(&self) -> &TreeConfig {
        &self.config
    }

    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError> {
        Ok(self.table.lock().await.scan(predicate))
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        Ok(self.table.lock().await.count(predicate))
    }

    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError> {
        Ok(self.table.lock().await.max(column))
    }

    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, node: &Node) -> Result<Node, StoreError> {
        self.table.lock().await.insert(&self.config, node)
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError> {
        Ok(self.table.lock().await.bulk_update(update))
    }

    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        Ok(self.table.lock().await.delete_where(predicate))
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>, StoreError> {
        let guard = self.table.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            config: self.config.clone(),
            guard,
            working: Mutex::new(working),
        }))
    }
}

/// Open transaction on a [`MemoryTreeStore`]
struct MemoryTransaction {
    config: TreeConfig,
    guard: OwnedMutexGuard<MemoryTable>,
    working: Mutex<MemoryTable>,
}

#[async_trait]
impl TreeExecutor for MemoryTransaction {
    fn config(&self) -> &TreeConfig {
        &self.config
    }

    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError> {
        Ok(self.working.lock().await.scan(predicate))
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        Ok(self.working.lock().await.count(predicate))
    }

    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError> {
        Ok(self.working.lock().await.max(column))
    }

    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.working.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, node: &Node) -> Result<Node, StoreError> {
        self.working.lock().await.insert(&self.config, node)
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError> {
        Ok(self.working.lock().await.bulk_update(update))
    }

    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        Ok(self.working.lock().await.delete_where(predicate))
    }
}

#[async_trait]
impl TreeTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working.into_inner();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
