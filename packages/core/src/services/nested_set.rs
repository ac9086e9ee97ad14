//! NestedSet - Forest Operations over a TreeStore
//!
//! This module provides the business logic layer for one nested-set table:
//!
//! - Lifecycle (create as a new root, delete a subtree and close the gap)
//! - Moves (child, left and right of a target) applied as one bulk update
//! - Structural queries (roots, ancestors, siblings, descendants, level)
//! - Integrity checking over the whole forest
//!
//! # Transactions
//!
//! Every mutation runs inside one [`TreeTransaction`]. Bounds are always
//! reloaded after the transaction begins, so the arithmetic never works on
//! values cached in a caller's [`Node`]. Any error rolls the transaction
//! back; a failed move leaves the table exactly as it was.
//!
//! # Unsaved Nodes
//!
//! Structural queries on a node that was never created return empty
//! results without touching the store. Mutations on such a node fail with
//! [`TreeError::NotPersisted`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use nestedset_core::db::MemoryTreeStore;
//! use nestedset_core::models::Node;
//! use nestedset_core::services::NestedSet;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), nestedset_core::services::TreeError> {
//! let tree = NestedSet::new(Arc::new(MemoryTreeStore::default()));
//!
//! let mut fruit = tree.create(Node::new()).await?;
//! let mut apple = tree.create(Node::new()).await?;
//! tree.move_to_child_of(&mut apple, &mut fruit).await?;
//!
//! assert_eq!(tree.level(&apple).await?, Some(1));
//! assert_eq!(tree.children(&fruit).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::TreeConfig;
use crate::db::{TreeExecutor, TreeStore, TreeTransaction};
use crate::models::{Bounds, DeleteResult, Node, NodeId, NodeScope};
use crate::services::TreeError;
use crate::tree::{
    check_forest, plan_move, BulkUpdate, Column, IntegrityViolation, MovePosition, Predicate,
};
use std::sync::Arc;

/// Accessor for one nested-set table
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct NestedSet {
    store: Arc<dyn TreeStore>,
}

impl std::fmt::Debug for NestedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedSet")
            .field("config", self.config())
            .finish()
    }
}

impl NestedSet {
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Column mapping of the table this accessor is bound to
    pub fn config(&self) -> &TreeConfig {
        self.store.config()
    }

    // ========================================================================
    // Forest-level queries
    // ========================================================================

    /// First root of the forest in traversal order
    pub async fn root(&self) -> Result<Option<Node>, TreeError> {
        Ok(self.store.first(&Predicate::roots()).await?)
    }

    /// All roots, ordered by left
    pub async fn roots(&self) -> Result<Vec<Node>, TreeError> {
        Ok(self.store.scan(&Predicate::roots()).await?)
    }

    /// Every node of the forest in pre-order
    pub async fn all(&self) -> Result<Vec<Node>, TreeError> {
        Ok(self.store.scan(&Predicate::All).await?)
    }

    /// Invariant violations of the stored forest, empty when it is sound
    pub async fn check_integrity(&self) -> Result<Vec<IntegrityViolation>, TreeError> {
        let nodes = self.all().await?;
        Ok(check_forest(&nodes))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Persist `node` as a new root appended to the right of the forest
    ///
    /// Reading the current maximum and inserting happen in one transaction,
    /// so two concurrent creations can never receive the same bounds.
    pub async fn create(&self, node: Node) -> Result<Node, TreeError> {
        let tx = self.store.begin().await?;
        let result = Self::create_in(tx.as_ref(), node).await;
        let created = finish(tx, result).await?;

        tracing::info!(
            "Created node {:?} at {:?} in '{}'",
            created.id,
            created.bounds,
            self.config().table
        );
        Ok(created)
    }

    async fn create_in(tx: &dyn TreeTransaction, node: Node) -> Result<Node, TreeError> {
        let max_right = tx.max(Column::Right).await?.unwrap_or(0);

        let row = Node {
            id: None,
            parent_id: None,
            bounds: Some(Bounds::new(max_right + 1, max_right + 2)),
            type_tag: if tx.config().is_polymorphic() {
                node.type_tag
            } else {
                None
            },
        };

        Ok(tx.insert(&row).await?)
    }

    /// Current persisted state of `node`
    ///
    /// Only the id is needed, so a handle built from a bare id can be
    /// turned into a full row here.
    pub async fn reload(&self, node: &Node) -> Result<Node, TreeError> {
        let id = node.id.ok_or(TreeError::NotPersisted)?;
        fetch_existing(self.store.as_ref(), id).await
    }

    /// Delete `node` with its whole subtree and close the numbering gap
    ///
    /// Children are removed, never re-parented. Deleting a row that is
    /// already gone succeeds with [`DeleteResult::not_found`]. Only the id is
    /// read; bounds are looked up inside the transaction.
    pub async fn delete(&self, node: &Node) -> Result<DeleteResult, TreeError> {
        let id = node.id.ok_or(TreeError::NotPersisted)?;

        let tx = self.store.begin().await?;
        let result = Self::delete_in(tx.as_ref(), id).await;
        let outcome = finish(tx, result).await?;

        if outcome.existed {
            tracing::info!(
                "Deleted node {} and {} descendant(s)",
                id,
                outcome.deleted_count.saturating_sub(1)
            );
        } else {
            tracing::debug!("Node {} already deleted", id);
        }
        Ok(outcome)
    }

    async fn delete_in(tx: &dyn TreeTransaction, id: NodeId) -> Result<DeleteResult, TreeError> {
        let Some(scope) = tx.fetch(id).await?.and_then(|row| row.scope()) else {
            return Ok(DeleteResult::not_found());
        };

        let deleted = tx.delete_where(&scope.self_and_descendants()).await?;
        tx.bulk_update(&BulkUpdate::close_gap(scope.bounds)).await?;

        Ok(DeleteResult::deleted(deleted))
    }

    // ========================================================================
    // Moves
    // ========================================================================

    /// Move `node` with its subtree to `position` relative to `target`
    ///
    /// Both nodes need an id and bounds; the bounds themselves are reloaded
    /// inside the transaction. On success both arguments hold their
    /// post-move state. On failure nothing was written and both arguments
    /// are left untouched.
    pub async fn move_to(
        &self,
        node: &mut Node,
        target: &mut Node,
        position: MovePosition,
    ) -> Result<(), TreeError> {
        let node_id = node.scope().ok_or(TreeError::NotPersisted)?.id;
        let target_id = target.scope().ok_or(TreeError::NotPersisted)?.id;

        let tx = self.store.begin().await?;
        let result = Self::move_in(tx.as_ref(), node_id, target_id, position).await;
        let (moved, anchor) = finish(tx, result).await?;

        tracing::info!(
            "Moved node {} to {} of node {} (now {:?})",
            node_id,
            position,
            target_id,
            moved.bounds
        );

        *node = moved;
        *target = anchor;
        Ok(())
    }

    async fn move_in(
        tx: &dyn TreeTransaction,
        node_id: NodeId,
        target_id: NodeId,
        position: MovePosition,
    ) -> Result<(Node, Node), TreeError> {
        let source = fetch_scope(tx, node_id).await?;
        let target = fetch_scope(tx, target_id).await?;

        let plan = plan_move(&source, &target, position)?;
        tracing::debug!(
            "Move plan for node {}: {:?} -> {:?}, zone {:?}, shift {}, updown {}",
            plan.node_id,
            plan.source,
            plan.destination,
            plan.zone,
            plan.shift,
            plan.updown
        );

        if plan.is_noop() {
            tracing::debug!("Node {} already at {} of {}", node_id, position, target_id);
        } else {
            let touched = tx.bulk_update(&plan.bulk_update()).await?;
            tracing::debug!("Renumbered {} row(s)", touched);
        }

        let moved = fetch_existing(tx, node_id).await?;
        let anchor = fetch_existing(tx, target_id).await?;
        Ok((moved, anchor))
    }

    /// Make `node` the first child of `parent`
    pub async fn move_to_child_of(
        &self,
        node: &mut Node,
        parent: &mut Node,
    ) -> Result<(), TreeError> {
        self.move_to(node, parent, MovePosition::Child).await
    }

    /// Place `node` immediately before `sibling`
    pub async fn move_to_left_of(
        &self,
        node: &mut Node,
        sibling: &mut Node,
    ) -> Result<(), TreeError> {
        self.move_to(node, sibling, MovePosition::Left).await
    }

    /// Place `node` immediately after `sibling`
    pub async fn move_to_right_of(
        &self,
        node: &mut Node,
        sibling: &mut Node,
    ) -> Result<(), TreeError> {
        self.move_to(node, sibling, MovePosition::Right).await
    }

    /// Re-parent `node` under `parent`
    pub async fn set_parent(&self, node: &mut Node, parent: &mut Node) -> Result<(), TreeError> {
        self.move_to_child_of(node, parent).await
    }

    /// Move using a position name (`child`, `left`/`before`, `right`/`after`)
    ///
    /// The name is validated before a transaction is opened.
    pub async fn move_to_position(
        &self,
        node: &mut Node,
        target: &mut Node,
        position: &str,
    ) -> Result<(), TreeError> {
        let position: MovePosition = position.parse()?;
        self.move_to(node, target, position).await
    }

    // ========================================================================
    // Node-level queries
    // ========================================================================

    /// Parent row, `None` for roots and unsaved nodes
    pub async fn parent(&self, node: &Node) -> Result<Option<Node>, TreeError> {
        match node.scope().and_then(|scope| scope.parent()) {
            Some(predicate) => Ok(self.store.first(&predicate).await?),
            None => Ok(None),
        }
    }

    pub async fn ancestors(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::ancestors).await
    }

    pub async fn self_and_ancestors(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::self_and_ancestors).await
    }

    pub async fn siblings(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::siblings).await
    }

    pub async fn self_and_siblings(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::self_and_siblings).await
    }

    /// Direct children
    pub async fn children(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::children).await
    }

    /// Every descendant, excluding the node itself
    pub async fn all_children(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::descendants).await
    }

    /// The node followed by its descendants
    pub async fn full_set(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        self.scan_scope(node, NodeScope::self_and_descendants).await
    }

    /// Depth of `node`: 0 for roots, otherwise the number of ancestors
    ///
    /// `None` for unsaved nodes.
    pub async fn level(&self, node: &Node) -> Result<Option<u64>, TreeError> {
        let Some(scope) = node.scope() else {
            return Ok(None);
        };
        if scope.parent_id.is_none() {
            return Ok(Some(0));
        }
        Ok(Some(self.store.count(&scope.ancestors()).await?))
    }

    async fn scan_scope(
        &self,
        node: &Node,
        predicate: fn(&NodeScope) -> Predicate,
    ) -> Result<Vec<Node>, TreeError> {
        match node.scope() {
            Some(scope) => Ok(self.store.scan(&predicate(&scope)).await?),
            None => Ok(Vec::new()),
        }
    }
}

/// Commit on success, roll back on failure
///
/// A failing rollback is logged and the original error is returned.
async fn finish<T>(
    tx: Box<dyn TreeTransaction>,
    result: Result<T, TreeError>,
) -> Result<T, TreeError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback after '{}' failed: {}", err, rollback_err);
            }
            Err(err)
        }
    }
}

async fn fetch_existing<E>(executor: &E, id: NodeId) -> Result<Node, TreeError>
where
    E: TreeExecutor + ?Sized,
{
    executor
        .fetch(id)
        .await?
        .ok_or_else(|| TreeError::node_not_found(id))
}

async fn fetch_scope<E>(executor: &E, id: NodeId) -> Result<NodeScope, TreeError>
where
    E: TreeExecutor + ?Sized,
{
    fetch_existing(executor, id)
        .await?
        .scope()
        .ok_or(TreeError::NotPersisted)
}
