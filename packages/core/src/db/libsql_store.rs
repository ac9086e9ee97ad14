//! LibsqlTreeStore - TreeStore Implementation for libsql
//!
//! Stores the forest in one SQLite table through libsql. Statements come
//! from [`TableSql`], so every computed bound travels as a parameter.
//!
//! # Database Connection Pattern
//!
//! Every operation opens its own connection with a 5-second busy timeout,
//! so concurrent callers wait for the write lock instead of failing with
//! `SQLITE_BUSY`. Because of that the store needs a database file; each
//! connection to `:memory:` would see a separate empty database.
//!
//! # Transactions
//!
//! `begin()` issues `BEGIN IMMEDIATE`, taking SQLite's write lock before the
//! first read. A move therefore reloads its bounds, renumbers and commits
//! without any other writer interleaving.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nestedset_core::config::TreeConfig;
//! use nestedset_core::db::LibsqlTreeStore;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store =
//!         LibsqlTreeStore::new(PathBuf::from("./data/forest.db"), TreeConfig::default()).await?;
//!     Ok(())
//! }
//! ```

use crate::config::TreeConfig;
use crate::db::sql::{Statement, TableSql};
use crate::db::tree_store::{TreeExecutor, TreeStore, TreeTransaction};
use crate::db::StoreError;
use crate::models::{Node, NodeId};
use crate::services::TreeError;
use crate::tree::{BulkUpdate, Column, Predicate};
use async_trait::async_trait;
use libsql::{params_from_iter, Builder, Connection, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Busy timeout applied to every connection, in milliseconds
const BUSY_TIMEOUT_MS: u32 = 5000;

/// libsql-backed nested-set table
#[derive(Clone)]
pub struct LibsqlTreeStore {
    db: Arc<Database>,
    /// Path to the database file
    pub db_path: PathBuf,
    config: TreeConfig,
    sql: Arc<TableSql>,
}

impl LibsqlTreeStore {
    /// Open (or create) the database and make sure the table exists
    ///
    /// This will:
    /// 1. Validate the column mapping
    /// 2. Ensure the parent directory exists
    /// 3. Open the database file
    /// 4. Create the table and its left/right/parent indexes if missing
    pub async fn new(db_path: PathBuf, config: TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::DirectoryCreationFailed)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| StoreError::connection_failed(db_path.clone(), e))?;

        let store = Self {
            db: Arc::new(db),
            db_path,
            sql: Arc::new(TableSql::new(&config)),
            config,
        };
        store.initialize_schema().await?;

        tracing::debug!(
            "Opened nested-set table '{}' at {}",
            store.config.table,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Switch to WAL and create the table and indexes (idempotent)
    ///
    /// WAL lets reads outside a transaction proceed while a move holds the
    /// write lock.
    async fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect_with_timeout().await?;

        execute_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        execute_ddl(&conn, &self.sql.create_table(), "create table").await?;
        for index in self.sql.create_indexes() {
            execute_ddl(&conn, &index, "create index").await?;
        }

        Ok(())
    }

    /// Get a connection with the busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<Connection, StoreError> {
        let conn = self.db.connect()?;
        execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    fn ops<'a>(&'a self, conn: &'a Connection) -> SqlOps<'a> {
        SqlOps {
            conn,
            sql: &self.sql,
        }
    }
}

/// Run a PRAGMA, stepping its result row so the setting is applied
async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), StoreError> {
    // PRAGMA returns a row, so it has to go through query()
    let mut rows = conn.query(pragma, ()).await.map_err(|e| {
        StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
    })?;
    rows.next().await?;
    Ok(())
}

async fn execute_ddl(conn: &Connection, sql: &str, what: &str) -> Result<(), StoreError> {
    conn.execute(sql, ())
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to {}: {}", what, e)))?;
    Ok(())
}

impl std::fmt::Debug for LibsqlTreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibsqlTreeStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish()
    }
}

/// Statement execution over one connection
struct SqlOps<'a> {
    conn: &'a Connection,
    sql: &'a TableSql,
}

impl SqlOps<'_> {
    async fn query_nodes(&self, statement: Statement) -> Result<Vec<Node>, StoreError> {
        let mut rows = self
            .conn
            .query(&statement.sql, params_from_iter(statement.params))
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to scan nodes: {}", e)))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            nodes.push(self.sql.row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn query_scalar(&self, statement: Statement) -> Result<Option<i64>, StoreError> {
        let mut rows = self
            .conn
            .query(&statement.sql, params_from_iter(statement.params))
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to run aggregate: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            Some(row) => row
                .get::<Option<i64>>(0)
                .map_err(|e| StoreError::row_decode(format!("aggregate: {}", e))),
            None => Ok(None),
        }
    }

    async fn execute(&self, statement: Statement, what: &str) -> Result<u64, StoreError> {
        self.conn
            .execute(&statement.sql, params_from_iter(statement.params))
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to {}: {}", what, e)))
    }

    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError> {
        self.query_nodes(self.sql.select(predicate)).await
    }

    async fn first(&self, predicate: &Predicate) -> Result<Option<Node>, StoreError> {
        Ok(self
            .query_nodes(self.sql.select_first(predicate))
            .await?
            .into_iter()
            .next())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let count = self.query_scalar(self.sql.count(predicate)).await?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }

    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError> {
        self.query_scalar(self.sql.max(column)).await
    }

    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.first(&Predicate::id_is(id)).await
    }

    async fn insert(&self, node: &Node) -> Result<Node, StoreError> {
        let bounds = node
            .bounds
            .ok_or_else(|| StoreError::invalid_row("node has no bounds to insert"))?;

        self.execute(self.sql.insert(node, bounds), "insert node")
            .await?;
        let id = self.conn.last_insert_rowid();

        self.fetch(id)
            .await?
            .ok_or_else(|| StoreError::sql_execution(format!("Inserted node {} not found", id)))
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError> {
        self.execute(self.sql.bulk_update(update), "renumber nodes")
            .await
    }

    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.execute(self.sql.delete(predicate), "delete nodes")
            .await
    }
}

#[async_trait]
impl TreeExecutor for LibsqlTreeStore {
    fn config(&self) -> &TreeConfig {
        &self.config
    }

    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).scan(predicate).await
    }

    async fn first(&self, predicate: &Predicate) -> Result<Option<Node>, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).first(predicate).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).count(predicate).await
    }

    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).max(column).await
    }

    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).fetch(id).await
    }

    async fn insert(&self, node: &Node) -> Result<Node, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).insert(node).await
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).bulk_update(update).await
    }

    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let conn = self.connect_with_timeout().await?;
        self.ops(&conn).delete_where(predicate).await
    }
}

#[async_trait]
impl TreeStore for LibsqlTreeStore {
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>, StoreError> {
        let conn = self.connect_with_timeout().await?;
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            StoreError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Box::new(LibsqlTransaction {
            conn,
            config: self.config.clone(),
            sql: self.sql.clone(),
        }))
    }
}

/// Open transaction on a dedicated connection
///
/// Dropping it without `commit()` closes the connection, and SQLite rolls
/// back the open transaction.
struct LibsqlTransaction {
    conn: Connection,
    config: TreeConfig,
    sql: Arc<TableSql>,
}

impl LibsqlTransaction {
    fn ops(&self) -> SqlOps<'_> {
        SqlOps {
            conn: &self.conn,
            sql: &self.sql,
        }
    }
}

#[async_trait]
impl TreeExecutor for LibsqlTransaction {
    fn config(&self) -> &TreeConfig {
        &self.config
    }

    async fn scan(&self, predicate: &Predicate) -> Result<Vec<Node>, StoreError> {
        self.ops().scan(predicate).await
    }

    async fn first(&self, predicate: &Predicate) -> Result<Option<Node>, StoreError> {
        self.ops().first(predicate).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.ops().count(predicate).await
    }

    async fn max(&self, column: Column) -> Result<Option<i64>, StoreError> {
        self.ops().max(column).await
    }

    async fn fetch(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.ops().fetch(id).await
    }

    async fn insert(&self, node: &Node) -> Result<Node, StoreError> {
        self.ops().insert(node).await
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<u64, StoreError> {
        self.ops().bulk_update(update).await
    }

    async fn delete_where(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.ops().delete_where(predicate).await
    }
}

#[async_trait]
impl TreeTransaction for LibsqlTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.conn.execute("COMMIT", ()).await.map_err(|e| {
            StoreError::transaction_failed(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.conn.execute("ROLLBACK", ()).await.map_err(|e| {
            StoreError::transaction_failed(format!("Failed to roll back transaction: {}", e))
        })?;
        Ok(())
    }
}
