//! Database Layer
//!
//! This module holds the storage side of the nested-set core:
//!
//! - The store contract the services are written against ([`TreeExecutor`],
//!   [`TreeStore`], [`TreeTransaction`])
//! - [`MemoryTreeStore`], an in-process table used by tests and embedders
//!   without a database
//! - [`LibsqlTreeStore`], an embedded SQLite table via libsql
//!
//! # Architecture
//!
//! The core only needs ordered filtered scans, a max aggregate, a reload
//! by id, inserts, one table-wide conditional update, filtered deletes and
//! a transaction boundary. Stores never receive SQL text from the core;
//! they get [`Predicate`](crate::tree::Predicate) and
//! [`BulkUpdate`](crate::tree::BulkUpdate) values.

mod error;
mod libsql_store;
mod memory_store;
pub mod sql;
mod tree_store;

pub use error::StoreError;
pub use libsql_store::LibsqlTreeStore;
pub use memory_store::MemoryTreeStore;
pub use tree_store::{TreeExecutor, TreeStore, TreeTransaction};
