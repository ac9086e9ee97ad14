//! Business Services
//!
//! This module contains the nested-set business logic:
//!
//! - `NestedSet` - create, move, delete and structural queries for one table
//! - `VariantResolver` / `VariantRegistry` - pluggable row-to-type dispatch
//! - `TreeError` - errors reported to callers
//!
//! Services coordinate between the pure interval arithmetic in
//! [`crate::tree`] and the storage layer in [`crate::db`].

pub mod error;
pub mod nested_set;
pub mod variant;


pub use error::TreeError;
pub use nested_set::NestedSet;
pub use variant::{VariantRegistry, VariantResolver};
