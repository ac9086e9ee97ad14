//! Variant Resolution
//!
//! Tables shared by several node kinds store a discriminator per row. The
//! core never interprets it; callers that want concrete types plug in a
//! [`VariantResolver`] and map scanned rows through it.
//!
//! # Examples
//!
//! ```rust
//! use nestedset_core::models::{Bounds, Node};
//! use nestedset_core::services::{VariantRegistry, VariantResolver};
//!
//! #[derive(Debug, PartialEq)]
//! enum Entry {
//!     Folder(Node),
//!     Document(Node),
//! }
//!
//! let registry = VariantRegistry::new()
//!     .register("Folder", Entry::Folder)
//!     .register("Document", Entry::Document);
//!
//! let row = Node::from_row(1, None, Bounds::new(1, 2), Some("Folder".to_string()));
//! let entry = registry.resolve(row.type_tag.as_deref(), row.clone()).unwrap();
//! assert_eq!(entry, Entry::Folder(row));
//! ```

use crate::models::Node;
use crate::services::TreeError;
use std::collections::HashMap;

/// Turns a raw row into a concrete variant
pub trait VariantResolver {
    type Output;

    fn resolve(&self, type_tag: Option<&str>, node: Node) -> Result<Self::Output, TreeError>;

    /// Resolve every row, preserving order
    fn resolve_all(&self, nodes: Vec<Node>) -> Result<Vec<Self::Output>, TreeError> {
        nodes
            .into_iter()
            .map(|node| {
                let type_tag = node.type_tag.clone();
                self.resolve(type_tag.as_deref(), node)
            })
            .collect()
    }
}

type Constructor<T> = Box<dyn Fn(Node) -> T + Send + Sync>;

/// Resolver backed by a map of discriminator to constructor
pub struct VariantRegistry<T> {
    constructors: HashMap<String, Constructor<T>>,
    fallback: Option<Constructor<T>>,
}

impl<T> Default for VariantRegistry<T> {
    fn default() -> Self {
        Self {
            constructors: HashMap::new(),
            fallback: None,
        }
    }
}

impl<T> VariantRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor for one discriminator value
    pub fn register<F>(mut self, type_tag: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Node) -> T + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_tag.into(), Box::new(constructor));
        self
    }

    /// Constructor for rows without a tag or with an unregistered one
    pub fn with_fallback<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Node) -> T + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(constructor));
        self
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }
}

impl<T> VariantResolver for VariantRegistry<T> {
    type Output = T;

    fn resolve(&self, type_tag: Option<&str>, node: Node) -> Result<T, TreeError> {
        let constructor = type_tag
            .and_then(|tag| self.constructors.get(tag))
            .or(self.fallback.as_ref())
            .ok_or_else(|| TreeError::unknown_variant(type_tag))?;
        Ok(constructor(node))
    }
}
