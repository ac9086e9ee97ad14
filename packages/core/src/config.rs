//! Tree Table Configuration
//!
//! Maps the logical nested-set columns onto a concrete table. A `TreeConfig`
//! is immutable once built and is bound into a store at construction time,
//! so every operation on that store sees the same mapping.
//!
//! # Examples
//!
//! ```rust
//! use nestedset_core::config::TreeConfig;
//!
//! let config = TreeConfig::from_json(r#"{ "table": "categories", "type_column": "kind" }"#)
//!     .unwrap();
//! assert_eq!(config.table, "categories");
//! assert_eq!(config.left_column, "left");
//! assert!(config.is_polymorphic());
//! ```

use crate::services::TreeError;
use serde::{Deserialize, Serialize};

/// Column mapping for one nested-set table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Table holding every node of the forest
    pub table: String,
    /// Primary key column (integer, assigned by the store)
    pub id_column: String,
    /// Nullable parent reference; NULL marks a root
    pub parent_id_column: String,
    /// Left interval bound
    pub left_column: String,
    /// Right interval bound
    pub right_column: String,
    /// Optional discriminator column for tables shared by several node variants
    pub type_column: Option<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            table: "nodes".to_string(),
            id_column: "id".to_string(),
            parent_id_column: "parent_id".to_string(),
            left_column: "left".to_string(),
            right_column: "right".to_string(),
            type_column: None,
        }
    }
}

impl TreeConfig {
    /// Default mapping for the given table name
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Enable the discriminator column
    pub fn with_type_column(mut self, column: impl Into<String>) -> Self {
        self.type_column = Some(column.into());
        self
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TreeError::invalid_config(format!("malformed tree config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Whether rows carry a type discriminator
    pub fn is_polymorphic(&self) -> bool {
        self.type_column.is_some()
    }

    /// Check every identifier and reject duplicate column names
    ///
    /// Identifiers are quoted when rendered into SQL, but they are still
    /// restricted to `[A-Za-z_][A-Za-z0-9_]*` so that no configuration value
    /// can change the shape of a statement.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut columns = vec![
            self.id_column.as_str(),
            self.parent_id_column.as_str(),
            self.left_column.as_str(),
            self.right_column.as_str(),
        ];
        if let Some(type_column) = &self.type_column {
            columns.push(type_column.as_str());
        }

        for name in std::iter::once(self.table.as_str()).chain(columns.iter().copied()) {
            if !is_identifier(name) {
                return Err(TreeError::invalid_config(format!(
                    "'{}' is not a valid identifier",
                    name
                )));
            }
        }

        for (i, name) in columns.iter().enumerate() {
            if columns[i + 1..].contains(name) {
                return Err(TreeError::invalid_config(format!(
                    "column '{}' is mapped more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
