//! Forest Inspector
//!
//! Prints every tree stored in a nested-set table, indented by depth, and
//! reports any broken interval invariant.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin forest-inspect -- ./data/forest.db
//!
//! # Or through the environment, with a custom column mapping
//! NESTEDSET_DB=./data/menus.db NESTEDSET_CONFIG=./menus.json cargo run --bin forest-inspect
//! ```
//!
//! `NESTEDSET_CONFIG` points to a JSON `TreeConfig`; unset fields keep their
//! defaults. The process exits with status 1 when violations are found.

use anyhow::Context;
use nestedset_core::{config::TreeConfig, db::LibsqlTreeStore, models::Node, NestedSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "forest_inspect=info,nestedset_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NESTEDSET_DB").ok())
        .map(PathBuf::from)
        .context("usage: forest-inspect <db-path> (or set NESTEDSET_DB)")?;
    let config = load_config()?;

    tracing::info!(
        "Inspecting table '{}' in {}",
        config.table,
        db_path.display()
    );
    let store = LibsqlTreeStore::new(db_path.clone(), config)
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let tree = NestedSet::new(Arc::new(store));

    let nodes = tree.all().await?;
    for (node, depth) in with_depth(&nodes) {
        println!("{}{}", "  ".repeat(depth), describe(node));
    }
    println!("{} node(s)", nodes.len());

    let violations = tree.check_integrity().await?;
    if violations.is_empty() {
        println!("forest is consistent");
        return Ok(());
    }

    eprintln!("{} violation(s):", violations.len());
    for violation in &violations {
        eprintln!("  - {}", violation);
    }
    std::process::exit(1);
}

fn load_config() -> anyhow::Result<TreeConfig> {
    match std::env::var("NESTEDSET_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path))?;
            Ok(TreeConfig::from_json(&json)?)
        }
        Err(_) => Ok(TreeConfig::default()),
    }
}

/// Pair each node of a pre-order scan with its depth
///
/// Depth comes from interval nesting alone, so a damaged table still prints.
fn with_depth(nodes: &[Node]) -> Vec<(&Node, usize)> {
    let mut open: Vec<i64> = Vec::new();
    nodes
        .iter()
        .map(|node| {
            let (left, right) = match node.bounds {
                Some(b) => (b.left, b.right),
                None => return (node, open.len()),
            };
            while open.last().is_some_and(|&outer_right| outer_right < left) {
                open.pop();
            }
            let depth = open.len();
            open.push(right);
            (node, depth)
        })
        .collect()
}

fn describe(node: &Node) -> String {
    let id = node.id.map_or_else(|| "?".to_string(), |id| id.to_string());
    let bounds = node
        .bounds
        .map_or_else(|| "(unsaved)".to_string(), |b| format!("({}, {})", b.left, b.right));
    match &node.type_tag {
        Some(tag) => format!("#{} {} {}", id, tag, bounds),
        None => format!("#{} {}", id, bounds),
    }
}
