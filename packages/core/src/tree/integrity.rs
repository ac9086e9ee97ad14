//! Forest Integrity Checks
//!
//! Verifies that a full scan of a nested-set table describes a consistent
//! forest: ordered bounds, gap-free numbering from 1 to 2N, properly nested
//! intervals and parent pointers that agree with interval nesting.

use crate::models::{Bounds, Node, NodeId};
use thiserror::Error;

/// A single broken invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("node {id:?} has no persisted bounds")]
    Unpersisted { id: Option<NodeId> },

    #[error("node {id} has left {} >= right {}", .bounds.left, .bounds.right)]
    InvertedBounds { id: NodeId, bounds: Bounds },

    #[error("bound number {expected} expected but found {found}")]
    NumberingGap { expected: i64, found: i64 },

    #[error("intervals of nodes {outer} and {inner} cross")]
    CrossingIntervals { outer: NodeId, inner: NodeId },

    #[error("node {id} has parent {actual:?} but its interval nests directly in {expected:?}")]
    ParentMismatch {
        id: NodeId,
        expected: Option<NodeId>,
        actual: Option<NodeId>,
    },
}

/// Check every invariant over `nodes` (any order)
pub fn check_forest(nodes: &[Node]) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();
    let mut scoped = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node.scope() {
            Some(scope) => scoped.push(scope),
            None => violations.push(IntegrityViolation::Unpersisted { id: node.id }),
        }
    }

    for scope in &scoped {
        if scope.bounds.left >= scope.bounds.right {
            violations.push(IntegrityViolation::InvertedBounds {
                id: scope.id,
                bounds: scope.bounds,
            });
        }
    }

    let mut numbers: Vec<i64> = scoped
        .iter()
        .flat_map(|s| [s.bounds.left, s.bounds.right])
        .collect();
    numbers.sort_unstable();
    if let Some((expected, found)) = numbers
        .iter()
        .enumerate()
        .map(|(i, &found)| (i as i64 + 1, found))
        .find(|(expected, found)| expected != found)
    {
        violations.push(IntegrityViolation::NumberingGap { expected, found });
    }

    scoped.sort_by_key(|s| s.bounds.left);
    let mut open: Vec<(NodeId, Bounds)> = Vec::new();
    for scope in &scoped {
        while open
            .last()
            .is_some_and(|(_, outer)| outer.right < scope.bounds.left)
        {
            open.pop();
        }

        if let Some(&(outer_id, outer)) = open.last() {
            if outer.right < scope.bounds.right {
                violations.push(IntegrityViolation::CrossingIntervals {
                    outer: outer_id,
                    inner: scope.id,
                });
            }
        }

        let expected = open.last().map(|(id, _)| *id);
        if scope.parent_id != expected {
            violations.push(IntegrityViolation::ParentMismatch {
                id: scope.id,
                expected,
                actual: scope.parent_id,
            });
        }

        open.push((scope.id, scope.bounds));
    }

    violations
}
