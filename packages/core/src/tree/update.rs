//! Conditional Bulk Updates
//!
//! Renumbering a nested-set table is a single UPDATE over every row whose
//! new `left`, `right` and `parent_id` are each a CASE expression over the
//! old values. This module describes that statement as data so the
//! in-memory store can evaluate it and the SQL store can render it with
//! bound parameters.

use crate::models::{Bounds, Node, NodeId};
use crate::tree::arithmetic::MovePlan;

/// Inclusive value range tested by a CASE arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRange {
    /// `col BETWEEN start AND end`
    Between(i64, i64),
    /// `col > floor`
    Above(i64),
}

impl ValueRange {
    pub fn contains(&self, value: i64) -> bool {
        match *self {
            ValueRange::Between(start, end) => start <= value && value <= end,
            ValueRange::Above(floor) => value > floor,
        }
    }
}

impl From<Bounds> for ValueRange {
    fn from(bounds: Bounds) -> Self {
        ValueRange::Between(bounds.left, bounds.right)
    }
}

/// `WHEN col IN range [AND col NOT IN exclude] THEN col + delta`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftArm {
    pub range: ValueRange,
    pub exclude: Option<ValueRange>,
    pub delta: i64,
}

impl ShiftArm {
    pub fn matches(&self, value: i64) -> bool {
        self.range.contains(value) && !self.exclude.is_some_and(|ex| ex.contains(value))
    }
}

/// CASE expression for one bound column; values matched by no arm are kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftExpr {
    pub arms: Vec<ShiftArm>,
}

impl ShiftExpr {
    pub fn apply(&self, value: i64) -> i64 {
        self.arms
            .iter()
            .find(|arm| arm.matches(value))
            .map_or(value, |arm| value + arm.delta)
    }
}

/// `parent_id = CASE WHEN id = node_id THEN parent_id ELSE parent_id END`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentAssignment {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
}

/// One table-wide conditional update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdate {
    pub left: ShiftExpr,
    pub right: ShiftExpr,
    pub parent: Option<ParentAssignment>,
}

impl BulkUpdate {
    /// Update relocating a subtree according to `plan`
    ///
    /// The compensation arm excludes the subtree's own range, so no value can
    /// be translated twice even if a store evaluates arms independently.
    pub fn relocate(plan: &MovePlan) -> Self {
        let shift_expr = || ShiftExpr {
            arms: vec![
                ShiftArm {
                    range: plan.source.into(),
                    exclude: None,
                    delta: plan.shift,
                },
                ShiftArm {
                    range: plan.zone.into(),
                    exclude: Some(plan.source.into()),
                    delta: plan.updown,
                },
            ],
        };

        Self {
            left: shift_expr(),
            right: shift_expr(),
            parent: Some(ParentAssignment {
                node_id: plan.node_id,
                parent_id: plan.new_parent,
            }),
        }
    }

    /// Update closing the numbering gap left by a removed interval
    pub fn close_gap(removed: Bounds) -> Self {
        let shift_expr = || ShiftExpr {
            arms: vec![ShiftArm {
                range: ValueRange::Above(removed.right),
                exclude: None,
                delta: -removed.extent(),
            }],
        };

        Self {
            left: shift_expr(),
            right: shift_expr(),
            parent: None,
        }
    }

    /// Apply the update to an in-memory row, returning whether it changed
    pub fn apply_to(&self, node: &mut Node) -> bool {
        let before = node.clone();

        if let Some(bounds) = node.bounds.as_mut() {
            bounds.left = self.left.apply(bounds.left);
            bounds.right = self.right.apply(bounds.right);
        }
        if let Some(assignment) = self.parent {
            if node.id == Some(assignment.node_id) {
                node.parent_id = assignment.parent_id;
            }
        }

        *node != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeScope;
    use crate::tree::arithmetic::{plan_move, MovePosition};

    fn node(id: NodeId, parent_id: Option<NodeId>, left: i64, right: i64) -> Node {
        Node::from_row(id, parent_id, Bounds::new(left, right), None)
    }

    fn scope_of(node: &Node) -> NodeScope {
        node.scope().unwrap()
    }

    #[test]
    fn test_arms_are_mutually_exclusive() {
        let arm = ShiftArm {
            range: ValueRange::Between(1, 10),
            exclude: Some(ValueRange::Between(3, 4)),
            delta: 2,
        };
        assert!(arm.matches(1));
        assert!(!arm.matches(3));
        assert!(!arm.matches(4));
        assert!(arm.matches(5));
        assert!(!arm.matches(11));
    }

    #[test]
    fn test_relocate_child_of_next_root() {
        // A(1,2) B(3,4) C(5,6): A becomes child of B
        let mut rows = vec![node(1, None, 1, 2), node(2, None, 3, 4), node(3, None, 5, 6)];
        let plan = plan_move(&scope_of(&rows[0]), &scope_of(&rows[1]), MovePosition::Child)
            .unwrap();
        let update = plan.bulk_update();

        let changed: Vec<bool> = rows.iter_mut().map(|n| update.apply_to(n)).collect();
        assert_eq!(changed, vec![true, true, false]);

        assert_eq!(rows[0].bounds, Some(Bounds::new(2, 3)));
        assert_eq!(rows[0].parent_id, Some(2));
        assert_eq!(rows[1].bounds, Some(Bounds::new(1, 4)));
        assert_eq!(rows[1].parent_id, None);
        assert_eq!(rows[2].bounds, Some(Bounds::new(5, 6)));
    }

    #[test]
    fn test_close_gap_after_removed_subtree() {
        let update = BulkUpdate::close_gap(Bounds::new(1, 6));
        let mut row = node(4, None, 7, 10);
        assert!(update.apply_to(&mut row));
        assert_eq!(row.bounds, Some(Bounds::new(1, 4)));

        // Enclosing rows only lose the removed width on their right bound
        let update = BulkUpdate::close_gap(Bounds::new(4, 5));
        let mut parent = node(1, None, 1, 8);
        update.apply_to(&mut parent);
        assert_eq!(parent.bounds, Some(Bounds::new(1, 6)));
    }

    #[test]
    fn test_value_range_above() {
        let range = ValueRange::Above(6);
        assert!(!range.contains(6));
        assert!(range.contains(7));
    }
}
