//! Interval Predicates
//!
//! Structural queries over a nested-set table reduce to range and equality
//! filters on four columns. This module builds those filters as a small
//! expression tree that stores can either evaluate directly (in memory) or
//! render into parameterized SQL.
//!
//! Every predicate built from a [`NodeScope`] is meant to be scanned ordered
//! by `left` ascending, which yields the matching nodes in pre-order.

use crate::models::{Node, NodeId, NodeScope};

/// Logical column of the nested-set table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    ParentId,
    Left,
    Right,
}

impl Column {
    /// Column value of a node, `None` when unset (NULL)
    pub fn value_of(&self, node: &Node) -> Option<i64> {
        match self {
            Column::Id => node.id,
            Column::ParentId => node.parent_id,
            Column::Left => node.left(),
            Column::Right => node.right(),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }

    fn holds(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::NotEq => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::LtEq => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::GtEq => lhs >= rhs,
        }
    }
}

/// Row filter
///
/// Comparisons follow SQL semantics: a comparison against a NULL column is
/// never true, which is why nullable equality goes through [`Predicate::is`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every row
    All,
    Compare {
        column: Column,
        op: CompareOp,
        value: i64,
    },
    IsNull(Column),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(column: Column, op: CompareOp, value: i64) -> Self {
        Self::Compare { column, op, value }
    }

    /// `column = value`, or `column IS NULL` when `value` is `None`
    pub fn is(column: Column, value: Option<i64>) -> Self {
        match value {
            Some(value) => Self::compare(column, CompareOp::Eq, value),
            None => Self::IsNull(column),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Evaluate the predicate against an in-memory row
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Compare { column, op, value } => {
                column.value_of(node).is_some_and(|actual| op.holds(actual, *value))
            }
            Predicate::IsNull(column) => column.value_of(node).is_none(),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(node)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(node)),
        }
    }

    /// `parent_id IS NULL`
    pub fn roots() -> Self {
        Self::IsNull(Column::ParentId)
    }

    /// `id = id`
    pub fn id_is(id: NodeId) -> Self {
        Self::compare(Column::Id, CompareOp::Eq, id)
    }
}

impl NodeScope {
    /// `left < self.left AND right > self.right`
    pub fn ancestors(&self) -> Predicate {
        let left = Predicate::compare(Column::Left, CompareOp::Lt, self.bounds.left);
        left.and(Predicate::compare(Column::Right, CompareOp::Gt, self.bounds.right))
    }

    /// `left <= self.left AND right >= self.right`
    pub fn self_and_ancestors(&self) -> Predicate {
        let left = Predicate::compare(Column::Left, CompareOp::LtEq, self.bounds.left);
        left.and(Predicate::compare(Column::Right, CompareOp::GtEq, self.bounds.right))
    }

    /// `left > self.left AND right < self.right`
    pub fn descendants(&self) -> Predicate {
        let left = Predicate::compare(Column::Left, CompareOp::Gt, self.bounds.left);
        left.and(Predicate::compare(Column::Right, CompareOp::Lt, self.bounds.right))
    }

    /// `left >= self.left AND right <= self.right`
    pub fn self_and_descendants(&self) -> Predicate {
        let left = Predicate::compare(Column::Left, CompareOp::GtEq, self.bounds.left);
        left.and(Predicate::compare(Column::Right, CompareOp::LtEq, self.bounds.right))
    }

    /// `parent_id = self.id`
    pub fn children(&self) -> Predicate {
        Predicate::compare(Column::ParentId, CompareOp::Eq, self.id)
    }

    /// `parent_id = self.parent_id AND id != self.id`
    pub fn siblings(&self) -> Predicate {
        Predicate::is(Column::ParentId, self.parent_id)
            .and(Predicate::compare(Column::Id, CompareOp::NotEq, self.id))
    }

    /// `id = self.id OR parent_id = self.parent_id`
    pub fn self_and_siblings(&self) -> Predicate {
        Predicate::id_is(self.id).or(Predicate::is(Column::ParentId, self.parent_id))
    }

    /// `id = self.parent_id`, absent for roots
    pub fn parent(&self) -> Option<Predicate> {
        self.parent_id.map(Predicate::id_is)
    }
}
