//! Boundary Arithmetic for Subtree Moves
//!
//! Given freshly read bounds of the subtree being moved and of the anchor
//! node, [`plan_move`] computes where the subtree lands and how every other
//! row inside the affected zone has to be translated.
//!
//! # Model
//!
//! - `extent` is the width of the moving subtree
//! - The subtree translates by `shift = new_left - cur_left`
//! - Every other bound inside `[min(cur_left, new_left), max(cur_right, new_right)]`
//!   translates by `updown`, which is `-extent` when the subtree moves
//!   forward (closing the gap it leaves) and `+extent` when it moves
//!   backward (opening room for it)
//!
//! The plan is pure data; [`MovePlan::bulk_update`] turns it into the single
//! conditional update a store executes.

use crate::models::{Bounds, NodeId, NodeScope};
use crate::services::TreeError;
use crate::tree::update::BulkUpdate;
use std::fmt;
use std::str::FromStr;

/// Where a subtree is placed relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovePosition {
    /// First child of the target
    Child,
    /// Sibling immediately before the target
    Left,
    /// Sibling immediately after the target
    Right,
}

impl MovePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovePosition::Child => "child",
            MovePosition::Left => "left",
            MovePosition::Right => "right",
        }
    }
}

impl fmt::Display for MovePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovePosition {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "child" => Ok(MovePosition::Child),
            "left" | "before" => Ok(MovePosition::Left),
            "right" | "after" => Ok(MovePosition::Right),
            other => Err(TreeError::invalid_position(other)),
        }
    }
}

/// Complete description of one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Node being moved
    pub node_id: NodeId,
    /// Subtree bounds before the move
    pub source: Bounds,
    /// Subtree bounds after the move
    pub destination: Bounds,
    /// Minimal range covering both the old and the new position
    pub zone: Bounds,
    /// Translation applied to the moving subtree
    pub shift: i64,
    /// Translation applied to the rest of the zone
    pub updown: i64,
    /// Parent of the moved node afterwards
    pub new_parent: Option<NodeId>,
}

impl MovePlan {
    /// Whether the move leaves every bound where it is
    pub fn is_noop(&self) -> bool {
        self.shift == 0
    }

    /// The conditional update that applies this plan to the table
    pub fn bulk_update(&self) -> BulkUpdate {
        BulkUpdate::relocate(self)
    }
}

/// Compute the new position of `source` relative to `target`
///
/// Fails with `InvalidMoveTarget` when the target lies inside the moving
/// subtree (including the node itself).
pub fn plan_move(
    source: &NodeScope,
    target: &NodeScope,
    position: MovePosition,
) -> Result<MovePlan, TreeError> {
    let cur = source.bounds;
    let tgt = target.bounds;

    if cur.overlaps(&tgt) {
        return Err(TreeError::invalid_move_target(source.id, target.id));
    }

    let extent = cur.extent();

    // The anchor decides the direction: for "right" it is the target's right
    // bound, so an enclosing target counts as lying ahead of the subtree.
    let anchor = match position {
        MovePosition::Child | MovePosition::Left => tgt.left,
        MovePosition::Right => tgt.right,
    };
    let backward = anchor < cur.left;

    let destination = match (position, backward) {
        (MovePosition::Child, true) => Bounds::new(tgt.left + 1, tgt.left + extent),
        (MovePosition::Child, false) => Bounds::new(tgt.left - extent + 1, tgt.left),
        (MovePosition::Left, true) => Bounds::new(tgt.left, tgt.left + extent - 1),
        (MovePosition::Left, false) => Bounds::new(tgt.left - extent, tgt.left - 1),
        (MovePosition::Right, true) => Bounds::new(tgt.right + 1, tgt.right + extent),
        (MovePosition::Right, false) => Bounds::new(tgt.right - extent + 1, tgt.right),
    };

    let zone = Bounds::new(
        cur.left.min(destination.left),
        cur.right.max(destination.right),
    );
    let shift = destination.left - cur.left;
    let updown = if shift > 0 { -extent } else { extent };

    let new_parent = match position {
        MovePosition::Child => Some(target.id),
        MovePosition::Left | MovePosition::Right => target.parent_id,
    };

    Ok(MovePlan {
        node_id: source.id,
        source: cur,
        destination,
        zone,
        shift,
        updown,
        new_parent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(id: NodeId, parent_id: Option<NodeId>, left: i64, right: i64) -> NodeScope {
        NodeScope {
            id,
            parent_id,
            bounds: Bounds::new(left, right),
        }
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("child".parse::<MovePosition>().unwrap(), MovePosition::Child);
        assert_eq!("before".parse::<MovePosition>().unwrap(), MovePosition::Left);
        assert_eq!("left".parse::<MovePosition>().unwrap(), MovePosition::Left);
        assert_eq!("after".parse::<MovePosition>().unwrap(), MovePosition::Right);
        assert_eq!(MovePosition::Right.to_string(), "right");

        let err = "under".parse::<MovePosition>().unwrap_err();
        assert!(matches!(err, TreeError::InvalidPosition(ref p) if p == "under"));
    }

    #[test]
    fn test_child_forward() {
        // A(1,2) B(3,4): A becomes child of B
        let plan = plan_move(
            &scope(1, None, 1, 2),
            &scope(2, None, 3, 4),
            MovePosition::Child,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(2, 3));
        assert_eq!(plan.zone, Bounds::new(1, 3));
        assert_eq!(plan.shift, 1);
        assert_eq!(plan.updown, -2);
        assert_eq!(plan.new_parent, Some(2));
    }

    #[test]
    fn test_child_backward() {
        // A(1,2) B(3,4): B becomes child of A
        let plan = plan_move(
            &scope(2, None, 3, 4),
            &scope(1, None, 1, 2),
            MovePosition::Child,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(2, 3));
        assert_eq!(plan.zone, Bounds::new(2, 4));
        assert_eq!(plan.shift, -1);
        assert_eq!(plan.updown, 2);
        assert_eq!(plan.new_parent, Some(1));
    }

    #[test]
    fn test_left_of_backward_and_forward() {
        // A(1,2) B(3,4) C(5,6)
        let plan = plan_move(
            &scope(3, None, 5, 6),
            &scope(1, None, 1, 2),
            MovePosition::Left,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(1, 2));
        assert_eq!(plan.zone, Bounds::new(1, 6));
        assert_eq!(plan.updown, 2);
        assert_eq!(plan.new_parent, None);

        let plan = plan_move(
            &scope(1, None, 1, 2),
            &scope(3, None, 5, 6),
            MovePosition::Left,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(3, 4));
        assert_eq!(plan.shift, 2);
        assert_eq!(plan.updown, -2);
    }

    #[test]
    fn test_right_of_backward_and_forward() {
        // A(1,2) B(3,4) C(5,6)
        let plan = plan_move(
            &scope(3, None, 5, 6),
            &scope(1, None, 1, 2),
            MovePosition::Right,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(3, 4));
        assert_eq!(plan.zone, Bounds::new(3, 6));

        let plan = plan_move(
            &scope(1, None, 1, 2),
            &scope(3, None, 5, 6),
            MovePosition::Right,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(5, 6));
        assert_eq!(plan.zone, Bounds::new(1, 6));
        assert_eq!(plan.updown, -2);
    }

    #[test]
    fn test_right_of_enclosing_ancestor_moves_forward() {
        // P(1,6) [X(2,3) Y(4,5)]: X after its own parent
        let plan = plan_move(
            &scope(2, Some(1), 2, 3),
            &scope(1, None, 1, 6),
            MovePosition::Right,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(5, 6));
        assert_eq!(plan.shift, 3);
        assert_eq!(plan.updown, -2);
        assert_eq!(plan.new_parent, None);
    }

    #[test]
    fn test_sibling_placement_inherits_target_parent() {
        let plan = plan_move(
            &scope(9, None, 7, 8),
            &scope(3, Some(1), 2, 3),
            MovePosition::Left,
        )
        .unwrap();
        assert_eq!(plan.new_parent, Some(1));
    }

    #[test]
    fn test_moving_wide_subtree() {
        // R(1,6)[a(2,3) b(4,5)] S(7,8): R becomes child of S
        let plan = plan_move(
            &scope(1, None, 1, 6),
            &scope(4, None, 7, 8),
            MovePosition::Child,
        )
        .unwrap();
        assert_eq!(plan.destination, Bounds::new(2, 7));
        assert_eq!(plan.shift, 1);
        assert_eq!(plan.updown, -6);
        assert_eq!(plan.zone, Bounds::new(1, 7));
    }

    #[test]
    fn test_noop_move_keeps_bounds() {
        // A(1,2) B(3,4): A left of B is where A already is
        let plan = plan_move(
            &scope(1, None, 1, 2),
            &scope(2, None, 3, 4),
            MovePosition::Left,
        )
        .unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.zone, Bounds::new(1, 2));
    }

    #[test]
    fn test_target_inside_subtree_is_rejected() {
        let source = scope(1, None, 1, 6);
        for target in [scope(1, None, 1, 6), scope(2, Some(1), 2, 3), scope(3, Some(1), 4, 5)] {
            for position in [MovePosition::Child, MovePosition::Left, MovePosition::Right] {
                let err = plan_move(&source, &target, position).unwrap_err();
                assert!(matches!(
                    err,
                    TreeError::InvalidMoveTarget { node_id: 1, .. }
                ));
            }
        }
    }
}
