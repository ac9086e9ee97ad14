//! Nested-Set Interval Logic
//!
//! Pure functions over node intervals, shared by every store:
//!
//! - [`predicate`] - Range and equality filters for structural queries
//! - [`arithmetic`] - Where a moved subtree lands and how the rest shifts
//! - [`update`] - The conditional bulk update that applies a renumbering
//! - [`integrity`] - Invariant checks over a scanned forest

pub mod arithmetic;
pub mod integrity;
pub mod predicate;
pub mod update;

pub use arithmetic::{plan_move, MovePlan, MovePosition};
pub use integrity::{check_forest, IntegrityViolation};
pub use predicate::{Column, CompareOp, Predicate};
pub use update::{BulkUpdate, ParentAssignment, ShiftArm, ShiftExpr, ValueRange};
