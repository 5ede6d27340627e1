//! FILENAME: core/calc-engine/src/tuple/mod.rs
//! Tuple collections.
//!
//! A tuple is a fixed-length sequence of members, one per axis. Results of
//! set expressions are collections of tuples, and they can be very large,
//! so storage is chosen by arity:
//! - arity 1: `UnaryTupleList`, a flat vector of members
//! - arity >= 2: `ArrayTupleList`, one packed vector of `size * arity` members
//! - arity 0 or foreign rows: `DelegatingTupleList`, a vector of rows
//!
//! Access comes in three widths:
//! - `TupleCursor`: forward-only, one current tuple, no allocation per step
//! - `TupleIterable`: anything that can hand out cursors
//! - `IndexedTuples`: random access by (column, index)
//!
//! `TupleList` wraps the storages behind a single type with a runtime
//! mutability flag.

pub mod array;
pub mod delegating;
pub mod iterator;
pub mod list;
pub mod materialize;
pub mod unary;
pub mod views;

use crate::error::ResourceLimitError;
use model::{Evaluator, Member};
use smallvec::SmallVec;

pub use array::ArrayTupleList;
pub use delegating::DelegatingTupleList;
pub use iterator::{ColumnIter, CursorIterator, IndexCursor, IteratorCursor, TupleIter};
pub use list::TupleList;
pub use materialize::{materialize, FnTupleIterable, LazyTupleList, SharedIterable};
pub use unary::UnaryTupleList;
pub use views::{PositionTracked, ProjectedList, Slice, SubList};

/// A materialized tuple. Inline for the common small arities.
pub type Tuple = SmallVec<[Member; 4]>;

// ============================================================================
// ROW LIMIT
// ============================================================================

/// The maximum number of tuples a list may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowLimit {
    rows: Option<usize>,
}

impl RowLimit {
    pub const UNBOUNDED: RowLimit = RowLimit { rows: None };

    /// Zero or negative means unbounded.
    pub fn new(limit: i64) -> Self {
        if limit <= 0 {
            return RowLimit::UNBOUNDED;
        }
        RowLimit {
            rows: usize::try_from(limit).ok(),
        }
    }

    pub fn rows(&self) -> Option<usize> {
        self.rows
    }

    /// Maximum number of member slots for a packed list of `arity`.
    /// `None` if unbounded, including when the product overflows.
    pub fn ceiling(&self, arity: usize) -> Option<usize> {
        self.rows.and_then(|rows| rows.checked_mul(arity))
    }

    /// Fails if a list would hold `attempted` tuples.
    pub fn check(&self, attempted: usize) -> Result<(), ResourceLimitError> {
        match self.rows {
            Some(limit) if attempted > limit => {
                log::warn!("tuple list of {} rows rejected by result limit {}", attempted, limit);
                Err(ResourceLimitError { attempted, limit })
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// ACCESS TRAITS
// ============================================================================

/// Forward-only traversal with a single current tuple.
///
/// `member` and `current` may only be called after `forward` returned true.
pub trait TupleCursor {
    fn arity(&self) -> usize;

    /// Moves to the next tuple. Returns false once the data is exhausted.
    fn forward(&mut self) -> bool;

    /// A member of the current tuple.
    fn member(&self, column: usize) -> &Member;

    /// Copies the current tuple out.
    fn current(&self) -> Tuple {
        (0..self.arity()).map(|c| self.member(c).clone()).collect()
    }

    /// Copies the current tuple into a reusable buffer.
    fn current_to(&self, buffer: &mut Vec<Member>) {
        buffer.clear();
        buffer.extend((0..self.arity()).map(|c| self.member(c).clone()));
    }

    /// Positions an evaluator at the current tuple.
    fn set_context(&self, evaluator: &mut dyn Evaluator) {
        for c in 0..self.arity() {
            evaluator.set_context(self.member(c));
        }
    }
}

impl<C: TupleCursor + ?Sized> TupleCursor for Box<C> {
    fn arity(&self) -> usize {
        (**self).arity()
    }

    fn forward(&mut self) -> bool {
        (**self).forward()
    }

    fn member(&self, column: usize) -> &Member {
        (**self).member(column)
    }
}

/// A sequence of tuples that can be traversed, possibly more than once.
pub trait TupleIterable {
    fn arity(&self) -> usize;

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_>;

    /// A standard iterator, derived from a cursor.
    fn tuple_iter(&self) -> TupleIter<'_> {
        CursorIterator::new(self.tuple_cursor())
    }

    /// The members of one column, in order.
    ///
    /// # Panics
    /// Panics if `column >= arity`.
    fn slice(&self, column: usize) -> ColumnIter<'_> {
        assert!(column < self.arity(), "column {} out of range for arity {}", column, self.arity());
        ColumnIter::new(self.tuple_cursor(), column)
    }
}

/// Random access to tuples by position.
pub trait IndexedTuples: TupleIterable {
    fn len(&self) -> usize;

    /// The member at `column` of tuple `index`.
    ///
    /// # Panics
    /// Panics if either coordinate is out of range.
    fn get(&self, column: usize, index: usize) -> &Member;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tuple(&self, index: usize) -> Option<Tuple> {
        if index >= self.len() {
            return None;
        }
        Some((0..self.arity()).map(|c| self.get(c, index).clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_limit_non_positive_is_unbounded() {
        assert_eq!(RowLimit::new(0), RowLimit::UNBOUNDED);
        assert_eq!(RowLimit::new(-5).ceiling(3), None);
    }

    #[test]
    fn test_row_limit_ceiling_overflow_is_unbounded() {
        let limit = RowLimit::new(i64::MAX);
        assert_eq!(limit.ceiling(usize::MAX), None);
        assert_eq!(RowLimit::new(10).ceiling(3), Some(30));
    }

    #[test]
    fn test_row_limit_check() {
        let limit = RowLimit::new(2);
        assert!(limit.check(2).is_ok());
        assert_eq!(limit.check(3), Err(ResourceLimitError { attempted: 3, limit: 2 }));
    }
}
