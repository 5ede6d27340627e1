//! FILENAME: core/calc-engine/src/tuple/views.rs
//! Read-only views over random-access tuple collections.
//!
//! None of these copy members. They translate coordinates and read through
//! to the underlying collection, which must outlive the view.

use super::iterator::IndexCursor;
use super::{IndexedTuples, TupleCursor, TupleIterable};
use crate::error::CalcError;
use model::Member;
use smallvec::SmallVec;

// ============================================================================
// SUB LIST
// ============================================================================

/// The tuples `[from, to)` of a collection.
pub struct SubList<'a> {
    list: &'a dyn IndexedTuples,
    from: usize,
    to: usize,
}

impl<'a> SubList<'a> {
    pub fn new(list: &'a dyn IndexedTuples, from: usize, to: usize) -> Result<Self, CalcError> {
        if to > list.len() {
            return Err(CalcError::IndexOutOfBounds {
                index: to,
                len: list.len(),
            });
        }
        if from > to {
            return Err(CalcError::IndexOutOfBounds { index: from, len: to });
        }
        Ok(SubList { list, from, to })
    }

    /// A narrower range of the same underlying collection.
    pub fn sub_list(&self, from: usize, to: usize) -> Result<SubList<'a>, CalcError> {
        let inner = SubList::new(self, from, to)?;
        Ok(SubList {
            list: self.list,
            from: self.from + inner.from,
            to: self.from + inner.to,
        })
    }
}

impl TupleIterable for SubList<'_> {
    fn arity(&self) -> usize {
        self.list.arity()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for SubList<'_> {
    fn len(&self) -> usize {
        self.to - self.from
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        assert!(index < self.len(), "index {} out of bounds for length {}", index, self.len());
        self.list.get(column, self.from + index)
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Re-orders or sub-selects the columns of a collection.
pub struct ProjectedList<'a> {
    list: &'a dyn IndexedTuples,
    columns: SmallVec<[usize; 4]>,
}

impl<'a> ProjectedList<'a> {
    /// Column `c` of the view is column `columns[c]` of `list`.
    pub fn new(list: &'a dyn IndexedTuples, columns: &[usize]) -> Result<Self, CalcError> {
        if let Some(&bad) = columns.iter().find(|&&c| c >= list.arity()) {
            return Err(CalcError::IndexOutOfBounds {
                index: bad,
                len: list.arity(),
            });
        }
        Ok(ProjectedList {
            list,
            columns: SmallVec::from_slice(columns),
        })
    }
}

impl TupleIterable for ProjectedList<'_> {
    fn arity(&self) -> usize {
        self.columns.len()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for ProjectedList<'_> {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        self.list.get(self.columns[column], index)
    }
}

// ============================================================================
// SLICE
// ============================================================================

/// One column of a collection, as a list of 1-tuples.
pub struct Slice<'a> {
    list: &'a dyn IndexedTuples,
    column: usize,
}

impl<'a> Slice<'a> {
    /// # Panics
    /// Panics if `column >= list.arity()`.
    pub fn new(list: &'a dyn IndexedTuples, column: usize) -> Self {
        assert!(
            column < list.arity(),
            "column {} out of range for arity {}",
            column,
            list.arity()
        );
        Slice { list, column }
    }

    pub fn member(&self, index: usize) -> &'a Member {
        self.list.get(self.column, index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Member> + 'a {
        let list = self.list;
        let column = self.column;
        (0..list.len()).map(move |i| list.get(column, i))
    }

    pub fn to_vec(&self) -> Vec<Member> {
        self.iter().cloned().collect()
    }
}

impl TupleIterable for Slice<'_> {
    fn arity(&self) -> usize {
        1
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for Slice<'_> {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        assert_eq!(column, 0, "column {} out of range for arity 1", column);
        self.list.get(self.column, index)
    }
}

// ============================================================================
// POSITION CALLBACK
// ============================================================================

/// Passes through to a collection, calling back with the row index each
/// time a member is read.
pub struct PositionTracked<'a> {
    list: &'a dyn IndexedTuples,
    callback: &'a dyn Fn(usize),
}

impl<'a> PositionTracked<'a> {
    pub fn new(list: &'a dyn IndexedTuples, callback: &'a dyn Fn(usize)) -> Self {
        PositionTracked { list, callback }
    }
}

impl TupleIterable for PositionTracked<'_> {
    fn arity(&self) -> usize {
        self.list.arity()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for PositionTracked<'_> {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        (self.callback)(index);
        self.list.get(column, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{RowLimit, TupleList};
    use model::MemberKind;
    use std::cell::RefCell;

    fn m(h: &str, name: &str) -> Member {
        Member::new(h, name, None, 0, MemberKind::Regular)
    }

    fn names(list: &dyn TupleIterable) -> Vec<String> {
        list.tuple_iter()
            .map(|t| t.iter().map(|m| m.name()).collect::<Vec<_>>().join(","))
            .collect()
    }

    fn sample() -> TupleList {
        let mut list = TupleList::new(2, RowLimit::UNBOUNDED);
        for (p, t) in [("A", "X"), ("A", "Y"), ("B", "X")] {
            list.push(&[m("Product", p), m("Time", t)]).unwrap();
        }
        list
    }

    #[test]
    fn test_column_slices() {
        let list = sample();
        let first: Vec<_> = list.slice(0).iter().map(|m| m.name().to_string()).collect();
        let second: Vec<_> = list.slice(1).iter().map(|m| m.name().to_string()).collect();
        assert_eq!(first, vec!["A", "A", "B"]);
        assert_eq!(second, vec!["X", "Y", "X"]);
        assert_eq!(list.slice(1).member(1), &m("Time", "Y"));
    }

    #[test]
    fn test_projection_swaps_columns() {
        let list = sample();
        let projected = list.project(&[1, 0]).unwrap();
        assert_eq!(names(&projected), vec!["X,A", "Y,A", "X,B"]);

        let narrowed = list.project(&[1]).unwrap();
        assert_eq!(narrowed.arity(), 1);
        assert!(list.project(&[2]).is_err());
    }

    #[test]
    fn test_sub_list() {
        let list = sample();
        let sub = list.sub_list(1, 3).unwrap();
        assert_eq!(names(&sub), vec!["A,Y", "B,X"]);

        let nested = sub.sub_list(1, 2).unwrap();
        assert_eq!(names(&nested), vec!["B,X"]);
        assert!(list.sub_list(2, 4).is_err());
        assert!(list.sub_list(2, 1).is_err());
    }

    #[test]
    fn test_position_callback_sees_row_indexes() {
        let list = sample();
        let seen = RefCell::new(Vec::new());
        let record = |i: usize| seen.borrow_mut().push(i);
        let tracked = list.with_position_callback(&record);

        assert_eq!(tracked.get(1, 2), &m("Time", "X"));
        let _ = tracked.tuple_iter().count();
        // one read per member: 1 direct, then 2 columns x 3 rows
        assert_eq!(*seen.borrow(), vec![2, 0, 0, 1, 1, 2, 2]);
    }
}
