//! FILENAME: core/calc-engine/src/tuple/iterator.rs
//! Cursors and the cursor-to-iterator adapter.
//!
//! A cursor is the minimal thing to implement. `CursorIterator` layers the
//! peek-ahead `has_next`/`next` protocol on top of it. Because `has_next`
//! must advance the cursor to find out whether more data exists, the
//! adapter remembers whether it already did, so that mixing `has_next`,
//! `next` and `forward` never skips or repeats a tuple.

use super::{IndexedTuples, Tuple, TupleCursor};
use crate::error::CalcError;
use model::Member;
use std::iter::FusedIterator;

// ============================================================================
// INDEX CURSOR
// ============================================================================

/// Cursor over anything with random access.
pub struct IndexCursor<'a, L: IndexedTuples + ?Sized> {
    list: &'a L,
    next: usize,
    current: Option<usize>,
}

impl<'a, L: IndexedTuples + ?Sized> IndexCursor<'a, L> {
    pub fn new(list: &'a L) -> Self {
        IndexCursor {
            list,
            next: 0,
            current: None,
        }
    }

    /// Position of the current tuple.
    pub fn index(&self) -> Option<usize> {
        self.current
    }
}

impl<L: IndexedTuples + ?Sized> TupleCursor for IndexCursor<'_, L> {
    fn arity(&self) -> usize {
        self.list.arity()
    }

    fn forward(&mut self) -> bool {
        if self.next < self.list.len() {
            self.current = Some(self.next);
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn member(&self, column: usize) -> &Member {
        let index = self.current.expect("cursor is not positioned on a tuple");
        self.list.get(column, index)
    }
}

// ============================================================================
// ITERATOR CURSOR
// ============================================================================

/// Cursor over a plain iterator of tuples.
pub struct IteratorCursor<I: Iterator<Item = Tuple>> {
    arity: usize,
    iter: I,
    current: Option<Tuple>,
}

impl<I: Iterator<Item = Tuple>> IteratorCursor<I> {
    pub fn new(arity: usize, iter: I) -> Self {
        IteratorCursor {
            arity,
            iter,
            current: None,
        }
    }
}

impl<I: Iterator<Item = Tuple>> TupleCursor for IteratorCursor<I> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn forward(&mut self) -> bool {
        self.current = self.iter.next();
        if let Some(t) = &self.current {
            debug_assert_eq!(t.len(), self.arity, "iterator produced a tuple of the wrong arity");
        }
        self.current.is_some()
    }

    fn member(&self, column: usize) -> &Member {
        &self.current.as_ref().expect("cursor is not positioned on a tuple")[column]
    }

    fn current(&self) -> Tuple {
        self.current.clone().expect("cursor is not positioned on a tuple")
    }
}

// ============================================================================
// CURSOR ITERATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Must call `forward` on the cursor to know whether data remains.
    Unknown,
    /// The cursor already sits on the next tuple.
    HasNext,
    EndOfData,
}

/// Iterator over a cursor. Also usable as a cursor itself.
pub struct CursorIterator<C: TupleCursor> {
    cursor: C,
    state: State,
}

/// The iterator every `TupleIterable` hands out.
pub type TupleIter<'a> = CursorIterator<Box<dyn TupleCursor + 'a>>;

impl<C: TupleCursor> CursorIterator<C> {
    pub fn new(cursor: C) -> Self {
        CursorIterator {
            cursor,
            state: State::Unknown,
        }
    }

    pub fn has_next(&mut self) -> bool {
        match self.state {
            State::Unknown => {
                if self.cursor.forward() {
                    self.state = State::HasNext;
                    true
                } else {
                    self.state = State::EndOfData;
                    false
                }
            }
            State::HasNext => true,
            State::EndOfData => false,
        }
    }

    /// Structural removal through an iterator is not supported.
    pub fn remove(&mut self) -> Result<(), CalcError> {
        Err(CalcError::Unsupported("remove through a tuple iterator"))
    }
}

impl<C: TupleCursor> Iterator for CursorIterator<C> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if !self.has_next() {
            return None;
        }
        self.state = State::Unknown;
        Some(self.cursor.current())
    }
}

impl<C: TupleCursor> FusedIterator for CursorIterator<C> {}

impl<C: TupleCursor> TupleCursor for CursorIterator<C> {
    fn arity(&self) -> usize {
        self.cursor.arity()
    }

    fn forward(&mut self) -> bool {
        match self.state {
            State::Unknown => {
                let moved = self.cursor.forward();
                if !moved {
                    self.state = State::EndOfData;
                }
                moved
            }
            // `has_next` already moved the cursor; consume that tuple.
            State::HasNext => {
                self.state = State::Unknown;
                true
            }
            State::EndOfData => false,
        }
    }

    fn member(&self, column: usize) -> &Member {
        self.cursor.member(column)
    }
}

// ============================================================================
// COLUMN ITERATOR
// ============================================================================

/// The members of one column of a tuple sequence.
pub struct ColumnIter<'a> {
    cursor: Box<dyn TupleCursor + 'a>,
    column: usize,
}

impl<'a> ColumnIter<'a> {
    pub fn new(cursor: Box<dyn TupleCursor + 'a>, column: usize) -> Self {
        ColumnIter { cursor, column }
    }
}

impl Iterator for ColumnIter<'_> {
    type Item = Member;

    fn next(&mut self) -> Option<Member> {
        if self.cursor.forward() {
            Some(self.cursor.member(self.column).clone())
        } else {
            None
        }
    }
}
