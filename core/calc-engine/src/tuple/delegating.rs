//! FILENAME: core/calc-engine/src/tuple/delegating.rs
//! Tuple list over a collection of rows owned elsewhere.
//!
//! Rows fetched from a source layer usually arrive as one vector per row.
//! This store takes them over as they are, without repacking. It also
//! backs the degenerate arity-0 list.

use super::iterator::IndexCursor;
use super::list::TupleStore;
use super::{IndexedTuples, RowLimit, Tuple, TupleCursor, TupleIterable};
use crate::error::CalcError;
use model::Member;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct DelegatingTupleList {
    arity: usize,
    rows: Vec<Vec<Member>>,
    limit: RowLimit,
}

impl DelegatingTupleList {
    pub fn new(arity: usize, limit: RowLimit) -> Self {
        DelegatingTupleList {
            arity,
            rows: Vec::new(),
            limit,
        }
    }

    /// Wraps `rows`. Every row must have length `arity`, and there may be
    /// no more rows than `limit` allows.
    pub fn from_rows(arity: usize, rows: Vec<Vec<Member>>, limit: RowLimit) -> Result<Self, CalcError> {
        if let Some(bad) = rows.iter().find(|r| r.len() != arity) {
            return Err(CalcError::ArityMismatch {
                expected: arity,
                actual: bad.len(),
            });
        }
        limit.check(rows.len())?;
        Ok(DelegatingTupleList { arity, rows, limit })
    }

    /// `count` empty tuples.
    pub fn empty_tuples(count: usize) -> Self {
        DelegatingTupleList {
            arity: 0,
            rows: vec![Vec::new(); count],
            limit: RowLimit::UNBOUNDED,
        }
    }

    pub fn limit(&self) -> RowLimit {
        self.limit
    }

    pub fn rows(&self) -> &[Vec<Member>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Member>> {
        self.rows
    }
}

impl TupleIterable for DelegatingTupleList {
    fn arity(&self) -> usize {
        self.arity
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for DelegatingTupleList {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        assert!(column < self.arity, "column {} out of range for arity {}", column, self.arity);
        &self.rows[index][column]
    }
}

impl TupleStore for DelegatingTupleList {
    fn row(&self, index: usize) -> &[Member] {
        &self.rows[index]
    }

    fn push_row(&mut self, row: &[Member]) -> Result<(), CalcError> {
        self.limit.check(self.rows.len() + 1)?;
        self.rows.push(row.to_vec());
        Ok(())
    }

    fn insert_row(&mut self, index: usize, row: &[Member]) -> Result<(), CalcError> {
        self.limit.check(self.rows.len() + 1)?;
        self.rows.insert(index, row.to_vec());
        Ok(())
    }

    fn set_row(&mut self, index: usize, row: &[Member]) -> Tuple {
        let previous = std::mem::replace(&mut self.rows[index], row.to_vec());
        previous.into_iter().collect()
    }

    fn remove_row(&mut self, index: usize) -> Tuple {
        self.rows.remove(index).into_iter().collect()
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn retain_rows(&mut self, keep: &mut dyn FnMut(&[Member]) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    fn sort_rows(&mut self, compare: &mut dyn FnMut(&[Member], &[Member]) -> Ordering) {
        self.rows.sort_by(|a, b| compare(a, b));
    }
}

/// The limit only bounds growth; it takes no part in equality.
impl PartialEq for DelegatingTupleList {
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity && self.rows == other.rows
    }
}

impl Eq for DelegatingTupleList {}

impl Hash for DelegatingTupleList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arity.hash(state);
        self.rows.hash(state);
    }
}
