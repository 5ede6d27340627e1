//! FILENAME: core/calc-engine/src/tuple/materialize.rs
//! Turning iterables into lists.
//!
//! Eager materialization walks a source once and packs every tuple into a
//! new list. `LazyTupleList` defers that walk until the first operation
//! that needs random access; until then iteration reads the source.

use super::iterator::IteratorCursor;
use super::views::{Slice, SubList};
use super::{IndexedTuples, RowLimit, Tuple, TupleCursor, TupleIterable, TupleList};
use crate::error::CalcError;
use model::Member;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// An iterable that can be handed between calcs and threads.
pub type SharedIterable = Arc<dyn TupleIterable + Send + Sync>;

/// Walks `source` once and packs its tuples into a new mutable list.
///
/// Fails with a resource-limit error as soon as the list would exceed
/// `limit`; nothing is returned in that case.
pub fn materialize(source: &dyn TupleIterable, limit: RowLimit) -> Result<TupleList, CalcError> {
    let mut list = TupleList::new(source.arity(), limit);
    let mut cursor = source.tuple_cursor();
    while cursor.forward() {
        list.add_current(&*cursor)?;
    }
    log::trace!("materialized {} tuples of arity {}", list.len(), list.arity());
    Ok(list)
}

// ============================================================================
// LAZY LIST
// ============================================================================

/// A read-only list that materializes its source on first random access.
///
/// Once materialized it stays materialized, and iteration switches to the
/// packed list. Every mutator fails with `ImmutableList`.
pub struct LazyTupleList {
    source: SharedIterable,
    list: OnceLock<TupleList>,
    /// Held while the source is walked, so racing first accesses walk it once.
    building: Mutex<()>,
    limit: RowLimit,
}

impl LazyTupleList {
    pub fn new(source: SharedIterable, limit: RowLimit) -> Self {
        LazyTupleList {
            source,
            list: OnceLock::new(),
            building: Mutex::new(()),
            limit,
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.list.get().is_some()
    }

    /// The materialized list, building it on the first call.
    pub fn list(&self) -> Result<&TupleList, CalcError> {
        if let Some(list) = self.list.get() {
            return Ok(list);
        }
        let _building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = self.list.get() {
            return Ok(list);
        }
        let list = materialize(&*self.source, self.limit)?.into_fixed();
        log::debug!("lazy tuple list materialized with {} tuples", list.len());
        Ok(self.list.get_or_init(|| list))
    }

    /// Materializes and returns the list.
    pub fn into_list(self) -> Result<TupleList, CalcError> {
        self.list()?;
        self.list
            .into_inner()
            .ok_or_else(|| CalcError::Evaluation("lazy tuple list was not materialized".to_string()))
    }

    pub fn len(&self) -> Result<usize, CalcError> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CalcError> {
        Ok(self.list()?.is_empty())
    }

    pub fn get(&self, column: usize, index: usize) -> Result<&Member, CalcError> {
        let list = self.list()?;
        if index >= list.len() {
            return Err(CalcError::IndexOutOfBounds {
                index,
                len: list.len(),
            });
        }
        Ok(list.get(column, index))
    }

    pub fn tuple(&self, index: usize) -> Result<Option<Tuple>, CalcError> {
        Ok(self.list()?.tuple(index))
    }

    pub fn sub_list(&self, from: usize, to: usize) -> Result<SubList<'_>, CalcError> {
        self.list()?.sub_list(from, to)
    }

    pub fn slice(&self, column: usize) -> Result<Slice<'_>, CalcError> {
        Ok(self.list()?.slice(column))
    }

    pub fn push(&mut self, _tuple: &[Member]) -> Result<(), CalcError> {
        Err(CalcError::ImmutableList)
    }

    pub fn set(&mut self, _index: usize, _tuple: &[Member]) -> Result<Tuple, CalcError> {
        Err(CalcError::ImmutableList)
    }

    pub fn insert(&mut self, _index: usize, _tuple: &[Member]) -> Result<(), CalcError> {
        Err(CalcError::ImmutableList)
    }

    pub fn remove(&mut self, _index: usize) -> Result<Tuple, CalcError> {
        Err(CalcError::ImmutableList)
    }

    pub fn clear(&mut self) -> Result<(), CalcError> {
        Err(CalcError::ImmutableList)
    }
}

impl TupleIterable for LazyTupleList {
    fn arity(&self) -> usize {
        self.source.arity()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        match self.list.get() {
            Some(list) => list.tuple_cursor(),
            None => self.source.tuple_cursor(),
        }
    }
}

impl fmt::Debug for LazyTupleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTupleList")
            .field("arity", &self.arity())
            .field("materialized", &self.is_materialized())
            .field("limit", &self.limit)
            .finish()
    }
}

// ============================================================================
// ITERABLE FROM A FACTORY
// ============================================================================

/// A restartable iterable: every cursor calls the factory for a fresh
/// iterator.
pub struct FnTupleIterable<F> {
    arity: usize,
    factory: F,
}

impl<F, I> FnTupleIterable<F>
where
    F: Fn() -> I,
    I: Iterator<Item = Tuple> + 'static,
{
    pub fn new(arity: usize, factory: F) -> Self {
        FnTupleIterable { arity, factory }
    }
}

impl<F, I> TupleIterable for FnTupleIterable<F>
where
    F: Fn() -> I,
    I: Iterator<Item = Tuple> + 'static,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IteratorCursor::new(self.arity, (self.factory)()))
    }
}
