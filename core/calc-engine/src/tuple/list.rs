//! FILENAME: core/calc-engine/src/tuple/list.rs
//! TupleList - the random-access tuple collection.
//!
//! A `TupleList` picks its storage from the arity at construction and
//! carries a mutability flag. Every mutator checks the flag first, then
//! validates the tuple length and index before touching the storage, so a
//! failed call leaves the list unchanged.

use super::array::ArrayTupleList;
use super::delegating::DelegatingTupleList;
use super::unary::UnaryTupleList;
use super::views::{PositionTracked, ProjectedList, Slice, SubList};
use super::{IndexedTuples, RowLimit, Tuple, TupleCursor, TupleIterable};
use crate::error::CalcError;
use model::Member;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// STORAGE
// ============================================================================

/// Operations every storage strategy provides. Callers have already
/// checked mutability, arity and bounds.
pub(crate) trait TupleStore: IndexedTuples + fmt::Debug + Send + Sync {
    fn row(&self, index: usize) -> &[Member];
    fn push_row(&mut self, row: &[Member]) -> Result<(), CalcError>;
    fn insert_row(&mut self, index: usize, row: &[Member]) -> Result<(), CalcError>;
    fn set_row(&mut self, index: usize, row: &[Member]) -> Tuple;
    fn remove_row(&mut self, index: usize) -> Tuple;
    fn clear(&mut self);
    fn retain_rows(&mut self, keep: &mut dyn FnMut(&[Member]) -> bool);
    fn sort_rows(&mut self, compare: &mut dyn FnMut(&[Member], &[Member]) -> Ordering);
}

#[derive(Debug, Clone)]
enum Storage {
    Unary(UnaryTupleList),
    Array(ArrayTupleList),
    Delegating(DelegatingTupleList),
}

impl Storage {
    fn store(&self) -> &dyn TupleStore {
        match self {
            Storage::Unary(s) => s,
            Storage::Array(s) => s,
            Storage::Delegating(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn TupleStore {
        match self {
            Storage::Unary(s) => s,
            Storage::Array(s) => s,
            Storage::Delegating(s) => s,
        }
    }
}

// ============================================================================
// TUPLE LIST
// ============================================================================

#[derive(Debug, Clone)]
pub struct TupleList {
    storage: Storage,
    mutable: bool,
    limit: RowLimit,
}

impl TupleList {
    /// Creates an empty, mutable list with the storage suited to `arity`.
    pub fn new(arity: usize, limit: RowLimit) -> Self {
        TupleList::with_capacity(arity, 0, limit)
    }

    /// Like `new`, reserving room for `rows` tuples (clamped to the limit).
    pub fn with_capacity(arity: usize, rows: usize, limit: RowLimit) -> Self {
        let storage = match arity {
            0 => Storage::Delegating(DelegatingTupleList::new(0, limit)),
            1 => Storage::Unary(UnaryTupleList::with_capacity(rows, limit)),
            _ => Storage::Array(ArrayTupleList::with_capacity(arity, rows, limit)),
        };
        TupleList {
            storage,
            mutable: true,
            limit,
        }
    }

    /// A mutable list of 1-tuples that takes ownership of `members`.
    pub fn from_members(members: Vec<Member>, limit: RowLimit) -> Result<Self, CalcError> {
        Ok(TupleList {
            storage: Storage::Unary(UnaryTupleList::from_members(members, limit)?),
            mutable: true,
            limit,
        })
    }

    /// Wraps externally produced rows without repacking them. Fails if
    /// there are more rows than `limit` allows.
    pub fn from_rows(arity: usize, rows: Vec<Vec<Member>>, limit: RowLimit) -> Result<Self, CalcError> {
        Ok(DelegatingTupleList::from_rows(arity, rows, limit)?.into())
    }

    /// An immutable empty list.
    pub fn empty(arity: usize) -> Self {
        TupleList::new(arity, RowLimit::UNBOUNDED).into_fixed()
    }

    pub fn limit(&self) -> RowLimit {
        self.limit
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Makes the list read-only. There is no way back; use `clone_list`
    /// to get a mutable copy.
    pub fn fix(&mut self) {
        self.mutable = false;
    }

    pub fn into_fixed(mut self) -> Self {
        self.fix();
        self
    }

    /// A new mutable list of the same arity and limit.
    ///
    /// With a negative `capacity`, the copy holds this list's tuples;
    /// otherwise it is empty with room for `capacity` tuples.
    pub fn clone_list(&self, capacity: isize) -> TupleList {
        match usize::try_from(capacity) {
            Ok(rows) => TupleList::with_capacity(self.arity(), rows, self.limit),
            Err(_) => TupleList {
                storage: self.storage.clone(),
                mutable: true,
                limit: self.limit,
            },
        }
    }

    fn store(&self) -> &dyn TupleStore {
        self.storage.store()
    }

    fn check_mutable(&self) -> Result<(), CalcError> {
        if !self.mutable {
            return Err(CalcError::ImmutableList);
        }
        Ok(())
    }

    fn store_mut(&mut self) -> Result<&mut dyn TupleStore, CalcError> {
        self.check_mutable()?;
        Ok(self.storage.store_mut())
    }

    fn check_arity(&self, row: &[Member]) -> Result<(), CalcError> {
        if row.len() != self.arity() {
            return Err(CalcError::ArityMismatch {
                expected: self.arity(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), CalcError> {
        if index >= len {
            return Err(CalcError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    /// Appends a tuple.
    pub fn push(&mut self, tuple: &[Member]) -> Result<(), CalcError> {
        self.check_mutable()?;
        self.check_arity(tuple)?;
        self.store_mut()?.push_row(tuple)
    }

    /// Appends the tuple a cursor is positioned on.
    pub fn add_current(&mut self, cursor: &dyn TupleCursor) -> Result<(), CalcError> {
        self.check_mutable()?;
        if cursor.arity() != self.arity() {
            return Err(CalcError::ArityMismatch {
                expected: self.arity(),
                actual: cursor.arity(),
            });
        }
        let row: Tuple = cursor.current();
        self.store_mut()?.push_row(&row)
    }

    /// Appends every tuple of `source`. Stops at the first failure; tuples
    /// already appended stay.
    pub fn extend_from(&mut self, source: &dyn TupleIterable) -> Result<(), CalcError> {
        let mut cursor = source.tuple_cursor();
        while cursor.forward() {
            self.add_current(&*cursor)?;
        }
        Ok(())
    }

    /// Replaces the tuple at `index`, returning the old one.
    pub fn set(&mut self, index: usize, tuple: &[Member]) -> Result<Tuple, CalcError> {
        self.check_mutable()?;
        self.check_arity(tuple)?;
        self.check_index(index, self.len())?;
        Ok(self.store_mut()?.set_row(index, tuple))
    }

    /// Inserts a tuple before `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, tuple: &[Member]) -> Result<(), CalcError> {
        self.check_mutable()?;
        self.check_arity(tuple)?;
        self.check_index(index, self.len() + 1)?;
        self.store_mut()?.insert_row(index, tuple)
    }

    pub fn remove(&mut self, index: usize) -> Result<Tuple, CalcError> {
        self.check_mutable()?;
        self.check_index(index, self.len())?;
        Ok(self.store_mut()?.remove_row(index))
    }

    pub fn clear(&mut self) -> Result<(), CalcError> {
        self.store_mut()?.clear();
        Ok(())
    }

    /// Keeps only the tuples for which `keep` returns true, in order.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<(), CalcError>
    where
        F: FnMut(&[Member]) -> bool,
    {
        self.store_mut()?.retain_rows(&mut keep);
        Ok(())
    }

    /// Stable sort of the tuples.
    pub fn sort_by<F>(&mut self, mut compare: F) -> Result<(), CalcError>
    where
        F: FnMut(&[Member], &[Member]) -> Ordering,
    {
        self.store_mut()?.sort_rows(&mut compare);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// The tuple at `index` as a borrowed row.
    pub fn row(&self, index: usize) -> Option<&[Member]> {
        if index >= self.len() {
            return None;
        }
        Some(self.store().row(index))
    }

    /// All tuples as borrowed rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Member]> + '_ {
        let store = self.store();
        (0..store.len()).map(move |i| store.row(i))
    }

    pub fn index_of(&self, tuple: &[Member]) -> Option<usize> {
        if tuple.len() != self.arity() {
            return None;
        }
        self.rows().position(|row| row == tuple)
    }

    pub fn contains(&self, tuple: &[Member]) -> bool {
        self.index_of(tuple).is_some()
    }

    pub fn to_tuples(&self) -> Vec<Tuple> {
        self.rows().map(|row| row.iter().cloned().collect()).collect()
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Random-access view of one column.
    ///
    /// # Panics
    /// Panics if `column >= arity`.
    pub fn slice(&self, column: usize) -> Slice<'_> {
        Slice::new(self, column)
    }

    /// The tuples in `[from, to)`.
    pub fn sub_list(&self, from: usize, to: usize) -> Result<SubList<'_>, CalcError> {
        SubList::new(self, from, to)
    }

    /// A view whose tuple `i` is `(t[columns[0]], t[columns[1]], ...)` for
    /// tuple `t` of this list.
    pub fn project(&self, columns: &[usize]) -> Result<ProjectedList<'_>, CalcError> {
        ProjectedList::new(self, columns)
    }

    /// A view that reports the row index of every member read through it.
    pub fn with_position_callback<'a>(&'a self, callback: &'a dyn Fn(usize)) -> PositionTracked<'a> {
        PositionTracked::new(self, callback)
    }
}

impl TupleIterable for TupleList {
    fn arity(&self) -> usize {
        self.store().arity()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        self.store().tuple_cursor()
    }
}

impl IndexedTuples for TupleList {
    fn len(&self) -> usize {
        self.store().len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        self.store().get(column, index)
    }
}

impl From<UnaryTupleList> for TupleList {
    fn from(list: UnaryTupleList) -> Self {
        let limit = list.limit();
        TupleList {
            storage: Storage::Unary(list),
            mutable: true,
            limit,
        }
    }
}

impl From<ArrayTupleList> for TupleList {
    fn from(list: ArrayTupleList) -> Self {
        let limit = list.limit();
        TupleList {
            storage: Storage::Array(list),
            mutable: true,
            limit,
        }
    }
}

impl From<DelegatingTupleList> for TupleList {
    fn from(list: DelegatingTupleList) -> Self {
        let limit = list.limit();
        TupleList {
            storage: Storage::Delegating(list),
            mutable: true,
            limit,
        }
    }
}

/// Lists are equal when they hold the same tuples in the same order,
/// whatever their storage, capacity or mutability.
impl PartialEq for TupleList {
    fn eq(&self, other: &Self) -> bool {
        self.arity() == other.arity()
            && self.len() == other.len()
            && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

impl Eq for TupleList {}

impl Hash for TupleList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arity().hash(state);
        self.len().hash(state);
        for row in self.rows() {
            row.hash(state);
        }
    }
}

/// Serializes as an array of rows of member unique names.
impl Serialize for TupleList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::MemberKind;
    use std::collections::hash_map::DefaultHasher;

    fn m(h: &str, name: &str) -> Member {
        Member::new(h, name, None, 0, MemberKind::Regular)
    }

    fn pair(a: &str, b: &str) -> [Member; 2] {
        [m("Product", a), m("Time", b)]
    }

    fn hash_of(list: &TupleList) -> u64 {
        let mut hasher = DefaultHasher::new();
        list.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_storage_chosen_by_arity() {
        assert!(matches!(TupleList::new(0, RowLimit::UNBOUNDED).storage, Storage::Delegating(_)));
        assert!(matches!(TupleList::new(1, RowLimit::UNBOUNDED).storage, Storage::Unary(_)));
        assert!(matches!(TupleList::new(3, RowLimit::UNBOUNDED).storage, Storage::Array(_)));
    }

    #[test]
    fn test_arity_mismatch_leaves_list_unchanged() {
        let mut list = TupleList::new(2, RowLimit::UNBOUNDED);
        list.push(&pair("A", "X")).unwrap();

        let err = list.push(&[m("Product", "B")]).unwrap_err();
        assert_eq!(err, CalcError::ArityMismatch { expected: 2, actual: 1 });
        let err = list.insert(0, &[m("Product", "B")]).unwrap_err();
        assert_eq!(err, CalcError::ArityMismatch { expected: 2, actual: 1 });
        assert_eq!(list.len(), 1);
        assert_eq!(list.row(0), Some(&pair("A", "X")[..]));
    }

    #[test]
    fn test_immutable_list_rejects_every_mutator() {
        let mut list = TupleList::new(2, RowLimit::UNBOUNDED);
        list.push(&pair("A", "X")).unwrap();
        list.fix();

        assert_eq!(list.push(&pair("B", "Y")), Err(CalcError::ImmutableList));
        assert_eq!(list.set(0, &pair("B", "Y")), Err(CalcError::ImmutableList));
        assert_eq!(list.insert(0, &pair("B", "Y")), Err(CalcError::ImmutableList));
        assert_eq!(list.remove(0), Err(CalcError::ImmutableList));
        assert_eq!(list.clear(), Err(CalcError::ImmutableList));
        assert_eq!(list.retain(|_| false), Err(CalcError::ImmutableList));
        assert_eq!(list.len(), 1);

        // mutability is reported before arity or bounds
        assert_eq!(list.set(7, &[m("Product", "B")]), Err(CalcError::ImmutableList));
        assert_eq!(list.insert(7, &pair("B", "Y")), Err(CalcError::ImmutableList));
        assert_eq!(list.remove(7), Err(CalcError::ImmutableList));
        assert_eq!(list.push(&[]), Err(CalcError::ImmutableList));
    }

    #[test]
    fn test_empty_tuples_respect_limit() {
        let mut list = TupleList::new(0, RowLimit::new(1));
        list.push(&[]).unwrap();
        for _ in 0..4 {
            assert!(list.push(&[]).unwrap_err().is_limit_exceeded());
        }
        assert!(list.insert(0, &[]).unwrap_err().is_limit_exceeded());
        assert_eq!(list.len(), 1);
        assert_eq!(list.limit().rows(), Some(1));
    }

    #[test]
    fn test_from_rows_honours_limit() {
        let rows: Vec<Vec<Member>> = (0..5).map(|i| pair(&i.to_string(), "X").to_vec()).collect();
        let err = TupleList::from_rows(2, rows.clone(), RowLimit::new(2)).unwrap_err();
        assert!(err.is_limit_exceeded());

        let mut list = TupleList::from_rows(2, rows, RowLimit::new(6)).unwrap();
        assert_eq!(list.limit(), RowLimit::new(6));
        list.push(&pair("5", "X")).unwrap();
        assert!(list.push(&pair("6", "X")).unwrap_err().is_limit_exceeded());
        assert_eq!(list.len(), 6);
    }

    #[test]
    fn test_clone_list() {
        let mut list = TupleList::new(2, RowLimit::new(10));
        list.push(&pair("A", "X")).unwrap();
        list.push(&pair("B", "Y")).unwrap();
        let list = list.into_fixed();

        let mut copy = list.clone_list(-1);
        assert!(copy.is_mutable());
        assert_eq!(copy, list);
        copy.remove(0).unwrap();
        assert_eq!(list.len(), 2);

        let empty = list.clone_list(5);
        assert!(empty.is_mutable());
        assert!(empty.is_empty());
        assert_eq!(empty.arity(), 2);
        assert_eq!(empty.limit(), RowLimit::new(10));
    }

    #[test]
    fn test_bounds_checked() {
        let mut list = TupleList::new(1, RowLimit::UNBOUNDED);
        assert_eq!(list.remove(0), Err(CalcError::IndexOutOfBounds { index: 0, len: 0 }));
        list.insert(0, &[m("P", "a")]).unwrap();
        assert_eq!(
            list.insert(3, &[m("P", "b")]),
            Err(CalcError::IndexOutOfBounds { index: 3, len: 2 })
        );
        assert_eq!(list.row(1), None);
    }

    #[test]
    fn test_equality_across_storages() {
        let mut packed = TupleList::new(2, RowLimit::UNBOUNDED);
        packed.push(&pair("A", "X")).unwrap();
        packed.push(&pair("B", "Y")).unwrap();

        let delegating = TupleList::from_rows(
            2,
            vec![pair("A", "X").to_vec(), pair("B", "Y").to_vec()],
            RowLimit::UNBOUNDED,
        )
        .unwrap();

        assert_eq!(packed, delegating);
        assert_eq!(hash_of(&packed), hash_of(&delegating));
    }

    #[test]
    fn test_index_of_and_contains() {
        let mut list = TupleList::new(2, RowLimit::UNBOUNDED);
        list.push(&pair("A", "X")).unwrap();
        list.push(&pair("B", "Y")).unwrap();

        assert_eq!(list.index_of(&pair("B", "Y")), Some(1));
        assert!(!list.contains(&pair("B", "X")));
        assert!(!list.contains(&[m("Product", "A")]));
    }

    #[test]
    fn test_retain_and_sort() {
        let mut list = TupleList::new(1, RowLimit::UNBOUNDED);
        for name in ["d", "a", "c", "b"] {
            list.push(&[m("P", name)]).unwrap();
        }
        list.retain(|row| row[0].name() != "c").unwrap();
        list.sort_by(|a, b| b[0].name().cmp(a[0].name())).unwrap();

        let names: Vec<_> = list.rows().map(|r| r[0].name().to_string()).collect();
        assert_eq!(names, vec!["d", "b", "a"]);
    }

    #[test]
    fn test_limit_exceeded_aborts_extend() {
        let mut source = TupleList::new(2, RowLimit::UNBOUNDED);
        for i in 0..5 {
            source.push(&pair(&i.to_string(), "X")).unwrap();
        }
        let mut target = TupleList::new(2, RowLimit::new(3));
        let err = target.extend_from(&source).unwrap_err();
        assert!(err.is_limit_exceeded());
        assert_eq!(target.len(), 3);
    }

    #[test]
    fn test_serialize_as_unique_names() {
        let mut list = TupleList::new(2, RowLimit::UNBOUNDED);
        list.push(&pair("A", "X")).unwrap();
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"[["[Product].[A]","[Time].[X]"]]"#);
    }

    #[test]
    fn test_empty_is_immutable() {
        let mut list = TupleList::empty(1);
        assert!(!list.is_mutable());
        assert_eq!(list.push(&[m("P", "a")]), Err(CalcError::ImmutableList));
    }
}
