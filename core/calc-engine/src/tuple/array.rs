//! FILENAME: core/calc-engine/src/tuple/array.rs
//! Packed storage for tuples of arity two and more.
//!
//! All members live end to end in one vector: tuple `i` occupies slots
//! `[i * arity, i * arity + arity)`. There is no per-tuple allocation, and
//! walking the list walks memory in order.
//!
//! Growth is explicit and bounded: every request for more slots is checked
//! against `result_limit * arity`, so a cross join that explodes fails fast
//! with a resource-limit error instead of exhausting memory.

use super::iterator::IndexCursor;
use super::list::TupleStore;
use super::{IndexedTuples, RowLimit, Tuple, TupleCursor, TupleIterable};
use crate::error::CalcError;
use model::Member;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct ArrayTupleList {
    arity: usize,
    /// Packed members. `data.len() == size * arity` at all times.
    data: Vec<Member>,
    /// Slots reserved by the growth policy.
    capacity: usize,
    limit: RowLimit,
}

impl ArrayTupleList {
    /// # Panics
    /// Panics if `arity` is zero.
    pub fn new(arity: usize, limit: RowLimit) -> Self {
        ArrayTupleList::with_capacity(arity, 0, limit)
    }

    /// Creates a list with room for `rows` tuples. The reservation is
    /// clamped to the row limit.
    pub fn with_capacity(arity: usize, rows: usize, limit: RowLimit) -> Self {
        assert!(arity > 0, "packed tuple lists need a positive arity");
        let mut capacity = rows.saturating_mul(arity);
        if let Some(ceiling) = limit.ceiling(arity) {
            capacity = capacity.min(ceiling);
        }
        ArrayTupleList {
            arity,
            data: Vec::with_capacity(capacity),
            capacity,
            limit,
        }
    }

    /// Number of tuples.
    pub fn size(&self) -> usize {
        self.data.len() / self.arity
    }

    /// Slots reserved for members, used or not.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn limit(&self) -> RowLimit {
        self.limit
    }

    /// The packed backing members.
    pub fn as_slice(&self) -> &[Member] {
        &self.data
    }

    /// Makes room for `min_capacity` member slots.
    ///
    /// New capacity is `old * 3 / 2 + 1` (or the minimum, if larger),
    /// rounded up to a whole number of tuples and capped at the ceiling.
    fn ensure_capacity(&mut self, min_capacity: usize) -> Result<(), CalcError> {
        let ceiling = self.limit.ceiling(self.arity);
        if let Some(ceiling) = ceiling {
            if min_capacity > ceiling {
                self.limit.check(min_capacity.div_ceil(self.arity))?;
            }
        }
        if min_capacity <= self.capacity {
            return Ok(());
        }

        let mut new_capacity = self.capacity.saturating_mul(3) / 2 + 1;
        if new_capacity < min_capacity {
            new_capacity = min_capacity;
        }
        let rem = new_capacity % self.arity;
        if rem != 0 {
            new_capacity = new_capacity.saturating_add(self.arity - rem);
        }
        if let Some(ceiling) = ceiling {
            new_capacity = new_capacity.min(ceiling);
        }

        self.data.reserve_exact(new_capacity - self.data.len());
        self.capacity = new_capacity;
        Ok(())
    }

    fn offset(&self, column: usize, index: usize) -> usize {
        index * self.arity + column
    }

    fn range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.arity;
        start..start + self.arity
    }
}

impl TupleIterable for ArrayTupleList {
    fn arity(&self) -> usize {
        self.arity
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for ArrayTupleList {
    fn len(&self) -> usize {
        self.size()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        assert!(column < self.arity, "column {} out of range for arity {}", column, self.arity);
        &self.data[self.offset(column, index)]
    }
}

impl TupleStore for ArrayTupleList {
    fn row(&self, index: usize) -> &[Member] {
        &self.data[self.range(index)]
    }

    fn push_row(&mut self, row: &[Member]) -> Result<(), CalcError> {
        self.ensure_capacity(self.data.len() + self.arity)?;
        self.data.extend_from_slice(row);
        Ok(())
    }

    fn insert_row(&mut self, index: usize, row: &[Member]) -> Result<(), CalcError> {
        self.ensure_capacity(self.data.len() + self.arity)?;
        let start = index * self.arity;
        // Shifts the tail up by one tuple.
        self.data.splice(start..start, row.iter().cloned());
        Ok(())
    }

    fn set_row(&mut self, index: usize, row: &[Member]) -> Tuple {
        let range = self.range(index);
        let previous = self.data[range.clone()].iter().cloned().collect();
        self.data[range].clone_from_slice(row);
        previous
    }

    fn remove_row(&mut self, index: usize) -> Tuple {
        let range = self.range(index);
        self.data.drain(range).collect()
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn retain_rows(&mut self, keep: &mut dyn FnMut(&[Member]) -> bool) {
        let mut kept = Vec::with_capacity(self.capacity);
        for row in self.data.chunks_exact(self.arity) {
            if keep(row) {
                kept.extend_from_slice(row);
            }
        }
        self.data = kept;
    }

    fn sort_rows(&mut self, compare: &mut dyn FnMut(&[Member], &[Member]) -> Ordering) {
        let arity = self.arity;
        let mut order: Vec<usize> = (0..self.size()).collect();
        order.sort_by(|&a, &b| {
            compare(
                &self.data[a * arity..a * arity + arity],
                &self.data[b * arity..b * arity + arity],
            )
        });
        let mut sorted = Vec::with_capacity(self.capacity);
        for i in order {
            sorted.extend_from_slice(&self.data[i * arity..i * arity + arity]);
        }
        self.data = sorted;
    }
}

/// Equal when arity, size and packed contents match; spare capacity is
/// not compared.
impl PartialEq for ArrayTupleList {
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity && self.size() == other.size() && self.data == other.data
    }
}

impl Eq for ArrayTupleList {}

impl Hash for ArrayTupleList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arity.hash(state);
        self.size().hash(state);
        self.data.hash(state);
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

    fn hash_of(list: &ArrayTupleList) -> u64 {
        let mut hasher = DefaultHasher::new();
        list.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_packed_layout() {
        let mut list = ArrayTupleList::new(2, RowLimit::UNBOUNDED);
        list.push_row(&[m("P", "A"), m("T", "X")]).unwrap();
        list.push_row(&[m("P", "B"), m("T", "Y")]).unwrap();

        assert_eq!(list.size(), 2);
        assert_eq!(list.as_slice().len(), 4);
        assert_eq!(list.get(0, 1), &m("P", "B"));
        assert_eq!(list.get(1, 0), &m("T", "X"));
        assert_eq!(list.row(1), &[m("P", "B"), m("T", "Y")]);
    }

    #[test]
    fn test_capacity_grows_in_whole_tuples() {
        let mut list = ArrayTupleList::new(3, RowLimit::UNBOUNDED);
        for i in 0..10 {
            list.push_row(&[m("A", &i.to_string()), m("B", "b"), m("C", "c")]).unwrap();
            assert_eq!(list.capacity() % 3, 0);
            assert!(list.capacity() >= list.as_slice().len());
        }
    }

    #[test]
    fn test_growth_sequence() {
        let mut list = ArrayTupleList::new(2, RowLimit::UNBOUNDED);
        list.ensure_capacity(2).unwrap();
        assert_eq!(list.capacity(), 2);
        // 2 * 3 / 2 + 1 = 4
        list.ensure_capacity(3).unwrap();
        assert_eq!(list.capacity(), 4);
        // 4 * 3 / 2 + 1 = 7, rounded up to 8
        list.ensure_capacity(5).unwrap();
        assert_eq!(list.capacity(), 8);
        // the requested minimum wins when larger
        list.ensure_capacity(40).unwrap();
        assert_eq!(list.capacity(), 40);
    }

    #[test]
    fn test_limit_exceeded_on_push() {
        let mut list = ArrayTupleList::new(2, RowLimit::new(3));
        for i in 0..3 {
            list.push_row(&[m("A", &i.to_string()), m("B", "b")]).unwrap();
        }
        let err = list.push_row(&[m("A", "x"), m("B", "b")]).unwrap_err();
        assert_eq!(
            err,
            CalcError::LimitExceeded(crate::error::ResourceLimitError { attempted: 4, limit: 3 })
        );
        assert_eq!(list.size(), 3);
        assert!(list.capacity() <= 6);
    }

    #[test]
    fn test_initial_capacity_is_clamped() {
        let list = ArrayTupleList::with_capacity(2, 1_000, RowLimit::new(10));
        assert_eq!(list.capacity(), 20);
    }

    #[test]
    fn test_insert_and_remove_move_whole_tuples() {
        let mut list = ArrayTupleList::new(2, RowLimit::UNBOUNDED);
        list.push_row(&[m("A", "1"), m("B", "1")]).unwrap();
        list.push_row(&[m("A", "3"), m("B", "3")]).unwrap();
        list.insert_row(1, &[m("A", "2"), m("B", "2")]).unwrap();

        assert_eq!(list.get(0, 1), &m("A", "2"));
        assert_eq!(list.get(1, 2), &m("B", "3"));

        let removed = list.remove_row(0);
        assert_eq!(removed.as_slice(), &[m("A", "1"), m("B", "1")]);
        assert_eq!(list.size(), 2);
        assert_eq!(list.get(0, 0), &m("A", "2"));
    }

    #[test]
    fn test_equality_ignores_spare_capacity() {
        let mut a = ArrayTupleList::with_capacity(2, 100, RowLimit::UNBOUNDED);
        let mut b = ArrayTupleList::new(2, RowLimit::UNBOUNDED);
        for name in ["x", "y", "z"] {
            a.push_row(&[m("A", name), m("B", name)]).unwrap();
            b.push_row(&[m("A", name), m("B", name)]).unwrap();
        }
        assert_ne!(a.capacity(), b.capacity());
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_sort_rows() {
        let mut list = ArrayTupleList::new(2, RowLimit::UNBOUNDED);
        for name in ["c", "a", "b"] {
            list.push_row(&[m("A", name), m("B", name)]).unwrap();
        }
        list.sort_rows(&mut |a, b| a[0].name().cmp(b[0].name()));
        let names: Vec<_> = (0..3).map(|i| list.get(1, i).name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
