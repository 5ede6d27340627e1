//! FILENAME: core/calc-engine/src/tuple/unary.rs
//! Storage for lists of single members.

use super::iterator::IndexCursor;
use super::list::TupleStore;
use super::{IndexedTuples, RowLimit, Tuple, TupleCursor, TupleIterable};
use crate::error::CalcError;
use model::Member;
use smallvec::smallvec;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A flat vector of members. Each member is a 1-tuple; no per-row wrapper
/// is allocated until a caller asks for a `Tuple`.
#[derive(Debug, Clone)]
pub struct UnaryTupleList {
    members: Vec<Member>,
    limit: RowLimit,
}

impl UnaryTupleList {
    pub fn new(limit: RowLimit) -> Self {
        UnaryTupleList::with_capacity(0, limit)
    }

    pub fn with_capacity(rows: usize, limit: RowLimit) -> Self {
        let rows = match limit.rows() {
            Some(max) => rows.min(max),
            None => rows,
        };
        UnaryTupleList {
            members: Vec::with_capacity(rows),
            limit,
        }
    }

    /// Takes ownership of `members` as-is.
    pub fn from_members(members: Vec<Member>, limit: RowLimit) -> Result<Self, CalcError> {
        limit.check(members.len())?;
        Ok(UnaryTupleList { members, limit })
    }

    pub fn limit(&self) -> RowLimit {
        self.limit
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Member> {
        self.members
    }
}

impl TupleIterable for UnaryTupleList {
    fn arity(&self) -> usize {
        1
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(IndexCursor::new(self))
    }
}

impl IndexedTuples for UnaryTupleList {
    fn len(&self) -> usize {
        self.members.len()
    }

    fn get(&self, column: usize, index: usize) -> &Member {
        assert_eq!(column, 0, "column {} out of range for arity 1", column);
        &self.members[index]
    }
}

impl TupleStore for UnaryTupleList {
    fn row(&self, index: usize) -> &[Member] {
        std::slice::from_ref(&self.members[index])
    }

    fn push_row(&mut self, row: &[Member]) -> Result<(), CalcError> {
        self.limit.check(self.members.len() + 1)?;
        self.members.push(row[0].clone());
        Ok(())
    }

    fn insert_row(&mut self, index: usize, row: &[Member]) -> Result<(), CalcError> {
        self.limit.check(self.members.len() + 1)?;
        self.members.insert(index, row[0].clone());
        Ok(())
    }

    fn set_row(&mut self, index: usize, row: &[Member]) -> Tuple {
        let previous = std::mem::replace(&mut self.members[index], row[0].clone());
        smallvec![previous]
    }

    fn remove_row(&mut self, index: usize) -> Tuple {
        smallvec![self.members.remove(index)]
    }

    fn clear(&mut self) {
        self.members.clear();
    }

    fn retain_rows(&mut self, keep: &mut dyn FnMut(&[Member]) -> bool) {
        self.members.retain(|m| keep(std::slice::from_ref(m)));
    }

    fn sort_rows(&mut self, compare: &mut dyn FnMut(&[Member], &[Member]) -> Ordering) {
        self.members
            .sort_by(|a, b| compare(std::slice::from_ref(a), std::slice::from_ref(b)));
    }
}

impl PartialEq for UnaryTupleList {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for UnaryTupleList {}

impl Hash for UnaryTupleList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.members.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::MemberKind;

    fn m(name: &str) -> Member {
        Member::new("Product", name, None, 0, MemberKind::Regular)
    }

    #[test]
    fn test_members_are_one_tuples() {
        let mut list = UnaryTupleList::new(RowLimit::UNBOUNDED);
        list.push_row(&[m("Apple")]).unwrap();
        list.push_row(&[m("Pear")]).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.tuple(1).unwrap().as_slice(), &[m("Pear")]);
        assert_eq!(list.row(0), &[m("Apple")]);
    }

    #[test]
    fn test_limit_applies_to_members() {
        let mut list = UnaryTupleList::new(RowLimit::new(2));
        list.push_row(&[m("a")]).unwrap();
        list.push_row(&[m("b")]).unwrap();
        assert!(list.push_row(&[m("c")]).unwrap_err().is_limit_exceeded());
        assert_eq!(list.len(), 2);

        let err = UnaryTupleList::from_members(vec![m("a"), m("b"), m("c")], RowLimit::new(2));
        assert!(err.unwrap_err().is_limit_exceeded());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_second_column_panics() {
        let list = UnaryTupleList::from_members(vec![m("a")], RowLimit::UNBOUNDED).unwrap();
        list.get(1, 0);
    }
}
