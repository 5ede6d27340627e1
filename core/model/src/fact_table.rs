//! FILENAME: core/model/src/fact_table.rs
//! PURPOSE: Sparse in-memory storage of cube cells.
//! CONTEXT: Stands in for the relational source: facts are stored at full
//! coordinates (one member per cube hierarchy, in cube order). Reads at a
//! coordinate that contains non-leaf members roll up every fact underneath.
//! Like the spreadsheet grid it is modelled on, it stores only non-empty
//! cells.

use crate::cell::{CellError, CellValue};
use crate::member::Member;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct FactTable {
    /// Sparse storage: keys are full coordinates in cube hierarchy order.
    cells: FxHashMap<Vec<Member>, CellValue>,

    /// Number of members in every coordinate.
    width: usize,
}

impl FactTable {
    pub fn new(width: usize) -> Self {
        FactTable {
            cells: FxHashMap::default(),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stores a value at a full coordinate.
    ///
    /// # Panics
    /// Panics if the coordinate does not have one member per hierarchy.
    pub fn set(&mut self, coordinate: Vec<Member>, value: CellValue) {
        assert_eq!(coordinate.len(), self.width, "coordinate width mismatch");
        if value.is_empty() {
            self.cells.remove(&coordinate);
        } else {
            self.cells.insert(coordinate, value);
        }
    }

    /// The stored value at exactly this coordinate.
    pub fn get(&self, coordinate: &[Member]) -> Option<&CellValue> {
        self.cells.get(coordinate)
    }

    /// Reads a cell, rolling up all facts under the coordinate.
    /// Numbers are summed; a non-numeric fact under a non-leaf coordinate
    /// makes the roll-up a #VALUE error.
    pub fn value_at(&self, coordinate: &[Member]) -> CellValue {
        if let Some(value) = self.cells.get(coordinate) {
            return value.clone();
        }

        let mut sum = 0.0;
        let mut found = false;
        for (key, value) in &self.cells {
            let covered = coordinate
                .iter()
                .zip(key.iter())
                .all(|(c, k)| c.is_ancestor_or_self(k));
            if !covered {
                continue;
            }
            match value.as_number() {
                Some(n) => {
                    sum += n;
                    found = true;
                }
                None => return CellValue::Error(CellError::Value),
            }
        }

        if found {
            CellValue::Number(sum)
        } else {
            CellValue::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberKind;

    #[test]
    fn test_exact_and_rollup() {
        let all = Member::all("Product", "All Products");
        let food = Member::new("Product", "Food", Some(&all), 1, MemberKind::Regular);
        let apple = Member::new("Product", "Apple", Some(&food), 2, MemberKind::Regular);
        let bread = Member::new("Product", "Bread", Some(&food), 3, MemberKind::Regular);

        let mut facts = FactTable::new(1);
        facts.set(vec![apple.clone()], CellValue::Number(3.0));
        facts.set(vec![bread.clone()], CellValue::Number(4.0));

        assert_eq!(facts.value_at(&[apple]), CellValue::Number(3.0));
        assert_eq!(facts.value_at(&[food]), CellValue::Number(7.0));
        assert_eq!(facts.value_at(&[all]), CellValue::Number(7.0));
    }

    #[test]
    fn test_missing_is_empty() {
        let m = Member::new("Store", "USA", None, 0, MemberKind::Regular);
        let facts = FactTable::new(1);
        assert_eq!(facts.value_at(&[m]), CellValue::Empty);
    }

    #[test]
    fn test_setting_empty_clears() {
        let m = Member::new("Store", "USA", None, 0, MemberKind::Regular);
        let mut facts = FactTable::new(1);
        facts.set(vec![m.clone()], CellValue::Number(1.0));
        facts.set(vec![m], CellValue::Empty);
        assert!(facts.is_empty());
    }

    #[test]
    fn test_text_under_rollup_is_value_error() {
        let all = Member::all("Product", "All Products");
        let apple = Member::new("Product", "Apple", Some(&all), 1, MemberKind::Regular);
        let pear = Member::new("Product", "Pear", Some(&all), 1, MemberKind::Regular);

        let mut facts = FactTable::new(1);
        facts.set(vec![apple], CellValue::Number(3.0));
        facts.set(vec![pear.clone()], CellValue::Text("n/a".into()));

        assert_eq!(facts.value_at(&[pear]), CellValue::Text("n/a".into()));
        assert_eq!(facts.value_at(&[all]), CellValue::Error(CellError::Value));
    }
}
