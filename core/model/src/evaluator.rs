//! FILENAME: core/model/src/evaluator.rs
//! PURPOSE: The evaluation context that compiled expressions run against.
//! CONTEXT: An evaluator holds one current member per cube hierarchy and
//! can read the cell at that position. Expressions move the context with
//! `set_context`, and take a private copy with `push` when they must not
//! disturb their caller's position.
//!
//! `MemoryEvaluator` is the in-memory implementation over a `FactTable`.

use crate::cell::CellValue;
use crate::cube::Cube;
use crate::fact_table::FactTable;
use crate::hierarchy::Hierarchy;
use crate::member::Member;
use std::sync::Arc;

/// The evaluation context contract consumed by compiled expressions.
pub trait Evaluator {
    /// The cube being queried.
    fn cube(&self) -> &Cube;

    /// The current member of `hierarchy`.
    ///
    /// # Panics
    /// Panics if the hierarchy does not belong to the cube.
    fn get_context(&self, hierarchy: &Hierarchy) -> &Member;

    /// Moves the context of the member's hierarchy to `member` and returns
    /// the member it replaced.
    fn set_context(&mut self, member: &Member) -> Member;

    /// Returns a new evaluator positioned at the same context. Changes made
    /// to the copy are not seen by `self`.
    fn push(&self) -> Box<dyn Evaluator>;

    /// Whether empty cells are being eliminated ("NON EMPTY" semantics).
    fn is_non_empty(&self) -> bool;

    fn set_non_empty(&mut self, non_empty: bool);

    /// The cell value at the current context.
    fn evaluate_current(&self) -> CellValue;

    /// The current member of every hierarchy, in cube order.
    fn members(&self) -> Vec<Member> {
        self.cube()
            .hierarchies()
            .iter()
            .map(|h| self.get_context(h).clone())
            .collect()
    }
}

/// Evaluator over an in-memory fact table.
#[derive(Debug, Clone)]
pub struct MemoryEvaluator {
    cube: Arc<Cube>,
    facts: Arc<FactTable>,
    context: Vec<Member>,
    non_empty: bool,
    /// How many frames deep this evaluator is; 0 for the root.
    depth: usize,
}

impl MemoryEvaluator {
    /// Creates an evaluator positioned at every hierarchy's default member.
    pub fn new(cube: Arc<Cube>, facts: Arc<FactTable>) -> Self {
        let context = cube.default_context();
        MemoryEvaluator {
            cube,
            facts,
            context,
            non_empty: false,
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Orders members from different hierarchies into a full coordinate,
    /// filling unspecified hierarchies from the default context.
    pub fn coordinate(cube: &Cube, members: &[Member]) -> Vec<Member> {
        let mut coordinate = cube.default_context();
        for m in members {
            if let Some(i) = cube.ordinal(m.hierarchy_name()) {
                coordinate[i] = m.clone();
            }
        }
        coordinate
    }
}

impl Evaluator for MemoryEvaluator {
    fn cube(&self) -> &Cube {
        &self.cube
    }

    fn get_context(&self, hierarchy: &Hierarchy) -> &Member {
        let i = self
            .cube
            .ordinal(hierarchy.name())
            .unwrap_or_else(|| panic!("hierarchy {} is not in cube {}", hierarchy, self.cube.name()));
        &self.context[i]
    }

    fn set_context(&mut self, member: &Member) -> Member {
        let i = self
            .cube
            .ordinal(member.hierarchy_name())
            .unwrap_or_else(|| panic!("member {} is not in cube {}", member, self.cube.name()));
        std::mem::replace(&mut self.context[i], member.clone())
    }

    fn push(&self) -> Box<dyn Evaluator> {
        let mut pushed = self.clone();
        pushed.depth += 1;
        Box::new(pushed)
    }

    fn is_non_empty(&self) -> bool {
        self.non_empty
    }

    fn set_non_empty(&mut self, non_empty: bool) {
        self.non_empty = non_empty;
    }

    fn evaluate_current(&self) -> CellValue {
        self.facts.value_at(&self.context)
    }

    fn members(&self) -> Vec<Member> {
        self.context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;

    fn setup() -> (MemoryEvaluator, Member, Member, Member) {
        let mut measures = HierarchyBuilder::measures();
        let sales = measures.add_member(None, "Sales");
        let mut product = HierarchyBuilder::new("Product");
        let food = product.add_member(None, "Food");
        let drink = product.add_member(None, "Drink");
        let cube = Arc::new(Cube::new("Sales", vec![measures.build(), product.build()]));

        let mut facts = FactTable::new(2);
        facts.set(MemoryEvaluator::coordinate(&cube, &[food.clone()]), CellValue::Number(10.0));
        facts.set(MemoryEvaluator::coordinate(&cube, &[drink.clone()]), CellValue::Number(5.0));

        (MemoryEvaluator::new(cube, Arc::new(facts)), sales, food, drink)
    }

    #[test]
    fn test_default_context_rolls_up() {
        let (ev, sales, _, _) = setup();
        let measures = ev.cube().hierarchy("Measures").unwrap().clone();
        assert_eq!(ev.get_context(&measures), &sales);
        assert_eq!(ev.evaluate_current(), CellValue::Number(15.0));
    }

    #[test]
    fn test_set_context_returns_previous() {
        let (mut ev, _, food, _) = setup();
        let previous = ev.set_context(&food);
        assert!(previous.is_all());
        assert_eq!(ev.evaluate_current(), CellValue::Number(10.0));
    }

    #[test]
    fn test_push_isolates_changes() {
        let (ev, _, _, drink) = setup();
        let mut pushed = ev.push();
        pushed.set_context(&drink);
        assert_eq!(pushed.evaluate_current(), CellValue::Number(5.0));
        assert_eq!(ev.evaluate_current(), CellValue::Number(15.0));
    }
}
