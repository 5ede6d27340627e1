//! FILENAME: core/calc-engine/src/calc/set.rs
//! Set functions.
//!
//! Sets are produced as lists or, for cross joins, as iterables that
//! compute their tuples on the fly. Every list built here carries the
//! configured row limit, so an oversized result fails while it is being
//! built.

use super::dependency::{with_simplified_context, DependencyRule};
use super::leaf::evaluate_at;
use super::{CalcBase, CalcRef, IterCalc, ListCalc};
use crate::error::CalcError;
use crate::result_style::ResultStyle;
use crate::tuple::{
    IndexedTuples, RowLimit, SharedIterable, Tuple, TupleCursor, TupleIterable, TupleList,
};
use model::{Evaluator, Hierarchy, Member, Type};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

fn element_types(ty: &Type) -> Vec<Type> {
    match ty.element_type() {
        Some(Type::Tuple(elements)) => elements.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

// ============================================================================
// MEMBER SETS
// ============================================================================

/// `<Hierarchy>.Members`, all members including the all member.
pub fn hierarchy_members(hierarchy: &Hierarchy, limit: RowLimit) -> CalcRef {
    let base = CalcBase::new(
        "Members",
        "HierarchyMembersCalc",
        Type::set_of(Type::member_of(hierarchy)),
        ResultStyle::List,
    )
    .with_arg("hierarchy", hierarchy.unique_name());
    let h = hierarchy.clone();
    Arc::new(ListCalc::new(base, DependencyRule::Never, move |_| {
        Ok(TupleList::from_members(h.members().to_vec(), limit)?.into_fixed())
    }))
}

/// The members of `hierarchy` at `depth`.
pub fn level_members(hierarchy: &Hierarchy, depth: u32, limit: RowLimit) -> CalcRef {
    let level = hierarchy
        .level(depth)
        .map(|l| l.unique_name())
        .unwrap_or_else(|| format!("{}.<depth {}>", hierarchy.unique_name(), depth));
    let base = CalcBase::new(
        "Members",
        "LevelMembersCalc",
        Type::set_of(Type::member_of(hierarchy)),
        ResultStyle::List,
    )
    .with_arg("level", level);
    let h = hierarchy.clone();
    Arc::new(ListCalc::new(base, DependencyRule::Never, move |_| {
        Ok(TupleList::from_members(h.members_at_depth(depth), limit)?.into_fixed())
    }))
}

/// `<Member>.Children`
pub fn children(member: CalcRef, limit: RowLimit) -> CalcRef {
    let ty = Type::set_of(member.get_type().clone());
    let base = CalcBase::new("Children", "MemberChildrenCalc", ty, ResultStyle::MutableList)
        .with_children(vec![member.clone()]);
    Arc::new(ListCalc::new(base, DependencyRule::Children, move |ev| {
        let Some(m) = member.evaluate_member(ev)? else {
            return Ok(TupleList::new(1, limit));
        };
        let children = ev
            .cube()
            .hierarchy(m.hierarchy_name())
            .map(|h| h.children(&m))
            .unwrap_or_default();
        TupleList::from_members(children, limit)
    }))
}

/// `{e1, e2, ...}` over member or tuple calcs of the same arity.
///
/// Null elements are skipped.
///
/// Fails if there are no elements or their arities differ.
pub fn set_literal(elements: Vec<CalcRef>, limit: RowLimit) -> Result<CalcRef, CalcError> {
    let Some(first) = elements.first() else {
        return Err(CalcError::Unsupported("empty set literal"));
    };
    let element_type = first.get_type().clone();
    let arity = element_type.arity().max(1);
    if let Some(bad) = elements.iter().find(|e| e.get_type().arity().max(1) != arity) {
        return Err(CalcError::ArityMismatch {
            expected: arity,
            actual: bad.get_type().arity().max(1),
        });
    }
    let base = CalcBase::new("{}", "SetLiteralCalc", Type::set_of(element_type), ResultStyle::MutableList)
        .with_children(elements.clone());
    Ok(Arc::new(ListCalc::new(base, DependencyRule::Children, move |ev| {
        let mut list = TupleList::with_capacity(arity, elements.len(), limit);
        for element in &elements {
            if let Some(tuple) = element.evaluate_tuple(ev)? {
                list.push(&tuple)?;
            }
        }
        Ok(list)
    })))
}

// ============================================================================
// CROSS JOIN
// ============================================================================

/// Every combination of a tuple of `left` followed by a tuple of `right`,
/// computed while iterating.
pub struct CrossJoinIterable {
    left: TupleList,
    right: TupleList,
}

impl CrossJoinIterable {
    pub fn new(left: TupleList, right: TupleList) -> Self {
        CrossJoinIterable { left, right }
    }

    /// Number of tuples the join produces, saturating.
    pub fn product_len(&self) -> usize {
        self.left.len().saturating_mul(self.right.len())
    }
}

impl TupleIterable for CrossJoinIterable {
    fn arity(&self) -> usize {
        self.left.arity() + self.right.arity()
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(CrossJoinCursor {
            left: &self.left,
            right: &self.right,
            i: 0,
            j: 0,
            started: false,
        })
    }
}

struct CrossJoinCursor<'a> {
    left: &'a TupleList,
    right: &'a TupleList,
    i: usize,
    j: usize,
    started: bool,
}

impl TupleCursor for CrossJoinCursor<'_> {
    fn arity(&self) -> usize {
        self.left.arity() + self.right.arity()
    }

    fn forward(&mut self) -> bool {
        if self.right.is_empty() || self.i >= self.left.len() {
            return false;
        }
        if !self.started {
            self.started = true;
            return true;
        }
        self.j += 1;
        if self.j == self.right.len() {
            self.j = 0;
            self.i += 1;
        }
        self.i < self.left.len()
    }

    fn member(&self, column: usize) -> &Member {
        let split = self.left.arity();
        if column < split {
            self.left.get(column, self.i)
        } else {
            self.right.get(column - split, self.j)
        }
    }
}

/// `CrossJoin(left, right)`
///
/// Fails before iterating if the full product exceeds `limit`. Under
/// non-empty evaluation the join is computed eagerly and combinations whose
/// cell is empty are dropped.
pub fn crossjoin(left: CalcRef, right: CalcRef, limit: RowLimit) -> CalcRef {
    let mut elements = element_types(left.get_type());
    elements.extend(element_types(right.get_type()));
    let base = CalcBase::new(
        "CrossJoin",
        "CrossJoinIterCalc",
        Type::set_of(Type::Tuple(elements)),
        ResultStyle::Iterable,
    )
    .with_children(vec![left.clone(), right.clone()]);
    Arc::new(IterCalc::new(base, DependencyRule::Children, move |ev| {
        let join = CrossJoinIterable::new(left.evaluate_list(ev)?, right.evaluate_list(ev)?);
        if !ev.is_non_empty() {
            limit.check(join.product_len())?;
            return Ok(Arc::new(join) as SharedIterable);
        }

        let mut list = TupleList::new(join.arity(), limit);
        let mut cursor = join.tuple_cursor();
        while cursor.forward() {
            let tuple = cursor.current();
            if !evaluate_at(ev, &tuple).is_null() {
                list.push(&tuple)?;
            }
        }
        log::debug!(
            "non-empty crossjoin kept {} of {} tuples",
            list.len(),
            join.product_len()
        );
        Ok(Arc::new(list.into_fixed()) as SharedIterable)
    }))
}

// ============================================================================
// FILTER / ORDER
// ============================================================================

/// Walks `set`, positioning a pushed evaluator at each tuple.
fn for_each_tuple<F>(
    set: &dyn TupleIterable,
    evaluator: &dyn Evaluator,
    mut f: F,
) -> Result<(), CalcError>
where
    F: FnMut(&dyn TupleCursor, &mut dyn Evaluator) -> Result<(), CalcError>,
{
    let mut pushed = evaluator.push();
    let mut cursor = set.tuple_cursor();
    while cursor.forward() {
        cursor.set_context(pushed.as_mut());
        f(&*cursor, pushed.as_mut())?;
    }
    Ok(())
}

/// `Filter(set, condition)`
///
/// With `simplify`, `set` is evaluated in its simplified context.
pub fn filter(set: CalcRef, condition: CalcRef, limit: RowLimit, simplify: bool) -> CalcRef {
    let ty = set.get_type().clone();
    let base = CalcBase::new("Filter", "FilterCalc", ty, ResultStyle::MutableList)
        .with_children(vec![set.clone(), condition.clone()]);
    Arc::new(ListCalc::new(base, DependencyRule::ButFirst, move |ev| {
        let tuples = with_simplified_context(&*set, ev, simplify, |ev| set.evaluate_iterable(ev))?;
        let mut result = TupleList::new(tuples.arity(), limit);
        for_each_tuple(&*tuples, ev, |cursor, pushed| {
            if condition.evaluate_boolean(pushed)? {
                result.add_current(cursor)?;
            }
            Ok(())
        })?;
        Ok(result)
    }))
}

/// `Order(set, key [, DESC])`. Stable; null keys sort lowest.
///
/// `set` must be compiled with style `MutableList`; the list it returns is
/// sorted in place. With `simplify`, `set` is evaluated in its simplified
/// context.
pub fn order(set: CalcRef, key: CalcRef, descending: bool, simplify: bool) -> CalcRef {
    let ty = set.get_type().clone();
    let base = CalcBase::new("Order", "OrderCalc", ty, ResultStyle::MutableList)
        .with_children(vec![set.clone(), key.clone()])
        .with_arg("direction", if descending { "DESC" } else { "ASC" });
    Arc::new(ListCalc::new(base, DependencyRule::ButFirst, move |ev| {
        let mut list = with_simplified_context(&*set, ev, simplify, |ev| set.evaluate_list(ev))?;
        if !list.is_mutable() {
            list = list.clone_list(-1);
        }

        let mut keys: FxHashMap<Tuple, Option<f64>> = FxHashMap::default();
        for_each_tuple(&list, ev, |cursor, pushed| {
            let k = key.evaluate_number(pushed)?;
            keys.insert(cursor.current(), k);
            Ok(())
        })?;

        list.sort_by(|a, b| {
            let ka = keys.get(a).copied().flatten();
            let kb = keys.get(b).copied().flatten();
            let ord = compare_keys(ka, kb);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        })?;
        Ok(list)
    }))
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::leaf::{current_member, current_value, member_literal};
    use crate::calc::scalar::{comparison, ComparisonOp};
    use crate::calc::{leaf, Value};
    use model::{CellValue, Cube, FactTable, HierarchyBuilder, MemoryEvaluator};

    struct Fixture {
        product: Hierarchy,
        time: Hierarchy,
        fruit: Member,
        evaluator: MemoryEvaluator,
    }

    fn fixture() -> Fixture {
        let mut p = HierarchyBuilder::new("Product");
        let fruit = p.add_member(None, "Fruit");
        let apple = p.add_member(Some(&fruit), "Apple");
        let pear = p.add_member(Some(&fruit), "Pear");
        let mut t = HierarchyBuilder::new("Time");
        let q1 = t.add_member(None, "Q1");
        let q2 = t.add_member(None, "Q2");
        let product = p.build();
        let time = t.build();
        let cube = Arc::new(Cube::new("Sales", vec![product.clone(), time.clone()]));

        let mut facts = FactTable::new(2);
        facts.set(vec![apple.clone(), q1.clone()], CellValue::Number(5.0));
        facts.set(vec![pear.clone(), q1], CellValue::Number(2.0));
        facts.set(vec![pear, q2], CellValue::Number(4.0));
        Fixture {
            product,
            time,
            fruit,
            evaluator: MemoryEvaluator::new(cube, Arc::new(facts)),
        }
    }

    fn names(list: &TupleList) -> Vec<String> {
        list.rows()
            .map(|r| r.iter().map(|m| m.name()).collect::<Vec<_>>().join("/"))
            .collect()
    }

    fn fruits(f: &Fixture) -> CalcRef {
        children(member_literal(&f.product, f.fruit.clone()), RowLimit::UNBOUNDED)
    }

    #[test]
    fn test_members_are_shared_lists() {
        let mut f = fixture();
        let calc = hierarchy_members(&f.product, RowLimit::UNBOUNDED);
        let list = calc.evaluate_list(&mut f.evaluator).unwrap();
        assert!(!list.is_mutable());
        assert_eq!(names(&list), vec!["All Products", "Fruit", "Apple", "Pear"]);
        assert!(!calc.depends_on(&f.product));

        let level = level_members(&f.product, 2, RowLimit::UNBOUNDED);
        assert_eq!(names(&level.evaluate_list(&mut f.evaluator).unwrap()), vec!["Apple", "Pear"]);
    }

    #[test]
    fn test_members_respect_limit() {
        let mut f = fixture();
        let calc = hierarchy_members(&f.product, RowLimit::new(2));
        assert!(calc.evaluate_list(&mut f.evaluator).unwrap_err().is_limit_exceeded());
    }

    #[test]
    fn test_crossjoin_iterates_lazily() {
        let mut f = fixture();
        let join = crossjoin(
            fruits(&f),
            level_members(&f.time, 1, RowLimit::UNBOUNDED),
            RowLimit::UNBOUNDED,
        );
        assert_eq!(join.get_type().arity(), 2);
        let iterable = join.evaluate_iterable(&mut f.evaluator).unwrap();
        let rows: Vec<String> = iterable
            .tuple_iter()
            .map(|t| t.iter().map(|m| m.name()).collect::<Vec<_>>().join("/"))
            .collect();
        assert_eq!(rows, vec!["Apple/Q1", "Apple/Q2", "Pear/Q1", "Pear/Q2"]);
    }

    #[test]
    fn test_crossjoin_limit() {
        let mut f = fixture();
        let join = crossjoin(
            fruits(&f),
            level_members(&f.time, 1, RowLimit::UNBOUNDED),
            RowLimit::new(3),
        );
        let err = join.evaluate_iterable(&mut f.evaluator).err().unwrap();
        assert_eq!(
            err,
            CalcError::LimitExceeded(crate::error::ResourceLimitError { attempted: 4, limit: 3 })
        );
    }

    #[test]
    fn test_non_empty_crossjoin_drops_empty_cells() {
        let mut f = fixture();
        f.evaluator.set_non_empty(true);
        let join = crossjoin(
            fruits(&f),
            level_members(&f.time, 1, RowLimit::UNBOUNDED),
            RowLimit::new(3),
        );
        let iterable = join.evaluate_iterable(&mut f.evaluator).unwrap();
        assert_eq!(iterable.tuple_iter().count(), 3);
    }

    #[test]
    fn test_empty_side_yields_nothing() {
        let join = CrossJoinIterable::new(TupleList::new(1, RowLimit::UNBOUNDED), TupleList::empty(1));
        assert_eq!(join.tuple_iter().count(), 0);
    }

    #[test]
    fn test_filter_positions_each_tuple() {
        let mut f = fixture();
        let over_five = comparison(ComparisonOp::Greater, current_value(), leaf::constant(Value::Number(5.0)));
        let calc = filter(fruits(&f), over_five, RowLimit::UNBOUNDED, false);
        let list = calc.evaluate_list(&mut f.evaluator).unwrap();
        // Apple = 5, Pear = 2 + 4
        assert_eq!(names(&list), vec!["Pear"]);
        assert!(list.is_mutable());

        // the filter supplies Product itself, but reads Time from the context
        assert!(!calc.depends_on(&f.product));
        assert!(calc.depends_on(&f.time));
    }

    #[test]
    fn test_order_descending_is_stable() {
        let mut f = fixture();
        let calc = order(fruits(&f), current_value(), true, false);
        let list = calc.evaluate_list(&mut f.evaluator).unwrap();
        assert_eq!(names(&list), vec!["Pear", "Apple"]);

        let by_member = order(fruits(&f), current_member(&f.time), false, false);
        // a member key is not numeric
        assert!(by_member.evaluate_list(&mut f.evaluator).is_err());
    }

    #[test]
    fn test_set_literal_skips_nulls() {
        let mut f = fixture();
        let fruit = member_literal(&f.product, f.fruit.clone());
        let calc = set_literal(
            vec![fruit.clone(), leaf::member_parent(leaf::member_parent(fruit))],
            RowLimit::UNBOUNDED,
        )
        .unwrap();
        let list = calc.evaluate_list(&mut f.evaluator).unwrap();
        assert_eq!(names(&list), vec!["Fruit"]);
    }

    #[test]
    fn test_set_literal_rejects_bad_elements() {
        let f = fixture();
        assert!(matches!(
            set_literal(Vec::new(), RowLimit::UNBOUNDED),
            Err(CalcError::Unsupported(_))
        ));

        let q1 = f.time.lookup("Q1").unwrap().clone();
        let pair = leaf::constant(Value::Tuple(smallvec::smallvec![f.fruit.clone(), q1]));
        let single = member_literal(&f.product, f.fruit.clone());
        assert!(matches!(
            set_literal(vec![single, pair], RowLimit::UNBOUNDED),
            Err(CalcError::ArityMismatch { expected: 1, actual: 2 })
        ));
    }

    /// A set of the time member current when it is evaluated. It claims to
    /// depend on nothing, so simplification may reset Time before it runs.
    fn time_seen_by_set(f: &Fixture) -> CalcRef {
        let time = f.time.clone();
        let base = CalcBase::new(
            "Seen",
            "SeenCalc",
            Type::set_of(Type::member_of(&f.time)),
            ResultStyle::MutableList,
        );
        Arc::new(ListCalc::new(base, DependencyRule::Never, move |ev| {
            TupleList::from_members(vec![ev.get_context(&time).clone()], RowLimit::UNBOUNDED)
        }))
    }

    #[test]
    fn test_filter_and_order_simplify_their_set() {
        let mut f = fixture();
        let q1 = f.time.lookup("Q1").unwrap().clone();
        f.evaluator.set_context(&q1);
        let always = || leaf::constant(Value::Boolean(true));

        let simplified = filter(time_seen_by_set(&f), always(), RowLimit::UNBOUNDED, true);
        let list = simplified.evaluate_list(&mut f.evaluator).unwrap();
        assert_eq!(names(&list), vec!["All Times"]);

        let full = filter(time_seen_by_set(&f), always(), RowLimit::UNBOUNDED, false);
        assert_eq!(names(&full.evaluate_list(&mut f.evaluator).unwrap()), vec!["Q1"]);

        let ordered = order(time_seen_by_set(&f), current_value(), false, true);
        assert_eq!(names(&ordered.evaluate_list(&mut f.evaluator).unwrap()), vec!["All Times"]);

        // the caller's context is left alone
        assert_eq!(f.evaluator.get_context(&f.time), &q1);
    }
}
