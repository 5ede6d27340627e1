//! FILENAME: core/calc-engine/src/calc/typed.rs
//! Typed calc variants.
//!
//! Each variant wraps a compiled closure producing one narrow result type
//! (a boolean, an optional number, a list, ...). The variant implements
//! that narrow accessor directly and boxes the result for the generic
//! `evaluate`. Constructors check that the declared type fits the variant;
//! a mismatch is a bug in the compiler and panics.

use super::dependency::DependencyRule;
use super::{Calc, CalcBase, Value};
use crate::error::CalcError;
use crate::result_style::ResultStyle;
use crate::tuple::{SharedIterable, Tuple, TupleList};
use model::{Evaluator, Hierarchy, Level, Member, Type};
use std::fmt;

macro_rules! typed_calc {
    (
        $(#[$meta:meta])*
        $name:ident => $accessor:ident -> $out:ty,
        accepts: $accepts:expr,
        wrap: $wrap:expr $(,)?
    ) => {
        $(#[$meta])*
        pub struct $name {
            base: CalcBase,
            rule: DependencyRule,
            func: Box<dyn Fn(&mut dyn Evaluator) -> Result<$out, CalcError> + Send + Sync>,
        }

        impl $name {
            /// # Panics
            /// Panics if the declared type or result style does not fit
            /// this variant.
            pub fn new<F>(base: CalcBase, rule: DependencyRule, func: F) -> Self
            where
                F: Fn(&mut dyn Evaluator) -> Result<$out, CalcError> + Send + Sync + 'static,
            {
                let accepts: fn(&Type, ResultStyle) -> bool = $accepts;
                assert!(
                    accepts(base.get_type(), base.result_style()),
                    "{} cannot have type {} and result style {}",
                    stringify!($name),
                    base.get_type(),
                    base.result_style()
                );
                $name {
                    base,
                    rule,
                    func: Box::new(func),
                }
            }

            pub fn rule(&self) -> &DependencyRule {
                &self.rule
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("name", &self.base.name())
                    .field("type", &self.base.get_type())
                    .field("result_style", &self.base.result_style())
                    .field("rule", &self.rule)
                    .field("children", &self.base.children())
                    .finish()
            }
        }

        impl Calc for $name {
            fn base(&self) -> &CalcBase {
                &self.base
            }

            fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value, CalcError> {
                let wrap: fn($out) -> Value = $wrap;
                Ok(wrap((self.func)(evaluator)?))
            }

            fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
                self.rule.depends_on(self.base.children(), hierarchy)
            }

            fn $accessor(&self, evaluator: &mut dyn Evaluator) -> Result<$out, CalcError> {
                (self.func)(evaluator)
            }
        }
    };
}

fn is_value_style(style: ResultStyle) -> bool {
    matches!(style, ResultStyle::Value | ResultStyle::Any)
}

typed_calc! {
    /// A calc whose result is a boolean.
    BooleanCalc => evaluate_boolean -> bool,
    accepts: |ty, style| matches!(ty, Type::Boolean) && is_value_style(style),
    wrap: Value::Boolean,
}

typed_calc! {
    /// A calc whose result is a number, or null.
    NumericCalc => evaluate_number -> Option<f64>,
    accepts: |ty, style| matches!(ty, Type::Numeric) && is_value_style(style),
    wrap: |n| n.map_or(Value::Null, Value::Number),
}

typed_calc! {
    StringCalc => evaluate_string -> Option<String>,
    accepts: |ty, style| matches!(ty, Type::String) && is_value_style(style),
    wrap: |s| s.map_or(Value::Null, Value::String),
}

typed_calc! {
    /// A calc whose result is a member, or null.
    MemberCalc => evaluate_member -> Option<Member>,
    accepts: |ty, style| matches!(ty, Type::Member(_)) && is_value_style(style),
    wrap: |m| m.map_or(Value::Null, Value::Member),
}

typed_calc! {
    TupleCalc => evaluate_tuple -> Option<Tuple>,
    accepts: |ty, style| matches!(ty, Type::Tuple(_)) && is_value_style(style),
    wrap: |t| t.map_or(Value::Null, Value::Tuple),
}

typed_calc! {
    LevelCalc => evaluate_level -> Option<Level>,
    accepts: |ty, style| matches!(ty, Type::Level(_)) && is_value_style(style),
    wrap: |l| l.map_or(Value::Null, Value::Level),
}

typed_calc! {
    HierarchyCalc => evaluate_hierarchy -> Option<Hierarchy>,
    accepts: |ty, style| matches!(ty, Type::Hierarchy(_)) && is_value_style(style),
    wrap: |h| h.map_or(Value::Null, Value::Hierarchy),
}

typed_calc! {
    /// A calc whose result is a set held in a list.
    ///
    /// With style `MutableList` every evaluation returns a fresh list the
    /// caller owns; with `List` the list may be shared and is fixed.
    ListCalc => evaluate_list -> TupleList,
    accepts: |ty, style| ty.is_set() && style.is_list(),
    wrap: Value::List,
}

typed_calc! {
    /// A calc whose result is a set that can only be iterated.
    IterCalc => evaluate_iterable -> SharedIterable,
    accepts: |ty, style| ty.is_set() && style == ResultStyle::Iterable,
    wrap: Value::Iterable,
}

typed_calc! {
    /// A calc run only for its effect. Its generic value is null.
    VoidCalc => evaluate_void -> (),
    accepts: |ty, style| matches!(ty, Type::Void) && is_value_style(style),
    wrap: |()| Value::Null,
}

// ============================================================================
// GENERIC
// ============================================================================

/// A calc of any type, implemented directly on `Value`. Narrow accessors
/// convert from the value.
pub struct GenericCalc {
    base: CalcBase,
    rule: DependencyRule,
    func: Box<dyn Fn(&mut dyn Evaluator) -> Result<Value, CalcError> + Send + Sync>,
}

impl GenericCalc {
    pub fn new<F>(base: CalcBase, rule: DependencyRule, func: F) -> Self
    where
        F: Fn(&mut dyn Evaluator) -> Result<Value, CalcError> + Send + Sync + 'static,
    {
        GenericCalc {
            base,
            rule,
            func: Box::new(func),
        }
    }

    pub fn rule(&self) -> &DependencyRule {
        &self.rule
    }
}

impl fmt::Debug for GenericCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericCalc")
            .field("name", &self.base.name())
            .field("type", &self.base.get_type())
            .field("rule", &self.rule)
            .field("children", &self.base.children())
            .finish()
    }
}

impl Calc for GenericCalc {
    fn base(&self) -> &CalcBase {
        &self.base
    }

    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value, CalcError> {
        (self.func)(evaluator)
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        self.rule.depends_on(self.base.children(), hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::RowLimit;
    use model::{Cube, FactTable, HierarchyBuilder, MemoryEvaluator};
    use std::sync::Arc;

    fn evaluator() -> MemoryEvaluator {
        let product = HierarchyBuilder::new("Product").build();
        let cube = Arc::new(Cube::new("Sales", vec![product]));
        MemoryEvaluator::new(cube, Arc::new(FactTable::new(1)))
    }

    #[test]
    fn test_numeric_boxes_through_evaluate() {
        let calc = NumericCalc::new(
            CalcBase::new("Two", "NumericCalc", Type::Numeric, ResultStyle::Value),
            DependencyRule::Never,
            |_| Ok(Some(2.0)),
        );
        let mut ev = evaluator();
        assert_eq!(calc.evaluate_number(&mut ev), Ok(Some(2.0)));
        assert_eq!(calc.evaluate(&mut ev), Ok(Value::Number(2.0)));
    }

    #[test]
    fn test_null_number_becomes_null_value() {
        let calc = NumericCalc::new(
            CalcBase::new("Empty", "NumericCalc", Type::Numeric, ResultStyle::Value),
            DependencyRule::Never,
            |_| Ok(None),
        );
        assert_eq!(calc.evaluate(&mut evaluator()), Ok(Value::Null));
    }

    #[test]
    #[should_panic(expected = "BooleanCalc cannot have type NUMERIC")]
    fn test_type_mismatch_panics() {
        BooleanCalc::new(
            CalcBase::new("Bad", "BooleanCalc", Type::Numeric, ResultStyle::Value),
            DependencyRule::Never,
            |_| Ok(true),
        );
    }

    #[test]
    #[should_panic(expected = "cannot have type")]
    fn test_list_calc_needs_list_style() {
        ListCalc::new(
            CalcBase::new("Bad", "ListCalc", Type::set_of(Type::Member(None)), ResultStyle::Iterable),
            DependencyRule::Never,
            |_| Ok(TupleList::new(1, RowLimit::UNBOUNDED)),
        );
    }

    #[test]
    fn test_void_runs_for_effect() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let calc = VoidCalc::new(
            CalcBase::new("Touch", "VoidCalc", Type::Void, ResultStyle::Value),
            DependencyRule::Children,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        assert_eq!(calc.get_type(), &Type::Void);
        assert_eq!(calc.result_style(), ResultStyle::Value);

        let mut ev = evaluator();
        assert_eq!(calc.evaluate_void(&mut ev), Ok(()));
        assert_eq!(calc.evaluate(&mut ev), Ok(Value::Null));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "VoidCalc cannot have type NUMERIC")]
    fn test_void_calc_needs_void_type() {
        VoidCalc::new(
            CalcBase::new("Bad", "VoidCalc", Type::Numeric, ResultStyle::Value),
            DependencyRule::Never,
            |_| Ok(()),
        );
    }

    #[test]
    fn test_generic_falls_back_to_conversions() {
        let calc = GenericCalc::new(
            CalcBase::new("Yes", "ConstantCalc", Type::Boolean, ResultStyle::Value),
            DependencyRule::Never,
            |_| Ok(Value::Boolean(true)),
        );
        assert_eq!(calc.evaluate_boolean(&mut evaluator()), Ok(true));
        assert!(calc.evaluate_number(&mut evaluator()).is_err());
    }
}
