//! FILENAME: core/calc-engine/src/calc/scalar.rs
//! Operators over scalar calcs.

use super::dependency::DependencyRule;
use super::{BooleanCalc, CalcBase, CalcRef, GenericCalc, NumericCalc};
use crate::result_style::ResultStyle;
use model::Type;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }

    /// Null on either side makes the result null, except that addition and
    /// subtraction treat a single null as zero.
    pub fn apply(self, left: Option<f64>, right: Option<f64>) -> Option<f64> {
        match self {
            ArithmeticOp::Add | ArithmeticOp::Subtract => {
                if left.is_none() && right.is_none() {
                    return None;
                }
                let (l, r) = (left.unwrap_or(0.0), right.unwrap_or(0.0));
                Some(if self == ArithmeticOp::Add { l + r } else { l - r })
            }
            ArithmeticOp::Multiply => Some(left? * right?),
            ArithmeticOp::Divide => {
                let (l, r) = (left?, right?);
                // x / 0 is null, not infinity
                if r == 0.0 {
                    None
                } else {
                    Some(l / r)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        }
    }

    /// Comparisons with null are false.
    pub fn apply(self, left: Option<f64>, right: Option<f64>) -> bool {
        let (Some(l), Some(r)) = (left, right) else {
            return false;
        };
        let Some(ord) = l.partial_cmp(&r) else {
            return false;
        };
        match self {
            ComparisonOp::Equal => ord == Ordering::Equal,
            ComparisonOp::NotEqual => ord != Ordering::Equal,
            ComparisonOp::Less => ord == Ordering::Less,
            ComparisonOp::LessOrEqual => ord != Ordering::Greater,
            ComparisonOp::Greater => ord == Ordering::Greater,
            ComparisonOp::GreaterOrEqual => ord != Ordering::Less,
        }
    }
}

pub fn arithmetic(op: ArithmeticOp, left: CalcRef, right: CalcRef) -> CalcRef {
    let base = CalcBase::new(op.symbol(), "ArithmeticCalc", Type::Numeric, ResultStyle::Value)
        .with_children(vec![left.clone(), right.clone()]);
    Arc::new(NumericCalc::new(base, DependencyRule::Children, move |ev| {
        let l = left.evaluate_number(ev)?;
        let r = right.evaluate_number(ev)?;
        Ok(op.apply(l, r))
    }))
}

pub fn comparison(op: ComparisonOp, left: CalcRef, right: CalcRef) -> CalcRef {
    let base = CalcBase::new(op.symbol(), "ComparisonCalc", Type::Boolean, ResultStyle::Value)
        .with_children(vec![left.clone(), right.clone()]);
    Arc::new(BooleanCalc::new(base, DependencyRule::Children, move |ev| {
        let l = left.evaluate_number(ev)?;
        let r = right.evaluate_number(ev)?;
        Ok(op.apply(l, r))
    }))
}

/// Short-circuits: `right` is not evaluated when `left` is false.
pub fn and(left: CalcRef, right: CalcRef) -> CalcRef {
    let base = CalcBase::new("AND", "AndCalc", Type::Boolean, ResultStyle::Value)
        .with_children(vec![left.clone(), right.clone()]);
    Arc::new(BooleanCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(left.evaluate_boolean(ev)? && right.evaluate_boolean(ev)?)
    }))
}

/// Short-circuits: `right` is not evaluated when `left` is true.
pub fn or(left: CalcRef, right: CalcRef) -> CalcRef {
    let base = CalcBase::new("OR", "OrCalc", Type::Boolean, ResultStyle::Value)
        .with_children(vec![left.clone(), right.clone()]);
    Arc::new(BooleanCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(left.evaluate_boolean(ev)? || right.evaluate_boolean(ev)?)
    }))
}

pub fn not(operand: CalcRef) -> CalcRef {
    let base = CalcBase::new("NOT", "NotCalc", Type::Boolean, ResultStyle::Value)
        .with_children(vec![operand.clone()]);
    Arc::new(BooleanCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(!operand.evaluate_boolean(ev)?)
    }))
}

/// `IIf(condition, then, else)`. The result type is the `then` branch's.
pub fn iif(condition: CalcRef, then: CalcRef, otherwise: CalcRef) -> CalcRef {
    let ty = then.get_type().clone();
    let base = CalcBase::new("IIf", "IifCalc", ty, ResultStyle::Value).with_children(vec![
        condition.clone(),
        then.clone(),
        otherwise.clone(),
    ]);
    Arc::new(GenericCalc::new(base, DependencyRule::Children, move |ev| {
        if condition.evaluate_boolean(ev)? {
            then.evaluate(ev)
        } else {
            otherwise.evaluate(ev)
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::leaf::constant;
    use crate::calc::Value;
    use model::{Cube, FactTable, HierarchyBuilder, MemoryEvaluator};

    fn evaluator() -> MemoryEvaluator {
        let cube = Arc::new(Cube::new("Sales", vec![HierarchyBuilder::new("Product").build()]));
        MemoryEvaluator::new(cube, Arc::new(FactTable::new(1)))
    }

    fn num(n: f64) -> CalcRef {
        constant(Value::Number(n))
    }

    #[test]
    fn test_arithmetic_null_handling() {
        assert_eq!(ArithmeticOp::Add.apply(None, Some(2.0)), Some(2.0));
        assert_eq!(ArithmeticOp::Add.apply(None, None), None);
        assert_eq!(ArithmeticOp::Multiply.apply(None, Some(2.0)), None);
        assert_eq!(ArithmeticOp::Divide.apply(Some(1.0), Some(0.0)), None);
    }

    #[test]
    fn test_comparison_with_null_is_false() {
        assert!(!ComparisonOp::Equal.apply(None, None));
        assert!(!ComparisonOp::NotEqual.apply(Some(1.0), None));
        assert!(ComparisonOp::LessOrEqual.apply(Some(1.0), Some(1.0)));
    }

    #[test]
    fn test_operator_calcs() {
        let mut ev = evaluator();
        let sum = arithmetic(ArithmeticOp::Add, num(2.0), num(3.0));
        assert_eq!(sum.evaluate_number(&mut ev), Ok(Some(5.0)));

        let greater = comparison(ComparisonOp::Greater, sum.clone(), num(4.0));
        assert_eq!(greater.evaluate_boolean(&mut ev), Ok(true));

        let both = and(greater.clone(), not(greater.clone()));
        assert_eq!(both.evaluate_boolean(&mut ev), Ok(false));
        assert_eq!(or(both, greater.clone()).evaluate_boolean(&mut ev), Ok(true));

        let choice = iif(greater, num(1.0), num(0.0));
        assert_eq!(choice.evaluate(&mut ev), Ok(Value::Number(1.0)));
    }
}
