//! FILENAME: core/calc-engine/src/calc/aggregate.rs
//! PURPOSE: Numeric aggregation of an expression over a set.
//! CONTEXT: `Sum(set, value)` and friends position a pushed evaluator at each
//! tuple of the set and fold the value found there. The set itself is
//! evaluated in a context simplified against the set calc, so that sets
//! which ignore most of the context are computed in a canonical one.

use super::dependency::{with_simplified_context, DependencyRule};
use super::leaf::current_value;
use super::{CalcBase, CalcRef, NumericCalc, Value};
use crate::config::CalcConfig;
use crate::error::CalcError;
use crate::result_style::ResultStyle;
use crate::tuple::{IndexedTuples, SharedIterable, TupleCursor};
use model::{Evaluator, Type};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// AGGREGATE FUNCTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Sum,
    /// Number of non-empty values.
    Count,
    Average,
    Min,
    Max,
    /// Sample variance.
    Var,
    /// Population variance.
    VarP,
    StdDev,
    StdDevP,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "Sum",
            AggregateFunction::Count => "Count",
            AggregateFunction::Average => "Avg",
            AggregateFunction::Min => "Min",
            AggregateFunction::Max => "Max",
            AggregateFunction::Var => "Var",
            AggregateFunction::VarP => "VarP",
            AggregateFunction::StdDev => "StdDev",
            AggregateFunction::StdDevP => "StdDevP",
        }
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state for all aggregate functions at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateAccumulator {
    pub sum: f64,
    /// Non-empty values, numeric or not.
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Welford's running mean and sum of squared differences.
    pub mean: f64,
    pub m2: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        self.m2 += delta * (value - self.mean);
    }

    /// A non-empty value that is not a number, e.g. a string.
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    pub fn add(&mut self, value: &Value) {
        match value {
            Value::Number(n) => self.add_number(*n),
            Value::Null => {}
            _ => self.add_non_number(),
        }
    }

    /// The aggregate, or null if there were no numbers to aggregate.
    /// `Count` is never null.
    pub fn compute(&self, function: AggregateFunction) -> Option<f64> {
        let n = self.count_numbers as f64;
        match function {
            AggregateFunction::Count => Some(self.count as f64),
            _ if self.count_numbers == 0 => None,
            AggregateFunction::Sum => Some(self.sum),
            AggregateFunction::Average => Some(self.sum / n),
            AggregateFunction::Min => self.min,
            AggregateFunction::Max => self.max,
            AggregateFunction::VarP => Some(self.m2 / n),
            AggregateFunction::StdDevP => Some((self.m2 / n).sqrt()),
            AggregateFunction::Var | AggregateFunction::StdDev if self.count_numbers < 2 => None,
            AggregateFunction::Var => Some(self.m2 / (n - 1.0)),
            AggregateFunction::StdDev => Some((self.m2 / (n - 1.0)).sqrt()),
        }
    }
}

// ============================================================================
// CALCS
// ============================================================================

/// Evaluates `set`, in a simplified context if configured.
fn evaluate_set(
    set: &CalcRef,
    evaluator: &mut dyn Evaluator,
    simplify: bool,
) -> Result<SharedIterable, CalcError> {
    with_simplified_context(&**set, evaluator, simplify, |ev| set.evaluate_iterable(ev))
}

/// `Sum(set [, value])`, `Avg(...)`, ... Without `value` the current cell
/// is aggregated.
pub fn aggregate(
    set: CalcRef,
    value: Option<CalcRef>,
    function: AggregateFunction,
    config: &CalcConfig,
) -> CalcRef {
    let value = value.unwrap_or_else(current_value);
    let base = CalcBase::new(function.name(), "AggregateCalc", Type::Numeric, ResultStyle::Value)
        .with_children(vec![set.clone(), value.clone()])
        .with_arg("function", function.name());
    let simplify = config.simplify_context;
    Arc::new(NumericCalc::new(base, DependencyRule::ButFirst, move |ev| {
        let tuples = evaluate_set(&set, ev, simplify)?;
        let mut acc = AggregateAccumulator::new();
        let mut pushed = ev.push();
        let mut cursor = tuples.tuple_cursor();
        while cursor.forward() {
            cursor.set_context(pushed.as_mut());
            acc.add(&value.evaluate(pushed.as_mut())?);
        }
        Ok(acc.compute(function))
    }))
}

/// `Count(set [, EXCLUDEEMPTY | INCLUDEEMPTY])`
///
/// Including empties counts tuples without reading any cell.
pub fn count(set: CalcRef, include_empty: bool, config: &CalcConfig) -> CalcRef {
    if !include_empty {
        return aggregate(set, None, AggregateFunction::Count, config);
    }
    let base = CalcBase::new("Count", "CountCalc", Type::Numeric, ResultStyle::Value)
        .with_children(vec![set.clone()])
        .with_arg("empties", "INCLUDEEMPTY");
    let simplify = config.simplify_context;
    Arc::new(NumericCalc::new(base, DependencyRule::ButFirst, move |ev| {
        let tuples = evaluate_set(&set, ev, simplify)?;
        let mut cursor = tuples.tuple_cursor();
        let mut n = 0usize;
        while cursor.forward() {
            n += 1;
        }
        Ok(Some(n as f64))
    }))
}

/// Number of tuples in a list-valued set, without walking it.
pub fn list_count(set: CalcRef) -> CalcRef {
    let base = CalcBase::new("Count", "ListCountCalc", Type::Numeric, ResultStyle::Value)
        .with_children(vec![set.clone()]);
    Arc::new(NumericCalc::new(base, DependencyRule::ButFirst, move |ev| {
        Ok(Some(set.evaluate_list(ev)?.len() as f64))
    }))
}
