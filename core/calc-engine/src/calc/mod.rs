//! FILENAME: core/calc-engine/src/calc/mod.rs
//! PURPOSE: Compiled expressions.
//! CONTEXT: A `Calc` is an immutable, typed node produced by the expression
//! compiler. Trees of calcs are built once and evaluated many times, from
//! any number of threads, each with its own `Evaluator`. Evaluation never
//! mutates a calc.
//!
//! Every calc answers the generic `evaluate`, returning a `Value`, plus a
//! set of narrow accessors (`evaluate_boolean`, `evaluate_list`, ...). The
//! typed variants in `typed` implement their own narrow accessor directly
//! and derive `evaluate` from it; the others convert from `Value`.

pub mod adapter;
pub mod aggregate;
pub mod dependency;
pub mod leaf;
pub mod scalar;
pub mod set;
pub mod typed;
pub mod value;
pub mod writer;

use crate::error::CalcError;
use crate::result_style::ResultStyle;
use crate::tuple::{SharedIterable, Tuple, TupleList};
use model::{Evaluator, Hierarchy, Level, Member, Type};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

pub use dependency::{
    any_depends, any_depends_but_first, but_depends, simplify_evaluator, with_simplified_context,
    DependencyRule, SimplifiedEvaluator,
};
pub use typed::{
    BooleanCalc, GenericCalc, HierarchyCalc, IterCalc, LevelCalc, ListCalc, MemberCalc,
    NumericCalc, StringCalc, TupleCalc, VoidCalc,
};
pub use value::Value;
pub use writer::{explain, CalcPlan, CalcWriter};

/// Shared handle to a compiled expression.
pub type CalcRef = Arc<dyn Calc>;

// ============================================================================
// CALC ARGUMENTS
// ============================================================================

/// Ordered key/value arguments of a calc, for plans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalcArgs {
    entries: Vec<(String, serde_json::Value)>,
}

impl CalcArgs {
    pub fn new() -> Self {
        CalcArgs::default()
    }

    /// Sets `key`, replacing an earlier value in place.
    pub fn insert(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializes as a JSON object, keeping insertion order.
impl Serialize for CalcArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for CalcArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match v {
                serde_json::Value::String(s) => write!(f, "{}={}", k, s)?,
                other => write!(f, "{}={}", k, other)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// CALC BASE
// ============================================================================

/// State every calc carries: its identity for plans, its static type, its
/// result style and its children.
#[derive(Debug, Clone)]
pub struct CalcBase {
    name: String,
    class: &'static str,
    ty: Type,
    result_style: ResultStyle,
    children: Vec<CalcRef>,
    args: CalcArgs,
}

impl CalcBase {
    pub fn new(name: &str, class: &'static str, ty: Type, result_style: ResultStyle) -> Self {
        CalcBase {
            name: name.to_string(),
            class,
            ty,
            result_style,
            children: Vec::new(),
            args: CalcArgs::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<CalcRef>) -> Self {
        self.children = children;
        self
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn result_style(&self) -> ResultStyle {
        self.result_style
    }

    pub fn children(&self) -> &[CalcRef] {
        &self.children
    }

    /// Node-specific arguments, without the standard ones.
    pub fn args(&self) -> &CalcArgs {
        &self.args
    }

    /// The standard arguments followed by the node-specific ones.
    pub fn arguments(&self) -> CalcArgs {
        let mut args = CalcArgs::new();
        args.insert("name", self.name.as_str());
        args.insert("class", self.class);
        args.insert("type", self.ty.to_string());
        args.insert("resultStyle", self.result_style.name());
        for (k, v) in self.args.iter() {
            args.insert(k, v.clone());
        }
        args
    }
}

// ============================================================================
// CALC
// ============================================================================

/// A compiled expression.
pub trait Calc: fmt::Debug + Send + Sync {
    fn base(&self) -> &CalcBase;

    /// Evaluates in the evaluator's current context.
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value, CalcError>;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn get_type(&self) -> &Type {
        self.base().get_type()
    }

    fn result_style(&self) -> ResultStyle {
        self.base().result_style()
    }

    fn children(&self) -> &[CalcRef] {
        self.base().children()
    }

    /// Whether the result can differ between two contexts that differ only
    /// in the current member of `hierarchy`. Composite calcs depend on a
    /// hierarchy if any child does.
    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(self.children(), hierarchy)
    }

    /// Hands this calc to a plan writer, which visits the children in turn.
    fn accept(&self, writer: &mut CalcWriter) {
        writer.visit(self.base());
    }

    fn evaluate_boolean(&self, evaluator: &mut dyn Evaluator) -> Result<bool, CalcError> {
        self.evaluate(evaluator)?.into_boolean()
    }

    fn evaluate_number(&self, evaluator: &mut dyn Evaluator) -> Result<Option<f64>, CalcError> {
        self.evaluate(evaluator)?.into_number()
    }

    fn evaluate_string(&self, evaluator: &mut dyn Evaluator) -> Result<Option<String>, CalcError> {
        self.evaluate(evaluator)?.into_string()
    }

    fn evaluate_member(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Member>, CalcError> {
        self.evaluate(evaluator)?.into_member()
    }

    fn evaluate_tuple(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Tuple>, CalcError> {
        self.evaluate(evaluator)?.into_tuple()
    }

    fn evaluate_level(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Level>, CalcError> {
        self.evaluate(evaluator)?.into_level()
    }

    fn evaluate_hierarchy(
        &self,
        evaluator: &mut dyn Evaluator,
    ) -> Result<Option<Hierarchy>, CalcError> {
        self.evaluate(evaluator)?.into_hierarchy()
    }

    /// The result as a list. With style `MUTABLE_LIST` the caller owns the
    /// list and may modify it; with `LIST` it must not.
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<TupleList, CalcError> {
        self.evaluate(evaluator)?.into_list()
    }

    fn evaluate_iterable(&self, evaluator: &mut dyn Evaluator) -> Result<SharedIterable, CalcError> {
        self.evaluate(evaluator)?.into_iterable()
    }

    /// Evaluates for effect only, discarding the result.
    fn evaluate_void(&self, evaluator: &mut dyn Evaluator) -> Result<(), CalcError> {
        self.evaluate(evaluator).map(|_| ())
    }
}
