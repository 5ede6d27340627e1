//! FILENAME: core/calc-engine/src/compiler/compile.rs
//! PURPOSE: Compiles logical expressions into calc trees.
//! CONTEXT: Each expression is compiled bottom-up into the calc that
//! computes it. A caller that needs a particular shape asks for it: a
//! numeric, a member, a list it may mutate, and so on. Requests the
//! expression cannot meet fail here, at compile time, with a type or
//! result-style error. Requests that differ only in representation are met
//! by wrapping the calc in an adapter.

use super::exp::Exp;
use crate::calc::adapter;
use crate::calc::aggregate::{aggregate, count, list_count};
use crate::calc::leaf::{
    constant, current_member, current_value, member_hierarchy, member_level, member_literal,
    member_name, member_parent, member_value, tuple_value,
};
use crate::calc::scalar::{and, arithmetic, comparison, iif, not, or};
use crate::calc::set::{
    children, crossjoin, filter, hierarchy_members, level_members, order, set_literal,
};
use crate::calc::{CalcBase, CalcRef, DependencyRule, TupleCalc, Value, VoidCalc};
use crate::config::CalcConfig;
use crate::error::CalcError;
use crate::result_style::{
    negotiate, Adaptation, ResultStyle, ITERABLE_FIRST, LIST_MUTABLELIST, MUTABLELIST_ONLY,
};
use crate::tuple::{RowLimit, Tuple, TupleCursor, TupleIterable};
use model::{Cube, Hierarchy, Member, Type};
use std::sync::Arc;

/// Compiles expressions against one cube.
#[derive(Debug, Clone)]
pub struct ExpCompiler {
    cube: Arc<Cube>,
    config: CalcConfig,
}

impl ExpCompiler {
    pub fn new(cube: Arc<Cube>, config: CalcConfig) -> Self {
        ExpCompiler { cube, config }
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn config(&self) -> &CalcConfig {
        &self.config
    }

    fn limit(&self) -> RowLimit {
        self.config.row_limit()
    }

    // ========================================================================
    // NAME RESOLUTION
    // ========================================================================

    fn hierarchy(&self, name: &str) -> Result<&Hierarchy, CalcError> {
        self.cube
            .hierarchy(name)
            .or_else(|| self.cube.hierarchies().iter().find(|h| h.unique_name() == name))
            .ok_or_else(|| CalcError::NotFound(name.to_string()))
    }

    fn member(&self, name: &str) -> Result<(&Hierarchy, Member), CalcError> {
        self.cube
            .hierarchies()
            .iter()
            .find_map(|h| h.lookup(name).map(|m| (h, m.clone())))
            .ok_or_else(|| CalcError::NotFound(name.to_string()))
    }

    // ========================================================================
    // COMPILATION
    // ========================================================================

    /// Compiles `exp` into the calc that naturally computes it.
    pub fn compile(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let limit = self.limit();
        let calc = match exp {
            Exp::Literal { value } => constant(Value::from(value)),
            Exp::Member { name } => {
                let (hierarchy, member) = self.member(name)?;
                member_literal(hierarchy, member)
            }
            Exp::CurrentMember { hierarchy } => current_member(self.hierarchy(hierarchy)?),
            Exp::CurrentValue => current_value(),
            Exp::Members { hierarchy } => hierarchy_members(self.hierarchy(hierarchy)?, limit),
            Exp::LevelMembers { hierarchy, depth } => {
                let h = self.hierarchy(hierarchy)?;
                if h.level(*depth).is_none() {
                    return Err(CalcError::NotFound(format!("{}.<depth {}>", h.unique_name(), depth)));
                }
                level_members(h, *depth, limit)
            }
            Exp::Children { member } => children(self.compile_member(member)?, limit),
            Exp::Parent { member } => member_parent(self.compile_member(member)?),
            Exp::Name { member } => member_name(self.compile_member(member)?),
            Exp::Level { member } => member_level(self.compile_member(member)?),
            Exp::Hierarchy { member } => member_hierarchy(self.compile_member(member)?),
            Exp::Tuple { members } => self.compile_tuple_literal(members)?,
            Exp::Set { elements } => {
                let calcs = elements
                    .iter()
                    .map(|e| self.compile_element(e))
                    .collect::<Result<Vec<_>, _>>()?;
                set_literal(calcs, limit)?
            }
            Exp::CrossJoin { left, right } => crossjoin(
                self.compile_list(left, false)?,
                self.compile_list(right, false)?,
                limit,
            ),
            Exp::Filter { set, condition } => filter(
                self.compile_iterable(set)?,
                self.compile_boolean(condition)?,
                limit,
                self.config.simplify_context,
            ),
            Exp::Order {
                set,
                key,
                descending,
            } => order(
                self.compile_list(set, true)?,
                self.compile_numeric(key)?,
                *descending,
                self.config.simplify_context,
            ),
            Exp::Aggregate {
                function,
                set,
                value,
            } => {
                let value = value.as_deref().map(|v| self.compile_scalar(v)).transpose()?;
                aggregate(self.compile_iterable(set)?, value, *function, &self.config)
            }
            Exp::Count { set, include_empty } => {
                let set_calc = self.compile_set(set)?;
                if *include_empty && set_calc.result_style().is_list() {
                    list_count(set_calc)
                } else {
                    count(set_calc, *include_empty, &self.config)
                }
            }
            Exp::Arithmetic { op, left, right } => {
                arithmetic(*op, self.compile_numeric(left)?, self.compile_numeric(right)?)
            }
            Exp::Comparison { op, left, right } => {
                comparison(*op, self.compile_numeric(left)?, self.compile_numeric(right)?)
            }
            Exp::And { left, right } => and(self.compile_boolean(left)?, self.compile_boolean(right)?),
            Exp::Or { left, right } => or(self.compile_boolean(left)?, self.compile_boolean(right)?),
            Exp::Not { operand } => not(self.compile_boolean(operand)?),
            Exp::Iif {
                condition,
                then,
                otherwise,
            } => iif(
                self.compile_boolean(condition)?,
                self.compile_scalar(then)?,
                self.compile_scalar(otherwise)?,
            ),
        };
        Ok(calc)
    }

    /// Compiles `exp` with the first of `styles` its calc can be made to
    /// satisfy.
    pub fn compile_as(&self, exp: &Exp, styles: &[ResultStyle]) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        self.adapt(calc, styles)
    }

    /// Wraps `calc` so that its result style is one of `styles`.
    pub fn adapt(&self, calc: CalcRef, styles: &[ResultStyle]) -> Result<CalcRef, CalcError> {
        let (style, adaptation) = negotiate(calc.result_style(), styles)?;
        if adaptation != Adaptation::AsIs {
            log::debug!(
                "adapting {} from {} to {} ({:?})",
                calc.name(),
                calc.result_style(),
                style,
                adaptation
            );
        }
        Ok(adapter::adapt(calc, adaptation, style, self.limit()))
    }

    // ------------------------------------------------------------------------
    // Typed requests
    // ------------------------------------------------------------------------

    fn expect_type(calc: CalcRef, expected: &str, ok: bool) -> Result<CalcRef, CalcError> {
        if ok {
            Ok(calc)
        } else {
            Err(CalcError::TypeMismatch {
                expected: expected.to_string(),
                actual: calc.get_type().to_string(),
            })
        }
    }

    /// A scalar. Members and tuples compile to the value of the cell they
    /// address.
    pub fn compile_scalar(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        match calc.get_type() {
            Type::Member(_) => Ok(member_value(vec![calc])),
            Type::Tuple(_) => Ok(tuple_value(calc)),
            ty => {
                let ok = ty.is_scalar();
                Self::expect_type(calc, "SCALAR", ok)
            }
        }
    }

    pub fn compile_numeric(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile_scalar(exp)?;
        let ok = matches!(calc.get_type(), Type::Numeric | Type::Scalar | Type::Null);
        Self::expect_type(calc, "NUMERIC", ok)
    }

    pub fn compile_boolean(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile_scalar(exp)?;
        let ok = matches!(
            calc.get_type(),
            Type::Boolean | Type::Numeric | Type::Scalar | Type::Null
        );
        Self::expect_type(calc, "BOOLEAN", ok)
    }

    pub fn compile_member(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        let ok = matches!(calc.get_type(), Type::Member(_));
        Self::expect_type(calc, "MEMBER", ok)
    }

    /// A member or a tuple, as a set element.
    fn compile_element(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        let ok = matches!(calc.get_type(), Type::Member(_) | Type::Tuple(_));
        Self::expect_type(calc, "MEMBER or TUPLE", ok)
    }

    /// A set, in whatever style it naturally has.
    pub fn compile_set(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        let ok = calc.get_type().is_set();
        Self::expect_type(calc, "SET", ok)
    }

    /// A set as a list. With `mutable` the caller owns the list.
    pub fn compile_list(&self, exp: &Exp, mutable: bool) -> Result<CalcRef, CalcError> {
        let calc = self.compile_set(exp)?;
        self.adapt(calc, if mutable { MUTABLELIST_ONLY } else { LIST_MUTABLELIST })
    }

    /// A set to iterate once. Lists are fine as they are.
    pub fn compile_iterable(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile_set(exp)?;
        self.adapt(calc, ITERABLE_FIRST)
    }

    /// Any expression, run for its effect. Sets are walked to the end, so
    /// errors raised while iterating still surface.
    pub fn compile_void(&self, exp: &Exp) -> Result<CalcRef, CalcError> {
        let calc = self.compile(exp)?;
        let base = CalcBase::new("Void", "VoidCalc", Type::Void, ResultStyle::Value)
            .with_children(vec![calc.clone()]);
        Ok(Arc::new(VoidCalc::new(base, DependencyRule::Children, move |ev| {
            if calc.result_style() != ResultStyle::Iterable {
                return calc.evaluate_void(ev);
            }
            let iterable = calc.evaluate_iterable(ev)?;
            let mut cursor = iterable.tuple_cursor();
            while cursor.forward() {}
            Ok(())
        })))
    }

    fn compile_tuple_literal(&self, members: &[Exp]) -> Result<CalcRef, CalcError> {
        let calcs = members
            .iter()
            .map(|m| self.compile_member(m))
            .collect::<Result<Vec<_>, _>>()?;
        let ty = Type::Tuple(calcs.iter().map(|c| c.get_type().clone()).collect());
        let base = CalcBase::new("()", "TupleCalc", ty, ResultStyle::Value).with_children(calcs.clone());
        Ok(Arc::new(TupleCalc::new(base, DependencyRule::Children, move |ev| {
            let mut tuple = Tuple::with_capacity(calcs.len());
            for calc in &calcs {
                match calc.evaluate_member(ev)? {
                    Some(m) => tuple.push(m),
                    None => return Ok(None),
                }
            }
            Ok(Some(tuple))
        })))
    }
}
