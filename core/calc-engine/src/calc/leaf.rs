//! FILENAME: core/calc-engine/src/calc/leaf.rs
//! Leaf calcs and calcs that read the evaluation context.
//!
//! Leaves state their dependencies explicitly: a literal depends on
//! nothing, the current cell on everything, a hierarchy's current member
//! on that hierarchy only.

use super::dependency::DependencyRule;
use super::{
    CalcBase, CalcRef, GenericCalc, HierarchyCalc, LevelCalc, MemberCalc, StringCalc, Value,
};
use crate::result_style::ResultStyle;
use model::{Evaluator, Hierarchy, Member, Type};
use std::sync::Arc;

/// A literal.
pub fn constant(value: Value) -> CalcRef {
    let base = CalcBase::new("Literal", "ConstantCalc", value.literal_type(), ResultStyle::Value)
        .with_arg("value", value.to_json());
    Arc::new(GenericCalc::new(base, DependencyRule::Never, move |_| Ok(value.clone())))
}

/// The value of the cell at the current context.
pub fn current_value() -> CalcRef {
    let base = CalcBase::new("CurrentValue", "ValueCalc", Type::Scalar, ResultStyle::Value);
    Arc::new(GenericCalc::new(base, DependencyRule::Always, |ev| {
        Ok(Value::from(ev.evaluate_current()))
    }))
}

/// `<Hierarchy>.CurrentMember`
pub fn current_member(hierarchy: &Hierarchy) -> CalcRef {
    let base = CalcBase::new(
        "CurrentMember",
        "HierarchyCurrentMemberCalc",
        Type::member_of(hierarchy),
        ResultStyle::Value,
    )
    .with_arg("hierarchy", hierarchy.unique_name());
    let h = hierarchy.clone();
    Arc::new(MemberCalc::new(
        base,
        DependencyRule::Hierarchy(hierarchy.clone()),
        move |ev| Ok(Some(ev.get_context(&h).clone())),
    ))
}

/// A member named in the query text.
pub fn member_literal(hierarchy: &Hierarchy, member: Member) -> CalcRef {
    let base = CalcBase::new("Literal", "ConstantCalc", Type::member_of(hierarchy), ResultStyle::Value)
        .with_arg("value", member.unique_name());
    Arc::new(MemberCalc::new(base, DependencyRule::Never, move |_| Ok(Some(member.clone()))))
}

/// The value of the cell at the current context overridden by `members`.
///
/// The result does not depend on a hierarchy one of the members pins.
pub fn member_value(members: Vec<CalcRef>) -> CalcRef {
    let base = CalcBase::new("MemberValue", "MemberValueCalc", Type::Scalar, ResultStyle::Value)
        .with_children(members.clone());
    Arc::new(GenericCalc::new(base, DependencyRule::ButDepends, move |ev| {
        let mut resolved = Vec::with_capacity(members.len());
        for calc in &members {
            match calc.evaluate_member(ev)? {
                Some(m) => resolved.push(m),
                None => return Ok(Value::Null),
            }
        }
        Ok(evaluate_at(ev, &resolved))
    }))
}

/// The value of the cell at the current context overridden by a tuple.
pub fn tuple_value(tuple: CalcRef) -> CalcRef {
    let base = CalcBase::new("TupleValue", "TupleValueCalc", Type::Scalar, ResultStyle::Value)
        .with_children(vec![tuple.clone()]);
    Arc::new(GenericCalc::new(base, DependencyRule::ButDepends, move |ev| {
        match tuple.evaluate_tuple(ev)? {
            Some(t) => Ok(evaluate_at(ev, &t)),
            None => Ok(Value::Null),
        }
    }))
}

/// Reads the current cell in a pushed context moved to `members`.
pub(crate) fn evaluate_at(evaluator: &dyn Evaluator, members: &[Member]) -> Value {
    let mut pushed = evaluator.push();
    for m in members {
        pushed.set_context(m);
    }
    Value::from(pushed.evaluate_current())
}

/// `<Member>.Name`
pub fn member_name(member: CalcRef) -> CalcRef {
    let base = CalcBase::new("Name", "MemberNameCalc", Type::String, ResultStyle::Value)
        .with_children(vec![member.clone()]);
    Arc::new(StringCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(member.evaluate_member(ev)?.map(|m| m.name().to_string()))
    }))
}

/// `<Member>.Parent`
pub fn member_parent(member: CalcRef) -> CalcRef {
    let ty = member.get_type().clone();
    let base = CalcBase::new("Parent", "MemberParentCalc", ty, ResultStyle::Value)
        .with_children(vec![member.clone()]);
    Arc::new(MemberCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(member.evaluate_member(ev)?.and_then(|m| m.parent().cloned()))
    }))
}

/// `<Member>.Level`
pub fn member_level(member: CalcRef) -> CalcRef {
    let ty = Type::Level(member_hierarchy_type(member.get_type()));
    let base = CalcBase::new("Level", "MemberLevelCalc", ty, ResultStyle::Value)
        .with_children(vec![member.clone()]);
    Arc::new(LevelCalc::new(base, DependencyRule::Children, move |ev| {
        let Some(m) = member.evaluate_member(ev)? else {
            return Ok(None);
        };
        Ok(ev
            .cube()
            .hierarchy(m.hierarchy_name())
            .and_then(|h| h.level(m.depth()).cloned()))
    }))
}

/// `<Member>.Hierarchy`
pub fn member_hierarchy(member: CalcRef) -> CalcRef {
    let ty = Type::Hierarchy(member_hierarchy_type(member.get_type()));
    let base = CalcBase::new("Hierarchy", "MemberHierarchyCalc", ty, ResultStyle::Value)
        .with_children(vec![member.clone()]);
    Arc::new(HierarchyCalc::new(base, DependencyRule::Children, move |ev| {
        let Some(m) = member.evaluate_member(ev)? else {
            return Ok(None);
        };
        Ok(ev.cube().hierarchy(m.hierarchy_name()).cloned())
    }))
}

fn member_hierarchy_type(ty: &Type) -> Option<Hierarchy> {
    match ty {
        Type::Member(h) => h.clone(),
        _ => None,
    }
}
