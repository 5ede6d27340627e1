//! FILENAME: core/calc-engine/src/calc/value.rs
//! PURPOSE: The result of evaluating a calc.
//! CONTEXT: `Value` is what the generic `Calc::evaluate` returns. Typed
//! accessors on `Calc` convert out of it with the `into_*` methods here,
//! which fail with `TypeMismatch` rather than guessing.

use crate::error::CalcError;
use crate::tuple::{SharedIterable, Tuple, TupleIterable, TupleList};
use model::{CellError, CellValue, Hierarchy, Level, Member, Type};
use smallvec::smallvec;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Member(Member),
    Tuple(Tuple),
    Level(Level),
    Hierarchy(Hierarchy),
    List(TupleList),
    Iterable(SharedIterable),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Number(_) => "NUMERIC",
            Value::String(_) => "STRING",
            Value::Member(_) => "MEMBER",
            Value::Tuple(_) => "TUPLE",
            Value::Level(_) => "LEVEL",
            Value::Hierarchy(_) => "HIERARCHY",
            Value::List(_) => "LIST",
            Value::Iterable(_) => "ITERABLE",
        }
    }

    /// The static type of a literal holding this value.
    pub fn literal_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Boolean(_) => Type::Boolean,
            Value::Number(_) => Type::Numeric,
            Value::String(_) => Type::String,
            Value::Member(_) => Type::Member(None),
            Value::Tuple(t) => Type::Tuple(vec![Type::Member(None); t.len()]),
            Value::Level(_) => Type::Level(None),
            Value::Hierarchy(_) => Type::Hierarchy(None),
            Value::List(l) => Type::set_of(element_type(l.arity())),
            Value::Iterable(i) => Type::set_of(element_type(i.arity())),
        }
    }

    fn mismatch(self, expected: &str) -> CalcError {
        CalcError::TypeMismatch {
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }

    /// Null converts to false, numbers to `n != 0`.
    pub fn into_boolean(self) -> Result<bool, CalcError> {
        match self {
            Value::Boolean(b) => Ok(b),
            Value::Number(n) => Ok(n != 0.0),
            Value::Null => Ok(false),
            other => Err(other.mismatch("BOOLEAN")),
        }
    }

    pub fn into_number(self) -> Result<Option<f64>, CalcError> {
        match self {
            Value::Number(n) => Ok(Some(n)),
            Value::Null => Ok(None),
            other => Err(other.mismatch("NUMERIC")),
        }
    }

    pub fn into_string(self) -> Result<Option<String>, CalcError> {
        match self {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(CellValue::Number(n).display_value())),
            Value::Boolean(b) => Ok(Some(CellValue::Boolean(b).display_value())),
            other => Err(other.mismatch("STRING")),
        }
    }

    pub fn into_member(self) -> Result<Option<Member>, CalcError> {
        match self {
            Value::Member(m) => Ok(Some(m)),
            Value::Null => Ok(None),
            other => Err(other.mismatch("MEMBER")),
        }
    }

    /// A member is a 1-tuple.
    pub fn into_tuple(self) -> Result<Option<Tuple>, CalcError> {
        match self {
            Value::Tuple(t) => Ok(Some(t)),
            Value::Member(m) => Ok(Some(smallvec![m])),
            Value::Null => Ok(None),
            other => Err(other.mismatch("TUPLE")),
        }
    }

    pub fn into_level(self) -> Result<Option<Level>, CalcError> {
        match self {
            Value::Level(l) => Ok(Some(l)),
            Value::Null => Ok(None),
            other => Err(other.mismatch("LEVEL")),
        }
    }

    pub fn into_hierarchy(self) -> Result<Option<Hierarchy>, CalcError> {
        match self {
            Value::Hierarchy(h) => Ok(Some(h)),
            Value::Null => Ok(None),
            other => Err(other.mismatch("HIERARCHY")),
        }
    }

    /// An iterable is not a list; the compiler must have inserted an
    /// adapter if a list was required.
    pub fn into_list(self) -> Result<TupleList, CalcError> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(other.mismatch("LIST")),
        }
    }

    /// Any list is also an iterable.
    pub fn into_iterable(self) -> Result<SharedIterable, CalcError> {
        match self {
            Value::Iterable(i) => Ok(i),
            Value::List(l) => Ok(Arc::new(l)),
            other => Err(other.mismatch("ITERABLE")),
        }
    }

    /// Renders the value for plans and diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::json!(n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Member(m) => serde_json::Value::String(m.unique_name().to_string()),
            Value::Tuple(t) => t
                .iter()
                .map(|m| serde_json::Value::String(m.unique_name().to_string()))
                .collect(),
            Value::Level(l) => serde_json::Value::String(l.unique_name()),
            Value::Hierarchy(h) => serde_json::Value::String(h.unique_name().to_string()),
            Value::List(l) => serde_json::to_value(l).unwrap_or(serde_json::Value::Null),
            Value::Iterable(i) => serde_json::Value::String(format!("<iterable of arity {}>", i.arity())),
        }
    }
}

fn element_type(arity: usize) -> Type {
    match arity {
        1 => Type::Member(None),
        n => Type::Tuple(vec![Type::Member(None); n]),
    }
}

/// Cell errors become nulls: an erroneous cell has no value to compute with.
impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => Value::Null,
            CellValue::Number(n) => Value::Number(n),
            CellValue::Text(s) => Value::String(s),
            CellValue::Boolean(b) => Value::Boolean(b),
            CellValue::Error(CellError::Value) => Value::Null,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Member> for Value {
    fn from(m: Member) -> Self {
        Value::Member(m)
    }
}

impl From<TupleList> for Value {
    fn from(l: TupleList) -> Self {
        Value::List(l)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Member(m) => write!(f, "Member({})", m),
            Value::Tuple(t) => f.debug_tuple("Tuple").field(t).finish(),
            Value::Level(l) => write!(f, "Level({})", l.unique_name()),
            Value::Hierarchy(h) => write!(f, "Hierarchy({})", h),
            Value::List(l) => f.debug_tuple("List").field(l).finish(),
            Value::Iterable(i) => write!(f, "Iterable(arity={})", i.arity()),
        }
    }
}

/// Iterables compare by identity; everything else by content.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Member(a), Value::Member(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Level(a), Value::Level(b)) => a == b,
            (Value::Hierarchy(a), Value::Hierarchy(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Iterable(a), Value::Iterable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::RowLimit;
    use model::MemberKind;

    fn m(name: &str) -> Member {
        Member::new("Product", name, None, 0, MemberKind::Regular)
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(Value::from(CellValue::Empty), Value::Null);
        assert_eq!(Value::from(CellValue::Number(2.5)), Value::Number(2.5));
        assert_eq!(Value::from(CellValue::Error(CellError::Value)), Value::Null);
    }

    #[test]
    fn test_narrow_conversions() {
        assert_eq!(Value::Number(0.0).into_boolean(), Ok(false));
        assert_eq!(Value::Null.into_number(), Ok(None));
        assert_eq!(Value::Member(m("A")).into_tuple(), Ok(Some(smallvec![m("A")])));
        assert_eq!(
            Value::String("x".into()).into_number(),
            Err(CalcError::TypeMismatch {
                expected: "NUMERIC".into(),
                actual: "STRING".into()
            })
        );
    }

    #[test]
    fn test_list_is_iterable_but_not_vice_versa() {
        let list = TupleList::from_members(vec![m("A")], RowLimit::UNBOUNDED).unwrap();
        let iterable = Value::List(list).into_iterable().unwrap();
        assert_eq!(iterable.arity(), 1);

        let err = Value::Iterable(iterable).into_list().unwrap_err();
        assert!(matches!(err, CalcError::TypeMismatch { .. }));
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(Value::Number(1.0).literal_type(), Type::Numeric);
        let list = TupleList::new(2, RowLimit::UNBOUNDED);
        assert_eq!(Value::List(list).literal_type().arity(), 2);
    }
}
