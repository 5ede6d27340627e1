//! FILENAME: core/calc-engine/src/compiler/exp.rs
//! PURPOSE: Defines the logical expression tree the compiler consumes.
//! CONTEXT: A query front end resolves and validates MDX into this tree.
//! The `ExpCompiler` then turns it into a tree of calcs. Names of members
//! and hierarchies are resolved against the cube at compile time.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: null, numbers, strings, booleans
//! - Members by unique name, `<Hierarchy>.CurrentMember`, the current cell
//! - Member properties: Parent, Name, Level, Hierarchy
//! - Tuples `(m1, m2)` and set literals `{e1, e2}`
//! - Set functions: Members, level members, Children, CrossJoin, Filter, Order
//! - Aggregates: Sum, Count, Avg, Min, Max, Var, StdDev
//! - Arithmetic, comparison and logical operators, IIf

use crate::calc::aggregate::AggregateFunction;
use crate::calc::scalar::{ArithmeticOp, ComparisonOp};
use crate::calc::Value;
use serde::{Deserialize, Serialize};

/// A literal value in an expression.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// A logical expression.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Exp {
    Literal { value: Literal },

    /// A member by unique name, e.g. `[Product].[Fruit]`. A plain name is
    /// accepted when it is unambiguous within its hierarchy.
    Member { name: String },

    CurrentMember { hierarchy: String },

    /// The cell at the current context.
    CurrentValue,

    /// All members of a hierarchy, including the all member.
    Members { hierarchy: String },

    /// Members at one depth of a hierarchy; the all level is depth 0.
    LevelMembers { hierarchy: String, depth: u32 },

    Children { member: Box<Exp> },
    Parent { member: Box<Exp> },
    Name { member: Box<Exp> },
    Level { member: Box<Exp> },
    Hierarchy { member: Box<Exp> },

    Tuple { members: Vec<Exp> },
    Set { elements: Vec<Exp> },

    CrossJoin { left: Box<Exp>, right: Box<Exp> },
    Filter { set: Box<Exp>, condition: Box<Exp> },
    Order {
        set: Box<Exp>,
        key: Box<Exp>,
        #[serde(default)]
        descending: bool,
    },

    /// Aggregates `value` over `set`; without a value, the current cell.
    Aggregate {
        function: AggregateFunction,
        set: Box<Exp>,
        #[serde(default)]
        value: Option<Box<Exp>>,
    },
    Count {
        set: Box<Exp>,
        #[serde(default)]
        include_empty: bool,
    },

    Arithmetic { op: ArithmeticOp, left: Box<Exp>, right: Box<Exp> },
    Comparison { op: ComparisonOp, left: Box<Exp>, right: Box<Exp> },
    And { left: Box<Exp>, right: Box<Exp> },
    Or { left: Box<Exp>, right: Box<Exp> },
    Not { operand: Box<Exp> },
    Iif { condition: Box<Exp>, then: Box<Exp>, otherwise: Box<Exp> },
}

// Shorthand constructors, mostly for tests and embedding.
impl Exp {
    pub fn number(n: f64) -> Exp {
        Exp::Literal { value: Literal::Number(n) }
    }

    pub fn string(s: &str) -> Exp {
        Exp::Literal { value: Literal::String(s.to_string()) }
    }

    pub fn member(name: &str) -> Exp {
        Exp::Member { name: name.to_string() }
    }

    pub fn current_member(hierarchy: &str) -> Exp {
        Exp::CurrentMember { hierarchy: hierarchy.to_string() }
    }

    pub fn members(hierarchy: &str) -> Exp {
        Exp::Members { hierarchy: hierarchy.to_string() }
    }

    pub fn level_members(hierarchy: &str, depth: u32) -> Exp {
        Exp::LevelMembers { hierarchy: hierarchy.to_string(), depth }
    }

    pub fn children(member: Exp) -> Exp {
        Exp::Children { member: Box::new(member) }
    }

    pub fn crossjoin(left: Exp, right: Exp) -> Exp {
        Exp::CrossJoin { left: Box::new(left), right: Box::new(right) }
    }

    pub fn filter(set: Exp, condition: Exp) -> Exp {
        Exp::Filter { set: Box::new(set), condition: Box::new(condition) }
    }

    pub fn order(set: Exp, key: Exp, descending: bool) -> Exp {
        Exp::Order { set: Box::new(set), key: Box::new(key), descending }
    }

    pub fn aggregate(function: AggregateFunction, set: Exp, value: Option<Exp>) -> Exp {
        Exp::Aggregate { function, set: Box::new(set), value: value.map(Box::new) }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Exp, right: Exp) -> Exp {
        Exp::Arithmetic { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn comparison(op: ComparisonOp, left: Exp, right: Exp) -> Exp {
        Exp::Comparison { op, left: Box::new(left), right: Box::new(right) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "kind": "aggregate",
            "function": "Sum",
            "set": {
                "kind": "crossJoin",
                "left": {"kind": "children", "member": {"kind": "member", "name": "[Product].[Fruit]"}},
                "right": {"kind": "levelMembers", "hierarchy": "Time", "depth": 1}
            }
        }"#;
        let exp: Exp = serde_json::from_str(json).unwrap();
        assert_eq!(
            exp,
            Exp::aggregate(
                AggregateFunction::Sum,
                Exp::crossjoin(Exp::children(Exp::member("[Product].[Fruit]")), Exp::level_members("Time", 1)),
                None,
            )
        );
    }

    #[test]
    fn test_literals_are_untagged() {
        let exp: Exp = serde_json::from_str(r#"{"kind": "literal", "value": 2.5}"#).unwrap();
        assert_eq!(exp, Exp::number(2.5));
        let null: Exp = serde_json::from_str(r#"{"kind": "literal", "value": null}"#).unwrap();
        assert_eq!(null, Exp::Literal { value: Literal::Null });
        let unit: Exp = serde_json::from_str(r#"{"kind": "currentValue"}"#).unwrap();
        assert_eq!(unit, Exp::CurrentValue);
    }

    #[test]
    fn test_operator_survives_json() {
        let exp = Exp::arithmetic(
            ArithmeticOp::Divide,
            Exp::CurrentValue,
            Exp::comparison(ComparisonOp::Less, Exp::number(1.0), Exp::number(2.0)),
        );
        let json = serde_json::to_string(&exp).unwrap();
        assert_eq!(serde_json::from_str::<Exp>(&json).unwrap(), exp);

        let parsed: Exp = serde_json::from_str(
            r#"{"kind": "arithmetic", "op": "Divide",
                "left": {"kind": "currentValue"},
                "right": {"kind": "literal", "value": 4}}"#,
        )
        .unwrap();
        assert_eq!(parsed, Exp::arithmetic(ArithmeticOp::Divide, Exp::CurrentValue, Exp::number(4.0)));
    }
}
