//! FILENAME: core/calc-engine/src/calc/writer.rs
//! Plans: readable dumps of compiled calc trees.
//!
//! A text plan prints one calc per line, children indented under their
//! parent:
//!
//! ```text
//! AggregateCalc(name=Sum, class=AggregateCalc, type=NUMERIC, resultStyle=VALUE, function=Sum)
//!     MemberChildrenCalc(name=Children, ...)
//!         ConstantCalc(name=Literal, ...)
//!     ValueCalc(name=CurrentValue, ...)
//! ```
//!
//! `CalcPlan` is the same tree as a serializable value.

use super::{Calc, CalcArgs, CalcBase};
use serde::Serialize;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Visits a calc tree and renders it as indented text.
#[derive(Debug, Default)]
pub struct CalcWriter {
    text: String,
    depth: usize,
}

impl CalcWriter {
    pub fn new() -> Self {
        CalcWriter::default()
    }

    /// Writes one line for `base` and then visits its children.
    pub fn visit(&mut self, base: &CalcBase) {
        for _ in 0..self.depth {
            self.text.push_str(INDENT);
        }
        // writing into a String cannot fail
        let _ = writeln!(self.text, "{}({})", base.class(), base.arguments());

        self.depth += 1;
        for child in base.children() {
            child.accept(self);
        }
        self.depth -= 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Renders `calc` as a text plan.
pub fn explain(calc: &dyn Calc) -> String {
    let mut writer = CalcWriter::new();
    calc.accept(&mut writer);
    writer.into_text()
}

/// One node of a plan tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcPlan {
    pub name: String,
    pub arguments: CalcArgs,
    pub children: Vec<CalcPlan>,
}

impl CalcPlan {
    pub fn of(calc: &dyn Calc) -> Self {
        let base = calc.base();
        CalcPlan {
            name: base.class().to_string(),
            arguments: base.arguments(),
            children: base.children().iter().map(|c| CalcPlan::of(&**c)).collect(),
        }
    }

    /// Total number of nodes.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CalcPlan::size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::leaf::{constant, current_value};
    use crate::calc::scalar::{arithmetic, ArithmeticOp};
    use crate::calc::Value;

    #[test]
    fn test_text_plan_indents_children() {
        let calc = arithmetic(ArithmeticOp::Add, constant(Value::Number(1.0)), current_value());
        let text = explain(&*calc);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ArithmeticCalc(name=+, class=ArithmeticCalc, type=NUMERIC, resultStyle=VALUE)"
        );
        assert!(lines[1].starts_with("    ConstantCalc(name=Literal"));
        assert!(lines[1].ends_with("value=1.0)"));
        assert!(lines[2].starts_with("    ValueCalc("));
    }

    #[test]
    fn test_plan_serializes_in_order() {
        let calc = arithmetic(ArithmeticOp::Divide, constant(Value::Number(1.0)), constant(Value::Number(2.0)));
        let plan = CalcPlan::of(&*calc);
        assert_eq!(plan.size(), 3);

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["name"], "ArithmeticCalc");
        assert_eq!(json["arguments"]["name"], "/");
        assert_eq!(json["children"][1]["arguments"]["value"], 2.0);
    }
}
