//! FILENAME: core/calc-engine/src/calc/adapter.rs
//! Calcs the compiler inserts to bridge result styles.

use super::dependency::DependencyRule;
use super::{CalcBase, CalcRef, ListCalc};
use crate::result_style::{Adaptation, ResultStyle};
use crate::tuple::{materialize, IndexedTuples, RowLimit};
use std::sync::Arc;

/// Materializes an iterable-style calc into a list.
///
/// With style `List` the list comes back fixed; with `MutableList` the
/// caller owns it.
pub fn iterable_to_list(calc: CalcRef, style: ResultStyle, limit: RowLimit) -> CalcRef {
    assert!(style.is_list(), "cannot materialize into style {}", style);
    let base = CalcBase::new(calc.name(), "IterableListCalc", calc.get_type().clone(), style)
        .with_children(vec![calc.clone()]);
    Arc::new(ListCalc::new(base, DependencyRule::Children, move |ev| {
        let iterable = calc.evaluate_iterable(ev)?;
        let list = materialize(&*iterable, limit)?;
        log::debug!("materialized {} tuples from {}", list.len(), calc.name());
        Ok(if style == ResultStyle::List {
            list.into_fixed()
        } else {
            list
        })
    }))
}

/// Copies a possibly shared list so the caller may modify it.
pub fn copy_list(calc: CalcRef) -> CalcRef {
    let base = CalcBase::new(
        calc.name(),
        "CopyListCalc",
        calc.get_type().clone(),
        ResultStyle::MutableList,
    )
    .with_children(vec![calc.clone()]);
    Arc::new(ListCalc::new(base, DependencyRule::Children, move |ev| {
        Ok(calc.evaluate_list(ev)?.clone_list(-1))
    }))
}

/// Wraps `calc` according to a negotiated adaptation.
pub fn adapt(calc: CalcRef, adaptation: Adaptation, style: ResultStyle, limit: RowLimit) -> CalcRef {
    match adaptation {
        Adaptation::AsIs => calc,
        Adaptation::Materialize => iterable_to_list(calc, style, limit),
        Adaptation::Copy => copy_list(calc),
    }
}
