//! FILENAME: core/calc-engine/src/result_style.rs
//! Result style negotiation.
//!
//! A compiled calc commits to one `ResultStyle`: how it hands back its
//! result. A caller asks for an ordered list of styles it can consume, most
//! preferred first. `negotiate` picks the first requested style the calc
//! can satisfy and says which adapter (if any) bridges the gap.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStyle {
    /// Whatever the calc naturally produces.
    Any,
    /// A list the caller owns and may modify.
    MutableList,
    /// A list that may be shared; callers must not modify it.
    List,
    /// A forward-only sequence of tuples.
    Iterable,
    /// A scalar, member or tuple.
    Value,
}

impl ResultStyle {
    pub fn is_list(self) -> bool {
        matches!(self, ResultStyle::List | ResultStyle::MutableList)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResultStyle::Any => "ANY",
            ResultStyle::MutableList => "MUTABLE_LIST",
            ResultStyle::List => "LIST",
            ResultStyle::Iterable => "ITERABLE",
            ResultStyle::Value => "VALUE",
        }
    }
}

impl fmt::Display for ResultStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Common preference lists.
pub const ANY_LIST: &[ResultStyle] = &[ResultStyle::Any];
pub const ANY_ONLY: &[ResultStyle] = &[ResultStyle::Any];
pub const VALUE_ONLY: &[ResultStyle] = &[ResultStyle::Value];
pub const ITERABLE_ONLY: &[ResultStyle] = &[ResultStyle::Iterable];
pub const ITERABLE_FIRST: &[ResultStyle] = &[ResultStyle::Iterable, ResultStyle::Any];
pub const LIST_ONLY: &[ResultStyle] = &[ResultStyle::List];
pub const MUTABLELIST_ONLY: &[ResultStyle] = &[ResultStyle::MutableList];
pub const LIST_MUTABLELIST: &[ResultStyle] = &[ResultStyle::List, ResultStyle::MutableList];
pub const ITERABLE_LIST_MUTABLELIST: &[ResultStyle] = &[
    ResultStyle::Iterable,
    ResultStyle::List,
    ResultStyle::MutableList,
];

/// No adapter can turn the calc's style into any requested style.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot satisfy result styles {requested:?} with a calc of style {actual}")]
pub struct ResultStyleError {
    pub requested: Vec<ResultStyle>,
    pub actual: ResultStyle,
}

/// How a calc's natural result is bridged to the negotiated style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adaptation {
    /// The calc satisfies the style directly.
    AsIs,
    /// An iterable is materialized into a freshly built list.
    Materialize,
    /// A possibly shared list is cloned before the caller may mutate it.
    Copy,
}

/// Picks the first of `requested` that a calc of style `actual` can meet.
pub fn negotiate(
    actual: ResultStyle,
    requested: &[ResultStyle],
) -> Result<(ResultStyle, Adaptation), ResultStyleError> {
    use ResultStyle::*;

    for &style in requested {
        let adaptation = match (style, actual) {
            (Any, _) | (_, Any) => Some(Adaptation::AsIs),
            (s, a) if s == a => Some(Adaptation::AsIs),
            // A list the caller may mutate is also fine to only read.
            (List, MutableList) => Some(Adaptation::AsIs),
            (List, Iterable) | (MutableList, Iterable) => Some(Adaptation::Materialize),
            (MutableList, List) => Some(Adaptation::Copy),
            (Iterable, List) | (Iterable, MutableList) => Some(Adaptation::AsIs),
            _ => None,
        };
        if let Some(adaptation) = adaptation {
            let negotiated = if style == Any { actual } else { style };
            return Ok((negotiated, adaptation));
        }
    }

    Err(ResultStyleError {
        requested: requested.to_vec(),
        actual,
    })
}
