//! FILENAME: core/calc-engine/src/error.rs

use crate::result_style::ResultStyleError;
use thiserror::Error;

/// A tuple list tried to grow past the configured result limit.
///
/// This is the guard against runaway cross joins. It carries the numbers a
/// front end needs to render a specific message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("size of tuple list ({attempted}) exceeded result limit ({limit})")]
pub struct ResourceLimitError {
    /// Number of tuples the list would have held.
    pub attempted: usize,
    /// The configured row limit.
    pub limit: usize,
}

impl ResourceLimitError {
    /// Stable message key for localized rendering.
    pub fn code(&self) -> &'static str {
        "LimitExceededDuringCrossjoin"
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error(transparent)]
    LimitExceeded(#[from] ResourceLimitError),

    #[error("tuple list is immutable")]
    ImmutableList,

    #[error("tuple of arity {actual} does not fit a list of arity {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    ResultStyle(#[from] ResultStyleError),

    #[error("expected type {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("'{0}' not found in cube")]
    NotFound(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),
}

impl CalcError {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, CalcError::LimitExceeded(_))
    }
}
