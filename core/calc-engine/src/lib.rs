//! FILENAME: core/calc-engine/src/lib.rs
//! PURPOSE: Main library entry point for the calc engine.
//! CONTEXT: The expression-evaluation core of a multidimensional query
//! engine. The compiler turns logical expressions into immutable trees of
//! typed calcs; evaluating a calc against an `Evaluator` yields scalars,
//! members, tuples or sets of tuples. Sets live in the tuple collections of
//! `tuple`, whose growth is capped by a configurable row limit.

pub mod calc;
pub mod compiler;
pub mod config;
pub mod error;
pub mod result_style;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use calc::{explain, Calc, CalcPlan, CalcRef, Value};
pub use compiler::{Exp, ExpCompiler};
pub use config::CalcConfig;
pub use error::{CalcError, ResourceLimitError};
pub use result_style::{negotiate, Adaptation, ResultStyle, ResultStyleError};
pub use tuple::{
    materialize, IndexedTuples, LazyTupleList, RowLimit, Tuple, TupleCursor, TupleIterable,
    TupleList,
};
