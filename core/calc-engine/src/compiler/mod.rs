//! FILENAME: core/calc-engine/src/compiler/mod.rs
//! Expression compiler: logical expressions in, calc trees out.

pub mod compile;
pub mod exp;

pub use compile::ExpCompiler;
pub use exp::{Exp, Literal};
