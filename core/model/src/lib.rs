//! FILENAME: core/model/src/lib.rs
//! PURPOSE: Main library entry point for the dimensional model.
//! CONTEXT: These are the types the calc engine consumes from its neighbours:
//! members, hierarchies, cubes, expression types and the evaluation context.
//! They are kept deliberately small; schema loading and SQL access live
//! elsewhere.

pub mod cell;
pub mod cube;
pub mod evaluator;
pub mod fact_table;
pub mod hierarchy;
pub mod member;
pub mod types;

// Re-export commonly used types at the crate root
pub use cell::{CellError, CellValue};
pub use cube::Cube;
pub use evaluator::{Evaluator, MemoryEvaluator};
pub use fact_table::FactTable;
pub use hierarchy::{Hierarchy, HierarchyBuilder, Level};
pub use member::{Member, MemberKind};
pub use types::Type;
