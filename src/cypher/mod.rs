// src/cypher/mod.rs
// Structured Cypher builder used by the filter compiler.
//
// The compiler only ever produces AST values; text is produced once, at the
// end, by render.rs.

pub mod ast;
pub mod naming;
pub mod render;

pub use naming::VariableGenerator;
pub use render::{render_clauses, render_expression, render_pattern, render_predicate};
