// src/lib.rs
//! Compiles GraphQL-style filter inputs, typed against a graph schema model,
//! into parameterised Cypher predicates.
//!
//! ```text
//! Filter JSON -> key parser -> property / relationship / connection /
//!   aggregate builders -> Predicate tree + hoisted CALL subqueries + params
//! ```
pub mod auth;
pub mod config;
pub mod cypher;
pub mod datatypes;
pub mod error;
pub mod filter;
pub mod schema;

#[cfg(test)]
mod testing;

pub use config::FilterConfig;
pub use datatypes::{ParamMap, Value};
pub use error::{ErrorKind, FilterError, Result};
pub use filter::{compile_where, CompiledWhere, WhereCompiler};
pub use schema::SchemaModel;
