// src/testing/mod.rs
// Test support: schema fixtures and an in-memory graph that executes
// compiled filters, so behavior can be checked on data and not only on text.

pub mod evaluator;
pub mod fixtures;
pub mod graph;
