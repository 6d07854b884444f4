// src/filter/mod.rs
// Filter compilation: GraphQL-style where objects to Cypher predicates.
//
// compile_object walks one filter object. AND, OR and NOT are handled here
// and every other key goes through property::build, which dispatches on the
// field kind to the relationship, connection, aggregate and cypher-field
// builders. Those recurse back into compile_object for nested objects.

pub mod key_parser;
pub mod operators;

mod aggregate;
mod connection;
mod context;
mod cypher_field;
mod interface;
mod property;
mod relationship;

use std::collections::BTreeSet;

use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

use crate::config::FilterConfig;
use crate::cypher::ast::{Clause, Predicate};
use crate::cypher::{render_clauses, render_predicate};
use crate::datatypes::ParamMap;
use crate::error::{ErrorKind, FilterError, Result};
use crate::schema::{FieldContainer, SchemaModel};
use context::{CompileContext, Fragment, Frame};
use relationship::as_filter_object;

pub use key_parser::{parse_filter_key, FilterOperator, ParsedFilterKey};

pub(crate) type FilterMap = serde_json::Map<String, JsonValue>;

/// Compile the keys of one filter object applying to `frame.variable`.
pub(crate) fn compile_object(
    ctx: &mut CompileContext<'_>,
    owner: &dyn FieldContainer,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Fragment> {
    let mut parts = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        let part = match key.as_str() {
            "AND" | "OR" => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FilterError::invalid_value(key, "a list of filter objects"))?;
                let mut branches = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let branch = ctx.descend(frame, &frame.variable, &format!("{}_{}", key, index))?;
                    branches.push(compile_object(ctx, owner, &branch, as_filter_object(key, item)?)?);
                }
                if key == "AND" {
                    Fragment::all(branches)
                } else {
                    Fragment::any(branches)
                }
            }
            "NOT" => {
                let nested = ctx.descend(frame, &frame.variable, key)?;
                compile_object(ctx, owner, &nested, as_filter_object(key, value)?)?.negate()
            }
            _ => property::build(ctx, owner, frame, key, value)?,
        };
        parts.push(part);
    }
    Ok(Fragment::all(parts))
}

// ============================================================================
// Compiled output
// ============================================================================

/// A compiled filter: subqueries that must run first, in order, the predicate
/// that reads their results, and the parameters both refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    /// Variable the root node is bound to
    pub variable: String,
    pub predicate: Option<Predicate>,
    pub subqueries: Vec<Clause>,
    pub params: ParamMap,
}

impl CompiledWhere {
    /// True when the filter constrains nothing
    pub fn is_empty(&self) -> bool {
        self.predicate.is_none() && self.subqueries.is_empty()
    }

    /// Names of every parameter the predicate and subqueries refer to
    pub fn referenced_parameters(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for clause in &self.subqueries {
            clause.collect_parameters(&mut names);
        }
        if let Some(predicate) = &self.predicate {
            predicate.collect_parameters(&mut names);
        }
        names
    }

    /// Subqueries followed by `WITH *` and the WHERE clause; empty when the
    /// filter constrains nothing.
    pub fn to_cypher(&self) -> String {
        let mut lines = Vec::new();
        if !self.subqueries.is_empty() {
            lines.push(render_clauses(&self.subqueries));
            lines.push("WITH *".to_string());
        }
        if let Some(predicate) = &self.predicate {
            lines.push(format!("WHERE {}", render_predicate(predicate)));
        }
        lines.join("\n")
    }

    /// Full read query returning the matching nodes of `label`.
    pub fn to_match_query(&self, label: &str) -> String {
        let mut query = format!("MATCH ({}:{})", self.variable, label);
        let filter = self.to_cypher();
        if !filter.is_empty() {
            query.push('\n');
            query.push_str(&filter);
        }
        query.push_str(&format!("\nRETURN {}", self.variable));
        query
    }

    pub fn check_bindings(&self) -> Result<()> {
        match self
            .referenced_parameters()
            .into_iter()
            .find(|name| !self.params.contains(name))
        {
            Some(name) => Err(FilterError::UnboundParameter(name)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles filters against a schema model. Holds no per-call state, so one
/// compiler can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct WhereCompiler<'a> {
    schema: &'a SchemaModel,
    config: FilterConfig,
}

impl<'a> WhereCompiler<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self::with_config(schema, FilterConfig::default())
    }

    pub fn with_config(schema: &'a SchemaModel, config: FilterConfig) -> Self {
        WhereCompiler { schema, config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Compile `filter` for nodes of `type_name`. A null or empty filter
    /// compiles to an empty result.
    pub fn compile(&self, type_name: &str, filter: &JsonValue) -> Result<CompiledWhere> {
        let result = self.compile_filter(type_name, filter);
        match &result {
            Ok(compiled) => debug!(
                type_name,
                params = compiled.params.len(),
                subqueries = compiled.subqueries.len(),
                "compiled filter"
            ),
            Err(e) => match e.kind() {
                ErrorKind::Internal => error!(type_name, error = %e, "filter compilation defect"),
                ErrorKind::ResourceLimit => warn!(type_name, error = %e, "filter rejected"),
                ErrorKind::UserInput | ErrorKind::SchemaMismatch => {
                    debug!(type_name, error = %e, "invalid filter")
                }
            },
        }
        result
    }

    fn compile_filter(&self, type_name: &str, filter: &JsonValue) -> Result<CompiledWhere> {
        let entity = self
            .schema
            .entity(type_name)
            .ok_or_else(|| FilterError::UnknownType(type_name.to_string()))?;
        let variable = self.config.root_variable.clone();

        let fragment = match filter {
            JsonValue::Null => Fragment::empty(),
            other => {
                let map = as_filter_object("where", other)?;
                let mut ctx = CompileContext::new(self.schema, &self.config);
                let fragment = interface::compile_entity(&mut ctx, entity, &Frame::root(&variable), map)?;
                let compiled = CompiledWhere {
                    variable,
                    predicate: fragment.predicate,
                    subqueries: fragment.subqueries,
                    params: ctx.params,
                };
                compiled.check_bindings()?;
                return Ok(compiled);
            }
        };
        Ok(CompiledWhere {
            variable,
            predicate: fragment.predicate,
            subqueries: fragment.subqueries,
            params: ParamMap::new(),
        })
    }
}

/// Compile with the default configuration.
pub fn compile_where(
    schema: &SchemaModel,
    type_name: &str,
    filter: &JsonValue,
) -> Result<CompiledWhere> {
    WhereCompiler::new(schema).compile(type_name, filter)
}
