// src/filter/context.rs
// Per-compilation state and per-frame scoping.

use crate::config::FilterConfig;
use crate::cypher::ast::{Clause, Expression, Predicate};
use crate::cypher::VariableGenerator;
use crate::datatypes::{ParamMap, Value};
use crate::error::{FilterError, Result};
use crate::schema::SchemaModel;

/// Mutable state of a single compilation. Created per call and dropped at
/// the end, so concurrent compilations share nothing but the schema.
pub(crate) struct CompileContext<'a> {
    pub schema: &'a SchemaModel,
    pub config: &'a FilterConfig,
    pub names: VariableGenerator,
    pub params: ParamMap,
}

impl<'a> CompileContext<'a> {
    pub fn new(schema: &'a SchemaModel, config: &'a FilterConfig) -> Self {
        CompileContext {
            schema,
            config,
            names: VariableGenerator::new(),
            params: ParamMap::new(),
        }
    }

    /// Bind a value and return the parameter expression referring to it.
    pub fn bind(&mut self, name: String, value: Value) -> Result<Expression> {
        self.params.insert(name.clone(), value)?;
        Ok(Expression::Parameter(name))
    }

    /// Enter a nested filter object. The parameter chain grows by `segment`
    /// and the filter now applies to `variable`.
    pub fn descend(&self, frame: &Frame, variable: &str, segment: &str) -> Result<Frame> {
        let depth = frame.depth + 1;
        if depth > self.config.max_depth {
            return Err(FilterError::FilterTooDeep {
                max_depth: self.config.max_depth,
            });
        }
        Ok(Frame {
            variable: variable.to_string(),
            chain: format!("{}_{}", frame.chain, segment),
            depth,
        })
    }
}

/// Where a filter object applies: the Cypher variable it constrains, the
/// parameter-name chain leading to it and its nesting depth.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Frame {
    pub variable: String,
    pub chain: String,
    pub depth: usize,
}

impl Frame {
    pub fn root(variable: &str) -> Self {
        Frame {
            variable: variable.to_string(),
            chain: variable.to_string(),
            depth: 0,
        }
    }

    /// Parameter name for a leaf key in this frame
    pub fn param_name(&self, key: &str) -> String {
        format!("{}_{}", self.chain, key)
    }
}

/// Output of one builder: an optional inline predicate plus the subqueries
/// that must run, in order, before it is evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Fragment {
    pub predicate: Option<Predicate>,
    pub subqueries: Vec<Clause>,
}

impl Fragment {
    pub fn empty() -> Self {
        Fragment::default()
    }

    pub fn inline(predicate: Predicate) -> Self {
        Fragment {
            predicate: Some(predicate),
            subqueries: Vec::new(),
        }
    }

    pub fn needs_precompute(&self) -> bool {
        !self.subqueries.is_empty()
    }

    pub fn negate(self) -> Self {
        Fragment {
            predicate: self.predicate.map(Predicate::negate),
            subqueries: self.subqueries,
        }
    }

    /// AND the predicates; subqueries keep discovery order.
    pub fn all(parts: Vec<Fragment>) -> Self {
        Self::combine(parts, |p| Predicate::and_all(p))
    }

    pub fn any(parts: Vec<Fragment>) -> Self {
        Self::combine(parts, |p| Predicate::or_all(p))
    }

    fn combine(parts: Vec<Fragment>, join: fn(Vec<Predicate>) -> Option<Predicate>) -> Self {
        let mut predicates = Vec::new();
        let mut subqueries = Vec::new();
        for part in parts {
            predicates.extend(part.predicate);
            subqueries.extend(part.subqueries);
        }
        Fragment {
            predicate: join(predicates),
            subqueries,
        }
    }
}
