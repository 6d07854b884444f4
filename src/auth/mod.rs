// src/auth/mod.rs
// Filters over JWT claims. Claim keys use the same grammar and operators as
// property filters; claim values and filter values are both bound as
// parameters, so the database evaluates the comparison.

pub mod claims;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::FilterConfig;
use crate::cypher::ast::{Expression, Predicate};
use crate::cypher::VariableGenerator;
use crate::datatypes::type_conversions::filter_value;
use crate::datatypes::{ParamMap, Value};
use crate::error::{FilterError, Result};
use crate::filter::key_parser::parse_filter_key;
use crate::filter::operators::{translate, LeafField, LeafType};
use crate::filter::CompiledWhere;

pub use claims::{parse_claim_path, ClaimResolver, JwtClaims};

/// A filterable claim and where it lives in the token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimField {
    pub name: String,
    /// Dotted path, defaults to the field name
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub array: bool,
}

impl ClaimField {
    pub fn new(name: &str) -> Self {
        ClaimField {
            name: name.to_string(),
            path: None,
            array: false,
        }
    }

    pub fn at(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    fn segments(&self) -> Result<Vec<String>> {
        match &self.path {
            Some(path) => parse_claim_path(path),
            None => Ok(vec![self.name.clone()]),
        }
    }
}

/// The claims a filter may refer to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JwtSchema {
    #[serde(default)]
    pub fields: Vec<ClaimField>,
}

impl JwtSchema {
    pub fn new() -> Self {
        JwtSchema::default()
    }

    pub fn with_claim(mut self, field: ClaimField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&ClaimField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

struct ClaimContext<'a> {
    schema: &'a JwtSchema,
    claims: &'a dyn ClaimResolver,
    config: &'a FilterConfig,
    names: VariableGenerator,
    params: ParamMap,
}

/// Compile a claim filter such as `{ roles_INCLUDES: "admin" }`. Each leaf
/// becomes `$claim IS NOT NULL AND <comparison>`, so absent claims never match.
pub fn compile_claim_filter(
    schema: &JwtSchema,
    claims: &dyn ClaimResolver,
    filter: &JsonValue,
    config: &FilterConfig,
) -> Result<CompiledWhere> {
    let mut ctx = ClaimContext {
        schema,
        claims,
        config,
        names: VariableGenerator::new(),
        params: ParamMap::new(),
    };
    let predicate = match filter {
        JsonValue::Null => None,
        JsonValue::Object(map) => claim_object(&mut ctx, &config.jwt_parameter, 0, map)?,
        _ => return Err(FilterError::invalid_value("jwt", "a filter object")),
    };
    debug!(params = ctx.params.len(), "compiled claim filter");
    Ok(CompiledWhere {
        variable: config.root_variable.clone(),
        predicate,
        subqueries: Vec::new(),
        params: ctx.params,
    })
}

fn claim_object(
    ctx: &mut ClaimContext<'_>,
    chain: &str,
    depth: usize,
    filter: &serde_json::Map<String, JsonValue>,
) -> Result<Option<Predicate>> {
    if depth > ctx.config.max_depth {
        return Err(FilterError::FilterTooDeep {
            max_depth: ctx.config.max_depth,
        });
    }
    let mut parts = Vec::new();
    for (key, value) in filter {
        let part = match key.as_str() {
            "AND" | "OR" => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FilterError::invalid_value(key, "a list of filter objects"))?;
                let mut branches = Vec::new();
                for (index, item) in items.iter().enumerate() {
                    let branch_chain = format!("{}_{}_{}", chain, key, index);
                    branches.extend(claim_object(ctx, &branch_chain, depth + 1, as_object(key, item)?)?);
                }
                if key == "AND" {
                    Predicate::and_all(branches)
                } else {
                    Predicate::or_all(branches)
                }
            }
            "NOT" => claim_object(ctx, &format!("{}_NOT", chain), depth + 1, as_object(key, value)?)?
                .map(Predicate::negate),
            _ => Some(claim_leaf(ctx, chain, key, value)?),
        };
        parts.extend(part);
    }
    Ok(Predicate::and_all(parts))
}

fn as_object<'v>(key: &str, value: &'v JsonValue) -> Result<&'v serde_json::Map<String, JsonValue>> {
    value
        .as_object()
        .ok_or_else(|| FilterError::invalid_value(key, "a filter object"))
}

fn claim_leaf(
    ctx: &mut ClaimContext<'_>,
    chain: &str,
    key: &str,
    value: &JsonValue,
) -> Result<Predicate> {
    let parsed = parse_filter_key(key)?;
    let field = ctx
        .schema
        .field(&parsed.field_name)
        .ok_or_else(|| FilterError::UnknownField {
            type_name: "JWT".to_string(),
            field: parsed.field_name.clone(),
        })?;
    let claim_value = ctx
        .claims
        .resolve(&field.segments()?)
        .map(Value::from)
        .unwrap_or(Value::Null);

    let claim_name = format!("{}_{}_claim", chain, key);
    ctx.params.insert(claim_name.clone(), claim_value)?;
    let claim = Expression::Parameter(claim_name);
    let present = Predicate::IsNotNull(claim.clone());

    if value.is_null() {
        return Ok(if parsed.is_not {
            present
        } else {
            Predicate::IsNull(claim)
        });
    }
    let value_name = format!("{}_{}", chain, key);
    ctx.params.insert(value_name.clone(), filter_value(key, value)?)?;
    let leaf = LeafField {
        name: &field.name,
        leaf: LeafType::Plain,
        is_array: field.array,
    };
    let comparison = translate(
        &mut ctx.names,
        parsed.operator,
        parsed.is_not,
        claim,
        Expression::Parameter(value_name),
        &leaf,
    )?;
    Ok(present.and(comparison))
}
