// src/filter/property.rs
// Dispatches one filter key to the builder for its field kind.

use serde_json::Value as JsonValue;

use super::context::{CompileContext, Fragment, Frame};
use super::key_parser::{parse_filter_key, FilterOperator, ParsedFilterKey};
use super::operators::{translate, LeafField};
use super::{aggregate, connection, cypher_field, relationship};
use crate::cypher::ast::{Expression, Predicate};
use crate::datatypes::type_conversions::{coerce_scalar, filter_value};
use crate::datatypes::Value;
use crate::error::{FilterError, Result};
use crate::schema::global_id::from_global_id;
use crate::schema::{FieldContainer, FieldKind, SchemaField};

/// Key of the opaque identifier on types with a global-id field
const GLOBAL_ID_KEY: &str = "id";

/// Build the fragment for a single `key: value` pair of a filter object
/// applying to `frame.variable`, an instance of `owner`.
pub(crate) fn build(
    ctx: &mut CompileContext<'_>,
    owner: &dyn FieldContainer,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Fragment> {
    let parsed = parse_filter_key(key)?;

    if parsed.is_aggregate {
        let field = lookup(owner, &parsed.field_name)?;
        return match &field.kind {
            FieldKind::Relationship(rel) => {
                aggregate::build(ctx, field, rel, parsed.is_not, frame, key, value)
            }
            _ => Err(FilterError::AggregateOnNonRelationship {
                field: field.name.clone(),
            }),
        };
    }

    if parsed.field_name == GLOBAL_ID_KEY {
        if let Some(global_field) = owner.global_id_field() {
            return global_id(ctx, owner, global_field, &parsed, frame, key, value)
                .map(Fragment::inline);
        }
    }

    let field = lookup(owner, &parsed.field_name)
        .map_err(|err| unknown_suffix(owner, &parsed.field_name).unwrap_or(err))?;
    match &field.kind {
        FieldKind::Relationship(rel) => relationship::build(ctx, field, rel, &parsed, frame, key, value),
        FieldKind::Connection(conn) => {
            connection::build(ctx, owner, field, conn, &parsed, frame, key, value)
        }
        FieldKind::CypherComputed(cypher) => {
            cypher_field::build(ctx, field, cypher, &parsed, frame, key, value)
        }
        FieldKind::Primitive | FieldKind::Enum | FieldKind::Temporal(_) | FieldKind::Spatial(_) => {
            let target = property_target(&frame.variable, field);
            scalar(ctx, field, &parsed, target, frame.param_name(key), value).map(Fragment::inline)
        }
    }
}

pub(crate) fn lookup<'o>(owner: &'o dyn FieldContainer, name: &str) -> Result<&'o SchemaField> {
    owner.field(name).ok_or_else(|| FilterError::UnknownField {
        type_name: owner.type_name().to_string(),
        field: name.to_string(),
    })
}

/// `title_BETWEEN` or `title_NOT_BETWEEN` where `title` exists: the suffix
/// is an operator the grammar does not know.
fn unknown_suffix(owner: &dyn FieldContainer, name: &str) -> Option<FilterError> {
    name.match_indices('_').find_map(|(at, _)| {
        let (prefix, suffix) = (&name[..at], &name[at + 1..]);
        let is_operator = suffix.starts_with(|c: char| c.is_ascii_uppercase())
            && suffix.chars().all(|c| c.is_ascii_uppercase() || c == '_');
        let field = prefix.strip_suffix("_NOT").unwrap_or(prefix);
        (is_operator && owner.field(field).is_some()).then(|| FilterError::UnknownOperator {
            operator: suffix.to_string(),
            field: field.to_string(),
        })
    })
}

/// `var.prop`, wrapped in `coalesce` when the field declares a default
pub(crate) fn property_target(variable: &str, field: &SchemaField) -> Expression {
    let property = Expression::property(variable, field.db_property());
    match &field.coalesce_default {
        Some(default) => Expression::call(
            "coalesce",
            vec![property, Expression::Literal(Value::from(default))],
        ),
        None => property,
    }
}

/// Leaf comparison of `target` against `value`, bound as `param_name`.
/// A null value short-circuits to an IS NULL test.
pub(crate) fn scalar(
    ctx: &mut CompileContext<'_>,
    field: &SchemaField,
    parsed: &ParsedFilterKey,
    target: Expression,
    param_name: String,
    value: &JsonValue,
) -> Result<Predicate> {
    if value.is_null() {
        return Ok(if parsed.is_not {
            Predicate::IsNotNull(target)
        } else {
            Predicate::IsNull(target)
        });
    }
    if let Some(op) = parsed.operator.filter(FilterOperator::is_list_quantifier) {
        return Err(FilterError::UnknownOperator {
            operator: op.to_string(),
            field: field.name.clone(),
        });
    }
    let param = ctx.bind(param_name, filter_value(&field.name, value)?)?;
    translate(
        &mut ctx.names,
        parsed.operator,
        parsed.is_not,
        target,
        param,
        &LeafField::of(field),
    )
}

/// Decode opaque ids and compare them against the underlying field
fn global_id(
    ctx: &mut CompileContext<'_>,
    owner: &dyn FieldContainer,
    global_field: &str,
    parsed: &ParsedFilterKey,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Predicate> {
    let field = lookup(owner, global_field)?;
    let target = property_target(&frame.variable, field);
    if value.is_null() {
        return scalar(ctx, field, parsed, target, frame.param_name(key), value);
    }

    let decode = |raw: &JsonValue| -> Result<Value> {
        let encoded = raw
            .as_str()
            .ok_or_else(|| FilterError::invalid_value(key, "a global id string"))?;
        let id = from_global_id(encoded)?;
        if id.type_name != owner.type_name() || id.field != global_field {
            return Err(FilterError::InvalidGlobalId(encoded.to_string()));
        }
        Ok(coerce_scalar(&id.id, &field.type_meta.name))
    };

    let bound = match parsed.operator {
        None | Some(FilterOperator::Equal) => decode(value)?,
        Some(FilterOperator::In) => {
            let items = value
                .as_array()
                .ok_or_else(|| FilterError::invalid_value(key, "a list of global ids"))?;
            Value::List(items.iter().map(decode).collect::<Result<Vec<_>>>()?)
        }
        Some(op) => {
            return Err(FilterError::UnknownOperator {
                operator: op.to_string(),
                field: GLOBAL_ID_KEY.to_string(),
            })
        }
    };

    let param = ctx.bind(frame.param_name(key), bound)?;
    translate(
        &mut ctx.names,
        parsed.operator,
        parsed.is_not,
        target,
        param,
        &LeafField::of(field),
    )
}
