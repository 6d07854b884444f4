// src/filter/connection.rs
// Connection filters constrain the related node and the relationship
// properties of the same match: `actorsConnection_SOME: { node: {...}, edge: {...} }`.

use serde_json::Value as JsonValue;

use super::context::{CompileContext, Fragment, Frame};
use super::interface::compile_entity;
use super::key_parser::ParsedFilterKey;
use super::relationship::{
    as_filter_object, existence, quantifier_for, quantify, related_entity, traversal,
};
use super::{compile_object, FilterMap};
use crate::cypher::ast::Quantifier;
use crate::error::{FilterError, Result};
use crate::schema::{
    ConnectionField, Entity, FieldContainer, RelationField, RelationshipType, SchemaField,
};

const NODE_KEY: &str = "node";
const EDGE_KEY: &str = "edge";

/// What the keys of a connection filter object resolve against
struct ConnectionScope<'s> {
    node: Entity<'s>,
    properties: Option<&'s RelationshipType>,
    target: String,
    edge: String,
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
    ctx: &mut CompileContext<'_>,
    owner: &dyn FieldContainer,
    field: &SchemaField,
    conn: &ConnectionField,
    parsed: &ParsedFilterKey,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Fragment> {
    let rel_field = owner
        .field(&conn.relationship_field)
        .ok_or_else(|| FilterError::UnknownField {
            type_name: owner.type_name().to_string(),
            field: conn.relationship_field.clone(),
        })?;
    let rel = rel_field.as_relationship().ok_or_else(|| {
        FilterError::InvalidSchema(format!(
            "connection `{}` refers to non-relationship field `{}`",
            field.name, rel_field.name
        ))
    })?;
    let quantifier = quantifier_for(parsed.operator, rel_field.is_array(), &field.name)?;
    let entity = related_entity(ctx, rel_field, rel)?;
    let parent = frame.variable.as_str();

    if value.is_null() {
        return existence(ctx, parent, rel, &entity, parsed.is_not);
    }
    let filter = as_filter_object(key, value)?;

    let schema = ctx.schema;
    let properties = match conn.properties.as_deref().or(rel.properties.as_deref()) {
        Some(name) => Some(
            schema
                .find_relationship_type(name)
                .ok_or_else(|| FilterError::UnknownType(name.to_string()))?,
        ),
        None => None,
    };

    let fragment = match entity {
        // Union connections take one connection filter per member type
        Entity::Union(union) => {
            let mut parts = Vec::new();
            for (member, member_filter) in filter {
                if !union.members.contains(member) {
                    return Err(FilterError::UnknownType(member.clone()));
                }
                let node = schema
                    .find_node_type(member)
                    .ok_or_else(|| FilterError::UnknownType(member.clone()))?;
                let member_filter = as_filter_object(member, member_filter)?;
                parts.push(traverse(
                    ctx,
                    parent,
                    rel,
                    Entity::Node(node),
                    properties,
                    frame,
                    &format!("{}_{}", key, member),
                    member_filter,
                    quantifier,
                )?);
            }
            Fragment::all(parts)
        }
        _ => traverse(
            ctx, parent, rel, entity, properties, frame, key, filter, quantifier,
        )?,
    };

    Ok(if parsed.is_not {
        fragment.negate()
    } else {
        fragment
    })
}

#[allow(clippy::too_many_arguments)]
fn traverse<'s>(
    ctx: &mut CompileContext<'s>,
    parent: &str,
    rel: &RelationField,
    node: Entity<'s>,
    properties: Option<&'s RelationshipType>,
    frame: &Frame,
    segment: &str,
    filter: &FilterMap,
    quantifier: Quantifier,
) -> Result<Fragment> {
    let target = ctx.names.node();
    let edge = ctx.names.fresh("edge");
    let labels = match node {
        Entity::Node(n) => n.main_labels(),
        _ => Vec::new(),
    };
    let scope = ConnectionScope {
        node,
        properties,
        target: target.clone(),
        edge: edge.clone(),
    };
    let inner_frame = ctx.descend(frame, &target, segment)?;
    let inner = connection_where(ctx, &scope, &inner_frame, filter)?;
    let pattern = traversal(parent, rel, Some(&edge), &target, labels);
    quantify(ctx, parent, pattern, &target, inner, quantifier)
}

/// `node`, `edge`, their `_NOT` forms and `AND`/`OR`/`NOT` nesting
fn connection_where(
    ctx: &mut CompileContext<'_>,
    scope: &ConnectionScope<'_>,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Fragment> {
    let mut parts = Vec::new();
    for (key, value) in filter {
        let part = match key.as_str() {
            "AND" | "OR" => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FilterError::invalid_value(key, "a list of filter objects"))?;
                let mut branches = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let branch = ctx.descend(frame, &frame.variable, &format!("{}_{}", key, index))?;
                    branches.push(connection_where(ctx, scope, &branch, as_filter_object(key, item)?)?);
                }
                if key == "AND" {
                    Fragment::all(branches)
                } else {
                    Fragment::any(branches)
                }
            }
            "NOT" => {
                let nested = ctx.descend(frame, &frame.variable, key)?;
                connection_where(ctx, scope, &nested, as_filter_object(key, value)?)?.negate()
            }
            _ => {
                let (base, negated) = match key.strip_suffix("_NOT") {
                    Some(base) => (base, true),
                    None => (key.as_str(), false),
                };
                let part = match base {
                    NODE_KEY => {
                        let nested = ctx.descend(frame, &scope.target, key)?;
                        compile_entity(ctx, scope.node, &nested, as_filter_object(key, value)?)?
                    }
                    EDGE_KEY => {
                        let properties = scope.properties.ok_or_else(|| {
                            FilterError::invalid_value(key, "a relationship with properties")
                        })?;
                        let nested = ctx.descend(frame, &scope.edge, key)?;
                        compile_object(ctx, properties, &nested, as_filter_object(key, value)?)?
                    }
                    _ => {
                        return Err(FilterError::malformed(
                            key,
                            "connection filters accept node, edge, AND, OR and NOT",
                        ))
                    }
                };
                if negated {
                    part.negate()
                } else {
                    part
                }
            }
        };
        parts.push(part);
    }
    Ok(Fragment::all(parts))
}
