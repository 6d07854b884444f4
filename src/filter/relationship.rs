// src/filter/relationship.rs
// Quantified traversal filters: `actors_SOME: { name: "Keanu" }` and friends.
//
// Without hoisted subqueries a quantifier is rendered inline with EXISTS or a
// pattern comprehension. When the inner filter needs subqueries of its own the
// traversal becomes a counting CALL so they run once per candidate.

use serde_json::Value as JsonValue;

use super::context::{CompileContext, Fragment, Frame};
use super::interface::compile_entity;
use super::key_parser::{FilterOperator, ParsedFilterKey};
use super::FilterMap;
use crate::cypher::ast::{
    CallClause, Clause, ComparisonOp, EdgeDirection, EdgePattern, Expression, MatchClause,
    NodePattern, Pattern, Predicate, Projection, Quantifier, ReturnClause, ReturnItem, WithClause,
};
use crate::datatypes::Value;
use crate::error::{FilterError, Result};
use crate::schema::{Entity, NodeType, RelationDirection, RelationField, SchemaField};

/// Quantifier for a relationship key. Array fields default to "some match",
/// to-one fields to "the single match".
pub(crate) fn quantifier_for(
    operator: Option<FilterOperator>,
    is_array: bool,
    field: &str,
) -> Result<Quantifier> {
    match operator {
        None | Some(FilterOperator::Equal) if is_array => Ok(Quantifier::Any),
        None | Some(FilterOperator::Equal) => Ok(Quantifier::Single),
        Some(FilterOperator::Some) => Ok(Quantifier::Any),
        Some(FilterOperator::Every) => Ok(Quantifier::All),
        Some(FilterOperator::None) => Ok(Quantifier::None),
        Some(FilterOperator::Single) => Ok(Quantifier::Single),
        Some(op) => Err(FilterError::UnknownOperator {
            operator: op.to_string(),
            field: field.to_string(),
        }),
    }
}

/// `(parent)-[edge:TYPE]->(target:Labels)` honoring the field's direction
pub(crate) fn traversal(
    parent: &str,
    rel: &RelationField,
    edge: Option<&str>,
    target: &str,
    labels: Vec<String>,
) -> Pattern {
    let direction = match rel.direction {
        RelationDirection::Out => EdgeDirection::Outgoing,
        RelationDirection::In => EdgeDirection::Incoming,
        RelationDirection::Undirected => EdgeDirection::Both,
    };
    Pattern::hop(
        NodePattern::bound(parent),
        EdgePattern {
            variable: edge.map(str::to_string),
            connection_type: rel.rel_type.clone(),
            direction,
        },
        NodePattern::labelled(Some(target), labels),
    )
}

/// `(v:A:B) OR (v:C)` over the given node types
pub(crate) fn label_test(variable: &str, nodes: &[&NodeType]) -> Option<Predicate> {
    Predicate::or_all(nodes.iter().filter_map(|node| {
        Predicate::and_all(node.main_labels().into_iter().map(|label| Predicate::HasLabel {
            variable: variable.to_string(),
            label,
        }))
    }))
}

/// Labels placed on the target node pattern. Abstract targets match unlabeled
/// and are narrowed by a label disjunction instead.
pub(crate) fn target_labels(
    ctx: &CompileContext<'_>,
    entity: &Entity<'_>,
    target: &str,
) -> Result<(Vec<String>, Option<Predicate>)> {
    match entity {
        Entity::Node(node) => Ok((node.main_labels(), None)),
        _ => {
            let nodes = ctx.schema.concrete_types(entity)?;
            Ok((Vec::new(), label_test(target, &nodes)))
        }
    }
}

fn exists(pattern: Pattern, where_clause: Option<Predicate>) -> Predicate {
    Predicate::Exists {
        pattern,
        where_clause: where_clause.map(Box::new),
    }
}

/// `rel: null` and `rel_NOT: null`: plain existence of the traversal
pub(crate) fn existence(
    ctx: &mut CompileContext<'_>,
    parent: &str,
    rel: &RelationField,
    entity: &Entity<'_>,
    is_not: bool,
) -> Result<Fragment> {
    let target = ctx.names.node();
    let (labels, label_filter) = target_labels(ctx, entity, &target)?;
    let found = exists(traversal(parent, rel, None, &target, labels), label_filter);
    Ok(Fragment::inline(if is_not { found } else { found.negate() }))
}

/// Apply `quantifier` to the matches of `pattern` against the inner fragment.
pub(crate) fn quantify(
    ctx: &mut CompileContext<'_>,
    parent: &str,
    pattern: Pattern,
    target: &str,
    inner: Fragment,
    quantifier: Quantifier,
) -> Result<Fragment> {
    if !inner.needs_precompute() {
        let condition = inner.predicate;
        let predicate = match quantifier {
            Quantifier::Any => exists(pattern, condition),
            Quantifier::None => exists(pattern, condition).negate(),
            // An empty match set must not satisfy "every".
            Quantifier::All => match condition {
                Some(condition) => exists(pattern.clone(), None)
                    .and(exists(pattern, Some(condition.negate())).negate()),
                None => exists(pattern, None),
            },
            Quantifier::Single => Predicate::ListPredicate {
                quantifier: Quantifier::Single,
                variable: ctx.names.value(),
                list: Expression::PatternComprehension {
                    pattern,
                    filter: condition.map(Box::new),
                    map_expr: Box::new(Expression::Literal(Value::Int64(1))),
                },
                where_clause: None,
            },
        };
        return Ok(Fragment::inline(predicate));
    }

    let flag = ctx.names.value();
    let mut body = vec![Clause::Match(MatchClause {
        pattern: pattern.clone(),
        where_clause: None,
    })];
    body.extend(inner.subqueries);
    let condition = match quantifier {
        Quantifier::All => inner.predicate.map(Predicate::negate),
        _ => inner.predicate,
    };
    if let Some(condition) = condition {
        body.push(Clause::With(WithClause {
            projection: Projection::All,
            where_clause: Some(condition),
        }));
    }
    let count = Expression::call("count", vec![Expression::variable(target)]);
    let test = match quantifier {
        Quantifier::Single => Predicate::eq(count, Expression::Literal(Value::Int64(1))),
        _ => Predicate::compare(
            count,
            ComparisonOp::GreaterThan,
            Expression::Literal(Value::Int64(0)),
        ),
    };
    body.push(Clause::Return(ReturnClause {
        items: vec![ReturnItem::aliased(
            Expression::Predicate(Box::new(test)),
            &flag,
        )],
    }));

    let predicate = match quantifier {
        Quantifier::Any | Quantifier::Single => Predicate::is_true(&flag),
        Quantifier::None => Predicate::is_false(&flag),
        Quantifier::All => Predicate::is_false(&flag).and(exists(pattern, None)),
    };
    Ok(Fragment {
        predicate: Some(predicate),
        subqueries: vec![Clause::Call(CallClause {
            imports: vec![parent.to_string()],
            body,
        })],
    })
}

pub(crate) fn as_filter_object<'v>(key: &str, value: &'v JsonValue) -> Result<&'v FilterMap> {
    value
        .as_object()
        .ok_or_else(|| FilterError::invalid_value(key, "a filter object"))
}

/// Resolve the related entity of a relationship field
pub(crate) fn related_entity<'s>(
    ctx: &CompileContext<'s>,
    field: &SchemaField,
    rel: &RelationField,
) -> Result<Entity<'s>> {
    ctx.schema
        .entity(&rel.related_type)
        .ok_or_else(|| FilterError::UnknownRelatedType {
            field: field.name.clone(),
            type_name: rel.related_type.clone(),
        })
}

pub(crate) fn build(
    ctx: &mut CompileContext<'_>,
    field: &SchemaField,
    rel: &RelationField,
    parsed: &ParsedFilterKey,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Fragment> {
    let quantifier = quantifier_for(parsed.operator, field.is_array(), &field.name)?;
    let entity = related_entity(ctx, field, rel)?;
    let parent = frame.variable.as_str();

    if value.is_null() {
        return existence(ctx, parent, rel, &entity, parsed.is_not);
    }
    let filter = as_filter_object(key, value)?;

    let fragment = match entity {
        // One traversal per member named in the filter, all of which must hold
        Entity::Union(union) => {
            let mut parts = Vec::new();
            for (member, member_filter) in filter {
                if !union.members.contains(member) {
                    return Err(FilterError::UnknownType(member.clone()));
                }
                let node = ctx
                    .schema
                    .find_node_type(member)
                    .ok_or_else(|| FilterError::UnknownType(member.clone()))?;
                let member_filter = as_filter_object(member, member_filter)?;
                let target = ctx.names.node();
                let inner_frame = ctx.descend(frame, &target, &format!("{}_{}", key, member))?;
                let inner = compile_entity(ctx, Entity::Node(node), &inner_frame, member_filter)?;
                let pattern = traversal(parent, rel, None, &target, node.main_labels());
                parts.push(quantify(ctx, parent, pattern, &target, inner, quantifier)?);
            }
            Fragment::all(parts)
        }
        _ => {
            let target = ctx.names.node();
            let inner_frame = ctx.descend(frame, &target, key)?;
            let inner = compile_entity(ctx, entity, &inner_frame, filter)?;
            let labels = match entity {
                Entity::Node(node) => node.main_labels(),
                _ => Vec::new(),
            };
            let pattern = traversal(parent, rel, None, &target, labels);
            quantify(ctx, parent, pattern, &target, inner, quantifier)?
        }
    };

    Ok(if parsed.is_not {
        fragment.negate()
    } else {
        fragment
    })
}
