// src/filter/aggregate.rs
// `<field>Aggregate` filters. Aggregates cannot appear inside an inline
// predicate, so every comparison is computed in a correlated CALL, returned
// under a fresh name and tested afterwards.
//
//   CALL {
//       WITH this
//       MATCH (this)<-[edge0:ACTED_IN]-(this1:Actor)
//       RETURN count(this1) > $this_actorsAggregate_count_GT AS var2
//   }
//   WITH *
//   WHERE var2 = true

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use super::context::{CompileContext, Fragment, Frame};
use super::relationship::{as_filter_object, related_entity, target_labels, traversal};
use super::FilterMap;
use crate::cypher::ast::{
    CallClause, Clause, ComparisonOp, Expression, MatchClause, Predicate, Quantifier,
    ReturnClause, ReturnItem,
};
use crate::datatypes::type_conversions::filter_value;
use crate::error::{FilterError, Result};
use crate::schema::{
    Entity, FieldContainer, FieldKind, RelationField, RelationshipType, SchemaField, TemporalType,
};

const COUNT_KEY: &str = "count";

static AGGREGATE_FIELD_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<field>[_A-Za-z][_0-9A-Za-z]*?)(?:_(?P<aggregation>AVERAGE|MIN|MAX|SUM|SHORTEST|LONGEST))?(?P<length>_LENGTH)?_(?P<comparison>EQUAL|LTE|LT|GTE|GT)$",
    )
    .expect("aggregate key pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregation {
    Average,
    Min,
    Max,
    Sum,
    Shortest,
    Longest,
}

impl Aggregation {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "AVERAGE" => Some(Aggregation::Average),
            "MIN" => Some(Aggregation::Min),
            "MAX" => Some(Aggregation::Max),
            "SUM" => Some(Aggregation::Sum),
            "SHORTEST" => Some(Aggregation::Shortest),
            "LONGEST" => Some(Aggregation::Longest),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Average => "AVERAGE",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Sum => "SUM",
            Aggregation::Shortest => "SHORTEST",
            Aggregation::Longest => "LONGEST",
        }
    }
}

fn comparison(token: &str) -> Option<ComparisonOp> {
    match token {
        "EQUAL" => Some(ComparisonOp::Equals),
        "LT" => Some(ComparisonOp::LessThan),
        "LTE" => Some(ComparisonOp::LessThanEq),
        "GT" => Some(ComparisonOp::GreaterThan),
        "GTE" => Some(ComparisonOp::GreaterThanEq),
        _ => None,
    }
}

/// How a field's values are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Text,
    Number,
    Temporal(TemporalType),
}

impl Measure {
    fn of(field: &SchemaField) -> Option<Measure> {
        match &field.kind {
            FieldKind::Temporal(t) => Some(Measure::Temporal(*t)),
            FieldKind::Enum => Some(Measure::Text),
            FieldKind::Primitive => match field.type_meta.name.as_str() {
                "Int" | "BigInt" | "Float" => Some(Measure::Number),
                "String" | "ID" => Some(Measure::Text),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Where the keys of one aggregate filter object resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// `count`, `node`, `edge`
    Top,
    /// Fields of the related node
    Node,
    /// Fields of the relationship properties
    Edge,
}

struct AggregateScope<'s> {
    node: &'s dyn FieldContainer,
    properties: Option<&'s RelationshipType>,
    target: String,
    edge: String,
    returns: Vec<ReturnItem>,
}

impl<'s> AggregateScope<'s> {
    /// Return `test` from the subquery and refer to it by name.
    fn hoist(&mut self, ctx: &mut CompileContext<'_>, test: Predicate) -> Predicate {
        let flag = ctx.names.value();
        self.returns
            .push(ReturnItem::aliased(Expression::Predicate(Box::new(test)), &flag));
        Predicate::is_true(&flag)
    }

    fn fields_of(&self, level: Level, key: &str) -> Result<(&'s dyn FieldContainer, String)> {
        match level {
            Level::Node | Level::Top => Ok((self.node, self.target.clone())),
            Level::Edge => {
                let properties = self.properties.ok_or_else(|| {
                    FilterError::invalid_value(key, "a relationship with properties")
                })?;
                Ok((properties, self.edge.clone()))
            }
        }
    }
}

/// Hoist the aggregates of `rel` into one CALL; `is_not` negates the test
/// on the hoisted result, which is always a single row.
pub(crate) fn build(
    ctx: &mut CompileContext<'_>,
    field: &SchemaField,
    rel: &RelationField,
    is_not: bool,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Fragment> {
    let entity = related_entity(ctx, field, rel)?;
    let node: &dyn FieldContainer = match entity {
        Entity::Node(node) => node,
        Entity::Interface(interface) => interface,
        Entity::Union(_) => {
            return Err(FilterError::invalid_value(
                key,
                "a relationship to a node or interface type",
            ))
        }
    };
    let filter = as_filter_object(key, value)?;
    let schema = ctx.schema;
    let properties = match rel.properties.as_deref() {
        Some(name) => Some(
            schema
                .find_relationship_type(name)
                .ok_or_else(|| FilterError::UnknownType(name.to_string()))?,
        ),
        None => None,
    };

    let parent = frame.variable.as_str();
    let edge = ctx.names.fresh("edge");
    let target = ctx.names.node();
    let (labels, label_filter) = target_labels(ctx, &entity, &target)?;
    let inner_frame = ctx.descend(frame, &target, key)?;

    let mut scope = AggregateScope {
        node,
        properties,
        target: target.clone(),
        edge: edge.clone(),
        returns: Vec::new(),
    };
    let predicate = aggregate_where(ctx, &mut scope, Level::Top, &inner_frame, filter)?;
    if scope.returns.is_empty() {
        return Ok(Fragment::empty());
    }

    let body = vec![
        Clause::Match(MatchClause {
            pattern: traversal(parent, rel, Some(&edge), &target, labels),
            where_clause: label_filter,
        }),
        Clause::Return(ReturnClause {
            items: scope.returns,
        }),
    ];
    let fragment = Fragment {
        predicate,
        subqueries: vec![Clause::Call(CallClause {
            imports: vec![parent.to_string()],
            body,
        })],
    };
    Ok(if is_not { fragment.negate() } else { fragment })
}

fn aggregate_where(
    ctx: &mut CompileContext<'_>,
    scope: &mut AggregateScope<'_>,
    level: Level,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Option<Predicate>> {
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
                    branches.extend(aggregate_where(
                        ctx,
                        scope,
                        level,
                        &branch,
                        as_filter_object(key, item)?,
                    )?);
                }
                if key == "AND" {
                    Predicate::and_all(branches)
                } else {
                    Predicate::or_all(branches)
                }
            }
            "NOT" => {
                let nested = ctx.descend(frame, &frame.variable, key)?;
                aggregate_where(ctx, scope, level, &nested, as_filter_object(key, value)?)?
                    .map(Predicate::negate)
            }
            _ if level == Level::Top => top_level_key(ctx, scope, frame, key, value)?,
            _ => Some(field_key(ctx, scope, level, frame, key, value)?),
        };
        parts.extend(part);
    }
    Ok(Predicate::and_all(parts))
}

/// `count[_OP]`, `node` and `edge`
fn top_level_key(
    ctx: &mut CompileContext<'_>,
    scope: &mut AggregateScope<'_>,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Option<Predicate>> {
    if let Some(rest) = key.strip_prefix(COUNT_KEY) {
        let op = if rest.is_empty() {
            ComparisonOp::Equals
        } else {
            rest.strip_prefix('_')
                .and_then(comparison)
                .ok_or_else(|| FilterError::UnknownOperator {
                    operator: rest.trim_start_matches('_').to_string(),
                    field: COUNT_KEY.to_string(),
                })?
        };
        let param = ctx.bind(frame.param_name(key), filter_value(key, value)?)?;
        let count = Expression::call("count", vec![Expression::variable(&scope.target)]);
        return Ok(Some(scope.hoist(ctx, Predicate::compare(count, op, param))));
    }

    let level = match key {
        "node" => Level::Node,
        "edge" => Level::Edge,
        _ => {
            return Err(FilterError::malformed(
                key,
                "aggregate filters accept count, node, edge, AND, OR and NOT",
            ))
        }
    };
    let (_, variable) = scope.fields_of(level, key)?;
    let nested = ctx.descend(frame, &variable, key)?;
    aggregate_where(ctx, scope, level, &nested, as_filter_object(key, value)?)
}

/// `<field>[_<AGGREGATION>][_LENGTH]_<COMPARISON>` on a node or edge field
fn field_key(
    ctx: &mut CompileContext<'_>,
    scope: &mut AggregateScope<'_>,
    level: Level,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Predicate> {
    let caps = AGGREGATE_FIELD_KEY.captures(key).ok_or_else(|| {
        FilterError::malformed(key, "expected field[_AGGREGATION][_LENGTH]_COMPARISON")
    })?;
    let field_name = caps.name("field").map(|m| m.as_str()).unwrap_or_default();
    let aggregation = caps
        .name("aggregation")
        .and_then(|m| Aggregation::parse(m.as_str()));
    let by_length = caps.name("length").is_some();
    let op = caps
        .name("comparison")
        .and_then(|m| comparison(m.as_str()))
        .unwrap_or(ComparisonOp::Equals);

    let (owner, variable) = scope.fields_of(level, key)?;
    let field = owner.field(field_name).ok_or_else(|| FilterError::UnknownField {
        type_name: owner.type_name().to_string(),
        field: field_name.to_string(),
    })?;
    let measure = Measure::of(field)
        .ok_or_else(|| FilterError::invalid_value(key, "an aggregatable scalar field"))?;
    let unsupported = |what: &str| FilterError::UnknownOperator {
        operator: what.to_string(),
        field: field.name.clone(),
    };
    if by_length && measure != Measure::Text {
        return Err(unsupported("LENGTH"));
    }

    let param = ctx.bind(frame.param_name(key), filter_value(key, value)?)?;
    let compared = match measure {
        Measure::Temporal(t) => Expression::call(t.cypher_function(), vec![param]),
        _ => param,
    };
    let property = Expression::property(&variable, field.db_property());
    let size = |e: Expression| Expression::call("size", vec![e]);

    let test = match aggregation {
        Some(aggregation) => {
            let function = match (aggregation, measure) {
                (Aggregation::Average, Measure::Text) => ("avg", true),
                (Aggregation::Shortest, Measure::Text) => ("min", true),
                (Aggregation::Longest, Measure::Text) => ("max", true),
                (Aggregation::Average, Measure::Number) => ("avg", false),
                (Aggregation::Sum, Measure::Number) => ("sum", false),
                (Aggregation::Min, Measure::Number | Measure::Temporal(_)) => ("min", false),
                (Aggregation::Max, Measure::Number | Measure::Temporal(_)) => ("max", false),
                _ => return Err(unsupported(aggregation.as_str())),
            };
            let argument = if function.1 { size(property) } else { property };
            Predicate::compare(Expression::call(function.0, vec![argument]), op, compared)
        }
        // No aggregation: some collected value satisfies the comparison.
        None => {
            let item = ctx.names.value();
            let left = match (measure, op) {
                (Measure::Text, ComparisonOp::Equals) if !by_length => Expression::variable(&item),
                (Measure::Text, _) => size(Expression::variable(&item)),
                _ => Expression::variable(&item),
            };
            Predicate::ListPredicate {
                quantifier: Quantifier::Any,
                variable: item,
                list: Expression::call("collect", vec![property]),
                where_clause: Some(Box::new(Predicate::compare(left, op, compared))),
            }
        }
    };
    Ok(scope.hoist(ctx, test))
}
