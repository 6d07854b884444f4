// src/filter/operators.rs
// Maps a parsed operator and a field's value type onto a comparison predicate.

use super::key_parser::FilterOperator;
use crate::cypher::ast::{ComparisonOp, Expression, Predicate};
use crate::cypher::VariableGenerator;
use crate::error::{FilterError, Result};
use crate::schema::{FieldKind, SchemaField, TemporalType};

/// Value representation of a leaf field, deciding how parameters are
/// converted before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    Plain,
    Spatial,
    Temporal(TemporalType),
}

impl LeafType {
    pub fn of(field: &SchemaField) -> LeafType {
        match &field.kind {
            FieldKind::Spatial(_) => LeafType::Spatial,
            FieldKind::Temporal(t) => LeafType::Temporal(*t),
            _ => LeafType::Plain,
        }
    }

    /// Cypher function turning a raw parameter into a comparable value
    fn conversion(&self) -> Option<&'static str> {
        match self {
            LeafType::Plain => None,
            LeafType::Spatial => Some("point"),
            LeafType::Temporal(t) => Some(t.cypher_function()),
        }
    }
}

/// The comparison target and its typing
#[derive(Debug, Clone)]
pub struct LeafField<'a> {
    pub name: &'a str,
    pub leaf: LeafType,
    pub is_array: bool,
}

impl<'a> LeafField<'a> {
    pub fn of(field: &'a SchemaField) -> Self {
        LeafField {
            name: &field.name,
            leaf: LeafType::of(field),
            is_array: field.is_array(),
        }
    }

    pub fn plain(name: &'a str) -> Self {
        LeafField {
            name,
            leaf: LeafType::Plain,
            is_array: false,
        }
    }
}

fn convert(leaf: LeafType, expr: Expression) -> Expression {
    match leaf.conversion() {
        Some(function) => Expression::call(function, vec![expr]),
        None => expr,
    }
}

/// `[var IN list | conv(var)]`, or the list itself when no conversion applies
fn convert_each(names: &mut VariableGenerator, leaf: LeafType, list: Expression) -> Expression {
    match leaf.conversion() {
        Some(function) => {
            let var = names.value();
            Expression::ListComprehension {
                variable: var.clone(),
                list_expr: Box::new(list),
                filter: None,
                map_expr: Some(Box::new(Expression::call(
                    function,
                    vec![Expression::Variable(var)],
                ))),
            }
        }
        None => list,
    }
}

/// `point.distance(target, point($p.point))`
fn distance_from(target: Expression, value: &Expression) -> Expression {
    Expression::call(
        "point.distance",
        vec![
            target,
            Expression::call("point", vec![value.clone().field("point")]),
        ],
    )
}

fn ordering(op: FilterOperator) -> Option<ComparisonOp> {
    match op {
        FilterOperator::Lt => Some(ComparisonOp::LessThan),
        FilterOperator::Lte => Some(ComparisonOp::LessThanEq),
        FilterOperator::Gt => Some(ComparisonOp::GreaterThan),
        FilterOperator::Gte => Some(ComparisonOp::GreaterThanEq),
        FilterOperator::Equal => Some(ComparisonOp::Equals),
        _ => None,
    }
}

/// Build the comparison of `target` against the bound parameter `value`.
pub fn translate(
    names: &mut VariableGenerator,
    operator: Option<FilterOperator>,
    is_not: bool,
    target: Expression,
    value: Expression,
    field: &LeafField<'_>,
) -> Result<Predicate> {
    let leaf = field.leaf;
    let predicate = match operator {
        None | Some(FilterOperator::Equal) => {
            let right = if field.is_array {
                convert_each(names, leaf, value)
            } else {
                convert(leaf, value)
            };
            Predicate::eq(target, right)
        }
        Some(FilterOperator::In) => Predicate::In {
            expr: target,
            list: convert_each(names, leaf, value),
        },
        Some(FilterOperator::Includes) => Predicate::In {
            expr: convert(leaf, value),
            list: target,
        },
        Some(FilterOperator::Contains) => Predicate::Contains {
            expr: target,
            pattern: value,
        },
        Some(FilterOperator::StartsWith) => Predicate::StartsWith {
            expr: target,
            pattern: value,
        },
        Some(FilterOperator::EndsWith) => Predicate::EndsWith {
            expr: target,
            pattern: value,
        },
        Some(FilterOperator::Matches) => Predicate::Matches {
            expr: target,
            pattern: value,
        },
        Some(
            op @ (FilterOperator::Lt | FilterOperator::Lte | FilterOperator::Gt | FilterOperator::Gte),
        ) => {
            let cmp = ordering(op).unwrap_or(ComparisonOp::Equals);
            match leaf {
                LeafType::Spatial => {
                    Predicate::compare(distance_from(target, &value), cmp, value.field("distance"))
                }
                // Durations have no total order on their own; anchor both at now.
                LeafType::Temporal(TemporalType::Duration) => {
                    let now = || Expression::call("datetime", vec![]);
                    Predicate::compare(
                        now().plus(target),
                        cmp,
                        now().plus(convert(leaf, value)),
                    )
                }
                _ => Predicate::compare(target, cmp, convert(leaf, value)),
            }
        }
        Some(FilterOperator::Distance) => match leaf {
            LeafType::Spatial => Predicate::eq(distance_from(target, &value), value.field("distance")),
            _ => {
                return Err(FilterError::UnknownOperator {
                    operator: FilterOperator::Distance.to_string(),
                    field: field.name.to_string(),
                })
            }
        },
        Some(op) => {
            return Err(FilterError::UnknownOperator {
                operator: op.to_string(),
                field: field.name.to_string(),
            })
        }
    };
    Ok(if is_not { predicate.negate() } else { predicate })
}
