// src/testing/evaluator.rs
// Executes compiled filters against a PropertyGraph with Cypher's
// three-valued logic: a predicate is Some(true), Some(false) or None (null).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use regex::Regex;

use super::graph::PropertyGraph;
use crate::cypher::ast::*;
use crate::datatypes::{ParamMap, Point, Value};
use crate::filter::CompiledWhere;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("duration pattern")
});

const AGGREGATES: [&str; 6] = ["count", "collect", "avg", "min", "max", "sum"];

#[derive(Debug, Clone, Default)]
pub struct ResultRow {
    pub node_bindings: BTreeMap<String, NodeIndex>,
    pub edge_bindings: BTreeMap<String, EdgeIndex>,
    pub projected: BTreeMap<String, Value>,
}

impl ResultRow {
    fn with_value(&self, name: &str, value: Value) -> ResultRow {
        let mut row = self.clone();
        row.node_bindings.remove(name);
        row.edge_bindings.remove(name);
        row.projected.insert(name.to_string(), value);
        row
    }

    /// Copy the binding of `from` into `into` on `target`
    fn copy_binding(&self, from: &str, into: &str, target: &mut ResultRow) -> bool {
        if let Some(&n) = self.node_bindings.get(from) {
            target.node_bindings.insert(into.to_string(), n);
        } else if let Some(&e) = self.edge_bindings.get(from) {
            target.edge_bindings.insert(into.to_string(), e);
        } else if let Some(v) = self.projected.get(from) {
            target.projected.insert(into.to_string(), v.clone());
        } else {
            return false;
        }
        true
    }

    fn merge(&mut self, other: ResultRow) {
        self.node_bindings.extend(other.node_bindings);
        self.edge_bindings.extend(other.edge_bindings);
        self.projected.extend(other.projected);
    }
}

/// Evaluation scope: the current row and, inside an aggregating RETURN, the
/// whole group the aggregates fold over.
#[derive(Clone, Copy)]
struct Scope<'r> {
    row: &'r ResultRow,
    group: Option<&'r [ResultRow]>,
}

impl<'r> Scope<'r> {
    fn row(row: &'r ResultRow) -> Self {
        Scope { row, group: None }
    }
}

pub struct FilterExecutor<'g> {
    graph: &'g PropertyGraph,
    params: &'g ParamMap,
    now: NaiveDateTime,
}

impl<'g> FilterExecutor<'g> {
    pub fn new(graph: &'g PropertyGraph, params: &'g ParamMap) -> Self {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("fixed clock");
        FilterExecutor { graph, params, now }
    }

    /// Nodes labelled `label` the compiled filter keeps
    pub fn matching(&self, compiled: &CompiledWhere, label: &str) -> Result<Vec<NodeIndex>, String> {
        let mut out = Vec::new();
        for node in self.graph.nodes_with_label(label) {
            let mut row = ResultRow::default();
            row.node_bindings.insert(compiled.variable.clone(), node);
            let rows = self.run_clauses(&compiled.subqueries, vec![row])?;
            let mut keep = false;
            for row in &rows {
                keep |= match &compiled.predicate {
                    Some(p) => self.evaluate_predicate(p, Scope::row(row))? == Some(true),
                    None => true,
                };
            }
            if keep {
                out.push(node);
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Clauses
    // ========================================================================

    fn run_clauses(&self, clauses: &[Clause], rows: Vec<ResultRow>) -> Result<Vec<ResultRow>, String> {
        clauses
            .iter()
            .try_fold(rows, |rows, clause| self.run_clause(clause, rows))
    }

    fn run_clause(&self, clause: &Clause, rows: Vec<ResultRow>) -> Result<Vec<ResultRow>, String> {
        match clause {
            Clause::Match(m) => {
                let mut out = Vec::new();
                for row in &rows {
                    for matched in self.match_pattern(&m.pattern, row)? {
                        let keep = match &m.where_clause {
                            Some(p) => self.evaluate_predicate(p, Scope::row(&matched))? == Some(true),
                            None => true,
                        };
                        if keep {
                            out.push(matched);
                        }
                    }
                }
                Ok(out)
            }
            Clause::Call(call) => {
                let mut out = Vec::new();
                for row in rows {
                    let mut imported = ResultRow::default();
                    for name in &call.imports {
                        if !row.copy_binding(name, name, &mut imported) {
                            return Err(format!("CALL imports unbound variable `{}`", name));
                        }
                    }
                    for result in self.run_clauses(&call.body, vec![imported])? {
                        let mut merged = row.clone();
                        merged.merge(result);
                        out.push(merged);
                    }
                }
                Ok(out)
            }
            Clause::With(w) => {
                let projected = match &w.projection {
                    Projection::All => rows,
                    Projection::Items(items) => rows
                        .iter()
                        .map(|row| self.project(items, row))
                        .collect::<Result<Vec<_>, _>>()?,
                };
                let mut out = Vec::new();
                for row in projected {
                    let keep = match &w.where_clause {
                        Some(p) => self.evaluate_predicate(p, Scope::row(&row))? == Some(true),
                        None => true,
                    };
                    if keep {
                        out.push(row);
                    }
                }
                Ok(out)
            }
            Clause::Unwind(u) => {
                let mut out = Vec::new();
                for row in &rows {
                    match self.evaluate_expression(&u.expression, Scope::row(row))? {
                        Value::Null => {}
                        Value::List(items) => {
                            out.extend(items.into_iter().map(|item| row.with_value(&u.alias, item)))
                        }
                        other => out.push(row.with_value(&u.alias, other)),
                    }
                }
                Ok(out)
            }
            Clause::Return(r) => {
                if r.items.iter().any(|item| expression_aggregates(&item.expression)) {
                    let empty = ResultRow::default();
                    let scope = Scope {
                        row: rows.first().unwrap_or(&empty),
                        group: Some(rows.as_slice()),
                    };
                    let mut out = ResultRow::default();
                    for item in &r.items {
                        let value = self.evaluate_expression(&item.expression, scope)?;
                        out.projected.insert(item_name(item), value);
                    }
                    Ok(vec![out])
                } else {
                    rows.iter().map(|row| self.project(&r.items, row)).collect()
                }
            }
            Clause::Statement(_) => Err("custom statements are not executable here".to_string()),
        }
    }

    fn project(&self, items: &[ReturnItem], row: &ResultRow) -> Result<ResultRow, String> {
        let mut out = ResultRow::default();
        for item in items {
            let name = item_name(item);
            if let Expression::Variable(var) = &item.expression {
                if row.copy_binding(var, &name, &mut out) {
                    continue;
                }
            }
            let value = self.evaluate_expression(&item.expression, Scope::row(row))?;
            out.projected.insert(name, value);
        }
        Ok(out)
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    fn match_pattern(&self, pattern: &Pattern, row: &ResultRow) -> Result<Vec<ResultRow>, String> {
        let (start, edge, end) = match pattern.elements.as_slice() {
            [PatternElement::Node(a), PatternElement::Edge(e), PatternElement::Node(b)] => (a, e, b),
            _ => return Err("only single-hop patterns are supported".to_string()),
        };
        let start_node = start
            .variable
            .as_ref()
            .and_then(|v| row.node_bindings.get(v))
            .copied()
            .ok_or_else(|| "pattern start must be bound".to_string())?;

        let directions: &[Direction] = match edge.direction {
            EdgeDirection::Outgoing => &[Direction::Outgoing],
            EdgeDirection::Incoming => &[Direction::Incoming],
            EdgeDirection::Both => &[Direction::Outgoing, Direction::Incoming],
        };
        let mut out = Vec::new();
        for &direction in directions {
            for e in self.graph.graph.edges_directed(start_node, direction) {
                if e.weight().rel_type != edge.connection_type {
                    continue;
                }
                let other = if direction == Direction::Outgoing {
                    e.target()
                } else {
                    e.source()
                };
                if !end.labels.iter().all(|l| self.graph.has_label(other, l)) {
                    continue;
                }
                let mut matched = row.clone();
                if let Some(var) = &end.variable {
                    match row.node_bindings.get(var) {
                        Some(&bound) if bound != other => continue,
                        _ => {
                            matched.node_bindings.insert(var.clone(), other);
                        }
                    }
                }
                if let Some(var) = &edge.variable {
                    matched.edge_bindings.insert(var.clone(), e.id());
                }
                out.push(matched);
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    fn evaluate_predicate(&self, pred: &Predicate, scope: Scope<'_>) -> Result<Option<bool>, String> {
        Ok(match pred {
            Predicate::Comparison {
                left,
                operator,
                right,
            } => {
                let l = self.evaluate_expression(left, scope)?;
                let r = self.evaluate_expression(right, scope)?;
                evaluate_comparison(&l, *operator, &r)
            }
            Predicate::And(a, b) => {
                match (self.evaluate_predicate(a, scope)?, self.evaluate_predicate(b, scope)?) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            Predicate::Or(a, b) => {
                match (self.evaluate_predicate(a, scope)?, self.evaluate_predicate(b, scope)?) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
            Predicate::Not(inner) => self.evaluate_predicate(inner, scope)?.map(|b| !b),
            Predicate::IsNull(e) => Some(self.evaluate_expression(e, scope)?.is_null()),
            Predicate::IsNotNull(e) => Some(!self.evaluate_expression(e, scope)?.is_null()),
            Predicate::In { expr, list } => {
                let value = self.evaluate_expression(expr, scope)?;
                match self.evaluate_expression(list, scope)? {
                    Value::List(items) => {
                        if items.iter().any(|item| values_equal(&value, item)) {
                            Some(true)
                        } else if value.is_null() || items.iter().any(Value::is_null) {
                            None
                        } else {
                            Some(false)
                        }
                    }
                    _ => None,
                }
            }
            Predicate::StartsWith { expr, pattern } => {
                self.string_test(expr, pattern, scope, |s, p| s.starts_with(p))?
            }
            Predicate::EndsWith { expr, pattern } => {
                self.string_test(expr, pattern, scope, |s, p| s.ends_with(p))?
            }
            Predicate::Contains { expr, pattern } => {
                self.string_test(expr, pattern, scope, |s, p| s.contains(p))?
            }
            Predicate::Matches { expr, pattern } => {
                let value = self.evaluate_expression(expr, scope)?;
                let pattern = self.evaluate_expression(pattern, scope)?;
                match (value.as_str(), pattern.as_str()) {
                    (Some(s), Some(p)) => {
                        let re = Regex::new(&format!("^(?:{})$", p)).map_err(|e| e.to_string())?;
                        Some(re.is_match(s))
                    }
                    _ => None,
                }
            }
            Predicate::HasLabel { variable, label } => match scope.row.node_bindings.get(variable) {
                Some(&node) => Some(self.graph.has_label(node, label)),
                None => None,
            },
            Predicate::Exists {
                pattern,
                where_clause,
            } => {
                let mut found = false;
                for row in self.match_pattern(pattern, scope.row)? {
                    found |= match where_clause {
                        Some(w) => self.evaluate_predicate(w, Scope { row: &row, ..scope })? == Some(true),
                        None => true,
                    };
                }
                Some(found)
            }
            Predicate::ListPredicate {
                quantifier,
                variable,
                list,
                where_clause,
            } => {
                let items = match self.evaluate_expression(list, scope)? {
                    Value::List(items) => items,
                    _ => return Ok(None),
                };
                let mut outcomes = Vec::with_capacity(items.len());
                for item in items {
                    let row = scope.row.with_value(variable, item);
                    outcomes.push(match where_clause {
                        Some(w) => self.evaluate_predicate(w, Scope { row: &row, ..scope })?,
                        None => Some(true),
                    });
                }
                let trues = outcomes.iter().filter(|o| **o == Some(true)).count();
                let unknown = outcomes.iter().any(Option::is_none);
                match quantifier {
                    Quantifier::Any if trues > 0 => Some(true),
                    Quantifier::Any if unknown => None,
                    Quantifier::Any => Some(false),
                    Quantifier::None if trues > 0 => Some(false),
                    Quantifier::None if unknown => None,
                    Quantifier::None => Some(true),
                    Quantifier::All if outcomes.contains(&Some(false)) => Some(false),
                    Quantifier::All if unknown => None,
                    Quantifier::All => Some(true),
                    Quantifier::Single => Some(trues == 1),
                }
            }
        })
    }

    fn string_test(
        &self,
        expr: &Expression,
        pattern: &Expression,
        scope: Scope<'_>,
        test: impl Fn(&str, &str) -> bool,
    ) -> Result<Option<bool>, String> {
        let value = self.evaluate_expression(expr, scope)?;
        let pattern = self.evaluate_expression(pattern, scope)?;
        Ok(match (value.as_str(), pattern.as_str()) {
            (Some(s), Some(p)) => Some(test(s, p)),
            _ => None,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn evaluate_expression(&self, expr: &Expression, scope: Scope<'_>) -> Result<Value, String> {
        let row = scope.row;
        match expr {
            Expression::PropertyAccess { variable, property } => {
                if let Some(&node) = row.node_bindings.get(variable) {
                    Ok(self.graph.node_property(node, property))
                } else if let Some(&edge) = row.edge_bindings.get(variable) {
                    Ok(self.graph.edge_property(edge, property))
                } else {
                    Ok(row
                        .projected
                        .get(variable)
                        .and_then(|v| v.as_map())
                        .and_then(|m| m.get(property).cloned())
                        .unwrap_or(Value::Null))
                }
            }
            Expression::FieldAccess { expr, field } => Ok(self
                .evaluate_expression(expr, scope)?
                .as_map()
                .and_then(|m| m.get(field).cloned())
                .unwrap_or(Value::Null)),
            Expression::Variable(name) => {
                if let Some(v) = row.projected.get(name) {
                    Ok(v.clone())
                } else if let Some(node) = row.node_bindings.get(name) {
                    Ok(identity("_node", node.index()))
                } else if let Some(edge) = row.edge_bindings.get(name) {
                    Ok(identity("_edge", edge.index()))
                } else {
                    Ok(Value::Null)
                }
            }
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Parameter(name) => self
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| format!("parameter `{}` is not bound", name)),
            Expression::FunctionCall { name, args, .. } => self.call(name, args, scope),
            Expression::Add(a, b) => {
                let a = self.evaluate_expression(a, scope)?;
                let b = self.evaluate_expression(b, scope)?;
                Ok(match (a, b) {
                    (Value::DateTime(t), Value::Duration(d)) | (Value::Duration(d), Value::DateTime(t)) => {
                        Value::DateTime(t + d)
                    }
                    (Value::Int64(x), Value::Int64(y)) => Value::Int64(x + y),
                    (x, y) => match (x.as_f64(), y.as_f64()) {
                        (Some(x), Some(y)) => Value::Float64(x + y),
                        _ => Value::Null,
                    },
                })
            }
            Expression::ListComprehension {
                variable,
                list_expr,
                filter,
                map_expr,
            } => {
                let items = match self.evaluate_expression(list_expr, scope)? {
                    Value::List(items) => items,
                    _ => return Ok(Value::Null),
                };
                let mut out = Vec::new();
                for item in items {
                    let row = row.with_value(variable, item.clone());
                    let inner = Scope { row: &row, ..scope };
                    if let Some(f) = filter {
                        if self.evaluate_predicate(f, inner)? != Some(true) {
                            continue;
                        }
                    }
                    out.push(match map_expr {
                        Some(m) => self.evaluate_expression(m, inner)?,
                        None => item,
                    });
                }
                Ok(Value::List(out))
            }
            Expression::PatternComprehension {
                pattern,
                filter,
                map_expr,
            } => {
                let mut out = Vec::new();
                for matched in self.match_pattern(pattern, row)? {
                    let inner = Scope { row: &matched, ..scope };
                    if let Some(f) = filter {
                        if self.evaluate_predicate(f, inner)? != Some(true) {
                            continue;
                        }
                    }
                    out.push(self.evaluate_expression(map_expr, inner)?);
                }
                Ok(Value::List(out))
            }
            Expression::Predicate(p) => Ok(self
                .evaluate_predicate(p, scope)?
                .map(Value::Boolean)
                .unwrap_or(Value::Null)),
        }
    }

    fn call(&self, name: &str, args: &[Expression], scope: Scope<'_>) -> Result<Value, String> {
        if AGGREGATES.contains(&name) {
            return self.aggregate(name, args, scope);
        }
        let values = args
            .iter()
            .map(|a| self.evaluate_expression(a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match (name, values.as_slice()) {
            ("datetime", []) => Value::DateTime(self.now),
            (_, [Value::Null, ..]) if name != "coalesce" => Value::Null,
            ("datetime", [v]) => parse_datetime(v).map(Value::DateTime).unwrap_or(Value::Null),
            ("date", [Value::Date(d)]) => Value::Date(*d),
            ("date", [Value::String(s)]) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Null),
            ("duration", [Value::Duration(d)]) => Value::Duration(*d),
            ("duration", [Value::String(s)]) => parse_duration(s).map(Value::Duration).unwrap_or(Value::Null),
            ("point", [Value::Point(p)]) => Value::Point(*p),
            ("point", [Value::Map(m)]) => Point::from_map(m).map(Value::Point).unwrap_or(Value::Null),
            ("point.distance", [Value::Point(a), Value::Point(b)]) => {
                a.distance(b).map(Value::Float64).unwrap_or(Value::Null)
            }
            ("size", [Value::String(s)]) => Value::Int64(s.chars().count() as i64),
            ("size", [Value::List(l)]) => Value::Int64(l.len() as i64),
            ("head", [Value::List(l)]) => l.first().cloned().unwrap_or(Value::Null),
            ("coalesce", values) => values
                .iter()
                .find(|v| !v.is_null())
                .cloned()
                .unwrap_or(Value::Null),
            _ => return Err(format!("unsupported function call {}({:?})", name, values)),
        })
    }

    fn aggregate(&self, name: &str, args: &[Expression], scope: Scope<'_>) -> Result<Value, String> {
        let group = scope
            .group
            .ok_or_else(|| format!("aggregate `{}` outside of RETURN", name))?;
        let arg = args
            .first()
            .ok_or_else(|| format!("aggregate `{}` without argument", name))?;
        let mut values = Vec::new();
        for row in group {
            let value = self.evaluate_expression(arg, Scope::row(row))?;
            if !value.is_null() {
                values.push(value);
            }
        }
        Ok(match name {
            "count" => Value::Int64(values.len() as i64),
            "collect" => Value::List(values),
            _ if values.is_empty() => Value::Null,
            "min" => values
                .into_iter()
                .reduce(|a, b| if compare_values(&b, &a) == Some(Ordering::Less) { b } else { a })
                .unwrap_or(Value::Null),
            "max" => values
                .into_iter()
                .reduce(|a, b| if compare_values(&b, &a) == Some(Ordering::Greater) { b } else { a })
                .unwrap_or(Value::Null),
            "sum" if values.iter().all(|v| matches!(v, Value::Int64(_))) => {
                Value::Int64(values.iter().filter_map(|v| v.as_f64()).sum::<f64>() as i64)
            }
            "sum" => Value::Float64(values.iter().filter_map(Value::as_f64).sum()),
            "avg" => {
                let n = values.len() as f64;
                Value::Float64(values.iter().filter_map(Value::as_f64).sum::<f64>() / n)
            }
            _ => return Err(format!("unsupported aggregate `{}`", name)),
        })
    }
}

fn item_name(item: &ReturnItem) -> String {
    item.alias
        .clone()
        .unwrap_or_else(|| crate::cypher::render_expression(&item.expression))
}

fn identity(kind: &str, index: usize) -> Value {
    let mut map = BTreeMap::new();
    map.insert(kind.to_string(), Value::Int64(index as i64));
    Value::Map(map)
}

fn expression_aggregates(expr: &Expression) -> bool {
    match expr {
        Expression::FunctionCall { name, args, .. } => {
            AGGREGATES.contains(&name.as_str()) || args.iter().any(expression_aggregates)
        }
        Expression::FieldAccess { expr, .. } => expression_aggregates(expr),
        Expression::Add(a, b) => expression_aggregates(a) || expression_aggregates(b),
        Expression::Predicate(p) => predicate_aggregates(p),
        _ => false,
    }
}

fn predicate_aggregates(pred: &Predicate) -> bool {
    match pred {
        Predicate::Comparison { left, right, .. } => {
            expression_aggregates(left) || expression_aggregates(right)
        }
        Predicate::And(a, b) | Predicate::Or(a, b) => predicate_aggregates(a) || predicate_aggregates(b),
        Predicate::Not(inner) => predicate_aggregates(inner),
        Predicate::ListPredicate { list, .. } => expression_aggregates(list),
        _ => false,
    }
}

fn evaluate_comparison(left: &Value, op: ComparisonOp, right: &Value) -> Option<bool> {
    if left.is_null() || right.is_null() {
        return None;
    }
    match op {
        ComparisonOp::Equals => Some(values_equal(left, right)),
        ComparisonOp::NotEquals => Some(!values_equal(left, right)),
        ComparisonOp::LessThan => compare_values(left, right).map(|o| o == Ordering::Less),
        ComparisonOp::LessThanEq => compare_values(left, right).map(|o| o != Ordering::Greater),
        ComparisonOp::GreaterThan => compare_values(left, right).map(|o| o == Ordering::Greater),
        ComparisonOp::GreaterThanEq => compare_values(left, right).map(|o| o != Ordering::Less),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Int64(i), Value::Float64(f)) | (Value::Float64(f), Value::Int64(i)) => *i as f64 == *f,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        _ => false,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()),
        _ => None,
    }
}

/// ISO-8601 duration; years count 365 days and months 30.
pub fn parse_duration(text: &str) -> Option<chrono::Duration> {
    let caps = ISO_DURATION.captures(text)?;
    let part = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    let seconds = caps
        .get(7)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    let days = part(1) * 365 + part(2) * 30 + part(3) * 7 + part(4);
    Some(
        chrono::Duration::days(days)
            + chrono::Duration::hours(part(5))
            + chrono::Duration::minutes(part(6))
            + chrono::Duration::milliseconds((seconds * 1000.0).round() as i64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("P1D"), Some(chrono::Duration::days(1)));
        assert_eq!(parse_duration("PT23H"), Some(chrono::Duration::hours(23)));
        assert_eq!(
            parse_duration("P1W2DT1.5S"),
            Some(chrono::Duration::days(9) + chrono::Duration::milliseconds(1500))
        );
        assert_eq!(parse_duration("1D"), None);
    }

    #[test]
    fn test_three_valued_comparison() {
        assert_eq!(
            evaluate_comparison(&Value::Null, ComparisonOp::Equals, &Value::Int64(1)),
            None
        );
        assert_eq!(
            evaluate_comparison(&Value::Int64(2), ComparisonOp::GreaterThan, &Value::Float64(1.5)),
            Some(true)
        );
    }
}
