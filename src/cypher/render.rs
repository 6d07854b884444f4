// src/cypher/render.rs
// Renders the Cypher AST to query text

use super::ast::*;
use crate::datatypes::values::{format_duration, Value};

const INDENT: &str = "    ";

// ============================================================================
// Clauses
// ============================================================================

/// Render a clause sequence, one clause per line, nested CALL bodies indented.
pub fn render_clauses(clauses: &[Clause]) -> String {
    let mut lines = Vec::new();
    for clause in clauses {
        render_clause(clause, 0, &mut lines);
    }
    lines.join("\n")
}

fn render_clause(clause: &Clause, depth: usize, lines: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    match clause {
        Clause::Match(m) => {
            lines.push(format!("{}MATCH {}", pad, render_pattern(&m.pattern)));
            if let Some(pred) = &m.where_clause {
                lines.push(format!("{}WHERE {}", pad, render_predicate(pred)));
            }
        }
        Clause::Call(call) => {
            lines.push(format!("{}CALL {{", pad));
            if !call.imports.is_empty() {
                lines.push(format!("{}{}WITH {}", pad, INDENT, call.imports.join(", ")));
            }
            for inner in &call.body {
                render_clause(inner, depth + 1, lines);
            }
            lines.push(format!("{}}}", pad));
        }
        Clause::With(w) => {
            let items = match &w.projection {
                Projection::All => "*".to_string(),
                Projection::Items(items) => render_items(items),
            };
            lines.push(format!("{}WITH {}", pad, items));
            if let Some(pred) = &w.where_clause {
                lines.push(format!("{}WHERE {}", pad, render_predicate(pred)));
            }
        }
        Clause::Unwind(u) => lines.push(format!(
            "{}UNWIND {} AS {}",
            pad,
            render_expression(&u.expression),
            u.alias
        )),
        Clause::Return(r) => lines.push(format!("{}RETURN {}", pad, render_items(&r.items))),
        Clause::Statement(text) => {
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                lines.push(format!("{}{}", pad, line));
            }
        }
    }
}

fn render_items(items: &[ReturnItem]) -> String {
    items
        .iter()
        .map(|item| {
            let expr = render_expression(&item.expression);
            match &item.alias {
                Some(alias) if *alias != expr => format!("{} AS {}", expr, alias),
                _ => expr,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Patterns
// ============================================================================

pub fn render_pattern(pattern: &Pattern) -> String {
    let mut out = String::new();
    for element in &pattern.elements {
        match element {
            PatternElement::Node(node) => {
                out.push('(');
                if let Some(var) = &node.variable {
                    out.push_str(var);
                }
                for label in &node.labels {
                    out.push(':');
                    out.push_str(label);
                }
                out.push(')');
            }
            PatternElement::Edge(edge) => {
                let body = format!(
                    "[{}:{}]",
                    edge.variable.as_deref().unwrap_or(""),
                    edge.connection_type
                );
                match edge.direction {
                    EdgeDirection::Outgoing => out.push_str(&format!("-{}->", body)),
                    EdgeDirection::Incoming => out.push_str(&format!("<-{}-", body)),
                    EdgeDirection::Both => out.push_str(&format!("-{}-", body)),
                }
            }
        }
    }
    out
}

// ============================================================================
// Predicates
// ============================================================================

pub fn render_predicate(pred: &Predicate) -> String {
    match pred {
        Predicate::Comparison {
            left,
            operator,
            right,
        } => format!(
            "{} {} {}",
            render_expression(left),
            operator.symbol(),
            render_expression(right)
        ),
        Predicate::And(..) => {
            let mut parts = Vec::new();
            flatten_chain(pred, true, &mut parts);
            format!("({})", parts.join(" AND "))
        }
        Predicate::Or(..) => {
            let mut parts = Vec::new();
            flatten_chain(pred, false, &mut parts);
            format!("({})", parts.join(" OR "))
        }
        Predicate::Not(inner) => match inner.as_ref() {
            Predicate::And(..) | Predicate::Or(..) => format!("NOT {}", render_predicate(inner)),
            _ => format!("NOT ({})", render_predicate(inner)),
        },
        Predicate::IsNull(expr) => format!("{} IS NULL", render_expression(expr)),
        Predicate::IsNotNull(expr) => format!("{} IS NOT NULL", render_expression(expr)),
        Predicate::In { expr, list } => {
            format!("{} IN {}", render_expression(expr), render_expression(list))
        }
        Predicate::StartsWith { expr, pattern } => format!(
            "{} STARTS WITH {}",
            render_expression(expr),
            render_expression(pattern)
        ),
        Predicate::EndsWith { expr, pattern } => format!(
            "{} ENDS WITH {}",
            render_expression(expr),
            render_expression(pattern)
        ),
        Predicate::Contains { expr, pattern } => format!(
            "{} CONTAINS {}",
            render_expression(expr),
            render_expression(pattern)
        ),
        Predicate::Matches { expr, pattern } => format!(
            "{} =~ {}",
            render_expression(expr),
            render_expression(pattern)
        ),
        Predicate::HasLabel { variable, label } => format!("{}:{}", variable, label),
        Predicate::Exists {
            pattern,
            where_clause,
        } => match where_clause {
            Some(w) => format!(
                "EXISTS {{ MATCH {} WHERE {} }}",
                render_pattern(pattern),
                render_predicate(w)
            ),
            None => format!("EXISTS {{ MATCH {} }}", render_pattern(pattern)),
        },
        Predicate::ListPredicate {
            quantifier,
            variable,
            list,
            where_clause,
        } => {
            let name = match quantifier {
                Quantifier::Any => "any",
                Quantifier::All => "all",
                Quantifier::None => "none",
                Quantifier::Single => "single",
            };
            let condition = where_clause
                .as_ref()
                .map(|w| render_predicate(w))
                .unwrap_or_else(|| "true".to_string());
            format!(
                "{}({} IN {} WHERE {})",
                name,
                variable,
                render_expression(list),
                condition
            )
        }
    }
}

/// Collect the operands of a chain of the same connective so that
/// `And(And(a, b), c)` renders as `(a AND b AND c)`.
fn flatten_chain(pred: &Predicate, and: bool, out: &mut Vec<String>) {
    match (pred, and) {
        (Predicate::And(l, r), true) | (Predicate::Or(l, r), false) => {
            flatten_chain(l, and, out);
            flatten_chain(r, and, out);
        }
        _ => out.push(render_predicate(pred)),
    }
}

// ============================================================================
// Expressions
// ============================================================================

pub fn render_expression(expr: &Expression) -> String {
    match expr {
        Expression::PropertyAccess { variable, property } => format!("{}.{}", variable, property),
        Expression::FieldAccess { expr, field } => format!("{}.{}", render_expression(expr), field),
        Expression::Variable(name) => name.clone(),
        Expression::Literal(value) => render_literal(value),
        Expression::Parameter(name) => format!("${}", name),
        Expression::FunctionCall {
            name,
            args,
            distinct,
        } => {
            let args_str: Vec<String> = args.iter().map(render_expression).collect();
            if *distinct {
                format!("{}(DISTINCT {})", name, args_str.join(", "))
            } else {
                format!("{}({})", name, args_str.join(", "))
            }
        }
        Expression::Add(l, r) => format!("{} + {}", render_expression(l), render_expression(r)),
        Expression::ListComprehension {
            variable,
            list_expr,
            filter,
            map_expr,
        } => {
            let mut result = format!("[{} IN {}", variable, render_expression(list_expr));
            if let Some(f) = filter {
                result.push_str(&format!(" WHERE {}", render_predicate(f)));
            }
            if let Some(m) = map_expr {
                result.push_str(&format!(" | {}", render_expression(m)));
            }
            result.push(']');
            result
        }
        Expression::PatternComprehension {
            pattern,
            filter,
            map_expr,
        } => {
            let mut result = format!("[{}", render_pattern(pattern));
            if let Some(f) = filter {
                result.push_str(&format!(" WHERE {}", render_predicate(f)));
            }
            result.push_str(&format!(" | {}]", render_expression(map_expr)));
            result
        }
        Expression::Predicate(pred) => render_predicate(pred),
    }
}

/// Render a schema-owned constant. Caller-supplied values never reach this
/// function; they are bound as parameters.
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => format!("{:?}", f),
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::List(items) => format!(
            "[{}]",
            items.iter().map(render_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Map(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", k, render_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Point(p) => {
            let z = p.z.map(|z| format!(", z: {:?}", z)).unwrap_or_default();
            format!(
                "point({{x: {:?}, y: {:?}{}, srid: {}}})",
                p.x, p.y, z, p.srid
            )
        }
        Value::DateTime(dt) => format!("datetime('{}')", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        Value::Date(d) => format!("date('{}')", d.format("%Y-%m-%d")),
        Value::Duration(d) => format!("duration('{}')", format_duration(d)),
    }
}
