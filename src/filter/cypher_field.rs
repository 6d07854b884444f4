// src/filter/cypher_field.rs
// Filtering on fields computed by a schema-supplied Cypher statement. The
// statement runs in a hoisted CALL and its column is compared afterwards.

use serde_json::Value as JsonValue;

use super::context::{CompileContext, Fragment, Frame};
use super::key_parser::ParsedFilterKey;
use super::property::scalar;
use crate::cypher::ast::{
    CallClause, Clause, Expression, Projection, ReturnClause, ReturnItem, UnwindClause, WithClause,
};
use crate::error::Result;
use crate::schema::{CypherField, SchemaField};

/// Variable custom statements refer to the current node by
const STATEMENT_NODE: &str = "this";

pub(crate) fn build(
    ctx: &mut CompileContext<'_>,
    field: &SchemaField,
    cypher: &CypherField,
    parsed: &ParsedFilterKey,
    frame: &Frame,
    key: &str,
    value: &JsonValue,
) -> Result<Fragment> {
    let parent = frame.variable.clone();
    let row = ctx.names.value();
    let result = ctx.names.value();

    let mut statement = Vec::new();
    if parent != STATEMENT_NODE {
        statement.push(Clause::With(WithClause {
            projection: Projection::Items(vec![ReturnItem::aliased(
                Expression::variable(&parent),
                STATEMENT_NODE,
            )]),
            where_clause: None,
        }));
    }
    statement.push(Clause::Statement(cypher.statement.clone()));

    let collected = Expression::call("collect", vec![Expression::variable(&row)]);
    let projected = if field.is_array() {
        collected
    } else {
        Expression::call("head", vec![collected])
    };
    let body = vec![
        Clause::Call(CallClause {
            imports: vec![parent.clone()],
            body: statement,
        }),
        Clause::Unwind(UnwindClause {
            expression: Expression::variable(&cypher.column_name),
            alias: row,
        }),
        Clause::Return(ReturnClause {
            items: vec![ReturnItem::aliased(projected, &result)],
        }),
    ];

    let predicate = scalar(
        ctx,
        field,
        parsed,
        Expression::variable(&result),
        frame.param_name(key),
        value,
    )?;
    Ok(Fragment {
        predicate: Some(predicate),
        subqueries: vec![Clause::Call(CallClause {
            imports: vec![parent],
            body,
        })],
    })
}
