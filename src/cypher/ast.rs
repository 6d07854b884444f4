// src/cypher/ast.rs
// Cypher AST produced by the filter compiler and rendered by render.rs

use crate::datatypes::values::Value;
use std::collections::BTreeSet;

// ============================================================================
// Clauses
// ============================================================================

/// Clauses that appear in hoisted subqueries
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(MatchClause),
    Call(CallClause),
    With(WithClause),
    Unwind(UnwindClause),
    Return(ReturnClause),
    /// Schema-owned Cypher text (custom `@cypher` statements), emitted verbatim
    Statement(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub pattern: Pattern,
    pub where_clause: Option<Predicate>,
}

/// `CALL { WITH <imports> <body> }`
#[derive(Debug, Clone, PartialEq)]
pub struct CallClause {
    pub imports: Vec<String>,
    pub body: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `WITH *`
    All,
    Items(Vec<ReturnItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    pub projection: Projection,
    pub where_clause: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnwindClause {
    pub expression: Expression,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub items: Vec<ReturnItem>,
}

/// A single projected item: expression AS alias
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn aliased(expression: Expression, alias: &str) -> Self {
        ReturnItem {
            expression,
            alias: Some(alias.to_string()),
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// A path pattern: alternating node and edge elements
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub elements: Vec<PatternElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternElement {
    Node(NodePattern),
    Edge(EdgePattern),
}

/// `(var:Label)`
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
}

/// `-[var:TYPE]->`
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    pub variable: Option<String>,
    pub connection_type: String,
    pub direction: EdgeDirection,
}

/// Direction of edge traversal, read from the pattern's start node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Outgoing, // -[]->
    Incoming, // <-[]-
    Both,     // -[]-
}

impl NodePattern {
    pub fn bound(variable: &str) -> Self {
        NodePattern {
            variable: Some(variable.to_string()),
            labels: Vec::new(),
        }
    }

    pub fn labelled(variable: Option<&str>, labels: Vec<String>) -> Self {
        NodePattern {
            variable: variable.map(str::to_string),
            labels,
        }
    }
}

impl Pattern {
    /// Single-hop pattern `(from)-[edge]-(to)`
    pub fn hop(from: NodePattern, edge: EdgePattern, to: NodePattern) -> Self {
        Pattern {
            elements: vec![
                PatternElement::Node(from),
                PatternElement::Edge(edge),
                PatternElement::Node(to),
            ],
        }
    }

    /// Variables introduced or referenced by the pattern
    pub fn variables(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PatternElement::Node(n) => n.variable.as_deref(),
                PatternElement::Edge(e) => e.variable.as_deref(),
            })
            .collect()
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Boolean expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Comparison {
        left: Expression,
        operator: ComparisonOp,
        right: Expression,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    IsNull(Expression),
    IsNotNull(Expression),
    In {
        expr: Expression,
        list: Expression,
    },
    StartsWith {
        expr: Expression,
        pattern: Expression,
    },
    EndsWith {
        expr: Expression,
        pattern: Expression,
    },
    Contains {
        expr: Expression,
        pattern: Expression,
    },
    /// Regular expression match `=~`
    Matches {
        expr: Expression,
        pattern: Expression,
    },
    HasLabel {
        variable: String,
        label: String,
    },
    /// `EXISTS { MATCH pattern WHERE ... }`
    Exists {
        pattern: Pattern,
        where_clause: Option<Box<Predicate>>,
    },
    /// `any(x IN list WHERE ...)` and friends
    ListPredicate {
        quantifier: Quantifier,
        variable: String,
        list: Expression,
        where_clause: Option<Box<Predicate>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
    None,
    Single,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equals,        // =
    NotEquals,     // <>
    LessThan,      // <
    LessThanEq,    // <=
    GreaterThan,   // >
    GreaterThanEq, // >=
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "=",
            ComparisonOp::NotEquals => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanEq => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanEq => ">=",
        }
    }
}

impl Predicate {
    pub fn compare(left: Expression, operator: ComparisonOp, right: Expression) -> Self {
        Predicate::Comparison {
            left,
            operator,
            right,
        }
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::compare(left, ComparisonOp::Equals, right)
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Left-folded conjunction; `None` when there is nothing to combine
    pub fn and_all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }

    pub fn or_all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::or)
    }

    /// `var = true` test on a boolean hoisted out of a subquery
    pub fn is_true(variable: &str) -> Self {
        Self::eq(
            Expression::Variable(variable.to_string()),
            Expression::Literal(Value::Boolean(true)),
        )
    }

    pub fn is_false(variable: &str) -> Self {
        Self::eq(
            Expression::Variable(variable.to_string()),
            Expression::Literal(Value::Boolean(false)),
        )
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Property access: n.name, r.weight
    PropertyAccess {
        variable: String,
        property: String,
    },
    /// Map key access on an arbitrary expression: $param.point
    FieldAccess {
        expr: Box<Expression>,
        field: String,
    },
    Variable(String),
    Literal(Value),
    /// Parameter reference: $param_name
    Parameter(String),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
        distinct: bool,
    },
    Add(Box<Expression>, Box<Expression>),
    /// `[x IN list WHERE filter | map]`
    ListComprehension {
        variable: String,
        list_expr: Box<Expression>,
        filter: Option<Box<Predicate>>,
        map_expr: Option<Box<Expression>>,
    },
    /// `[pattern WHERE filter | map]`
    PatternComprehension {
        pattern: Pattern,
        filter: Option<Box<Predicate>>,
        map_expr: Box<Expression>,
    },
    /// A predicate used as a boolean value, e.g. in RETURN
    Predicate(Box<Predicate>),
}

impl Expression {
    pub fn property(variable: &str, property: &str) -> Self {
        Expression::PropertyAccess {
            variable: variable.to_string(),
            property: property.to_string(),
        }
    }

    pub fn param(name: &str) -> Self {
        Expression::Parameter(name.to_string())
    }

    pub fn variable(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.to_string(),
            args,
            distinct: false,
        }
    }

    pub fn field(self, field: &str) -> Self {
        Expression::FieldAccess {
            expr: Box::new(self),
            field: field.to_string(),
        }
    }

    pub fn plus(self, other: Expression) -> Self {
        Expression::Add(Box::new(self), Box::new(other))
    }
}

// ============================================================================
// Parameter references
// ============================================================================

impl Clause {
    /// Collect every `$parameter` the clause refers to, nested bodies included.
    pub fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self {
            Clause::Match(m) => {
                if let Some(pred) = &m.where_clause {
                    pred.collect_parameters(out);
                }
            }
            Clause::Call(call) => {
                for clause in &call.body {
                    clause.collect_parameters(out);
                }
            }
            Clause::With(w) => {
                if let Projection::Items(items) = &w.projection {
                    for item in items {
                        item.expression.collect_parameters(out);
                    }
                }
                if let Some(pred) = &w.where_clause {
                    pred.collect_parameters(out);
                }
            }
            Clause::Unwind(u) => u.expression.collect_parameters(out),
            Clause::Return(r) => {
                for item in &r.items {
                    item.expression.collect_parameters(out);
                }
            }
            // Schema-owned text binds nothing from the filter
            Clause::Statement(_) => {}
        }
    }
}

impl Predicate {
    pub fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self {
            Predicate::Comparison { left, right, .. } => {
                left.collect_parameters(out);
                right.collect_parameters(out);
            }
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.collect_parameters(out);
                b.collect_parameters(out);
            }
            Predicate::Not(inner) => inner.collect_parameters(out),
            Predicate::IsNull(expr) | Predicate::IsNotNull(expr) => expr.collect_parameters(out),
            Predicate::In { expr, list } => {
                expr.collect_parameters(out);
                list.collect_parameters(out);
            }
            Predicate::StartsWith { expr, pattern }
            | Predicate::EndsWith { expr, pattern }
            | Predicate::Contains { expr, pattern }
            | Predicate::Matches { expr, pattern } => {
                expr.collect_parameters(out);
                pattern.collect_parameters(out);
            }
            Predicate::HasLabel { .. } => {}
            Predicate::Exists { where_clause, .. } => {
                if let Some(w) = where_clause {
                    w.collect_parameters(out);
                }
            }
            Predicate::ListPredicate {
                list, where_clause, ..
            } => {
                list.collect_parameters(out);
                if let Some(w) = where_clause {
                    w.collect_parameters(out);
                }
            }
        }
    }
}

impl Expression {
    pub fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self {
            Expression::Parameter(name) => {
                out.insert(name.clone());
            }
            Expression::FieldAccess { expr, .. } => expr.collect_parameters(out),
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_parameters(out);
                }
            }
            Expression::Add(a, b) => {
                a.collect_parameters(out);
                b.collect_parameters(out);
            }
            Expression::ListComprehension {
                list_expr,
                filter,
                map_expr,
                ..
            } => {
                list_expr.collect_parameters(out);
                if let Some(f) = filter {
                    f.collect_parameters(out);
                }
                if let Some(m) = map_expr {
                    m.collect_parameters(out);
                }
            }
            Expression::PatternComprehension {
                filter, map_expr, ..
            } => {
                if let Some(f) = filter {
                    f.collect_parameters(out);
                }
                map_expr.collect_parameters(out);
            }
            Expression::Predicate(pred) => pred.collect_parameters(out),
            Expression::PropertyAccess { .. } | Expression::Variable(_) | Expression::Literal(_) => {}
        }
    }
}
