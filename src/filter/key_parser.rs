// src/filter/key_parser.rs
// Decomposes filter keys such as `title_NOT_CONTAINS` or `actorsAggregate`.

use crate::error::{FilterError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// `field[Aggregate][_NOT][_OPERATOR]`. The field part is lazy so that a
/// recognised suffix is never swallowed into the field name.
static FILTER_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<field>[_A-Za-z][_0-9A-Za-z]*?)(?P<aggregate>Aggregate)?(?P<not>_NOT)?(?:_(?P<operator>IN|INCLUDES|MATCHES|CONTAINS|STARTS_WITH|ENDS_WITH|LTE|LT|GTE|GT|DISTANCE|ALL|EVERY|NONE|SINGLE|SOME))?$",
    )
    .expect("filter key pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    In,
    Includes,
    Matches,
    Contains,
    StartsWith,
    EndsWith,
    Lt,
    Lte,
    Gt,
    Gte,
    Distance,
    Every,
    None,
    Single,
    Some,
    /// Only produced by aggregation keys (`count_EQUAL`)
    Equal,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::In => "IN",
            FilterOperator::Includes => "INCLUDES",
            FilterOperator::Matches => "MATCHES",
            FilterOperator::Contains => "CONTAINS",
            FilterOperator::StartsWith => "STARTS_WITH",
            FilterOperator::EndsWith => "ENDS_WITH",
            FilterOperator::Lt => "LT",
            FilterOperator::Lte => "LTE",
            FilterOperator::Gt => "GT",
            FilterOperator::Gte => "GTE",
            FilterOperator::Distance => "DISTANCE",
            FilterOperator::Every => "EVERY",
            FilterOperator::None => "NONE",
            FilterOperator::Single => "SINGLE",
            FilterOperator::Some => "SOME",
            FilterOperator::Equal => "EQUAL",
        }
    }

    pub fn is_list_quantifier(&self) -> bool {
        matches!(
            self,
            FilterOperator::Every
                | FilterOperator::None
                | FilterOperator::Single
                | FilterOperator::Some
        )
    }

    /// Operators that may carry a `_NOT` modifier. Ordering, distance, regex
    /// and list quantifiers have no unambiguous negated form and are rejected.
    pub fn is_negatable(&self) -> bool {
        matches!(
            self,
            FilterOperator::In
                | FilterOperator::Includes
                | FilterOperator::Contains
                | FilterOperator::StartsWith
                | FilterOperator::EndsWith
                | FilterOperator::Equal
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s {
            "IN" => FilterOperator::In,
            "INCLUDES" => FilterOperator::Includes,
            "MATCHES" => FilterOperator::Matches,
            "CONTAINS" => FilterOperator::Contains,
            "STARTS_WITH" => FilterOperator::StartsWith,
            "ENDS_WITH" => FilterOperator::EndsWith,
            "LT" => FilterOperator::Lt,
            "LTE" => FilterOperator::Lte,
            "GT" => FilterOperator::Gt,
            "GTE" => FilterOperator::Gte,
            "DISTANCE" => FilterOperator::Distance,
            "ALL" | "EVERY" => FilterOperator::Every,
            "NONE" => FilterOperator::None,
            "SINGLE" => FilterOperator::Single,
            "SOME" => FilterOperator::Some,
            "EQUAL" => FilterOperator::Equal,
            other => {
                return Err(FilterError::UnknownOperator {
                    operator: other.to_string(),
                    field: String::new(),
                })
            }
        };
        Ok(op)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilterKey {
    pub field_name: String,
    pub is_aggregate: bool,
    pub is_not: bool,
    pub operator: Option<FilterOperator>,
}

pub fn parse_filter_key(key: &str) -> Result<ParsedFilterKey> {
    let caps = FILTER_KEY
        .captures(key)
        .ok_or_else(|| FilterError::malformed(key, "expected field[Aggregate][_NOT][_OPERATOR]"))?;

    let field_name = caps
        .name("field")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let is_aggregate = caps.name("aggregate").is_some();
    let is_not = caps.name("not").is_some();
    let operator = caps
        .name("operator")
        .map(|m| m.as_str().parse::<FilterOperator>())
        .transpose()?;

    if is_aggregate && operator.is_some() {
        return Err(FilterError::malformed(
            key,
            "aggregate filters take no operator suffix",
        ));
    }
    if let (true, Some(op)) = (is_not, operator) {
        if !op.is_negatable() {
            return Err(FilterError::malformed(
                key,
                format!("`_NOT` cannot be combined with `_{}`", op),
            ));
        }
    }

    Ok(ParsedFilterKey {
        field_name,
        is_aggregate,
        is_not,
        operator,
    })
}
