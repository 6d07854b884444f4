// src/auth/claims.rs
// JWT claim lookup by dotted path. `a\.b.c` addresses the key `a.b`, then `c`.

use serde_json::{Map, Value as JsonValue};

use crate::error::{FilterError, Result};

/// Supplies claim values to claim filters
pub trait ClaimResolver {
    /// Value at `path`, one map key per segment. `None` when absent.
    fn resolve(&self, path: &[String]) -> Option<&JsonValue>;
}

/// Split a claim path on unescaped dots.
pub fn parse_claim_path(path: &str) -> Result<Vec<String>> {
    let invalid = || FilterError::InvalidClaimPath(path.to_string());
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('.') => current.push('.'),
                Some('\\') => current.push('\\'),
                _ => return Err(invalid()),
            },
            '.' => {
                if current.is_empty() {
                    return Err(invalid());
                }
                segments.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    if current.is_empty() {
        return Err(invalid());
    }
    segments.push(current);
    Ok(segments)
}

/// Decoded JWT payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JwtClaims {
    claims: Map<String, JsonValue>,
}

impl JwtClaims {
    pub fn new(claims: Map<String, JsonValue>) -> Self {
        JwtClaims { claims }
    }

    pub fn from_json(source: &str) -> Result<Self> {
        match serde_json::from_str(source) {
            Ok(JsonValue::Object(claims)) => Ok(JwtClaims { claims }),
            Ok(_) => Err(FilterError::invalid_value("jwt", "a JSON object")),
            Err(e) => Err(FilterError::invalid_value("jwt", e.to_string())),
        }
    }

    /// Look a claim up by its textual path.
    pub fn get(&self, path: &str) -> Result<Option<&JsonValue>> {
        Ok(self.resolve(&parse_claim_path(path)?))
    }
}

impl ClaimResolver for JwtClaims {
    fn resolve(&self, path: &[String]) -> Option<&JsonValue> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.claims.get(first)?, |value, segment| value.get(segment))
    }
}
