// src/config.rs
use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};

/// Compiler settings. Every field has a default so a partial JSON document
/// (or none at all) is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Maximum nesting of filter objects before `FilterTooDeep` is raised.
    pub max_depth: usize,
    /// Cypher variable bound to the root node; also the root of parameter names.
    pub root_variable: String,
    /// Prefix for parameters carrying JWT claim values.
    pub jwt_parameter: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            max_depth: 32,
            root_variable: "this".to_string(),
            jwt_parameter: "jwt".to_string(),
        }
    }
}

impl FilterConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source)
            .map_err(|e| FilterError::InvalidSchema(format!("filter config: {}", e)))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_root_variable(mut self, root_variable: &str) -> Self {
        self.root_variable = root_variable.to_string();
        self
    }
}
