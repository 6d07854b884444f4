// src/datatypes/params.rs
use crate::datatypes::values::Value;
use crate::error::{FilterError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat parameter map bound to a compiled query. Names are unique: binding
/// the same name twice is a compiler defect and is reported, never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamMap {
    entries: BTreeMap<String, Value>,
}

impl ParamMap {
    pub fn new() -> Self {
        ParamMap::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(FilterError::ParameterCollision(name));
        }
        self.entries.insert(name, value);
        Ok(())
    }

    pub fn merge(&mut self, other: ParamMap) -> Result<()> {
        for (name, value) in other.entries {
            self.insert(name, value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.entries.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.entries
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
