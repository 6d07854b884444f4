// src/schema/global_id.rs
// Opaque global node identifiers: base64("<Type>:<field>:<value>")

use crate::error::{FilterError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalId {
    pub type_name: String,
    pub field: String,
    pub id: String,
}

pub fn to_global_id(type_name: &str, field: &str, id: &str) -> String {
    STANDARD.encode(format!("{}:{}:{}", type_name, field, id))
}

pub fn from_global_id(encoded: &str) -> Result<GlobalId> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| FilterError::InvalidGlobalId(encoded.to_string()))?;
    let decoded =
        String::from_utf8(bytes).map_err(|_| FilterError::InvalidGlobalId(encoded.to_string()))?;
    // The raw id may itself contain ':'; only the first two separate parts.
    let mut parts = decoded.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(type_name), Some(field), Some(id)) if !type_name.is_empty() && !field.is_empty() => {
            Ok(GlobalId {
                type_name: type_name.to_string(),
                field: field.to_string(),
                id: id.to_string(),
            })
        }
        _ => Err(FilterError::InvalidGlobalId(encoded.to_string())),
    }
}
