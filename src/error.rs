// src/error.rs
// Error taxonomy for filter compilation

/// Broad classification used by callers to decide how an error is surfaced
/// and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The filter input itself is wrong; report back to the requester.
    UserInput,
    /// The input refers to something the schema model does not describe.
    SchemaMismatch,
    /// An invariant of the compiler was violated (a defect).
    Internal,
    /// A configured limit was exceeded.
    ResourceLimit,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Malformed filter key `{key}`: {reason}")]
    MalformedFilterKey { key: String, reason: String },

    #[error("Unknown operator `{operator}` for field `{field}`")]
    UnknownOperator { operator: String, field: String },

    #[error("Related type `{type_name}` of field `{field}` not found in schema")]
    UnknownRelatedType { field: String, type_name: String },

    #[error("Type `{0}` not found in schema")]
    UnknownType(String),

    #[error("Field `{field}` does not exist on type `{type_name}`")]
    UnknownField { type_name: String, field: String },

    #[error("Aggregate filter `{field}Aggregate` requires a relationship field")]
    AggregateOnNonRelationship { field: String },

    #[error("Parameter `{0}` was bound twice")]
    ParameterCollision(String),

    #[error("Filter nesting exceeds the maximum depth of {max_depth}")]
    FilterTooDeep { max_depth: usize },

    #[error("`_on` is used as the only argument and `{type_name}` is not present within")]
    AmbiguousInterfaceFilter { type_name: String },

    #[error("Invalid value for `{key}`: expected {expected}")]
    InvalidFilterValue { key: String, expected: String },

    #[error("Invalid global id `{0}`")]
    InvalidGlobalId(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid claim path `{0}`")]
    InvalidClaimPath(String),

    #[error("Parameter `{0}` is referenced but never bound")]
    UnboundParameter(String),
}

impl FilterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::MalformedFilterKey { .. }
            | FilterError::InvalidFilterValue { .. }
            | FilterError::InvalidGlobalId(_)
            | FilterError::AmbiguousInterfaceFilter { .. }
            | FilterError::InvalidClaimPath(_) => ErrorKind::UserInput,
            FilterError::UnknownOperator { .. }
            | FilterError::UnknownRelatedType { .. }
            | FilterError::UnknownType(_)
            | FilterError::UnknownField { .. }
            | FilterError::AggregateOnNonRelationship { .. }
            | FilterError::InvalidSchema(_) => ErrorKind::SchemaMismatch,
            FilterError::ParameterCollision(_) | FilterError::UnboundParameter(_) => {
                ErrorKind::Internal
            }
            FilterError::FilterTooDeep { .. } => ErrorKind::ResourceLimit,
        }
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        FilterError::MalformedFilterKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(key: &str, expected: impl Into<String>) -> Self {
        FilterError::InvalidFilterValue {
            key: key.to_string(),
            expected: expected.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
