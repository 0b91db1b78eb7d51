use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

/// Errors raised while resolving or navigating schemas.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A `$ref` could not be resolved in its own scope or any linked scope.
    #[error("reference not found: `{reference}` (known targets: {})", known.join(", "))]
    ReferenceNotFound {
        /// The unresolved `$ref` value.
        reference: String,
        /// Targets registered in the owning scope, sorted.
        known: Vec<String>,
    },

    /// A selection step does not match any item or option.
    #[error("invalid selection `{step}`: {reason}")]
    InvalidSelection {
        /// Display form of the offending step.
        step: String,
        /// Why the step was rejected.
        reason: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid_selection(step: impl ToString, reason: impl Into<String>) -> Self {
        SchemaError::InvalidSelection {
            step: step.to_string(),
            reason: reason.into(),
        }
    }
}
