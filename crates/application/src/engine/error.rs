use formloom_core::AppError;
use formloom_domain::SchemaViolation;
use thiserror::Error;

/// Failures raised while building trees, resolving references or checking
/// api payloads.
///
/// Most of these degrade to a safe default inside an assembly pass and are
/// surfaced as issues; they only become hard errors when a caller asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormEngineError {
    /// Parent pointers loop back onto a node already on the path.
    #[error("cycle detected through {}", ids.join(" -> "))]
    CycleDetected {
        /// Ids of the nodes forming the cycle, in parent order.
        ids: Vec<String>,
    },
    /// A parent pointer names a node missing from the input.
    #[error("'{id}' references missing parent '{parent_id}'")]
    DanglingParent {
        /// Child id.
        id: String,
        /// Missing parent id.
        parent_id: String,
    },
    /// A placeholder could not be resolved against the current scope.
    #[error("unresolved reference '{reference}': {reason}")]
    UnresolvedReference {
        /// Placeholder text.
        reference: String,
        /// Why resolution failed.
        reason: String,
    },
    /// A payload does not satisfy its declared JSON schema.
    #[error("schema mismatch at {path}: {message}")]
    SchemaMismatch {
        /// Pointer-like path of the offending value.
        path: String,
        /// Violation description.
        message: String,
    },
}

impl From<SchemaViolation> for FormEngineError {
    fn from(violation: SchemaViolation) -> Self {
        Self::SchemaMismatch {
            path: violation.path().to_owned(),
            message: violation.message().to_owned(),
        }
    }
}

impl From<FormEngineError> for AppError {
    fn from(error: FormEngineError) -> Self {
        match error {
            FormEngineError::UnresolvedReference { .. } => Self::NotFound(error.to_string()),
            FormEngineError::CycleDetected { .. }
            | FormEngineError::DanglingParent { .. }
            | FormEngineError::SchemaMismatch { .. } => Self::Validation(error.to_string()),
        }
    }
}
