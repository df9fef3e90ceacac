//! Sync error types.

use thiserror::Error;
use unison_connector::{ConnectorError, RemoteFailure};
use unison_core::{describe_violations, FieldViolation, ObjectKind, Provider};
use unison_db::DbError;
use unison_field_mapping::FieldMappingError;
use unison_unification::UnificationError;

use crate::stage::SyncStage;

/// Errors that can occur during a sync call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The input was rejected; every offending field is listed.
    #[error("Validation failed: {}", describe_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Not found within the tenant.
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    #[error("provider {provider} has no mapping for object kind {kind}")]
    UnsupportedMapping { provider: Provider, kind: ObjectKind },

    /// Engine and mapper disagree on a payload shape.
    #[error("mapping failed for {provider}/{kind}: {message}")]
    Mapping {
        provider: Provider,
        kind: ObjectKind,
        message: String,
    },

    /// The provider call failed or timed out. Never retried here.
    #[error("remote provider {provider} failed: {failure}")]
    RemoteProvider {
        provider: Provider,
        failure: RemoteFailure,
    },

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation(violations)
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create a mapping error.
    pub fn mapping(provider: Provider, kind: ObjectKind, message: impl Into<String>) -> Self {
        Self::Mapping {
            provider,
            kind,
            message: message.into(),
        }
    }

    /// Offending fields of a validation error.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            SyncError::Validation(violations) => violations,
            _ => &[],
        }
    }

    /// Upstream status code, when the provider returned one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SyncError::RemoteProvider {
                failure: RemoteFailure::Status { code, .. },
                ..
            } => Some(*code),
            _ => None,
        }
    }

    /// Whether the caller can fix the request (4xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_)
                | SyncError::NotFound { .. }
                | SyncError::UnsupportedProvider { .. }
                | SyncError::UnsupportedMapping { .. }
        )
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "VALIDATION_FAILED",
            SyncError::NotFound { .. } => "NOT_FOUND",
            SyncError::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
            SyncError::UnsupportedMapping { .. } => "UNSUPPORTED_MAPPING",
            SyncError::Mapping { .. } => "MAPPING_FAILED",
            SyncError::RemoteProvider { .. } => "REMOTE_PROVIDER_ERROR",
            SyncError::Storage(e) => e.error_code(),
            SyncError::Serialization(_) => "SERIALIZATION_FAILED",
        }
    }
}

impl From<ConnectorError> for SyncError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::UnsupportedProvider { provider } => Self::UnsupportedProvider { provider },
            ConnectorError::UnsupportedMapping { provider, kind } => {
                Self::UnsupportedMapping { provider, kind }
            }
            ConnectorError::Mapping {
                provider,
                kind,
                message,
            } => Self::Mapping {
                provider,
                kind,
                message,
            },
            ConnectorError::RemoteProvider { provider, failure } => {
                Self::RemoteProvider { provider, failure }
            }
        }
    }
}

impl From<UnificationError> for SyncError {
    fn from(err: UnificationError) -> Self {
        match err {
            UnificationError::Validation(violations) => Self::Validation(violations),
            UnificationError::UnsupportedProvider { provider } => Self::UnsupportedProvider { provider },
            UnificationError::UnsupportedMapping { provider, kind } => {
                Self::UnsupportedMapping { provider, kind }
            }
            UnificationError::Mapping {
                provider,
                kind,
                index,
                message,
            } => Self::Mapping {
                provider,
                kind,
                message: match index {
                    Some(i) => format!("element {i}: {message}"),
                    None => message,
                },
            },
        }
    }
}

impl From<FieldMappingError> for SyncError {
    fn from(err: FieldMappingError) -> Self {
        match err {
            FieldMappingError::Validation(violations) => Self::Validation(violations),
            FieldMappingError::DuplicateSlug { ref slug, .. }
            | FieldMappingError::UnknownAttribute { ref slug, .. } => {
                let field = format!("field_mappings.{slug}");
                Self::Validation(vec![FieldViolation::new(field, err.to_string())])
            }
            FieldMappingError::Connector(e) => e.into(),
            FieldMappingError::Db(e) => Self::Storage(e),
        }
    }
}

/// Result type for read operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A failed sync call: the step that failed and why.
#[derive(Debug, Error)]
#[error("sync failed at {stage}: {error}")]
pub struct SyncFailure {
    pub stage: SyncStage,
    #[source]
    pub error: SyncError,
}

impl SyncFailure {
    #[must_use]
    pub fn new(stage: SyncStage, error: SyncError) -> Self {
        Self { stage, error }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        self.error.error_code()
    }
}
