//! Unification error types

use thiserror::Error;
use unison_connector::ConnectorError;
use unison_core::{describe_violations, FieldViolation, ObjectKind, Provider};

/// Error raised while converting between canonical and provider shapes.
#[derive(Debug, Error)]
pub enum UnificationError {
    /// The canonical input is malformed (e.g. a missing discriminator).
    #[error("Validation failed: {}", describe_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// No mapper exists for the provider.
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// The provider has no mapper for the object kind.
    #[error("provider {provider} has no mapping for object kind {kind}")]
    UnsupportedMapping { provider: Provider, kind: ObjectKind },

    /// A mapper produced or received a structure the engine cannot use.
    #[error("mapping failed for {provider}/{kind}{}: {message}", index.map(|i| format!(" at element {i}")).unwrap_or_default())]
    Mapping {
        provider: Provider,
        kind: ObjectKind,
        /// Position of the failing element when mapping a sequence.
        index: Option<usize>,
        message: String,
    },
}

impl UnificationError {
    /// Validation error for a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    /// Mapping error, optionally for one element of a sequence.
    pub fn mapping(
        provider: Provider,
        kind: ObjectKind,
        index: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::Mapping {
            provider,
            kind,
            index,
            message: message.into(),
        }
    }

    /// Attach the element index to a connector error raised by a mapper.
    pub(crate) fn from_connector(err: ConnectorError, index: Option<usize>) -> Self {
        match err {
            ConnectorError::UnsupportedProvider { provider } => Self::UnsupportedProvider { provider },
            ConnectorError::UnsupportedMapping { provider, kind } => {
                Self::UnsupportedMapping { provider, kind }
            }
            ConnectorError::Mapping {
                provider,
                kind,
                message,
            } => Self::mapping(provider, kind, index, message),
            ConnectorError::RemoteProvider { provider, failure } => Self::mapping(
                provider,
                ObjectKind::Engagement,
                index,
                format!("unexpected remote failure during mapping: {failure}"),
            ),
        }
    }

    /// Whether the caller can fix the request (4xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UnificationError::Mapping { .. })
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            UnificationError::Validation(_) => "VALIDATION_FAILED",
            UnificationError::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
            UnificationError::UnsupportedMapping { .. } => "UNSUPPORTED_MAPPING",
            UnificationError::Mapping { .. } => "MAPPING_FAILED",
        }
    }
}

impl From<ConnectorError> for UnificationError {
    fn from(err: ConnectorError) -> Self {
        Self::from_connector(err, None)
    }
}

impl From<FieldViolation> for UnificationError {
    fn from(violation: FieldViolation) -> Self {
        Self::Validation(vec![violation])
    }
}

/// Result type for unification operations.
pub type UnificationResult<T> = Result<T, UnificationError>;
