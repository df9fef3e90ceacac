//! Connector error types
//!
//! Configuration gaps (unknown provider, unmapped kind), mapper contract
//! violations and upstream failures, with transient/permanent classification.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use unison_core::{ObjectKind, ParseProviderError, Provider};

/// Longest response body kept on a remote failure.
pub const MAX_ERROR_BODY: usize = 1024;

/// Cut `body` to [`MAX_ERROR_BODY`] bytes on a char boundary.
pub(crate) fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// How a remote provider call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The provider answered with a non-success status.
    Status {
        /// HTTP status code returned by the provider.
        code: u16,
        /// Truncated response body, if any.
        body: Option<String>,
    },
    /// The call did not complete before its deadline.
    Timeout {
        /// Deadline that elapsed, in milliseconds.
        after_ms: u64,
    },
    /// The request could not be sent or the response not read.
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::Status { code, body: None } => write!(f, "status {code}"),
            RemoteFailure::Status {
                code,
                body: Some(body),
            } => write!(f, "status {code}: {body}"),
            RemoteFailure::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            RemoteFailure::Transport { message } => write!(f, "transport error: {message}"),
        }
    }
}

/// Error that can occur while resolving or calling a provider.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No adapter or mapper exists for the provider.
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// The provider is known but has no mapping for the object kind.
    #[error("provider {provider} has no mapping for object kind {kind}")]
    UnsupportedMapping { provider: Provider, kind: ObjectKind },

    /// A mapper produced or received a structure it cannot handle.
    #[error("mapping failed for {provider}/{kind}: {message}")]
    Mapping {
        provider: Provider,
        kind: ObjectKind,
        message: String,
    },

    /// The provider call itself failed.
    #[error("remote provider {provider} failed: {failure}")]
    RemoteProvider {
        provider: Provider,
        failure: RemoteFailure,
    },
}

impl ConnectorError {
    /// Create an unsupported provider error.
    pub fn unsupported_provider(provider: impl fmt::Display) -> Self {
        Self::UnsupportedProvider {
            provider: provider.to_string(),
        }
    }

    /// Create an unsupported mapping error.
    #[must_use]
    pub fn unsupported_mapping(provider: Provider, kind: ObjectKind) -> Self {
        Self::UnsupportedMapping { provider, kind }
    }

    /// Create a mapping error.
    pub fn mapping(provider: Provider, kind: ObjectKind, message: impl Into<String>) -> Self {
        Self::Mapping {
            provider,
            kind,
            message: message.into(),
        }
    }

    /// Create a remote error from a non-success status.
    pub fn remote_status(provider: Provider, code: u16, body: Option<String>) -> Self {
        Self::RemoteProvider {
            provider,
            failure: RemoteFailure::Status { code, body },
        }
    }

    /// Create a remote error from a non-success status and its parsed body.
    ///
    /// Empty bodies (`null`, `{}`) are dropped; anything else is kept as
    /// truncated JSON text.
    pub fn remote_rejection(provider: Provider, code: u16, body: &Value) -> Self {
        let empty = match body {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        let body = (!empty).then(|| truncate_body(body.to_string()));
        Self::remote_status(provider, code, body)
    }

    /// Create a remote timeout error.
    #[must_use]
    pub fn remote_timeout(provider: Provider, after_ms: u64) -> Self {
        Self::RemoteProvider {
            provider,
            failure: RemoteFailure::Timeout { after_ms },
        }
    }

    /// Create a remote transport error.
    pub fn remote_transport(provider: Provider, message: impl Into<String>) -> Self {
        Self::RemoteProvider {
            provider,
            failure: RemoteFailure::Transport {
                message: message.into(),
            },
        }
    }

    /// Upstream status code, when the provider returned one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ConnectorError::RemoteProvider {
                failure: RemoteFailure::Status { code, .. },
                ..
            } => Some(*code),
            _ => None,
        }
    }

    /// Check if this error is transient and might succeed on retry.
    ///
    /// The sync engine never retries on its own; adapters and transports
    /// may consult this.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::RemoteProvider { failure, .. } => match failure {
                RemoteFailure::Status { code, .. } => *code == 429 || *code >= 500,
                RemoteFailure::Timeout { .. } | RemoteFailure::Transport { .. } => true,
            },
            _ => false,
        }
    }

    /// Whether the caller can fix the request (4xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::UnsupportedProvider { .. } | ConnectorError::UnsupportedMapping { .. }
        )
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
            ConnectorError::UnsupportedMapping { .. } => "UNSUPPORTED_MAPPING",
            ConnectorError::Mapping { .. } => "MAPPING_FAILED",
            ConnectorError::RemoteProvider { .. } => "REMOTE_PROVIDER_ERROR",
        }
    }
}

impl From<ParseProviderError> for ConnectorError {
    fn from(err: ParseProviderError) -> Self {
        Self::unsupported_provider(err.value())
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
