//! Error types for the webhook system.

use unison_db::DbError;

/// Webhook system error variants.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The endpoint answered with a non-success status.
    #[error("Endpoint returned HTTP {status}")]
    Rejected { status: u16 },

    /// The request could not be sent or timed out.
    #[error("Delivery failed: {0}")]
    Transport(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Whether another delivery attempt might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            WebhookError::Rejected { status } => *status == 408 || *status == 429 || *status >= 500,
            WebhookError::Transport(_) => true,
            _ => false,
        }
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::Database(e) => e.error_code(),
            WebhookError::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            WebhookError::Rejected { .. } => "WEBHOOK_REJECTED",
            WebhookError::Transport(_) => "WEBHOOK_TRANSPORT",
            WebhookError::Serialization(_) => "SERIALIZATION_FAILED",
            WebhookError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type WebhookResult<T> = Result<T, WebhookError>;
