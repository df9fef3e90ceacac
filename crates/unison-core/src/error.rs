//! Error Types
//!
//! Errors shared by every unison crate.
//!
//! # Example
//!
//! ```
//! use unison_core::{FieldViolation, Result, UnisonError};
//!
//! fn check_subject(subject: &str) -> Result<()> {
//!     if subject.is_empty() {
//!         return Err(UnisonError::validation(vec![FieldViolation::new(
//!             "subject",
//!             "must not be empty",
//!         )]));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_subject("").is_err());
//! ```

use crate::ids::TenantId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single offending field in a rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Name of the field, using the canonical field name.
    pub field: String,
    /// Description of the problem.
    pub message: String,
}

impl FieldViolation {
    /// Create a violation for a field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.field, self.message)
    }
}

impl std::error::Error for FieldViolation {}

/// Render a list of violations as `'a': x; 'b': y`.
#[must_use]
pub fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Standardized error type for unison.
///
/// - `NotFound` - Resource not found (HTTP 404)
/// - `TenantMismatch` - Tenant isolation violation (HTTP 403)
/// - `Validation` - Input validation failure (HTTP 400)
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnisonError {
    /// Requested resource was not found within the tenant.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of resource that was not found (e.g., "Engagement")
        resource: String,
        /// Optional identifier of the resource
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A record belonging to another tenant was about to be returned.
    #[error("Tenant mismatch: expected {expected}, got {actual}")]
    TenantMismatch {
        /// The tenant the caller is scoped to
        expected: TenantId,
        /// The tenant that owns the record
        actual: TenantId,
    },

    /// Input validation failure, listing every offending field.
    #[error("Validation failed: {}", describe_violations(violations))]
    Validation {
        /// All violations found in the input
        violations: Vec<FieldViolation>,
    },
}

impl UnisonError {
    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.to_string()),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            UnisonError::NotFound { .. } => "NOT_FOUND",
            UnisonError::TenantMismatch { .. } => "TENANT_MISMATCH",
            UnisonError::Validation { .. } => "VALIDATION_FAILED",
        }
    }
}

/// Type alias for Results using `UnisonError`.
pub type Result<T> = std::result::Result<T, UnisonError>;
