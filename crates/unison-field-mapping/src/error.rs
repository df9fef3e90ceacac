//! Field mapping error types

use thiserror::Error;
use unison_connector::ConnectorError;
use unison_core::{describe_violations, FieldViolation, ObjectKind};
use unison_db::DbError;

/// Error raised by the attribute registry.
#[derive(Debug, Error)]
pub enum FieldMappingError {
    /// The request failed validation.
    #[error("Validation failed: {}", describe_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// The slug is already defined for the tenant and kind.
    #[error("custom field '{slug}' already exists for {kind}")]
    DuplicateSlug { slug: String, kind: ObjectKind },

    /// No custom field with that slug exists for the tenant and kind.
    #[error("unknown custom field '{slug}' for {kind}")]
    UnknownAttribute { slug: String, kind: ObjectKind },

    /// The provider could not be reached or resolved.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl FieldMappingError {
    pub fn duplicate_slug(slug: impl Into<String>, kind: ObjectKind) -> Self {
        Self::DuplicateSlug {
            slug: slug.into(),
            kind,
        }
    }

    pub fn unknown_attribute(slug: impl Into<String>, kind: ObjectKind) -> Self {
        Self::UnknownAttribute {
            slug: slug.into(),
            kind,
        }
    }

    /// Whether the caller can fix the request (4xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            FieldMappingError::Validation(_)
            | FieldMappingError::DuplicateSlug { .. }
            | FieldMappingError::UnknownAttribute { .. } => true,
            FieldMappingError::Connector(e) => e.is_client_error(),
            FieldMappingError::Db(_) => false,
        }
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            FieldMappingError::Validation(_) => "VALIDATION_FAILED",
            FieldMappingError::DuplicateSlug { .. } => "DUPLICATE_SLUG",
            FieldMappingError::UnknownAttribute { .. } => "UNKNOWN_ATTRIBUTE",
            FieldMappingError::Connector(e) => e.error_code(),
            FieldMappingError::Db(e) => e.error_code(),
        }
    }
}

impl From<validator::ValidationErrors> for FieldMappingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    FieldViolation::new(field.to_string(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(violations)
    }
}

/// Result type for field mapping operations.
pub type FieldMappingResult<T> = Result<T, FieldMappingError>;
