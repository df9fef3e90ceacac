//! Request and response models for the attribute registry.

use serde::{Deserialize, Serialize};
use unison_connector::RemoteProperty;
use unison_core::{ObjectKind, Provider};
use unison_db::DataType;
use validator::Validate;

/// Request to define a new canonical custom field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DefineTargetField {
    /// Kind the field is defined on; sub-kinds share the field of their base.
    pub object_kind: ObjectKind,

    /// Canonical field name (lowercase snake case, 1-64 characters).
    #[validate(
        length(min = 1, max = 64, message = "Slug must be between 1 and 64 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,

    pub data_type: DataType,
}

impl DefineTargetField {
    pub fn new(object_kind: ObjectKind, slug: impl Into<String>, data_type: DataType) -> Self {
        Self {
            object_kind,
            slug: slug.into(),
            data_type,
        }
    }
}

/// Request to map a custom field onto a provider property.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MapFieldToProvider {
    pub object_kind: ObjectKind,

    #[validate(length(min = 1, max = 64, message = "Slug must be between 1 and 64 characters"))]
    pub slug: String,

    pub provider: Provider,

    /// Provider-side property name.
    #[validate(length(min = 1, max = 255, message = "Remote key must be between 1 and 255 characters"))]
    pub remote_key: String,
}

impl MapFieldToProvider {
    pub fn new(
        object_kind: ObjectKind,
        slug: impl Into<String>,
        provider: Provider,
        remote_key: impl Into<String>,
    ) -> Self {
        Self {
            object_kind,
            slug: slug.into(),
            provider,
            remote_key: remote_key.into(),
        }
    }
}

/// A provider property together with the custom field mapped onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProperty {
    #[serde(flatten)]
    pub property: RemoteProperty,
    /// Slug of the custom field mapped to this property, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_slug: Option<String>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let starts_with_letter = slug.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    let snake = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if starts_with_letter && snake {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("invalid_slug");
        err.message = Some("Slug must be lowercase snake case starting with a letter".into());
        Err(err)
    }
}
