//! Values exchanged between the engine and provider adapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_core::{ProjectId, TenantId};

/// Flat JSON object holding canonical field values by field name.
pub type FieldMap = serde_json::Map<String, Value>;

/// Identity of the caller on whose behalf an adapter talks to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Linked user the call is made for.
    pub tenant_id: TenantId,
    /// Project the linked user belongs to.
    pub project_id: ProjectId,
}

impl TenantContext {
    #[must_use]
    pub fn new(tenant_id: TenantId, project_id: ProjectId) -> Self {
        Self {
            tenant_id,
            project_id,
        }
    }
}

/// Raw outcome of a provider create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResult {
    /// Provider response body, unmodified.
    pub data: Value,
    /// HTTP-style status code reported by the provider.
    pub status_code: u16,
}

impl RemoteResult {
    #[must_use]
    pub fn new(data: Value, status_code: u16) -> Self {
        Self { data, status_code }
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// A property the provider exposes on an object, as listed by its API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProperty {
    /// Property key in provider payloads.
    pub name: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Provider-reported data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Tenant-defined mapping of a custom canonical field onto a provider
/// property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomFieldMapping {
    /// Canonical field name (attribute slug).
    pub slug: String,
    /// Provider-side property name.
    pub remote_key: String,
}

impl CustomFieldMapping {
    pub fn new(slug: impl Into<String>, remote_key: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            remote_key: remote_key.into(),
        }
    }
}
