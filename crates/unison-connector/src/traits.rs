//! Provider capability traits.
//!
//! A provider integration is two pieces: an [`ObjectMapper`] per object kind
//! (pure shape conversion, no I/O) and a [`ResourceAdapter`] that performs
//! the calls against the provider API.

use async_trait::async_trait;
use serde_json::Value;
use unison_core::{ObjectKind, Provider};

use crate::error::ConnectorResult;
use crate::mapping::id_text;
use crate::types::{FieldMap, RemoteProperty, RemoteResult, TenantContext};

/// Converts between canonical fields and one provider's shape for one
/// object kind.
///
/// Implementations must be pure: the same input always yields the same
/// output and nothing blocks.
pub trait ObjectMapper: Send + Sync {
    /// Provider this mapper targets.
    fn provider(&self) -> Provider;

    /// Base object kind this mapper handles.
    fn kind(&self) -> ObjectKind;

    /// Canonical fields to provider payload.
    ///
    /// `sub_kind` is the routed kind being written (e.g. `engagement_call`),
    /// equal to [`ObjectMapper::kind`] for kinds without sub-kinds.
    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value>;

    /// Provider payload to canonical fields.
    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap>;

    /// Remote id of a provider payload.
    fn remote_id(&self, remote: &Value) -> Option<String> {
        self.record(remote).get("id").and_then(id_text)
    }

    /// Object inside the payload holding provider custom properties, if the
    /// provider nests them.
    fn custom_field_container(&self) -> Option<&'static str> {
        None
    }

    /// The object carrying the record itself, for providers that wrap
    /// responses in an envelope.
    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        remote
    }

    /// Mutable counterpart of [`ObjectMapper::record`].
    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        remote
    }
}

/// Performs provider API calls for one provider.
///
/// Adapters own transport concerns, including any retry policy; the sync
/// engine calls them exactly once per sync.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Provider this adapter talks to.
    fn provider(&self) -> Provider;

    /// Object kinds (routed sub-kinds included) this adapter can create.
    fn produces(&self) -> &[ObjectKind];

    /// Whether the adapter can create objects of `kind`.
    fn supports(&self, kind: ObjectKind) -> bool {
        self.produces().contains(&kind)
    }

    /// Create an object in the provider and return its raw response.
    async fn create(
        &self,
        kind: ObjectKind,
        payload: Value,
        ctx: &TenantContext,
    ) -> ConnectorResult<RemoteResult>;

    /// List the properties the provider exposes on `kind`.
    async fn custom_properties(
        &self,
        _kind: ObjectKind,
        _ctx: &TenantContext,
    ) -> ConnectorResult<Vec<RemoteProperty>> {
        Ok(Vec::new())
    }
}
