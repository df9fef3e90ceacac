//! Canonical object and remote snapshot models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_core::{ObjectId, ObjectKind, Provider, TenantAware, TenantId};

/// Well-known canonical fields of an object, by canonical field name.
pub type Fields = serde_json::Map<String, Value>;

/// Format tag stored with every snapshot.
pub const SNAPSHOT_FORMAT: &str = "json";

/// A tenant-scoped canonical record with its remote identity.
///
/// At most one exists per `(tenant_id, object_kind.base(), provider, remote_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalObject {
    pub id: ObjectId,
    pub tenant_id: TenantId,
    /// Routed kind of the latest sync; follows the remote record's type.
    pub object_kind: ObjectKind,
    pub provider: Provider,
    pub remote_id: String,
    /// Well-known fields; never contains nulls.
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CanonicalObject {
    /// Sparse merge: non-null values in `incoming` overwrite, everything
    /// else is kept.
    pub fn merge_fields(&mut self, incoming: &Fields) {
        for (key, value) in incoming {
            if !value.is_null() {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

impl TenantAware for CanonicalObject {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Find-or-create-then-merge request keyed by remote identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileObject {
    pub tenant_id: TenantId,
    pub object_kind: ObjectKind,
    pub provider: Provider,
    pub remote_id: String,
    pub fields: Fields,
}

impl ReconcileObject {
    /// Build a request; null fields are dropped so they never overwrite.
    pub fn new(
        tenant_id: TenantId,
        object_kind: ObjectKind,
        provider: Provider,
        remote_id: impl Into<String>,
        fields: Fields,
    ) -> Self {
        Self {
            tenant_id,
            object_kind,
            provider,
            remote_id: remote_id.into(),
            fields: fields.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        }
    }
}

/// Outcome of a reconcile.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub object: CanonicalObject,
    /// Whether the object was created by this call.
    pub created: bool,
}

/// The last raw provider payload for a canonical object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub owner_id: ObjectId,
    pub tenant_id: TenantId,
    pub format: String,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

impl TenantAware for RemoteSnapshot {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_merge_is_sparse() {
        let mut object = CanonicalObject {
            id: ObjectId::new(),
            tenant_id: TenantId::new(),
            object_kind: ObjectKind::EngagementCall,
            provider: Provider::Hubspot,
            remote_id: "1".into(),
            fields: fields(json!({"subject": "A"})),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        object.merge_fields(&fields(json!({"content": "B", "subject": null})));
        assert_eq!(Value::Object(object.fields), json!({"subject": "A", "content": "B"}));
    }

    #[test]
    fn test_reconcile_request_drops_nulls() {
        let req = ReconcileObject::new(
            TenantId::new(),
            ObjectKind::Contact,
            Provider::Zendesk,
            "9",
            fields(json!({"first_name": "Ada", "last_name": null})),
        );
        assert_eq!(Value::Object(req.fields), json!({"first_name": "Ada"}));
    }
}
