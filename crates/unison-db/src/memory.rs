//! In-memory store.
//!
//! Implements the full storage contract behind one `RwLock`. Reconcile
//! takes the write lock for its whole find-or-create-then-merge, which is
//! what makes it atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use unison_core::{AttributeId, EventId, ObjectId, ObjectKind, Provider, TenantId, ValueId};

use crate::error::{DbError, DbResult};
use crate::models::{
    Attribute, AttributeValue, CanonicalObject, Entity, LinkedUser, NewAttribute, NewSyncEvent,
    ReconcileObject, Reconciled, RemoteSnapshot, SyncEvent, SNAPSHOT_FORMAT,
};
use crate::store::{AttributeStore, EventStore, LinkedUserStore, ObjectStore};

type RemoteKey = (TenantId, ObjectKind, Provider, String);

#[derive(Default)]
struct Inner {
    linked_users: HashMap<TenantId, LinkedUser>,
    objects: HashMap<ObjectId, CanonicalObject>,
    by_remote: HashMap<RemoteKey, ObjectId>,
    snapshots: HashMap<ObjectId, RemoteSnapshot>,
    attributes: HashMap<AttributeId, Attribute>,
    values: HashMap<(AttributeId, ObjectId), AttributeValue>,
    entities: HashMap<ObjectId, Entity>,
    events: Vec<SyncEvent>,
}

/// Storage contract over process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of canonical objects across all tenants.
    pub async fn object_count(&self) -> usize {
        self.inner.read().await.objects.len()
    }
}

#[async_trait]
impl LinkedUserStore for MemoryStore {
    async fn insert_linked_user(&self, user: LinkedUser) -> DbResult<LinkedUser> {
        let mut inner = self.inner.write().await;
        if inner.linked_users.contains_key(&user.id) {
            return Err(DbError::Conflict(format!("linked user {} already exists", user.id)));
        }
        inner.linked_users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_linked_user(&self, id: TenantId) -> DbResult<Option<LinkedUser>> {
        Ok(self.inner.read().await.linked_users.get(&id).cloned())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn reconcile(&self, request: ReconcileObject) -> DbResult<Reconciled> {
        let key = (
            request.tenant_id,
            request.object_kind.base(),
            request.provider,
            request.remote_id.clone(),
        );
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if let Some(id) = inner.by_remote.get(&key).copied() {
            let object = inner
                .objects
                .get_mut(&id)
                .ok_or_else(|| DbError::InvalidData(format!("remote index points at missing object {id}")))?;
            object.object_kind = request.object_kind;
            object.merge_fields(&request.fields);
            object.modified_at = now;
            debug!(object_id = %id, remote_id = %request.remote_id, "Merged into existing object");
            return Ok(Reconciled {
                object: object.clone(),
                created: false,
            });
        }

        let object = CanonicalObject {
            id: ObjectId::new(),
            tenant_id: request.tenant_id,
            object_kind: request.object_kind,
            provider: request.provider,
            remote_id: request.remote_id,
            fields: request.fields,
            created_at: now,
            modified_at: now,
        };
        inner.by_remote.insert(key, object.id);
        inner.objects.insert(object.id, object.clone());
        debug!(object_id = %object.id, remote_id = %object.remote_id, "Created object");
        Ok(Reconciled {
            object,
            created: true,
        })
    }

    async fn find_object(&self, tenant_id: TenantId, id: ObjectId) -> DbResult<Option<CanonicalObject>> {
        let inner = self.inner.read().await;
        Ok(inner
            .objects
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_by_remote(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
        remote_id: &str,
    ) -> DbResult<Option<CanonicalObject>> {
        let inner = self.inner.read().await;
        Ok(kinds.iter().find_map(|kind| {
            inner
                .by_remote
                .get(&(tenant_id, kind.base(), provider, remote_id.to_string()))
                .and_then(|id| inner.objects.get(id))
                .filter(|o| kinds.contains(&o.object_kind))
                .cloned()
        }))
    }

    async fn object_exists(&self, tenant_id: TenantId, kinds: &[ObjectKind], id: ObjectId) -> DbResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .objects
            .get(&id)
            .is_some_and(|o| o.tenant_id == tenant_id && kinds.contains(&o.object_kind)))
    }

    async fn list_objects(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
    ) -> DbResult<Vec<CanonicalObject>> {
        let inner = self.inner.read().await;
        let mut objects: Vec<CanonicalObject> = inner
            .objects
            .values()
            .filter(|o| {
                o.tenant_id == tenant_id && o.provider == provider && kinds.contains(&o.object_kind)
            })
            .cloned()
            .collect();
        objects.sort_by_key(|o| (o.created_at, o.id));
        Ok(objects)
    }

    async fn put_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId, data: Value) -> DbResult<RemoteSnapshot> {
        let mut inner = self.inner.write().await;
        match inner.objects.get(&owner_id) {
            Some(o) if o.tenant_id == tenant_id => {}
            _ => return Err(DbError::NotFound(format!("object {owner_id}"))),
        }
        let snapshot = RemoteSnapshot {
            owner_id,
            tenant_id,
            format: SNAPSHOT_FORMAT.to_string(),
            data,
            updated_at: Utc::now(),
        };
        inner.snapshots.insert(owner_id, snapshot.clone());
        Ok(snapshot)
    }

    async fn find_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId) -> DbResult<Option<RemoteSnapshot>> {
        let inner = self.inner.read().await;
        Ok(inner
            .snapshots
            .get(&owner_id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_snapshots(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> DbResult<HashMap<ObjectId, RemoteSnapshot>> {
        let inner = self.inner.read().await;
        Ok(owner_ids
            .iter()
            .filter_map(|id| inner.snapshots.get(id))
            .filter(|s| s.tenant_id == tenant_id)
            .map(|s| (s.owner_id, s.clone()))
            .collect())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn insert_attribute(&self, new: NewAttribute) -> DbResult<Attribute> {
        let mut inner = self.inner.write().await;
        let taken = inner.attributes.values().any(|a| {
            a.tenant_id == new.tenant_id && a.object_kind == new.object_kind && a.slug == new.slug
        });
        if taken {
            return Err(DbError::Conflict(format!(
                "attribute '{}' already exists for {}",
                new.slug, new.object_kind
            )));
        }
        let now = Utc::now();
        let attribute = Attribute {
            id: AttributeId::new(),
            tenant_id: new.tenant_id,
            object_kind: new.object_kind,
            slug: new.slug,
            data_type: new.data_type,
            remote_keys: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        inner.attributes.insert(attribute.id, attribute.clone());
        Ok(attribute)
    }

    async fn find_attribute(
        &self,
        tenant_id: TenantId,
        object_kind: ObjectKind,
        slug: &str,
    ) -> DbResult<Option<Attribute>> {
        let inner = self.inner.read().await;
        Ok(inner
            .attributes
            .values()
            .find(|a| a.tenant_id == tenant_id && a.object_kind == object_kind && a.slug == slug)
            .cloned())
    }

    async fn set_remote_key(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        provider: Provider,
        remote_key: &str,
    ) -> DbResult<Attribute> {
        let mut inner = self.inner.write().await;
        let attribute = inner
            .attributes
            .get_mut(&attribute_id)
            .filter(|a| a.tenant_id == tenant_id)
            .ok_or_else(|| DbError::NotFound(format!("attribute {attribute_id}")))?;
        attribute.remote_keys.insert(provider, remote_key.to_string());
        attribute.updated_at = Utc::now();
        Ok(attribute.clone())
    }

    async fn list_attributes(
        &self,
        tenant_id: TenantId,
        object_kind: Option<ObjectKind>,
    ) -> DbResult<Vec<Attribute>> {
        let inner = self.inner.read().await;
        let mut attributes: Vec<Attribute> = inner
            .attributes
            .values()
            .filter(|a| a.tenant_id == tenant_id && object_kind.map_or(true, |k| a.object_kind == k))
            .cloned()
            .collect();
        attributes.sort_by(|a, b| (a.object_kind, &a.slug).cmp(&(b.object_kind, &b.slug)));
        Ok(attributes)
    }

    async fn upsert_value(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        owner_id: ObjectId,
        owner_kind: ObjectKind,
        data: Value,
    ) -> DbResult<AttributeValue> {
        let mut inner = self.inner.write().await;
        if !inner
            .attributes
            .get(&attribute_id)
            .is_some_and(|a| a.tenant_id == tenant_id)
        {
            return Err(DbError::NotFound(format!("attribute {attribute_id}")));
        }

        let now = Utc::now();
        inner.entities.entry(owner_id).or_insert_with(|| Entity {
            owner_id,
            tenant_id,
            object_kind: owner_kind,
            created_at: now,
        });

        let value = inner
            .values
            .entry((attribute_id, owner_id))
            .and_modify(|v| {
                v.data = data.clone();
                v.updated_at = now;
            })
            .or_insert_with(|| AttributeValue {
                id: ValueId::new(),
                tenant_id,
                attribute_id,
                owner_id,
                data,
                created_at: now,
                updated_at: now,
            });
        Ok(value.clone())
    }

    async fn values_for_owner(&self, tenant_id: TenantId, owner_id: ObjectId) -> DbResult<BTreeMap<String, Value>> {
        let mut all = self.values_for_owners(tenant_id, &[owner_id]).await?;
        Ok(all.remove(&owner_id).unwrap_or_default())
    }

    async fn values_for_owners(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> DbResult<HashMap<ObjectId, BTreeMap<String, Value>>> {
        let inner = self.inner.read().await;
        let mut resolved: HashMap<ObjectId, BTreeMap<String, Value>> = HashMap::new();
        for value in inner.values.values() {
            if value.tenant_id != tenant_id || !owner_ids.contains(&value.owner_id) {
                continue;
            }
            if let Some(attribute) = inner.attributes.get(&value.attribute_id) {
                resolved
                    .entry(value.owner_id)
                    .or_default()
                    .insert(attribute.slug.clone(), value.data.clone());
            }
        }
        Ok(resolved)
    }

    async fn list_values(
        &self,
        tenant_id: TenantId,
        attribute_id: Option<AttributeId>,
    ) -> DbResult<Vec<AttributeValue>> {
        let inner = self.inner.read().await;
        let mut values: Vec<AttributeValue> = inner
            .values
            .values()
            .filter(|v| v.tenant_id == tenant_id && attribute_id.map_or(true, |id| v.attribute_id == id))
            .cloned()
            .collect();
        values.sort_by_key(|v| (v.created_at, v.id));
        Ok(values)
    }

    async fn list_entities(&self, tenant_id: TenantId) -> DbResult<Vec<Entity>> {
        let inner = self.inner.read().await;
        let mut entities: Vec<Entity> = inner
            .entities
            .values()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect();
        entities.sort_by_key(|e| (e.created_at, e.owner_id));
        Ok(entities)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append_event(&self, new: NewSyncEvent) -> DbResult<SyncEvent> {
        let event = SyncEvent {
            id: EventId::new(),
            tenant_id: new.tenant_id,
            status: new.status,
            event_type: new.event_type,
            method: new.method,
            url: new.url,
            provider: new.provider,
            direction: new.direction,
            object_kind: new.object_kind,
            timestamp: Utc::now(),
        };
        self.inner.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, tenant_id: TenantId) -> DbResult<Vec<SyncEvent>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}
