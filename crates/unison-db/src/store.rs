//! Storage contract.
//!
//! Every operation takes the tenant id and filters by it; there is no
//! unscoped read or write.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use unison_core::{AttributeId, ObjectId, ObjectKind, Provider, TenantId};

use crate::error::DbResult;
use crate::models::{
    Attribute, AttributeValue, CanonicalObject, Entity, LinkedUser, NewAttribute, NewSyncEvent,
    ReconcileObject, Reconciled, RemoteSnapshot, SyncEvent,
};

/// Linked users (tenants).
#[async_trait]
pub trait LinkedUserStore: Send + Sync {
    async fn insert_linked_user(&self, user: LinkedUser) -> DbResult<LinkedUser>;

    async fn find_linked_user(&self, id: TenantId) -> DbResult<Option<LinkedUser>>;
}

/// Canonical objects and their remote snapshots.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Atomic find-or-create-then-merge keyed by
    /// `(tenant, object_kind.base(), provider, remote_id)`.
    ///
    /// A merge also moves the object to the request's routed kind, so an
    /// engagement whose remote type changed stays one object.
    ///
    /// Concurrent calls for the same key never create two objects; the
    /// later call merges into the object the earlier one created.
    async fn reconcile(&self, request: ReconcileObject) -> DbResult<Reconciled>;

    async fn find_object(&self, tenant_id: TenantId, id: ObjectId) -> DbResult<Option<CanonicalObject>>;

    /// Object with the given remote identity stored under any of `kinds`.
    async fn find_by_remote(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
        remote_id: &str,
    ) -> DbResult<Option<CanonicalObject>>;

    /// Whether `id` exists under any of `kinds`.
    async fn object_exists(&self, tenant_id: TenantId, kinds: &[ObjectKind], id: ObjectId) -> DbResult<bool>;

    /// Objects synced from `provider` under any of `kinds`, oldest first.
    async fn list_objects(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
    ) -> DbResult<Vec<CanonicalObject>>;

    /// Overwrite the snapshot of `owner_id`.
    async fn put_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId, data: Value) -> DbResult<RemoteSnapshot>;

    async fn find_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId) -> DbResult<Option<RemoteSnapshot>>;

    async fn find_snapshots(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> DbResult<HashMap<ObjectId, RemoteSnapshot>>;
}

/// Custom field definitions and values.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Insert an attribute; [`crate::DbError::Conflict`] when the slug is
    /// taken for the tenant and kind.
    async fn insert_attribute(&self, attribute: NewAttribute) -> DbResult<Attribute>;

    async fn find_attribute(
        &self,
        tenant_id: TenantId,
        object_kind: ObjectKind,
        slug: &str,
    ) -> DbResult<Option<Attribute>>;

    /// Set the remote key of an attribute for one provider.
    async fn set_remote_key(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        provider: Provider,
        remote_key: &str,
    ) -> DbResult<Attribute>;

    /// Attributes of the tenant, optionally for one kind, ordered by slug.
    async fn list_attributes(
        &self,
        tenant_id: TenantId,
        object_kind: Option<ObjectKind>,
    ) -> DbResult<Vec<Attribute>>;

    /// Upsert the value of `attribute_id` on `owner_id`, registering the
    /// owner as an entity.
    async fn upsert_value(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        owner_id: ObjectId,
        owner_kind: ObjectKind,
        data: Value,
    ) -> DbResult<AttributeValue>;

    /// Custom field values of one owner by slug, in one lookup.
    async fn values_for_owner(&self, tenant_id: TenantId, owner_id: ObjectId) -> DbResult<BTreeMap<String, Value>>;

    /// [`AttributeStore::values_for_owner`] for several owners at once.
    async fn values_for_owners(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> DbResult<HashMap<ObjectId, BTreeMap<String, Value>>>;

    /// Values of the tenant, optionally for one attribute.
    async fn list_values(
        &self,
        tenant_id: TenantId,
        attribute_id: Option<AttributeId>,
    ) -> DbResult<Vec<AttributeValue>>;

    async fn list_entities(&self, tenant_id: TenantId) -> DbResult<Vec<Entity>>;
}

/// Append-only audit events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append_event(&self, event: NewSyncEvent) -> DbResult<SyncEvent>;

    /// Events of the tenant, oldest first.
    async fn list_events(&self, tenant_id: TenantId) -> DbResult<Vec<SyncEvent>>;
}

/// Everything the engine persists.
pub trait Store: LinkedUserStore + ObjectStore + AttributeStore + EventStore {}

impl<T> Store for T where T: LinkedUserStore + ObjectStore + AttributeStore + EventStore {}
