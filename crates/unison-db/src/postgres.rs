//! PostgreSQL store.
//!
//! Rows are read into private row structs and converted into the public
//! models; a row that does not decode (unknown provider, kind or data
//! type) surfaces as [`DbError::InvalidData`].

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use unison_core::{AttributeId, EventId, ObjectId, ObjectKind, Provider, TenantId, ValueId};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{
    Attribute, AttributeValue, CanonicalObject, DataType, Entity, EventStatus, Fields, LinkedUser,
    NewAttribute, NewSyncEvent, ReconcileObject, Reconciled, RemoteSnapshot, SyncDirection,
    SyncEvent,
};
use crate::store::{AttributeStore, EventStore, LinkedUserStore, ObjectStore};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

fn decode<T>(column: &str, raw: &str) -> DbResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| DbError::InvalidData(format!("column {column}: {e}")))
}

fn kind_strings(kinds: &[ObjectKind]) -> Vec<String> {
    kinds.iter().map(|k| k.as_str().to_string()).collect()
}

fn owner_uuids(ids: &[ObjectId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

#[derive(FromRow)]
struct LinkedUserRow {
    id: Uuid,
    project_id: Uuid,
    origin_user_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LinkedUserRow> for LinkedUser {
    fn from(row: LinkedUserRow) -> Self {
        Self {
            id: TenantId::from_uuid(row.id),
            project_id: row.project_id.into(),
            origin_user_id: row.origin_user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ObjectRow {
    id: Uuid,
    tenant_id: Uuid,
    object_kind: String,
    provider: String,
    remote_id: String,
    fields: Json<Fields>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<ObjectRow> for CanonicalObject {
    type Error = DbError;

    fn try_from(row: ObjectRow) -> DbResult<Self> {
        Ok(Self {
            id: ObjectId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            object_kind: decode("object_kind", &row.object_kind)?,
            provider: decode("provider", &row.provider)?,
            remote_id: row.remote_id,
            fields: row.fields.0,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[derive(FromRow)]
struct SnapshotRow {
    owner_id: Uuid,
    tenant_id: Uuid,
    format: String,
    data: Json<Value>,
    updated_at: DateTime<Utc>,
}

impl From<SnapshotRow> for RemoteSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            owner_id: ObjectId::from_uuid(row.owner_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            format: row.format,
            data: row.data.0,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AttributeRow {
    id: Uuid,
    tenant_id: Uuid,
    object_kind: String,
    slug: String,
    data_type: String,
    remote_keys: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttributeRow> for Attribute {
    type Error = DbError;

    fn try_from(row: AttributeRow) -> DbResult<Self> {
        let remote_keys = row
            .remote_keys
            .0
            .into_iter()
            .map(|(provider, key)| Ok((decode::<Provider>("remote_keys", &provider)?, key)))
            .collect::<DbResult<_>>()?;
        Ok(Self {
            id: AttributeId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            object_kind: decode("object_kind", &row.object_kind)?,
            slug: row.slug,
            data_type: decode::<DataType>("data_type", &row.data_type)?,
            remote_keys,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ValueRow {
    id: Uuid,
    tenant_id: Uuid,
    attribute_id: Uuid,
    owner_id: Uuid,
    data: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ValueRow> for AttributeValue {
    fn from(row: ValueRow) -> Self {
        Self {
            id: ValueId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            attribute_id: AttributeId::from_uuid(row.attribute_id),
            owner_id: ObjectId::from_uuid(row.owner_id),
            data: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct EntityRow {
    owner_id: Uuid,
    tenant_id: Uuid,
    object_kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntityRow> for Entity {
    type Error = DbError;

    fn try_from(row: EntityRow) -> DbResult<Self> {
        Ok(Self {
            owner_id: ObjectId::from_uuid(row.owner_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            object_kind: decode("object_kind", &row.object_kind)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    tenant_id: Uuid,
    status: String,
    event_type: String,
    method: String,
    url: String,
    provider: String,
    direction: String,
    object_kind: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<EventRow> for SyncEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> DbResult<Self> {
        Ok(Self {
            id: EventId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            status: decode::<EventStatus>("status", &row.status)?,
            event_type: row.event_type,
            method: row.method,
            url: row.url,
            provider: decode("provider", &row.provider)?,
            direction: decode::<SyncDirection>("direction", &row.direction)?,
            object_kind: decode("object_kind", &row.object_kind)?,
            timestamp: row.timestamp,
        })
    }
}

/// Storage contract over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the database is unreachable.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect a new pool with an explicit connection cap.
    pub async fn connect_with(database_url: &str, max_connections: u32) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(DbError::ConnectionFailed)?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LinkedUserStore for PgStore {
    async fn insert_linked_user(&self, user: LinkedUser) -> DbResult<LinkedUser> {
        let row: LinkedUserRow = sqlx::query_as(
            r"
            INSERT INTO linked_users (id, project_id, origin_user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, origin_user_id, created_at
            ",
        )
        .bind(user.id.into_uuid())
        .bind(user.project_id.into_uuid())
        .bind(&user.origin_user_id)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_query(e, || format!("linked user {} already exists", user.id)))?;
        Ok(row.into())
    }

    async fn find_linked_user(&self, id: TenantId) -> DbResult<Option<LinkedUser>> {
        let row: Option<LinkedUserRow> = sqlx::query_as(
            r"
            SELECT id, project_id, origin_user_id, created_at
            FROM linked_users
            WHERE id = $1
            ",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        Ok(row.map(Into::into))
    }
}

#[derive(FromRow)]
struct ReconciledRow {
    #[sqlx(flatten)]
    object: ObjectRow,
    created: bool,
}

#[async_trait]
impl ObjectStore for PgStore {
    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id, remote_id = %request.remote_id))]
    async fn reconcile(&self, request: ReconcileObject) -> DbResult<Reconciled> {
        // `xmax = 0` holds only for a row inserted by this statement.
        let row: ReconciledRow = sqlx::query_as(
            r"
            INSERT INTO canonical_objects
                (id, tenant_id, base_kind, object_kind, provider, remote_id, fields)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, base_kind, provider, remote_id) DO UPDATE
                SET object_kind = EXCLUDED.object_kind,
                    fields = canonical_objects.fields || EXCLUDED.fields,
                    modified_at = now()
            RETURNING id, tenant_id, object_kind, provider, remote_id, fields,
                      created_at, modified_at, (xmax = 0) AS created
            ",
        )
        .bind(Uuid::new_v4())
        .bind(request.tenant_id.into_uuid())
        .bind(request.object_kind.base().as_str())
        .bind(request.object_kind.as_str())
        .bind(request.provider.as_str())
        .bind(&request.remote_id)
        .bind(Json(&request.fields))
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;

        let created = row.created;
        let object = CanonicalObject::try_from(row.object)?;
        debug!(object_id = %object.id, created, "Reconciled object");
        Ok(Reconciled { object, created })
    }

    async fn find_object(&self, tenant_id: TenantId, id: ObjectId) -> DbResult<Option<CanonicalObject>> {
        let row: Option<ObjectRow> = sqlx::query_as(
            r"
            SELECT id, tenant_id, object_kind, provider, remote_id, fields, created_at, modified_at
            FROM canonical_objects
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.map(CanonicalObject::try_from).transpose()
    }

    async fn find_by_remote(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
        remote_id: &str,
    ) -> DbResult<Option<CanonicalObject>> {
        let row: Option<ObjectRow> = sqlx::query_as(
            r"
            SELECT id, tenant_id, object_kind, provider, remote_id, fields, created_at, modified_at
            FROM canonical_objects
            WHERE tenant_id = $1 AND object_kind = ANY($2) AND provider = $3 AND remote_id = $4
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(kind_strings(kinds))
        .bind(provider.as_str())
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.map(CanonicalObject::try_from).transpose()
    }

    async fn object_exists(&self, tenant_id: TenantId, kinds: &[ObjectKind], id: ObjectId) -> DbResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM canonical_objects
                WHERE tenant_id = $1 AND id = $2 AND object_kind = ANY($3)
            )
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(id.into_uuid())
        .bind(kind_strings(kinds))
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        Ok(row.0)
    }

    async fn list_objects(
        &self,
        tenant_id: TenantId,
        kinds: &[ObjectKind],
        provider: Provider,
    ) -> DbResult<Vec<CanonicalObject>> {
        let rows: Vec<ObjectRow> = sqlx::query_as(
            r"
            SELECT id, tenant_id, object_kind, provider, remote_id, fields, created_at, modified_at
            FROM canonical_objects
            WHERE tenant_id = $1 AND provider = $2 AND object_kind = ANY($3)
            ORDER BY created_at, id
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(provider.as_str())
        .bind(kind_strings(kinds))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        rows.into_iter().map(CanonicalObject::try_from).collect()
    }

    async fn put_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId, data: Value) -> DbResult<RemoteSnapshot> {
        // The owner check and the upsert are one statement so a foreign or
        // missing owner writes nothing.
        let row: Option<SnapshotRow> = sqlx::query_as(
            r"
            INSERT INTO remote_snapshots (owner_id, tenant_id, format, data)
            SELECT o.id, o.tenant_id, 'json', $3
            FROM canonical_objects o
            WHERE o.id = $1 AND o.tenant_id = $2
            ON CONFLICT (owner_id) DO UPDATE
                SET data = EXCLUDED.data,
                    updated_at = now()
            RETURNING owner_id, tenant_id, format, data, updated_at
            ",
        )
        .bind(owner_id.into_uuid())
        .bind(tenant_id.into_uuid())
        .bind(Json(&data))
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.map(Into::into)
            .ok_or_else(|| DbError::NotFound(format!("object {owner_id}")))
    }

    async fn find_snapshot(&self, tenant_id: TenantId, owner_id: ObjectId) -> DbResult<Option<RemoteSnapshot>> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            r"
            SELECT owner_id, tenant_id, format, data, updated_at
            FROM remote_snapshots
            WHERE tenant_id = $1 AND owner_id = $2
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(owner_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        Ok(row.map(Into::into))
    }

    async fn find_snapshots(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> DbResult<HashMap<ObjectId, RemoteSnapshot>> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r"
            SELECT owner_id, tenant_id, format, data, updated_at
            FROM remote_snapshots
            WHERE tenant_id = $1 AND owner_id = ANY($2)
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(owner_uuids(owner_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let snapshot = RemoteSnapshot::from(row);
                (snapshot.owner_id, snapshot)
            })
            .collect())
    }
}

const ATTRIBUTE_COLUMNS: &str =
    "id, tenant_id, object_kind, slug, data_type, remote_keys, created_at, updated_at";

#[async_trait]
impl AttributeStore for PgStore {
    async fn insert_attribute(&self, new: NewAttribute) -> DbResult<Attribute> {
        let row: AttributeRow = sqlx::query_as(&format!(
            r"
            INSERT INTO attributes (id, tenant_id, object_kind, slug, data_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ATTRIBUTE_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(new.tenant_id.into_uuid())
        .bind(new.object_kind.as_str())
        .bind(&new.slug)
        .bind(new.data_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_query(e, || {
                format!("attribute '{}' already exists for {}", new.slug, new.object_kind)
            })
        })?;
        row.try_into()
    }

    async fn find_attribute(
        &self,
        tenant_id: TenantId,
        object_kind: ObjectKind,
        slug: &str,
    ) -> DbResult<Option<Attribute>> {
        let row: Option<AttributeRow> = sqlx::query_as(&format!(
            r"
            SELECT {ATTRIBUTE_COLUMNS}
            FROM attributes
            WHERE tenant_id = $1 AND object_kind = $2 AND slug = $3
            "
        ))
        .bind(tenant_id.into_uuid())
        .bind(object_kind.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.map(Attribute::try_from).transpose()
    }

    async fn set_remote_key(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        provider: Provider,
        remote_key: &str,
    ) -> DbResult<Attribute> {
        let row: Option<AttributeRow> = sqlx::query_as(&format!(
            r"
            UPDATE attributes
            SET remote_keys = remote_keys || jsonb_build_object($3::text, $4::text),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {ATTRIBUTE_COLUMNS}
            "
        ))
        .bind(tenant_id.into_uuid())
        .bind(attribute_id.into_uuid())
        .bind(provider.as_str())
        .bind(remote_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.ok_or_else(|| DbError::NotFound(format!("attribute {attribute_id}")))?
            .try_into()
    }

    async fn list_attributes(
        &self,
        tenant_id: TenantId,
        object_kind: Option<ObjectKind>,
    ) -> DbResult<Vec<Attribute>> {
        let rows: Vec<AttributeRow> = sqlx::query_as(&format!(
            r"
            SELECT {ATTRIBUTE_COLUMNS}
            FROM attributes
            WHERE tenant_id = $1 AND ($2::text IS NULL OR object_kind = $2)
            ORDER BY object_kind, slug
            "
        ))
        .bind(tenant_id.into_uuid())
        .bind(object_kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        rows.into_iter().map(Attribute::try_from).collect()
    }

    #[instrument(skip(self, data), fields(tenant_id = %tenant_id, attribute_id = %attribute_id))]
    async fn upsert_value(
        &self,
        tenant_id: TenantId,
        attribute_id: AttributeId,
        owner_id: ObjectId,
        owner_kind: ObjectKind,
        data: Value,
    ) -> DbResult<AttributeValue> {
        let mut tx = self.pool.begin().await.map_err(DbError::ConnectionFailed)?;

        let owned: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM attributes WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(attribute_id.into_uuid())
        .bind(tenant_id.into_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::QueryFailed)?;
        if !owned.0 {
            return Err(DbError::NotFound(format!("attribute {attribute_id}")));
        }

        sqlx::query(
            r"
            INSERT INTO entities (owner_id, tenant_id, object_kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id) DO NOTHING
            ",
        )
        .bind(owner_id.into_uuid())
        .bind(tenant_id.into_uuid())
        .bind(owner_kind.as_str())
        .execute(&mut *tx)
        .await
        .map_err(DbError::QueryFailed)?;

        let row: ValueRow = sqlx::query_as(
            r"
            INSERT INTO attribute_values (id, tenant_id, attribute_id, owner_id, data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (attribute_id, owner_id) DO UPDATE
                SET data = EXCLUDED.data,
                    updated_at = now()
            RETURNING id, tenant_id, attribute_id, owner_id, data, created_at, updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id.into_uuid())
        .bind(attribute_id.into_uuid())
        .bind(owner_id.into_uuid())
        .bind(Json(&data))
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::QueryFailed)?;

        tx.commit().await.map_err(DbError::QueryFailed)?;
        Ok(row.into())
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
        let rows: Vec<(Uuid, String, Json<Value>)> = sqlx::query_as(
            r"
            SELECT v.owner_id, a.slug, v.data
            FROM attribute_values v
            JOIN attributes a ON a.id = v.attribute_id
            WHERE v.tenant_id = $1 AND v.owner_id = ANY($2)
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(owner_uuids(owner_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;

        let mut resolved: HashMap<ObjectId, BTreeMap<String, Value>> = HashMap::new();
        for (owner_id, slug, data) in rows {
            resolved
                .entry(ObjectId::from_uuid(owner_id))
                .or_default()
                .insert(slug, data.0);
        }
        Ok(resolved)
    }

    async fn list_values(
        &self,
        tenant_id: TenantId,
        attribute_id: Option<AttributeId>,
    ) -> DbResult<Vec<AttributeValue>> {
        let rows: Vec<ValueRow> = sqlx::query_as(
            r"
            SELECT id, tenant_id, attribute_id, owner_id, data, created_at, updated_at
            FROM attribute_values
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR attribute_id = $2)
            ORDER BY created_at, id
            ",
        )
        .bind(tenant_id.into_uuid())
        .bind(attribute_id.map(AttributeId::into_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_entities(&self, tenant_id: TenantId) -> DbResult<Vec<Entity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(
            r"
            SELECT owner_id, tenant_id, object_kind, created_at
            FROM entities
            WHERE tenant_id = $1
            ORDER BY created_at, owner_id
            ",
        )
        .bind(tenant_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        rows.into_iter().map(Entity::try_from).collect()
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn append_event(&self, new: NewSyncEvent) -> DbResult<SyncEvent> {
        let row: EventRow = sqlx::query_as(
            r"
            INSERT INTO sync_events
                (id, tenant_id, status, event_type, method, url, provider, direction, object_kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, tenant_id, status, event_type, method, url, provider, direction,
                      object_kind, timestamp
            ",
        )
        .bind(Uuid::new_v4())
        .bind(new.tenant_id.into_uuid())
        .bind(new.status.as_str())
        .bind(&new.event_type)
        .bind(&new.method)
        .bind(&new.url)
        .bind(new.provider.as_str())
        .bind(new.direction.as_str())
        .bind(new.object_kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        row.try_into()
    }

    async fn list_events(&self, tenant_id: TenantId) -> DbResult<Vec<SyncEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, tenant_id, status, event_type, method, url, provider, direction,
                   object_kind, timestamp
            FROM sync_events
            WHERE tenant_id = $1
            ORDER BY timestamp, id
            ",
        )
        .bind(tenant_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::QueryFailed)?;
        rows.into_iter().map(SyncEvent::try_from).collect()
    }
}
