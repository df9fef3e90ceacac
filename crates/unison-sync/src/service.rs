//! Resource sync service.
//!
//! One `add_one` call walks the stages of [`SyncStage`] in order:
//! validate the input and its relations, desunify for the provider, create
//! the object remotely, unify the response, reconcile it into the canonical
//! store and notify subscribers. A failure at any stage stops the call;
//! nothing is written before RECONCILING.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use unison_connector::{ConnectorError, ProviderRegistry, TenantContext};
use unison_core::{EventId, ObjectId, ObjectKind, Provider, TenantAware, TenantId};
use unison_db::{
    CanonicalObject, EventStatus, EventStore, LinkedUser, ReconcileObject, RemoteSnapshot, Store,
    SyncDirection,
};
use unison_field_mapping::FieldMappingService;
use unison_unification::{
    FieldMappings, OneOrMany, UnificationEngine, UnifiedInput, UnifiedOutput, UnifiedResource,
};
use unison_webhooks::{EventNotifier, EventPublisher};

use crate::error::{SyncError, SyncFailure, SyncResult};
use crate::outcome::{BatchOutcome, ElementOutcome, Synced};
use crate::relations::{resolve_references, to_canonical_ids, to_remote_ids};
use crate::settings::{SyncOptions, SyncSettings};
use crate::stage::SyncStage;

/// Syncs one canonical resource type `R` with the providers.
pub struct ResourceSyncService<R> {
    store: Arc<dyn Store>,
    registry: Arc<ProviderRegistry>,
    field_mapping: FieldMappingService,
    notifier: EventNotifier,
    engine: UnificationEngine,
    settings: SyncSettings,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceSyncService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            field_mapping: self.field_mapping.clone(),
            notifier: self.notifier.clone(),
            engine: self.engine,
            settings: self.settings,
            _resource: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for ResourceSyncService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSyncService")
            .field("resource", &std::any::type_name::<R>())
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Where one call is, and what it has learned so far.
struct Progress {
    stage: SyncStage,
    kind: Option<ObjectKind>,
}

impl Progress {
    fn new() -> Self {
        Self {
            stage: SyncStage::Validating,
            kind: None,
        }
    }

    fn advance(&mut self, to: SyncStage) {
        debug_assert!(self.stage.can_transition_to(to), "{} -> {}", self.stage, to);
        debug!(from = %self.stage, to = %to, "Sync stage transition");
        self.stage = to;
    }
}

impl<R: UnifiedResource> ResourceSyncService<R> {
    /// Create a builder over `store`, which also receives the audit events.
    pub fn builder<S>(
        store: Arc<S>,
        registry: Arc<ProviderRegistry>,
        publisher: EventPublisher,
    ) -> ResourceSyncServiceBuilder<R>
    where
        S: Store + 'static,
    {
        ResourceSyncServiceBuilder::new(store, registry, publisher)
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// The attribute registry the service resolves custom fields with.
    #[must_use]
    pub fn field_mapping(&self) -> &FieldMappingService {
        &self.field_mapping
    }

    /// Push one resource to `provider` and reconcile the result, with the
    /// default options.
    pub async fn add_one(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        input: UnifiedInput<R>,
    ) -> Result<Synced<R>, SyncFailure> {
        self.add_one_with(tenant_id, provider, input, &self.settings.options())
            .await
    }

    /// Push one resource to `provider` and reconcile the result.
    #[instrument(skip(self, input, options), fields(tenant_id = %tenant_id, provider = %provider, resource = %R::KIND))]
    pub async fn add_one_with(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        input: UnifiedInput<R>,
        options: &SyncOptions,
    ) -> Result<Synced<R>, SyncFailure> {
        let mut progress = Progress::new();
        match self.run(&mut progress, tenant_id, provider, input, options).await {
            Ok(synced) => {
                progress.advance(SyncStage::Done);
                Ok(synced)
            }
            Err(error) => Err(self.fail(progress, tenant_id, provider, error).await),
        }
    }

    /// [`Self::add_one`] for every input, concurrently.
    ///
    /// Elements are independent: one failure never aborts the others.
    /// Outcomes come back in input order.
    pub async fn add_many(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        inputs: Vec<UnifiedInput<R>>,
    ) -> BatchOutcome<R> {
        self.add_many_with(tenant_id, provider, inputs, &self.settings.options())
            .await
    }

    #[instrument(skip(self, inputs, options), fields(tenant_id = %tenant_id, provider = %provider, count = inputs.len()))]
    pub async fn add_many_with(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        inputs: Vec<UnifiedInput<R>>,
        options: &SyncOptions,
    ) -> BatchOutcome<R> {
        let results = stream::iter(inputs.into_iter().enumerate())
            .map(|(index, input)| async move {
                let result = self.add_one_with(tenant_id, provider, input, options).await;
                ElementOutcome { index, result }
            })
            .buffered(self.settings.batch_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let outcome = BatchOutcome::from_results(results);
        info!(
            total = outcome.summary.total,
            succeeded = outcome.summary.succeeded,
            failed = outcome.summary.failed,
            "Batch sync finished"
        );
        outcome
    }

    /// A stored resource with its custom field values.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, object_id = %id))]
    pub async fn get_one(
        &self,
        tenant_id: TenantId,
        id: ObjectId,
        include_remote_data: bool,
    ) -> SyncResult<UnifiedOutput<R>> {
        let object = self
            .store
            .find_object(tenant_id, id)
            .await?
            .filter(|object| R::KIND.includes(object.object_kind))
            .ok_or_else(|| SyncError::not_found(R::KIND.as_str(), id))?;

        let values = self
            .field_mapping
            .resolve_values_for_object(tenant_id, id)
            .await?;
        let snapshot = if include_remote_data {
            self.store.find_snapshot(tenant_id, id).await?
        } else {
            None
        };
        to_output(tenant_id, object, values, snapshot)
    }

    /// Every stored resource synced from `provider`, oldest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, provider = %provider))]
    pub async fn get_many(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        include_remote_data: bool,
    ) -> SyncResult<Vec<UnifiedOutput<R>>> {
        self.linked_user(tenant_id).await?;

        let result = self.list(tenant_id, provider, include_remote_data).await;
        let status = if result.is_ok() {
            EventStatus::Success
        } else {
            EventStatus::Fail
        };
        self.record_event(tenant_id, R::KIND, provider, SyncDirection::Pull, status)
            .await;
        result
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        provider: Provider,
        include_remote_data: bool,
    ) -> SyncResult<Vec<UnifiedOutput<R>>> {
        let objects = self
            .store
            .list_objects(tenant_id, R::KIND.family(), provider)
            .await?;
        let ids: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();

        let mut values = self
            .field_mapping
            .resolve_values_for_objects(tenant_id, &ids)
            .await?;
        let mut snapshots = if include_remote_data && !ids.is_empty() {
            self.store.find_snapshots(tenant_id, &ids).await?
        } else {
            HashMap::new()
        };

        objects
            .into_iter()
            .map(|object| {
                let id = object.id;
                to_output(tenant_id, object, values.remove(&id).unwrap_or_default(), snapshots.remove(&id))
            })
            .collect()
    }

    async fn run(
        &self,
        progress: &mut Progress,
        tenant_id: TenantId,
        provider: Provider,
        input: UnifiedInput<R>,
        options: &SyncOptions,
    ) -> SyncResult<Synced<R>> {
        let user = self.linked_user(tenant_id).await?;
        let ctx = TenantContext::new(user.id, user.project_id);

        // Collect every violation before failing.
        let mut violations = input.resource.validate();
        violations.extend(
            self.field_mapping
                .check_values(tenant_id, R::KIND, &input.field_mappings)
                .await?,
        );
        let (resolved, dangling) =
            resolve_references(self.store.as_ref(), tenant_id, &input.resource.references()).await?;
        violations.extend(dangling);
        if !violations.is_empty() {
            return Err(SyncError::validation(violations));
        }
        let kind = self.engine.route(&input.resource)?;
        progress.kind = Some(kind);

        progress.advance(SyncStage::MappingOut);
        let custom_mappings = self
            .field_mapping
            .custom_mappings(tenant_id, kind, provider)
            .await?;
        let mut fields = input.resource.to_fields()?;
        to_remote_ids(&mut fields, R::relations(), &resolved, provider);
        let desunified =
            self.engine
                .desunify_fields(&fields, &input.field_mappings, kind, provider, &custom_mappings)?;
        let adapter = self.registry.adapter_for(provider, kind)?;

        progress.advance(SyncStage::RemoteCall);
        let deadline_ms = u64::try_from(options.deadline.as_millis()).unwrap_or(u64::MAX);
        let remote = tokio::time::timeout(options.deadline, adapter.create(kind, desunified.payload, &ctx))
            .await
            .map_err(|_| ConnectorError::remote_timeout(provider, deadline_ms))??;
        if !remote.is_success() {
            return Err(ConnectorError::remote_rejection(provider, remote.status_code, &remote.data).into());
        }

        progress.advance(SyncStage::MappingIn);
        let unified = self
            .engine
            .unify::<R>(OneOrMany::One(remote.data.clone()), kind, provider, &custom_mappings)?
            .into_first()
            .ok_or_else(|| SyncError::mapping(provider, kind, "provider returned no object"))?;
        let remote_id = unified
            .remote_id
            .clone()
            .ok_or_else(|| SyncError::mapping(provider, kind, "provider response carries no id"))?;
        let mut fields = unified.resource.to_fields()?;
        to_canonical_ids(self.store.as_ref(), tenant_id, provider, R::relations(), &mut fields).await?;

        progress.advance(SyncStage::Reconciling);
        let reconciled = self
            .store
            .reconcile(ReconcileObject::new(tenant_id, kind, provider, remote_id, fields))
            .await?;
        let object = reconciled.object;
        let snapshot = self
            .store
            .put_snapshot(tenant_id, object.id, remote.data)
            .await?;
        // Values the provider echoed back win over submitted ones.
        let mut values = input.field_mappings;
        values.extend(unified.field_mappings);
        self.field_mapping
            .store_values(tenant_id, object.id, kind, &values)
            .await?;

        progress.advance(SyncStage::Notifying);
        let values = self
            .field_mapping
            .resolve_values_for_object(tenant_id, object.id)
            .await?;
        let output = to_output::<R>(
            tenant_id,
            object,
            values,
            options.include_remote_data.then_some(snapshot),
        )?;

        let event_id = self
            .record_event(tenant_id, kind, provider, SyncDirection::Push, EventStatus::Success)
            .await;
        if let Some(event_id) = event_id {
            let action = if reconciled.created { "created" } else { "updated" };
            let event_type = format!("{}.{action}", kind.event_prefix());
            match serde_json::to_value(&output) {
                Ok(body) => self.notifier.notify(&body, &event_type, ctx.project_id, event_id),
                Err(e) => warn!(error = %e, "Failed to serialize webhook body"),
            }
        }

        info!(
            object_id = %output.id,
            object_kind = %kind,
            created = reconciled.created,
            "Resource synced"
        );
        Ok(Synced {
            object: output,
            created: reconciled.created,
            event_id,
        })
    }

    async fn fail(
        &self,
        progress: Progress,
        tenant_id: TenantId,
        provider: Provider,
        error: SyncError,
    ) -> SyncFailure {
        let stage = progress.stage;
        debug!(from = %stage, to = %SyncStage::Failed, "Sync stage transition");
        warn!(
            stage = %stage,
            error_code = error.error_code(),
            status_code = error.status_code(),
            error = %error,
            "Sync failed"
        );

        // Calls rejected before reaching the provider leave no trace.
        if stage.has_reached_remote() {
            if let Some(kind) = progress.kind {
                self.record_event(tenant_id, kind, provider, SyncDirection::Push, EventStatus::Fail)
                    .await;
            }
        }
        SyncFailure::new(stage, error)
    }

    async fn linked_user(&self, tenant_id: TenantId) -> SyncResult<LinkedUser> {
        self.store
            .find_linked_user(tenant_id)
            .await?
            .ok_or_else(|| SyncError::not_found("linked user", tenant_id))
    }

    /// Append an audit event; failures are logged, never propagated.
    async fn record_event(
        &self,
        tenant_id: TenantId,
        kind: ObjectKind,
        provider: Provider,
        direction: SyncDirection,
        status: EventStatus,
    ) -> Option<EventId> {
        match self
            .notifier
            .record(tenant_id, kind, provider, direction, status)
            .await
        {
            Ok(event) => Some(event.id),
            Err(e) => {
                warn!(error = %e, direction = %direction, status = %status, "Failed to record sync event");
                None
            }
        }
    }
}

/// Build the caller-facing view of a stored object owned by `tenant_id`.
fn to_output<R: UnifiedResource>(
    tenant_id: TenantId,
    object: CanonicalObject,
    field_mappings: FieldMappings,
    snapshot: Option<RemoteSnapshot>,
) -> SyncResult<UnifiedOutput<R>> {
    if let Err(e) = object.ensure_tenant(tenant_id) {
        warn!(object_id = %object.id, error = %e, "Store returned an object of another tenant");
        return Err(SyncError::not_found(R::KIND.as_str(), object.id));
    }
    Ok(UnifiedOutput {
        id: object.id,
        remote_id: Some(object.remote_id),
        remote_platform: object.provider,
        resource: R::from_fields(object.fields)?,
        field_mappings,
        remote_data: snapshot.map(|s| s.data),
        created_at: object.created_at,
        modified_at: object.modified_at,
    })
}

/// Builder for [`ResourceSyncService`].
pub struct ResourceSyncServiceBuilder<R> {
    store: Arc<dyn Store>,
    events: Arc<dyn EventStore>,
    registry: Arc<ProviderRegistry>,
    publisher: EventPublisher,
    settings: SyncSettings,
    field_mapping: Option<FieldMappingService>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: UnifiedResource> ResourceSyncServiceBuilder<R> {
    /// Create a new builder.
    pub fn new<S>(store: Arc<S>, registry: Arc<ProviderRegistry>, publisher: EventPublisher) -> Self
    where
        S: Store + 'static,
    {
        Self {
            events: store.clone(),
            store,
            registry,
            publisher,
            settings: SyncSettings::default(),
            field_mapping: None,
            _resource: PhantomData,
        }
    }

    /// Set the sync settings.
    #[must_use]
    pub fn settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share an existing attribute registry.
    #[must_use]
    pub fn field_mapping(mut self, field_mapping: FieldMappingService) -> Self {
        self.field_mapping = Some(field_mapping);
        self
    }

    /// Build the service.
    #[must_use]
    pub fn build(self) -> ResourceSyncService<R> {
        let field_mapping = self.field_mapping.unwrap_or_else(|| {
            FieldMappingService::new(Arc::clone(&self.store), Arc::clone(&self.registry))
        });
        ResourceSyncService {
            store: self.store,
            registry: self.registry,
            field_mapping,
            notifier: EventNotifier::new(self.events, self.publisher),
            engine: UnificationEngine::new(),
            settings: self.settings,
            _resource: PhantomData,
        }
    }
}
