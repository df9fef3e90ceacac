//! Test helpers for unison-sync.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use unison_connector::{
    mapper_for, ConnectorResult, ProviderRegistry, RemoteResult, ResourceAdapter, TenantContext,
};
use unison_core::{ObjectKind, ProjectId, Provider, TenantId};
use unison_db::{DataType, LinkedUser, LinkedUserStore, MemoryStore};
use unison_field_mapping::models::{DefineTargetField, MapFieldToProvider};
use unison_sync::{ResourceSyncService, SyncSettings};
use unison_unification::UnifiedResource;
use unison_webhooks::{EventPublisher, WebhookPayload};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

const ALL_KINDS: &[ObjectKind] = &[
    ObjectKind::EngagementCall,
    ObjectKind::EngagementMeeting,
    ObjectKind::EngagementEmail,
    ObjectKind::Contact,
    ObjectKind::Company,
];

/// How a [`MockAdapter`] answers `create`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Echo the payload with a fresh id per call.
    Echo,
    /// Echo the payload, always under the same id.
    EchoWithId(String),
    /// Answer with the given status and an empty object.
    Status(u16),
    /// Answer with the given status and body.
    Reject(u16, Value),
    /// Echo after sleeping.
    Slow(Duration),
}

/// Adapter that records payloads and answers from a script.
pub struct MockAdapter {
    provider: Provider,
    reply: Reply,
    calls: AtomicUsize,
    payloads: Mutex<Vec<Value>>,
}

impl MockAdapter {
    pub fn new(provider: Provider, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            provider,
            reply,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap().clone()
    }

    fn echo(&self, kind: ObjectKind, mut payload: Value, id: String) -> ConnectorResult<RemoteResult> {
        let mapper = mapper_for(self.provider, kind)?;
        mapper.record_mut(&mut payload)["id"] = Value::String(id);
        Ok(RemoteResult::new(payload, 201))
    }
}

#[async_trait]
impl ResourceAdapter for MockAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn produces(&self) -> &[ObjectKind] {
        ALL_KINDS
    }

    async fn create(
        &self,
        kind: ObjectKind,
        payload: Value,
        _ctx: &TenantContext,
    ) -> ConnectorResult<RemoteResult> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.payloads.lock().unwrap().push(payload.clone());
        let fresh_id = format!("{}-{n}", self.provider);

        match &self.reply {
            Reply::Echo => self.echo(kind, payload, fresh_id),
            Reply::EchoWithId(id) => self.echo(kind, payload, id.clone()),
            Reply::Status(code) => Ok(RemoteResult::new(Value::Object(Default::default()), *code)),
            Reply::Reject(code, body) => Ok(RemoteResult::new(body.clone(), *code)),
            Reply::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                self.echo(kind, payload, fresh_id)
            }
        }
    }
}

/// A sync service over a fresh in-memory store.
pub struct Fixture<R> {
    pub store: Arc<MemoryStore>,
    pub service: ResourceSyncService<R>,
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub deliveries: broadcast::Receiver<WebhookPayload>,
}

impl<R: UnifiedResource> Fixture<R> {
    pub async fn new(adapters: Vec<Arc<MockAdapter>>) -> Self {
        Self::with_settings(adapters, SyncSettings::default()).await
    }

    pub async fn with_settings(adapters: Vec<Arc<MockAdapter>>, settings: SyncSettings) -> Self {
        init_test_logging();
        let store = Arc::new(MemoryStore::new());
        let mut registry = ProviderRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        let (publisher, deliveries) = EventPublisher::new(64);
        let service = ResourceSyncService::<R>::builder(store.clone(), Arc::new(registry), publisher)
            .settings(settings)
            .build();

        let project_id = ProjectId::new();
        let user = store.insert_linked_user(LinkedUser::new(project_id)).await.unwrap();

        Self {
            store,
            service,
            tenant_id: user.id,
            project_id,
            deliveries,
        }
    }

    /// Another linked user on the same store.
    pub async fn other_tenant(&self) -> TenantId {
        self.store
            .insert_linked_user(LinkedUser::new(ProjectId::new()))
            .await
            .unwrap()
            .id
    }

    /// Define a string custom field on `kind` mapped to `remote_key`.
    pub async fn custom_field(&self, kind: ObjectKind, slug: &str, provider: Provider, remote_key: &str) {
        let field_mapping = self.service.field_mapping();
        field_mapping
            .define_target_field(self.tenant_id, DefineTargetField::new(kind, slug, DataType::String))
            .await
            .unwrap();
        field_mapping
            .map_field_to_provider(
                self.tenant_id,
                MapFieldToProvider::new(kind, slug, provider, remote_key),
            )
            .await
            .unwrap();
    }
}
