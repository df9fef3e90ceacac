//! Test helpers for unison-field-mapping.

use std::sync::{Arc, Once};

use async_trait::async_trait;
use serde_json::Value;
use unison_connector::{
    ConnectorResult, ProviderRegistry, RemoteProperty, RemoteResult, ResourceAdapter, TenantContext,
};
use unison_core::{ObjectKind, Provider};
use unison_db::MemoryStore;
use unison_field_mapping::FieldMappingService;

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

/// Adapter that only lists a fixed set of properties.
pub struct PropertiesAdapter {
    pub provider: Provider,
    pub properties: Vec<RemoteProperty>,
}

#[async_trait]
impl ResourceAdapter for PropertiesAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn produces(&self) -> &[ObjectKind] {
        &[]
    }

    async fn create(
        &self,
        _kind: ObjectKind,
        payload: Value,
        _ctx: &TenantContext,
    ) -> ConnectorResult<RemoteResult> {
        Ok(RemoteResult::new(payload, 201))
    }

    async fn custom_properties(
        &self,
        _kind: ObjectKind,
        _ctx: &TenantContext,
    ) -> ConnectorResult<Vec<RemoteProperty>> {
        Ok(self.properties.clone())
    }
}

pub fn property(name: &str) -> RemoteProperty {
    RemoteProperty {
        name: name.to_string(),
        label: None,
        data_type: Some("string".to_string()),
    }
}

/// A service over a fresh in-memory store with a Zendesk properties adapter.
pub fn service() -> (FieldMappingService, Arc<MemoryStore>) {
    init_test_logging();
    let store = Arc::new(MemoryStore::new());
    let registry = ProviderRegistry::new().with_adapter(Arc::new(PropertiesAdapter {
        provider: Provider::Zendesk,
        properties: vec![property("custom_priority"), property("custom_region")],
    }));
    let service = FieldMappingService::new(store.clone(), Arc::new(registry));
    (service, store)
}
