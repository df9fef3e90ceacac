//! Provider lookup.
//!
//! Mappers are stateless and resolved statically per (provider, kind).
//! Adapters hold transport state and are registered at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use unison_core::{ObjectKind, Provider};

use crate::error::{ConnectorError, ConnectorResult};
use crate::providers::{hubspot, pipedrive, zendesk, zoho};
use crate::traits::{ObjectMapper, ResourceAdapter};

/// Resolve the mapper for `kind` (sub-kinds resolve to their base kind).
///
/// A provider without any mapper is unsupported; a supported provider
/// without this kind yields [`ConnectorError::UnsupportedMapping`].
pub fn mapper_for(provider: Provider, kind: ObjectKind) -> ConnectorResult<&'static dyn ObjectMapper> {
    let base = kind.base();
    let mapper: Option<&'static dyn ObjectMapper> = match (provider, base) {
        (Provider::Hubspot, ObjectKind::Engagement) => Some(&hubspot::EngagementMapper),
        (Provider::Hubspot, ObjectKind::Contact) => Some(&hubspot::ContactMapper),
        (Provider::Hubspot, ObjectKind::Company) => Some(&hubspot::CompanyMapper),
        (Provider::Zoho, ObjectKind::Engagement) => Some(&zoho::EngagementMapper),
        (Provider::Zoho, ObjectKind::Company) => Some(&zoho::CompanyMapper),
        (Provider::Pipedrive, ObjectKind::Engagement) => Some(&pipedrive::EngagementMapper),
        (Provider::Pipedrive, ObjectKind::Contact) => Some(&pipedrive::ContactMapper),
        (Provider::Zendesk, ObjectKind::Engagement) => Some(&zendesk::EngagementMapper),
        (Provider::Zendesk, ObjectKind::Contact) => Some(&zendesk::ContactMapper),
        (Provider::Freshsales, _) => return Err(ConnectorError::unsupported_provider(provider)),
        _ => None,
    };
    mapper.ok_or_else(|| ConnectorError::unsupported_mapping(provider, base))
}

/// Registered provider adapters.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<dyn ResourceAdapter>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ProviderRegistry::register`].
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn ResourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Register an adapter, replacing any previous one for its provider.
    pub fn register(&mut self, adapter: Arc<dyn ResourceAdapter>) {
        let provider = adapter.provider();
        if self.adapters.insert(provider, adapter).is_some() {
            debug!(provider = %provider, "Replaced provider adapter");
        } else {
            debug!(provider = %provider, "Registered provider adapter");
        }
    }

    /// Adapter for `provider`.
    pub fn get_adapter(&self, provider: Provider) -> ConnectorResult<Arc<dyn ResourceAdapter>> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or_else(|| ConnectorError::unsupported_provider(provider))
    }

    /// Adapter for `provider` that can create objects of `kind`.
    pub fn adapter_for(
        &self,
        provider: Provider,
        kind: ObjectKind,
    ) -> ConnectorResult<Arc<dyn ResourceAdapter>> {
        let adapter = self.get_adapter(provider)?;
        if adapter.supports(kind) {
            Ok(adapter)
        } else {
            Err(ConnectorError::unsupported_mapping(provider, kind))
        }
    }

    /// Mapper for `provider` and `kind`.
    pub fn mapper(&self, provider: Provider, kind: ObjectKind) -> ConnectorResult<&'static dyn ObjectMapper> {
        mapper_for(provider, kind)
    }

    /// Providers with a registered adapter, in a stable order.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.adapters.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RemoteResult, TenantContext};
    use async_trait::async_trait;
    use serde_json::Value;

    struct FixedAdapter(Provider, &'static [ObjectKind]);

    #[async_trait]
    impl ResourceAdapter for FixedAdapter {
        fn provider(&self) -> Provider {
            self.0
        }

        fn produces(&self) -> &[ObjectKind] {
            self.1
        }

        async fn create(
            &self,
            _kind: ObjectKind,
            payload: Value,
            _ctx: &TenantContext,
        ) -> ConnectorResult<RemoteResult> {
            Ok(RemoteResult::new(payload, 201))
        }
    }

    mod mapper_tests {
        use super::*;

        #[test]
        fn test_sub_kinds_resolve_to_base_mapper() {
            let mapper = mapper_for(Provider::Hubspot, ObjectKind::EngagementCall).unwrap();
            assert_eq!(mapper.kind(), ObjectKind::Engagement);
            assert_eq!(mapper.provider(), Provider::Hubspot);
        }

        #[test]
        fn test_missing_kind_is_unsupported_mapping() {
            let err = mapper_for(Provider::Zoho, ObjectKind::Contact).err().unwrap();
            assert_eq!(err.error_code(), "UNSUPPORTED_MAPPING");
        }

        #[test]
        fn test_provider_without_mappers_is_unsupported() {
            let err = mapper_for(Provider::Freshsales, ObjectKind::Engagement).err().unwrap();
            assert_eq!(err.error_code(), "UNSUPPORTED_PROVIDER");
        }

        #[test]
        fn test_every_mapper_reports_its_own_coordinates() {
            for provider in Provider::all() {
                for kind in ObjectKind::all() {
                    if let Ok(mapper) = mapper_for(*provider, *kind) {
                        assert_eq!(mapper.provider(), *provider);
                        assert_eq!(mapper.kind(), kind.base());
                    }
                }
            }
        }
    }

    mod adapter_tests {
        use super::*;

        #[test]
        fn test_adapter_lookup() {
            let registry = ProviderRegistry::new().with_adapter(Arc::new(FixedAdapter(
                Provider::Zendesk,
                &[ObjectKind::EngagementCall],
            )));

            assert!(registry.adapter_for(Provider::Zendesk, ObjectKind::EngagementCall).is_ok());
            let err = registry
                .adapter_for(Provider::Zendesk, ObjectKind::EngagementEmail)
                .err().unwrap();
            assert_eq!(err.error_code(), "UNSUPPORTED_MAPPING");
            let err = registry.get_adapter(Provider::Hubspot).err().unwrap();
            assert_eq!(err.error_code(), "UNSUPPORTED_PROVIDER");
            assert_eq!(registry.providers(), vec![Provider::Zendesk]);
        }

        #[test]
        fn test_register_replaces_existing() {
            let mut registry = ProviderRegistry::new();
            registry.register(Arc::new(FixedAdapter(Provider::Hubspot, &[])));
            registry.register(Arc::new(FixedAdapter(Provider::Hubspot, &[ObjectKind::Contact])));
            assert_eq!(registry.providers().len(), 1);
            assert!(registry.adapter_for(Provider::Hubspot, ObjectKind::Contact).is_ok());
        }
    }
}
