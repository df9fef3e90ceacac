//! unison worker.
//!
//! Hosts the Postgres-backed sync services for every canonical resource and
//! the webhook delivery worker they notify through. Runs until Ctrl+C or
//! SIGTERM, then drains queued webhook deliveries before exiting.

mod config;

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use unison_connector::{ProviderRegistry, RestAdapter};
use unison_db::{run_migrations, PgStore};
use unison_field_mapping::FieldMappingService;
use unison_sync::{init_logging, ResourceSyncService};
use unison_unification::{Company, Contact, Engagement};
use unison_webhooks::{EventPublisher, WebhookWorker};

use crate::config::WorkerConfig;

/// Sync services sharing one store, registry and attribute registry.
struct Services {
    engagements: ResourceSyncService<Engagement>,
    contacts: ResourceSyncService<Contact>,
    companies: ResourceSyncService<Company>,
}

impl Services {
    fn new(
        store: Arc<PgStore>,
        registry: Arc<ProviderRegistry>,
        config: &WorkerConfig,
        publisher: EventPublisher,
    ) -> Self {
        let field_mapping = FieldMappingService::new(store.clone(), registry.clone());
        Self {
            engagements: ResourceSyncService::builder(store.clone(), registry.clone(), publisher.clone())
                .settings(config.sync)
                .field_mapping(field_mapping.clone())
                .build(),
            contacts: ResourceSyncService::builder(store.clone(), registry.clone(), publisher.clone())
                .settings(config.sync)
                .field_mapping(field_mapping.clone())
                .build(),
            companies: ResourceSyncService::builder(store, registry, publisher)
                .settings(config.sync)
                .field_mapping(field_mapping)
                .build(),
        }
    }
}

fn build_registry(config: &WorkerConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in &config.providers {
        match RestAdapter::new(provider.clone()) {
            Ok(adapter) => registry.register(Arc::new(adapter)),
            Err(e) => {
                // A broken provider entry only disables that provider.
                error!(provider = %provider.provider, error = %e, "Failed to create provider adapter");
            }
        }
    }
    registry
}

#[tokio::main]
async fn main() {
    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_filter);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        providers = config.providers.len(),
        endpoints = config.endpoints.len(),
        remote_deadline_ms = u64::try_from(config.sync.remote_deadline.as_millis()).unwrap_or(u64::MAX),
        "Starting unison worker"
    );

    let store = match PgStore::connect_with(&config.database_url, config.db_max_connections).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = run_migrations(store.pool()).await {
        error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }
    info!("Database ready");

    let registry = Arc::new(build_registry(&config));
    info!(providers = ?registry.providers(), "Provider adapters registered");
    if registry.providers().is_empty() {
        warn!("No provider adapters configured; every push will fail with UNSUPPORTED_PROVIDER");
    }

    let (publisher, receiver) = EventPublisher::new(config.webhooks.channel_capacity);
    let worker = match WebhookWorker::new(receiver, config.endpoints.clone(), config.webhooks.clone()) {
        Ok(worker) => worker,
        Err(e) => {
            error!(error = %e, "Failed to create webhook worker");
            std::process::exit(1);
        }
    };
    let delivery = worker.spawn();

    let services = Services::new(Arc::new(store), registry, &config, publisher);
    info!(
        engagements = ?services.engagements,
        contacts = ?services.contacts,
        companies = ?services.companies,
        "Sync services ready"
    );

    shutdown_signal().await;

    // Dropping the services closes the channel; the worker drains and exits.
    drop(services);
    if let Err(e) = delivery.await {
        error!(error = %e, "Webhook worker panicked");
    }
    info!("Worker shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
