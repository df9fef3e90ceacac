//! Resource sync for unison.
//!
//! [`ResourceSyncService`] pushes canonical CRM resources to a provider and
//! reconciles what comes back. Each call runs through the [`SyncStage`]
//! steps in order and either finishes with a [`Synced`] result or fails with
//! a [`SyncFailure`] that names the step it stopped at.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use unison_connector::ProviderRegistry;
//! use unison_core::{Provider, TenantId};
//! use unison_db::MemoryStore;
//! use unison_sync::ResourceSyncService;
//! use unison_unification::{Company, UnifiedInput};
//! use unison_webhooks::EventPublisher;
//!
//! # async fn example(tenant_id: TenantId) -> Result<(), Box<dyn std::error::Error>> {
//! let (publisher, _deliveries) = EventPublisher::new(1024);
//! let service = ResourceSyncService::<Company>::builder(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(ProviderRegistry::new()),
//!     publisher,
//! )
//! .build();
//!
//! let input = UnifiedInput::new(Company::default());
//! let synced = service.add_one(tenant_id, Provider::Hubspot, input).await?;
//! println!("{} created={}", synced.object.id, synced.created);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logging;
pub mod outcome;
pub mod relations;
pub mod service;
pub mod settings;
pub mod stage;

pub use error::{SyncError, SyncFailure, SyncResult};
pub use logging::init_logging;
pub use outcome::{BatchOutcome, BatchSummary, ElementOutcome, Synced};
pub use service::{ResourceSyncService, ResourceSyncServiceBuilder};
pub use settings::{SyncOptions, SyncSettings};
pub use stage::SyncStage;
