//! # unison Database Layer
//!
//! Persistence for canonical objects, remote snapshots, custom fields and
//! sync events, always scoped to one linked user.
//!
//! Two implementations of the [`Store`] contract are provided:
//!
//! - [`MemoryStore`] for tests and single-process deployments
//! - [`PgStore`] over PostgreSQL, with embedded [`run_migrations`]
//!
//! ## Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use serde_json::json;
//! use unison_core::{ObjectKind, Provider, TenantId};
//! use unison_db::{MemoryStore, ObjectStore, ReconcileObject};
//!
//! let store = MemoryStore::new();
//! let fields = json!({"subject": "Intro"}).as_object().cloned().unwrap();
//! let request = ReconcileObject::new(
//!     TenantId::new(),
//!     ObjectKind::EngagementCall,
//!     Provider::Hubspot,
//!     "512",
//!     fields,
//! );
//! let reconciled = store.reconcile(request).await.unwrap();
//! assert!(reconciled.created);
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use models::*;
pub use postgres::PgStore;
pub use store::{AttributeStore, EventStore, LinkedUserStore, ObjectStore, Store};

// Re-export sqlx types for convenience
pub use sqlx::PgPool;
