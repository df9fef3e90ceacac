//! Sync event recording and webhook delivery.
//!
//! Every push or pull through the unification layer appends a [`SyncEvent`]
//! audit record; successful writes also notify the project's webhook
//! endpoints. Notifications are queued on a broadcast channel by
//! [`EventNotifier::notify`] and delivered by a [`WebhookWorker`] with
//! HMAC-SHA256 signing and backoff retries, so a slow or failing subscriber
//! never delays the sync request.
//!
//! [`SyncEvent`]: unison_db::SyncEvent

pub mod crypto;
pub mod error;
pub mod models;
pub mod notifier;
pub mod publisher;
pub mod settings;
pub mod transport;
pub mod worker;

pub use error::{WebhookError, WebhookResult};
pub use models::{WebhookEndpoint, WebhookPayload};
pub use notifier::EventNotifier;
pub use publisher::EventPublisher;
pub use settings::WebhookSettings;
pub use transport::{HttpTransport, WebhookTransport};
pub use worker::{deliver_with_retry, DeliveryOutcome, WebhookWorker};
