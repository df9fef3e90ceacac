//! Sync event recording and webhook notification.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use unison_core::{EventId, ObjectKind, ProjectId, Provider, TenantId};
use unison_db::{EventStatus, EventStore, NewSyncEvent, SyncDirection, SyncEvent};

use crate::error::WebhookResult;
use crate::models::WebhookPayload;
use crate::publisher::EventPublisher;

/// Records audit events and hands notifications to the webhook worker.
#[derive(Clone)]
pub struct EventNotifier {
    events: Arc<dyn EventStore>,
    publisher: EventPublisher,
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl EventNotifier {
    pub fn new(events: Arc<dyn EventStore>, publisher: EventPublisher) -> Self {
        Self { events, publisher }
    }

    /// Append a sync event.
    pub async fn record_event(&self, event: NewSyncEvent) -> WebhookResult<SyncEvent> {
        let event = self.events.append_event(event).await?;
        debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            status = %event.status,
            "Sync event recorded"
        );
        Ok(event)
    }

    /// Append the sync event for one sync attempt of `kind`.
    pub async fn record(
        &self,
        tenant_id: TenantId,
        kind: ObjectKind,
        provider: Provider,
        direction: SyncDirection,
        status: EventStatus,
    ) -> WebhookResult<SyncEvent> {
        self.record_event(NewSyncEvent::for_sync(tenant_id, kind, provider, direction, status))
            .await
    }

    /// Queue a notification for the project's webhook endpoints.
    ///
    /// Never blocks and never fails; delivery happens on the worker.
    pub fn notify(
        &self,
        object: &Value,
        event_type: &str,
        project_id: ProjectId,
        correlation_id: EventId,
    ) {
        self.publisher.publish(WebhookPayload::new(
            object.clone(),
            event_type,
            project_id,
            correlation_id,
        ));
    }
}
