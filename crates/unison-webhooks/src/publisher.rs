//! Event publishing over a tokio broadcast channel.

use tokio::sync::broadcast;

use crate::models::WebhookPayload;

/// Publisher that sends webhook payloads to a broadcast channel.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<WebhookPayload>,
}

impl EventPublisher {
    /// Create a new event publisher with the given channel capacity.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<WebhookPayload>) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Publish a payload to all subscribers. Fire-and-forget: errors are
    /// logged, not propagated.
    pub fn publish(&self, payload: WebhookPayload) {
        if let Err(e) = self.sender.send(payload) {
            tracing::warn!(
                target: "webhook_delivery",
                event_type = %e.0.event_type,
                "No active webhook worker to receive payload"
            );
        }
    }

    /// Get a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<WebhookPayload> {
        self.sender.subscribe()
    }
}
