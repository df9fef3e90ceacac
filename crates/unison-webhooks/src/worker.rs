//! Background webhook delivery.
//!
//! The worker drains the publisher's broadcast channel and fans each payload
//! out to every matching endpoint. Each endpoint delivery runs on its own
//! task so a slow subscriber never holds up the channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::WebhookResult;
use crate::models::{WebhookEndpoint, WebhookPayload};
use crate::settings::WebhookSettings;
use crate::transport::{HttpTransport, WebhookTransport};

/// Jitter added on top of each backoff delay, as a fraction of it.
const JITTER_FACTOR: f64 = 0.25;

/// Result of delivering one payload to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub attempts: u32,
    pub delivered: bool,
}

/// Consumes published payloads and delivers them with retries.
pub struct WebhookWorker {
    receiver: broadcast::Receiver<WebhookPayload>,
    endpoints: Arc<Vec<WebhookEndpoint>>,
    transport: Arc<dyn WebhookTransport>,
    settings: WebhookSettings,
}

impl std::fmt::Debug for WebhookWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookWorker")
            .field("endpoints", &self.endpoints)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl WebhookWorker {
    /// Worker delivering over HTTP.
    pub fn new(
        receiver: broadcast::Receiver<WebhookPayload>,
        endpoints: Vec<WebhookEndpoint>,
        settings: WebhookSettings,
    ) -> WebhookResult<Self> {
        let transport = Arc::new(HttpTransport::new(settings.timeout)?);
        Ok(Self::with_transport(receiver, endpoints, transport, settings))
    }

    pub fn with_transport(
        receiver: broadcast::Receiver<WebhookPayload>,
        endpoints: Vec<WebhookEndpoint>,
        transport: Arc<dyn WebhookTransport>,
        settings: WebhookSettings,
    ) -> Self {
        Self {
            receiver,
            endpoints: Arc::new(endpoints),
            transport,
            settings,
        }
    }

    /// Run the worker on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Deliver payloads until every publisher is dropped.
    pub async fn run(mut self) {
        info!(
            target: "webhook_delivery",
            endpoints = self.endpoints.len(),
            "Webhook worker started"
        );

        let mut in_flight = tokio::task::JoinSet::new();
        loop {
            match self.receiver.recv().await {
                Ok(payload) => {
                    let payload = Arc::new(payload);
                    for endpoint in self.matching(&payload) {
                        let transport = Arc::clone(&self.transport);
                        let settings = self.settings.clone();
                        let payload = Arc::clone(&payload);
                        in_flight.spawn(async move {
                            deliver_with_retry(transport.as_ref(), &endpoint, &payload, &settings).await
                        });
                    }
                    // Reap finished deliveries so the set stays small.
                    while in_flight.try_join_next().is_some() {}
                }
                Err(RecvError::Lagged(dropped)) => {
                    warn!(
                        target: "webhook_delivery",
                        dropped,
                        "Webhook worker fell behind; notifications dropped"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }

        while in_flight.join_next().await.is_some() {}
        info!(target: "webhook_delivery", "Webhook worker stopped");
    }

    fn matching(&self, payload: &WebhookPayload) -> Vec<WebhookEndpoint> {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.matches(payload.project_id, &payload.event_type))
            .cloned()
            .collect()
    }
}

/// Deliver `payload` to `endpoint`, retrying transient failures.
pub async fn deliver_with_retry(
    transport: &dyn WebhookTransport,
    endpoint: &WebhookEndpoint,
    payload: &WebhookPayload,
    settings: &WebhookSettings,
) -> DeliveryOutcome {
    let max_attempts = settings.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        match transport.deliver(endpoint, payload).await {
            Ok(()) => {
                debug!(
                    target: "webhook_delivery",
                    payload_id = %payload.id,
                    event_type = %payload.event_type,
                    url = %endpoint.url,
                    attempts,
                    "Webhook delivery succeeded"
                );
                return DeliveryOutcome { attempts, delivered: true };
            }
            Err(e) if e.is_transient() && attempts < max_attempts => {
                let delay = add_jitter(settings.delay_before_retry(attempts));
                debug!(
                    target: "webhook_delivery",
                    payload_id = %payload.id,
                    url = %endpoint.url,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Webhook delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    target: "webhook_delivery",
                    payload_id = %payload.id,
                    event_type = %payload.event_type,
                    url = %endpoint.url,
                    attempts,
                    error_code = e.error_code(),
                    error = %e,
                    "Webhook delivery abandoned"
                );
                return DeliveryOutcome { attempts, delivered: false };
            }
        }
    }
}

fn add_jitter(delay: Duration) -> Duration {
    use rand::Rng;

    let delay_ms = delay.as_millis() as f64;
    let jitter = rand::thread_rng().gen_range(0.0..=delay_ms * JITTER_FACTOR);
    Duration::from_millis((delay_ms + jitter) as u64)
}
