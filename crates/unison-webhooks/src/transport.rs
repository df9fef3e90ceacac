//! HTTP delivery of webhook payloads.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::Client;

use crate::crypto;
use crate::error::{WebhookError, WebhookResult};
use crate::models::{WebhookEndpoint, WebhookPayload};

/// Response bodies are kept for logging up to this many characters.
const MAX_LOGGED_BODY_CHARS: usize = 4096;

/// Sends one payload to one endpoint. One call is one attempt.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn deliver(&self, endpoint: &WebhookEndpoint, payload: &WebhookPayload) -> WebhookResult<()>;
}

/// Delivers payloads as signed JSON `POST` requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> WebhookResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("unison-webhooks/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http_client, timeout })
    }

    fn headers(endpoint: &WebhookEndpoint, payload: &WebhookPayload, body: &[u8]) -> WebhookResult<HeaderMap> {
        let timestamp = Utc::now().timestamp().to_string();

        let mut headers = HeaderMap::new();
        if let Ok(v) = "application/json".parse() {
            headers.insert("Content-Type", v);
        }
        if let Ok(v) = timestamp.parse() {
            headers.insert("X-Webhook-Timestamp", v);
        }
        if let Ok(v) = payload.id.to_string().parse() {
            headers.insert("X-Event-ID", v);
        }
        if let Ok(v) = payload.event_type.parse() {
            headers.insert("X-Event-Type", v);
        }

        if let Some(secret) = &endpoint.secret {
            let signature = crypto::compute_hmac_signature(secret, &timestamp, body)?;
            if let Ok(v) = format!("sha256={signature}").parse() {
                headers.insert("X-Webhook-Signature", v);
            }
        }

        Ok(headers)
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn deliver(&self, endpoint: &WebhookEndpoint, payload: &WebhookPayload) -> WebhookResult<()> {
        let body = serde_json::to_vec(payload)?;
        let headers = Self::headers(endpoint, payload, &body)?;

        let start = Instant::now();
        let result = self
            .http_client
            .post(&endpoint.url)
            .headers(headers)
            .body(body)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_LOGGED_BODY_CHARS)
                    .collect::<String>();

                if (200..300).contains(&status) {
                    tracing::debug!(
                        target: "webhook_delivery",
                        payload_id = %payload.id,
                        url = %endpoint.url,
                        status,
                        latency_ms,
                        "Webhook delivered"
                    );
                    Ok(())
                } else {
                    tracing::debug!(
                        target: "webhook_delivery",
                        payload_id = %payload.id,
                        url = %endpoint.url,
                        status,
                        latency_ms,
                        response_body = %body,
                        "Webhook endpoint rejected delivery"
                    );
                    Err(WebhookError::Rejected { status })
                }
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("Request timeout ({}ms)", self.timeout.as_millis())
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else {
                    format!("Request error: {e}")
                };
                Err(WebhookError::Transport(message))
            }
        }
    }
}
