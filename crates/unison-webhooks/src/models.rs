//! Webhook payload and endpoint models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_core::{EventId, ProjectId};
use uuid::Uuid;

/// Body posted to webhook endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Unique id of this notification.
    pub id: Uuid,
    /// e.g. `crm.engagement.created`.
    pub event_type: String,
    pub project_id: ProjectId,
    /// Sync event recorded for the write that triggered the notification.
    pub correlation_id: EventId,
    pub timestamp: DateTime<Utc>,
    /// The canonical object.
    pub data: Value,
}

impl WebhookPayload {
    pub fn new(
        data: Value,
        event_type: impl Into<String>,
        project_id: ProjectId,
        correlation_id: EventId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            project_id,
            correlation_id,
            timestamp: Utc::now(),
            data,
        }
    }
}

/// A subscriber URL for one project.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub project_id: ProjectId,
    pub url: String,
    /// Signing secret; requests are unsigned without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Event types to receive. Empty means all; a trailing `*` matches a
    /// prefix, e.g. `crm.engagement.*`.
    #[serde(default)]
    pub event_types: Vec<String>,
}

impl std::fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookEndpoint")
            .field("project_id", &self.project_id)
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("event_types", &self.event_types)
            .finish()
    }
}

impl WebhookEndpoint {
    pub fn new(project_id: ProjectId, url: impl Into<String>) -> Self {
        Self {
            project_id,
            url: url.into(),
            secret: None,
            event_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_event_types<I, S>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = event_types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this endpoint subscribes to `event_type` for `project_id`.
    #[must_use]
    pub fn matches(&self, project_id: ProjectId, event_type: &str) -> bool {
        if self.project_id != project_id {
            return false;
        }
        self.event_types.is_empty()
            || self.event_types.iter().any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => event_type.starts_with(prefix),
                None => pattern == event_type,
            })
    }
}
