//! Sync event (audit) model.
//!
//! Events are append-only: there is no update or delete.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unison_core::{EventId, ObjectKind, Provider, TenantAware, TenantId};

/// Outcome of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Fail,
}

impl EventStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Success => "success",
            EventStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(EventStatus::Success),
            "fail" => Ok(EventStatus::Fail),
            _ => Err(format!("Unknown event status: {s}")),
        }
    }
}

/// Whether data went to the provider or came from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Push,
    Pull,
}

impl SyncDirection {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pull",
        }
    }

    /// Event type suffix: `push` or `pulled`.
    #[must_use]
    pub fn event_suffix(&self) -> &'static str {
        match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pulled",
        }
    }

    /// HTTP method of the unified operation.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            SyncDirection::Push => "POST",
            SyncDirection::Pull => "GET",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" => Ok(SyncDirection::Push),
            "pull" => Ok(SyncDirection::Pull),
            _ => Err(format!("Unknown sync direction: {s}")),
        }
    }
}

/// An immutable audit record of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub id: EventId,
    pub tenant_id: TenantId,
    pub status: EventStatus,
    /// e.g. `crm.engagement.push`.
    pub event_type: String,
    pub method: String,
    pub url: String,
    pub provider: Provider,
    pub direction: SyncDirection,
    pub object_kind: ObjectKind,
    pub timestamp: DateTime<Utc>,
}

impl TenantAware for SyncEvent {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Request to append a sync event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncEvent {
    pub tenant_id: TenantId,
    pub status: EventStatus,
    pub event_type: String,
    pub method: String,
    pub url: String,
    pub provider: Provider,
    pub direction: SyncDirection,
    pub object_kind: ObjectKind,
}

impl NewSyncEvent {
    /// Event for a sync of `object_kind` in `direction`, with the event type,
    /// method and url derived from them.
    #[must_use]
    pub fn for_sync(
        tenant_id: TenantId,
        object_kind: ObjectKind,
        provider: Provider,
        direction: SyncDirection,
        status: EventStatus,
    ) -> Self {
        let prefix = object_kind.event_prefix();
        Self {
            tenant_id,
            status,
            event_type: format!("{prefix}.{}", direction.event_suffix()),
            method: direction.method().to_string(),
            url: format!("/{}", prefix.replace('.', "/")),
            provider,
            direction,
            object_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_for_push() {
        let event = NewSyncEvent::for_sync(
            TenantId::new(),
            ObjectKind::EngagementCall,
            Provider::Zendesk,
            SyncDirection::Push,
            EventStatus::Success,
        );
        assert_eq!(event.event_type, "crm.engagement.push");
        assert_eq!(event.method, "POST");
        assert_eq!(event.url, "/crm/engagement");
    }

    #[test]
    fn test_event_for_pull() {
        let event = NewSyncEvent::for_sync(
            TenantId::new(),
            ObjectKind::Contact,
            Provider::Hubspot,
            SyncDirection::Pull,
            EventStatus::Fail,
        );
        assert_eq!(event.event_type, "crm.contact.pulled");
        assert_eq!(event.method, "GET");
        assert_eq!(event.status.to_string(), "fail");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("SUCCESS".parse::<EventStatus>().unwrap(), EventStatus::Success);
        assert!("maybe".parse::<EventStatus>().is_err());
        assert_eq!("pull".parse::<SyncDirection>().unwrap(), SyncDirection::Pull);
    }
}
