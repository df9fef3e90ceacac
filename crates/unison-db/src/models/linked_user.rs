//! Linked user model.
//!
//! A linked user is the tenant every canonical object, attribute and event
//! is scoped to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unison_core::{ProjectId, TenantAware, TenantId};

/// An end user of a project whose CRM accounts are linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedUser {
    pub id: TenantId,
    /// Project whose webhook endpoints receive this user's events.
    pub project_id: ProjectId,
    /// Caller-side identifier of the user, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LinkedUser {
    /// Create a linked user with a fresh id.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            id: TenantId::new(),
            project_id,
            origin_user_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_origin_user_id(mut self, origin_user_id: impl Into<String>) -> Self {
        self.origin_user_id = Some(origin_user_id.into());
        self
    }
}

impl TenantAware for LinkedUser {
    fn tenant_id(&self) -> TenantId {
        self.id
    }
}
