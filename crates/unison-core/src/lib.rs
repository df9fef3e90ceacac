//! unison Core Library
//!
//! Shared types and traits for the unison CRM unification engine.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (TenantId, ObjectId, AttributeId, ...)
//! - [`types`] - Closed enumerations of providers and object kinds
//! - [`traits`] - Multi-tenant traits (TenantAware)
//! - [`error`] - Shared error types (UnisonError, FieldViolation)
//! - [`config`] - Environment configuration helpers (ConfigError)
//!
//! # Example
//!
//! ```
//! use unison_core::{ObjectKind, Provider, TenantId};
//!
//! let tenant_id = TenantId::new();
//! let provider: Provider = "zendesk".parse().unwrap();
//! assert_eq!(ObjectKind::EngagementCall.base(), ObjectKind::Engagement);
//! # let _ = (tenant_id, provider);
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

pub use config::ConfigError;
pub use error::{describe_violations, FieldViolation, Result, UnisonError};
pub use ids::{AttributeId, EventId, ObjectId, ParseIdError, ProjectId, TenantId, ValueId};
pub use traits::TenantAware;
pub use types::{
    EngagementType, ObjectKind, ParseObjectKindError, ParseProviderError, Provider,
};
