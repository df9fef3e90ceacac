//! # Provider Connectors
//!
//! Everything provider-specific in unison lives here: the mappers that turn
//! canonical fields into each CRM's payload shape and back, the adapters
//! that call the CRM APIs, and the registry that resolves both.
//!
//! ## Architecture
//!
//! - [`ObjectMapper`] - pure shape conversion for one (provider, kind)
//! - [`ResourceAdapter`] - remote calls for one provider
//! - [`ProviderRegistry`] / [`mapper_for`] - lookup by provider and kind
//! - [`mapping`] - declarative field rules the mappers are built from
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use unison_connector::prelude::*;
//! use unison_core::{ObjectKind, Provider};
//!
//! let mapper = mapper_for(Provider::Hubspot, ObjectKind::EngagementCall).unwrap();
//! let canonical = json!({"subject": "Renewal call"});
//! let remote = mapper
//!     .to_remote(canonical.as_object().unwrap(), ObjectKind::EngagementCall)
//!     .unwrap();
//! assert_eq!(remote["properties"]["hs_call_title"], "Renewal call");
//! ```

pub mod error;
pub mod mapping;
pub mod providers;
pub mod registry;
pub mod rest;
pub mod traits;
pub mod types;

pub use error::{ConnectorError, ConnectorResult, RemoteFailure};
pub use registry::{mapper_for, ProviderRegistry};
pub use rest::{RestAdapter, RestAdapterConfig};
pub use traits::{ObjectMapper, ResourceAdapter};
pub use types::{CustomFieldMapping, FieldMap, RemoteProperty, RemoteResult, TenantContext};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ConnectorError, ConnectorResult, RemoteFailure};
    pub use crate::registry::{mapper_for, ProviderRegistry};
    pub use crate::traits::{ObjectMapper, ResourceAdapter};
    pub use crate::types::{
        CustomFieldMapping, FieldMap, RemoteProperty, RemoteResult, TenantContext,
    };
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
