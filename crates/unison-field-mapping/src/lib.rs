//! # Field Mapping
//!
//! The attribute registry: tenants define canonical custom fields on an
//! object kind and map each one onto a property of every provider they sync
//! with. Values are stored entity-attribute-value style, so adding a field
//! needs no schema change.
//!
//! ```no_run
//! # async fn example(service: unison_field_mapping::FieldMappingService) -> Result<(), unison_field_mapping::FieldMappingError> {
//! use unison_core::{ObjectKind, Provider, TenantId};
//! use unison_db::DataType;
//! use unison_field_mapping::{DefineTargetField, MapFieldToProvider};
//!
//! let tenant = TenantId::new();
//! service
//!     .define_target_field(tenant, DefineTargetField::new(ObjectKind::Engagement, "priority", DataType::String))
//!     .await?;
//! service
//!     .map_field_to_provider(
//!         tenant,
//!         MapFieldToProvider::new(ObjectKind::Engagement, "priority", Provider::Zendesk, "custom_priority"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod service;

pub use error::{FieldMappingError, FieldMappingResult};
pub use models::{CustomProperty, DefineTargetField, MapFieldToProvider};
pub use service::{FieldMappingService, SlugValues};
