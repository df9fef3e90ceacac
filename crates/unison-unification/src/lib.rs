//! # Unification Engine
//!
//! Canonical resource models and the two pure conversions every sync is
//! built on:
//!
//! - **desunify**: canonical input to the payload one provider expects
//! - **unify**: provider payloads back to canonical resources
//!
//! Both are parameterized by the provider, the routed object kind and the
//! tenant's custom field mappings.
//!
//! ## Example
//!
//! ```
//! use unison_connector::CustomFieldMapping;
//! use unison_core::{ObjectKind, Provider};
//! use unison_unification::{Engagement, UnificationEngine, UnifiedInput};
//!
//! let input = UnifiedInput::new(Engagement {
//!     subject: Some("Intro call".to_string()),
//!     engagement_type: Some("CALL".to_string()),
//!     ..Engagement::default()
//! })
//! .with_field("priority", "high");
//!
//! let mappings = [CustomFieldMapping::new("priority", "custom_priority")];
//! let out = UnificationEngine::new()
//!     .desunify(&input, Provider::Hubspot, &mappings)
//!     .unwrap();
//! assert_eq!(out.kind, ObjectKind::EngagementCall);
//! assert_eq!(out.payload["properties"]["custom_priority"], "high");
//! ```

pub mod engine;
pub mod error;
pub mod resource;
pub mod unified;

pub use engine::UnificationEngine;
pub use error::{UnificationError, UnificationResult};
pub use resource::{Company, Contact, Engagement, Reference, Relation, UnifiedResource};
pub use unified::{Desunified, FieldMappings, OneOrMany, Unified, UnifiedInput, UnifiedOutput};
