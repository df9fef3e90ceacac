//! Storage models.
//!
//! Models are storage-engine neutral; the PostgreSQL store decodes its rows
//! into them.

pub mod attribute;
pub mod canonical_object;
pub mod linked_user;
pub mod sync_event;

pub use attribute::{Attribute, AttributeValue, DataType, Entity, NewAttribute, ParseDataTypeError};
pub use canonical_object::{
    CanonicalObject, Fields, ReconcileObject, Reconciled, RemoteSnapshot, SNAPSHOT_FORMAT,
};
pub use linked_user::LinkedUser;
pub use sync_event::{EventStatus, NewSyncEvent, SyncDirection, SyncEvent};
