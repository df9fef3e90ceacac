//! Input, output and intermediate shapes around a canonical resource.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_core::{ObjectId, ObjectKind, Provider};

/// Custom field values keyed by attribute slug.
pub type FieldMappings = BTreeMap<String, Value>;

/// A canonical resource as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedInput<R> {
    #[serde(flatten)]
    pub resource: R,
    /// Values for tenant-defined fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_mappings: FieldMappings,
}

impl<R> UnifiedInput<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            field_mappings: FieldMappings::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, slug: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field_mappings.insert(slug.into(), value.into());
        self
    }
}

/// A stored canonical resource as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedOutput<R> {
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub remote_platform: Provider,
    #[serde(flatten)]
    pub resource: R,
    pub field_mappings: FieldMappings,
    /// Last raw provider payload, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A single value or an ordered sequence, preserved through mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map every element with its position, keeping the shape.
    ///
    /// Stops at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(usize, T) -> Result<U, E>) -> Result<OneOrMany<U>, E> {
        match self {
            OneOrMany::One(item) => f(0, item).map(OneOrMany::One),
            OneOrMany::Many(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect::<Result<Vec<_>, _>>()
                .map(OneOrMany::Many),
        }
    }

    /// Elements in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    /// The single element, or the first of a sequence.
    #[must_use]
    pub fn into_first(self) -> Option<T> {
        self.into_vec().into_iter().next()
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// Provider payload produced by desunify.
#[derive(Debug, Clone, PartialEq)]
pub struct Desunified {
    /// Routed kind the payload must be created as.
    pub kind: ObjectKind,
    pub payload: Value,
}

/// Canonical resource produced by unify from one provider payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Unified<R> {
    /// Remote id reported by the provider, if any.
    pub remote_id: Option<String>,
    pub resource: R,
    /// Custom field values found in the payload, by slug.
    pub field_mappings: FieldMappings,
}
