//! Custom field models: attribute definitions, values and entities.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_core::{AttributeId, ObjectId, ObjectKind, Provider, TenantAware, TenantId, ValueId};

/// Declared type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Boolean,
    Date,
    Json,
}

impl DataType {
    /// Get all data types.
    #[must_use]
    pub fn all() -> &'static [DataType] {
        &[
            DataType::String,
            DataType::Number,
            DataType::Boolean,
            DataType::Date,
            DataType::Json,
        ]
    }

    /// Get the string representation used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Json => "json",
        }
    }

    /// Whether a JSON value fits this type. Dates are RFC 3339 strings.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            DataType::String => value.is_string(),
            DataType::Number => value.is_number(),
            DataType::Boolean => value.is_boolean(),
            DataType::Date => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            DataType::Json => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" => Ok(DataType::String),
            "number" => Ok(DataType::Number),
            "boolean" => Ok(DataType::Boolean),
            "date" => Ok(DataType::Date),
            "json" => Ok(DataType::Json),
            _ => Err(ParseDataTypeError(s.to_string())),
        }
    }
}

/// Error parsing a data type from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDataTypeError(String);

impl fmt::Display for ParseDataTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown data type '{}'", self.0)
    }
}

impl std::error::Error for ParseDataTypeError {}

/// A tenant-defined canonical field.
///
/// The slug is unique per `(tenant_id, object_kind)`. `object_kind` is
/// always a base kind so engagement sub-kinds share their fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub tenant_id: TenantId,
    pub object_kind: ObjectKind,
    pub slug: String,
    pub data_type: DataType,
    /// Provider-side property name, per provider.
    pub remote_keys: BTreeMap<Provider, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attribute {
    /// Remote key for `provider`, if mapped.
    #[must_use]
    pub fn remote_key(&self, provider: Provider) -> Option<&str> {
        self.remote_keys.get(&provider).map(String::as_str)
    }
}

impl TenantAware for Attribute {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Request to store a new attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttribute {
    pub tenant_id: TenantId,
    pub object_kind: ObjectKind,
    pub slug: String,
    pub data_type: DataType,
}

/// One custom field value bound to an attribute and an owning object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: ValueId,
    pub tenant_id: TenantId,
    pub attribute_id: AttributeId,
    pub owner_id: ObjectId,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantAware for AttributeValue {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// An object that carries custom field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub owner_id: ObjectId,
    pub tenant_id: TenantId,
    pub object_kind: ObjectKind,
    pub created_at: DateTime<Utc>,
}
