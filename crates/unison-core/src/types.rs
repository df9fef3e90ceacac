//! Provider and object-kind enumerations.
//!
//! Both sets are closed at compile time. Providers are parsed from their
//! lowercase string id; an unknown id is a [`ParseProviderError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FieldViolation;

/// Third-party CRM/ticketing platform an object is synchronised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// HubSpot CRM
    Hubspot,
    /// Zoho CRM
    Zoho,
    /// Pipedrive
    Pipedrive,
    /// Zendesk Sell
    Zendesk,
    /// Freshsales
    Freshsales,
}

impl Provider {
    /// Get all known providers.
    #[must_use]
    pub fn all() -> &'static [Provider] {
        &[
            Provider::Hubspot,
            Provider::Zoho,
            Provider::Pipedrive,
            Provider::Zendesk,
            Provider::Freshsales,
        ]
    }

    /// Get the string id used in storage and events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hubspot => "hubspot",
            Provider::Zoho => "zoho",
            Provider::Pipedrive => "pipedrive",
            Provider::Zendesk => "zendesk",
            Provider::Freshsales => "freshsales",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hubspot" => Ok(Provider::Hubspot),
            "zoho" => Ok(Provider::Zoho),
            "pipedrive" => Ok(Provider::Pipedrive),
            "zendesk" => Ok(Provider::Zendesk),
            "freshsales" => Ok(Provider::Freshsales),
            _ => Err(ParseProviderError(s.to_string())),
        }
    }
}

/// Error parsing a provider id from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProviderError(String);

impl ParseProviderError {
    /// The rejected provider id.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParseProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider '{}'", self.0)
    }
}

impl std::error::Error for ParseProviderError {}

/// Kind of canonical object.
///
/// Engagements fan out into call, meeting and email sub-kinds. A sub-kind
/// shares its mapper and custom fields with its base kind but is stored
/// and reconciled under its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Engagement,
    EngagementCall,
    EngagementMeeting,
    EngagementEmail,
    Contact,
    Company,
}

impl ObjectKind {
    /// Get all object kinds.
    #[must_use]
    pub fn all() -> &'static [ObjectKind] {
        &[
            ObjectKind::Engagement,
            ObjectKind::EngagementCall,
            ObjectKind::EngagementMeeting,
            ObjectKind::EngagementEmail,
            ObjectKind::Contact,
            ObjectKind::Company,
        ]
    }

    /// Get the string representation used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Engagement => "engagement",
            ObjectKind::EngagementCall => "engagement_call",
            ObjectKind::EngagementMeeting => "engagement_meeting",
            ObjectKind::EngagementEmail => "engagement_email",
            ObjectKind::Contact => "contact",
            ObjectKind::Company => "company",
        }
    }

    /// The kind custom fields and mappers are registered under.
    #[must_use]
    pub fn base(&self) -> ObjectKind {
        match self {
            ObjectKind::Engagement
            | ObjectKind::EngagementCall
            | ObjectKind::EngagementMeeting
            | ObjectKind::EngagementEmail => ObjectKind::Engagement,
            ObjectKind::Contact => ObjectKind::Contact,
            ObjectKind::Company => ObjectKind::Company,
        }
    }

    /// Whether this kind is a routed sub-kind of another kind.
    #[must_use]
    pub fn is_sub_kind(&self) -> bool {
        self.base() != *self
    }

    /// All kinds stored under this kind, including sub-kinds.
    #[must_use]
    pub fn family(&self) -> &'static [ObjectKind] {
        match self {
            ObjectKind::Engagement => &[
                ObjectKind::Engagement,
                ObjectKind::EngagementCall,
                ObjectKind::EngagementMeeting,
                ObjectKind::EngagementEmail,
            ],
            ObjectKind::EngagementCall => &[ObjectKind::EngagementCall],
            ObjectKind::EngagementMeeting => &[ObjectKind::EngagementMeeting],
            ObjectKind::EngagementEmail => &[ObjectKind::EngagementEmail],
            ObjectKind::Contact => &[ObjectKind::Contact],
            ObjectKind::Company => &[ObjectKind::Company],
        }
    }

    /// Whether an object stored under `other` belongs to this kind.
    #[must_use]
    pub fn includes(&self, other: ObjectKind) -> bool {
        self.family().contains(&other)
    }

    /// Product vertical the kind belongs to.
    #[must_use]
    pub fn vertical(&self) -> &'static str {
        "crm"
    }

    /// Prefix for event and webhook type tags, e.g. `crm.engagement`.
    #[must_use]
    pub fn event_prefix(&self) -> String {
        format!("{}.{}", self.vertical(), self.base().as_str())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = ParseObjectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "engagement" => Ok(ObjectKind::Engagement),
            "engagement_call" => Ok(ObjectKind::EngagementCall),
            "engagement_meeting" => Ok(ObjectKind::EngagementMeeting),
            "engagement_email" => Ok(ObjectKind::EngagementEmail),
            "contact" => Ok(ObjectKind::Contact),
            "company" => Ok(ObjectKind::Company),
            _ => Err(ParseObjectKindError(s.to_string())),
        }
    }
}

/// Error parsing an object kind from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseObjectKindError(String);

impl fmt::Display for ParseObjectKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown object kind '{}'", self.0)
    }
}

impl std::error::Error for ParseObjectKindError {}

/// Discriminator of an engagement (`type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngagementType {
    Call,
    Meeting,
    Email,
}

impl EngagementType {
    /// Allowed discriminator values.
    #[must_use]
    pub fn all() -> &'static [EngagementType] {
        &[
            EngagementType::Call,
            EngagementType::Meeting,
            EngagementType::Email,
        ]
    }

    /// Canonical uppercase representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::Call => "CALL",
            EngagementType::Meeting => "MEETING",
            EngagementType::Email => "EMAIL",
        }
    }

    /// Sub-kind a canonical engagement of this type is stored under.
    #[must_use]
    pub fn sub_kind(&self) -> ObjectKind {
        match self {
            EngagementType::Call => ObjectKind::EngagementCall,
            EngagementType::Meeting => ObjectKind::EngagementMeeting,
            EngagementType::Email => ObjectKind::EngagementEmail,
        }
    }

    /// Inverse of [`EngagementType::sub_kind`].
    #[must_use]
    pub fn from_sub_kind(kind: ObjectKind) -> Option<EngagementType> {
        match kind {
            ObjectKind::EngagementCall => Some(EngagementType::Call),
            ObjectKind::EngagementMeeting => Some(EngagementType::Meeting),
            ObjectKind::EngagementEmail => Some(EngagementType::Email),
            _ => None,
        }
    }

    /// Route a raw discriminator to a type.
    ///
    /// `CALL` and `MEETING` (any case) route to their own type, any other
    /// non-empty value routes to [`EngagementType::Email`]. A missing or
    /// blank value is rejected.
    pub fn route(discriminator: Option<&str>) -> Result<EngagementType, FieldViolation> {
        let raw = discriminator.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(FieldViolation::new("type", "engagement type is required"));
        }
        Ok(match raw.to_uppercase().as_str() {
            "CALL" => EngagementType::Call,
            "MEETING" => EngagementType::Meeting,
            _ => EngagementType::Email,
        })
    }
}

impl fmt::Display for EngagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EngagementType {
    type Err = FieldViolation;

    /// Strict parse against the fixed enumeration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CALL" => Ok(EngagementType::Call),
            "MEETING" => Ok(EngagementType::Meeting),
            "EMAIL" => Ok(EngagementType::Email),
            _ => Err(FieldViolation::new(
                "type",
                format!("'{s}' is not one of CALL, MEETING, EMAIL"),
            )),
        }
    }
}
