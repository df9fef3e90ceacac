//! HubSpot CRM v3 object shapes.
//!
//! Engagement sub-kinds are separate HubSpot objects (`calls`, `meetings`,
//! `emails`) with their own property names; the discriminator is implied by
//! the object type and restored from the sub-kind on the way back.

use serde_json::Value;
use unison_core::{EngagementType, ObjectKind, Provider};

use crate::error::{ConnectorError, ConnectorResult};
use crate::mapping::{apply_from_remote, apply_to_remote, Conversion, FieldRule};
use crate::traits::ObjectMapper;
use crate::types::FieldMap;

const CONTAINER: &str = "properties";

const CALL_RULES: &[FieldRule] = &[
    FieldRule::plain("content", "properties.hs_call_body"),
    FieldRule::plain("subject", "properties.hs_call_title"),
    FieldRule::plain("direction", "properties.hs_call_direction"),
    FieldRule::new("start_at", "properties.hs_timestamp", Conversion::EpochMillis),
    FieldRule::new("end_time", "properties.hs_call_end_time", Conversion::EpochMillis),
    FieldRule::new("user_id", "properties.hubspot_owner_id", Conversion::Text),
    FieldRule::new("company_id", "associations.companies", Conversion::Singleton),
    FieldRule::new("contacts", "associations.contacts", Conversion::TextList),
];

const MEETING_RULES: &[FieldRule] = &[
    FieldRule::plain("content", "properties.hs_meeting_body"),
    FieldRule::plain("subject", "properties.hs_meeting_title"),
    FieldRule::new("start_at", "properties.hs_meeting_start_time", Conversion::EpochMillis),
    FieldRule::new("end_time", "properties.hs_meeting_end_time", Conversion::EpochMillis),
    FieldRule::new("user_id", "properties.hubspot_owner_id", Conversion::Text),
    FieldRule::new("company_id", "associations.companies", Conversion::Singleton),
    FieldRule::new("contacts", "associations.contacts", Conversion::TextList),
];

const EMAIL_RULES: &[FieldRule] = &[
    FieldRule::plain("content", "properties.hs_email_text"),
    FieldRule::plain("subject", "properties.hs_email_subject"),
    FieldRule::plain("direction", "properties.hs_email_direction"),
    FieldRule::new("start_at", "properties.hs_timestamp", Conversion::EpochMillis),
    FieldRule::new("user_id", "properties.hubspot_owner_id", Conversion::Text),
    FieldRule::new("company_id", "associations.companies", Conversion::Singleton),
    FieldRule::new("contacts", "associations.contacts", Conversion::TextList),
];

const CONTACT_RULES: &[FieldRule] = &[
    FieldRule::plain("first_name", "properties.firstname"),
    FieldRule::plain("last_name", "properties.lastname"),
    FieldRule::plain("email_address", "properties.email"),
    FieldRule::plain("phone_number", "properties.phone"),
    FieldRule::new("user_id", "properties.hubspot_owner_id", Conversion::Text),
];

const COMPANY_RULES: &[FieldRule] = &[
    FieldRule::plain("name", "properties.name"),
    FieldRule::plain("industry", "properties.industry"),
    FieldRule::new("number_of_employees", "properties.numberofemployees", Conversion::Integer),
    FieldRule::new("user_id", "properties.hubspot_owner_id", Conversion::Text),
];

fn engagement_rules(sub_kind: ObjectKind) -> ConnectorResult<(EngagementType, &'static [FieldRule])> {
    match EngagementType::from_sub_kind(sub_kind) {
        Some(EngagementType::Call) => Ok((EngagementType::Call, CALL_RULES)),
        Some(EngagementType::Meeting) => Ok((EngagementType::Meeting, MEETING_RULES)),
        Some(EngagementType::Email) => Ok((EngagementType::Email, EMAIL_RULES)),
        None => Err(ConnectorError::mapping(
            Provider::Hubspot,
            sub_kind,
            "engagements must be routed to a call, meeting or email sub-kind",
        )),
    }
}

/// Calls, meetings and emails.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementMapper;

impl ObjectMapper for EngagementMapper {
    fn provider(&self) -> Provider {
        Provider::Hubspot
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Engagement
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let (_, rules) = engagement_rules(sub_kind)?;
        apply_to_remote(rules, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        let (engagement_type, rules) = engagement_rules(sub_kind)?;
        let mut fields = apply_from_remote(rules, remote)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))?;
        fields.insert("type".to_string(), Value::from(engagement_type.as_str()));
        Ok(fields)
    }

    fn custom_field_container(&self) -> Option<&'static str> {
        Some(CONTAINER)
    }
}

/// Contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactMapper;

impl ObjectMapper for ContactMapper {
    fn provider(&self) -> Provider {
        Provider::Hubspot
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Contact
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        apply_to_remote(CONTACT_RULES, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        apply_from_remote(CONTACT_RULES, remote)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))
    }

    fn custom_field_container(&self) -> Option<&'static str> {
        Some(CONTAINER)
    }
}

/// Companies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyMapper;

impl ObjectMapper for CompanyMapper {
    fn provider(&self) -> Provider {
        Provider::Hubspot
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Company
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        apply_to_remote(COMPANY_RULES, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        apply_from_remote(COMPANY_RULES, remote)
            .map_err(|e| ConnectorError::mapping(Provider::Hubspot, sub_kind, e.to_string()))
    }

    fn custom_field_container(&self) -> Option<&'static str> {
        Some(CONTAINER)
    }
}
