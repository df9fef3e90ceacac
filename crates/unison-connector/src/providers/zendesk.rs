//! Zendesk Sell shapes.
//!
//! Bodies are wrapped in `{"data": {...}}` both ways and tenant-defined
//! properties live under `custom_fields`. A company relation is expressed
//! as a polymorphic `resource_type`/`resource_id` pair.

use serde_json::{json, Value};
use unison_core::{EngagementType, ObjectKind, Provider};

use crate::error::{ConnectorError, ConnectorResult};
use crate::mapping::{
    apply_from_remote, apply_to_remote, id_text, unwrap_envelope, Conversion, FieldRule,
};
use crate::traits::ObjectMapper;
use crate::types::FieldMap;

const ENVELOPE: &str = "data";
const CONTAINER: &str = "custom_fields";
const COMPANY_RESOURCE: &str = "company";

const ENGAGEMENT_RULES: &[FieldRule] = &[
    FieldRule::plain("content", "summary"),
    FieldRule::plain("subject", "subject"),
    FieldRule::new(
        "direction",
        "incoming",
        Conversion::Flag {
            when_true: "INBOUND",
            when_false: "OUTBOUND",
        },
    ),
    FieldRule::plain("start_at", "made_at"),
    FieldRule::plain("end_time", "ended_at"),
    FieldRule::new("user_id", "owner_id", Conversion::Text),
    FieldRule::new("contacts", "contact_ids", Conversion::TextList),
];

const CONTACT_RULES: &[FieldRule] = &[
    FieldRule::plain("first_name", "first_name"),
    FieldRule::plain("last_name", "last_name"),
    FieldRule::plain("email_address", "email"),
    FieldRule::plain("phone_number", "phone"),
    FieldRule::new("user_id", "owner_id", Conversion::Text),
];

fn envelope(record: Value) -> Value {
    json!({ "data": record })
}

fn data_record_mut(remote: &mut Value) -> &mut Value {
    if matches!(remote.get(ENVELOPE), Some(Value::Object(_))) {
        &mut remote[ENVELOPE]
    } else {
        remote
    }
}

/// Calls, appointments and emails.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementMapper;

impl ObjectMapper for EngagementMapper {
    fn provider(&self) -> Provider {
        Provider::Zendesk
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Engagement
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let engagement_type = EngagementType::from_sub_kind(sub_kind).ok_or_else(|| {
            ConnectorError::mapping(Provider::Zendesk, sub_kind, "engagement sub-kind required")
        })?;
        let mut record = apply_to_remote(ENGAGEMENT_RULES, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Zendesk, sub_kind, e.to_string()))?;

        record["activity_type"] = Value::from(engagement_type.as_str().to_lowercase());
        if let Some(company_id) = canonical.get("company_id").filter(|v| !v.is_null()) {
            record["resource_type"] = Value::from(COMPANY_RESOURCE);
            record["resource_id"] = company_id.clone();
        }
        Ok(envelope(record))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        let engagement_type = EngagementType::from_sub_kind(sub_kind).ok_or_else(|| {
            ConnectorError::mapping(Provider::Zendesk, sub_kind, "engagement sub-kind required")
        })?;
        let record = self.record(remote);
        let mut fields = apply_from_remote(ENGAGEMENT_RULES, record)
            .map_err(|e| ConnectorError::mapping(Provider::Zendesk, sub_kind, e.to_string()))?;

        if record.get("resource_type").and_then(Value::as_str) == Some(COMPANY_RESOURCE) {
            if let Some(id) = record.get("resource_id").and_then(id_text) {
                fields.insert("company_id".to_string(), Value::String(id));
            }
        }
        fields.insert("type".to_string(), Value::from(engagement_type.as_str()));
        Ok(fields)
    }

    fn custom_field_container(&self) -> Option<&'static str> {
        Some(CONTAINER)
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        data_record_mut(remote)
    }
}

/// Contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactMapper;

impl ObjectMapper for ContactMapper {
    fn provider(&self) -> Provider {
        Provider::Zendesk
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Contact
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let mut record = apply_to_remote(CONTACT_RULES, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Zendesk, sub_kind, e.to_string()))?;
        record["is_organization"] = Value::Bool(false);
        Ok(envelope(record))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        apply_from_remote(CONTACT_RULES, self.record(remote))
            .map_err(|e| ConnectorError::mapping(Provider::Zendesk, sub_kind, e.to_string()))
    }

    fn custom_field_container(&self) -> Option<&'static str> {
        Some(CONTAINER)
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        data_record_mut(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_becomes_polymorphic_resource() {
        let canonical = json!({"subject": "Demo", "company_id": "88", "direction": "OUTBOUND"});
        let remote = EngagementMapper
            .to_remote(canonical.as_object().unwrap(), ObjectKind::EngagementMeeting)
            .unwrap();
        assert_eq!(remote["data"]["resource_type"], "company");
        assert_eq!(remote["data"]["resource_id"], "88");
        assert_eq!(remote["data"]["incoming"], false);
        assert_eq!(remote["data"]["activity_type"], "meeting");

        let back = EngagementMapper
            .from_remote(&remote, ObjectKind::EngagementMeeting)
            .unwrap();
        assert_eq!(back["company_id"], "88");
        assert_eq!(back["type"], "MEETING");
    }

    #[test]
    fn test_contact_resource_is_not_a_company() {
        let remote = json!({"data": {"id": 5, "resource_type": "contact", "resource_id": 12}});
        let back = EngagementMapper
            .from_remote(&remote, ObjectKind::EngagementCall)
            .unwrap();
        assert!(back.get("company_id").is_none());
        assert_eq!(EngagementMapper.remote_id(&remote).as_deref(), Some("5"));
    }
}
