//! Zoho CRM v2 record shapes.
//!
//! Requests and responses wrap records in `{"data": [...]}`. Create
//! responses only echo `details.id`, so the remote id falls back to it.

use serde_json::{json, Value};
use unison_core::{EngagementType, ObjectKind, Provider};

use crate::error::{ConnectorError, ConnectorResult};
use crate::mapping::{
    apply_from_remote, apply_to_remote, get_path, id_text, unwrap_envelope, Conversion, FieldRule,
};
use crate::traits::ObjectMapper;
use crate::types::FieldMap;

const ENVELOPE: &str = "data";

const CALL_RULES: &[FieldRule] = &[
    FieldRule::plain("subject", "Subject"),
    FieldRule::plain("content", "Description"),
    FieldRule::new("direction", "Call_Type", Conversion::TitleCase),
    FieldRule::plain("start_at", "Call_Start_Time"),
    FieldRule::plain("end_time", "Call_End_Time"),
    FieldRule::new("user_id", "Owner", Conversion::Wrapped("id")),
    FieldRule::new("company_id", "What_Id", Conversion::Wrapped("id")),
    FieldRule::new("contacts", "Participants", Conversion::WrappedList("participant")),
];

const MEETING_RULES: &[FieldRule] = &[
    FieldRule::plain("subject", "Event_Title"),
    FieldRule::plain("content", "Description"),
    FieldRule::plain("start_at", "Start_DateTime"),
    FieldRule::plain("end_time", "End_DateTime"),
    FieldRule::new("user_id", "Owner", Conversion::Wrapped("id")),
    FieldRule::new("company_id", "What_Id", Conversion::Wrapped("id")),
    FieldRule::new("contacts", "Participants", Conversion::WrappedList("participant")),
];

const EMAIL_RULES: &[FieldRule] = &[
    FieldRule::plain("subject", "Subject"),
    FieldRule::plain("content", "Content"),
    FieldRule::plain("start_at", "Sent_Time"),
    FieldRule::new("user_id", "Owner", Conversion::Wrapped("id")),
    FieldRule::new("company_id", "What_Id", Conversion::Wrapped("id")),
    FieldRule::new("contacts", "Participants", Conversion::WrappedList("participant")),
];

const COMPANY_RULES: &[FieldRule] = &[
    FieldRule::plain("name", "Account_Name"),
    FieldRule::plain("industry", "Industry"),
    FieldRule::new("number_of_employees", "Employees", Conversion::Integer),
    FieldRule::new("user_id", "Owner", Conversion::Wrapped("id")),
];

fn envelope(record: Value) -> Value {
    json!({ "data": [record] })
}

fn first_record_mut(remote: &mut Value) -> &mut Value {
    let wrapped = matches!(remote.get(ENVELOPE), Some(Value::Array(items)) if !items.is_empty());
    if wrapped {
        &mut remote[ENVELOPE][0]
    } else {
        remote
    }
}

fn zoho_remote_id(record: &Value) -> Option<String> {
    record
        .get("id")
        .and_then(id_text)
        .or_else(|| get_path(record, "details.id").and_then(id_text))
}

/// Calls, events (meetings) and emails.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementMapper;

impl EngagementMapper {
    fn rules(sub_kind: ObjectKind) -> ConnectorResult<(EngagementType, &'static [FieldRule])> {
        match EngagementType::from_sub_kind(sub_kind) {
            Some(EngagementType::Call) => Ok((EngagementType::Call, CALL_RULES)),
            Some(EngagementType::Meeting) => Ok((EngagementType::Meeting, MEETING_RULES)),
            Some(EngagementType::Email) => Ok((EngagementType::Email, EMAIL_RULES)),
            None => Err(ConnectorError::mapping(
                Provider::Zoho,
                sub_kind,
                "engagements must be routed to a call, meeting or email sub-kind",
            )),
        }
    }
}

impl ObjectMapper for EngagementMapper {
    fn provider(&self) -> Provider {
        Provider::Zoho
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Engagement
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let (_, rules) = Self::rules(sub_kind)?;
        apply_to_remote(rules, canonical)
            .map(envelope)
            .map_err(|e| ConnectorError::mapping(Provider::Zoho, sub_kind, e.to_string()))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        let (engagement_type, rules) = Self::rules(sub_kind)?;
        let mut fields = apply_from_remote(rules, self.record(remote))
            .map_err(|e| ConnectorError::mapping(Provider::Zoho, sub_kind, e.to_string()))?;
        fields.insert("type".to_string(), Value::from(engagement_type.as_str()));
        Ok(fields)
    }

    fn remote_id(&self, remote: &Value) -> Option<String> {
        zoho_remote_id(self.record(remote))
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        first_record_mut(remote)
    }
}

/// Accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyMapper;

impl ObjectMapper for CompanyMapper {
    fn provider(&self) -> Provider {
        Provider::Zoho
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Company
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        apply_to_remote(COMPANY_RULES, canonical)
            .map(envelope)
            .map_err(|e| ConnectorError::mapping(Provider::Zoho, sub_kind, e.to_string()))
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        apply_from_remote(COMPANY_RULES, self.record(remote))
            .map_err(|e| ConnectorError::mapping(Provider::Zoho, sub_kind, e.to_string()))
    }

    fn remote_id(&self, remote: &Value) -> Option<String> {
        zoho_remote_id(self.record(remote))
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        first_record_mut(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_is_wrapped_in_data_envelope() {
        let canonical = json!({"subject": "Follow up", "direction": "INBOUND", "user_id": "u-1"});
        let remote = EngagementMapper
            .to_remote(canonical.as_object().unwrap(), ObjectKind::EngagementCall)
            .unwrap();
        assert_eq!(
            remote,
            json!({"data": [{"Subject": "Follow up", "Call_Type": "Inbound", "Owner": {"id": "u-1"}}]})
        );
    }

    #[test]
    fn test_remote_id_from_create_details() {
        let response = json!({"data": [{"code": "SUCCESS", "details": {"id": "4150868000000624001"}}]});
        assert_eq!(
            EngagementMapper.remote_id(&response).as_deref(),
            Some("4150868000000624001")
        );
    }

    #[test]
    fn test_record_mut_targets_first_record() {
        let mut payload = json!({"data": [{"Subject": "x"}]});
        EngagementMapper.record_mut(&mut payload)["Priority"] = json!("high");
        assert_eq!(payload["data"][0]["Priority"], "high");

        let mut bare = json!({"Subject": "x"});
        EngagementMapper.record_mut(&mut bare)["Priority"] = json!("low");
        assert_eq!(bare["Priority"], "low");
    }
}
