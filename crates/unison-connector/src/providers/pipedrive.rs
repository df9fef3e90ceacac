//! Pipedrive v1 shapes.
//!
//! Engagements are activities discriminated by a lowercase `type`. The
//! start timestamp is split into `due_date` and `due_time` (minute
//! precision, UTC). Responses are wrapped in `{"success": .., "data": {..}}`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use unison_core::{EngagementType, ObjectKind, Provider};

use crate::error::{ConnectorError, ConnectorResult};
use crate::mapping::{apply_from_remote, apply_to_remote, unwrap_envelope, Conversion, FieldRule};
use crate::traits::ObjectMapper;
use crate::types::FieldMap;

const ENVELOPE: &str = "data";

const ACTIVITY_RULES: &[FieldRule] = &[
    FieldRule::plain("subject", "subject"),
    FieldRule::plain("content", "note"),
    FieldRule::new("user_id", "user_id", Conversion::Text),
    FieldRule::new("company_id", "org_id", Conversion::Text),
    FieldRule::new("contacts", "participants", Conversion::WrappedList("person_id")),
];

const PERSON_RULES: &[FieldRule] = &[
    FieldRule::plain("first_name", "first_name"),
    FieldRule::plain("last_name", "last_name"),
    FieldRule::new("user_id", "owner_id", Conversion::Text),
];

fn record_mut(remote: &mut Value) -> &mut Value {
    if matches!(remote.get(ENVELOPE), Some(Value::Object(_))) {
        &mut remote[ENVELOPE]
    } else {
        remote
    }
}

fn split_due(start_at: &Value) -> Result<(String, String), String> {
    let raw = start_at.as_str().ok_or("expected an RFC 3339 timestamp string")?;
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| e.to_string())?
        .with_timezone(&Utc);
    Ok((
        parsed.format("%Y-%m-%d").to_string(),
        parsed.format("%H:%M").to_string(),
    ))
}

fn join_due(record: &Value) -> Result<Option<String>, String> {
    let Some(date) = record.get("due_date").and_then(Value::as_str).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let time = record
        .get("due_time")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("00:00");
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
        .map_err(|e| format!("invalid due date '{date} {time}': {e}"))?;
    Ok(Some(
        naive.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

/// Activities of type call, meeting or email.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementMapper;

impl ObjectMapper for EngagementMapper {
    fn provider(&self) -> Provider {
        Provider::Pipedrive
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Engagement
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let fail = |message: String| ConnectorError::mapping(Provider::Pipedrive, sub_kind, message);
        let engagement_type = EngagementType::from_sub_kind(sub_kind)
            .ok_or_else(|| fail("engagement sub-kind required".to_string()))?;

        let mut record =
            apply_to_remote(ACTIVITY_RULES, canonical).map_err(|e| fail(e.to_string()))?;
        record["type"] = Value::from(engagement_type.as_str().to_lowercase());
        if let Some(start_at) = canonical.get("start_at").filter(|v| !v.is_null()) {
            let (date, time) = split_due(start_at).map_err(fail)?;
            record["due_date"] = Value::from(date);
            record["due_time"] = Value::from(time);
        }
        Ok(record)
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        let fail = |message: String| ConnectorError::mapping(Provider::Pipedrive, sub_kind, message);
        let engagement_type = EngagementType::from_sub_kind(sub_kind)
            .ok_or_else(|| fail("engagement sub-kind required".to_string()))?;

        let record = self.record(remote);
        let mut fields = apply_from_remote(ACTIVITY_RULES, record).map_err(|e| fail(e.to_string()))?;
        if let Some(start_at) = join_due(record).map_err(fail)? {
            fields.insert("start_at".to_string(), Value::from(start_at));
        }
        fields.insert("type".to_string(), Value::from(engagement_type.as_str()));
        Ok(fields)
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        record_mut(remote)
    }
}

/// Persons.
///
/// Pipedrive stores emails and phones as labelled lists; only the primary
/// entry is mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactMapper;

impl ContactMapper {
    fn primary(record: &Value, key: &str) -> Option<Value> {
        let entries = record.get(key)?.as_array()?;
        entries
            .iter()
            .find(|e| e.get("primary").and_then(Value::as_bool) == Some(true))
            .or_else(|| entries.first())
            .and_then(|e| e.get("value"))
            .filter(|v| !v.is_null())
            .cloned()
    }
}

impl ObjectMapper for ContactMapper {
    fn provider(&self) -> Provider {
        Provider::Pipedrive
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Contact
    }

    fn to_remote(&self, canonical: &FieldMap, sub_kind: ObjectKind) -> ConnectorResult<Value> {
        let mut record = apply_to_remote(PERSON_RULES, canonical)
            .map_err(|e| ConnectorError::mapping(Provider::Pipedrive, sub_kind, e.to_string()))?;
        for (field, key) in [("email_address", "email"), ("phone_number", "phone")] {
            if let Some(value) = canonical.get(field).filter(|v| !v.is_null()) {
                record[key] = json!([{ "value": value, "primary": true }]);
            }
        }
        Ok(record)
    }

    fn from_remote(&self, remote: &Value, sub_kind: ObjectKind) -> ConnectorResult<FieldMap> {
        let record = self.record(remote);
        let mut fields = apply_from_remote(PERSON_RULES, record)
            .map_err(|e| ConnectorError::mapping(Provider::Pipedrive, sub_kind, e.to_string()))?;
        for (field, key) in [("email_address", "email"), ("phone_number", "phone")] {
            if let Some(value) = Self::primary(record, key) {
                fields.insert(field.to_string(), value);
            }
        }
        Ok(fields)
    }

    fn record<'a>(&self, remote: &'a Value) -> &'a Value {
        unwrap_envelope(remote, ENVELOPE)
    }

    fn record_mut<'a>(&self, remote: &'a mut Value) -> &'a mut Value {
        record_mut(remote)
    }
}
