//! Canonical resource models.
//!
//! Each model lists the well-known fields of one canonical object kind.
//! Every field is optional so a partial provider response unifies into a
//! sparse value, and absent fields serialize to nothing rather than null.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unison_connector::mapping::strip_nulls;
use unison_connector::FieldMap;
use unison_core::{EngagementType, FieldViolation, ObjectId, ObjectKind};

/// A canonical field that holds ids of other canonical objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Canonical field name.
    pub field: &'static str,
    /// Kind the referenced objects must be stored under (any sub-kind).
    pub kind: ObjectKind,
    /// Whether the field is a list of ids.
    pub many: bool,
}

/// One relation id found on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub relation: Relation,
    pub id: String,
}

/// A canonical resource the sync engine can process.
pub trait UnifiedResource:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + std::fmt::Debug + 'static
{
    /// Base kind the resource is registered under.
    const KIND: ObjectKind;

    /// Kind this instance is stored under.
    ///
    /// Resources without sub-kinds return [`UnifiedResource::KIND`].
    fn sub_kind(&self) -> Result<ObjectKind, FieldViolation> {
        Ok(Self::KIND)
    }

    /// Relation fields of this resource.
    fn relations() -> &'static [Relation] {
        &[]
    }

    /// Structural checks that need no storage access.
    fn validate(&self) -> Vec<FieldViolation> {
        Vec::new()
    }

    /// Well-known fields as a map, without nulls.
    fn to_fields(&self) -> serde_json::Result<FieldMap> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(strip_nulls(map)),
            _ => Ok(FieldMap::new()),
        }
    }

    /// Rebuild the resource from a field map.
    fn from_fields(fields: FieldMap) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(fields))
    }

    /// Relation ids present on this instance.
    fn references(&self) -> Vec<Reference> {
        let Ok(fields) = self.to_fields() else {
            return Vec::new();
        };
        let mut references = Vec::new();
        for relation in Self::relations() {
            match fields.get(relation.field) {
                Some(Value::String(id)) => references.push(Reference {
                    relation: *relation,
                    id: id.clone(),
                }),
                Some(Value::Array(ids)) => references.extend(ids.iter().filter_map(|id| {
                    id.as_str().map(|id| Reference {
                        relation: *relation,
                        id: id.to_string(),
                    })
                })),
                _ => {}
            }
        }
        references
    }
}

/// Violations for relation ids that are not well-formed object ids.
fn malformed_references<R: UnifiedResource>(resource: &R) -> Vec<FieldViolation> {
    resource
        .references()
        .into_iter()
        .filter(|r| r.id.parse::<ObjectId>().is_err())
        .map(|r| FieldViolation::new(r.relation.field, format!("'{}' is not a valid id", r.id)))
        .collect()
}

/// A call, meeting or email logged against CRM records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Discriminator: `CALL`, `MEETING` or `EMAIL`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub engagement_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<String>>,
    /// Provider-side owner of the engagement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

const ENGAGEMENT_RELATIONS: &[Relation] = &[
    Relation {
        field: "company_id",
        kind: ObjectKind::Company,
        many: false,
    },
    Relation {
        field: "contacts",
        kind: ObjectKind::Contact,
        many: true,
    },
];

impl UnifiedResource for Engagement {
    const KIND: ObjectKind = ObjectKind::Engagement;

    fn sub_kind(&self) -> Result<ObjectKind, FieldViolation> {
        EngagementType::route(self.engagement_type.as_deref()).map(|t| t.sub_kind())
    }

    fn relations() -> &'static [Relation] {
        ENGAGEMENT_RELATIONS
    }

    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        match self.engagement_type.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push(FieldViolation::new("type", "engagement type is required"));
            }
            Some(raw) => {
                if let Err(violation) = raw.parse::<EngagementType>() {
                    violations.push(violation);
                }
            }
        }
        if let (Some(start), Some(end)) = (self.start_at, self.end_time) {
            if end < start {
                violations.push(FieldViolation::new("end_time", "must not be before start_at"));
            }
        }
        violations.extend(malformed_references(self));
        violations
    }
}

/// A person in the CRM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl UnifiedResource for Contact {
    const KIND: ObjectKind = ObjectKind::Contact;

    fn validate(&self) -> Vec<FieldViolation> {
        match self.email_address.as_deref() {
            Some(email) if !email.contains('@') => vec![FieldViolation::new(
                "email_address",
                format!("'{email}' is not an email address"),
            )],
            _ => Vec::new(),
        }
    }
}

/// An organisation in the CRM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_employees: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl UnifiedResource for Company {
    const KIND: ObjectKind = ObjectKind::Company;

    fn validate(&self) -> Vec<FieldViolation> {
        match self.number_of_employees {
            Some(n) if n < 0 => vec![FieldViolation::new(
                "number_of_employees",
                "must not be negative",
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engagement(value: Value) -> Engagement {
        serde_json::from_value(value).unwrap()
    }

    mod routing_tests {
        use super::*;

        #[test]
        fn test_discriminator_routes_to_sub_kind() {
            let cases = [
                ("CALL", ObjectKind::EngagementCall),
                ("call", ObjectKind::EngagementCall),
                ("MEETING", ObjectKind::EngagementMeeting),
                ("EMAIL", ObjectKind::EngagementEmail),
                ("sms", ObjectKind::EngagementEmail),
            ];
            for (raw, expected) in cases {
                let e = engagement(json!({"type": raw}));
                assert_eq!(e.sub_kind().unwrap(), expected, "type {raw}");
            }
        }

        #[test]
        fn test_missing_or_blank_type_is_rejected() {
            assert_eq!(Engagement::default().sub_kind().unwrap_err().field, "type");
            assert!(engagement(json!({"type": "  "})).sub_kind().is_err());
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_unknown_type_fails_strict_validation() {
            let violations = engagement(json!({"type": "sms"})).validate();
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "type");
        }

        #[test]
        fn test_all_violations_are_collected() {
            let e = engagement(json!({
                "type": "CALL",
                "company_id": "not-a-uuid",
                "contacts": [ObjectId::new().to_string(), "bad"],
                "start_at": "2024-03-01T11:00:00Z",
                "end_time": "2024-03-01T10:00:00Z"
            }));
            let fields: Vec<_> = e.validate().into_iter().map(|v| v.field).collect();
            assert_eq!(fields, vec!["end_time", "company_id", "contacts"]);
        }

        #[test]
        fn test_contact_email_shape() {
            let c = Contact {
                email_address: Some("nobody".into()),
                ..Contact::default()
            };
            assert_eq!(c.validate()[0].field, "email_address");
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn test_to_fields_omits_absent_values() {
            let e = engagement(json!({"type": "CALL", "subject": "Intro", "start_at": "2024-03-01T10:30:00Z"}));
            let fields = e.to_fields().unwrap();
            assert_eq!(
                Value::Object(fields.clone()),
                json!({"type": "CALL", "subject": "Intro", "start_at": "2024-03-01T10:30:00Z"})
            );
            assert_eq!(Engagement::from_fields(fields).unwrap(), e);
        }

        #[test]
        fn test_references_flatten_lists() {
            let company = ObjectId::new().to_string();
            let e = engagement(json!({"type": "CALL", "company_id": company, "contacts": ["a", "b"]}));
            let refs = e.references();
            assert_eq!(refs.len(), 3);
            assert_eq!(refs[0].relation.kind, ObjectKind::Company);
            assert_eq!(refs[2].id, "b");
            assert!(refs[2].relation.many);
        }
    }
}
