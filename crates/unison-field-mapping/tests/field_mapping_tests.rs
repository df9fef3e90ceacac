//! Attribute registry behavior over the in-memory store.

mod common;

use serde_json::json;
use unison_connector::{CustomFieldMapping, TenantContext};
use unison_core::{ObjectId, ObjectKind, ProjectId, Provider, TenantId};
use unison_db::DataType;
use unison_field_mapping::{DefineTargetField, FieldMappingError, MapFieldToProvider, SlugValues};

fn priority() -> DefineTargetField {
    DefineTargetField::new(ObjectKind::Engagement, "priority", DataType::String)
}

fn map_priority(provider: Provider) -> MapFieldToProvider {
    MapFieldToProvider::new(ObjectKind::Engagement, "priority", provider, "custom_priority")
}

fn values(value: serde_json::Value) -> SlugValues {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_define_is_unique_per_tenant_and_kind() {
    let (service, _) = common::service();
    let tenant = TenantId::new();

    let attribute = service.define_target_field(tenant, priority()).await.unwrap();
    assert_eq!(attribute.object_kind, ObjectKind::Engagement);

    let err = service.define_target_field(tenant, priority()).await.unwrap_err();
    assert!(matches!(err, FieldMappingError::DuplicateSlug { .. }));

    // A sub-kind shares its base kind's slugs.
    let call = DefineTargetField::new(ObjectKind::EngagementCall, "priority", DataType::String);
    let err = service.define_target_field(tenant, call).await.unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_SLUG");

    let contact = DefineTargetField::new(ObjectKind::Contact, "priority", DataType::String);
    service.define_target_field(tenant, contact).await.unwrap();
    service.define_target_field(TenantId::new(), priority()).await.unwrap();
}

#[tokio::test]
async fn test_invalid_slug_is_rejected_before_storage() {
    let (service, store) = common::service();
    let tenant = TenantId::new();

    let err = service
        .define_target_field(tenant, DefineTargetField::new(ObjectKind::Engagement, "Bad Slug", DataType::String))
        .await
        .unwrap_err();
    match err {
        FieldMappingError::Validation(violations) => assert_eq!(violations[0].field, "slug"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(unison_db::AttributeStore::list_attributes(store.as_ref(), tenant, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_mapping_requires_an_existing_field() {
    let (service, _) = common::service();
    let tenant = TenantId::new();

    let err = service
        .map_field_to_provider(tenant, map_priority(Provider::Zendesk))
        .await
        .unwrap_err();
    assert!(matches!(err, FieldMappingError::UnknownAttribute { .. }));

    // Defined by another tenant does not count.
    service.define_target_field(TenantId::new(), priority()).await.unwrap();
    let err = service
        .map_field_to_provider(tenant, map_priority(Provider::Zendesk))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_ATTRIBUTE");
}

#[tokio::test]
async fn test_custom_mappings_are_per_provider() {
    let (service, _) = common::service();
    let tenant = TenantId::new();
    service.define_target_field(tenant, priority()).await.unwrap();
    service
        .map_field_to_provider(tenant, map_priority(Provider::Zendesk))
        .await
        .unwrap();
    service
        .map_field_to_provider(
            tenant,
            MapFieldToProvider::new(ObjectKind::Engagement, "priority", Provider::Hubspot, "hs_priority"),
        )
        .await
        .unwrap();

    let zendesk = service
        .custom_mappings(tenant, ObjectKind::EngagementMeeting, Provider::Zendesk)
        .await
        .unwrap();
    assert_eq!(zendesk, vec![CustomFieldMapping::new("priority", "custom_priority")]);

    let hubspot = service
        .custom_mappings(tenant, ObjectKind::Engagement, Provider::Hubspot)
        .await
        .unwrap();
    assert_eq!(hubspot, vec![CustomFieldMapping::new("priority", "hs_priority")]);

    assert!(service
        .custom_mappings(tenant, ObjectKind::Engagement, Provider::Zoho)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_values_roundtrip_and_skip_unknown_or_mistyped() {
    let (service, _) = common::service();
    let tenant = TenantId::new();
    service.define_target_field(tenant, priority()).await.unwrap();
    service
        .define_target_field(tenant, DefineTargetField::new(ObjectKind::Engagement, "score", DataType::Number))
        .await
        .unwrap();
    let owner = ObjectId::new();

    let stored = service
        .store_values(
            tenant,
            owner,
            ObjectKind::EngagementCall,
            &values(json!({"priority": "high", "score": "not a number", "region": "emea"})),
        )
        .await
        .unwrap();
    assert_eq!(stored, 1);

    let resolved = service.resolve_values_for_object(tenant, owner).await.unwrap();
    assert_eq!(resolved, values(json!({"priority": "high"})));
    assert!(service
        .resolve_values_for_object(tenant, ObjectId::new())
        .await
        .unwrap()
        .is_empty());

    let batch = service
        .resolve_values_for_objects(tenant, &[owner, ObjectId::new()])
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);

    assert_eq!(service.list_entities(tenant).await.unwrap().len(), 1);
    assert_eq!(service.list_values(tenant, None).await.unwrap().len(), 1);
    assert_eq!(
        service
            .list_attributes(tenant, Some(ObjectKind::EngagementEmail))
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_check_values_reports_every_problem() {
    let (service, _) = common::service();
    let tenant = TenantId::new();
    service.define_target_field(tenant, priority()).await.unwrap();

    let violations = service
        .check_values(
            tenant,
            ObjectKind::EngagementCall,
            &values(json!({"priority": 3, "region": "emea", "ignored": null})),
        )
        .await
        .unwrap();
    let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
    assert_eq!(fields, vec!["field_mappings.priority", "field_mappings.region"]);
}

#[tokio::test]
async fn test_custom_properties_are_annotated() {
    let (service, _) = common::service();
    let tenant = TenantId::new();
    service.define_target_field(tenant, priority()).await.unwrap();
    service
        .map_field_to_provider(tenant, map_priority(Provider::Zendesk))
        .await
        .unwrap();

    let ctx = TenantContext::new(tenant, ProjectId::new());
    let properties = service
        .get_custom_properties(&ctx, Provider::Zendesk, ObjectKind::Engagement)
        .await
        .unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].mapped_slug.as_deref(), Some("priority"));
    assert_eq!(properties[1].mapped_slug, None);

    let err = service
        .get_custom_properties(&ctx, Provider::Pipedrive, ObjectKind::Engagement)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_PROVIDER");
}
