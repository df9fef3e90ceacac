//! End-to-end tests for the resource sync service over the in-memory store.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{Fixture, MockAdapter, Reply};
use serde_json::{json, Value};
use unison_connector::FieldMap;
use unison_core::{ObjectId, ObjectKind, Provider};
use unison_db::{EventStatus, EventStore, ObjectStore, ReconcileObject, SyncDirection};
use unison_sync::{SyncError, SyncOptions, SyncSettings, SyncStage};
use unison_unification::{Engagement, UnifiedInput};

fn call(subject: Option<&str>, content: Option<&str>) -> UnifiedInput<Engagement> {
    UnifiedInput::new(Engagement {
        engagement_type: Some("CALL".to_string()),
        subject: subject.map(str::to_string),
        content: content.map(str::to_string),
        ..Engagement::default()
    })
}

mod push_tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_field_round_trips_through_provider() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;
        fx.custom_field(ObjectKind::Engagement, "priority", Provider::Zendesk, "custom_priority")
            .await;

        let mut input = call(Some("Intro"), None);
        input.field_mappings.insert("priority".to_string(), json!("high"));

        let synced = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, input)
            .await
            .unwrap();

        assert!(synced.created);
        assert!(synced.event_id.is_some());
        let payload = &adapter.payloads()[0];
        assert_eq!(payload["data"]["custom_fields"]["custom_priority"], "high");
        assert_eq!(payload["data"]["activity_type"], "call");

        let object = &synced.object;
        assert_eq!(object.remote_id.as_deref(), Some("zendesk-1"));
        assert_eq!(object.remote_platform, Provider::Zendesk);
        assert_eq!(object.resource.engagement_type.as_deref(), Some("CALL"));
        assert_eq!(object.resource.subject.as_deref(), Some("Intro"));
        assert_eq!(object.field_mappings.get("priority"), Some(&json!("high")));
        assert!(object.remote_data.is_none());

        let stored = fx
            .store
            .find_object(fx.tenant_id, object.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.object_kind, ObjectKind::EngagementCall);
    }

    #[tokio::test]
    async fn test_remote_data_is_returned_when_requested() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;

        let synced = fx
            .service
            .add_one_with(
                fx.tenant_id,
                Provider::Zendesk,
                call(Some("Intro"), None),
                &SyncOptions::default().with_remote_data(true),
            )
            .await
            .unwrap();

        let remote = synced.object.remote_data.unwrap();
        assert_eq!(remote["data"]["id"], "zendesk-1");
        assert_eq!(remote["data"]["subject"], "Intro");
    }

    #[tokio::test]
    async fn test_same_remote_id_reconciles_into_one_object() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::EchoWithId("zd-42".to_string()));
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;

        let first = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), Some("x")))
            .await
            .unwrap();
        let second = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(None, Some("B")))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.object.id, second.object.id);

        // Fields absent from the second response keep their stored value.
        assert_eq!(second.object.resource.subject.as_deref(), Some("A"));
        assert_eq!(second.object.resource.content.as_deref(), Some("B"));

        let objects = fx
            .store
            .list_objects(fx.tenant_id, ObjectKind::Engagement.family(), Provider::Zendesk)
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[tokio::test]
    async fn test_type_change_updates_the_same_engagement() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::EchoWithId("zd-7".to_string()));
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;

        let first = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("Kickoff"), None))
            .await
            .unwrap();
        let meeting = UnifiedInput::new(Engagement {
            engagement_type: Some("MEETING".to_string()),
            content: Some("Moved to a meeting".to_string()),
            ..Engagement::default()
        });
        let second = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, meeting)
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.object.id, second.object.id);
        assert_eq!(adapter.payloads()[1]["data"]["activity_type"], "meeting");
        assert_eq!(second.object.resource.engagement_type.as_deref(), Some("MEETING"));
        assert_eq!(second.object.resource.subject.as_deref(), Some("Kickoff"));
        assert_eq!(second.object.resource.content.as_deref(), Some("Moved to a meeting"));

        let stored = fx
            .store
            .find_object(fx.tenant_id, first.object.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.object_kind, ObjectKind::EngagementMeeting);
        assert_eq!(fx.store.object_count().await, 1);
    }

    #[tokio::test]
    async fn test_created_and_updated_notifications() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::EchoWithId("zd-42".to_string()));
        let mut fx = Fixture::<Engagement>::new(vec![adapter]).await;

        let first = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap();
        fx.service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("B"), None))
            .await
            .unwrap();

        let created = fx.deliveries.try_recv().unwrap();
        assert_eq!(created.event_type, "crm.engagement.created");
        assert_eq!(created.project_id, fx.project_id);
        assert_eq!(Some(created.correlation_id), first.event_id);
        assert_eq!(created.data["id"], json!(first.object.id));
        assert_eq!(created.data["subject"], "A");

        let updated = fx.deliveries.try_recv().unwrap();
        assert_eq!(updated.event_type, "crm.engagement.updated");
        assert_eq!(updated.data["subject"], "B");
    }

    #[tokio::test]
    async fn test_relation_ids_are_translated() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;
        let contact = fx
            .store
            .reconcile(ReconcileObject::new(
                fx.tenant_id,
                ObjectKind::Contact,
                Provider::Zendesk,
                "zd-ct-7",
                FieldMap::new(),
            ))
            .await
            .unwrap()
            .object;

        let mut input = call(Some("Follow-up"), None);
        input.resource.contacts = Some(vec![contact.id.to_string()]);

        let synced = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, input)
            .await
            .unwrap();

        assert_eq!(adapter.payloads()[0]["data"]["contact_ids"], json!(["zd-ct-7"]));
        assert_eq!(synced.object.resource.contacts, Some(vec![contact.id.to_string()]));
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_create_one_object() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::EchoWithId("zd-7".to_string()));
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;

        // Each call carries one field only; the stored object must hold them all.
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = fx.service.clone();
                let tenant_id = fx.tenant_id;
                let mut engagement = Engagement {
                    engagement_type: Some("CALL".to_string()),
                    ..Engagement::default()
                };
                match i % 3 {
                    0 => engagement.subject = Some("Quarterly review".to_string()),
                    1 => engagement.content = Some("Discussed renewal".to_string()),
                    _ => engagement.direction = Some("OUTBOUND".to_string()),
                }
                tokio::spawn(async move {
                    service
                        .add_one(tenant_id, Provider::Zendesk, UnifiedInput::new(engagement))
                        .await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        let mut created = 0;
        for handle in handles {
            let synced = handle.await.unwrap().unwrap();
            ids.insert(synced.object.id);
            if synced.created {
                created += 1;
            }
        }
        assert_eq!(ids.len(), 1);
        assert_eq!(created, 1);
        assert_eq!(fx.store.object_count().await, 1);

        let id = ids.into_iter().next().unwrap();
        let merged = fx.service.get_one(fx.tenant_id, id, false).await.unwrap();
        assert_eq!(merged.resource.subject.as_deref(), Some("Quarterly review"));
        assert_eq!(merged.resource.content.as_deref(), Some("Discussed renewal"));
        assert_eq!(merged.resource.direction.as_deref(), Some("OUTBOUND"));
        assert_eq!(merged.resource.engagement_type.as_deref(), Some("CALL"));
    }

    #[tokio::test]
    async fn test_tenants_never_share_objects() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::EchoWithId("zd-1".to_string()));
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;
        let other = fx.other_tenant().await;

        let a = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap();
        let b = fx
            .service
            .add_one(other, Provider::Zendesk, call(Some("B"), None))
            .await
            .unwrap();

        assert!(a.created && b.created);
        assert_ne!(a.object.id, b.object.id);

        let err = fx.service.get_one(other, a.object.id, false).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_input_fails_before_any_side_effect() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;

        let mut input = UnifiedInput::new(Engagement {
            start_at: Some("2024-05-01T10:00:00Z".parse().unwrap()),
            end_time: Some("2024-05-01T09:00:00Z".parse().unwrap()),
            company_id: Some(ObjectId::new().to_string()),
            ..Engagement::default()
        });
        input.field_mappings.insert("unknown".to_string(), json!(1));

        let failure = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, input)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::Validating);
        assert_eq!(failure.error_code(), "VALIDATION_FAILED");
        let fields: HashSet<&str> = failure
            .error
            .violations()
            .iter()
            .map(|v| v.field.as_str())
            .collect();
        assert_eq!(
            fields,
            HashSet::from(["type", "end_time", "company_id", "field_mappings.unknown"])
        );

        assert_eq!(adapter.call_count(), 0);
        assert!(fx.store.list_events(fx.tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_linked_user_is_not_found() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;

        let failure = fx
            .service
            .add_one(unison_core::TenantId::new(), Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::Validating);
        assert_eq!(failure.error_code(), "NOT_FOUND");
        assert_eq!(adapter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_provider_fails_while_mapping() {
        let fx = Fixture::<Engagement>::new(vec![]).await;

        let failure = fx
            .service
            .add_one(fx.tenant_id, Provider::Freshsales, call(Some("A"), None))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::MappingOut);
        assert_eq!(failure.error_code(), "UNSUPPORTED_PROVIDER");
        assert!(fx.store.list_events(fx.tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_writes_nothing_but_a_fail_event() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Slow(Duration::from_millis(500)));
        let settings = SyncSettings {
            remote_deadline: Duration::from_millis(50),
            ..SyncSettings::default()
        };
        let mut fx = Fixture::<Engagement>::with_settings(vec![adapter.clone()], settings).await;

        let failure = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::RemoteCall);
        assert!(matches!(failure.error, SyncError::RemoteProvider { .. }));
        assert_eq!(adapter.call_count(), 1);

        let objects = fx
            .store
            .list_objects(fx.tenant_id, ObjectKind::Engagement.family(), Provider::Zendesk)
            .await
            .unwrap();
        assert!(objects.is_empty());

        let events = fx.store.list_events(fx.tenant_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Fail);
        assert_eq!(events[0].direction, SyncDirection::Push);
        assert_eq!(events[0].object_kind, ObjectKind::EngagementCall);
        assert!(fx.deliveries.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_provider_rejection_keeps_status_and_body() {
        let body = json!({"errors": [{"error": {"code": "conflict", "message": "duplicate call"}}]});
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Reject(409, body));
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;

        let failure = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::RemoteCall);
        assert_eq!(failure.error.status_code(), Some(409));
        assert_eq!(failure.error_code(), "REMOTE_PROVIDER_ERROR");
        assert!(failure.error.to_string().contains("duplicate call"));
        let events = fx.store.list_events(fx.tenant_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Fail);
    }

    #[tokio::test]
    async fn test_response_without_id_fails_while_unifying() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Status(201));
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;

        let failure = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, call(Some("A"), None))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, SyncStage::MappingIn);
        assert_eq!(failure.error_code(), "MAPPING_FAILED");
    }
}

mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_reports_each_element_in_order() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter.clone()]).await;
        let invalid = UnifiedInput::new(Engagement::default());

        let outcome = fx
            .service
            .add_many(
                fx.tenant_id,
                Provider::Zendesk,
                vec![call(Some("one"), None), invalid, call(Some("three"), None)],
            )
            .await;

        assert_eq!(outcome.summary.total, 3);
        assert_eq!(outcome.summary.succeeded, 2);
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.created, 2);

        let indexes: Vec<usize> = outcome.results.iter().map(|o| o.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        let subjects: Vec<Option<String>> = outcome
            .results
            .iter()
            .map(|o| {
                o.result
                    .as_ref()
                    .ok()
                    .and_then(|s| s.object.resource.subject.clone())
            })
            .collect();
        assert_eq!(subjects, vec![Some("one".to_string()), None, Some("three".to_string())]);

        let failures: Vec<_> = outcome.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert_eq!(failures[0].1.stage, SyncStage::Validating);
        assert_eq!(adapter.call_count(), 2);
    }

    #[tokio::test]
    async fn test_batch_options_apply_to_every_element() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;
        let options = SyncOptions::default().with_remote_data(true);

        let outcome = fx
            .service
            .add_many_with(
                fx.tenant_id,
                Provider::Zendesk,
                vec![call(Some("one"), None), call(Some("two"), None)],
                &options,
            )
            .await;

        assert_eq!(outcome.summary.succeeded, 2);
        for element in &outcome.results {
            let synced = element.result.as_ref().unwrap();
            assert!(synced.object.remote_data.is_some());
        }
        // The caller keeps its options.
        assert!(options.include_remote_data);
    }
}

mod read_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_many_lists_synced_objects_and_records_a_pull() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;
        for subject in ["one", "two"] {
            fx.service
                .add_one(fx.tenant_id, Provider::Zendesk, call(Some(subject), None))
                .await
                .unwrap();
        }

        let objects = fx
            .service
            .get_many(fx.tenant_id, Provider::Zendesk, true)
            .await
            .unwrap();
        assert_eq!(objects.len(), 2);
        for object in &objects {
            let remote: &Value = object.remote_data.as_ref().unwrap();
            assert_eq!(remote["data"]["subject"], json!(object.resource.subject));
        }
        let subjects: HashSet<_> = objects
            .iter()
            .filter_map(|o| o.resource.subject.as_deref())
            .collect();
        assert_eq!(subjects, HashSet::from(["one", "two"]));

        let events = fx.store.list_events(fx.tenant_id).await.unwrap();
        let pulls: Vec<_> = events
            .iter()
            .filter(|e| e.direction == SyncDirection::Pull)
            .collect();
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].status, EventStatus::Success);
        assert_eq!(pulls[0].object_kind, ObjectKind::Engagement);

        let none = fx
            .service
            .get_many(fx.tenant_id, Provider::Hubspot, false)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_get_one_returns_custom_values() {
        let adapter = MockAdapter::new(Provider::Zendesk, Reply::Echo);
        let fx = Fixture::<Engagement>::new(vec![adapter]).await;
        fx.custom_field(ObjectKind::Engagement, "region", Provider::Zendesk, "custom_region")
            .await;
        let mut input = call(Some("A"), None);
        input.field_mappings.insert("region".to_string(), json!("emea"));

        let synced = fx
            .service
            .add_one(fx.tenant_id, Provider::Zendesk, input)
            .await
            .unwrap();
        let fetched = fx
            .service
            .get_one(fx.tenant_id, synced.object.id, false)
            .await
            .unwrap();

        assert_eq!(fetched.field_mappings.get("region"), Some(&json!("emea")));
        assert_eq!(fetched.resource, synced.object.resource);

        let err = fx
            .service
            .get_one(fx.tenant_id, ObjectId::new(), false)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
