//! Integration tests for the PostgreSQL store.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: `cargo test -p unison-db --features integration`

#![cfg(feature = "integration")]

mod common;

use std::sync::Arc;

use common::TestContext;
use serde_json::{json, Value};
use unison_core::{ObjectId, ObjectKind, Provider, TenantId};
use unison_db::{
    AttributeStore, DataType, EventStatus, EventStore, Fields, NewAttribute, NewSyncEvent,
    ObjectStore, ReconcileObject, SyncDirection,
};

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

fn call(tenant: TenantId, remote_id: &str, value: Value) -> ReconcileObject {
    ReconcileObject::new(
        tenant,
        ObjectKind::EngagementCall,
        Provider::Zendesk,
        remote_id,
        fields(value),
    )
}

#[tokio::test]
async fn test_reconcile_creates_then_merges() {
    let ctx = TestContext::new().await;

    let first = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r1", json!({"subject": "A"})))
        .await
        .unwrap();
    let second = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r1", json!({"content": "B"})))
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.object.id, second.object.id);
    assert_eq!(
        Value::Object(second.object.fields),
        json!({"subject": "A", "content": "B"})
    );
}

#[tokio::test]
async fn test_reconcile_follows_sub_kind_change() {
    let ctx = TestContext::new().await;

    let first = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r2", json!({"type": "CALL", "subject": "A"})))
        .await
        .unwrap();
    let second = ctx
        .store
        .reconcile(ReconcileObject::new(
            ctx.tenant_id,
            ObjectKind::EngagementMeeting,
            Provider::Zendesk,
            "r2",
            fields(json!({"type": "MEETING"})),
        ))
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(first.object.id, second.object.id);
    assert_eq!(second.object.object_kind, ObjectKind::EngagementMeeting);
    assert_eq!(
        Value::Object(second.object.fields),
        json!({"type": "MEETING", "subject": "A"})
    );
    let found = ctx
        .store
        .find_by_remote(ctx.tenant_id, ObjectKind::Engagement.family(), Provider::Zendesk, "r2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.object.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reconcile_yields_one_row() {
    let ctx = TestContext::new().await;
    let store = Arc::new(ctx.store.clone());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let tenant = ctx.tenant_id;
            tokio::spawn(async move {
                store
                    .reconcile(call(tenant, "race", json!({ format!("f{i}"): i })))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let objects = ctx
        .store
        .list_objects(ctx.tenant_id, ObjectKind::Engagement.family(), Provider::Zendesk)
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].fields.len(), 8);
}

#[tokio::test]
async fn test_reads_are_tenant_scoped() {
    let ctx = TestContext::new().await;
    let other = TestContext::create_linked_user(&ctx.store).await;

    let object = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r1", json!({})))
        .await
        .unwrap()
        .object;

    assert!(ctx.store.find_object(other, object.id).await.unwrap().is_none());
    assert!(!ctx
        .store
        .object_exists(other, &[ObjectKind::EngagementCall], object.id)
        .await
        .unwrap());
    assert!(ctx
        .store
        .object_exists(ctx.tenant_id, ObjectKind::Engagement.family(), object.id)
        .await
        .unwrap());
    let err = ctx
        .store
        .put_snapshot(other, object.id, json!({}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_snapshot_is_overwritten() {
    let ctx = TestContext::new().await;
    let object = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r1", json!({})))
        .await
        .unwrap()
        .object;

    ctx.store.put_snapshot(ctx.tenant_id, object.id, json!({"v": 1})).await.unwrap();
    ctx.store.put_snapshot(ctx.tenant_id, object.id, json!({"v": 2})).await.unwrap();

    let snapshots = ctx
        .store
        .find_snapshots(ctx.tenant_id, &[object.id, ObjectId::new()])
        .await
        .unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[&object.id].data, json!({"v": 2}));
}

#[tokio::test]
async fn test_attribute_lifecycle() {
    let ctx = TestContext::new().await;
    let new = NewAttribute {
        tenant_id: ctx.tenant_id,
        object_kind: ObjectKind::Engagement,
        slug: "priority".into(),
        data_type: DataType::String,
    };

    let attribute = ctx.store.insert_attribute(new.clone()).await.unwrap();
    assert!(ctx.store.insert_attribute(new).await.unwrap_err().is_conflict());

    let mapped = ctx
        .store
        .set_remote_key(ctx.tenant_id, attribute.id, Provider::Zendesk, "custom_priority")
        .await
        .unwrap();
    assert_eq!(mapped.remote_key(Provider::Zendesk), Some("custom_priority"));

    let owner = ctx
        .store
        .reconcile(call(ctx.tenant_id, "r1", json!({})))
        .await
        .unwrap()
        .object;
    for value in ["low", "high"] {
        ctx.store
            .upsert_value(ctx.tenant_id, attribute.id, owner.id, owner.object_kind, json!(value))
            .await
            .unwrap();
    }

    let values = ctx.store.values_for_owner(ctx.tenant_id, owner.id).await.unwrap();
    assert_eq!(values.get("priority"), Some(&json!("high")));
    assert_eq!(ctx.store.list_values(ctx.tenant_id, None).await.unwrap().len(), 1);
    assert_eq!(ctx.store.list_entities(ctx.tenant_id).await.unwrap().len(), 1);
    assert_eq!(
        ctx.store
            .list_attributes(ctx.tenant_id, Some(ObjectKind::Engagement))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_events_roundtrip() {
    let ctx = TestContext::new().await;

    let event = ctx
        .store
        .append_event(NewSyncEvent::for_sync(
            ctx.tenant_id,
            ObjectKind::EngagementMeeting,
            Provider::Zendesk,
            SyncDirection::Push,
            EventStatus::Success,
        ))
        .await
        .unwrap();

    let events = ctx.store.list_events(ctx.tenant_id).await.unwrap();
    assert_eq!(events, vec![event]);
    assert_eq!(events[0].event_type, "crm.engagement.push");
}
