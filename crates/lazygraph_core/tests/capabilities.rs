use lazygraph_core::db::open_db_in_memory;
use lazygraph_core::{
    CapabilityDraft, CapabilityListFilter, CapabilityPatch, ErrorKind, GraphError, GraphService,
    NewCapability, NewEntity, OwnerId, RecordKind, SharedDb, ValidationError,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

fn service() -> GraphService {
    GraphService::new(SharedDb::new(open_db_in_memory().unwrap()))
}

fn owner(name: &str) -> OwnerId {
    OwnerId::new(name).unwrap()
}

fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn create_capability_defaults_data_to_empty_object() {
    let service = service();
    let alice = owner("alice");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();

    let created = service
        .create_capability(NewCapability::new(entity.id, "task"), &alice)
        .unwrap();

    assert_eq!(created.kind, "task");
    assert_eq!(created.entity_id, entity.id);
    assert!(created.data.is_empty());
    let encoded = serde_json::to_value(&created).unwrap();
    assert_eq!(encoded["data"], json!({}));
    assert_eq!(encoded["type"], json!("task"));
}

#[test]
fn create_capability_requires_entity_id() {
    let service = service();
    let payload = NewCapability {
        entity_id: None,
        kind: "task".to_string(),
        data: None,
    };
    let err = service
        .create_capability(payload, &owner("alice"))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::Validation(ValidationError::MissingEntityId)
    ));
}

#[test]
fn create_capability_against_missing_entity_is_not_found() {
    let service = service();
    let err = service
        .create_capability(NewCapability::new(Uuid::new_v4(), "task"), &owner("alice"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn attach_capability_binds_draft_to_entity() {
    let service = service();
    let alice = owner("alice");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();

    let attached = service
        .attach_capability(
            entity.id,
            CapabilityDraft::new("reminder").with_data(data(json!({ "minutes": 15 }))),
            &alice,
        )
        .unwrap();
    assert_eq!(attached.entity_id, entity.id);
    assert_eq!(attached.data["minutes"], json!(15));
}

#[test]
fn get_capability_checks_owner_of_entity() {
    let service = service();
    let alice = owner("alice");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();
    let capability = service
        .create_capability(NewCapability::new(entity.id, "task"), &alice)
        .unwrap();

    assert_eq!(
        service.get_capability(capability.id, &alice).unwrap(),
        capability
    );
    let foreign = service
        .get_capability(capability.id, &owner("bob"))
        .unwrap_err();
    assert!(matches!(
        foreign,
        GraphError::Forbidden { kind: RecordKind::Capability, id } if id == capability.id
    ));
    let missing = service
        .get_capability(Uuid::new_v4(), &alice)
        .unwrap_err();
    assert!(matches!(
        missing,
        GraphError::NotFound {
            kind: RecordKind::Capability,
            ..
        }
    ));
}

#[test]
fn list_capabilities_is_owner_scoped_and_filterable() {
    let service = service();
    let alice = owner("alice");
    let bob = owner("bob");
    let first = service.create_entity(NewEntity::new("first"), &alice).unwrap();
    let second = service.create_entity(NewEntity::new("second"), &alice).unwrap();
    let bobs = service.create_entity(NewEntity::new("bob's"), &bob).unwrap();

    let task_first = service
        .create_capability(NewCapability::new(first.id, "task"), &alice)
        .unwrap();
    service
        .create_capability(NewCapability::new(first.id, "reminder"), &alice)
        .unwrap();
    let task_second = service
        .create_capability(NewCapability::new(second.id, "task"), &alice)
        .unwrap();
    service
        .create_capability(NewCapability::new(bobs.id, "task"), &bob)
        .unwrap();

    let all = service
        .list_capabilities(&alice, CapabilityListFilter::default())
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|capability| capability.entity_id != bobs.id));

    let tasks = service
        .list_capabilities(
            &alice,
            CapabilityListFilter {
                kind: Some("task".to_string()),
                entity_id: None,
            },
        )
        .unwrap();
    let ids: Vec<Uuid> = tasks.iter().map(|capability| capability.id).collect();
    assert_eq!(ids, vec![task_second.id, task_first.id]);

    let first_tasks = service
        .list_capabilities(
            &alice,
            CapabilityListFilter {
                kind: Some("task".to_string()),
                entity_id: Some(first.id),
            },
        )
        .unwrap();
    assert_eq!(first_tasks.len(), 1);
    assert_eq!(first_tasks[0].id, task_first.id);

    let foreign_entity = service
        .list_capabilities(
            &alice,
            CapabilityListFilter {
                kind: None,
                entity_id: Some(bobs.id),
            },
        )
        .unwrap();
    assert!(foreign_entity.is_empty());
}

#[test]
fn update_capability_keeps_unset_fields() {
    let service = service();
    let alice = owner("alice");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();
    let capability = service
        .create_capability(
            NewCapability::new(entity.id, "task").with_data(data(json!({ "done": false }))),
            &alice,
        )
        .unwrap();

    let renamed = service
        .update_capability(
            capability.id,
            CapabilityPatch {
                kind: Some("chore".to_string()),
                data: None,
            },
            &alice,
        )
        .unwrap();
    assert_eq!(renamed.kind, "chore");
    assert_eq!(renamed.data, data(json!({ "done": false })));

    let completed = service
        .update_capability(
            capability.id,
            CapabilityPatch {
                kind: None,
                data: Some(data(json!({ "done": true }))),
            },
            &alice,
        )
        .unwrap();
    assert_eq!(completed.kind, "chore");
    assert_eq!(completed.data, data(json!({ "done": true })));

    let unchanged = service
        .update_capability(capability.id, CapabilityPatch::default(), &alice)
        .unwrap();
    assert_eq!(unchanged, completed);
}

#[test]
fn update_and_delete_capability_are_forbidden_for_other_owner() {
    let service = service();
    let alice = owner("alice");
    let bob = owner("bob");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();
    let capability = service
        .create_capability(NewCapability::new(entity.id, "task"), &alice)
        .unwrap();

    let update = service
        .update_capability(
            capability.id,
            CapabilityPatch {
                kind: Some("stolen".to_string()),
                data: None,
            },
            &bob,
        )
        .unwrap_err();
    assert_eq!(update.kind(), ErrorKind::Forbidden);
    assert_eq!(
        service.delete_capability(capability.id, &bob).unwrap_err().kind(),
        ErrorKind::Forbidden
    );

    let receipt = service.delete_capability(capability.id, &alice).unwrap();
    assert_eq!(receipt.kind, RecordKind::Capability);
    assert_eq!(
        service.get_capability(capability.id, &alice).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn list_by_entity_authorizes_entity_first() {
    let service = service();
    let alice = owner("alice");
    let entity = service
        .create_entity(
            NewEntity::new("X")
                .with_capability(CapabilityDraft::new("task"))
                .with_capability(CapabilityDraft::new("reminder")),
            &alice,
        )
        .unwrap();

    let listed = service
        .list_capabilities_by_entity(entity.id, &alice)
        .unwrap();
    let kinds: Vec<&str> = listed.iter().map(|capability| capability.kind.as_str()).collect();
    assert_eq!(kinds, vec!["reminder", "task"]);

    let err = service
        .list_capabilities_by_entity(entity.id, &owner("bob"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn create_many_inserts_whole_batch_and_returns_refreshed_list() {
    let service = service();
    let alice = owner("alice");
    let entity = service
        .create_entity(
            NewEntity::new("X").with_capability(CapabilityDraft::new("existing")),
            &alice,
        )
        .unwrap();

    let listed = service
        .create_capabilities(
            entity.id,
            vec![
                CapabilityDraft::new("task").with_data(data(json!({ "done": false }))),
                CapabilityDraft::new("reminder"),
            ],
            &alice,
        )
        .unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].kind, "reminder");
    assert!(listed[0].data.is_empty());
    assert_eq!(listed[2].kind, "existing");
}

#[test]
fn create_many_with_malformed_item_persists_nothing() {
    let service = service();
    let alice = owner("alice");
    let entity = service.create_entity(NewEntity::new("X"), &alice).unwrap();

    let batch = vec![
        CapabilityDraft::new("task"),
        CapabilityDraft::new("reminder"),
        CapabilityDraft::new("tag"),
        CapabilityDraft::new(" "),
        CapabilityDraft::new("note"),
    ];
    let err = service
        .create_capabilities(entity.id, batch, &alice)
        .unwrap_err();

    match err {
        GraphError::Validation(ValidationError::InvalidBatchItem { index, source }) => {
            assert_eq!(index, 3);
            assert_eq!(*source, ValidationError::EmptyCapabilityType);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service
        .list_capabilities_by_entity(entity.id, &alice)
        .unwrap()
        .is_empty());
}

#[test]
fn create_many_against_foreign_entity_is_forbidden() {
    let service = service();
    let entity = service
        .create_entity(NewEntity::new("X"), &owner("alice"))
        .unwrap();
    let err = service
        .create_capabilities(entity.id, vec![CapabilityDraft::new("task")], &owner("bob"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
