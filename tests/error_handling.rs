//! Error handling and edge case tests.

use entity_store::{EntityStore, Id, NormalizedState, Selector, StoreError};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Todo {
    id: String,
    description: String,
    completed: bool,
}

fn todo(id: &str, description: &str, completed: bool) -> Todo {
    Todo {
        id: id.to_string(),
        description: description.to_string(),
        completed,
    }
}

fn get_id(todo: &Todo) -> Id {
    Id::from(todo.id.as_str())
}

fn test_store() -> EntityStore<Todo> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    EntityStore::with_records(
        get_id,
        vec![todo("abc", "item 1", false), todo("def", "item 2", false)],
    )
}

fn count_notifications(store: &EntityStore<Todo>) -> (Arc<Mutex<usize>>, entity_store::Subscription) {
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    let sub = store.subscribe(move |_| *sink.lock() += 1);
    (count, sub)
}

// --- Missing entities ---

#[test]
fn test_get_unknown_id() {
    let store = test_store();

    // Should be None, not an error
    assert!(store.get("nonexistent").get().is_none());
    assert!(store.get_many(["nonexistent"]).get().is_empty());
}

#[test]
fn test_remove_and_update_unknown_ids() {
    let store = test_store();
    let before = store.snapshot();

    store.remove("nonexistent");
    store.update(|t| t.clone(), Selector::<Todo>::ids(["nonexistent"]));

    assert_eq!(*store.snapshot(), *before);
}

// --- Fallible transforms ---

#[test]
fn test_try_update_reports_failing_entity() {
    let store = test_store();
    let (count, _sub) = count_notifications(&store);

    let result = store.try_update(
        |t: &Todo| {
            if t.id == "def" {
                Err(format!("cannot edit {}", t.id))
            } else {
                Ok(Todo {
                    completed: true,
                    ..t.clone()
                })
            }
        },
        Selector::<Todo>::All,
    );

    match result {
        Err(StoreError::Transform { id, source }) => {
            assert_eq!(id, Id::from("def"));
            assert_eq!(source.to_string(), "cannot edit def");
        }
        other => panic!("expected transform error, got {other:?}"),
    }

    // All-or-nothing: "abc" was not written either
    assert!(!store.snapshot().get(&Id::from("abc")).unwrap().completed);
    assert_eq!(*count.lock(), 1);
}

#[test]
fn test_try_update_success() {
    let store = test_store();
    let (count, _sub) = count_notifications(&store);

    store
        .try_update(
            |t: &Todo| {
                Ok::<_, std::io::Error>(Todo {
                    completed: true,
                    ..t.clone()
                })
            },
            "abc",
        )
        .unwrap();

    assert!(store.get("abc").get().unwrap().completed);
    assert_eq!(*count.lock(), 2);
}

#[test]
fn test_panicking_transform_leaves_store_unchanged() {
    let store = test_store();
    let before = store.snapshot();
    let (count, _sub) = count_notifications(&store);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        store.update(|_| panic!("transform failed"), Selector::<Todo>::All);
    }));

    assert!(result.is_err());
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert_eq!(*count.lock(), 1);

    // The store is still writable
    store.set(todo("ghi", "item 3", false));
    assert_eq!(store.len(), 3);
}

#[test]
fn test_panicking_subscriber_does_not_wedge_store() {
    let store = test_store();

    let armed = Arc::new(Mutex::new(false));
    let trigger = Arc::clone(&armed);
    let sub = store.subscribe(move |_| {
        if *trigger.lock() {
            panic!("subscriber failed");
        }
    });

    *armed.lock() = true;
    let result = panic::catch_unwind(AssertUnwindSafe(|| store.remove("abc")));
    assert!(result.is_err());
    sub.unsubscribe();

    // The write landed before delivery
    assert!(!store.contains("abc"));

    let (count, _sub) = count_notifications(&store);
    store.remove("def");
    assert_eq!(*count.lock(), 2);
}

// --- Serialized state ---

#[test]
fn test_snapshot_json_round_trip() {
    let store = test_store();
    let json = store.snapshot().to_json().unwrap();

    let parsed: NormalizedState<Todo> = NormalizedState::from_json(&json).unwrap();
    assert_eq!(parsed, *store.snapshot());

    let restored = EntityStore::with_records(get_id, parsed.to_vec());
    assert_eq!(restored.snapshot().all_ids(), store.snapshot().all_ids());
}

#[test]
fn test_invalid_json_state() {
    let malformed = NormalizedState::<Todo>::from_json("not json");
    assert!(matches!(malformed, Err(StoreError::Serialization(_))));

    let orphan = r#"{
        "byId": [["abc", {"id": "abc", "description": "item 1", "completed": false}]],
        "allIds": []
    }"#;
    let result = NormalizedState::<Todo>::from_json(orphan);
    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

#[test]
fn test_from_parts_errors() {
    let mut by_id = std::collections::HashMap::new();
    by_id.insert(Id::from("abc"), todo("abc", "item 1", false));

    let result = NormalizedState::from_parts(by_id, vec![Id::from("abc"), Id::from("def")]);
    match result {
        Err(StoreError::MissingRecord(id)) => assert_eq!(id, Id::from("def")),
        other => panic!("expected missing record, got {other:?}"),
    }
}
