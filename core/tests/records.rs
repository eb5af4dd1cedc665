//! Adding and removing records.

use mvd_ledger_core::{
    ids::{is_generated_id, IdGenerator},
    Accident, Action, Arrest, DurableStore, LedgerConfig, LedgerError, LedgerRecord, LedgerStore,
    License, MemoryKv, PersistStatus, RecordKind, Refresh,
};
use serde_json::{json, Value};
use std::collections::HashSet;

const KEY: &str = "mvd_system_data";

fn fresh() -> LedgerStore<MemoryKv> {
    LedgerStore::initialize_with_ids(
        MemoryKv::new(),
        LedgerConfig::default(),
        IdGenerator::seeded(2024),
    )
    .0
}

fn saved(store: &LedgerStore<MemoryKv>) -> Value {
    serde_json::from_str(&store.backend().read(KEY).unwrap().unwrap()).unwrap()
}

#[test]
fn added_records_get_ids_and_keep_insertion_order() {
    let mut store = fresh();
    let first = store.add_record(Arrest::new().with_suspect("Volkov"));
    let second = store.add_record(Arrest::new().with_suspect("Kozlov"));

    assert!(is_generated_id(&first.value), "Bad id {}", first.value);
    assert_eq!(first.persist, PersistStatus::Saved);
    assert_eq!(first.refresh, Refresh::Collection(RecordKind::Arrest));
    let suspects: Vec<_> = store.arrests().iter().map(|a| a.suspect()).collect();
    assert_eq!(suspects, [Some("Volkov"), Some("Kozlov")]);
    assert_eq!(store.arrests()[1].id(), second.value);
    assert_eq!(saved(&store)["arrests"][1]["suspect"], json!("Kozlov"));
}

#[test]
fn store_assigned_id_replaces_caller_id() {
    let mut store = fresh();
    let mut accident = Accident::new().with_location("Bridge");
    accident.set_id("caller-chosen".into());
    let applied = store.add_record(accident);
    assert_ne!(applied.value, "caller-chosen");
    assert_eq!(store.accidents()[0].id(), applied.value);
    assert_eq!(store.accidents()[0].location(), Some("Bridge"));
}

#[test]
fn thousand_adds_produce_distinct_ids() {
    let mut store = LedgerStore::initialize(MemoryKv::new(), LedgerConfig::default()).0;
    let ids: HashSet<_> = (0..1_500)
        .map(|_| store.add_record(Action::default()).value)
        .collect();
    assert_eq!(ids.len(), 1_500, "Identifier collision");
    assert_eq!(store.stats().actions, 1_500);
}

#[test]
fn remove_takes_first_match_only() {
    let mut store = fresh();
    let id = store.add_record(License::default()).value;
    store.add_record(License::default());
    // A foreign duplicate of the same id, appended through import.
    let mut snapshot = serde_json::to_value(store.export_snapshot()).unwrap();
    snapshot["licenses"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "id": id, "holder": "duplicate" }));
    store.import_snapshot(&snapshot).unwrap();
    assert_eq!(store.licenses().len(), 3);

    let applied = store.remove_record(RecordKind::License, &id);

    assert!(applied.value);
    assert_eq!(applied.refresh, Refresh::Collection(RecordKind::License));
    assert_eq!(store.licenses().len(), 2);
    assert_eq!(store.licenses()[1].holder(), Some("duplicate"));
    assert_eq!(saved(&store)["licenses"].as_array().unwrap().len(), 2);
}

#[test]
fn removing_unknown_id_is_a_quiet_no_op() {
    let mut store = fresh();
    store.add_record(Action::default());
    let before = store.backend().read(KEY).unwrap();

    let applied = store.remove_record(RecordKind::Action, "ID-NOPE00000");

    assert!(!applied.value);
    assert_eq!(applied.persist, PersistStatus::Skipped);
    assert_eq!(applied.refresh, Refresh::Nothing);
    assert_eq!(store.actions().len(), 1);
    assert_eq!(store.backend().read(KEY).unwrap(), before, "No write for a no-op");
}

#[test]
fn remove_only_looks_in_the_named_collection() {
    let mut store = fresh();
    let id = store.add_record(Action::default()).value;
    let applied = store.remove_record(RecordKind::Arrest, &id);
    assert!(!applied.value);
    assert_eq!(store.actions().len(), 1);
}

#[test]
fn json_fields_are_stored_as_given() {
    let mut store = fresh();
    let id = store
        .add_record_json(
            RecordKind::License,
            json!({ "holder": "Nikitina", "issuedDay": 100, "expiresDay": 130, "stamp": "blue" }),
        )
        .expect("valid license")
        .value;

    let license = store.find::<License>(&id).expect("license stored");
    assert_eq!(license.expires_day(), Some(130));
    assert_eq!(license.fields().get("stamp"), Some(&json!("blue")));

    let id = store
        .add_record_json(RecordKind::License, json!({ "expiresDay": "never" }))
        .expect("free text in a day field is kept")
        .value;
    let durable = saved(&store);
    assert_eq!(durable["licenses"][1]["expiresDay"], json!("never"));
    assert_eq!(durable["licenses"][1]["id"], json!(id));

    let err = store
        .add_record_json(RecordKind::Action, json!(["not", "an", "object"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRecord(_)));
    assert_eq!(store.stats().total(), 2);
}

#[test]
fn stats_count_every_collection() {
    let mut store = fresh();
    store.add_record(Action::default());
    store.add_record(Action::default());
    store.add_record(Accident::default());
    let stats = store.stats();
    assert_eq!((stats.actions, stats.licenses, stats.accidents, stats.arrests), (2, 0, 1, 0));
    assert_eq!(stats.total(), 3);
}
