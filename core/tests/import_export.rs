//! Snapshot export, import gate, replace semantics and backup text.

use chrono::NaiveDate;
use mvd_ledger_core::{
    ids::IdGenerator, store::export_file_name, Accident, Action, Arrest, DurableStore,
    FormatViolation, ImportError, LedgerConfig, LedgerError, LedgerStore, License, MemoryKv, Refresh,
};
use std::path::PathBuf;
use serde_json::{json, Value};

const KEY: &str = "mvd_system_data";

fn fresh(seed: u64) -> LedgerStore<MemoryKv> {
    LedgerStore::initialize_with_ids(
        MemoryKv::new(),
        LedgerConfig::default(),
        IdGenerator::seeded(seed),
    )
    .0
}

fn populated() -> LedgerStore<MemoryKv> {
    let mut store = fresh(7);
    let officers = [
        ("Sgt. Popov", "7.2"),
        ("Lt. Orlova", "12.8"),
        ("Cpt. Lebedev", "19.3"),
    ];
    for (officer, article) in officers {
        store.add_record(
            Action::new()
                .with_officer(officer)
                .with_article(article)
                .with_game_day(101),
        );
    }
    store.add_record(
        License::new()
            .with_holder("Fedorov")
            .with_category("C")
            .with_issued_day(90)
            .with_expires_day(180),
    );
    store.add_record(
        Accident::new()
            .with_location("Lenin Ave / 5th St")
            .with_participants(["Fedorov", "Zaitseva"]),
    );
    store.add_record(
        Arrest::new()
            .with_suspect("Zaitseva")
            .with_article("12.26")
            .with_term_days(10),
    );
    store.set_game_day(150);
    store
}

#[test]
fn export_then_import_reproduces_state_exactly() {
    let source = populated();
    let snapshot = serde_json::to_value(source.export_snapshot()).expect("serialize export");

    let mut target = fresh(99);
    let _ = target.reset();
    let applied = target.import_snapshot(&snapshot).expect("import accepted");

    assert_eq!(applied.refresh, Refresh::All);
    assert_eq!(target.state(), source.state());
    let officers: Vec<_> = target.actions().iter().map(|a| a.officer().unwrap()).collect();
    assert_eq!(officers, ["Sgt. Popov", "Lt. Orlova", "Cpt. Lebedev"], "Order preserved");
}

#[test]
fn export_carries_version_and_export_date() {
    let snapshot = serde_json::to_value(populated().export_snapshot()).unwrap();
    assert_eq!(snapshot["version"], json!("1.0"));
    assert!(snapshot["exportDate"].is_string());
    assert!(snapshot.get("lastSave").is_none());
    assert_eq!(snapshot["currentGameDay"], json!(150));
    assert_eq!(snapshot["actions"].as_array().unwrap().len(), 3);
}

#[test]
fn rejected_import_leaves_everything_untouched() {
    let mut store = populated();
    let state_before = store.state().clone();
    let durable_before = store.backend().read(KEY).unwrap();

    let err = store.import_snapshot(&json!({ "foo": 1 })).unwrap_err();

    assert_eq!(err, ImportError::Format(FormatViolation::MissingVersion));
    assert_eq!(store.state(), &state_before);
    assert_eq!(store.backend().read(KEY).unwrap(), durable_before);
}

#[test]
fn missing_actions_is_rejected() {
    let mut store = populated();
    let err = store
        .import_snapshot(&json!({ "version": "1.0", "licenses": [] }))
        .unwrap_err();
    assert_eq!(err, ImportError::Format(FormatViolation::MissingActions));
    assert_eq!(store.actions().len(), 3);
}

#[test]
fn import_replaces_instead_of_merging() {
    let mut store = populated();
    assert_eq!(store.actions().len(), 3);

    store
        .import_snapshot(&json!({ "version": "1.0", "actions": null }))
        .expect("null actions still passes the gate");

    assert!(store.actions().is_empty(), "actions replaced, not preserved");
    assert!(store.licenses().is_empty(), "absent licenses reset");
    assert!(store.accidents().is_empty());
    assert!(store.arrests().is_empty());
    assert_eq!(store.current_game_day(), 100, "absent day resets to default");

    let saved: Value = serde_json::from_str(&store.backend().read(KEY).unwrap().unwrap()).unwrap();
    assert_eq!(saved["actions"], json!([]), "import is persisted");
}

#[test]
fn imported_zero_day_is_kept() {
    let mut store = populated();
    store
        .import_snapshot(&json!({ "version": "1.0", "actions": [], "currentGameDay": 0 }))
        .unwrap();
    assert_eq!(store.current_game_day(), 0);
}

#[test]
fn a_record_that_is_not_an_object_rejects_the_whole_import() {
    let mut store = populated();
    let before = store.state().clone();

    let err = store
        .import_snapshot(&json!({
            "version": "1.0",
            "actions": [{ "officer": "ok" }],
            "licenses": [{ "holder": "Ok" }, "Fedorov, cat. B"]
        }))
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Format(FormatViolation::BadRecord { field: "licenses", index: 1, .. })
    ));
    assert_eq!(store.state(), &before);
}

#[test]
fn form_typed_values_import_and_export_verbatim() {
    let mut store = fresh(11);
    let action = json!({ "id": "ID-A", "officer": "Sgt. Popov", "gameDay": "104" });
    let license = json!({ "id": "ID-L", "holder": "Fedorov", "expiresDay": "next week" });
    store
        .import_snapshot(&json!({
            "version": "1.0",
            "actions": [action.clone()],
            "licenses": [license.clone()]
        }))
        .expect("inner field types are not validated");

    assert_eq!(store.actions()[0].game_day(), Some(104));
    assert_eq!(store.licenses()[0].expires_day(), None);
    assert!(!store.licenses()[0].is_expired(u64::MAX));

    let exported = serde_json::to_value(store.export_snapshot()).unwrap();
    assert_eq!(exported["actions"][0], action);
    assert_eq!(exported["licenses"][0], license);
}

#[test]
fn null_and_empty_fields_survive_export() {
    let mut store = fresh(12);
    let record = json!({
        "id": "ID-X",
        "officer": "A",
        "description": null,
        "participants": []
    });
    let blank_id = json!({ "id": "", "suspect": null });
    store
        .import_snapshot(&json!({
            "version": "1.0",
            "actions": [record.clone()],
            "accidents": [record.clone()],
            "arrests": [blank_id.clone()]
        }))
        .unwrap();

    let exported = serde_json::to_value(store.export_snapshot()).unwrap();
    assert_eq!(exported["actions"][0], record);
    assert_eq!(exported["accidents"][0], record);
    assert_eq!(exported["arrests"][0], blank_id);
}

#[test]
fn non_json_text_is_a_parse_error() {
    let mut store = populated();
    let before = store.state().clone();

    let err = store.import_json("{ definitely not json").unwrap_err();

    assert!(matches!(err, ImportError::Parse(_)), "Got {err:?}");
    assert_eq!(store.state(), &before);
}

#[test]
fn backup_text_restores_into_another_store() {
    let source = populated();
    let text = source.backup_text().expect("backup text");
    assert!(text.contains('\n'), "Backup text is pretty-printed");

    let mut target = fresh(3);
    target.import_json(&text).expect("restore from backup text");
    assert_eq!(target.state(), source.state());
}

#[test]
fn foreign_records_keep_unknown_fields() {
    let mut store = fresh(5);
    let foreign = json!({
        "id": "ID-LEGACY001",
        "officer": "Mjr. Gromov",
        "rank": "major",
        "evidence": ["photo-1", "photo-2"]
    });
    store
        .import_snapshot(&json!({ "version": "0.3", "actions": [foreign.clone()] }))
        .unwrap();

    let exported = serde_json::to_value(store.export_snapshot()).unwrap();
    assert_eq!(exported["actions"][0], foreign);
}

#[test]
fn export_file_is_named_after_the_date() {
    let date = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();
    assert_eq!(
        export_file_name("mvd_system_backup_", date),
        "mvd_system_backup_2025-10-08.json"
    );

    let store = populated();
    let file = store.export_file(date).unwrap();
    assert_eq!(file.file_name, "mvd_system_backup_2025-10-08.json");
    let parsed: Value = serde_json::from_str(&file.contents).unwrap();
    assert_eq!(parsed["currentGameDay"], json!(150));
}

#[test]
fn export_is_written_into_the_target_directory() {
    let dir = std::env::temp_dir().join(format!("mvd_ledger_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();

    let store = populated();
    let path = store.write_export(&dir, date).expect("export written");

    assert_eq!(path, dir.join("mvd_system_backup_2025-10-08.json"));
    let text = std::fs::read_to_string(&path).unwrap();
    let mut target = fresh(8);
    target.import_json(&text).expect("written export imports");
    assert_eq!(target.state(), store.state());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn export_into_a_missing_directory_is_an_io_error() {
    let missing: PathBuf = std::env::temp_dir()
        .join(format!("mvd_ledger_missing_{}", std::process::id()))
        .join("nested");
    let date = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();

    let err = populated().write_export(&missing, date).unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)), "Got {err:?}");
}
