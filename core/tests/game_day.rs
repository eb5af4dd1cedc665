//! Game-day changes through the store: clamping, persistence, refresh hints.

use mvd_ledger_core::{
    DurableStore, LedgerConfig, LedgerStore, MemoryKv, PersistStatus, Refresh,
};
use serde_json::Value;

fn fresh() -> LedgerStore<MemoryKv> {
    LedgerStore::initialize(MemoryKv::new(), LedgerConfig::default()).0
}

fn saved_day(store: &LedgerStore<MemoryKv>) -> Value {
    let raw = store.backend().read("mvd_system_data").unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    value["currentGameDay"].clone()
}

#[test]
fn increment_and_decrement_are_persisted() {
    let mut store = fresh();
    let up = store.increment_game_day();
    assert_eq!(up.value, 101);
    assert_eq!(up.refresh, Refresh::GameDay);
    assert_eq!(saved_day(&store), 101);

    let down = store.decrement_game_day();
    assert_eq!(down.value, 100);
    assert_eq!(down.persist, PersistStatus::Saved);
    assert_eq!(saved_day(&store), 100);
}

#[test]
fn decrement_at_zero_stays_at_zero() {
    let mut store = fresh();
    store.set_game_day(0);
    let applied = store.decrement_game_day();
    assert_eq!(applied.value, 0);
    assert_eq!(applied.persist, PersistStatus::Skipped);
    assert_eq!(applied.refresh, Refresh::Nothing);
    assert_eq!(store.current_game_day(), 0);
}

#[test]
fn negative_set_clamps_to_zero() {
    let mut store = fresh();
    assert_eq!(store.set_game_day(-5).value, 0);
    assert_eq!(saved_day(&store), 0);
}

#[test]
fn non_numeric_input_means_day_zero() {
    let mut store = fresh();
    assert_eq!(store.set_game_day_input("abc").value, 0);
    assert_eq!(store.set_game_day_input("145").value, 145);
    assert_eq!(store.set_game_day_input(" 160th").value, 160);
    assert_eq!(store.set_game_day_input("-12").value, 0);
    assert_eq!(saved_day(&store), 0);
}

#[test]
fn increment_has_no_practical_ceiling() {
    let mut store = fresh();
    store.set_game_day(i64::MAX);
    assert_eq!(store.increment_game_day().value, i64::MAX as u64 + 1);
}

#[test]
fn reset_returns_to_default_day() {
    let mut store = fresh();
    store.set_game_day(321);
    let applied = store.reset();
    assert_eq!(applied.refresh, Refresh::All);
    assert_eq!(store.current_game_day(), 100);
    assert_eq!(saved_day(&store), 100);
}
