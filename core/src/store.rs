//! The ledger state store.
//!
//! RULE: `LedgerStore` is the only owner of ledger state and the only code
//! that touches the durable store. Callers get read access and explicit
//! operations; every mutation is followed by a durable write.
//!
//! Construct one store per process and pass it by `&mut` to whoever needs
//! it. Nothing here is global.

use crate::{
    config::LedgerConfig,
    durable::DurableStore,
    error::{ImportError, LedgerError, LedgerResult},
    game_day::GameClock,
    ids::IdGenerator,
    outcome::{Applied, LoadOutcome, PersistStatus, Refresh},
    record::{Accident, Action, Arrest, Fields, LedgerRecord, License, RecordKind},
    snapshot::{
        decode_candidate, decode_lenient, LedgerState, LedgerStats, SavedSnapshot, StateSnapshot,
    },
    types::{GameDay, RecordId},
};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A ready-to-save export: file name plus pretty-printed snapshot JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

pub struct LedgerStore<S: DurableStore> {
    state: LedgerState,
    config: LedgerConfig,
    ids: IdGenerator,
    backend: S,
}

impl<S: DurableStore> LedgerStore<S> {
    /// Load state from `backend`, falling back to defaults when nothing
    /// usable is stored. Never fails.
    pub fn initialize(backend: S, config: LedgerConfig) -> (Self, LoadOutcome) {
        Self::initialize_with_ids(backend, config, IdGenerator::from_entropy())
    }

    /// As `initialize`, with an explicit identifier stream (tests).
    pub fn initialize_with_ids(
        backend: S,
        config: LedgerConfig,
        ids: IdGenerator,
    ) -> (Self, LoadOutcome) {
        let default_day = config.default_game_day;
        let mut store = Self {
            state: LedgerState::with_day(default_day),
            config,
            ids,
            backend,
        };

        let stored = match store.backend.read(&store.config.storage_key) {
            Ok(stored) => stored,
            // Only the read failed; the stored ledger may be intact. Run on
            // defaults in memory and leave the durable copy alone.
            Err(e) => {
                log::error!(
                    "store: durable read failed, starting from defaults without saving: {e}"
                );
                let persist = PersistStatus::Skipped;
                return (
                    store,
                    LoadOutcome::Recovered {
                        reason: e.to_string(),
                        persist,
                    },
                );
            }
        };

        let outcome = match stored {
            None => {
                log::info!("store: no saved ledger, starting at day {default_day}");
                let persist = store.persist();
                LoadOutcome::Fresh { persist }
            }
            Some(text) => match serde_json::from_str::<Value>(&text) {
                Err(e) => {
                    log::error!("store: saved ledger is corrupt, resetting to defaults: {e}");
                    let persist = store.persist();
                    LoadOutcome::Recovered {
                        reason: e.to_string(),
                        persist,
                    }
                }
                Ok(value) => {
                    let (state, notes) = decode_lenient(&value, default_day);
                    for note in &notes {
                        log::warn!("store: {note}");
                    }
                    store.state = state;
                    let stats = store.stats();
                    log::info!(
                        "store: loaded {} records ({} actions, {} licenses, {} accidents, {} arrests) at day {}",
                        stats.total(),
                        stats.actions,
                        stats.licenses,
                        stats.accidents,
                        stats.arrests,
                        store.state.current_game_day,
                    );
                    LoadOutcome::Restored { notes }
                }
            },
        };
        (store, outcome)
    }

    // ── Durable write ──────────────────────────────────────────

    /// Overwrite the durable copy with the current state.
    pub fn persist(&mut self) -> PersistStatus {
        let snapshot = SavedSnapshot {
            state: &self.state,
            version: &self.config.schema_version,
            last_save: Utc::now(),
        };
        let result = serde_json::to_string(&snapshot)
            .map_err(LedgerError::from)
            .and_then(|json| self.backend.write(&self.config.storage_key, &json));
        match result {
            Ok(()) => {
                log::debug!(
                    "store: saved ledger under '{}' at day {}",
                    self.config.storage_key,
                    self.state.current_game_day
                );
                PersistStatus::Saved
            }
            Err(e) => {
                log::warn!("store: durable write failed, changes kept in memory only: {e}");
                PersistStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Clear every collection and return to the default day.
    /// Confirmation is the caller's job.
    pub fn reset(&mut self) -> Applied {
        self.state = LedgerState::with_day(self.config.default_game_day);
        log::info!("store: all data cleared");
        Applied::new((), self.persist(), Refresh::All)
    }

    // ── Snapshots ──────────────────────────────────────────────

    pub fn export_snapshot(&self) -> StateSnapshot {
        StateSnapshot::for_export(self.state.clone(), &self.config.schema_version, Utc::now())
    }

    /// Pretty JSON for the manual backup text box.
    pub fn backup_text(&self) -> LedgerResult<String> {
        Ok(self.export_snapshot().to_pretty_json()?)
    }

    /// Export snapshot plus the download name for `date`.
    pub fn export_file(&self, date: NaiveDate) -> LedgerResult<ExportFile> {
        Ok(ExportFile {
            file_name: export_file_name(&self.config.export_prefix, date),
            contents: self.backup_text()?,
        })
    }

    /// Write the export file into `dir` and return its path.
    pub fn write_export(&self, dir: &Path, date: NaiveDate) -> LedgerResult<PathBuf> {
        let file = self.export_file(date)?;
        let path = dir.join(&file.file_name);
        std::fs::write(&path, &file.contents)?;
        log::info!("store: exported {} records to {}", self.stats().total(), path.display());
        Ok(path)
    }

    /// Replace all state from a parsed snapshot candidate.
    ///
    /// Rejected candidates leave state untouched. Accepted ones replace
    /// every field; a field the candidate lacks resets to its default.
    pub fn import_snapshot(&mut self, candidate: &Value) -> Result<Applied, ImportError> {
        let state = decode_candidate(candidate, self.config.default_game_day).map_err(|v| {
            log::warn!("store: import rejected: {v}");
            ImportError::Format(v)
        })?;
        self.state = state;
        log::info!(
            "store: imported {} records at day {}",
            self.state.stats().total(),
            self.state.current_game_day
        );
        Ok(Applied::new((), self.persist(), Refresh::All))
    }

    /// Parse snapshot text (file contents or backup box) and import it.
    pub fn import_json(&mut self, text: &str) -> Result<Applied, ImportError> {
        let candidate: Value = serde_json::from_str(text).map_err(|e| {
            log::warn!("store: import text is not JSON: {e}");
            ImportError::Parse(e.to_string())
        })?;
        self.import_snapshot(&candidate)
    }

    // ── Records ────────────────────────────────────────────────

    /// Append `record` under a fresh identifier. Any id it carried is replaced.
    pub fn add_record<R: LedgerRecord>(&mut self, mut record: R) -> Applied<RecordId> {
        let id = self.ids.next_id();
        record.set_id(id.clone());
        R::collection_mut(&mut self.state).push(record);
        log::debug!("store: added {} {id}", R::KIND);
        Applied::new(id, self.persist(), Refresh::Collection(R::KIND))
    }

    /// Add a record given as raw JSON fields. The fields are stored as given.
    pub fn add_record_json(
        &mut self,
        kind: RecordKind,
        fields: Value,
    ) -> LedgerResult<Applied<RecordId>> {
        match kind {
            RecordKind::Action => Ok(self.add_record(parse_fields::<Action>(fields)?)),
            RecordKind::License => Ok(self.add_record(parse_fields::<License>(fields)?)),
            RecordKind::Accident => Ok(self.add_record(parse_fields::<Accident>(fields)?)),
            RecordKind::Arrest => Ok(self.add_record(parse_fields::<Arrest>(fields)?)),
        }
    }

    /// Remove the first record of `kind` with identifier `id`.
    /// Absent ids are a no-op and write nothing.
    pub fn remove_record(&mut self, kind: RecordKind, id: &str) -> Applied<bool> {
        let removed = match kind {
            RecordKind::Action => remove_first::<Action>(&mut self.state, id),
            RecordKind::License => remove_first::<License>(&mut self.state, id),
            RecordKind::Accident => remove_first::<Accident>(&mut self.state, id),
            RecordKind::Arrest => remove_first::<Arrest>(&mut self.state, id),
        };
        if !removed {
            return Applied::new(false, PersistStatus::Skipped, Refresh::Nothing);
        }
        log::debug!("store: removed {kind} {id}");
        Applied::new(true, self.persist(), Refresh::Collection(kind))
    }

    // ── Game day ───────────────────────────────────────────────

    /// Set the day; negatives clamp to 0.
    pub fn set_game_day(&mut self, value: i64) -> Applied<GameDay> {
        self.change_day(|clock| Some(clock.set(value)))
    }

    /// Set the day from typed text; non-numeric text means day 0.
    pub fn set_game_day_input(&mut self, input: &str) -> Applied<GameDay> {
        self.change_day(|clock| Some(clock.set_from_input(input)))
    }

    pub fn increment_game_day(&mut self) -> Applied<GameDay> {
        self.change_day(|clock| Some(clock.advance()))
    }

    /// Step back one day. At day 0 nothing changes and nothing is written.
    pub fn decrement_game_day(&mut self) -> Applied<GameDay> {
        self.change_day(GameClock::rewind)
    }

    fn change_day(
        &mut self,
        f: impl FnOnce(&mut GameClock) -> Option<GameDay>,
    ) -> Applied<GameDay> {
        let mut clock = GameClock::new(self.state.current_game_day);
        match f(&mut clock) {
            Some(day) => {
                self.state.current_game_day = day;
                Applied::new(day, self.persist(), Refresh::GameDay)
            }
            None => Applied::new(
                self.state.current_game_day,
                PersistStatus::Skipped,
                Refresh::Nothing,
            ),
        }
    }

    // ── Read access ────────────────────────────────────────────

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn records<R: LedgerRecord>(&self) -> &[R] {
        R::collection(&self.state)
    }

    pub fn find<R: LedgerRecord>(&self, id: &str) -> Option<&R> {
        self.records::<R>().iter().find(|r| r.id() == id)
    }

    pub fn actions(&self) -> &[Action] {
        &self.state.actions
    }

    pub fn licenses(&self) -> &[License] {
        &self.state.licenses
    }

    pub fn accidents(&self) -> &[Accident] {
        &self.state.accidents
    }

    pub fn arrests(&self) -> &[Arrest] {
        &self.state.arrests
    }

    pub fn current_game_day(&self) -> GameDay {
        self.state.current_game_day
    }

    pub fn stats(&self) -> LedgerStats {
        self.state.stats()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Give the durable store back, e.g. to simulate a process restart.
    pub fn into_backend(self) -> S {
        self.backend
    }
}

/// `mvd_system_backup_2025-10-08.json` style name.
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}{}.json", date.format("%Y-%m-%d"))
}

fn parse_fields<R: LedgerRecord>(fields: Value) -> LedgerResult<R> {
    if !fields.is_object() {
        return Err(LedgerError::InvalidRecord(format!(
            "{} fields must be a JSON object",
            R::KIND
        )));
    }
    Ok(R::from_fields(Fields::from(fields)))
}

fn remove_first<R: LedgerRecord>(state: &mut LedgerState, id: &str) -> bool {
    let records = R::collection_mut(state);
    match records.iter().position(|r| r.id() == id) {
        Some(index) => {
            records.remove(index);
            true
        }
        None => false,
    }
}
