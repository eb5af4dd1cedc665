//! Snapshot serialization — full ledger state to/from JSON.
//!
//! One shape serves the durable store, file export and the manual backup
//! text. Producing a snapshot is infallible; consuming one comes in two
//! flavours:
//!   - `decode_candidate`: the import gate. A malformed outer shape rejects
//!     the whole candidate. Record contents are never second-guessed.
//!   - `decode_lenient`: durable-store load. Malformed pieces fall back to
//!     their defaults and are reported. Stored records are never dropped.

use crate::{
    error::FormatViolation,
    game_day::day_from_json,
    record::{Accident, Action, Arrest, Fields, License, LedgerRecord, RecordKind},
    types::{GameDay, DEFAULT_GAME_DAY},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DAY_FIELD: &str = "currentGameDay";

/// The authoritative in-memory state: four collections and the game day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub accidents: Vec<Accident>,
    #[serde(default)]
    pub arrests: Vec<Arrest>,
    #[serde(default = "default_game_day")]
    pub current_game_day: GameDay,
}

fn default_game_day() -> GameDay {
    DEFAULT_GAME_DAY
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::with_day(DEFAULT_GAME_DAY)
    }
}

impl LedgerState {
    /// Empty collections at the given day.
    pub fn with_day(current_game_day: GameDay) -> Self {
        Self {
            actions: Vec::new(),
            licenses: Vec::new(),
            accidents: Vec::new(),
            arrests: Vec::new(),
            current_game_day,
        }
    }

    pub fn len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Action => self.actions.len(),
            RecordKind::License => self.licenses.len(),
            RecordKind::Accident => self.accidents.len(),
            RecordKind::Arrest => self.arrests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        RecordKind::ALL.iter().all(|k| self.len(*k) == 0)
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            actions: self.actions.len(),
            licenses: self.licenses.len(),
            accidents: self.accidents.len(),
            arrests: self.arrests.len(),
        }
    }
}

/// Per-collection record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub actions: usize,
    pub licenses: usize,
    pub accidents: usize,
    pub arrests: usize,
}

impl LedgerStats {
    pub fn total(&self) -> usize {
        self.actions + self.licenses + self.accidents + self.arrests
    }
}

/// The externally visible snapshot shape.
///
/// `export_date` is set on export/backup snapshots, `last_save` on the
/// durable copy. Exactly one of them is present on anything we produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(flatten)]
    pub state: LedgerState,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    pub fn for_export(state: LedgerState, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            state,
            version: version.to_string(),
            export_date: Some(now),
            last_save: None,
        }
    }

    pub fn for_save(state: LedgerState, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            state,
            version: version.to_string(),
            export_date: None,
            last_save: Some(now),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Borrowed view of a durable-store snapshot, so saving never clones state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSnapshot<'a> {
    #[serde(flatten)]
    pub state: &'a LedgerState,
    pub version: &'a str,
    pub last_save: DateTime<Utc>,
}

// ── Import gate ─────────────────────────────────────────────

/// Acceptance check: an object with a truthy `version` and an `actions` key.
pub fn check_candidate(candidate: &Value) -> Result<(), FormatViolation> {
    let obj = candidate.as_object().ok_or(FormatViolation::NotAnObject)?;
    if !obj.get("version").is_some_and(is_truthy) {
        return Err(FormatViolation::MissingVersion);
    }
    if !obj.contains_key("actions") {
        return Err(FormatViolation::MissingActions);
    }
    Ok(())
}

/// Fully decode an import candidate or reject it.
///
/// Absent fields become empty/default. The result replaces state wholesale;
/// nothing from the previous state is carried over.
pub fn decode_candidate(
    candidate: &Value,
    default_day: GameDay,
) -> Result<LedgerState, FormatViolation> {
    check_candidate(candidate)?;
    let current_game_day = match candidate.get(DAY_FIELD) {
        None => default_day,
        Some(v) => day_from_json(v)
            .map_err(|found| FormatViolation::BadGameDay { found })?
            .unwrap_or(default_day),
    };
    Ok(LedgerState {
        actions: strict_collection(candidate)?,
        licenses: strict_collection(candidate)?,
        accidents: strict_collection(candidate)?,
        arrests: strict_collection(candidate)?,
        current_game_day,
    })
}

fn strict_collection<R: LedgerRecord>(candidate: &Value) -> Result<Vec<R>, FormatViolation> {
    let field = R::KIND.field_name();
    let items = match candidate.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(FormatViolation::NotAnArray { field }),
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            decode_record(item).map_err(|reason| FormatViolation::BadRecord {
                field,
                index,
                reason,
            })
        })
        .collect()
}

// ── Durable load ────────────────────────────────────────────

/// Decode a durable-store value, keeping whatever is usable.
///
/// Returns the state plus one human-readable note per piece that was
/// defaulted or could not be read.
pub fn decode_lenient(value: &Value, default_day: GameDay) -> (LedgerState, Vec<String>) {
    let mut notes = Vec::new();
    if !value.is_object() {
        notes.push(format!("stored value is not an object: {}", type_name(value)));
        return (LedgerState::with_day(default_day), notes);
    }
    let current_game_day = match value.get(DAY_FIELD).map(day_from_json) {
        None | Some(Ok(None)) => default_day,
        Some(Ok(Some(day))) => day,
        Some(Err(found)) => {
            notes.push(format!("{DAY_FIELD} unreadable ({found}), using {default_day}"));
            default_day
        }
    };
    let state = LedgerState {
        actions: lenient_collection(value, &mut notes),
        licenses: lenient_collection(value, &mut notes),
        accidents: lenient_collection(value, &mut notes),
        arrests: lenient_collection(value, &mut notes),
        current_game_day,
    };
    (state, notes)
}

fn lenient_collection<R: LedgerRecord>(value: &Value, notes: &mut Vec<String>) -> Vec<R> {
    let field = R::KIND.field_name();
    let items = match value.get(field) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            notes.push(format!("{field} is {} not an array, starting empty", type_name(other)));
            return Vec::new();
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                notes.push(format!(
                    "{field}[{index}] is {}, kept as-is without readable fields",
                    type_name(item)
                ));
            }
            R::from_fields(Fields::from(item.clone()))
        })
        .collect()
}

/// Records are taken verbatim. Only the outer shape is checked; inner
/// fields are never validated, so a producer's `"gameDay": "104"` is
/// accepted and written back exactly.
fn decode_record<R: LedgerRecord>(item: &Value) -> Result<R, String> {
    if !item.is_object() {
        return Err(format!("expected an object, found {}", type_name(item)));
    }
    Ok(R::from_fields(Fields::from(item.clone())))
}

/// Truthiness as the snapshot producers have always applied it to `version`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
