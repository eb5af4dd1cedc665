//! Record types for the four ledger collections.
//!
//! A record is stored exactly as it arrived: every key, every value, nulls
//! and empty arrays included. The typed accessors on each kind read the
//! fields this build understands and tolerate whatever shape the producer
//! chose (a day written as `"104"` still reads as day 104). Nothing a
//! producer wrote is rewritten or discarded on the way back out.

use crate::{
    error::LedgerError,
    game_day::day_from_json,
    snapshot::LedgerState,
    types::{GameDay, RecordId},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// The four collections, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Action,
    License,
    Accident,
    Arrest,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Action,
        RecordKind::License,
        RecordKind::Accident,
        RecordKind::Arrest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::License => "license",
            Self::Accident => "accident",
            Self::Arrest => "arrest",
        }
    }

    /// Snapshot field holding this collection.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Action => "actions",
            Self::License => "licenses",
            Self::Accident => "accidents",
            Self::Arrest => "arrests",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        RecordKind::ALL
            .into_iter()
            .find(|k| lower == k.as_str() || lower == k.field_name())
            .ok_or(LedgerError::UnknownKind { name: s.to_string() })
    }
}

/// The raw JSON body of a record.
///
/// Serializes back to exactly the value it was read from. Entries loaded
/// from the durable store are kept even when they are not objects; they
/// just have no readable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Value);

impl Default for Fields {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl Fields {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string field. Present-but-not-a-string reads as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// A day-like field: a number, or text with a leading integer.
    pub fn day(&self, key: &str) -> Option<GameDay> {
        self.get(key).and_then(|v| day_from_json(v).ok().flatten())
    }

    /// The string elements of an array field.
    pub fn text_list(&self, key: &str) -> Vec<&str> {
        match self.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Write one field. A body that is not an object becomes an empty
    /// object first.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value.into());
        }
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Fields {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The contract every record kind fulfills so the store can treat the
/// four collections uniformly.
pub trait LedgerRecord: Serialize + DeserializeOwned + Clone + fmt::Debug {
    const KIND: RecordKind;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    fn from_fields(fields: Fields) -> Self;

    fn collection(state: &LedgerState) -> &Vec<Self>;

    fn collection_mut(state: &mut LedgerState) -> &mut Vec<Self>;

    /// The record's identifier, or `""` when it has none (or a non-string one).
    fn id(&self) -> &str {
        self.fields().text("id").unwrap_or("")
    }

    fn set_id(&mut self, id: RecordId) {
        self.fields_mut().set("id", id);
    }
}

/// An officer action entered into the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    fields: Fields,
}

impl Action {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn officer(&self) -> Option<&str> {
        self.fields.text("officer")
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.text("description")
    }

    /// Codex article the action was taken under.
    pub fn article(&self) -> Option<&str> {
        self.fields.text("article")
    }

    pub fn game_day(&self) -> Option<GameDay> {
        self.fields.day("gameDay")
    }

    pub fn with_officer(mut self, officer: impl Into<String>) -> Self {
        self.fields.set("officer", officer.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.set("description", description.into());
        self
    }

    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.fields.set("article", article.into());
        self
    }

    pub fn with_game_day(mut self, day: GameDay) -> Self {
        self.fields.set("gameDay", day);
        self
    }
}

/// A driving license issued to a character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct License {
    fields: Fields,
}

impl License {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self) -> Option<&str> {
        self.fields.text("holder")
    }

    pub fn category(&self) -> Option<&str> {
        self.fields.text("category")
    }

    pub fn issued_day(&self) -> Option<GameDay> {
        self.fields.day("issuedDay")
    }

    pub fn expires_day(&self) -> Option<GameDay> {
        self.fields.day("expiresDay")
    }

    /// A license with no readable expiry day never expires.
    pub fn is_expired(&self, today: GameDay) -> bool {
        self.expires_day().is_some_and(|day| day < today)
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.fields.set("holder", holder.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.fields.set("category", category.into());
        self
    }

    pub fn with_issued_day(mut self, day: GameDay) -> Self {
        self.fields.set("issuedDay", day);
        self
    }

    pub fn with_expires_day(mut self, day: GameDay) -> Self {
        self.fields.set("expiresDay", day);
        self
    }
}

/// A traffic accident report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accident {
    fields: Fields,
}

impl Accident {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<&str> {
        self.fields.text("location")
    }

    pub fn participants(&self) -> Vec<&str> {
        self.fields.text_list("participants")
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.text("description")
    }

    pub fn game_day(&self) -> Option<GameDay> {
        self.fields.day("gameDay")
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.fields.set("location", location.into());
        self
    }

    pub fn with_participants<I, P>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let list: Vec<Value> = participants
            .into_iter()
            .map(|p| Value::String(p.into()))
            .collect();
        self.fields.set("participants", list);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.set("description", description.into());
        self
    }

    pub fn with_game_day(mut self, day: GameDay) -> Self {
        self.fields.set("gameDay", day);
        self
    }
}

/// An arrest record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arrest {
    fields: Fields,
}

impl Arrest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suspect(&self) -> Option<&str> {
        self.fields.text("suspect")
    }

    pub fn article(&self) -> Option<&str> {
        self.fields.text("article")
    }

    pub fn term_days(&self) -> Option<u64> {
        self.fields.day("termDays")
    }

    pub fn game_day(&self) -> Option<GameDay> {
        self.fields.day("gameDay")
    }

    pub fn with_suspect(mut self, suspect: impl Into<String>) -> Self {
        self.fields.set("suspect", suspect.into());
        self
    }

    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.fields.set("article", article.into());
        self
    }

    pub fn with_term_days(mut self, days: u64) -> Self {
        self.fields.set("termDays", days);
        self
    }

    pub fn with_game_day(mut self, day: GameDay) -> Self {
        self.fields.set("gameDay", day);
        self
    }
}

impl LedgerRecord for Action {
    const KIND: RecordKind = RecordKind::Action;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn collection(state: &LedgerState) -> &Vec<Self> {
        &state.actions
    }

    fn collection_mut(state: &mut LedgerState) -> &mut Vec<Self> {
        &mut state.actions
    }
}

impl LedgerRecord for License {
    const KIND: RecordKind = RecordKind::License;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn collection(state: &LedgerState) -> &Vec<Self> {
        &state.licenses
    }

    fn collection_mut(state: &mut LedgerState) -> &mut Vec<Self> {
        &mut state.licenses
    }
}

impl LedgerRecord for Accident {
    const KIND: RecordKind = RecordKind::Accident;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn collection(state: &LedgerState) -> &Vec<Self> {
        &state.accidents
    }

    fn collection_mut(state: &mut LedgerState) -> &mut Vec<Self> {
        &mut state.accidents
    }
}

impl LedgerRecord for Arrest {
    const KIND: RecordKind = RecordKind::Arrest;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn collection(state: &LedgerState) -> &Vec<Self> {
        &state.arrests
    }

    fn collection_mut(state: &mut LedgerState) -> &mut Vec<Self> {
        &mut state.arrests
    }
}
