//! What a store operation hands back to its caller.
//!
//! No store operation fails outright. A mutation is always applied in
//! memory; whether the durable copy caught up is reported next to it.

use crate::record::RecordKind;
use serde::Serialize;

/// Result of the durable write that follows a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistStatus {
    Saved,
    /// Nothing changed, so nothing was written.
    Skipped,
    /// State is valid in memory but not durably saved.
    Failed { reason: String },
}

impl PersistStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Which views a caller must re-render after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "kind", rename_all = "snake_case")]
pub enum Refresh {
    Nothing,
    Collection(RecordKind),
    /// Day display plus everything judged against the day (license expiry).
    GameDay,
    All,
}

/// An operation that went through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied<T = ()> {
    pub value: T,
    pub persist: PersistStatus,
    pub refresh: Refresh,
}

impl<T> Applied<T> {
    pub fn new(value: T, persist: PersistStatus, refresh: Refresh) -> Self {
        Self {
            value,
            persist,
            refresh,
        }
    }

    /// The persist-failure message, if the durable write did not land.
    pub fn warning(&self) -> Option<&str> {
        match &self.persist {
            PersistStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            persist: self.persist,
            refresh: self.refresh,
        }
    }
}

/// How `LedgerStore::initialize` obtained its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet; defaults were written.
    Fresh { persist: PersistStatus },
    /// Stored snapshot loaded. `notes` lists pieces that fell back to defaults.
    Restored { notes: Vec<String> },
    /// Started from defaults. A corrupt stored value was overwritten
    /// (`persist` is the write result); a failed read left the durable copy
    /// untouched (`persist` is `Skipped`).
    Recovered {
        reason: String,
        persist: PersistStatus,
    },
}
