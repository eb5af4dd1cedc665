//! Core of the MVD internal-affairs ledger.
//!
//! One `LedgerStore` owns the four record collections and the game day,
//! persists them to a `DurableStore` after every change, and moves them
//! in and out of JSON snapshots for export, import and manual backup.

pub mod command;
pub mod config;
pub mod durable;
pub mod error;
pub mod game_day;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod snapshot;
pub mod store;
pub mod types;

pub use config::LedgerConfig;
pub use durable::{DurableStore, MemoryKv, SqliteKv};
pub use error::{FormatViolation, ImportError, LedgerError, LedgerResult};
pub use outcome::{Applied, LoadOutcome, PersistStatus, Refresh};
pub use record::{Accident, Action, Arrest, Fields, LedgerRecord, License, RecordKind};
pub use snapshot::{LedgerState, LedgerStats, StateSnapshot};
pub use store::{ExportFile, LedgerStore};
