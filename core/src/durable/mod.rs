//! Durable key-value storage behind the ledger.
//!
//! RULE: Only `LedgerStore` talks to a durable store.
//! Backends know nothing about snapshots; they move opaque strings.

mod memory;
mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

use crate::error::LedgerResult;

/// A persistent string-to-string map.
///
/// `write` replaces the previous value wholesale. A failed write must leave
/// the previous value in place.
pub trait DurableStore {
    fn read(&self, key: &str) -> LedgerResult<Option<String>>;

    fn write(&mut self, key: &str, value: &str) -> LedgerResult<()>;
}
