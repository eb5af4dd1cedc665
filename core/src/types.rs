//! Shared primitive types used across the ledger.

/// An in-fiction game day. One day = one step of the role-play calendar.
pub type GameDay = u64;

/// A stable identifier for any record in the ledger (`ID-XXXXXXXXX`).
pub type RecordId = String;

/// Game day used for a fresh or reset ledger.
pub const DEFAULT_GAME_DAY: GameDay = 100;
