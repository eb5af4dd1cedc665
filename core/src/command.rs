use crate::{
    durable::DurableStore,
    error::LedgerResult,
    outcome::Applied,
    record::RecordKind,
    store::LedgerStore,
    types::{GameDay, RecordId},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every mutation a front-end can ask for.
/// Variants may be added — never removed or renamed (the UI sends these).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum LedgerCommand {
    // ── Records ───────────────────────────────────
    AddRecord { kind: RecordKind, fields: Value },
    RemoveRecord { kind: RecordKind, id: RecordId },

    // ── Game day ──────────────────────────────────
    /// `value` may be a number or the raw text of the day field.
    SetGameDay { value: Value },
    IncrementGameDay,
    DecrementGameDay,

    // ── Bulk ──────────────────────────────────────
    Import { snapshot: Value },
    Reset,
}

impl LedgerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddRecord { .. } => "add_record",
            Self::RemoveRecord { .. } => "remove_record",
            Self::SetGameDay { .. } => "set_game_day",
            Self::IncrementGameDay => "increment_game_day",
            Self::DecrementGameDay => "decrement_game_day",
            Self::Import { .. } => "import",
            Self::Reset => "reset",
        }
    }
}

/// The value a command produced, for echoing back to a front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutput {
    None,
    RecordId(RecordId),
    Removed(bool),
    GameDay(GameDay),
}

impl<S: DurableStore> LedgerStore<S> {
    /// Dispatch one command. Errors are rejections; state is unchanged
    /// whenever one is returned.
    pub fn apply(&mut self, command: LedgerCommand) -> LedgerResult<Applied<CommandOutput>> {
        log::debug!("store: command {}", command.name());
        let applied = match command {
            LedgerCommand::AddRecord { kind, fields } => self
                .add_record_json(kind, fields)?
                .map(CommandOutput::RecordId),
            LedgerCommand::RemoveRecord { kind, id } => {
                self.remove_record(kind, &id).map(CommandOutput::Removed)
            }
            LedgerCommand::SetGameDay { value } => {
                let applied = match &value {
                    Value::String(text) => self.set_game_day_input(text),
                    Value::Number(n) => self.set_game_day(number_to_day(n)),
                    _ => self.set_game_day(0),
                };
                applied.map(CommandOutput::GameDay)
            }
            LedgerCommand::IncrementGameDay => {
                self.increment_game_day().map(CommandOutput::GameDay)
            }
            LedgerCommand::DecrementGameDay => {
                self.decrement_game_day().map(CommandOutput::GameDay)
            }
            LedgerCommand::Import { snapshot } => {
                self.import_snapshot(&snapshot)?.map(|()| CommandOutput::None)
            }
            LedgerCommand::Reset => self.reset().map(|()| CommandOutput::None),
        };
        Ok(applied)
    }
}

fn number_to_day(n: &serde_json::Number) -> i64 {
    if let Some(i) = n.as_i64() {
        i
    } else if n.is_u64() {
        i64::MAX
    } else {
        n.as_f64().unwrap_or(0.0).trunc() as i64
    }
}
