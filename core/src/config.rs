use crate::types::{GameDay, DEFAULT_GAME_DAY};
use serde::{Deserialize, Serialize};

/// Ledger-wide settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Durable-store key holding the whole snapshot.
    pub storage_key: String,
    /// Schema tag written into every snapshot this build produces.
    pub schema_version: String,
    /// Game day for a fresh, recovered or reset ledger.
    pub default_game_day: GameDay,
    /// Export file names are `<prefix><YYYY-MM-DD>.json`.
    pub export_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage_key: "mvd_system_data".into(),
            schema_version: "1.0".into(),
            default_game_day: DEFAULT_GAME_DAY,
            export_prefix: "mvd_system_backup_".into(),
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file. In tests, use LedgerConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: LedgerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.storage_key.is_empty() {
            anyhow::bail!("{path}: storage_key must not be empty");
        }
        if config.schema_version.is_empty() {
            anyhow::bail!("{path}: schema_version must not be empty");
        }
        Ok(config)
    }

    /// Same as `load`, but falls back to defaults when no path is given.
    pub fn load_or_default(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
