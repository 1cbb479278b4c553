//! Configuration types for Keepsake.
//!
//! `BotConfig` represents the top-level `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

/// Top-level configuration of the bot process.
///
/// Loaded from `~/.keepsake/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// SQLite URL; defaults to `keepsake.db` inside the data directory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Idle timeout for views that do not choose their own, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u32,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,

    /// Ephemeral reply when an interaction targets a widget that has no
    /// live session and no persisted record.
    #[serde(default = "default_expired_reply")]
    pub expired_reply: String,
}

fn default_timeout_secs() -> u32 {
    180
}

fn default_expired_reply() -> String {
    "This widget can no longer be restored. Please run the command again.".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            default_timeout_secs: default_timeout_secs(),
            otel: false,
            expired_reply: default_expired_reply(),
        }
    }
}
