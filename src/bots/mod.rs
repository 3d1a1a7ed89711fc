//! Named bots and their manifest.

use serde::Serialize;

mod roster;

pub use roster::{bot_ids, config_fingerprint, create_bot, describe_bots, CONFIG_PREFIX};

#[derive(Clone, Debug, Serialize)]
pub struct BotManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

pub fn bot_fingerprint(id: &str) -> Option<String> {
    roster::bot_fingerprint(id)
}

pub fn bot_manifest_entries() -> Vec<BotManifestEntry> {
    roster::bot_manifest_entries()
}
