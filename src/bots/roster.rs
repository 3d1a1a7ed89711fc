use super::BotManifestEntry;
use crate::bot::{Autopilot, TankBot};
use crate::config::BotConfig;
use std::path::Path;

/// Prefix for bots loaded from a JSON config file: `config:<path>`.
pub const CONFIG_PREFIX: &str = "config:";

// Roster order is the order `list-bots` prints.
const ROSTER: [(&str, &str); 3] = [
    ("carlos", "circling"),
    ("tank", "conserving"),
    ("supremo", "reactive"),
];

fn roster_config(id: &str) -> Option<BotConfig> {
    let mut cfg = BotConfig::preset(id)?;
    cfg.clamp();
    Some(cfg)
}

fn load_config_bot(id: &str) -> Option<BotConfig> {
    let path = id.strip_prefix(CONFIG_PREFIX)?;
    match BotConfig::from_json_file(Path::new(path)) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            tracing::warn!(path, error = %format!("{err:#}"), "failed to load bot config");
            None
        }
    }
}

pub fn bot_ids() -> Vec<&'static str> {
    ROSTER.iter().map(|(id, _)| *id).collect()
}

pub fn describe_bots() -> Vec<(&'static str, String)> {
    ROSTER
        .iter()
        .filter_map(|(id, _)| roster_config(id).map(|cfg| (*id, cfg.description)))
        .collect()
}

pub fn create_bot(id: &str) -> Option<Box<dyn TankBot>> {
    let cfg = if id.starts_with(CONFIG_PREFIX) {
        load_config_bot(id)?
    } else {
        roster_config(id)?
    };
    Some(Box::new(Autopilot::new(cfg)))
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;

        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }

        table[i] = c;
        i += 1;
    }

    table
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFFu32
}

fn hash_json(value: &serde_json::Value) -> String {
    let encoded =
        serde_json::to_vec(value).expect("serializing bot config for fingerprint should not fail");
    let digest = crc32(&encoded);
    format!("crc32:{digest:08x}:len:{}", encoded.len())
}

fn config_value(cfg: &BotConfig) -> serde_json::Value {
    serde_json::to_value(cfg).expect("bot config should serialize")
}

pub fn config_fingerprint(cfg: &BotConfig) -> String {
    hash_json(&config_value(cfg))
}

pub(super) fn bot_manifest_entries() -> Vec<BotManifestEntry> {
    let mut out = Vec::new();
    for (id, family) in ROSTER {
        let Some(cfg) = roster_config(id) else {
            continue;
        };
        let config = config_value(&cfg);
        out.push(BotManifestEntry {
            id: id.to_string(),
            family: family.to_string(),
            description: cfg.description.clone(),
            config_hash: hash_json(&config),
            config,
        });
    }
    out
}

pub(super) fn bot_fingerprint(id: &str) -> Option<String> {
    if id.starts_with(CONFIG_PREFIX) {
        return load_config_bot(id).map(|cfg| config_fingerprint(&cfg));
    }
    bot_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}
