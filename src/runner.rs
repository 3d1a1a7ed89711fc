use crate::arena::{Arena, ArenaConfig, CombatStats, DuelOutcome};
use crate::bot::TankBot;
use crate::bots::create_bot;
use crate::model::{Battlefield, SelfState};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Mixed into the seed of the second bot so mirrored presets do not draw
/// identical random sequences.
const OPPONENT_SEED_SALT: u32 = 0x9E37_79B9;

#[derive(Clone, Debug, Serialize)]
pub struct CombatantMetrics {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub final_energy: f64,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub hits_taken: u32,
    pub wall_hits: u32,
    pub damage_dealt: f64,
    pub survived: bool,
}

impl CombatantMetrics {
    fn collect(bot: &dyn TankBot, state: &SelfState, stats: &CombatStats) -> Self {
        Self {
            bot_id: bot.id().to_string(),
            bot_fingerprint: bot.fingerprint(),
            final_energy: state.energy,
            shots_fired: stats.shots_fired,
            shots_hit: stats.shots_hit,
            hits_taken: stats.hits_taken,
            wall_hits: stats.wall_hits,
            damage_dealt: stats.damage_dealt,
            survived: state.energy > 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DuelReport {
    pub seed: u32,
    pub max_ticks: u64,
    pub field: Battlefield,
    pub ticks: u64,
    /// Slot (0 or 1) of the winner in `combatants`.
    pub winner_slot: Option<usize>,
    pub winner: Option<String>,
    pub combatants: [CombatantMetrics; 2],
}

pub fn run_duel(bot_id: &str, opponent_id: &str, seed: u32, max_ticks: u64) -> Result<DuelReport> {
    run_duel_in(
        bot_id,
        opponent_id,
        seed,
        ArenaConfig {
            max_ticks,
            ..ArenaConfig::default()
        },
    )
}

pub fn run_duel_in(
    bot_id: &str,
    opponent_id: &str,
    seed: u32,
    config: ArenaConfig,
) -> Result<DuelReport> {
    let mut bot = create_bot(bot_id).ok_or_else(|| anyhow!("unknown bot '{bot_id}'"))?;
    let mut opponent =
        create_bot(opponent_id).ok_or_else(|| anyhow!("unknown bot '{opponent_id}'"))?;
    run_duel_instances(bot.as_mut(), opponent.as_mut(), seed, config)
}

pub fn run_duel_instances(
    bot: &mut dyn TankBot,
    opponent: &mut dyn TankBot,
    seed: u32,
    config: ArenaConfig,
) -> Result<DuelReport> {
    let mut arena = Arena::new(config, seed).context("invalid arena setup")?;
    bot.reset(seed);
    opponent.reset(seed ^ OPPONENT_SEED_SALT);

    tracing::info!(
        bot = bot.id(),
        opponent = opponent.id(),
        seed,
        max_ticks = config.max_ticks,
        "duel started"
    );
    let outcome = arena.run(bot, opponent);
    let report = build_report(bot, opponent, seed, &config, &outcome);
    tracing::info!(
        ticks = report.ticks,
        winner = report.winner.as_deref().unwrap_or("none"),
        "duel finished"
    );
    Ok(report)
}

fn build_report(
    bot: &dyn TankBot,
    opponent: &dyn TankBot,
    seed: u32,
    config: &ArenaConfig,
    outcome: &DuelOutcome,
) -> DuelReport {
    let combatants = [
        CombatantMetrics::collect(bot, &outcome.robots[0], &outcome.stats[0]),
        CombatantMetrics::collect(opponent, &outcome.robots[1], &outcome.stats[1]),
    ];
    let winner_slot = outcome.winner();
    DuelReport {
        seed,
        max_ticks: config.max_ticks,
        field: config.field,
        ticks: outcome.ticks,
        winner_slot,
        winner: winner_slot.map(|slot| combatants[slot].bot_id.clone()),
        combatants,
    }
}

pub fn write_report(path: &Path, report: &DuelReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed writing {}", path.display()))
}
