use anyhow::Result;
use std::fs;
use tank_autopilot::arena::{ArenaConfig, START_ENERGY};
use tank_autopilot::bots::{bot_ids, create_bot};
use tank_autopilot::model::Battlefield;
use tank_autopilot::runner::{run_duel, run_duel_in, run_duel_instances, write_report};

#[test]
fn every_pairing_finishes_and_reports() -> Result<()> {
    for bot in bot_ids() {
        for opponent in bot_ids() {
            let report = run_duel(bot, opponent, 0x1234, 400)?;
            assert!(report.ticks <= 400);
            assert_eq!(report.combatants[0].bot_id, bot);
            assert_eq!(report.combatants[1].bot_id, opponent);
            for metrics in &report.combatants {
                assert!(metrics.final_energy >= 0.0);
                assert!(metrics.shots_hit <= metrics.shots_fired);
                assert!(metrics.bot_fingerprint.starts_with("crc32:"));
                assert_eq!(metrics.survived, metrics.final_energy > 0.0);
            }
            if let Some(slot) = report.winner_slot {
                assert_eq!(report.winner.as_deref(), Some(report.combatants[slot].bot_id.as_str()));
            }
        }
    }
    Ok(())
}

#[test]
fn duels_are_deterministic_per_seed() -> Result<()> {
    let first = serde_json::to_string(&run_duel("tank", "supremo", 99, 800)?)?;
    let second = serde_json::to_string(&run_duel("tank", "supremo", 99, 800)?)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn bots_engage_in_a_long_duel() -> Result<()> {
    let report = run_duel("carlos", "supremo", 7, 1_500)?;
    let shots: u32 = report.combatants.iter().map(|m| m.shots_fired).sum();
    assert!(shots > 0, "nobody fired in {} ticks", report.ticks);
    let drained = report
        .combatants
        .iter()
        .any(|m| m.final_energy < START_ENERGY);
    assert!(drained);
    Ok(())
}

#[test]
fn reused_instances_replay_after_reset() -> Result<()> {
    let mut bot = create_bot("supremo").ok_or_else(|| anyhow::anyhow!("missing supremo"))?;
    let mut opponent = create_bot("carlos").ok_or_else(|| anyhow::anyhow!("missing carlos"))?;
    let config = ArenaConfig {
        max_ticks: 300,
        ..ArenaConfig::default()
    };
    let a = run_duel_instances(bot.as_mut(), opponent.as_mut(), 5, config)?;
    let b = run_duel_instances(bot.as_mut(), opponent.as_mut(), 5, config)?;
    assert_eq!(serde_json::to_string(&a)?, serde_json::to_string(&b)?);
    Ok(())
}

#[test]
fn setup_errors_are_reported() {
    assert!(run_duel("tank", "nobody", 1, 100).is_err());
    assert!(run_duel("tank", "carlos", 1, 0).is_err());
    let tiny = ArenaConfig {
        field: Battlefield {
            width: 50.0,
            height: 50.0,
        },
        max_ticks: 100,
    };
    assert!(run_duel_in("tank", "carlos", 1, tiny).is_err());
}

#[test]
fn report_is_written_as_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("reports").join("duel.json");
    let report = run_duel("carlos", "tank", 3, 200)?;
    write_report(&path, &report)?;

    let value: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(value["seed"], 3);
    assert_eq!(value["combatants"][0]["bot_id"], "carlos");
    Ok(())
}
