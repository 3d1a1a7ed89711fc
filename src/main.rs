use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tank_autopilot::arena::ArenaConfig;
use tank_autopilot::bots::{bot_ids, bot_manifest_entries, create_bot, describe_bots, CONFIG_PREFIX};
use tank_autopilot::config::BotConfig;
use tank_autopilot::model::Battlefield;
use tank_autopilot::runner::{run_duel_in, write_report};
use tank_autopilot::util::{parse_seed, seed_to_hex};

#[derive(Parser, Debug)]
#[command(name = "tank-autopilot")]
#[command(about = "Configurable Robocode-style tank bots and a reference duel arena")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available bots
    ListBots,
    /// Export full bot manifest (including config fingerprints)
    RosterManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective JSON config of a bot
    ShowConfig {
        #[arg(long)]
        bot: String,
    },
    /// Run one duel in the reference arena
    Duel {
        #[arg(long)]
        bot: String,
        #[arg(long)]
        opponent: String,
        #[arg(long, default_value = "0x00000001")]
        seed: String,
        #[arg(long, default_value_t = 3_000)]
        max_ticks: u64,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn unknown_bot(id: &str) -> anyhow::Error {
    let available = bot_ids().join(", ");
    anyhow!("unknown bot '{id}'. available: {available} (or {CONFIG_PREFIX}<path>)")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::ListBots => {
            for (id, description) in describe_bots() {
                println!("{id:12} {description}");
            }
        }
        Commands::RosterManifest { output } => {
            let manifest = bot_manifest_entries();
            let encoded = serde_json::to_vec_pretty(&manifest)?;
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, encoded)?;
                println!("wrote={}", path.display());
                println!("bots={}", manifest.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::ShowConfig { bot } => {
            let config = match bot.strip_prefix(CONFIG_PREFIX) {
                Some(path) => BotConfig::from_json_file(Path::new(path))?,
                None => {
                    let mut config = BotConfig::preset(&bot).ok_or_else(|| unknown_bot(&bot))?;
                    config.clamp();
                    config
                }
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Duel {
            bot,
            opponent,
            seed,
            max_ticks,
            width,
            height,
            output,
        } => {
            for id in [&bot, &opponent] {
                if create_bot(id).is_none() {
                    return Err(unknown_bot(id));
                }
            }
            let seed = parse_seed(&seed)?;
            let config = ArenaConfig {
                field: Battlefield { width, height },
                max_ticks,
            };
            let report = run_duel_in(&bot, &opponent, seed, config)?;

            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", report.ticks);
            for metrics in &report.combatants {
                println!(
                    "{:12} energy={:.1} shots={} hits={} taken={} walls={} survived={}",
                    metrics.bot_id,
                    metrics.final_energy,
                    metrics.shots_fired,
                    metrics.shots_hit,
                    metrics.hits_taken,
                    metrics.wall_hits,
                    metrics.survived
                );
            }
            println!("winner={}", report.winner.as_deref().unwrap_or("none"));
            if let Some(path) = output {
                write_report(&path, &report)?;
                println!("wrote={}", path.display());
            }
        }
    }

    Ok(())
}
