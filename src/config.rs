use crate::firepower::FirePowerCurve;
use crate::movement::{
    Conservation, DamageResponse, EvasionMode, FlipSchedule, LowEnergyRetreat, Retaliation,
    WallResponse,
};
use crate::radar::RadarMode;
use crate::targeting::{FireGate, PredictionMode, DEFAULT_MAX_INTERCEPT_STEPS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PRESET_IDS: [&str; 3] = ["carlos", "tank", "supremo"];

/// Full behavior of one bot. Missing fields in a JSON file fall back to the
/// baseline in [`BotConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub id: String,
    pub description: String,

    pub radar: RadarMode,
    pub prediction: PredictionMode,
    pub fire_power: FirePowerCurve,
    pub fire_gate: FireGate,

    pub evasion: EvasionMode,
    pub flip_schedule: Option<FlipSchedule>,
    /// Reverse when the opponent's energy drops by a shot-sized amount.
    pub flip_on_opponent_fire: bool,
    pub low_energy_retreat: Option<LowEnergyRetreat>,
    pub conservation: Option<Conservation>,
    /// Distance driven on ticks without a sighting.
    pub cruise_distance: Option<f64>,

    pub wall: WallResponse,
    pub damage: DamageResponse,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            id: "baseline".to_string(),
            description: "Locked radar, iterative intercept, tiered power, plain circling."
                .to_string(),
            radar: RadarMode::default(),
            prediction: PredictionMode::default(),
            fire_power: FirePowerCurve::default(),
            fire_gate: FireGate::default(),
            evasion: EvasionMode::default(),
            flip_schedule: None,
            flip_on_opponent_fire: false,
            low_energy_retreat: None,
            conservation: None,
            cruise_distance: None,
            wall: WallResponse::default(),
            damage: DamageResponse::default(),
        }
    }
}

impl BotConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "carlos" => Some(Self {
                id: "carlos".to_string(),
                description: "Angled perpendicular circling with linear lead and energy-scaled shots."
                    .to_string(),
                radar: RadarMode::Lock {
                    overshoot: 1.9,
                    sweep_degrees: 360.0,
                    lost_after_ticks: 2,
                },
                prediction: PredictionMode::Linear,
                fire_power: FirePowerCurve::EnergyFraction { divisor: 10.0 },
                evasion: EvasionMode::Circling {
                    approach_angle: 30.0,
                    move_distance: 150.0,
                    close_range: 0.0,
                    close_move_distance: 150.0,
                },
                wall: WallResponse {
                    flip: true,
                    retreat_distance: 100.0,
                    body_turn: 0.0,
                },
                damage: DamageResponse {
                    flip: true,
                    dodge: true,
                    turn_jitter: 0.0,
                    move_distance: 100.0,
                    move_jitter: 0.0,
                    gun_turn: None,
                    retaliation: None,
                },
                ..Self::default()
            }),
            "tank" => Some(Self {
                id: "tank".to_string(),
                description:
                    "Tiered-power circler with random reversals, fire dodging and energy conservation."
                        .to_string(),
                radar: RadarMode::Lock {
                    overshoot: 1.0,
                    sweep_degrees: 60.0,
                    lost_after_ticks: 2,
                },
                prediction: PredictionMode::Linear,
                fire_power: FirePowerCurve::default(),
                evasion: EvasionMode::Circling {
                    approach_angle: 0.0,
                    move_distance: 100.0,
                    close_range: 150.0,
                    close_move_distance: 150.0,
                },
                flip_schedule: Some(FlipSchedule {
                    min_interval_ticks: 30,
                    jitter_ticks: 24,
                    probability: 0.3,
                }),
                flip_on_opponent_fire: true,
                conservation: Some(Conservation {
                    energy_below: 15.0,
                    duration_ticks: 90,
                    retreat_distance: 50.0,
                    gun_drift: 10.0,
                }),
                cruise_distance: Some(100.0),
                wall: WallResponse {
                    flip: true,
                    retreat_distance: 120.0,
                    body_turn: 90.0,
                },
                damage: DamageResponse {
                    flip: true,
                    dodge: false,
                    turn_jitter: 0.0,
                    move_distance: -50.0,
                    move_jitter: 0.0,
                    gun_turn: Some(90.0),
                    retaliation: Some(Retaliation {
                        power: 1.0,
                        min_energy: 5.0,
                    }),
                },
                ..Self::default()
            }),
            "supremo" => Some(Self {
                id: "supremo".to_string(),
                description:
                    "Distance-reactive skirmisher with iterative intercept and low-energy retreat."
                        .to_string(),
                radar: RadarMode::Lock {
                    overshoot: 1.9,
                    sweep_degrees: 360.0,
                    lost_after_ticks: 2,
                },
                prediction: PredictionMode::Iterative {
                    max_steps: DEFAULT_MAX_INTERCEPT_STEPS,
                },
                fire_power: FirePowerCurve::EnergyFraction { divisor: 20.0 },
                evasion: EvasionMode::DistanceReactive {
                    retreat_below: 200.0,
                    retreat_distance: 100.0,
                    retreat_jitter: 50.0,
                    advance_distance: 150.0,
                    advance_jitter: 100.0,
                    turn_jitter: 30.0,
                },
                low_energy_retreat: Some(LowEnergyRetreat {
                    energy_below: 30.0,
                    min_distance: 150.0,
                    distance: 100.0,
                }),
                wall: WallResponse {
                    flip: false,
                    retreat_distance: 50.0,
                    body_turn: 90.0,
                },
                damage: DamageResponse {
                    flip: false,
                    dodge: true,
                    turn_jitter: 90.0,
                    move_distance: 100.0,
                    move_jitter: 100.0,
                    gun_turn: None,
                    retaliation: None,
                },
                ..Self::default()
            }),
            _ => None,
        }
    }

    /// Forces every tunable into its legal range. Out-of-range values are
    /// never an error.
    pub fn clamp(&mut self) {
        self.radar.clamp();
        if let PredictionMode::Iterative { max_steps } = &mut self.prediction {
            *max_steps = (*max_steps).clamp(1, 1_000);
        }
        self.fire_power.clamp();
        self.fire_gate.max_gun_turn = self.fire_gate.max_gun_turn.clamp(1.0, 45.0);

        self.evasion.clamp();
        if let Some(schedule) = &mut self.flip_schedule {
            schedule.clamp();
        }
        if let Some(retreat) = &mut self.low_energy_retreat {
            retreat.energy_below = retreat.energy_below.clamp(0.0, 100.0);
            retreat.min_distance = retreat.min_distance.clamp(0.0, 1_000.0);
            retreat.distance = retreat.distance.clamp(0.0, 400.0);
        }
        if let Some(conservation) = &mut self.conservation {
            conservation.clamp();
        }
        if let Some(cruise) = &mut self.cruise_distance {
            *cruise = cruise.clamp(-400.0, 400.0);
        }

        self.wall.retreat_distance = self.wall.retreat_distance.clamp(0.0, 400.0);
        self.wall.body_turn = self.wall.body_turn.clamp(-180.0, 180.0);

        self.damage.turn_jitter = self.damage.turn_jitter.clamp(0.0, 180.0);
        self.damage.move_distance = self.damage.move_distance.clamp(-400.0, 400.0);
        self.damage.move_jitter = self.damage.move_jitter.clamp(0.0, 200.0);
        if let Some(turn) = &mut self.damage.gun_turn {
            *turn = turn.clamp(-180.0, 180.0);
        }
        if let Some(retaliation) = &mut self.damage.retaliation {
            retaliation.power = retaliation.power.clamp(0.1, 3.0);
            retaliation.min_energy = retaliation.min_energy.clamp(0.0, 100.0);
        }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let mut cfg: Self = serde_json::from_slice(bytes).context("invalid bot config JSON")?;
        cfg.clamp();
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        Self::from_json_slice(&data).with_context(|| format!("failed parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_exists_and_is_already_legal() {
        for id in PRESET_IDS {
            let cfg = BotConfig::preset(id).unwrap_or_else(|| panic!("missing preset {id}"));
            assert_eq!(cfg.id, id);
            let mut clamped = cfg.clone();
            clamped.clamp();
            assert_eq!(clamped, cfg, "preset {id} changed under clamp");
        }
        assert!(BotConfig::preset("nope").is_none());
    }

    #[test]
    fn clamp_pulls_overshoot_and_power_into_range() {
        let mut cfg = BotConfig {
            radar: RadarMode::Lock {
                overshoot: 2.0,
                sweep_degrees: 360.0,
                lost_after_ticks: 2,
            },
            fire_power: FirePowerCurve::EnergyFraction { divisor: 0.0 },
            ..BotConfig::default()
        };
        cfg.clamp();
        assert_eq!(
            cfg.radar,
            RadarMode::Lock {
                overshoot: 1.9,
                sweep_degrees: 360.0,
                lost_after_ticks: 2,
            }
        );
        assert_eq!(cfg.fire_power, FirePowerCurve::EnergyFraction { divisor: 1.0 });
    }

    #[test]
    fn partial_json_fills_from_baseline() -> Result<()> {
        let raw = br#"{
            "id": "custom",
            "radar": { "kind": "sweep", "degrees": 0 },
            "flip_on_opponent_fire": true
        }"#;
        let cfg = BotConfig::from_json_slice(raw)?;
        assert_eq!(cfg.id, "custom");
        assert_eq!(cfg.radar, RadarMode::Sweep { degrees: 10.0 });
        assert!(cfg.flip_on_opponent_fire);
        assert_eq!(cfg.prediction, PredictionMode::default());
        assert_eq!(cfg.wall, WallResponse::default());
        Ok(())
    }

    #[test]
    fn preset_round_trips_through_json() -> Result<()> {
        for id in PRESET_IDS {
            let cfg = BotConfig::preset(id).unwrap_or_default();
            let encoded = serde_json::to_vec(&cfg)?;
            assert_eq!(BotConfig::from_json_slice(&encoded)?, cfg);
        }
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(BotConfig::from_json_slice(b"{ not json").is_err());
    }
}
