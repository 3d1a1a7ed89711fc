//! Evasive movement: where to steer, how far to drive, and when to reverse.

use crate::firepower::bound_power;
use crate::geometry::normalize_relative;
use crate::model::{IntentBuffer, Observation, SelfState};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Energy drop between two sightings that looks like the opponent firing.
const SHOT_ENERGY_MIN: f64 = 0.1;
const SHOT_ENERGY_MAX: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnergyMode {
    #[default]
    Normal,
    Conserving {
        since: u64,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementState {
    pub direction: Direction,
    pub mode: EnergyMode,
    pub last_flip_tick: Option<u64>,
    pub next_flip_check: Option<u64>,
    pub last_opponent_energy: Option<f64>,
}

impl MovementState {
    pub fn flip(&mut self, tick: u64, reason: &'static str) {
        self.direction = self.direction.flipped();
        self.last_flip_tick = Some(tick);
        tracing::debug!(tick, reason, direction = ?self.direction, "movement direction flipped");
    }

    pub fn is_conserving(&self) -> bool {
        matches!(self.mode, EnergyMode::Conserving { .. })
    }
}

// ── Configuration ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvasionMode {
    /// Drive roughly perpendicular to the opponent. `approach_angle` tilts
    /// the path toward it.
    Circling {
        approach_angle: f64,
        move_distance: f64,
        close_range: f64,
        close_move_distance: f64,
    },
    /// Back off when close, push in when far, with jittered magnitudes.
    DistanceReactive {
        retreat_below: f64,
        retreat_distance: f64,
        retreat_jitter: f64,
        advance_distance: f64,
        advance_jitter: f64,
        turn_jitter: f64,
    },
}

impl Default for EvasionMode {
    fn default() -> Self {
        Self::Circling {
            approach_angle: 0.0,
            move_distance: 100.0,
            close_range: 150.0,
            close_move_distance: 150.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlipSchedule {
    pub min_interval_ticks: u64,
    pub jitter_ticks: u64,
    pub probability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LowEnergyRetreat {
    pub energy_below: f64,
    pub min_distance: f64,
    pub distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conservation {
    pub energy_below: f64,
    pub duration_ticks: u64,
    pub retreat_distance: f64,
    pub gun_drift: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallResponse {
    pub flip: bool,
    pub retreat_distance: f64,
    pub body_turn: f64,
}

impl Default for WallResponse {
    fn default() -> Self {
        Self {
            flip: true,
            retreat_distance: 100.0,
            body_turn: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Retaliation {
    pub power: f64,
    pub min_energy: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageResponse {
    pub flip: bool,
    /// Turn side-on to the shooter (`90 - bearing`).
    pub dodge: bool,
    pub turn_jitter: f64,
    /// Signed; negative backs away in the current direction.
    pub move_distance: f64,
    pub move_jitter: f64,
    pub gun_turn: Option<f64>,
    pub retaliation: Option<Retaliation>,
}

impl Default for DamageResponse {
    fn default() -> Self {
        Self {
            flip: true,
            dodge: true,
            turn_jitter: 0.0,
            move_distance: 100.0,
            move_jitter: 0.0,
            gun_turn: None,
            retaliation: None,
        }
    }
}

impl EvasionMode {
    pub fn clamp(&mut self) {
        match self {
            Self::Circling {
                approach_angle,
                move_distance,
                close_range,
                close_move_distance,
            } => {
                *approach_angle = approach_angle.clamp(-60.0, 60.0);
                *move_distance = move_distance.clamp(0.0, 400.0);
                *close_range = close_range.clamp(0.0, 1_000.0);
                *close_move_distance = close_move_distance.clamp(0.0, 400.0);
            }
            Self::DistanceReactive {
                retreat_below,
                retreat_distance,
                retreat_jitter,
                advance_distance,
                advance_jitter,
                turn_jitter,
            } => {
                *retreat_below = retreat_below.clamp(0.0, 1_000.0);
                *retreat_distance = retreat_distance.clamp(0.0, 400.0);
                *retreat_jitter = retreat_jitter.clamp(0.0, 200.0);
                *advance_distance = advance_distance.clamp(0.0, 400.0);
                *advance_jitter = advance_jitter.clamp(0.0, 200.0);
                *turn_jitter = turn_jitter.clamp(0.0, 90.0);
            }
        }
    }
}

impl FlipSchedule {
    pub fn clamp(&mut self) {
        self.min_interval_ticks = self.min_interval_ticks.clamp(1, 3_000);
        self.jitter_ticks = self.jitter_ticks.min(3_000);
        self.probability = self.probability.clamp(0.0, 1.0);
    }
}

impl Conservation {
    pub fn clamp(&mut self) {
        self.energy_below = self.energy_below.clamp(0.0, 100.0);
        self.duration_ticks = self.duration_ticks.clamp(1, 3_000);
        self.retreat_distance = self.retreat_distance.clamp(0.0, 400.0);
        self.gun_drift = self.gun_drift.clamp(-20.0, 20.0);
    }

    pub fn expired(&self, state: &MovementState, tick: u64) -> bool {
        match state.mode {
            EnergyMode::Normal => false,
            EnergyMode::Conserving { since } => tick.saturating_sub(since) > self.duration_ticks,
        }
    }
}

// ── Policy ──────────────────────────────────────────────────────────

/// Steering and throttle in reaction to a sighting.
pub fn evade<R: RandomSource + ?Sized>(
    mode: &EvasionMode,
    state: &MovementState,
    obs: &Observation,
    rng: &mut R,
    buf: &mut IntentBuffer,
) {
    let dir = state.direction.sign();
    match *mode {
        EvasionMode::Circling {
            approach_angle,
            move_distance,
            close_range,
            close_move_distance,
        } => {
            buf.set_body_turn(obs.bearing + 90.0 - approach_angle * dir);
            let distance = if obs.distance < close_range {
                close_move_distance
            } else {
                move_distance
            };
            buf.set_move(distance * dir);
        }
        EvasionMode::DistanceReactive {
            retreat_below,
            retreat_distance,
            retreat_jitter,
            advance_distance,
            advance_jitter,
            turn_jitter,
        } => {
            if obs.distance < retreat_below {
                buf.set_move(-(retreat_distance + rng.next_unit() * retreat_jitter) * dir);
            } else {
                buf.set_move((advance_distance + rng.next_unit() * advance_jitter) * dir);
            }
            buf.set_body_turn(obs.bearing + 90.0 - turn_jitter * (rng.next_unit() - 0.5));
        }
    }
}

/// Remembers the opponent's energy and reports whether the drop since the
/// previous sighting looks like a shot.
pub fn opponent_fired(state: &mut MovementState, obs: &Observation) -> bool {
    let previous = state.last_opponent_energy.replace(obs.energy);
    match previous {
        Some(before) => {
            let drop = before - obs.energy;
            (SHOT_ENERGY_MIN..=SHOT_ENERGY_MAX).contains(&drop)
        }
        None => false,
    }
}

/// Coin-toss reversal on a jittered timer.
pub fn scheduled_flip<R: RandomSource + ?Sized>(
    schedule: &FlipSchedule,
    state: &mut MovementState,
    tick: u64,
    rng: &mut R,
) {
    let due = state.next_flip_check.map_or(true, |next| tick >= next);
    if !due {
        return;
    }
    if rng.chance(schedule.probability) {
        state.flip(tick, "schedule");
    }
    let jitter = rng.next_below(schedule.jitter_ticks.min(u32::MAX as u64) as u32) as u64;
    state.next_flip_check = Some(tick + schedule.min_interval_ticks + jitter);
}

pub fn low_energy_retreat(
    cfg: &LowEnergyRetreat,
    me: &SelfState,
    obs: &Observation,
    buf: &mut IntentBuffer,
) -> bool {
    if me.energy < cfg.energy_below && obs.distance > cfg.min_distance {
        buf.set_move(-cfg.distance);
        return true;
    }
    false
}

pub fn enter_conservation(state: &mut MovementState, tick: u64) {
    if state.is_conserving() {
        return;
    }
    state.mode = EnergyMode::Conserving { since: tick };
    tracing::debug!(tick, "entering energy conservation");
}

/// Applies the conservation routine for this tick. Returns `false` once the
/// mode has timed out and normal behavior resumes.
pub fn conserve(cfg: &Conservation, state: &mut MovementState, tick: u64, buf: &mut IntentBuffer) -> bool {
    if !state.is_conserving() {
        return false;
    }
    if cfg.expired(state, tick) {
        state.mode = EnergyMode::Normal;
        tracing::debug!(tick, "energy conservation finished");
        return false;
    }
    buf.set_move(cfg.retreat_distance * state.direction.sign());
    buf.set_gun_turn(cfg.gun_drift);
    buf.clear_fire();
    true
}

/// `bearing` is relative to the body heading; the retreat always moves away
/// from the wall.
pub fn on_hit_wall(
    resp: &WallResponse,
    state: &mut MovementState,
    bearing: f64,
    tick: u64,
    buf: &mut IntentBuffer,
) {
    if resp.flip {
        state.flip(tick, "wall");
    }
    let wall_ahead = bearing.to_radians().cos() > 0.0;
    buf.set_move(if wall_ahead {
        -resp.retreat_distance
    } else {
        resp.retreat_distance
    });
    if resp.body_turn != 0.0 {
        buf.set_body_turn(resp.body_turn);
    }
}

pub fn on_hit_by_bullet<R: RandomSource + ?Sized>(
    resp: &DamageResponse,
    state: &mut MovementState,
    me: &SelfState,
    bearing: f64,
    tick: u64,
    rng: &mut R,
    buf: &mut IntentBuffer,
) {
    if resp.flip {
        state.flip(tick, "damage");
    }
    if resp.dodge {
        let jitter = if resp.turn_jitter > 0.0 {
            (rng.next_unit() - 0.5) * resp.turn_jitter
        } else {
            0.0
        };
        buf.set_body_turn(normalize_relative(90.0 - bearing) + jitter);
    }
    let jitter = if resp.move_jitter > 0.0 {
        rng.next_unit() * resp.move_jitter
    } else {
        0.0
    };
    let magnitude = resp.move_distance + jitter.copysign(resp.move_distance);
    buf.set_move(magnitude * state.direction.sign());

    if let Some(gun_turn) = resp.gun_turn {
        buf.set_gun_turn(gun_turn);
    }
    if let Some(retaliation) = resp.retaliation {
        if !state.is_conserving() && me.gun_ready() && me.energy > retaliation.min_energy {
            buf.set_fire(bound_power(retaliation.power, me.energy));
        }
    }
}
