use crate::geometry::normalize_relative;
use crate::model::{Observation, SelfState};
use serde::{Deserialize, Serialize};

/// Largest overshoot that still converges when the host applies the full
/// requested turn: the residual error shrinks by `|1 - k|` per tick.
pub const MAX_LOCK_OVERSHOOT: f64 = 1.9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RadarMode {
    /// Turn by a fixed amount every tick, ignoring detections.
    Sweep { degrees: f64 },
    /// Re-center on the last sighting, falling back to a sweep once the
    /// target has not been seen for `lost_after_ticks`.
    Lock {
        overshoot: f64,
        sweep_degrees: f64,
        lost_after_ticks: u64,
    },
}

impl Default for RadarMode {
    fn default() -> Self {
        Self::Lock {
            overshoot: MAX_LOCK_OVERSHOOT,
            sweep_degrees: 360.0,
            lost_after_ticks: 2,
        }
    }
}

impl RadarMode {
    pub fn clamp(&mut self) {
        match self {
            Self::Sweep { degrees } => {
                *degrees = sweep_clamp(*degrees);
            }
            Self::Lock {
                overshoot,
                sweep_degrees,
                lost_after_ticks,
            } => {
                *overshoot = overshoot.clamp(1.0, MAX_LOCK_OVERSHOOT);
                *sweep_degrees = sweep_clamp(*sweep_degrees);
                *lost_after_ticks = (*lost_after_ticks).clamp(1, 60);
            }
        }
    }
}

fn sweep_clamp(degrees: f64) -> f64 {
    // A zero sweep would never find anything.
    let magnitude = degrees.abs().clamp(10.0, 720.0);
    if degrees < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Radar turn that re-centers on an observation, scaled by `overshoot`.
pub fn lock_turn(me: &SelfState, obs: &Observation, overshoot: f64) -> f64 {
    normalize_relative(me.heading + obs.bearing - me.radar_heading) * overshoot
}

/// Tracks when the opponent was last seen so the lock can fall back to a
/// sweep.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadarController {
    last_seen: Option<u64>,
    locked: bool,
}

impl RadarController {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Radar command for a fresh observation, if the mode tracks targets.
    pub fn on_scan(&mut self, mode: RadarMode, me: &SelfState, obs: &Observation) -> Option<f64> {
        self.last_seen = Some(obs.tick);
        match mode {
            RadarMode::Sweep { .. } => None,
            RadarMode::Lock { overshoot, .. } => {
                self.locked = true;
                Some(lock_turn(me, obs, overshoot))
            }
        }
    }

    /// Radar command for a tick without a usable scan. Sweep mode answers
    /// on every tick.
    pub fn idle_turn(&mut self, mode: RadarMode, tick: u64) -> Option<f64> {
        match mode {
            RadarMode::Sweep { degrees } => Some(degrees),
            RadarMode::Lock {
                sweep_degrees,
                lost_after_ticks,
                ..
            } => {
                let lost = match self.last_seen {
                    None => true,
                    Some(seen) => tick.saturating_sub(seen) >= lost_after_ticks,
                };
                if !lost {
                    return None;
                }
                if self.locked {
                    tracing::debug!(tick, "radar lock lost, sweeping");
                    self.locked = false;
                }
                Some(sweep_degrees)
            }
        }
    }
}
