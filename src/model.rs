//! Values exchanged with the host each tick.
//!
//! The host owns every quantity in [`SelfState`] and [`Observation`]; the bot
//! only reads them and answers with [`Intents`].

use crate::geometry::{normalize_relative, Point};
use serde::{Deserialize, Serialize};

/// Half the body size of a robot. Predictions never leave `[MARGIN, dim - MARGIN]`.
pub const MARGIN: f64 = 18.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    pub width: f64,
    pub height: f64,
}

impl Default for Battlefield {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Battlefield {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= MARGIN && p.y >= MARGIN && p.x <= self.width - MARGIN && p.y <= self.height - MARGIN
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point {
            x: p.x.max(MARGIN).min(self.width - MARGIN),
            y: p.y.max(MARGIN).min(self.height - MARGIN),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfState {
    pub position: Point,
    pub heading: f64,
    pub gun_heading: f64,
    pub radar_heading: f64,
    pub velocity: f64,
    pub energy: f64,
    pub gun_heat: f64,
}

impl SelfState {
    pub fn gun_ready(&self) -> bool {
        self.gun_heat <= 0.0
    }
}

/// One opponent sighting. `bearing` is relative to our heading, `heading` is
/// the opponent's absolute heading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub bearing: f64,
    pub distance: f64,
    pub heading: f64,
    pub velocity: f64,
    pub energy: f64,
    pub tick: u64,
}

impl Observation {
    pub fn absolute_bearing(&self, me: &SelfState) -> f64 {
        me.heading + self.bearing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BotEvent {
    Scanned(Observation),
    /// `bearing` points at where the bullet came from, relative to our heading.
    HitByBullet { bearing: f64, power: f64 },
    HitWall { bearing: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickInput {
    pub tick: u64,
    pub me: SelfState,
    pub field: Battlefield,
    pub events: Vec<BotEvent>,
}

/// Commands committed for one tick. `None` leaves the in-flight command of
/// that sub-system running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Intents {
    pub body_turn: Option<f64>,
    pub gun_turn: Option<f64>,
    pub radar_turn: Option<f64>,
    pub movement: Option<f64>,
    pub fire: Option<f64>,
}

impl Intents {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Set-then-commit builder. Later `set_*` calls within a tick replace earlier
/// ones for the same sub-system; turns are normalized on the way in.
#[derive(Clone, Debug, Default)]
pub struct IntentBuffer {
    pending: Intents,
}

impl IntentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_body_turn(&mut self, degrees: f64) {
        self.pending.body_turn = Some(normalize_relative(degrees));
    }

    pub fn set_gun_turn(&mut self, degrees: f64) {
        self.pending.gun_turn = Some(normalize_relative(degrees));
    }

    /// Radar turns are not normalized: a sweep of 360° or an overshoot past
    /// 180° is a deliberate request.
    pub fn set_radar_turn(&mut self, degrees: f64) {
        self.pending.radar_turn = Some(degrees);
    }

    pub fn set_move(&mut self, distance: f64) {
        self.pending.movement = Some(distance);
    }

    pub fn set_fire(&mut self, power: f64) {
        self.pending.fire = Some(power);
    }

    pub fn clear_fire(&mut self) {
        self.pending.fire = None;
    }

    pub fn commit(&mut self) -> Intents {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_sets_override_earlier_ones() {
        let mut buf = IntentBuffer::new();
        buf.set_move(100.0);
        buf.set_body_turn(370.0);
        buf.set_move(-50.0);

        let intents = buf.commit();
        assert_eq!(intents.movement, Some(-50.0));
        assert_eq!(intents.body_turn, Some(10.0));
        assert_eq!(intents.gun_turn, None);
        assert!(buf.commit().is_idle());
    }

    #[test]
    fn radar_sweeps_keep_full_magnitude() {
        let mut buf = IntentBuffer::new();
        buf.set_radar_turn(360.0);
        assert_eq!(buf.commit().radar_turn, Some(360.0));
    }

    #[test]
    fn clamp_keeps_points_inside_margin() {
        let field = Battlefield::default();
        let p = field.clamp(Point::new(-40.0, 900.0));
        assert_eq!(p, Point::new(MARGIN, 600.0 - MARGIN));
        assert!(field.contains(p));
    }
}
