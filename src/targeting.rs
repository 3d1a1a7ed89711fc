//! Predictive aiming.
//!
//! The opponent is assumed to keep its last observed heading and velocity.
//! Only the latest observation is used; there is no velocity regression.

use crate::firepower::{projectile_speed, FirePowerCurve};
use crate::geometry::{bearing_to, distance, project, turn_toward, Point};
use crate::model::{Battlefield, Observation, SelfState};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_INTERCEPT_STEPS: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionMode {
    /// Tick-by-tick intercept search, stopping at walls.
    Iterative { max_steps: u32 },
    /// One projection over `distance / speed` ticks, then clamped.
    Linear,
}

impl Default for PredictionMode {
    fn default() -> Self {
        Self::Iterative {
            max_steps: DEFAULT_MAX_INTERCEPT_STEPS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireGate {
    /// Fire only when the gun is within this many degrees of the aim.
    pub max_gun_turn: f64,
}

impl Default for FireGate {
    fn default() -> Self {
        Self { max_gun_turn: 10.0 }
    }
}

impl FireGate {
    pub fn allows(&self, me: &SelfState, solution: &FiringSolution) -> bool {
        solution.gun_turn.abs() < self.max_gun_turn && me.gun_ready() && solution.power <= me.energy
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intercept {
    pub position: Point,
    /// Number of whole ticks the search advanced.
    pub steps: u32,
    pub hit_wall: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiringSolution {
    pub opponent: Point,
    pub predicted: Point,
    pub aim_bearing: f64,
    pub gun_turn: f64,
    pub power: f64,
    pub speed: f64,
    pub steps: u32,
}

pub fn opponent_position(me: &SelfState, obs: &Observation) -> Point {
    project(me.position, obs.absolute_bearing(me), obs.distance)
}

/// Fixed-point search for the intercept tick: advance the opponent one tick
/// at a time until a projectile fired now would have covered the distance.
pub fn iterative_intercept(
    shooter: Point,
    start: Point,
    heading: f64,
    velocity: f64,
    speed: f64,
    field: &Battlefield,
    max_steps: u32,
) -> Intercept {
    let speed = if speed > 0.0 { speed } else { projectile_speed(f64::INFINITY) };
    let rad = heading.to_radians();
    let (step_x, step_y) = (rad.sin() * velocity, rad.cos() * velocity);

    let mut predicted = start;
    let mut steps = 0u32;
    while steps < max_steps {
        steps += 1;
        if steps as f64 * speed >= distance(shooter, predicted) {
            break;
        }
        predicted.x += step_x;
        predicted.y += step_y;
        if !field.contains(predicted) {
            return Intercept {
                position: field.clamp(predicted),
                steps,
                hit_wall: true,
            };
        }
    }

    Intercept {
        position: field.clamp(predicted),
        steps,
        hit_wall: false,
    }
}

pub fn linear_intercept(
    shooter: Point,
    start: Point,
    heading: f64,
    velocity: f64,
    speed: f64,
    field: &Battlefield,
) -> Intercept {
    let speed = if speed > 0.0 { speed } else { projectile_speed(f64::INFINITY) };
    let flight = distance(shooter, start) / speed;
    let raw = project(start, heading, velocity * flight);
    Intercept {
        position: field.clamp(raw),
        steps: flight.ceil() as u32,
        hit_wall: !field.contains(raw),
    }
}

pub fn aim_bearing(me: &SelfState, target: Point) -> f64 {
    bearing_to(me.position, target)
}

pub fn solve(
    me: &SelfState,
    obs: &Observation,
    field: &Battlefield,
    mode: PredictionMode,
    curve: &FirePowerCurve,
) -> FiringSolution {
    let opponent = opponent_position(me, obs);
    let power = curve.choose(obs.distance, me.energy);
    let speed = projectile_speed(power);

    let intercept = match mode {
        PredictionMode::Iterative { max_steps } => iterative_intercept(
            me.position,
            opponent,
            obs.heading,
            obs.velocity,
            speed,
            field,
            max_steps,
        ),
        PredictionMode::Linear => {
            linear_intercept(me.position, opponent, obs.heading, obs.velocity, speed, field)
        }
    };

    let aim = aim_bearing(me, intercept.position);
    FiringSolution {
        opponent,
        predicted: intercept.position,
        aim_bearing: aim,
        gun_turn: turn_toward(me.gun_heading, aim),
        power,
        speed,
        steps: intercept.steps,
    }
}
