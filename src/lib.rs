//! Decision logic for Robocode-style tank duels: radar control, predictive
//! aiming, fire-power choice and evasive movement, plus a small reference
//! arena that drives the bots tick by tick.

pub mod arena;
pub mod bot;
pub mod bots;
pub mod config;
pub mod firepower;
pub mod geometry;
pub mod model;
pub mod movement;
pub mod radar;
pub mod rng;
pub mod runner;
pub mod targeting;
pub mod util;
