//! The configurable bot: one `decide` call per host tick.

use crate::config::BotConfig;
use crate::model::{BotEvent, IntentBuffer, Intents, Observation, TickInput};
use crate::movement::{self, MovementState};
use crate::radar::{RadarController, RadarMode};
use crate::rng::{RandomSource, SeededRng};
use crate::targeting::{self, FiringSolution};

/// Anything the arena can drive for a duel.
pub trait TankBot {
    fn id(&self) -> &str;
    fn description(&self) -> &str;
    /// Fingerprint of the behavior the bot runs, as listed in the roster
    /// manifest.
    fn fingerprint(&self) -> String;
    fn reset(&mut self, seed: u32);
    fn decide(&mut self, input: &TickInput) -> Intents;
}

pub struct Autopilot<R: RandomSource = SeededRng> {
    config: BotConfig,
    radar: RadarController,
    movement: MovementState,
    rng: R,
    buf: IntentBuffer,
    last_solution: Option<FiringSolution>,
}

impl Autopilot<SeededRng> {
    pub fn new(config: BotConfig) -> Self {
        Self::with_random(config, SeededRng::new(0))
    }
}

impl<R: RandomSource> Autopilot<R> {
    pub fn with_random(mut config: BotConfig, rng: R) -> Self {
        config.clamp();
        Self {
            config,
            radar: RadarController::default(),
            movement: MovementState::default(),
            rng,
            buf: IntentBuffer::new(),
            last_solution: None,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    pub fn radar(&self) -> &RadarController {
        &self.radar
    }

    pub fn last_solution(&self) -> Option<&FiringSolution> {
        self.last_solution.as_ref()
    }

    pub fn reset(&mut self, seed: u32) {
        self.radar.reset();
        self.movement = MovementState::default();
        self.buf = IntentBuffer::new();
        self.last_solution = None;
        self.rng.reseed(seed);
    }

    pub fn decide(&mut self, input: &TickInput) -> Intents {
        let mut scanned = false;
        // A wall or damage reaction owns this tick's move.
        let mut reacted = false;
        for event in &input.events {
            match *event {
                BotEvent::HitWall { bearing } => {
                    reacted = true;
                    movement::on_hit_wall(
                        &self.config.wall,
                        &mut self.movement,
                        bearing,
                        input.tick,
                        &mut self.buf,
                    );
                }
                BotEvent::HitByBullet { bearing, .. } => {
                    reacted = true;
                    movement::on_hit_by_bullet(
                        &self.config.damage,
                        &mut self.movement,
                        &input.me,
                        bearing,
                        input.tick,
                        &mut self.rng,
                        &mut self.buf,
                    );
                }
                BotEvent::Scanned(obs) => {
                    scanned = true;
                    self.on_scanned(input, &obs);
                }
            }
        }
        self.per_tick(input, scanned, reacted);
        self.buf.commit()
    }

    fn on_scanned(&mut self, input: &TickInput, obs: &Observation) {
        let me = &input.me;
        if let Some(turn) = self.radar.on_scan(self.config.radar, me, obs) {
            self.buf.set_radar_turn(turn);
        }

        if self.config.flip_on_opponent_fire && movement::opponent_fired(&mut self.movement, obs) {
            self.movement.flip(input.tick, "opponent fired");
        }
        movement::evade(&self.config.evasion, &self.movement, obs, &mut self.rng, &mut self.buf);
        if let Some(retreat) = &self.config.low_energy_retreat {
            movement::low_energy_retreat(retreat, me, obs, &mut self.buf);
        }

        let solution = targeting::solve(
            me,
            obs,
            &input.field,
            self.config.prediction,
            &self.config.fire_power,
        );
        tracing::trace!(
            tick = input.tick,
            aim = solution.aim_bearing,
            gun_turn = solution.gun_turn,
            power = solution.power,
            steps = solution.steps,
            "firing solution"
        );
        self.buf.set_gun_turn(solution.gun_turn);

        if self.config.fire_gate.allows(me, &solution) {
            match &self.config.conservation {
                Some(conservation) if me.energy < conservation.energy_below => {
                    movement::enter_conservation(&mut self.movement, input.tick);
                }
                _ if !self.movement.is_conserving() => self.buf.set_fire(solution.power),
                _ => {}
            }
        }
        self.last_solution = Some(solution);
    }

    fn per_tick(&mut self, input: &TickInput, scanned: bool, reacted: bool) {
        let conserving = match &self.config.conservation {
            Some(conservation) => {
                movement::conserve(conservation, &mut self.movement, input.tick, &mut self.buf)
            }
            None => false,
        };

        if !conserving {
            if let Some(schedule) = &self.config.flip_schedule {
                movement::scheduled_flip(schedule, &mut self.movement, input.tick, &mut self.rng);
            }
            if let (false, false, Some(distance)) = (scanned, reacted, self.config.cruise_distance) {
                self.buf.set_move(distance * self.movement.direction.sign());
            }
        }

        // A sweep is re-issued every tick; a lock only falls back to it
        // between sightings.
        if !scanned || matches!(self.config.radar, RadarMode::Sweep { .. }) {
            if let Some(turn) = self.radar.idle_turn(self.config.radar, input.tick) {
                self.buf.set_radar_turn(turn);
            }
        }
    }
}

impl<R: RandomSource> TankBot for Autopilot<R> {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn fingerprint(&self) -> String {
        crate::bots::config_fingerprint(&self.config)
    }

    fn reset(&mut self, seed: u32) {
        Autopilot::reset(self, seed);
    }

    fn decide(&mut self, input: &TickInput) -> Intents {
        Autopilot::decide(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Battlefield, SelfState};
    use crate::movement::{Direction, EnergyMode};
    use crate::rng::ScriptedRandom;

    fn me(energy: f64) -> SelfState {
        SelfState {
            position: Point::new(400.0, 300.0),
            heading: 0.0,
            gun_heading: 0.0,
            radar_heading: 0.0,
            velocity: 0.0,
            energy,
            gun_heat: 0.0,
        }
    }

    fn dead_ahead(tick: u64, energy: f64) -> Observation {
        Observation {
            bearing: 0.0,
            distance: 200.0,
            heading: 90.0,
            velocity: 0.0,
            energy,
            tick,
        }
    }

    fn input(tick: u64, me: SelfState, events: Vec<BotEvent>) -> TickInput {
        TickInput {
            tick,
            me,
            field: Battlefield::default(),
            events,
        }
    }

    fn preset(id: &str) -> BotConfig {
        BotConfig::preset(id).unwrap_or_default()
    }

    #[test]
    fn aligned_scan_fires_and_keeps_the_lock() {
        let mut bot = Autopilot::new(preset("carlos"));
        let intents = bot.decide(&input(0, me(100.0), vec![BotEvent::Scanned(dead_ahead(0, 100.0))]));

        assert_eq!(intents.fire, Some(3.0));
        assert_eq!(intents.gun_turn, Some(0.0));
        assert_eq!(intents.radar_turn, Some(0.0));
        assert_eq!(intents.body_turn, Some(60.0));
        assert_eq!(intents.movement, Some(150.0));
        assert!(bot.radar().is_locked());
        assert!(bot.last_solution().is_some());
    }

    #[test]
    fn hot_gun_holds_fire() {
        let mut bot = Autopilot::new(preset("carlos"));
        let mut state = me(100.0);
        state.gun_heat = 0.6;
        let intents = bot.decide(&input(0, state, vec![BotEvent::Scanned(dead_ahead(0, 100.0))]));
        assert_eq!(intents.fire, None);
        assert_eq!(intents.gun_turn, Some(0.0));
    }

    #[test]
    fn wall_then_scan_lets_the_scan_steer() {
        let mut bot = Autopilot::new(preset("carlos"));
        let intents = bot.decide(&input(
            4,
            me(100.0),
            vec![
                BotEvent::HitWall { bearing: 180.0 },
                BotEvent::Scanned(dead_ahead(4, 100.0)),
            ],
        ));
        assert_eq!(bot.movement().direction, Direction::Backward);
        // Circling after the flip drives backwards along the tilted tangent.
        assert_eq!(intents.movement, Some(-150.0));
        assert_eq!(intents.body_turn, Some(120.0));
    }

    #[test]
    fn wall_alone_reverses_and_backs_off() {
        let mut bot = Autopilot::new(preset("carlos"));
        let intents = bot.decide(&input(9, me(100.0), vec![BotEvent::HitWall { bearing: 0.0 }]));
        assert_eq!(bot.movement().direction, Direction::Backward);
        assert_eq!(intents.movement, Some(-100.0));
    }

    #[test]
    fn radar_sweeps_until_first_contact() {
        let mut bot = Autopilot::new(BotConfig::default());
        let intents = bot.decide(&input(0, me(100.0), Vec::new()));
        assert_eq!(intents.radar_turn, Some(360.0));
        assert_eq!(intents.fire, None);
    }

    #[test]
    fn low_energy_shot_opportunity_starts_conservation() {
        let mut bot = Autopilot::with_random(preset("tank"), ScriptedRandom::constant(0.99));
        let intents = bot.decide(&input(0, me(10.0), vec![BotEvent::Scanned(dead_ahead(0, 100.0))]));

        assert_eq!(bot.movement().mode, EnergyMode::Conserving { since: 0 });
        assert_eq!(intents.fire, None);
        assert_eq!(intents.movement, Some(50.0));
        assert_eq!(intents.gun_turn, Some(10.0));

        for tick in 1..=90 {
            let intents = bot.decide(&input(tick, me(10.0), Vec::new()));
            assert_eq!(intents.movement, Some(50.0), "tick {tick}");
            assert_eq!(intents.fire, None);
        }
        assert!(bot.movement().is_conserving());

        let intents = bot.decide(&input(91, me(10.0), Vec::new()));
        assert_eq!(bot.movement().mode, EnergyMode::Normal);
        assert_eq!(intents.movement, Some(100.0));
    }

    #[test]
    fn conserving_bot_does_not_retaliate() {
        let mut bot = Autopilot::with_random(preset("tank"), ScriptedRandom::constant(0.99));
        bot.decide(&input(0, me(10.0), vec![BotEvent::Scanned(dead_ahead(0, 100.0))]));
        let intents = bot.decide(&input(
            1,
            me(10.0),
            vec![BotEvent::HitByBullet {
                bearing: 45.0,
                power: 1.0,
            }],
        ));
        assert_eq!(intents.fire, None);
    }

    #[test]
    fn tank_retaliates_after_a_hit() {
        let mut bot = Autopilot::with_random(preset("tank"), ScriptedRandom::constant(0.99));
        let intents = bot.decide(&input(
            3,
            me(60.0),
            vec![BotEvent::HitByBullet {
                bearing: 45.0,
                power: 2.0,
            }],
        ));
        assert_eq!(bot.movement().direction, Direction::Backward);
        assert_eq!(intents.fire, Some(1.0));
        assert_eq!(intents.gun_turn, Some(90.0));
        // The hit reaction backs off along the flipped direction.
        assert_eq!(intents.movement, Some(50.0));

        // Cruising resumes on the next quiet tick.
        let intents = bot.decide(&input(4, me(60.0), Vec::new()));
        assert_eq!(intents.movement, Some(-100.0));
    }

    #[test]
    fn tank_wall_hit_keeps_its_retreat() {
        let mut bot = Autopilot::with_random(preset("tank"), ScriptedRandom::constant(0.99));
        let intents = bot.decide(&input(7, me(80.0), vec![BotEvent::HitWall { bearing: 0.0 }]));
        assert_eq!(bot.movement().direction, Direction::Backward);
        assert_eq!(intents.movement, Some(-120.0));
        assert_eq!(intents.body_turn, Some(90.0));
    }

    #[test]
    fn wall_behind_drives_forward_off_it() {
        let mut bot = Autopilot::new(preset("carlos"));
        let intents = bot.decide(&input(9, me(100.0), vec![BotEvent::HitWall { bearing: 180.0 }]));
        assert_eq!(bot.movement().direction, Direction::Backward);
        assert_eq!(intents.movement, Some(100.0));
    }

    #[test]
    fn sweep_radar_keeps_turning_while_in_contact() {
        let config = BotConfig {
            radar: RadarMode::Sweep { degrees: 360.0 },
            ..preset("carlos")
        };
        let mut bot = Autopilot::new(config);
        for tick in 0..12 {
            let intents = bot.decide(&input(
                tick,
                me(100.0),
                vec![BotEvent::Scanned(dead_ahead(tick, 100.0))],
            ));
            assert_eq!(intents.radar_turn, Some(360.0), "tick {tick}");
        }
        assert!(!bot.radar().is_locked());
    }

    #[test]
    fn opponent_shot_flips_direction() {
        let mut bot = Autopilot::with_random(preset("tank"), ScriptedRandom::constant(0.99));
        bot.decide(&input(0, me(80.0), vec![BotEvent::Scanned(dead_ahead(0, 100.0))]));
        assert_eq!(bot.movement().direction, Direction::Forward);
        bot.decide(&input(1, me(80.0), vec![BotEvent::Scanned(dead_ahead(1, 97.0))]));
        assert_eq!(bot.movement().direction, Direction::Backward);
        assert_eq!(bot.movement().last_flip_tick, Some(1));
    }

    #[test]
    fn supremo_dodges_with_jitter() {
        let mut bot = Autopilot::with_random(preset("supremo"), ScriptedRandom::new(vec![0.75, 0.5]));
        let intents = bot.decide(&input(
            0,
            me(100.0),
            vec![BotEvent::HitByBullet {
                bearing: 30.0,
                power: 1.0,
            }],
        ));
        assert_eq!(bot.movement().direction, Direction::Forward);
        assert_eq!(intents.body_turn, Some(82.5));
        assert_eq!(intents.movement, Some(150.0));
        assert_eq!(intents.radar_turn, Some(360.0));
        assert_eq!(intents.fire, None);
    }

    #[test]
    fn reset_replays_identically() {
        let script: Vec<TickInput> = (0..40)
            .map(|tick| {
                let events = match tick % 5 {
                    0 => vec![BotEvent::Scanned(dead_ahead(tick, 100.0 - tick as f64 * 0.5))],
                    3 => vec![BotEvent::HitByBullet {
                        bearing: -60.0,
                        power: 1.5,
                    }],
                    _ => Vec::new(),
                };
                input(tick, me(70.0), events)
            })
            .collect();

        for id in ["carlos", "tank", "supremo"] {
            let mut bot = Autopilot::new(preset(id));
            bot.reset(1234);
            let first: Vec<Intents> = script.iter().map(|i| bot.decide(i)).collect();
            bot.reset(1234);
            let second: Vec<Intents> = script.iter().map(|i| bot.decide(i)).collect();
            assert_eq!(first, second, "{id}");
        }
    }
}
