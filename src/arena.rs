//! Reference host for two-robot duels.
//!
//! Simplified Robocode rules: commands persist across ticks until they run
//! out or are replaced, turns and speed are rate-limited, the radar detects
//! over the arc it swept during the tick, and events are delivered to the
//! bot at the start of the following tick. Robots pass through each other.

use crate::bot::TankBot;
use crate::firepower::{projectile_speed, MAX_POWER, MIN_POWER};
use crate::geometry::{bearing_to, distance, normalize_absolute, normalize_relative, project, Point};
use crate::model::{Battlefield, BotEvent, Intents, Observation, SelfState, TickInput, MARGIN};
use crate::rng::SeededRng;
use core::fmt;

pub const START_ENERGY: f64 = 100.0;
pub const START_GUN_HEAT: f64 = 3.0;
pub const GUN_COOLING_RATE: f64 = 0.1;
pub const MAX_VELOCITY: f64 = 8.0;
pub const ACCELERATION: f64 = 1.0;
pub const DECELERATION: f64 = 2.0;
pub const GUN_TURN_RATE: f64 = 20.0;
pub const RADAR_TURN_RATE: f64 = 45.0;
pub const SCAN_RANGE: f64 = 1_200.0;
pub const MIN_FIELD_SIZE: f64 = 200.0;
/// Spawn points closer than this are re-rolled.
const MIN_SPAWN_SEPARATION: f64 = 150.0;
const SPAWN_ATTEMPTS: u32 = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum ArenaError {
    FieldTooSmall { width: f64, height: f64 },
    ZeroMaxTicks,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldTooSmall { width, height } => write!(
                f,
                "battlefield {width}x{height} is too small (minimum {MIN_FIELD_SIZE}x{MIN_FIELD_SIZE})"
            ),
            Self::ZeroMaxTicks => write!(f, "max_ticks must be > 0"),
        }
    }
}

impl std::error::Error for ArenaError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaConfig {
    pub field: Battlefield,
    pub max_ticks: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            field: Battlefield::default(),
            max_ticks: 3_000,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ArenaError> {
        let Battlefield { width, height } = self.field;
        if !(width >= MIN_FIELD_SIZE && height >= MIN_FIELD_SIZE) {
            return Err(ArenaError::FieldTooSmall { width, height });
        }
        if self.max_ticks == 0 {
            return Err(ArenaError::ZeroMaxTicks);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CombatStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub hits_taken: u32,
    pub wall_hits: u32,
    pub damage_dealt: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuelOutcome {
    pub ticks: u64,
    pub robots: [SelfState; 2],
    pub stats: [CombatStats; 2],
}

impl DuelOutcome {
    /// Index of the winner: the only survivor, or the one with more energy
    /// when time ran out.
    pub fn winner(&self) -> Option<usize> {
        let [a, b] = self.robots;
        match (a.energy > 0.0, b.energy > 0.0) {
            (true, false) => Some(0),
            (false, true) => Some(1),
            (false, false) => None,
            (true, true) if a.energy > b.energy => Some(0),
            (true, true) if b.energy > a.energy => Some(1),
            (true, true) => None,
        }
    }
}

/// Commands still being carried out.
#[derive(Clone, Copy, Debug, Default)]
struct InFlight {
    body_turn: f64,
    gun_turn: f64,
    radar_turn: f64,
    movement: f64,
}

impl InFlight {
    fn merge(&mut self, intents: &Intents) {
        let usable = |value: Option<f64>| value.filter(|v| v.is_finite());
        if let Some(turn) = usable(intents.body_turn) {
            self.body_turn = turn;
        }
        if let Some(turn) = usable(intents.gun_turn) {
            self.gun_turn = turn;
        }
        if let Some(turn) = usable(intents.radar_turn) {
            self.radar_turn = turn;
        }
        if let Some(distance) = usable(intents.movement) {
            self.movement = distance;
        }
    }
}

#[derive(Clone, Debug)]
struct Robot {
    state: SelfState,
    commands: InFlight,
    queued: Vec<BotEvent>,
    stats: CombatStats,
}

impl Robot {
    fn spawn(position: Point, heading: f64) -> Self {
        Self {
            state: SelfState {
                position,
                heading,
                gun_heading: heading,
                radar_heading: heading,
                velocity: 0.0,
                energy: START_ENERGY,
                gun_heat: START_GUN_HEAT,
            },
            commands: InFlight::default(),
            queued: Vec::new(),
            stats: CombatStats::default(),
        }
    }

    fn alive(&self) -> bool {
        self.state.energy > 0.0
    }

    fn drain(&mut self, amount: f64) {
        self.state.energy = (self.state.energy - amount).max(0.0);
    }
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    owner: usize,
    position: Point,
    heading: f64,
    power: f64,
}

pub struct Arena {
    config: ArenaConfig,
    robots: [Robot; 2],
    bullets: Vec<Bullet>,
    tick: u64,
}

impl Arena {
    /// Places both robots at seeded random positions and headings.
    pub fn new(config: ArenaConfig, seed: u32) -> Result<Self, ArenaError> {
        config.validate()?;
        let field = config.field;
        let mut rng = SeededRng::new(seed);
        let spawn = |rng: &mut SeededRng| {
            Point::new(
                rng.next_range(MARGIN, field.width - MARGIN),
                rng.next_range(MARGIN, field.height - MARGIN),
            )
        };

        let first = spawn(&mut rng);
        let mut second = spawn(&mut rng);
        for _ in 0..SPAWN_ATTEMPTS {
            if distance(first, second) >= MIN_SPAWN_SEPARATION {
                break;
            }
            second = spawn(&mut rng);
        }
        let first_heading = rng.next_range(0.0, 360.0);
        let second_heading = rng.next_range(0.0, 360.0);

        Ok(Self::with_robots(
            config,
            [
                Robot::spawn(first, normalize_absolute(first_heading)),
                Robot::spawn(second, normalize_absolute(second_heading)),
            ],
        ))
    }

    /// Places both robots explicitly, gun cold.
    pub fn with_placement(
        config: ArenaConfig,
        placement: [(Point, f64); 2],
    ) -> Result<Self, ArenaError> {
        config.validate()?;
        let [(a, a_heading), (b, b_heading)] = placement;
        let mut robots = [
            Robot::spawn(config.field.clamp(a), normalize_absolute(a_heading)),
            Robot::spawn(config.field.clamp(b), normalize_absolute(b_heading)),
        ];
        for robot in &mut robots {
            robot.state.gun_heat = 0.0;
        }
        Ok(Self::with_robots(config, robots))
    }

    fn with_robots(config: ArenaConfig, robots: [Robot; 2]) -> Self {
        Self {
            config,
            robots,
            bullets: Vec::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn robot(&self, index: usize) -> &SelfState {
        &self.robots[index].state
    }

    pub fn stats(&self, index: usize) -> &CombatStats {
        &self.robots[index].stats
    }

    pub fn bullets_in_flight(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.config.max_ticks || self.robots.iter().any(|r| !r.alive())
    }

    pub fn run(&mut self, first: &mut dyn TankBot, second: &mut dyn TankBot) -> DuelOutcome {
        while !self.is_finished() {
            self.step(first, second);
        }
        self.outcome()
    }

    pub fn outcome(&self) -> DuelOutcome {
        DuelOutcome {
            ticks: self.tick,
            robots: [self.robots[0].state, self.robots[1].state],
            stats: [self.robots[0].stats, self.robots[1].stats],
        }
    }

    /// Advances one tick: each bot decides on last tick's events, then the
    /// world moves.
    pub fn step(&mut self, first: &mut dyn TankBot, second: &mut dyn TankBot) {
        let intents = [self.ask(0, first), self.ask(1, second)];

        let mut radar_sweeps = [(0.0, 0.0); 2];
        for (index, intents) in intents.iter().enumerate() {
            self.robots[index].commands.merge(intents);
            self.fire(index, intents.fire);
            radar_sweeps[index] = self.rotate(index);
            self.advance(index);
        }
        self.move_bullets();
        for (index, (start, turned)) in radar_sweeps.into_iter().enumerate() {
            self.scan(index, start, turned);
        }

        self.tick += 1;
        for (index, robot) in self.robots.iter().enumerate() {
            if !robot.alive() {
                tracing::debug!(tick = self.tick, robot = index, "robot destroyed");
            }
        }
    }

    fn ask(&mut self, index: usize, bot: &mut dyn TankBot) -> Intents {
        let robot = &mut self.robots[index];
        let input = TickInput {
            tick: self.tick,
            me: robot.state,
            field: self.config.field,
            events: std::mem::take(&mut robot.queued),
        };
        bot.decide(&input)
    }

    fn fire(&mut self, index: usize, request: Option<f64>) {
        let robot = &mut self.robots[index];
        let heat = robot.state.gun_heat - GUN_COOLING_RATE;
        // Repeated 0.1 steps leave float dust above zero.
        robot.state.gun_heat = if heat < 1e-9 { 0.0 } else { heat };

        let Some(requested) = request else {
            return;
        };
        if !requested.is_finite() || !robot.state.gun_ready() {
            return;
        }
        let power = requested.clamp(MIN_POWER, MAX_POWER).min(robot.state.energy);
        if power < MIN_POWER {
            return;
        }

        robot.state.gun_heat = 1.0 + power / 5.0;
        robot.drain(power);
        robot.stats.shots_fired += 1;
        self.bullets.push(Bullet {
            owner: index,
            position: robot.state.position,
            heading: robot.state.gun_heading,
            power,
        });
    }

    /// Turns body, gun and radar. Returns where the radar started and how far
    /// it actually turned.
    fn rotate(&mut self, index: usize) -> (f64, f64) {
        let robot = &mut self.robots[index];
        let state = &mut robot.state;
        let commands = &mut robot.commands;

        let body_rate = 10.0 - 0.75 * state.velocity.abs();
        let body = commands.body_turn.clamp(-body_rate, body_rate);
        state.heading = normalize_absolute(state.heading + body);
        commands.body_turn -= body;

        let gun = commands.gun_turn.clamp(-GUN_TURN_RATE, GUN_TURN_RATE);
        state.gun_heading = normalize_absolute(state.gun_heading + gun);
        commands.gun_turn -= gun;

        let start = state.radar_heading;
        let radar = commands.radar_turn.clamp(-RADAR_TURN_RATE, RADAR_TURN_RATE);
        state.radar_heading = normalize_absolute(state.radar_heading + radar);
        commands.radar_turn -= radar;

        (start, radar)
    }

    fn advance(&mut self, index: usize) {
        let field = self.config.field;
        let robot = &mut self.robots[index];
        let state = &mut robot.state;

        state.velocity = next_velocity(state.velocity, robot.commands.movement);
        state.position = project(state.position, state.heading, state.velocity);

        let remaining = robot.commands.movement - state.velocity;
        robot.commands.movement = if remaining * robot.commands.movement <= 0.0 {
            0.0
        } else {
            remaining
        };

        if field.contains(state.position) {
            return;
        }
        let wall = wall_bearing(&field, state.position);
        let damage = (state.velocity.abs() / 2.0 - 1.0).max(0.0);
        state.position = field.clamp(state.position);
        state.velocity = 0.0;
        robot.commands.movement = 0.0;
        let heading = state.heading;
        robot.drain(damage);
        robot.stats.wall_hits += 1;
        robot.queued.push(BotEvent::HitWall {
            bearing: normalize_relative(wall - heading),
        });
    }

    fn move_bullets(&mut self) {
        let field = self.config.field;
        let mut bullets = std::mem::take(&mut self.bullets);
        bullets.retain_mut(|bullet| {
            let speed = projectile_speed(bullet.power);
            let from = bullet.position;
            bullet.position = project(from, bullet.heading, speed);

            let victim = 1 - bullet.owner;
            if self.robots[victim].alive() && crosses_body(from, bullet.position, self.robots[victim].state.position) {
                self.land_hit(bullet, victim);
                return false;
            }
            let p = bullet.position;
            p.x >= 0.0 && p.y >= 0.0 && p.x <= field.width && p.y <= field.height
        });
        self.bullets = bullets;
    }

    fn land_hit(&mut self, bullet: &Bullet, victim: usize) {
        let damage = 4.0 * bullet.power + (2.0 * (bullet.power - 1.0)).max(0.0);
        let shooter = &mut self.robots[bullet.owner];
        shooter.state.energy += 3.0 * bullet.power;
        shooter.stats.shots_hit += 1;
        shooter.stats.damage_dealt += damage;

        let target = &mut self.robots[victim];
        target.drain(damage);
        target.stats.hits_taken += 1;
        let bearing = normalize_relative(bullet.heading + 180.0 - target.state.heading);
        target.queued.push(BotEvent::HitByBullet {
            bearing,
            power: bullet.power,
        });
    }

    fn scan(&mut self, index: usize, start: f64, turned: f64) {
        let other = self.robots[1 - index].state;
        let me = &self.robots[index].state;
        let range = distance(me.position, other.position);
        if range > SCAN_RANGE || range <= 0.0 {
            return;
        }
        let absolute = bearing_to(me.position, other.position);
        let half_width = MARGIN.atan2(range).to_degrees();
        let offset = normalize_relative(absolute - start);
        let (low, high) = if turned >= 0.0 {
            (-half_width, turned + half_width)
        } else {
            (turned - half_width, half_width)
        };
        let seen = turned.abs() >= 360.0 || (offset >= low && offset <= high);
        if !seen {
            return;
        }

        let obs = Observation {
            bearing: normalize_relative(absolute - me.heading),
            distance: range,
            heading: other.heading,
            velocity: other.velocity,
            energy: other.energy,
            tick: self.tick,
        };
        self.robots[index].queued.push(BotEvent::Scanned(obs));
    }
}

/// One tick of speed change toward covering `remaining`: accelerate by 1,
/// brake by 2, never past [`MAX_VELOCITY`].
fn next_velocity(velocity: f64, remaining: f64) -> f64 {
    let goal = remaining.clamp(-MAX_VELOCITY, MAX_VELOCITY);
    let speeding_up =
        goal.abs() > velocity.abs() && (velocity == 0.0 || goal.signum() == velocity.signum());
    let limit = if speeding_up { ACCELERATION } else { DECELERATION };
    velocity + (goal - velocity).clamp(-limit, limit)
}

/// Absolute bearing of the wall a point has crossed.
fn wall_bearing(field: &Battlefield, p: Point) -> f64 {
    if p.y > field.height - MARGIN {
        0.0
    } else if p.x > field.width - MARGIN {
        90.0
    } else if p.y < MARGIN {
        180.0
    } else {
        270.0
    }
}

/// Whether a bullet travelling `from -> to` passes through the square body
/// centered on `center`.
fn crosses_body(from: Point, to: Point, center: Point) -> bool {
    const SAMPLES: u32 = 4;
    (0..=SAMPLES).any(|i| {
        let t = i as f64 / SAMPLES as f64;
        let x = from.x + (to.x - from.x) * t;
        let y = from.y + (to.y - from.y) * t;
        (x - center.x).abs() <= MARGIN && (y - center.y).abs() <= MARGIN
    })
}
