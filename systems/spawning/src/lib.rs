#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting prospect spawn commands.

use churn_defence_core::{
    CanvasSize, Command, CustomerKind, CustomerProfile, Event, Point, EDGE_MARGIN,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SPAWN_RNG_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const SPEED_JITTER_MIN: f64 = 0.8;
const SPEED_JITTER_MAX: f64 = 1.2;
const APPROACH_SPEED_MIN: f64 = 1.0;
const APPROACH_SPEED_MAX: f64 = 2.0;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_probability: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided per-tick chance and seed.
    #[must_use]
    pub const fn new(spawn_probability: f64, rng_seed: u64) -> Self {
        Self {
            spawn_probability,
            rng_seed,
        }
    }
}

/// Pure system that rolls for a new prospect on every advanced frame.
#[derive(Debug)]
pub struct Spawning {
    spawn_probability: f64,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let spawn_probability = if config.spawn_probability.is_finite() {
            config.spawn_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            spawn_probability,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed ^ SPAWN_RNG_STREAM),
        }
    }

    /// Consumes events and emits at most one spawn command per advanced frame.
    pub fn handle(&mut self, events: &[Event], canvas: CanvasSize, out: &mut Vec<Command>) {
        for event in events {
            if !matches!(event, Event::TimeAdvanced { .. }) {
                continue;
            }
            if !self.rng.gen_bool(self.spawn_probability) {
                continue;
            }
            let profile = self.draw_profile(canvas);
            out.push(Command::SpawnCustomer { profile });
        }
    }

    fn draw_profile(&mut self, canvas: CanvasSize) -> CustomerProfile {
        let kind = CustomerKind::ALL
            .choose_weighted(&mut self.rng, |kind| kind.spawn_weight())
            .copied()
            .unwrap_or(CustomerKind::Small);
        let (min_spend, max_spend) = kind.spend_range();
        let spend = self.uniform(min_spend, max_spend);
        let movement_speed =
            kind.base_movement_speed() * self.uniform(SPEED_JITTER_MIN, SPEED_JITTER_MAX);
        let approach_speed = self.uniform(APPROACH_SPEED_MIN, APPROACH_SPEED_MAX);
        let position = self.edge_position(canvas);

        CustomerProfile {
            kind,
            position,
            spend,
            movement_speed,
            approach_speed,
        }
    }

    /// Picks a point on one of the four canvas edges, inset by the edge margin.
    fn edge_position(&mut self, canvas: CanvasSize) -> Point {
        let left = EDGE_MARGIN;
        let top = EDGE_MARGIN;
        let right = (canvas.width() - EDGE_MARGIN).max(left);
        let bottom = (canvas.height() - EDGE_MARGIN).max(top);

        match self.rng.gen_range(0..4) {
            0 => Point::new(self.uniform(left, right), top),
            1 => Point::new(right, self.uniform(top, bottom)),
            2 => Point::new(self.uniform(left, right), bottom),
            _ => Point::new(left, self.uniform(top, bottom)),
        }
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}
