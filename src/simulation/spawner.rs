//! Random traffic generation for headless runs
//!
//! Stands in for the external arrival feed: each tick it may produce one
//! spawn event on a random lane.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::types::{Lane, VehicleKind};

/// Chance per tick that a vehicle arrives
pub const DEFAULT_SPAWN_RATE: f64 = 0.5;
/// Chance that an arriving vehicle is an emergency vehicle
pub const DEFAULT_EMERGENCY_RATE: f64 = 0.015;

/// A vehicle showing up at the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnEvent {
    pub lane: Lane,
    pub kind: VehicleKind,
}

pub struct TrafficGenerator {
    rng: StdRng,
    spawn_rate: f64,
    emergency_rate: f64,
}

impl TrafficGenerator {
    /// Rates are clamped into `[0, 1]`
    pub fn new(seed: u64, spawn_rate: f64, emergency_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            spawn_rate: probability(spawn_rate),
            emergency_rate: probability(emergency_rate),
        }
    }

    pub fn with_defaults(seed: u64) -> Self {
        Self::new(seed, DEFAULT_SPAWN_RATE, DEFAULT_EMERGENCY_RATE)
    }

    /// Draw this tick's arrival, if any
    pub fn next_event(&mut self) -> Option<SpawnEvent> {
        if !self.rng.random_bool(self.spawn_rate) {
            return None;
        }

        let kind = if self.rng.random_bool(self.emergency_rate) {
            VehicleKind::Emergency
        } else {
            *VehicleKind::REGULAR.choose(&mut self.rng)?
        };
        let lane = *Lane::ALL.choose(&mut self.rng)?;
        Some(SpawnEvent { lane, kind })
    }
}

fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}
