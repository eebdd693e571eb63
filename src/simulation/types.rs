//! Core types for the signal simulation
//!
//! Lanes, phases, vehicle kinds and the read-only snapshots handed to
//! rendering collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SignalError;

/// A simulation tick. All durations in the engine are counted in ticks.
pub type Tick = u64;

/// A unique identifier for a vehicle that entered the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VehicleId(pub usize);

/// One of the four approaches to the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    North,
    East,
    South,
    West,
}

impl Lane {
    /// All lanes, in rotation order. This is also the tie-break precedence
    /// for emergency requests arriving on the same tick.
    pub const ALL: [Lane; 4] = [Lane::North, Lane::East, Lane::South, Lane::West];

    /// Ordinal position in [`Lane::ALL`]
    pub fn index(self) -> usize {
        match self {
            Lane::North => 0,
            Lane::East => 1,
            Lane::South => 2,
            Lane::West => 3,
        }
    }

    /// The lane that follows this one in the round-robin rotation
    pub fn next(self) -> Lane {
        Lane::ALL[(self.index() + 1) % Lane::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::North => "North",
            Lane::East => "East",
            Lane::South => "South",
            Lane::West => "West",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for Lane {
    type Error = SignalError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Lane::ALL
            .get(index)
            .copied()
            .ok_or_else(|| SignalError::InvalidLane(index.to_string()))
    }
}

impl FromStr for Lane {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Lane::North),
            "east" | "e" => Ok(Lane::East),
            "south" | "s" => Ok(Lane::South),
            "west" | "w" => Ok(Lane::West),
            _ => Err(SignalError::InvalidLane(s.to_string())),
        }
    }
}

/// Signal state of a single lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Red => "RED",
            Phase::Yellow => "YELLOW",
            Phase::Green => "GREEN",
        };
        f.write_str(label)
    }
}

/// Type of vehicle waiting at the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleKind {
    Car,
    Bus,
    Truck,
    Rickshaw,
    Bike,
    /// Priority traffic that can preempt the rotation
    Emergency,
}

impl VehicleKind {
    /// Every kind, in the order used for per-kind reports
    pub const ALL: [VehicleKind; 6] = [
        VehicleKind::Car,
        VehicleKind::Bus,
        VehicleKind::Truck,
        VehicleKind::Rickshaw,
        VehicleKind::Bike,
        VehicleKind::Emergency,
    ];

    /// The non-priority kinds the traffic generator draws from
    pub const REGULAR: [VehicleKind; 5] = [
        VehicleKind::Car,
        VehicleKind::Bus,
        VehicleKind::Truck,
        VehicleKind::Rickshaw,
        VehicleKind::Bike,
    ];

    pub fn is_emergency(self) -> bool {
        matches!(self, VehicleKind::Emergency)
    }
}

/// A vehicle queued at the stop line of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedVehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub arrival_tick: Tick,
}

/// A waiting emergency vehicle, derived from the lane queues every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyRequest {
    pub lane: Lane,
    pub arrival_tick: Tick,
}

/// What rendering needs to draw one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneSnapshot {
    pub lane: Lane,
    pub phase: Phase,
    pub phase_remaining: u32,
    pub waiting_count: usize,
    pub waiting_emergencies: usize,
}

/// Read-only copy of the engine state at a tick boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntersectionSnapshot {
    /// Number of ticks processed so far
    pub tick: Tick,
    pub lanes: [LaneSnapshot; 4],
}

impl IntersectionSnapshot {
    pub fn lane(&self, lane: Lane) -> &LaneSnapshot {
        &self.lanes[lane.index()]
    }

    /// Lanes currently showing GREEN or YELLOW
    pub fn active_lanes(&self) -> Vec<Lane> {
        self.lanes
            .iter()
            .filter(|l| l.phase != Phase::Red)
            .map(|l| l.lane)
            .collect()
    }
}
