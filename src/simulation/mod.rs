//! Standalone signal control engine
//!
//! Everything needed to run a single four-way intersection headless: lane
//! queues, adaptive green timing, emergency arbitration, the phase state
//! machine and metrics. Rendering and persistence stay with the caller.

mod arbiter;
mod config;
mod error;
mod lane_queue;
mod metrics;
mod signal;
mod spawner;
mod timing;
mod types;
mod world;

pub use arbiter::{arbitrate, select_request, ArbiterDecision};
pub use config::{
    SignalConfig, DEFAULT_DEPARTURE_GAP, DEFAULT_DURATION_TICKS, DEFAULT_FORMULA_BASE,
    DEFAULT_FORMULA_COEFF, DEFAULT_FORMULA_EXPONENT, DEFAULT_MAX_GREEN, DEFAULT_MIN_GREEN,
    DEFAULT_YELLOW,
};
pub use error::{SignalError, SignalResult};
pub use lane_queue::LaneQueueTracker;
pub use metrics::{KindSummary, LaneSummary, MetricsRecorder, MetricsSample, MetricsSummary};
pub use signal::{PhaseCycleState, PhaseEvent, Service, SignalStateMachine};
pub use spawner::{SpawnEvent, TrafficGenerator, DEFAULT_EMERGENCY_RATE, DEFAULT_SPAWN_RATE};
pub use timing::{green_duration, raw_green_duration};
pub use types::{
    EmergencyRequest, IntersectionSnapshot, Lane, LaneSnapshot, Phase, QueuedVehicle, Tick,
    VehicleId, VehicleKind,
};
pub use world::{Arrival, SimWorld, TickReport};
