//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the lane queues, the signal state machine and the metrics
//! recorder. Callers feed arrivals in with [`SimWorld::spawn`], drive time
//! with [`SimWorld::tick`] and read state back through snapshots; nothing
//! outside the world mutates engine state.

use log::{info, trace, warn};

use super::arbiter::{arbitrate, ArbiterDecision};
use super::config::SignalConfig;
use super::error::SignalResult;
use super::lane_queue::LaneQueueTracker;
use super::metrics::{MetricsRecorder, MetricsSample, MetricsSummary};
use super::signal::{PhaseEvent, Service, SignalStateMachine};
use super::spawner::SpawnEvent;
use super::types::{IntersectionSnapshot, Lane, LaneSnapshot, Tick, VehicleId, VehicleKind};

/// Result of offering a vehicle to the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    Queued(VehicleId),
    /// The simulation duration has elapsed
    Refused,
}

/// Everything that happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    pub decision: ArbiterDecision,
    pub events: Vec<PhaseEvent>,
    pub service: Service,
}

/// The simulated intersection
pub struct SimWorld {
    config: SignalConfig,
    lanes: LaneQueueTracker,
    signals: SignalStateMachine,
    metrics: MetricsRecorder,

    /// Ticks processed so far; also the arrival tick of the next spawn
    time: Tick,

    /// Set once `duration_ticks` have run
    closed: bool,
    refused: usize,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new_internal(SignalConfig::default())
    }
}

impl SimWorld {
    fn new_internal(config: SignalConfig) -> Self {
        Self {
            config,
            lanes: LaneQueueTracker::new(),
            signals: SignalStateMachine::new(),
            metrics: MetricsRecorder::new(),
            time: 0,
            closed: false,
            refused: 0,
        }
    }

    /// Create a world, rejecting out-of-range configuration
    pub fn new(config: SignalConfig) -> SignalResult<Self> {
        config.validate()?;
        Ok(Self::new_internal(config))
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn lanes(&self) -> &LaneQueueTracker {
        &self.lanes
    }

    pub fn signals(&self) -> &SignalStateMachine {
        &self.signals
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn current_tick(&self) -> Tick {
        self.time
    }

    /// Whether the configured duration has elapsed and arrivals are refused
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn refused_arrivals(&self) -> usize {
        self.refused
    }

    /// Queue a vehicle on `lane`, arriving at the current tick
    pub fn spawn(&mut self, lane: Lane, kind: VehicleKind) -> Arrival {
        if self.closed {
            self.refused += 1;
            warn!(
                "Arrival on {} refused at tick {}: simulation closed",
                lane, self.time
            );
            return Arrival::Refused;
        }
        Arrival::Queued(self.lanes.enqueue(lane, kind, self.time))
    }

    pub fn spawn_event(&mut self, event: SpawnEvent) -> Arrival {
        self.spawn(event.lane, event.kind)
    }

    /// Main simulation tick
    pub fn tick(&mut self) -> TickReport {
        let now = self.time;
        let mut events = Vec::new();

        // Emergency priority first, so a preemption can cut this tick's green
        let decision = arbitrate(&self.lanes, self.signals.active_green());
        events.extend(self.signals.apply_priority(decision, &self.config));

        if let Some(event) = self.signals.advance(now, &self.lanes, &self.config) {
            if let PhaseEvent::GreenStarted {
                lane, preempted, ..
            } = event
            {
                self.metrics.record_green_granted(lane, preempted);
                if preempted {
                    info!("Tick {}: {} granted GREEN for emergency traffic", now, lane);
                }
            }
            events.push(event);
        }

        let service = self.signals.serve(now, &mut self.lanes, &self.config);
        match service {
            Service::Departed(lane, vehicle) => {
                trace!("Vehicle {:?} left {} at tick {}", vehicle.id, lane, now);
                self.metrics.record_green_tick(lane, false);
                self.metrics.record_departure(MetricsSample {
                    vehicle: vehicle.id,
                    lane,
                    kind: vehicle.kind,
                    arrival_tick: vehicle.arrival_tick,
                    departure_tick: now,
                });
            }
            Service::Idle(lane) => self.metrics.record_green_tick(lane, true),
            Service::Spacing(lane) => self.metrics.record_green_tick(lane, false),
            Service::NoGreen => {}
        }

        self.signals.finish_tick();
        self.time += 1;

        if !self.closed && self.time >= self.config.duration_ticks {
            self.closed = true;
            info!(
                "Simulation duration of {} ticks reached, no longer accepting arrivals",
                self.config.duration_ticks
            );
        }

        TickReport {
            tick: now,
            decision,
            events,
            service,
        }
    }

    /// Read-only view of every lane for rendering
    pub fn snapshot(&self) -> IntersectionSnapshot {
        IntersectionSnapshot {
            tick: self.time,
            lanes: Lane::ALL.map(|lane| self.lane_snapshot(lane)),
        }
    }

    fn lane_snapshot(&self, lane: Lane) -> LaneSnapshot {
        LaneSnapshot {
            lane,
            phase: self.signals.phase(lane),
            phase_remaining: self.signals.phase_remaining(lane),
            waiting_count: self.lanes.waiting_count(lane),
            waiting_emergencies: self.lanes.emergency_count(lane),
        }
    }

    /// Aggregate metrics, counting whoever is still queued
    pub fn finish(&self) -> MetricsSummary {
        let still_waiting = Lane::ALL.map(|lane| self.lanes.waiting_count(lane));
        let last_green = Lane::ALL.map(|lane| self.signals.last_green_tick(lane));
        self.metrics.summarize(self.time, still_waiting, last_green)
    }

    /// Print a summary of the intersection state
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        println!("=== Intersection Summary ===");
        println!(
            "Tick: {}{}",
            snapshot.tick,
            if self.closed { " (closed)" } else { "" }
        );
        for lane in &snapshot.lanes {
            println!(
                "  {:>6} {:<6} remaining={:>2} waiting={:>3} emergencies={}",
                lane.phase.to_string(),
                lane.lane.name(),
                lane.phase_remaining,
                lane.waiting_count,
                lane.waiting_emergencies
            );
        }
        if let Some(pending) = self.signals.pending_preemption() {
            println!("  Preemption pending for {}", pending);
        }
        println!(
            "Passed: {}, Waiting: {}, Preemptions: {}",
            self.metrics.total_passed(),
            self.lanes.total_waiting(),
            self.metrics.preemptions()
        );
    }
}
