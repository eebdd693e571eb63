//! Signal phase state machine
//!
//! Owns the authoritative phase of every lane. Only one lane is ever outside
//! RED: the active lane, which runs GREEN then YELLOW before the next lane
//! takes over. A preemption cuts a GREEN on another lane short to YELLOW;
//! one lane's GREEN is never replaced directly by another's.

use log::{debug, info, trace};

use super::arbiter::ArbiterDecision;
use super::config::SignalConfig;
use super::lane_queue::LaneQueueTracker;
use super::timing::green_duration;
use super::types::{Lane, Phase, QueuedVehicle, Tick};

/// The single lane currently outside RED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCycleState {
    pub active: Lane,
    /// GREEN or YELLOW, never RED
    pub phase: Phase,
    /// Ticks left in `phase` after the current one
    pub remaining: u32,
}

impl PhaseCycleState {
    /// Ordinal of the active lane in the rotation
    pub fn rotation_position(&self) -> usize {
        self.active.index()
    }
}

/// Phase changes reported back to the world for logging and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    GreenStarted {
        lane: Lane,
        duration: u32,
        waiting_count: usize,
        /// Granted to a lane other than the next one in rotation
        preempted: bool,
    },
    YellowStarted {
        lane: Lane,
        /// GREEN ended early because another lane preempted it
        cut_short: bool,
    },
}

/// What the green lane did during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// No lane is GREEN this tick
    NoGreen,
    /// GREEN, but the departure gap has not elapsed yet
    Spacing(Lane),
    Departed(Lane, QueuedVehicle),
    /// GREEN with nobody waiting
    Idle(Lane),
}

#[derive(Debug, Default)]
pub struct SignalStateMachine {
    cycle: Option<PhaseCycleState>,
    pending_preemption: Option<Lane>,
    last_departure: Option<Tick>,
    last_green_tick: [Option<Tick>; 4],
}

impl SignalStateMachine {
    /// All lanes start RED; the first call to [`advance`](Self::advance)
    /// grants the first GREEN.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle(&self) -> Option<&PhaseCycleState> {
        self.cycle.as_ref()
    }

    pub fn phase(&self, lane: Lane) -> Phase {
        match &self.cycle {
            Some(cycle) if cycle.active == lane => cycle.phase,
            _ => Phase::Red,
        }
    }

    /// Ticks left in the lane's current phase. RED lanes report zero since
    /// their wait depends on demand not yet known.
    pub fn phase_remaining(&self, lane: Lane) -> u32 {
        match &self.cycle {
            Some(cycle) if cycle.active == lane => cycle.remaining,
            _ => 0,
        }
    }

    pub fn active_lane(&self) -> Option<Lane> {
        self.cycle.map(|c| c.active)
    }

    /// The lane showing GREEN, if the active lane is not in YELLOW
    pub fn active_green(&self) -> Option<Lane> {
        self.cycle
            .filter(|c| c.phase == Phase::Green)
            .map(|c| c.active)
    }

    pub fn pending_preemption(&self) -> Option<Lane> {
        self.pending_preemption
    }

    /// Tick at which `lane` last entered GREEN
    pub fn last_green_tick(&self, lane: Lane) -> Option<Tick> {
        self.last_green_tick[lane.index()]
    }

    /// Apply this tick's arbitration result
    ///
    /// The pending target always mirrors the latest decision, so an earlier
    /// emergency discovered mid-handoff re-targets the preemption.
    pub fn apply_priority(&mut self, decision: ArbiterDecision, config: &SignalConfig) -> Option<PhaseEvent> {
        let target = match decision {
            ArbiterDecision::Preempt(lane) if self.active_green() != Some(lane) => lane,
            _ => {
                self.pending_preemption = None;
                return None;
            }
        };

        if self.pending_preemption != Some(target) {
            info!("Preemption requested for {}", target);
        }
        self.pending_preemption = Some(target);

        let cycle = self.cycle.as_mut()?;
        if cycle.phase == Phase::Green {
            debug!(
                "{} GREEN cut short with {} ticks left, handing off to {}",
                cycle.active, cycle.remaining, target
            );
            cycle.phase = Phase::Yellow;
            cycle.remaining = config.yellow_duration;
            return Some(PhaseEvent::YellowStarted {
                lane: cycle.active,
                cut_short: true,
            });
        }
        None
    }

    /// Move expired phases along: GREEN to YELLOW, YELLOW to the next GREEN
    pub fn advance(
        &mut self,
        tick: Tick,
        tracker: &LaneQueueTracker,
        config: &SignalConfig,
    ) -> Option<PhaseEvent> {
        let natural = match self.cycle {
            None => Lane::ALL[0],
            Some(cycle) => cycle.active.next(),
        };
        let next = match self.cycle {
            None => self.pending_preemption.unwrap_or(natural),
            Some(cycle) if cycle.remaining > 0 => return None,
            Some(cycle) if cycle.phase == Phase::Green => {
                self.cycle = Some(PhaseCycleState {
                    phase: Phase::Yellow,
                    remaining: config.yellow_duration,
                    ..cycle
                });
                debug!("{} GREEN expired, now YELLOW", cycle.active);
                return Some(PhaseEvent::YellowStarted {
                    lane: cycle.active,
                    cut_short: false,
                });
            }
            Some(_) => self.pending_preemption.unwrap_or(natural),
        };
        let preempted = next != natural;
        self.pending_preemption = None;
        Some(self.start_green(next, preempted, tick, tracker, config))
    }

    fn start_green(
        &mut self,
        lane: Lane,
        preempted: bool,
        tick: Tick,
        tracker: &LaneQueueTracker,
        config: &SignalConfig,
    ) -> PhaseEvent {
        let waiting_count = tracker.waiting_count(lane);
        let duration = green_duration(config, waiting_count);

        self.cycle = Some(PhaseCycleState {
            active: lane,
            phase: Phase::Green,
            remaining: duration,
        });
        self.last_departure = None;
        self.last_green_tick[lane.index()] = Some(tick);

        debug!(
            "{} GREEN for {} ticks ({} waiting{})",
            lane,
            duration,
            waiting_count,
            if preempted { ", preempted" } else { "" }
        );
        PhaseEvent::GreenStarted {
            lane,
            duration,
            waiting_count,
            preempted,
        }
    }

    /// Let the head vehicle of the green lane through if the gap allows
    pub fn serve(&mut self, tick: Tick, tracker: &mut LaneQueueTracker, config: &SignalConfig) -> Service {
        let Some(lane) = self.active_green() else {
            return Service::NoGreen;
        };
        if let Some(last) = self.last_departure {
            if tick.saturating_sub(last) < config.departure_gap as Tick
                && tracker.waiting_count(lane) > 0
            {
                return Service::Spacing(lane);
            }
        }
        match tracker.dequeue(lane) {
            Ok(vehicle) => {
                self.last_departure = Some(tick);
                Service::Departed(lane, vehicle)
            }
            Err(err) => {
                trace!("{}, idle green tick", err);
                Service::Idle(lane)
            }
        }
    }

    /// Count down the active phase at the end of a tick
    pub fn finish_tick(&mut self) {
        if let Some(cycle) = self.cycle.as_mut() {
            cycle.remaining = cycle.remaining.saturating_sub(1);
        }
    }
}
