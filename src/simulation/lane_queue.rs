//! Per-lane queues of vehicles waiting at the stop line
//!
//! Each lane keeps its vehicles in arrival order plus a sorted index of the
//! emergency vehicles among them, so the arbiter can read the earliest
//! emergency arrival without scanning the whole queue.

use log::trace;
use sorted_vec::SortedVec;
use std::collections::VecDeque;

use super::error::{SignalError, SignalResult};
use super::types::{EmergencyRequest, Lane, QueuedVehicle, Tick, VehicleId, VehicleKind};

#[derive(Debug, Default)]
struct LaneQueue {
    vehicles: VecDeque<QueuedVehicle>,
    /// (arrival_tick, vehicle) for every waiting emergency vehicle
    emergencies: SortedVec<(Tick, VehicleId)>,
}

/// Tracks who is waiting on each of the four lanes
#[derive(Debug, Default)]
pub struct LaneQueueTracker {
    lanes: [LaneQueue; 4],
    next_id: usize,
    total_enqueued: usize,
}

impl LaneQueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waiting vehicle to the back of `lane`
    pub fn enqueue(&mut self, lane: Lane, kind: VehicleKind, arrival_tick: Tick) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        self.total_enqueued += 1;

        let queue = &mut self.lanes[lane.index()];
        queue.vehicles.push_back(QueuedVehicle {
            id,
            kind,
            arrival_tick,
        });
        if kind.is_emergency() {
            queue.emergencies.insert((arrival_tick, id));
        }

        trace!("Vehicle {:?} ({:?}) queued on {} at tick {}", id, kind, lane, arrival_tick);
        id
    }

    /// Remove the vehicle at the head of `lane`
    pub fn dequeue(&mut self, lane: Lane) -> SignalResult<QueuedVehicle> {
        let queue = &mut self.lanes[lane.index()];
        let vehicle = queue
            .vehicles
            .pop_front()
            .ok_or(SignalError::EmptyLane(lane))?;
        if vehicle.kind.is_emergency() {
            queue.emergencies.remove_item(&(vehicle.arrival_tick, vehicle.id));
        }
        Ok(vehicle)
    }

    pub fn waiting_count(&self, lane: Lane) -> usize {
        self.lanes[lane.index()].vehicles.len()
    }

    pub fn emergency_count(&self, lane: Lane) -> usize {
        self.lanes[lane.index()].emergencies.len()
    }

    /// Arrival tick of the earliest emergency vehicle waiting on `lane`
    pub fn earliest_emergency(&self, lane: Lane) -> Option<Tick> {
        self.lanes[lane.index()]
            .emergencies
            .first()
            .map(|(arrival, _)| *arrival)
    }

    /// Every waiting emergency vehicle, lane by lane in rotation order
    pub fn emergency_requests(&self) -> Vec<EmergencyRequest> {
        Lane::ALL
            .iter()
            .flat_map(|&lane| {
                self.lanes[lane.index()]
                    .emergencies
                    .iter()
                    .map(move |(arrival_tick, _)| EmergencyRequest {
                        lane,
                        arrival_tick: *arrival_tick,
                    })
            })
            .collect()
    }

    /// Vehicles currently waiting on `lane`, head first
    pub fn iter_lane(&self, lane: Lane) -> impl Iterator<Item = &QueuedVehicle> {
        self.lanes[lane.index()].vehicles.iter()
    }

    pub fn total_waiting(&self) -> usize {
        self.lanes.iter().map(|q| q.vehicles.len()).sum()
    }

    /// Vehicles ever enqueued, whether or not they have left
    pub fn total_enqueued(&self) -> usize {
        self.total_enqueued
    }
}
