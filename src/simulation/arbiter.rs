//! Emergency priority arbitration
//!
//! Re-evaluated from scratch every tick. The winner is the waiting emergency
//! vehicle that arrived first, across all lanes; same-tick arrivals are
//! ordered by lane precedence North, East, South, West. A later discovery of
//! a strictly earlier arrival re-targets an in-progress preemption.

use super::lane_queue::LaneQueueTracker;
use super::types::{EmergencyRequest, Lane};

/// Outcome of one arbitration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterDecision {
    /// No emergency vehicle is waiting; the normal rotation applies
    NoAction,
    /// The winning lane already has GREEN
    AlreadyServing(Lane),
    /// Preempt the rotation in favour of this lane
    Preempt(Lane),
}

impl ArbiterDecision {
    /// The lane emergency traffic wants served, if any
    pub fn target(self) -> Option<Lane> {
        match self {
            ArbiterDecision::NoAction => None,
            ArbiterDecision::AlreadyServing(lane) | ArbiterDecision::Preempt(lane) => Some(lane),
        }
    }
}

/// Pick the request that wins priority, if any
pub fn select_request(requests: &[EmergencyRequest]) -> Option<EmergencyRequest> {
    requests
        .iter()
        .min_by_key(|r| (r.arrival_tick, r.lane.index()))
        .copied()
}

/// Decide whether emergency traffic should preempt the rotation this tick
///
/// `active_green` is the lane currently showing GREEN, if any. A lane in
/// YELLOW does not count as serving.
pub fn arbitrate(tracker: &LaneQueueTracker, active_green: Option<Lane>) -> ArbiterDecision {
    match select_request(&tracker.emergency_requests()) {
        None => ArbiterDecision::NoAction,
        Some(request) if Some(request.lane) == active_green => {
            ArbiterDecision::AlreadyServing(request.lane)
        }
        Some(request) => ArbiterDecision::Preempt(request.lane),
    }
}
