//! Lane queue tracker tests

use signal_sim::simulation::{Lane, LaneQueueTracker, SignalError, VehicleKind};

#[test]
fn test_dequeue_is_fifo() {
    let mut tracker = LaneQueueTracker::new();
    let first = tracker.enqueue(Lane::North, VehicleKind::Car, 1);
    let second = tracker.enqueue(Lane::North, VehicleKind::Bus, 2);

    assert_eq!(tracker.waiting_count(Lane::North), 2);
    assert_eq!(tracker.dequeue(Lane::North).unwrap().id, first);
    assert_eq!(tracker.dequeue(Lane::North).unwrap().id, second);
    assert_eq!(tracker.waiting_count(Lane::North), 0);
}

#[test]
fn test_empty_lane_dequeue_reports_lane() {
    let mut tracker = LaneQueueTracker::new();
    tracker.enqueue(Lane::East, VehicleKind::Car, 0);

    assert_eq!(
        tracker.dequeue(Lane::West),
        Err(SignalError::EmptyLane(Lane::West))
    );
    // Other lanes untouched
    assert_eq!(tracker.waiting_count(Lane::East), 1);
}

#[test]
fn test_lanes_are_independent() {
    let mut tracker = LaneQueueTracker::new();
    tracker.enqueue(Lane::North, VehicleKind::Car, 0);
    tracker.enqueue(Lane::South, VehicleKind::Truck, 0);
    tracker.enqueue(Lane::South, VehicleKind::Bike, 1);

    assert_eq!(tracker.waiting_count(Lane::North), 1);
    assert_eq!(tracker.waiting_count(Lane::East), 0);
    assert_eq!(tracker.waiting_count(Lane::South), 2);
    assert_eq!(tracker.total_waiting(), 3);
    assert_eq!(tracker.total_enqueued(), 3);
}

#[test]
fn test_emergency_requests_follow_queue() {
    let mut tracker = LaneQueueTracker::new();
    tracker.enqueue(Lane::West, VehicleKind::Emergency, 4);
    tracker.enqueue(Lane::West, VehicleKind::Car, 5);
    tracker.enqueue(Lane::North, VehicleKind::Emergency, 7);

    let requests = tracker.emergency_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(tracker.earliest_emergency(Lane::West), Some(4));
    assert_eq!(tracker.emergency_count(Lane::North), 1);

    // Leaving the queue clears the request immediately
    let departed = tracker.dequeue(Lane::West).unwrap();
    assert!(departed.kind.is_emergency());
    assert_eq!(tracker.earliest_emergency(Lane::West), None);
    assert_eq!(tracker.emergency_requests().len(), 1);
}

#[test]
fn test_earliest_emergency_ignores_enqueue_order() {
    let mut tracker = LaneQueueTracker::new();
    tracker.enqueue(Lane::East, VehicleKind::Emergency, 20);
    tracker.enqueue(Lane::East, VehicleKind::Emergency, 12);

    assert_eq!(tracker.earliest_emergency(Lane::East), Some(12));

    // Head of the queue is still the first one enqueued
    let head = tracker.dequeue(Lane::East).unwrap();
    assert_eq!(head.arrival_tick, 20);
    assert_eq!(tracker.earliest_emergency(Lane::East), Some(12));
}

#[test]
fn test_iter_lane_head_first() {
    let mut tracker = LaneQueueTracker::new();
    tracker.enqueue(Lane::South, VehicleKind::Rickshaw, 3);
    tracker.enqueue(Lane::South, VehicleKind::Car, 9);

    let arrivals: Vec<u64> = tracker.iter_lane(Lane::South).map(|v| v.arrival_tick).collect();
    assert_eq!(arrivals, vec![3, 9]);
}

#[test]
fn test_lane_conversions() {
    assert_eq!(Lane::try_from(2), Ok(Lane::South));
    assert!(matches!(Lane::try_from(4), Err(SignalError::InvalidLane(_))));
    assert_eq!("west".parse::<Lane>(), Ok(Lane::West));
    assert_eq!("N".parse::<Lane>(), Ok(Lane::North));
    assert!(matches!(
        "up".parse::<Lane>(),
        Err(SignalError::InvalidLane(_))
    ));
}

#[test]
fn test_rotation_wraps() {
    assert_eq!(Lane::North.next(), Lane::East);
    assert_eq!(Lane::West.next(), Lane::North);
}
