//! Waiting-time and throughput accounting
//!
//! The world hands a [`MetricsSample`] over for every departed vehicle and
//! reports green and idle time per lane. The recorder only aggregates;
//! writing the summary somewhere is up to the caller.

use serde::Serialize;

use super::types::{Lane, Tick, VehicleId, VehicleKind};

/// One vehicle that made it through the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSample {
    pub vehicle: VehicleId,
    pub lane: Lane,
    pub kind: VehicleKind,
    pub arrival_tick: Tick,
    pub departure_tick: Tick,
}

impl MetricsSample {
    /// Ticks spent queued before departing
    pub fn wait(&self) -> Tick {
        self.departure_tick.saturating_sub(self.arrival_tick)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LaneCounters {
    green_ticks: u64,
    idle_green_ticks: u64,
    greens_granted: u64,
}

#[derive(Debug, Default)]
pub struct MetricsRecorder {
    samples: Vec<MetricsSample>,
    lanes: [LaneCounters; 4],
    preemptions: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_departure(&mut self, sample: MetricsSample) {
        self.samples.push(sample);
    }

    /// A tick spent GREEN; `idle` when nobody was waiting to use it
    pub fn record_green_tick(&mut self, lane: Lane, idle: bool) {
        let counters = &mut self.lanes[lane.index()];
        counters.green_ticks += 1;
        if idle {
            counters.idle_green_ticks += 1;
        }
    }

    pub fn record_green_granted(&mut self, lane: Lane, preempted: bool) {
        self.lanes[lane.index()].greens_granted += 1;
        if preempted {
            self.preemptions += 1;
        }
    }

    pub fn samples(&self) -> &[MetricsSample] {
        &self.samples
    }

    pub fn total_passed(&self) -> usize {
        self.samples.len()
    }

    pub fn preemptions(&self) -> u64 {
        self.preemptions
    }

    pub fn idle_green_ticks(&self, lane: Lane) -> u64 {
        self.lanes[lane.index()].idle_green_ticks
    }

    pub fn green_ticks(&self, lane: Lane) -> u64 {
        self.lanes[lane.index()].green_ticks
    }

    /// Aggregate everything recorded so far
    ///
    /// `still_waiting` is the queue length per lane at the time of the call,
    /// indexed like [`Lane::ALL`], and `last_green` the tick each lane last
    /// entered GREEN.
    pub fn summarize(
        &self,
        total_ticks: Tick,
        still_waiting: [usize; 4],
        last_green: [Option<Tick>; 4],
    ) -> MetricsSummary {
        let lanes = Lane::ALL
            .iter()
            .map(|&lane| {
                let waits = WaitStats::collect(self.samples.iter().filter(|s| s.lane == lane));
                let counters = self.lanes[lane.index()];
                LaneSummary {
                    lane,
                    passed: waits.count,
                    average_wait: waits.average(),
                    max_wait: waits.max,
                    greens_granted: counters.greens_granted,
                    green_ticks: counters.green_ticks,
                    idle_green_ticks: counters.idle_green_ticks,
                    still_waiting: still_waiting[lane.index()],
                    last_green_tick: last_green[lane.index()],
                }
            })
            .collect();

        let kinds = VehicleKind::ALL
            .iter()
            .filter_map(|&kind| {
                let waits = WaitStats::collect(self.samples.iter().filter(|s| s.kind == kind));
                (waits.count > 0).then(|| KindSummary {
                    kind,
                    passed: waits.count,
                    average_wait: waits.average(),
                })
            })
            .collect();

        let overall = WaitStats::collect(self.samples.iter());
        MetricsSummary {
            total_ticks,
            total_vehicles_passed: overall.count,
            vehicles_per_tick: if total_ticks > 0 {
                overall.count as f64 / total_ticks as f64
            } else {
                0.0
            },
            average_wait: overall.average(),
            max_wait: overall.max,
            preemptions: self.preemptions,
            still_waiting: still_waiting.iter().sum(),
            lanes,
            kinds,
        }
    }
}

#[derive(Debug, Default)]
struct WaitStats {
    count: usize,
    total: u64,
    max: Option<Tick>,
}

impl WaitStats {
    fn collect<'a>(samples: impl Iterator<Item = &'a MetricsSample>) -> Self {
        samples.fold(WaitStats::default(), |mut stats, sample| {
            let wait = sample.wait();
            stats.count += 1;
            stats.total += wait;
            stats.max = Some(stats.max.map_or(wait, |m| m.max(wait)));
            stats
        })
    }

    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total as f64 / self.count as f64)
    }
}

/// End-of-run aggregate handed to whoever persists results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_ticks: Tick,
    pub total_vehicles_passed: usize,
    pub vehicles_per_tick: f64,
    /// None when no vehicle passed
    pub average_wait: Option<f64>,
    pub max_wait: Option<Tick>,
    pub preemptions: u64,
    /// Vehicles still queued when the summary was taken
    pub still_waiting: usize,
    pub lanes: Vec<LaneSummary>,
    /// Only kinds with at least one departure
    pub kinds: Vec<KindSummary>,
}

impl MetricsSummary {
    pub fn lane(&self, lane: Lane) -> Option<&LaneSummary> {
        self.lanes.iter().find(|l| l.lane == lane)
    }

    pub fn kind(&self, kind: VehicleKind) -> Option<&KindSummary> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneSummary {
    pub lane: Lane,
    pub passed: usize,
    pub average_wait: Option<f64>,
    pub max_wait: Option<Tick>,
    pub greens_granted: u64,
    pub green_ticks: u64,
    pub idle_green_ticks: u64,
    pub still_waiting: usize,
    pub last_green_tick: Option<Tick>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub kind: VehicleKind,
    pub passed: usize,
    pub average_wait: Option<f64>,
}
