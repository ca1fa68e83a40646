//! Time-ordered queue of pending simulation events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Work the engine can be asked to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimEvent {
    /// Expiry sweep plus demand for the hour
    HourlyTick,
    /// Stock events, replenishment and anomaly detection
    AgentCycle,
    /// Fabricate a pair of far-apart receipts of one batch
    InjectGeographicAnomaly { description: String },
    /// Fabricate dispensing far beyond a batch's production
    InjectImpossibleQuantity { description: String },
}

impl SimEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::HourlyTick => "hourly_tick",
            SimEvent::AgentCycle => "agent_cycle",
            SimEvent::InjectGeographicAnomaly { .. } => "inject_geographic_anomaly",
            SimEvent::InjectImpossibleQuantity { .. } => "inject_impossible_quantity",
        }
    }
}

/// An event with its due time and insertion sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub time: DateTime<Utc>,
    pub seq: u64,
    pub event: SimEvent,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.cmp(&other.time).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue on (time, insertion order)
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` at `time`
    pub fn push(&mut self, time: DateTime<Utc>, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, event }));
    }

    /// Remove the earliest event; ties come out in insertion order
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|Reverse(scheduled)| scheduled)
    }

    pub fn peek_time(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(scheduled)| scheduled.time)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drop everything still pending
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(t0() + Duration::hours(2), SimEvent::AgentCycle);
        queue.push(t0(), SimEvent::HourlyTick);
        queue.push(t0() + Duration::hours(1), SimEvent::HourlyTick);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_time(), Some(t0()));

        let times: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|s| s.time).collect();
        assert_eq!(times, vec![t0(), t0() + Duration::hours(1), t0() + Duration::hours(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_are_fifo() {
        let mut queue = EventQueue::new();
        queue.push(t0(), SimEvent::HourlyTick);
        queue.push(t0(), SimEvent::AgentCycle);
        queue.push(t0(), SimEvent::InjectImpossibleQuantity { description: "x".into() });

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|s| s.event.name()).collect();
        assert_eq!(order, vec!["hourly_tick", "agent_cycle", "inject_impossible_quantity"]);
    }

    #[test]
    fn test_clear_and_empty_pop() {
        let mut queue = EventQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.peek_time().is_none());

        queue.push(t0(), SimEvent::HourlyTick);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }
}
