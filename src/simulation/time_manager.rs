//! Simulated clock
//!
//! The horizon is half-open, `[start, end)`. Nothing here reads the wall clock.

use crate::types::SimulationConfig;
use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::debug;

/// Horizon and calendar rules of one run
#[derive(Debug, Clone, PartialEq)]
pub struct TimeManager {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    open_hour: u32,
    close_hour: u32,
    agent_cycle_hours: u32,
}

impl TimeManager {
    /// Create a clock for `[start, end)`
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        open_hour: u32,
        close_hour: u32,
        agent_cycle_hours: u32,
    ) -> Self {
        debug!("Time manager covering {} .. {}", start, end);
        Self { start, end, open_hour, close_hour, agent_cycle_hours: agent_cycle_hours.max(1) }
    }

    /// Build the clock described by a configuration
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.start_time,
            config.end_time(),
            config.open_hour,
            config.close_hour,
            config.agent_cycle_hours,
        )
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `timestamp` lies inside the horizon
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Check if facilities dispense at the given time (`open_hour <= hour < close_hour`)
    pub fn is_open(&self, timestamp: DateTime<Utc>) -> bool {
        (self.open_hour..self.close_hour).contains(&timestamp.hour())
    }

    /// Number of dispensing hours per day
    pub fn opening_hours(&self) -> u32 {
        self.close_hour.saturating_sub(self.open_hour)
    }

    /// Every whole hour from the start, stopping before the end
    pub fn hourly_ticks(&self) -> impl Iterator<Item = DateTime<Utc>> {
        self.every(Duration::hours(1))
    }

    /// Agent cycle times, every `agent_cycle_hours` from the start
    pub fn agent_cycles(&self) -> impl Iterator<Item = DateTime<Utc>> {
        self.every(Duration::hours(i64::from(self.agent_cycle_hours)))
    }

    /// `start + hours`, if that still falls inside the horizon
    pub fn offset(&self, hours: i64) -> Option<DateTime<Utc>> {
        let timestamp = self.start + Duration::hours(hours);
        self.contains(timestamp).then_some(timestamp)
    }

    /// Backdated timestamp of an initial receipt for the facility at `facility_index`
    ///
    /// Receipts are spread over the `stagger_days` preceding the start.
    pub fn seed_receipt_time(&self, facility_index: usize, stagger_days: u32) -> DateTime<Utc> {
        let days = i64::from(stagger_days.max(1));
        let offset = facility_index as i64 % days;
        self.start - Duration::days(days) + Duration::days(offset)
    }

    fn every(&self, step: Duration) -> impl Iterator<Item = DateTime<Utc>> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |t| Some(*t + step)).take_while(move |t| *t < end)
    }
}
