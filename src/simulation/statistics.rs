//! Statistics collection and reporting
//!
//! Counters are updated by the engine as it records movements, derives stock
//! events and surfaces anomalies. Maps are ordered so reports are stable.

use crate::detection::Anomaly;
use crate::events::StockEvent;
use crate::inventory::MovementRecord;
use crate::types::{AnomalyType, MovementKind, MovementSource, Severity, StockEventKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Counters describing one simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Movements recorded, by kind
    pub movements_by_kind: BTreeMap<MovementKind, usize>,
    /// Stock events derived, by kind
    pub events_by_kind: BTreeMap<StockEventKind, usize>,
    /// Anomalies surfaced, by type
    pub anomalies_by_type: BTreeMap<AnomalyType, usize>,
    /// Anomalies surfaced, by severity
    pub anomalies_by_severity: BTreeMap<Severity, usize>,
    /// Total units dispensed by the demand model
    pub units_dispensed: u64,
    /// Total units withdrawn at expiry
    pub units_expired: u64,
    /// Hourly ticks processed
    pub hourly_ticks: usize,
    /// Agent cycles processed
    pub agent_cycles: usize,
    /// Scenario injections that produced movements
    pub injections: usize,
    /// Scenario injections skipped for lack of candidates
    pub skipped_injections: usize,
    /// Replenishments triggered by low stock
    pub restocks: usize,
    /// Initial receipts left out of the movement log
    pub omitted_receipts: usize,
    /// Units of work skipped after a lookup miss
    pub skipped_units_of_work: usize,
    /// Catalog and inventory entries dropped before the run
    #[serde(default)]
    pub rejected_catalog_entries: usize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a recorded movement
    pub fn record_movement(&mut self, movement: &MovementRecord) {
        *self.movements_by_kind.entry(movement.kind).or_insert(0) += 1;

        if movement.source == MovementSource::Simulation {
            match movement.kind {
                MovementKind::Dispense => self.units_dispensed += movement.dispensed_units(),
                MovementKind::ExpiryWithdraw => self.units_expired += movement.quantity_change.unsigned_abs(),
                _ => {}
            }
        }
    }

    /// Count derived stock events
    pub fn record_events(&mut self, events: &[StockEvent]) {
        for event in events {
            *self.events_by_kind.entry(event.kind).or_insert(0) += 1;
        }
    }

    /// Count newly surfaced anomalies
    pub fn record_anomalies(&mut self, anomalies: &[Anomaly]) {
        for anomaly in anomalies {
            *self.anomalies_by_type.entry(anomaly.anomaly_type).or_insert(0) += 1;
            *self.anomalies_by_severity.entry(anomaly.severity).or_insert(0) += 1;
        }
    }

    pub fn total_movements(&self) -> usize {
        self.movements_by_kind.values().sum()
    }

    pub fn total_events(&self) -> usize {
        self.events_by_kind.values().sum()
    }

    pub fn total_anomalies(&self) -> usize {
        self.anomalies_by_type.values().sum()
    }

    /// Number of anomalies of one type
    pub fn anomalies_of(&self, anomaly_type: AnomalyType) -> usize {
        self.anomalies_by_type.get(&anomaly_type).copied().unwrap_or(0)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "Run Summary: {} movements | {} stock events | {} anomalies | {} restocks | {} injections | {} dispensed",
            self.total_movements(),
            self.total_events(),
            self.total_anomalies(),
            self.restocks,
            self.injections,
            self.units_dispensed
        )
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation Statistics ===")?;
        writeln!(f, "Hourly ticks: {}  Agent cycles: {}", self.hourly_ticks, self.agent_cycles)?;

        writeln!(f, "\nMovements: {}", self.total_movements())?;
        for (kind, count) in &self.movements_by_kind {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        writeln!(f, "  Units dispensed: {}  Units expired: {}", self.units_dispensed, self.units_expired)?;
        writeln!(f, "  Restocks: {}  Omitted initial receipts: {}", self.restocks, self.omitted_receipts)?;

        writeln!(f, "\nStock events: {}", self.total_events())?;
        for (kind, count) in &self.events_by_kind {
            writeln!(f, "  {}: {}", kind, count)?;
        }

        writeln!(f, "\nAnomalies: {}", self.total_anomalies())?;
        for (anomaly_type, count) in &self.anomalies_by_type {
            writeln!(f, "  {}: {}", anomaly_type, count)?;
        }
        for (severity, count) in self.anomalies_by_severity.iter().rev() {
            writeln!(f, "  [{}] {}", severity, count)?;
        }

        writeln!(
            f,
            "\nInjections: {} applied, {} skipped",
            self.injections, self.skipped_injections
        )?;
        if self.rejected_catalog_entries > 0 {
            writeln!(f, "Rejected catalog entries: {}", self.rejected_catalog_entries)?;
        }
        if self.skipped_units_of_work > 0 {
            writeln!(f, "Skipped units of work: {}", self.skipped_units_of_work)?;
        }
        Ok(())
    }
}
