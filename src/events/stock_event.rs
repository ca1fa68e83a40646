//! Stock-level events

use crate::types::{EventId, FacilityId, MedicationId, StockEventKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quantities observed when a stock event was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Units on hand summed over the facility's records of the medication
    pub on_hand: u64,
    /// Reorder point for the (facility, medication) pair
    pub reorder_point: u32,
}

/// A LOW_STOCK or CRITICAL_STOCK observation for a (facility, medication) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEvent {
    /// Sequential identifier
    pub id: EventId,
    /// Kind of event
    pub kind: StockEventKind,
    /// Facility concerned
    pub facility_id: FacilityId,
    /// Medication concerned
    pub medication_id: MedicationId,
    /// When the condition was observed
    pub timestamp: DateTime<Utc>,
    /// Quantities at that moment
    pub snapshot: StockSnapshot,
}

impl StockEvent {
    /// Whether the event is a LOW_STOCK event
    pub fn is_low_stock(&self) -> bool {
        self.kind == StockEventKind::LowStock
    }
}
