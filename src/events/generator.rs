//! Stock event generation
//!
//! This module derives LOW_STOCK and CRITICAL_STOCK events from an inventory
//! snapshot. Quantities are aggregated per (facility, medication) pair.

use crate::events::{StockEvent, StockSnapshot};
use crate::inventory::InventoryRecord;
use crate::types::{EventId, FacilityId, MedicationId, StockEventKind};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Aggregated stock of one medication at one facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    /// Facility
    pub facility_id: FacilityId,
    /// Medication
    pub medication_id: MedicationId,
    /// Units on hand across all records of the pair
    pub on_hand: u64,
    /// Largest reorder point among the pair's records
    pub reorder_point: u32,
}

impl StockLevel {
    /// Kinds of stock event this level currently warrants
    ///
    /// LOW_STOCK needs `0 < on_hand <= reorder_point`; CRITICAL_STOCK needs
    /// `on_hand <= reorder_point * critical_ratio` and so includes stock-outs.
    pub fn conditions(&self, critical_ratio: f64) -> Vec<StockEventKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.on_hand > 0 && self.on_hand <= self.reorder_point as u64 {
            kinds.push(StockEventKind::LowStock);
        }
        if (self.on_hand as f64) <= self.reorder_point as f64 * critical_ratio {
            kinds.push(StockEventKind::CriticalStock);
        }
        kinds
    }
}

/// Aggregate inventory per (facility, medication), in order of first appearance
pub fn stock_levels(inventory: &[InventoryRecord]) -> Vec<StockLevel> {
    let mut index: HashMap<(&FacilityId, &MedicationId), usize> = HashMap::new();
    let mut levels: Vec<StockLevel> = Vec::new();

    for record in inventory {
        let key = (&record.facility_id, &record.medication_id);
        match index.get(&key) {
            Some(&idx) => {
                let level = &mut levels[idx];
                level.on_hand += record.quantity as u64;
                level.reorder_point = level.reorder_point.max(record.reorder_point);
            }
            None => {
                index.insert(key, levels.len());
                levels.push(StockLevel {
                    facility_id: record.facility_id.clone(),
                    medication_id: record.medication_id.clone(),
                    on_hand: record.quantity as u64,
                    reorder_point: record.reorder_point,
                });
            }
        }
    }

    levels
}

/// Raises stock events when a condition starts
///
/// A (kind, facility, medication) condition produces one event when it first
/// holds and stays silent until it has cleared and holds again.
#[derive(Debug, Clone)]
pub struct StockEventGenerator {
    critical_ratio: f64,
    next_id: u64,
    active: BTreeSet<(StockEventKind, FacilityId, MedicationId)>,
}

impl StockEventGenerator {
    /// Create a generator using the given CRITICAL_STOCK ratio
    pub fn new(critical_ratio: f64) -> Self {
        Self { critical_ratio, next_id: 1, active: BTreeSet::new() }
    }

    /// Number of conditions currently holding
    pub fn active_conditions(&self) -> usize {
        self.active.len()
    }

    /// Derive the new stock events for the current inventory
    pub fn generate(&mut self, inventory: &[InventoryRecord], now: DateTime<Utc>) -> Vec<StockEvent> {
        let mut holding = BTreeSet::new();
        let mut events = Vec::new();

        for level in stock_levels(inventory) {
            for kind in level.conditions(self.critical_ratio) {
                let key = (kind, level.facility_id.clone(), level.medication_id.clone());
                holding.insert(key.clone());
                if self.active.contains(&key) {
                    continue;
                }

                let id = EventId(self.next_id);
                self.next_id += 1;
                debug!(
                    event_id = %id,
                    kind = %kind,
                    facility_id = %level.facility_id,
                    medication_id = %level.medication_id,
                    on_hand = level.on_hand,
                    reorder_point = level.reorder_point,
                    "Stock condition started"
                );
                events.push(StockEvent {
                    id,
                    kind,
                    facility_id: level.facility_id.clone(),
                    medication_id: level.medication_id.clone(),
                    timestamp: now,
                    snapshot: StockSnapshot { on_hand: level.on_hand, reorder_point: level.reorder_point },
                });
            }
        }

        self.active = holding;
        events
    }
}
