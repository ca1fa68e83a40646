//! Scenario injection
//!
//! Injected movements are fabricated through
//! [`MovementRecorder::fabricate`]: they appear in the log with source
//! `SCENARIO_INJECTION` but the inventory itself never changes. Choices are
//! drawn from the run's seeded generator.

use crate::catalog::{Catalog, Facility};
use crate::inventory::{InventoryRecord, MovementDraft, MovementRecord, MovementRecorder};
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::types::{MovementKind, MovementSource};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Reference attached to every injected receipt
pub const INJECTION_REFERENCE: &str = "ANOMALY_INJECT";

/// Units added at the source facility of a geographic injection
pub const GEOGRAPHIC_SOURCE_UNITS: u32 = 50;

/// Excess dispensed by an impossible-quantity injection, as a multiple of the batch size
pub const IMPOSSIBLE_QUANTITY_FACTOR: u64 = 12;

/// Number of dispense movements the excess is split into
pub const IMPOSSIBLE_QUANTITY_PARTS: u64 = 5;

/// Fabricates known fraud patterns into the movement log
#[derive(Debug, Clone, Copy)]
pub struct ScenarioInjector<'a> {
    catalog: &'a Catalog,
    geographic_threshold_km: f64,
}

impl<'a> ScenarioInjector<'a> {
    pub fn new(catalog: &'a Catalog, geographic_threshold_km: f64) -> Self {
        Self { catalog, geographic_threshold_km }
    }

    /// Receipts of one batch at two distant facilities within two hours
    ///
    /// Returns no movements when nothing is in stock or no facility lies in
    /// another region.
    pub fn geographic<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        recorder: &mut MovementRecorder,
        inventory: &[InventoryRecord],
        now: DateTime<Utc>,
    ) -> SimulationResult<Vec<MovementRecord>> {
        let stocked: Vec<&InventoryRecord> = inventory.iter().filter(|r| r.in_stock()).collect();
        let Some(source) = stocked.choose(rng).copied() else {
            debug!("No stocked record for a geographic injection");
            return Ok(Vec::new());
        };

        let origin = self
            .catalog
            .facility(&source.facility_id)
            .ok_or_else(|| SimulationError::lookup_miss("facility", &source.facility_id))?;

        let elsewhere: Vec<&Facility> = self
            .catalog
            .facilities()
            .iter()
            .filter(|f| !f.same_region(origin))
            .collect();
        let distant: Vec<&Facility> = elsewhere
            .iter()
            .copied()
            .filter(|f| origin.distance_to(f) > self.geographic_threshold_km)
            .collect();
        let pool = if distant.is_empty() { &elsewhere } else { &distant };

        let Some(target) = pool.choose(rng).copied() else {
            debug!(facility = %origin.id, "No facility in another region for a geographic injection");
            return Ok(Vec::new());
        };

        let delay = Duration::minutes(rng.gen_range(60..=120));
        let units = rng.gen_range(50..=150u32);

        let mut first =
            MovementDraft::for_record(source, MovementKind::Restock, now, MovementSource::ScenarioInjection);
        first.quantity_change = i64::from(GEOGRAPHIC_SOURCE_UNITS);
        first.quantity_after = source.quantity.saturating_add(GEOGRAPHIC_SOURCE_UNITS);
        first.reference_id = INJECTION_REFERENCE.to_string();

        let held = inventory
            .iter()
            .find(|r| r.facility_id == target.id && r.batch_id == source.batch_id);
        let second = MovementDraft {
            inventory_id: held.map(|r| r.id.clone()),
            facility_id: target.id.clone(),
            batch_id: source.batch_id.clone(),
            medication_id: source.medication_id.clone(),
            kind: MovementKind::Restock,
            quantity_change: i64::from(units),
            quantity_after: held.map_or(0, |r| r.quantity).saturating_add(units),
            timestamp: now + delay,
            reference_id: INJECTION_REFERENCE.to_string(),
            source: MovementSource::ScenarioInjection,
        };

        debug!(
            batch = %source.batch_id,
            from = %origin.id,
            to = %target.id,
            distance_km = origin.distance_to(target),
            minutes = delay.num_minutes(),
            "Injected geographic receipts"
        );

        Ok(vec![recorder.fabricate(first), recorder.fabricate(second)])
    }

    /// Five dispenses of one batch adding up to twelve times its production
    ///
    /// Returns no movements when no batch is held anywhere.
    pub fn impossible_quantity<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        recorder: &mut MovementRecorder,
        inventory: &[InventoryRecord],
        now: DateTime<Utc>,
    ) -> SimulationResult<Vec<MovementRecord>> {
        let held: Vec<_> = self
            .catalog
            .batches()
            .iter()
            .filter(|b| b.initial_quantity > 0 && inventory.iter().any(|r| r.batch_id == b.id))
            .collect();
        let Some(batch) = held.choose(rng).copied() else {
            debug!("No held batch for an impossible-quantity injection");
            return Ok(Vec::new());
        };

        let record = inventory
            .iter()
            .find(|r| r.batch_id == batch.id)
            .ok_or_else(|| SimulationError::lookup_miss("inventory for batch", &batch.id))?;

        let excess = IMPOSSIBLE_QUANTITY_FACTOR * u64::from(batch.initial_quantity);
        let movements = split_evenly(excess, IMPOSSIBLE_QUANTITY_PARTS)
            .into_iter()
            .enumerate()
            .map(|(i, units)| {
                let at = now + Duration::minutes(10 * i as i64);
                let mut draft =
                    MovementDraft::for_record(record, MovementKind::Dispense, at, MovementSource::ScenarioInjection);
                draft.quantity_change = -(units as i64);
                draft.quantity_after = 0;
                recorder.fabricate(draft)
            })
            .collect();

        debug!(batch = %batch.id, facility = %record.facility_id, excess, "Injected impossible dispensing");
        Ok(movements)
    }
}

/// Split `total` into `parts` amounts that add up exactly, the last taking the remainder
fn split_evenly(total: u64, parts: u64) -> Vec<u64> {
    if parts == 0 {
        return Vec::new();
    }
    let share = total / parts;
    let mut amounts = vec![share; parts as usize];
    if let Some(last) = amounts.last_mut() {
        *last += total - share * parts;
    }
    amounts
}
