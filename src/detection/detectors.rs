//! The seven fraud detectors
//!
//! Each detector is a pure function of a [`DetectionInput`], the detection
//! time and the thresholds. None of them mutate anything; deduplication is
//! left to the [`AnomalyPipeline`](crate::detection::AnomalyPipeline).

use crate::catalog::{Batch, Catalog};
use crate::detection::anomaly::Finding;
use crate::detection::thresholds::{DetectionSettings, DetectionThresholds};
use crate::events::StockEvent;
use crate::inventory::{InventoryRecord, MovementRecord};
use crate::types::{AnomalyType, BatchId, FacilityId, GhostStockScope, MedicationId, MovementKind, MovementSource};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Read-only view of everything the detectors look at
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    /// Current inventory
    pub inventory: &'a [InventoryRecord],
    /// Full movement history
    pub movements: &'a [MovementRecord],
    /// Full stock event history
    pub events: &'a [StockEvent],
    /// Reference data
    pub catalog: &'a Catalog,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Run one detector
pub fn run_detector(
    anomaly_type: AnomalyType,
    input: &DetectionInput<'_>,
    now: DateTime<Utc>,
    thresholds: &DetectionThresholds,
    settings: &DetectionSettings,
) -> Vec<Finding> {
    match anomaly_type {
        AnomalyType::ImpossibleQuantity => detect_impossible_quantity(input, thresholds),
        AnomalyType::GeographicImpossibility => detect_geographic_impossibility(input, thresholds),
        AnomalyType::GhostStock => detect_ghost_stock(input, settings.ghost_stock_scope),
        AnomalyType::RapidTurnover => detect_rapid_turnover(input, now, thresholds),
        AnomalyType::UnauthorizedImporter => detect_unauthorized_importer(input),
        AnomalyType::DuplicateBatchNumber => detect_duplicate_batch_number(input),
        AnomalyType::PriceAnomaly => detect_price_anomaly(input, thresholds),
    }
}

/// More units dispensed from a batch than `initial_quantity * multiplier`
pub fn detect_impossible_quantity(input: &DetectionInput<'_>, thresholds: &DetectionThresholds) -> Vec<Finding> {
    let mut dispensed: BTreeMap<&BatchId, u64> = BTreeMap::new();
    for movement in input.movements.iter().filter(|m| m.kind == MovementKind::Dispense) {
        *dispensed.entry(&movement.batch_id).or_default() += movement.dispensed_units();
    }

    let mut findings = Vec::new();
    for (batch_id, total) in dispensed {
        let Some(batch) = input.catalog.batch(batch_id) else {
            debug!(batch_id = %batch_id, "Dispensed batch missing from catalog, skipping");
            continue;
        };

        let limit = batch.initial_quantity as f64 * thresholds.impossible_quantity_multiplier;
        if (total as f64) <= limit {
            continue;
        }

        let ratio = total as f64 / batch.initial_quantity as f64;
        findings.push(
            Finding::new(
                AnomalyType::ImpossibleQuantity,
                format!(
                    "Batch {} dispensed {} units, {:.1}x its manufactured quantity of {}",
                    batch.batch_number, total, ratio, batch.initial_quantity
                ),
            )
            .batch(batch_id)
            .evidence("batch_number", batch.batch_number.as_str())
            .evidence("medication_id", batch.medication_id.as_str())
            .evidence("initial_quantity", batch.initial_quantity)
            .evidence("total_dispensed", total)
            .evidence("limit", limit)
            .evidence("ratio", round_to(ratio, 2)),
        );
    }
    findings
}

/// Consecutive receipts of a batch at distant facilities within a short time
pub fn detect_geographic_impossibility(input: &DetectionInput<'_>, thresholds: &DetectionThresholds) -> Vec<Finding> {
    let mut receipts: BTreeMap<&BatchId, Vec<&MovementRecord>> = BTreeMap::new();
    for movement in input
        .movements
        .iter()
        .filter(|m| m.is_receipt() && m.source != MovementSource::InitialSeed)
    {
        receipts.entry(&movement.batch_id).or_default().push(movement);
    }

    let mut findings = Vec::new();
    for (batch_id, mut chain) in receipts {
        chain.sort_by_key(|m| (m.timestamp, m.id));

        for pair in chain.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if first.facility_id == second.facility_id {
                continue;
            }

            let hours = (second.timestamp - first.timestamp).num_seconds() as f64 / 3600.0;
            if hours >= thresholds.geographic_impossible_hours {
                continue;
            }

            let Some(distance) = input.catalog.distance_km(&first.facility_id, &second.facility_id) else {
                debug!(
                    first = %first.facility_id,
                    second = %second.facility_id,
                    "Facility missing from catalog, skipping pair"
                );
                continue;
            };
            if distance <= thresholds.geographic_impossible_km {
                continue;
            }

            findings.push(
                Finding::new(
                    AnomalyType::GeographicImpossibility,
                    format!(
                        "Batch {} received at {} and {} ({:.0} km apart) within {:.1} hours",
                        batch_id, first.facility_id, second.facility_id, distance, hours
                    ),
                )
                .batch(batch_id)
                .medication(&second.medication_id)
                .evidence("first_facility", first.facility_id.as_str())
                .evidence("second_facility", second.facility_id.as_str())
                .evidence("first_movement", first.id.to_string())
                .evidence("second_movement", second.id.to_string())
                .evidence("distance_km", round_to(distance, 1))
                .evidence("hours_between", round_to(hours, 2)),
            );
        }
    }
    findings
}

/// Positive stock with no receiving movement
pub fn detect_ghost_stock(input: &DetectionInput<'_>, scope: GhostStockScope) -> Vec<Finding> {
    let receipts = input.movements.iter().filter(|m| m.is_receipt());
    let received_at: HashSet<(&FacilityId, &BatchId)> =
        receipts.clone().map(|m| (&m.facility_id, &m.batch_id)).collect();
    let received_anywhere: HashSet<&BatchId> = receipts.map(|m| &m.batch_id).collect();

    input
        .inventory
        .iter()
        .filter(|record| record.in_stock())
        .filter(|record| match scope {
            GhostStockScope::Facility => !received_at.contains(&(&record.facility_id, &record.batch_id)),
            GhostStockScope::System => !received_anywhere.contains(&record.batch_id),
        })
        .map(|record| {
            Finding::new(
                AnomalyType::GhostStock,
                format!(
                    "{} units of batch {} at {} have no receiving movement",
                    record.quantity, record.batch_id, record.facility_id
                ),
            )
            .facility(&record.facility_id)
            .batch(&record.batch_id)
            .medication(&record.medication_id)
            .evidence("inventory_id", record.id.as_str())
            .evidence("quantity", record.quantity)
            .evidence("scope", scope.to_string())
        })
        .collect()
}

/// Start of a look-back window, `None` when it reaches past any representable time
fn window_start(now: DateTime<Utc>, hours: f64) -> Option<DateTime<Utc>> {
    let start = Duration::try_milliseconds((hours * 3_600_000.0) as i64)
        .and_then(|window| now.checked_sub_signed(window));
    if start.is_none() {
        debug!(hours, "Look-back window is unbounded");
    }
    start
}

/// Dispensing far above the reorder baseline of recent stock events
///
/// The baseline for a (facility, medication) pair is the sum of the reorder
/// points carried by its stock events inside the window. Pairs without
/// stock events in the window have no baseline and are not judged.
pub fn detect_rapid_turnover(
    input: &DetectionInput<'_>,
    now: DateTime<Utc>,
    thresholds: &DetectionThresholds,
) -> Vec<Finding> {
    let start = window_start(now, thresholds.rapid_turnover_hours);
    let in_window =
        |timestamp: DateTime<Utc>| start.map_or(true, |start| timestamp > start) && timestamp <= now;

    let mut baseline: BTreeMap<(&FacilityId, &MedicationId), u64> = BTreeMap::new();
    for event in input.events.iter().filter(|e| in_window(e.timestamp)) {
        *baseline.entry((&event.facility_id, &event.medication_id)).or_default() += event.snapshot.reorder_point as u64;
    }

    let mut dispensed: BTreeMap<(&FacilityId, &MedicationId), u64> = BTreeMap::new();
    for movement in input
        .movements
        .iter()
        .filter(|m| m.kind == MovementKind::Dispense && in_window(m.timestamp))
    {
        *dispensed.entry((&movement.facility_id, &movement.medication_id)).or_default() += movement.dispensed_units();
    }

    let mut findings = Vec::new();
    for ((facility_id, medication_id), total) in dispensed {
        let Some(&base) = baseline.get(&(facility_id, medication_id)) else {
            continue;
        };
        if base == 0 {
            continue;
        }

        let limit = base as f64 * thresholds.rapid_turnover_multiplier;
        if (total as f64) <= limit {
            continue;
        }

        findings.push(
            Finding::new(
                AnomalyType::RapidTurnover,
                format!(
                    "{} dispensed {} units of {} in {} hours against a baseline of {}",
                    facility_id, total, medication_id, thresholds.rapid_turnover_hours, base
                ),
            )
            .facility(facility_id)
            .medication(medication_id)
            .evidence("window_hours", thresholds.rapid_turnover_hours)
            .evidence("dispensed", total)
            .evidence("baseline", base)
            .evidence("multiplier", thresholds.rapid_turnover_multiplier),
        );
    }
    findings
}

/// Batches imported by a company the manufacturer has not authorized
pub fn detect_unauthorized_importer(input: &DetectionInput<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for batch in input.catalog.batches() {
        // Domestic manufacturers distribute their own products
        if batch.is_self_imported() {
            continue;
        }
        let Some(authorized) = input.catalog.authorized_importers_for(&batch.manufacturer) else {
            continue;
        };
        if authorized.iter().any(|importer| importer.eq_ignore_ascii_case(&batch.importer)) {
            continue;
        }

        findings.push(
            Finding::new(
                AnomalyType::UnauthorizedImporter,
                format!(
                    "Batch {} of {} imported by {}, who is not authorized by the manufacturer",
                    batch.batch_number, batch.manufacturer, batch.importer
                ),
            )
            .batch(&batch.id)
            .medication(&batch.medication_id)
            .evidence("batch_number", batch.batch_number.as_str())
            .evidence("manufacturer", batch.manufacturer.as_str())
            .evidence("importer", batch.importer.as_str())
            .evidence("authorized_importers", json!(authorized)),
        );
    }
    findings
}

/// Distinct batches sharing a printed batch number
pub fn detect_duplicate_batch_number(input: &DetectionInput<'_>) -> Vec<Finding> {
    let mut by_number: BTreeMap<&str, Vec<&Batch>> = BTreeMap::new();
    for batch in input.catalog.batches() {
        by_number.entry(batch.batch_number.as_str()).or_default().push(batch);
    }

    by_number
        .into_iter()
        .filter(|(_, batches)| batches.len() > 1)
        .map(|(number, batches)| {
            let first = batches[0];
            let ids: Vec<&str> = batches.iter().map(|b| b.id.as_str()).collect();
            let manufacturers: Vec<&str> = batches.iter().map(|b| b.manufacturer.as_str()).collect();
            let importers: Vec<&str> = batches.iter().map(|b| b.importer.as_str()).collect();

            Finding::new(
                AnomalyType::DuplicateBatchNumber,
                format!("Batch number {} is shared by {} batches", number, batches.len()),
            )
            .batch(&first.id)
            .medication(&first.medication_id)
            .evidence("batch_number", number)
            .evidence("count", batches.len())
            .evidence("batch_ids", json!(ids))
            .evidence("manufacturers", json!(manufacturers))
            .evidence("importers", json!(importers))
        })
        .collect()
}

/// Stock acquired far below the batch reference price
pub fn detect_price_anomaly(input: &DetectionInput<'_>, thresholds: &DetectionThresholds) -> Vec<Finding> {
    let mut findings = Vec::new();

    for record in input.inventory {
        let Some(batch) = input.catalog.batch(&record.batch_id) else {
            debug!(inventory_id = %record.id, "Batch missing from catalog, skipping price check");
            continue;
        };
        let Some(reference) = batch.reference_price.filter(|p| *p > 0.0) else {
            continue;
        };

        let ratio = record.unit_price / reference;
        if ratio >= thresholds.price_anomaly_low_threshold {
            continue;
        }

        findings.push(
            Finding::new(
                AnomalyType::PriceAnomaly,
                format!(
                    "{} paid {:.2} per unit of batch {}, {:.0}% of the reference price {:.2}",
                    record.facility_id,
                    record.unit_price,
                    batch.batch_number,
                    ratio * 100.0,
                    reference
                ),
            )
            .facility(&record.facility_id)
            .batch(&record.batch_id)
            .medication(&record.medication_id)
            .evidence("unit_price", record.unit_price)
            .evidence("reference_price", reference)
            .evidence("price_ratio", round_to(ratio, 2)),
        );
    }
    findings
}
