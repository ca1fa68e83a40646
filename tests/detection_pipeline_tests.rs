//! Detection pipeline tests against small hand-built histories

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use medguard_simulator::catalog::{Batch, Catalog, Facility, Medication};
use medguard_simulator::detection::{AnomalyPipeline, DetectionInput, DetectionSettings, DetectionThresholds};
use medguard_simulator::inventory::{InventoryRecord, MovementDraft, MovementRecord, MovementRecorder};
use medguard_simulator::types::*;
use std::collections::BTreeMap;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 4, 12, 0, 0).unwrap()
}

fn facility(id: &str, state: &str, latitude: f64, longitude: f64) -> Facility {
    Facility {
        id: FacilityId::new(id),
        name: format!("Facility {}", id),
        facility_type: FacilityType::GeneralHospital,
        tier: FacilityTier::Secondary,
        state: state.to_string(),
        city: state.to_string(),
        latitude,
        longitude,
        has_cold_storage: false,
    }
}

fn batch(id: &str, initial_quantity: u32) -> Batch {
    Batch {
        id: BatchId::new(id),
        batch_number: format!("LOT-{}", id),
        medication_id: MedicationId::new("M1"),
        manufacturer: "Emzor Pharmaceuticals".to_string(),
        importer: "Emzor Pharmaceuticals".to_string(),
        initial_quantity,
        manufacturing_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        unit_price: 1.0,
        reference_price: Some(1.0),
    }
}

/// Two facilities about 1000 km apart on the equator
fn world() -> Catalog {
    Catalog::new(
        vec![facility("F1", "West", 0.0, 0.0), facility("F2", "East", 0.0, 9.0)],
        vec![Medication {
            id: MedicationId::new("M1"),
            generic_name: "Paracetamol".to_string(),
            base_monthly_demand: 300,
            requires_cold_chain: false,
            stocking_tier: 1,
        }],
        vec![batch("B1", 100), batch("B2", 100)],
        BTreeMap::new(),
    )
    .unwrap()
}

fn record(id: &str, facility: &str, batch: &str, quantity: u32) -> InventoryRecord {
    InventoryRecord {
        id: InventoryId::new(id),
        facility_id: FacilityId::new(facility),
        batch_id: BatchId::new(batch),
        medication_id: MedicationId::new("M1"),
        quantity,
        reorder_point: 10,
        expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        unit_price: 1.0,
    }
}

fn receipt(
    recorder: &mut MovementRecorder,
    record: &InventoryRecord,
    at: DateTime<Utc>,
    source: MovementSource,
) -> MovementRecord {
    let mut draft = MovementDraft::for_record(record, MovementKind::Restock, at, source);
    draft.quantity_change = 50;
    recorder.fabricate(draft)
}

fn dispense(recorder: &mut MovementRecorder, record: &InventoryRecord, units: i64) -> MovementRecord {
    let mut draft = MovementDraft::for_record(record, MovementKind::Dispense, now(), MovementSource::Simulation);
    draft.quantity_change = -units;
    recorder.fabricate(draft)
}

fn pipeline() -> AnomalyPipeline {
    AnomalyPipeline::new(DetectionThresholds::default(), DetectionSettings::default())
}

#[test]
fn test_far_receipts_ninety_minutes_apart() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 40), record("I2", "F2", "B1", 40)];
    let mut recorder = MovementRecorder::new();
    let movements = vec![
        receipt(&mut recorder, &inventory[0], now() - Duration::hours(3), MovementSource::Simulation),
        receipt(&mut recorder, &inventory[1], now() - Duration::minutes(90), MovementSource::Simulation),
    ];

    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let anomalies = pipeline().detect(&input, now());

    let geographic: Vec<_> = anomalies
        .iter()
        .filter(|a| a.anomaly_type == AnomalyType::GeographicImpossibility)
        .collect();
    assert_eq!(geographic.len(), 1);

    let anomaly = geographic[0];
    assert_eq!(anomaly.severity, Severity::Critical);
    assert_eq!(anomaly.batch_id, Some(BatchId::new("B1")));
    assert_eq!(anomaly.evidence["first_facility"], "F1");
    assert_eq!(anomaly.evidence["second_facility"], "F2");
    let distance = anomaly.evidence["distance_km"].as_f64().unwrap();
    assert!(distance > 990.0 && distance < 1010.0);
}

#[test]
fn test_seed_receipts_never_count_as_travel() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 40), record("I2", "F2", "B1", 40)];
    let mut recorder = MovementRecorder::new();
    let movements = vec![
        receipt(&mut recorder, &inventory[0], now() - Duration::hours(1), MovementSource::InitialSeed),
        receipt(&mut recorder, &inventory[1], now() - Duration::minutes(30), MovementSource::InitialSeed),
    ];

    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let anomalies = pipeline().detect(&input, now());
    assert!(anomalies.iter().all(|a| a.anomaly_type != AnomalyType::GeographicImpossibility));
}

#[test]
fn test_ghost_stock_for_unreceived_batch() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 40), record("I2", "F1", "B2", 25)];
    let mut recorder = MovementRecorder::new();
    let movements = vec![receipt(&mut recorder, &inventory[0], now() - Duration::days(2), MovementSource::InitialSeed)];

    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let anomalies = pipeline().detect(&input, now());

    let ghosts: Vec<_> = anomalies.iter().filter(|a| a.anomaly_type == AnomalyType::GhostStock).collect();
    assert_eq!(ghosts.len(), 1);
    assert_eq!(ghosts[0].facility_id, Some(FacilityId::new("F1")));
    assert_eq!(ghosts[0].batch_id, Some(BatchId::new("B2")));
    assert_eq!(ghosts[0].severity, Severity::High);
}

#[test]
fn test_impossible_quantity_is_a_strict_boundary() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 0), record("I2", "F1", "B2", 0)];
    let mut recorder = MovementRecorder::new();
    let movements = vec![
        dispense(&mut recorder, &inventory[0], 1050),
        dispense(&mut recorder, &inventory[1], 600),
        dispense(&mut recorder, &inventory[1], 400),
    ];

    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let flagged: Vec<_> = pipeline()
        .detect(&input, now())
        .into_iter()
        .filter(|a| a.anomaly_type == AnomalyType::ImpossibleQuantity)
        .collect();

    // B2 sums to exactly 10x its production and is not flagged
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].batch_id, Some(BatchId::new("B1")));
}

#[test]
fn test_second_pass_over_same_history_is_silent() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 40), record("I2", "F2", "B2", 40)];
    let mut recorder = MovementRecorder::new();
    let movements = vec![dispense(&mut recorder, &inventory[0], 5000)];

    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let mut pipeline = pipeline();

    let first = pipeline.detect(&input, now());
    assert!(!first.is_empty());
    assert!(pipeline.detect(&input, now() + Duration::hours(4)).is_empty());
    assert_eq!(pipeline.seen_count(), first.len());
}

#[test]
fn test_disabled_detectors_stay_quiet() {
    let catalog = world();
    let inventory = vec![record("I1", "F1", "B1", 40)];
    let input = DetectionInput { inventory: &inventory, movements: &[], events: &[], catalog: &catalog };

    let mut settings = DetectionSettings::default();
    settings.disable(AnomalyType::GhostStock);
    let mut pipeline = AnomalyPipeline::new(DetectionThresholds::default(), settings);

    assert!(pipeline.detect(&input, now()).is_empty());
}

#[test]
fn test_transfer_in_counts_as_a_receipt() {
    let catalog = world();
    let mut sender = record("I1", "F1", "B1", 40);
    let mut receiver = record("I2", "F2", "B1", 0);
    let mut recorder = MovementRecorder::new();

    let mut movements = vec![receipt(&mut recorder, &sender, now() - Duration::days(3), MovementSource::InitialSeed)];
    let (out, into) = recorder
        .transfer(&mut sender, &mut receiver, 15, now() - Duration::hours(2), MovementSource::Simulation)
        .unwrap();
    assert_eq!(out.kind, MovementKind::TransferOut);
    assert_eq!(into.kind, MovementKind::TransferIn);
    assert_eq!(out.reference_id, into.reference_id);
    movements.push(out);
    movements.push(into);

    assert_eq!(sender.quantity, 25);
    assert_eq!(receiver.quantity, 15);

    let inventory = vec![sender, receiver];
    let input = DetectionInput { inventory: &inventory, movements: &movements, events: &[], catalog: &catalog };
    let anomalies = pipeline().detect(&input, now());

    assert!(anomalies.iter().all(|a| a.anomaly_type != AnomalyType::GhostStock));
    assert!(anomalies.iter().all(|a| a.anomaly_type != AnomalyType::GeographicImpossibility));
}
