// Integration tests test your crate's public API. They only have access to items
// in your crate that are marked pub. See the Cargo Targets page of the Cargo Book
// for more information.
//
//   https://doc.rust-lang.org/cargo/reference/cargo-targets.html#integration-tests
//

use medguard_simulator::*;

mod detection_pipeline_tests;

#[test]
fn test_core_id_types() {
    let facility = FacilityId::new("FAC_001");
    assert_eq!(facility.to_string(), "FAC_001");
    assert_eq!(FacilityId::from("FAC_001"), facility);

    assert_eq!(MovementId(42).to_string(), "MOV_00000042");
    assert_eq!(EventId(7).to_string(), "EVT_000007");

    let anomaly = AnomalyId::derived("GHOST_STOCK|FAC_001|BAT_001|MED_001");
    assert_eq!(anomaly, AnomalyId::derived("GHOST_STOCK|FAC_001|BAT_001|MED_001"));
    assert!(anomaly.to_string().starts_with("ANOM_"));
    assert_ne!(anomaly, AnomalyId::derived("GHOST_STOCK|FAC_002|BAT_001|MED_001"));
}

#[test]
fn test_anomaly_taxonomy() {
    assert_eq!(AnomalyType::ALL.len(), 7);
    for anomaly_type in AnomalyType::ALL {
        let parsed: AnomalyType = anomaly_type.to_string().parse().unwrap();
        assert_eq!(parsed, anomaly_type);
    }
    assert_eq!(AnomalyType::ImpossibleQuantity.default_severity(), Severity::Critical);
    assert_eq!(AnomalyType::RapidTurnover.default_severity(), Severity::High);
}

#[test]
fn test_movement_kind_directions() {
    assert!(MovementKind::Restock.is_receipt());
    assert!(MovementKind::TransferIn.is_receipt());
    assert!(!MovementKind::Dispense.is_receipt());
    assert_eq!(MovementKind::Dispense.sign(), -1);
    assert_eq!(MovementKind::ExpiryWithdraw.sign(), -1);
    assert_eq!(MovementKind::Restock.sign(), 1);
}

#[test]
fn test_default_configuration_is_valid() {
    let config = SimulationConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.days, 4);
    assert_eq!(config.end_time() - config.start_time, chrono::Duration::days(4));
}
