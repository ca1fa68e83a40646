//! Fixed demonstration catalog
//!
//! Eight Nigerian facilities across seven states, six medications and ten
//! batches. A few batches are deliberately suspicious (an unauthorized
//! importer, a reused batch number, a far-below-reference price, a batch that
//! expires mid-run) and one record starts below its reorder point, so a short
//! run exercises restocking and every catalog-level detector.

use crate::catalog::{Batch, CatalogFile, Facility, InventorySeed, Medication};
use crate::types::{BatchId, FacilityId, FacilityTier, FacilityType, InventoryId, MedicationId};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Manufacturer to authorized importer table used by the demonstration catalog
pub fn default_authorized_importers() -> BTreeMap<String, Vec<String>> {
    let wwcvl = "WWCVL";
    let phillips = "Phillips Pharmaceuticals";

    [
        ("Novartis", vec![wwcvl, phillips]),
        ("GSK", vec![wwcvl]),
        ("Sanofi", vec![wwcvl, phillips]),
        ("Pfizer", vec![wwcvl]),
        ("Novo Nordisk", vec![wwcvl]),
        ("AstraZeneca", vec![wwcvl]),
        ("Roche", vec![wwcvl]),
        ("Merck", vec![wwcvl]),
        ("Sandoz", vec![wwcvl]),
        ("Bayer", vec![wwcvl, phillips]),
    ]
    .into_iter()
    .map(|(manufacturer, importers)| {
        (manufacturer.to_string(), importers.into_iter().map(str::to_string).collect())
    })
    .collect()
}

#[allow(clippy::too_many_arguments)]
fn facility(
    id: &str,
    name: &str,
    facility_type: FacilityType,
    tier: FacilityTier,
    state: &str,
    city: &str,
    latitude: f64,
    longitude: f64,
    has_cold_storage: bool,
) -> Facility {
    Facility {
        id: FacilityId::new(id),
        name: name.to_string(),
        facility_type,
        tier,
        state: state.to_string(),
        city: city.to_string(),
        latitude,
        longitude,
        has_cold_storage,
    }
}

fn medication(id: &str, generic_name: &str, base_monthly_demand: u32, cold_chain: bool, tier: u8) -> Medication {
    Medication {
        id: MedicationId::new(id),
        generic_name: generic_name.to_string(),
        base_monthly_demand,
        requires_cold_chain: cold_chain,
        stocking_tier: tier,
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn batch(
    id: &str,
    batch_number: &str,
    medication_id: &str,
    manufacturer: &str,
    importer: &str,
    initial_quantity: u32,
    manufactured: NaiveDate,
    expires: NaiveDate,
    unit_price: f64,
    reference_price: f64,
) -> Batch {
    Batch {
        id: BatchId::new(id),
        batch_number: batch_number.to_string(),
        medication_id: MedicationId::new(medication_id),
        manufacturer: manufacturer.to_string(),
        importer: importer.to_string(),
        initial_quantity,
        manufacturing_date: manufactured,
        expiry_date: expires,
        unit_price,
        reference_price: Some(reference_price),
    }
}

fn stock(id: &str, facility_id: &str, batch_id: &str, quantity: u32) -> InventorySeed {
    InventorySeed {
        id: InventoryId::new(id),
        facility_id: FacilityId::new(facility_id),
        batch_id: BatchId::new(batch_id),
        quantity,
        reorder_point: None,
        unit_price: None,
    }
}

impl CatalogFile {
    /// The demonstration catalog with its initial inventory
    #[rustfmt::skip]
    pub fn demo() -> Self {
        use FacilityTier::*;
        use FacilityType::*;

        let facilities = vec![
            facility("FAC_001", "Lagos University Teaching Hospital", TeachingHospital, Major, "Lagos", "Idi-Araba", 6.5172, 3.3549, true),
            facility("FAC_002", "General Hospital Ikeja", GeneralHospital, Secondary, "Lagos", "Ikeja", 6.6018, 3.3515, true),
            facility("FAC_003", "University College Hospital", TeachingHospital, Major, "Oyo", "Ibadan", 7.4018, 3.9033, true),
            facility("FAC_004", "Aminu Kano Teaching Hospital", TeachingHospital, Major, "Kano", "Kano", 12.0022, 8.5920, true),
            facility("FAC_005", "National Hospital Abuja", GeneralHospital, Major, "FCT", "Abuja", 9.0417, 7.4740, true),
            facility("FAC_006", "HealthPlus Pharmacy Port Harcourt", CommunityPharmacy, Secondary, "Rivers", "Port Harcourt", 4.8156, 7.0498, false),
            facility("FAC_007", "Primary Health Centre Ogui", PrimaryHealthCenter, Tertiary, "Enugu", "Enugu", 6.4584, 7.5464, false),
            facility("FAC_008", "MedPlus Pharmacy Kaduna", CommunityPharmacy, Tertiary, "Kaduna", "Kaduna", 10.5105, 7.4165, false),
        ];

        let medications = vec![
            medication("MED_001", "Artemether-Lumefantrine", 200, false, 1),
            medication("MED_002", "Amoxicillin", 150, false, 1),
            medication("MED_003", "Paracetamol", 300, false, 1),
            medication("MED_004", "Insulin (Human Soluble)", 60, true, 2),
            medication("MED_005", "Ceftriaxone", 80, false, 2),
            medication("MED_006", "Oxytocin", 40, true, 1),
        ];

        let batches = vec![
            batch("BAT_001", "NVS-AL-2501", "MED_001", "Novartis", "WWCVL", 5000, date(2025, 3, 1), date(2027, 6, 30), 1.80, 1.80),
            batch("BAT_002", "GSK-AMX-2502", "MED_002", "GSK", "WWCVL", 4000, date(2025, 4, 1), date(2027, 3, 31), 0.35, 0.35),
            batch("BAT_003", "EMZ-PCM-2503", "MED_003", "Emzor Pharmaceuticals", "Emzor Pharmaceuticals", 8000, date(2025, 5, 1), date(2027, 4, 30), 0.05, 0.05),
            batch("BAT_004", "NN-INS-2504", "MED_004", "Novo Nordisk", "WWCVL", 1200, date(2025, 6, 1), date(2026, 9, 30), 6.50, 6.50),
            batch("BAT_005", "ROC-CFX-2505", "MED_005", "Roche", "WWCVL", 2000, date(2025, 2, 1), date(2027, 1, 31), 2.10, 2.10),
            batch("BAT_006", "PFZ-OXY-2506", "MED_006", "Pfizer", "WWCVL", 1500, date(2025, 7, 1), date(2026, 12, 31), 0.90, 0.90),
            // Not an authorized GSK importer
            batch("BAT_007", "GSK-AMX-2507", "MED_002", "GSK", "Fidson Healthcare", 3000, date(2025, 8, 1), date(2027, 7, 31), 0.34, 0.35),
            // Reuses the printed number of BAT_001
            batch("BAT_008", "NVS-AL-2501", "MED_001", "Novartis", "Phillips Pharmaceuticals", 2500, date(2025, 3, 15), date(2027, 6, 30), 1.75, 1.80),
            // Half the reference price
            batch("BAT_009", "SAN-AL-2509", "MED_001", "Sanofi", "Phillips Pharmaceuticals", 3000, date(2025, 9, 1), date(2027, 8, 31), 0.90, 1.80),
            // Expires during the default horizon
            batch("BAT_010", "EMZ-PCM-2510", "MED_003", "Emzor Pharmaceuticals", "Emzor Pharmaceuticals", 6000, date(2024, 1, 5), date(2026, 1, 5), 0.05, 0.05),
        ];

        let inventory = vec![
            stock("INV_001", "FAC_001", "BAT_001", 400),
            // Starts below its reorder point (105)
            stock("INV_002", "FAC_001", "BAT_002", 60),
            stock("INV_003", "FAC_001", "BAT_003", 600),
            stock("INV_004", "FAC_001", "BAT_004", 120),
            stock("INV_005", "FAC_001", "BAT_006", 80),
            stock("INV_006", "FAC_002", "BAT_001", 200),
            stock("INV_007", "FAC_002", "BAT_007", 150),
            stock("INV_008", "FAC_002", "BAT_010", 300),
            stock("INV_009", "FAC_003", "BAT_008", 300),
            stock("INV_010", "FAC_003", "BAT_005", 150),
            stock("INV_011", "FAC_003", "BAT_004", 100),
            stock("INV_012", "FAC_004", "BAT_001", 350),
            stock("INV_013", "FAC_004", "BAT_003", 500),
            stock("INV_014", "FAC_004", "BAT_006", 70),
            stock("INV_015", "FAC_005", "BAT_009", 250),
            stock("INV_016", "FAC_005", "BAT_005", 120),
            stock("INV_017", "FAC_006", "BAT_002", 120),
            stock("INV_018", "FAC_006", "BAT_010", 150),
            stock("INV_019", "FAC_007", "BAT_001", 60),
            stock("INV_020", "FAC_007", "BAT_003", 90),
            stock("INV_021", "FAC_008", "BAT_002", 50),
            stock("INV_022", "FAC_008", "BAT_007", 40),
        ];

        Self { facilities, medications, batches, authorized_importers: default_authorized_importers(), inventory }
    }
}
