//! Stock of one batch held at one facility

use crate::catalog::{Facility, Medication};
use crate::types::{BatchId, FacilityId, InventoryId, MedicationId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Smallest reorder point ever assigned
pub const MIN_REORDER_POINT: u32 = 10;

/// Quantity of a batch on hand at a facility
///
/// Records are owned by the simulation engine and only change through
/// [`MovementRecorder`](crate::inventory::MovementRecorder), so every change
/// has a matching movement in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Unique identifier
    pub id: InventoryId,
    /// Facility holding the stock
    pub facility_id: FacilityId,
    /// Batch the stock belongs to
    pub batch_id: BatchId,
    /// Medication of the batch
    pub medication_id: MedicationId,
    /// Units on hand
    pub quantity: u32,
    /// On-hand level at or below which the facility reorders
    pub reorder_point: u32,
    /// Expiry date of the batch
    pub expiry_date: NaiveDate,
    /// Price the facility paid per unit
    pub unit_price: f64,
}

impl InventoryRecord {
    /// Midnight UTC at the start of the expiry date
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expiry_date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    /// Whether the batch is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }

    /// Whether any units are on hand
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Reorder point for a medication at a facility
///
/// `max(10, base_monthly_demand * tier multiplier * buffer_days / 30)`
pub fn reorder_point_for(medication: &Medication, facility: &Facility) -> u32 {
    let buffer_days = facility.facility_type.buffer_days() as f64;
    let raw = medication.base_monthly_demand as f64 * facility.tier.reorder_multiplier() * buffer_days / 30.0;
    (raw.round() as u32).max(MIN_REORDER_POINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FacilityTier, FacilityType};
    use chrono::TimeZone;

    fn record(expiry: NaiveDate) -> InventoryRecord {
        InventoryRecord {
            id: InventoryId::new("INV_001"),
            facility_id: FacilityId::new("FAC_001"),
            batch_id: BatchId::new("BAT_001"),
            medication_id: MedicationId::new("MED_001"),
            quantity: 40,
            reorder_point: 50,
            expiry_date: expiry,
            unit_price: 1.0,
        }
    }

    #[test]
    fn test_expiry_boundary_is_midnight_utc() {
        let record = record(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());

        assert!(!record.is_expired_at(Utc.with_ymd_and_hms(2026, 1, 4, 23, 0, 0).unwrap()));
        assert!(record.is_expired_at(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()));
        assert!(record.is_expired_at(Utc.with_ymd_and_hms(2026, 1, 6, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_reorder_point_rule() {
        let medication = Medication {
            id: MedicationId::new("MED_001"),
            generic_name: "Paracetamol".to_string(),
            base_monthly_demand: 300,
            requires_cold_chain: false,
            stocking_tier: 1,
        };
        let mut facility = Facility {
            id: FacilityId::new("FAC_001"),
            name: "Teaching".to_string(),
            facility_type: FacilityType::TeachingHospital,
            tier: FacilityTier::Major,
            state: "Lagos".to_string(),
            city: "Lagos".to_string(),
            latitude: 6.5,
            longitude: 3.3,
            has_cold_storage: true,
        };

        // 300 * 1.5 * 14 / 30
        assert_eq!(reorder_point_for(&medication, &facility), 210);

        facility.facility_type = FacilityType::PrimaryHealthCenter;
        facility.tier = FacilityTier::Tertiary;
        // 300 * 0.6 * 5 / 30
        assert_eq!(reorder_point_for(&medication, &facility), 30);

        let slow = Medication { base_monthly_demand: 5, ..medication };
        assert_eq!(reorder_point_for(&slow, &facility), MIN_REORDER_POINT);
    }
}
