//! Medications and their demand profile

use crate::types::MedicationId;
use serde::{Deserialize, Serialize};

/// A medication as stocked by facilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    /// Unique identifier
    pub id: MedicationId,
    /// International non-proprietary name
    pub generic_name: String,
    /// Units dispensed per month at a reference facility
    pub base_monthly_demand: u32,
    /// Whether the product must be kept refrigerated
    #[serde(default)]
    pub requires_cold_chain: bool,
    /// Lowest facility level allowed to stock it (1 = any facility)
    #[serde(default = "default_stocking_tier")]
    pub stocking_tier: u8,
}

fn default_stocking_tier() -> u8 {
    1
}

impl Medication {
    /// Expected units per opening hour before the facility multiplier
    pub fn hourly_demand(&self, opening_hours_per_day: u32) -> f64 {
        if opening_hours_per_day == 0 {
            return 0.0;
        }
        self.base_monthly_demand as f64 / 30.0 / opening_hours_per_day as f64
    }
}
