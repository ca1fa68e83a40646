//! Manufactured batches of a medication

use crate::types::{BatchId, MedicationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One production lot of a medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique identifier
    pub id: BatchId,
    /// Batch number printed on the packaging (not guaranteed unique)
    pub batch_number: String,
    /// Medication contained in the batch
    pub medication_id: MedicationId,
    /// Company that manufactured the batch
    pub manufacturer: String,
    /// Company that imported the batch
    pub importer: String,
    /// Units produced
    pub initial_quantity: u32,
    /// Date of manufacture
    pub manufacturing_date: NaiveDate,
    /// Date of expiry
    pub expiry_date: NaiveDate,
    /// Acquisition price per unit
    pub unit_price: f64,
    /// Market reference price per unit, when known
    #[serde(default)]
    pub reference_price: Option<f64>,
}

impl Batch {
    /// Whether the manufacturer imported the batch itself
    pub fn is_self_imported(&self) -> bool {
        self.manufacturer.eq_ignore_ascii_case(&self.importer)
    }

    /// Validate dates and quantities
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_quantity == 0 {
            return Err(format!("Batch {} has zero initial quantity", self.id));
        }
        if self.expiry_date <= self.manufacturing_date {
            return Err(format!(
                "Batch {} expires ({}) before it was manufactured ({})",
                self.id, self.expiry_date, self.manufacturing_date
            ));
        }
        if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            return Err(format!("Batch {} has an invalid unit price {}", self.id, self.unit_price));
        }
        Ok(())
    }
}
