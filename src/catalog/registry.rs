//! Catalog registry and loading
//!
//! The [`Catalog`] holds the reference data a run needs (facilities, medications,
//! batches and the manufacturer to importer authorizations) with quick lookup
//! indices. [`CatalogFile`] is its JSON form together with the initial
//! inventory.

use crate::catalog::{Batch, Facility, Medication};
use crate::inventory::{reorder_point_for, InventoryRecord};
use crate::types::{BatchId, FacilityId, InventoryId, MedicationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading or validating a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid JSON
    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entries share an id
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId {
        /// Kind of entry
        kind: &'static str,
        /// Repeated id
        id: String,
    },

}

/// Reference data with lookup indices
#[derive(Debug, Clone)]
pub struct Catalog {
    facilities: Vec<Facility>,
    medications: Vec<Medication>,
    batches: Vec<Batch>,
    authorized_importers: BTreeMap<String, Vec<String>>,
    facility_index: HashMap<FacilityId, usize>,
    medication_index: HashMap<MedicationId, usize>,
    batch_index: HashMap<BatchId, usize>,
    rejected: Vec<String>,
}

impl Catalog {
    /// Build a catalog
    ///
    /// Repeated ids are an error. Entries that fail their own validation or
    /// refer to a missing medication are dropped and listed in
    /// [`rejected_entries`](Self::rejected_entries).
    pub fn new(
        facilities: Vec<Facility>,
        medications: Vec<Medication>,
        batches: Vec<Batch>,
        authorized_importers: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, CatalogError> {
        build_index("facility", &facilities, |f| f.id.clone())?;
        let medication_index = build_index("medication", &medications, |m| m.id.clone())?;
        build_index("batch", &batches, |b| b.id.clone())?;

        let mut rejected = Vec::new();
        let facilities: Vec<Facility> = facilities
            .into_iter()
            .filter(|facility| match facility.validate() {
                Ok(()) => true,
                Err(reason) => reject(&mut rejected, reason),
            })
            .collect();

        let batches: Vec<Batch> = batches
            .into_iter()
            .filter(|batch| {
                let checked = batch.validate().and_then(|()| {
                    if medication_index.contains_key(&batch.medication_id) {
                        Ok(())
                    } else {
                        Err(format!("Batch {} refers to unknown medication {}", batch.id, batch.medication_id))
                    }
                });
                match checked {
                    Ok(()) => true,
                    Err(reason) => reject(&mut rejected, reason),
                }
            })
            .collect();

        let facility_index = build_index("facility", &facilities, |f| f.id.clone())?;
        let batch_index = build_index("batch", &batches, |b| b.id.clone())?;

        Ok(Self {
            facilities,
            medications,
            batches,
            authorized_importers,
            facility_index,
            medication_index,
            batch_index,
            rejected,
        })
    }

    /// Facility by id
    pub fn facility(&self, id: &FacilityId) -> Option<&Facility> {
        self.facility_index.get(id).map(|&idx| &self.facilities[idx])
    }

    /// Medication by id
    pub fn medication(&self, id: &MedicationId) -> Option<&Medication> {
        self.medication_index.get(id).map(|&idx| &self.medications[idx])
    }

    /// Batch by id
    pub fn batch(&self, id: &BatchId) -> Option<&Batch> {
        self.batch_index.get(id).map(|&idx| &self.batches[idx])
    }

    /// Position of a facility in catalog order
    pub fn facility_position(&self, id: &FacilityId) -> Option<usize> {
        self.facility_index.get(id).copied()
    }

    /// All facilities in catalog order
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// All medications in catalog order
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// All batches in catalog order
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Manufacturer to authorized importer table
    pub fn authorized_importers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.authorized_importers
    }

    /// Importers authorized by a manufacturer, `None` when the manufacturer is not listed
    pub fn authorized_importers_for(&self, manufacturer: &str) -> Option<&[String]> {
        self.authorized_importers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(manufacturer))
            .map(|(_, importers)| importers.as_slice())
    }

    /// Distance between two facilities in kilometers
    pub fn distance_km(&self, a: &FacilityId, b: &FacilityId) -> Option<f64> {
        Some(self.facility(a)?.distance_to(self.facility(b)?))
    }

    /// Number of facilities
    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    /// Number of batches
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Reasons for every entry dropped while loading
    pub fn rejected_entries(&self) -> &[String] {
        &self.rejected
    }
}

fn reject(rejected: &mut Vec<String>, reason: String) -> bool {
    warn!("Dropping catalog entry: {}", reason);
    rejected.push(reason);
    false
}

fn build_index<T, K, F>(kind: &'static str, items: &[T], key: F) -> Result<HashMap<K, usize>, CatalogError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let id = key(item);
        if index.contains_key(&id) {
            return Err(CatalogError::DuplicateId { kind, id: id.to_string() });
        }
        index.insert(id, idx);
    }
    Ok(index)
}

/// Initial stock of a batch at a facility as written in a catalog file
///
/// The medication and expiry come from the batch. The reorder point and the
/// unit price default to the reorder rule and the batch price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySeed {
    /// Inventory record id
    pub id: InventoryId,
    /// Facility holding the stock
    pub facility_id: FacilityId,
    /// Batch held
    pub batch_id: BatchId,
    /// Units on hand at the start of the run
    pub quantity: u32,
    /// Explicit reorder point
    #[serde(default)]
    pub reorder_point: Option<u32>,
    /// Explicit unit price paid by the facility
    #[serde(default)]
    pub unit_price: Option<f64>,
}

/// Serialized catalog together with the initial inventory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Facilities, in the order they are simulated
    pub facilities: Vec<Facility>,
    /// Medications
    pub medications: Vec<Medication>,
    /// Batches
    pub batches: Vec<Batch>,
    /// Manufacturer name to the importers it authorizes
    #[serde(default)]
    pub authorized_importers: BTreeMap<String, Vec<String>>,
    /// Initial inventory
    #[serde(default)]
    pub inventory: Vec<InventorySeed>,
}

impl CatalogFile {
    /// Read a catalog file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            facilities = file.facilities.len(),
            batches = file.batches.len(),
            inventory = file.inventory.len(),
            "Loaded catalog file"
        );
        Ok(file)
    }

    /// Write the catalog as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the file and split it into the catalog and inventory records
    ///
    /// Inventory rows naming an unknown or dropped facility or batch are left
    /// out and recorded with the catalog's rejected entries.
    pub fn into_parts(self) -> Result<(Catalog, Vec<InventoryRecord>), CatalogError> {
        let CatalogFile { facilities, medications, batches, authorized_importers, inventory } = self;
        let mut catalog = Catalog::new(facilities, medications, batches, authorized_importers)?;

        let mut seen = HashSet::with_capacity(inventory.len());
        let mut records = Vec::with_capacity(inventory.len());
        let mut rejected = Vec::new();

        for seed in inventory {
            if !seen.insert(seed.id.clone()) {
                return Err(CatalogError::DuplicateId { kind: "inventory", id: seed.id.to_string() });
            }

            let resolved = catalog.facility(&seed.facility_id).zip(catalog.batch(&seed.batch_id));
            let Some((facility, batch)) = resolved else {
                let reason = format!(
                    "Inventory {} refers to unknown facility {} or batch {}",
                    seed.id, seed.facility_id, seed.batch_id
                );
                reject(&mut rejected, reason);
                continue;
            };
            let Some(medication) = catalog.medication(&batch.medication_id) else {
                reject(&mut rejected, format!("Inventory {} holds a batch of unknown medication", seed.id));
                continue;
            };

            let reorder_point = seed.reorder_point.unwrap_or_else(|| reorder_point_for(medication, facility));
            records.push(InventoryRecord {
                id: seed.id,
                facility_id: seed.facility_id,
                batch_id: seed.batch_id,
                medication_id: batch.medication_id.clone(),
                quantity: seed.quantity,
                reorder_point,
                expiry_date: batch.expiry_date,
                unit_price: seed.unit_price.unwrap_or(batch.unit_price),
            });
        }

        catalog.rejected.extend(rejected);
        debug!(records = records.len(), rejected = catalog.rejected.len(), "Catalog validated");
        Ok((catalog, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG_JSON: &str = r#"{
        "facilities": [
            {"id": "F1", "name": "North", "facility_type": "GENERAL_HOSPITAL", "tier": "SECONDARY",
             "state": "Lagos", "city": "Lagos", "latitude": 6.5, "longitude": 3.3},
            {"id": "F2", "name": "South", "facility_type": "COMMUNITY_PHARMACY", "tier": "TERTIARY",
             "state": "Rivers", "city": "Port Harcourt", "latitude": 4.8, "longitude": 7.0}
        ],
        "medications": [
            {"id": "M1", "generic_name": "Amoxicillin", "base_monthly_demand": 150}
        ],
        "batches": [
            {"id": "B1", "batch_number": "AMX-1", "medication_id": "M1", "manufacturer": "GSK",
             "importer": "WWCVL", "initial_quantity": 500, "manufacturing_date": "2025-01-01",
             "expiry_date": "2027-01-01", "unit_price": 1.2}
        ],
        "authorized_importers": {"GSK": ["WWCVL"]},
        "inventory": [
            {"id": "I1", "facility_id": "F1", "batch_id": "B1", "quantity": 80},
            {"id": "I2", "facility_id": "F2", "batch_id": "B1", "quantity": 20, "reorder_point": 35, "unit_price": 0.9}
        ]
    }"#;

    #[test]
    fn test_load_catalog_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        temp_file.write_all(CATALOG_JSON.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let (catalog, inventory) = CatalogFile::from_file(temp_file.path()).unwrap().into_parts().unwrap();

        assert_eq!(catalog.facility_count(), 2);
        assert_eq!(catalog.facility_position(&FacilityId::new("F2")), Some(1));
        assert_eq!(catalog.authorized_importers_for("gsk"), Some(&["WWCVL".to_string()][..]));
        assert!(catalog.authorized_importers_for("Pfizer").is_none());

        assert_eq!(inventory.len(), 2);
        // 150 * 1.0 * 10 / 30
        assert_eq!(inventory[0].reorder_point, 50);
        assert_eq!(inventory[0].medication_id, MedicationId::new("M1"));
        assert_eq!(inventory[0].unit_price, 1.2);
        assert_eq!(inventory[1].reorder_point, 35);
        assert_eq!(inventory[1].unit_price, 0.9);

        let distance = catalog.distance_km(&FacilityId::new("F1"), &FacilityId::new("F2")).unwrap();
        assert!(distance > 300.0);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut file: CatalogFile = serde_json::from_str(CATALOG_JSON).unwrap();
        let copy = file.facilities[0].clone();
        file.facilities.push(copy);

        match file.into_parts() {
            Err(CatalogError::DuplicateId { kind, id }) => {
                assert_eq!(kind, "facility");
                assert_eq!(id, "F1");
            }
            other => panic!("Expected DuplicateId, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_dangling_references_are_dropped() {
        let mut file: CatalogFile = serde_json::from_str(CATALOG_JSON).unwrap();
        file.inventory[1].batch_id = BatchId::new("B404");
        let (catalog, inventory) = file.into_parts().unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].id, InventoryId::new("I1"));
        assert_eq!(catalog.rejected_entries().len(), 1);

        // The batch goes, and so does every row holding it
        let mut file: CatalogFile = serde_json::from_str(CATALOG_JSON).unwrap();
        file.batches[0].medication_id = MedicationId::new("M404");
        let (catalog, inventory) = file.into_parts().unwrap();
        assert_eq!(catalog.batch_count(), 0);
        assert!(inventory.is_empty());
        assert_eq!(catalog.rejected_entries().len(), 3);
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let mut file: CatalogFile = serde_json::from_str(CATALOG_JSON).unwrap();
        file.facilities[1].latitude = 120.0;
        file.batches[0].initial_quantity = 0;
        let (catalog, inventory) = file.into_parts().unwrap();

        assert_eq!(catalog.facility_count(), 1);
        assert!(catalog.facility(&FacilityId::new("F2")).is_none());
        assert!(catalog.batch(&BatchId::new("B1")).is_none());
        assert!(inventory.is_empty());
        assert!(catalog.rejected_entries()[0].contains("F2"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(CatalogFile::from_file("/no/such/catalog.json"), Err(CatalogError::Io(_))));
    }
}
