//! Health facilities that hold and dispense stock

use crate::geo::Coordinates;
use crate::types::{FacilityId, FacilityTier, FacilityType};
use serde::{Deserialize, Serialize};

/// A hospital, pharmacy or health center in the supply chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Unique identifier for the facility
    pub id: FacilityId,
    /// Human-readable name
    pub name: String,
    /// Kind of facility (drives demand and buffer stock)
    pub facility_type: FacilityType,
    /// Traffic tier (drives reorder point sizing)
    pub tier: FacilityTier,
    /// State or region the facility is located in
    pub state: String,
    /// City the facility is located in
    pub city: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Whether the facility can store cold-chain products
    #[serde(default)]
    pub has_cold_storage: bool,
}

impl Facility {
    /// Position of the facility
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Great-circle distance to another facility in kilometers
    pub fn distance_to(&self, other: &Facility) -> f64 {
        self.coordinates().distance_to(&other.coordinates())
    }

    /// Whether both facilities sit in the same state
    pub fn same_region(&self, other: &Facility) -> bool {
        self.state.eq_ignore_ascii_case(&other.state)
    }

    /// Validate coordinates and naming
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("Facility {} has an empty name", self.id));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!(
                "Facility {} has invalid coordinates ({}, {})",
                self.id, self.latitude, self.longitude
            ));
        }
        Ok(())
    }
}
