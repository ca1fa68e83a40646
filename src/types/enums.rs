//! Enumeration types for the supply chain simulator
//!
//! This module contains the closed vocabularies used throughout the system:
//! movement kinds and sources, stock event kinds, the anomaly taxonomy and
//! severities, and the facility classification used for demand modelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of quantity change recorded against an inventory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Stock handed to patients
    Dispense,
    /// Stock received from a supplier
    Restock,
    /// Stock received from another facility
    TransferIn,
    /// Stock sent to another facility
    TransferOut,
    /// Stock pulled from the shelf because it expired
    ExpiryWithdraw,
}

impl MovementKind {
    /// All movement kinds in declaration order
    pub const ALL: [MovementKind; 5] = [
        MovementKind::Dispense,
        MovementKind::Restock,
        MovementKind::TransferIn,
        MovementKind::TransferOut,
        MovementKind::ExpiryWithdraw,
    ];

    /// Whether this movement brings stock into a facility
    pub fn is_receipt(&self) -> bool {
        matches!(self, MovementKind::Restock | MovementKind::TransferIn)
    }

    /// Sign applied to the requested quantity (+1 inbound, -1 outbound)
    pub fn sign(&self) -> i64 {
        if self.is_receipt() {
            1
        } else {
            -1
        }
    }

    /// Prefix used for generated reference ids
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            MovementKind::Dispense => "DIS",
            MovementKind::Restock => "RES",
            MovementKind::TransferIn => "TRF_IN",
            MovementKind::TransferOut => "TRF_OUT",
            MovementKind::ExpiryWithdraw => "EXP",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Dispense => write!(f, "DISPENSE"),
            MovementKind::Restock => write!(f, "RESTOCK"),
            MovementKind::TransferIn => write!(f, "TRANSFER_IN"),
            MovementKind::TransferOut => write!(f, "TRANSFER_OUT"),
            MovementKind::ExpiryWithdraw => write!(f, "EXPIRY_WITHDRAW"),
        }
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "DISPENSE" => Ok(MovementKind::Dispense),
            "RESTOCK" => Ok(MovementKind::Restock),
            "TRANSFER_IN" => Ok(MovementKind::TransferIn),
            "TRANSFER_OUT" => Ok(MovementKind::TransferOut),
            "EXPIRY_WITHDRAW" => Ok(MovementKind::ExpiryWithdraw),
            _ => Err(format!("Unknown movement kind: {}", s)),
        }
    }
}

/// Where a movement record originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementSource {
    /// Backdated receipt for stock already on hand when the run starts
    InitialSeed,
    /// Regular simulated activity (dispensing, expiry, restocking)
    Simulation,
    /// Deliberately fabricated known-bad pattern
    ScenarioInjection,
}

impl fmt::Display for MovementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementSource::InitialSeed => write!(f, "INITIAL_SEED"),
            MovementSource::Simulation => write!(f, "SIMULATION"),
            MovementSource::ScenarioInjection => write!(f, "SCENARIO_INJECTION"),
        }
    }
}

/// Kind of stock-level event derived from inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockEventKind {
    /// On-hand quantity at or below the reorder point
    LowStock,
    /// On-hand quantity at or below the critical fraction of the reorder point
    CriticalStock,
}

impl fmt::Display for StockEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockEventKind::LowStock => write!(f, "LOW_STOCK"),
            StockEventKind::CriticalStock => write!(f, "CRITICAL_STOCK"),
        }
    }
}

/// Fraud signatures surfaced by the detection pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    /// More units dispensed from a batch than could have been manufactured
    ImpossibleQuantity,
    /// The same batch received at distant facilities within a short time
    GeographicImpossibility,
    /// Stock on hand with no receiving movement
    GhostStock,
    /// Dispensing far above the stock baseline within a short window
    RapidTurnover,
    /// Batch imported by a company not authorized by its manufacturer
    UnauthorizedImporter,
    /// Distinct batches sharing a printed batch number
    DuplicateBatchNumber,
    /// Acquisition price far below the reference price
    PriceAnomaly,
}

impl AnomalyType {
    /// Every anomaly type, in pipeline execution order
    pub const ALL: [AnomalyType; 7] = [
        AnomalyType::ImpossibleQuantity,
        AnomalyType::GeographicImpossibility,
        AnomalyType::GhostStock,
        AnomalyType::RapidTurnover,
        AnomalyType::UnauthorizedImporter,
        AnomalyType::DuplicateBatchNumber,
        AnomalyType::PriceAnomaly,
    ];

    /// Severity assigned to findings of this type
    pub fn default_severity(&self) -> Severity {
        match self {
            AnomalyType::ImpossibleQuantity
            | AnomalyType::GeographicImpossibility
            | AnomalyType::UnauthorizedImporter
            | AnomalyType::DuplicateBatchNumber => Severity::Critical,
            AnomalyType::GhostStock | AnomalyType::RapidTurnover | AnomalyType::PriceAnomaly => {
                Severity::High
            }
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyType::ImpossibleQuantity => write!(f, "IMPOSSIBLE_QUANTITY"),
            AnomalyType::GeographicImpossibility => write!(f, "GEOGRAPHIC_IMPOSSIBILITY"),
            AnomalyType::GhostStock => write!(f, "GHOST_STOCK"),
            AnomalyType::RapidTurnover => write!(f, "RAPID_TURNOVER"),
            AnomalyType::UnauthorizedImporter => write!(f, "UNAUTHORIZED_IMPORTER"),
            AnomalyType::DuplicateBatchNumber => write!(f, "DUPLICATE_BATCH_NUMBER"),
            AnomalyType::PriceAnomaly => write!(f, "PRICE_ANOMALY"),
        }
    }
}

impl FromStr for AnomalyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "IMPOSSIBLE_QUANTITY" => Ok(AnomalyType::ImpossibleQuantity),
            "GEOGRAPHIC_IMPOSSIBILITY" => Ok(AnomalyType::GeographicImpossibility),
            "GHOST_STOCK" => Ok(AnomalyType::GhostStock),
            "RAPID_TURNOVER" => Ok(AnomalyType::RapidTurnover),
            "UNAUTHORIZED_IMPORTER" => Ok(AnomalyType::UnauthorizedImporter),
            "DUPLICATE_BATCH_NUMBER" => Ok(AnomalyType::DuplicateBatchNumber),
            "PRICE_ANOMALY" => Ok(AnomalyType::PriceAnomaly),
            _ => Err(format!("Unknown anomaly type: {}", s)),
        }
    }
}

/// Severity of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational
    Low,
    /// Worth a look
    Medium,
    /// Likely fraud
    High,
    /// Near-certain fraud
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Type of health facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityType {
    /// University teaching hospital
    TeachingHospital,
    /// General (secondary) hospital
    GeneralHospital,
    /// Retail community pharmacy
    CommunityPharmacy,
    /// Primary health center
    PrimaryHealthCenter,
}

impl FacilityType {
    /// Demand multiplier applied to a medication's base hourly demand
    pub fn dispense_multiplier(&self) -> f64 {
        match self {
            FacilityType::TeachingHospital => 2.0,
            FacilityType::GeneralHospital => 1.5,
            FacilityType::CommunityPharmacy => 1.0,
            FacilityType::PrimaryHealthCenter => 0.5,
        }
    }

    /// Days of buffer stock the facility keeps (drives the reorder point)
    pub fn buffer_days(&self) -> u32 {
        match self {
            FacilityType::TeachingHospital => 14,
            FacilityType::GeneralHospital => 10,
            FacilityType::CommunityPharmacy => 7,
            FacilityType::PrimaryHealthCenter => 5,
        }
    }

    /// Highest medication stocking tier this facility type may hold
    pub fn max_stocking_tier(&self) -> u8 {
        match self {
            FacilityType::TeachingHospital => 3,
            FacilityType::GeneralHospital => 2,
            FacilityType::CommunityPharmacy => 2,
            FacilityType::PrimaryHealthCenter => 1,
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityType::TeachingHospital => write!(f, "TEACHING_HOSPITAL"),
            FacilityType::GeneralHospital => write!(f, "GENERAL_HOSPITAL"),
            FacilityType::CommunityPharmacy => write!(f, "COMMUNITY_PHARMACY"),
            FacilityType::PrimaryHealthCenter => write!(f, "PRIMARY_HEALTH_CENTER"),
        }
    }
}

impl FromStr for FacilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "TEACHING_HOSPITAL" => Ok(FacilityType::TeachingHospital),
            "GENERAL_HOSPITAL" => Ok(FacilityType::GeneralHospital),
            "COMMUNITY_PHARMACY" | "PHARMACY" => Ok(FacilityType::CommunityPharmacy),
            "PRIMARY_HEALTH_CENTER" | "PHC" => Ok(FacilityType::PrimaryHealthCenter),
            _ => Err(format!("Unknown facility type: {}", s)),
        }
    }
}

/// Traffic tier of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityTier {
    /// High traffic
    Major,
    /// Normal traffic
    Secondary,
    /// Low traffic
    Tertiary,
}

impl FacilityTier {
    /// Multiplier applied when sizing the reorder point
    pub fn reorder_multiplier(&self) -> f64 {
        match self {
            FacilityTier::Major => 1.5,
            FacilityTier::Secondary => 1.0,
            FacilityTier::Tertiary => 0.6,
        }
    }
}

impl fmt::Display for FacilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityTier::Major => write!(f, "MAJOR"),
            FacilityTier::Secondary => write!(f, "SECONDARY"),
            FacilityTier::Tertiary => write!(f, "TERTIARY"),
        }
    }
}

/// How strictly GHOST_STOCK requires a receiving movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GhostStockScope {
    /// A receipt must exist for the same (facility, batch) pair
    #[default]
    Facility,
    /// A receipt for the batch anywhere in the system is enough
    System,
}

impl fmt::Display for GhostStockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GhostStockScope::Facility => write!(f, "FACILITY"),
            GhostStockScope::System => write!(f, "SYSTEM"),
        }
    }
}

impl FromStr for GhostStockScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facility" => Ok(GhostStockScope::Facility),
            "system" => Ok(GhostStockScope::System),
            _ => Err(format!("Unknown ghost stock scope: {} (expected facility or system)", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_receipts() {
        assert!(MovementKind::Restock.is_receipt());
        assert!(MovementKind::TransferIn.is_receipt());
        assert!(!MovementKind::Dispense.is_receipt());
        assert!(!MovementKind::TransferOut.is_receipt());
        assert!(!MovementKind::ExpiryWithdraw.is_receipt());

        assert_eq!(MovementKind::Restock.sign(), 1);
        assert_eq!(MovementKind::Dispense.sign(), -1);
    }

    #[test]
    fn test_movement_kind_round_trips_through_display() {
        for kind in MovementKind::ALL {
            assert_eq!(kind.to_string().parse::<MovementKind>().unwrap(), kind);
        }
        assert!("teleport".parse::<MovementKind>().is_err());
    }

    #[test]
    fn test_anomaly_type_parsing_is_lenient() {
        assert_eq!(
            "geographic-impossibility".parse::<AnomalyType>().unwrap(),
            AnomalyType::GeographicImpossibility
        );
        assert_eq!("ghost stock".parse::<AnomalyType>().unwrap(), AnomalyType::GhostStock);
    }

    #[test]
    fn test_anomaly_type_serde_uses_screaming_case() {
        let json = serde_json::to_string(&AnomalyType::DuplicateBatchNumber).unwrap();
        assert_eq!(json, "\"DUPLICATE_BATCH_NUMBER\"");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(AnomalyType::GhostStock.default_severity(), Severity::High);
        assert_eq!(AnomalyType::ImpossibleQuantity.default_severity(), Severity::Critical);
    }

    #[test]
    fn test_teaching_hospitals_dispense_more_than_health_centers() {
        assert!(
            FacilityType::TeachingHospital.dispense_multiplier()
                > FacilityType::PrimaryHealthCenter.dispense_multiplier()
        );
        assert_eq!(FacilityType::CommunityPharmacy.dispense_multiplier(), 1.0);
    }

    #[test]
    fn test_ghost_stock_scope_parsing() {
        assert_eq!("FACILITY".parse::<GhostStockScope>().unwrap(), GhostStockScope::Facility);
        assert_eq!("system".parse::<GhostStockScope>().unwrap(), GhostStockScope::System);
        assert!("galaxy".parse::<GhostStockScope>().is_err());
        assert_eq!(GhostStockScope::default(), GhostStockScope::Facility);
    }
}
