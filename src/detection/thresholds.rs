//! Detection thresholds and detector selection
//!
//! Thresholds are a named set of tunables. Any subset can be supplied in a
//! configuration file (keys use their SCREAMING_SNAKE_CASE names) or on the
//! command line as `KEY=VALUE`; missing keys fall back to the documented
//! defaults.

use crate::types::{AnomalyType, GhostStockScope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named tunables used by the detectors and the stock event generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DetectionThresholds {
    /// Dispensed units may not exceed `initial_quantity` times this
    pub impossible_quantity_multiplier: f64,
    /// Minimum distance between consecutive receipts to be suspicious
    pub geographic_impossible_km: f64,
    /// Receipts closer in time than this are suspicious when far apart
    pub geographic_impossible_hours: f64,
    /// Width of the rolling window used by the turnover detector
    pub rapid_turnover_hours: f64,
    /// Dispensing above baseline times this is rapid turnover
    pub rapid_turnover_multiplier: f64,
    /// Price ratios below this are suspicious
    pub price_anomaly_low_threshold: f64,
    /// Fraction of the reorder point at or below which stock is critical
    pub critical_stock_ratio: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            impossible_quantity_multiplier: 10.0,
            geographic_impossible_km: 300.0,
            geographic_impossible_hours: 6.0,
            rapid_turnover_hours: 24.0,
            rapid_turnover_multiplier: 2.5,
            price_anomaly_low_threshold: 0.7,
            critical_stock_ratio: 0.25,
        }
    }
}

/// Key naming one threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdKey {
    /// `IMPOSSIBLE_QUANTITY_MULTIPLIER`
    ImpossibleQuantityMultiplier,
    /// `GEOGRAPHIC_IMPOSSIBLE_KM`
    GeographicImpossibleKm,
    /// `GEOGRAPHIC_IMPOSSIBLE_HOURS`
    GeographicImpossibleHours,
    /// `RAPID_TURNOVER_HOURS`
    RapidTurnoverHours,
    /// `RAPID_TURNOVER_MULTIPLIER`
    RapidTurnoverMultiplier,
    /// `PRICE_ANOMALY_LOW_THRESHOLD`
    PriceAnomalyLowThreshold,
    /// `CRITICAL_STOCK_RATIO`
    CriticalStockRatio,
}

impl ThresholdKey {
    /// Every key, in documentation order
    pub const ALL: [ThresholdKey; 7] = [
        ThresholdKey::ImpossibleQuantityMultiplier,
        ThresholdKey::GeographicImpossibleKm,
        ThresholdKey::GeographicImpossibleHours,
        ThresholdKey::RapidTurnoverHours,
        ThresholdKey::RapidTurnoverMultiplier,
        ThresholdKey::PriceAnomalyLowThreshold,
        ThresholdKey::CriticalStockRatio,
    ];
}

impl fmt::Display for ThresholdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThresholdKey::ImpossibleQuantityMultiplier => "IMPOSSIBLE_QUANTITY_MULTIPLIER",
            ThresholdKey::GeographicImpossibleKm => "GEOGRAPHIC_IMPOSSIBLE_KM",
            ThresholdKey::GeographicImpossibleHours => "GEOGRAPHIC_IMPOSSIBLE_HOURS",
            ThresholdKey::RapidTurnoverHours => "RAPID_TURNOVER_HOURS",
            ThresholdKey::RapidTurnoverMultiplier => "RAPID_TURNOVER_MULTIPLIER",
            ThresholdKey::PriceAnomalyLowThreshold => "PRICE_ANOMALY_LOW_THRESHOLD",
            ThresholdKey::CriticalStockRatio => "CRITICAL_STOCK_RATIO",
        };
        f.write_str(name)
    }
}

impl FromStr for ThresholdKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        ThresholdKey::ALL
            .into_iter()
            .find(|key| key.to_string() == normalized)
            .ok_or_else(|| format!("Unknown threshold key: {}", s))
    }
}

impl DetectionThresholds {
    /// Read one threshold by key
    pub fn get(&self, key: ThresholdKey) -> f64 {
        match key {
            ThresholdKey::ImpossibleQuantityMultiplier => self.impossible_quantity_multiplier,
            ThresholdKey::GeographicImpossibleKm => self.geographic_impossible_km,
            ThresholdKey::GeographicImpossibleHours => self.geographic_impossible_hours,
            ThresholdKey::RapidTurnoverHours => self.rapid_turnover_hours,
            ThresholdKey::RapidTurnoverMultiplier => self.rapid_turnover_multiplier,
            ThresholdKey::PriceAnomalyLowThreshold => self.price_anomaly_low_threshold,
            ThresholdKey::CriticalStockRatio => self.critical_stock_ratio,
        }
    }

    /// Replace one threshold
    pub fn set(&mut self, key: ThresholdKey, value: f64) {
        match key {
            ThresholdKey::ImpossibleQuantityMultiplier => self.impossible_quantity_multiplier = value,
            ThresholdKey::GeographicImpossibleKm => self.geographic_impossible_km = value,
            ThresholdKey::GeographicImpossibleHours => self.geographic_impossible_hours = value,
            ThresholdKey::RapidTurnoverHours => self.rapid_turnover_hours = value,
            ThresholdKey::RapidTurnoverMultiplier => self.rapid_turnover_multiplier = value,
            ThresholdKey::PriceAnomalyLowThreshold => self.price_anomaly_low_threshold = value,
            ThresholdKey::CriticalStockRatio => self.critical_stock_ratio = value,
        }
    }

    /// Builder-style override of one threshold
    pub fn with(mut self, key: ThresholdKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Apply a `KEY=VALUE` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), String> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Threshold override must look like KEY=VALUE, got '{}'", assignment))?;
        let key: ThresholdKey = key.parse()?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for {}: {}", key, e))?;
        self.set(key, value);
        Ok(())
    }

    /// Keys whose values are not finite and strictly positive
    pub fn invalid_keys(&self) -> Vec<(ThresholdKey, f64)> {
        ThresholdKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .filter(|(_, value)| !value.is_finite() || *value <= 0.0)
            .collect()
    }
}

/// Which detectors run and how the ambiguous ones behave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Detectors executed on every agent cycle, in this order
    pub enabled_detectors: Vec<AnomalyType>,
    /// Receipt scope required by the ghost stock detector
    pub ghost_stock_scope: GhostStockScope,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self { enabled_detectors: AnomalyType::ALL.to_vec(), ghost_stock_scope: GhostStockScope::Facility }
    }
}

impl DetectionSettings {
    /// Whether the given detector is enabled
    pub fn is_enabled(&self, anomaly_type: AnomalyType) -> bool {
        self.enabled_detectors.contains(&anomaly_type)
    }

    /// Turn a detector off
    pub fn disable(&mut self, anomaly_type: AnomalyType) {
        self.enabled_detectors.retain(|t| *t != anomaly_type);
    }
}
