//! Detector pipeline with cross-cycle deduplication

use crate::detection::anomaly::{Anomaly, Finding, Signature};
use crate::detection::detectors::{run_detector, DetectionInput};
use crate::detection::thresholds::{DetectionSettings, DetectionThresholds};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Runs the enabled detectors and surfaces only anomalies not seen before
///
/// The pipeline remembers the signature of every anomaly it has returned.
/// Running it twice over an unchanged history returns nothing the second
/// time.
#[derive(Debug, Clone)]
pub struct AnomalyPipeline {
    thresholds: DetectionThresholds,
    settings: DetectionSettings,
    seen: HashSet<Signature>,
}

impl AnomalyPipeline {
    /// Create a pipeline that has surfaced nothing yet
    pub fn new(thresholds: DetectionThresholds, settings: DetectionSettings) -> Self {
        Self { thresholds, settings, seen: HashSet::new() }
    }

    /// Create a pipeline that treats `existing` anomalies as already surfaced
    pub fn with_seen(thresholds: DetectionThresholds, settings: DetectionSettings, existing: &[Anomaly]) -> Self {
        let mut pipeline = Self::new(thresholds, settings);
        pipeline.seen.extend(existing.iter().map(Anomaly::signature));
        pipeline
    }

    /// Thresholds in use
    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Number of signatures surfaced so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Every candidate from the enabled detectors, in detector order, without deduplication
    pub fn candidates(&self, input: &DetectionInput<'_>, now: DateTime<Utc>) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut ran = HashSet::new();

        for &anomaly_type in &self.settings.enabled_detectors {
            if !ran.insert(anomaly_type) {
                continue;
            }
            let found = run_detector(anomaly_type, input, now, &self.thresholds, &self.settings);
            debug!(detector = %anomaly_type, candidates = found.len(), "Detector finished");
            findings.extend(found);
        }

        findings
    }

    /// Run the detectors and return the anomalies with unseen signatures
    #[instrument(skip(self, input), fields(movements = input.movements.len(), events = input.events.len()))]
    pub fn detect(&mut self, input: &DetectionInput<'_>, now: DateTime<Utc>) -> Vec<Anomaly> {
        let candidates = self.candidates(input, now);
        let total = candidates.len();

        let fresh: Vec<Anomaly> = candidates
            .into_iter()
            .filter(|finding| self.seen.insert(finding.signature()))
            .map(|finding| Anomaly::from_finding(finding, now))
            .collect();

        if !fresh.is_empty() {
            info!(candidates = total, new = fresh.len(), "Detection surfaced new anomalies");
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFile;
    use crate::types::{AnomalyType, GhostStockScope};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 3, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_second_run_over_same_history_is_empty() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let input = DetectionInput { inventory: &inventory, movements: &[], events: &[], catalog: &catalog };
        let mut pipeline = AnomalyPipeline::new(DetectionThresholds::default(), DetectionSettings::default());

        let first = pipeline.detect(&input, now());
        assert!(!first.is_empty());
        assert_eq!(pipeline.seen_count(), first.len());

        let second = pipeline.detect(&input, now());
        assert!(second.is_empty());
    }

    #[test]
    fn test_demo_catalog_level_findings() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let input = DetectionInput { inventory: &inventory, movements: &[], events: &[], catalog: &catalog };
        let mut pipeline = AnomalyPipeline::new(DetectionThresholds::default(), DetectionSettings::default());

        let found = pipeline.detect(&input, now());
        let count = |t: AnomalyType| found.iter().filter(|a| a.anomaly_type == t).count();

        assert_eq!(count(AnomalyType::UnauthorizedImporter), 1);
        assert_eq!(count(AnomalyType::DuplicateBatchNumber), 1);
        assert_eq!(count(AnomalyType::PriceAnomaly), 1);
        // Nothing was received yet, so every stocked record is ghost stock
        assert_eq!(count(AnomalyType::GhostStock), inventory.len());
    }

    #[test]
    fn test_with_seen_suppresses_existing() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let input = DetectionInput { inventory: &inventory, movements: &[], events: &[], catalog: &catalog };

        let mut first = AnomalyPipeline::new(DetectionThresholds::default(), DetectionSettings::default());
        let existing = first.detect(&input, now());

        let mut resumed =
            AnomalyPipeline::with_seen(DetectionThresholds::default(), DetectionSettings::default(), &existing);
        assert!(resumed.detect(&input, now()).is_empty());
    }

    #[test]
    fn test_disabled_detectors_do_not_run() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let input = DetectionInput { inventory: &inventory, movements: &[], events: &[], catalog: &catalog };

        let mut settings = DetectionSettings { ghost_stock_scope: GhostStockScope::System, ..Default::default() };
        settings.disable(AnomalyType::GhostStock);
        let pipeline = AnomalyPipeline::new(DetectionThresholds::default(), settings);

        assert!(pipeline
            .candidates(&input, now())
            .iter()
            .all(|f| f.anomaly_type != AnomalyType::GhostStock));
    }
}
