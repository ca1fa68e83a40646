//! Anomaly records and their deduplication signature

use crate::types::{AnomalyId, AnomalyType, BatchId, FacilityId, MedicationId, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Structured evidence attached to an anomaly, ordered by key
pub type Evidence = BTreeMap<String, Value>;

/// Identity of an anomaly for deduplication across agent cycles
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature {
    /// Anomaly type
    pub anomaly_type: AnomalyType,
    /// Facility, when the type is facility-scoped
    pub facility_id: Option<FacilityId>,
    /// Batch, when the type is batch-scoped
    pub batch_id: Option<BatchId>,
    /// Medication, when the type is medication-scoped
    pub medication_id: Option<MedicationId>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part<T: fmt::Display>(value: &Option<T>) -> String {
            value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        }
        write!(
            f,
            "{}|{}|{}|{}",
            self.anomaly_type,
            part(&self.facility_id),
            part(&self.batch_id),
            part(&self.medication_id)
        )
    }
}

/// Candidate anomaly produced by a detector, before it is assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Anomaly type
    pub anomaly_type: AnomalyType,
    /// Severity
    pub severity: Severity,
    /// Facility concerned
    pub facility_id: Option<FacilityId>,
    /// Batch concerned
    pub batch_id: Option<BatchId>,
    /// Medication concerned
    pub medication_id: Option<MedicationId>,
    /// Human-readable summary
    pub detail: String,
    /// Structured evidence
    pub evidence: Evidence,
}

impl Finding {
    /// Start a finding with the type's default severity
    pub fn new(anomaly_type: AnomalyType, detail: impl Into<String>) -> Self {
        Self {
            anomaly_type,
            severity: anomaly_type.default_severity(),
            facility_id: None,
            batch_id: None,
            medication_id: None,
            detail: detail.into(),
            evidence: Evidence::new(),
        }
    }

    /// Attach the facility
    pub fn facility(mut self, id: &FacilityId) -> Self {
        self.facility_id = Some(id.clone());
        self
    }

    /// Attach the batch
    pub fn batch(mut self, id: &BatchId) -> Self {
        self.batch_id = Some(id.clone());
        self
    }

    /// Attach the medication
    pub fn medication(mut self, id: &MedicationId) -> Self {
        self.medication_id = Some(id.clone());
        self
    }

    /// Add one evidence entry
    pub fn evidence(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.evidence.insert(key.to_string(), value.into());
        self
    }

    /// Deduplication signature
    pub fn signature(&self) -> Signature {
        Signature {
            anomaly_type: self.anomaly_type,
            facility_id: self.facility_id.clone(),
            batch_id: self.batch_id.clone(),
            medication_id: self.medication_id.clone(),
        }
    }
}

/// A surfaced fraud signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Identifier derived from the signature and detection time
    pub id: AnomalyId,
    /// Anomaly type
    pub anomaly_type: AnomalyType,
    /// Severity
    pub severity: Severity,
    /// Facility concerned
    pub facility_id: Option<FacilityId>,
    /// Medication concerned
    pub medication_id: Option<MedicationId>,
    /// Batch concerned
    pub batch_id: Option<BatchId>,
    /// When the anomaly was detected
    pub detected_at: DateTime<Utc>,
    /// Human-readable summary
    pub detail: String,
    /// Structured evidence
    pub evidence: Evidence,
    /// Always true when created
    pub is_active: bool,
}

impl Anomaly {
    /// Turn a finding into an anomaly detected at `now`
    pub fn from_finding(finding: Finding, now: DateTime<Utc>) -> Self {
        let key = format!("{}@{}", finding.signature(), now.to_rfc3339());
        Self {
            id: AnomalyId::derived(&key),
            anomaly_type: finding.anomaly_type,
            severity: finding.severity,
            facility_id: finding.facility_id,
            medication_id: finding.medication_id,
            batch_id: finding.batch_id,
            detected_at: now,
            detail: finding.detail,
            evidence: finding.evidence,
            is_active: true,
        }
    }

    /// Deduplication signature
    pub fn signature(&self) -> Signature {
        Signature {
            anomaly_type: self.anomaly_type,
            facility_id: self.facility_id.clone(),
            batch_id: self.batch_id.clone(),
            medication_id: self.medication_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_finding_builder_and_signature() {
        let finding = Finding::new(AnomalyType::GhostStock, "no receipt")
            .facility(&FacilityId::new("F1"))
            .batch(&BatchId::new("B2"))
            .evidence("quantity", 40);

        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.evidence["quantity"], 40);
        assert_eq!(finding.signature().to_string(), "GHOST_STOCK|F1|B2|-");
    }

    #[test]
    fn test_anomaly_ids_are_stable() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 4, 0, 0).unwrap();
        let finding = Finding::new(AnomalyType::ImpossibleQuantity, "too much").batch(&BatchId::new("B1"));

        let a = Anomaly::from_finding(finding.clone(), now);
        let b = Anomaly::from_finding(finding, now);

        assert_eq!(a.id, b.id);
        assert!(a.is_active);
        assert_eq!(a.severity, Severity::Critical);
        assert_eq!(a.signature().batch_id, Some(BatchId::new("B1")));
    }
}
