//! Movement records and the recorder that produces them
//!
//! Every change to an [`InventoryRecord`] goes through [`MovementRecorder::apply`],
//! which clamps the resulting quantity at zero and appends nothing on its own:
//! the caller owns the movement log and pushes the returned record.

use crate::inventory::InventoryRecord;
use crate::types::{BatchId, FacilityId, InventoryId, MedicationId, MovementId, MovementKind, MovementSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Immutable log entry describing one quantity change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Sequential identifier
    pub id: MovementId,
    /// Inventory record affected; `None` for off-book fabricated movements
    pub inventory_id: Option<InventoryId>,
    /// Facility where the movement happened
    pub facility_id: FacilityId,
    /// Batch moved
    pub batch_id: BatchId,
    /// Medication of the batch
    pub medication_id: MedicationId,
    /// Kind of movement
    pub kind: MovementKind,
    /// Signed change requested (negative for outbound kinds)
    pub quantity_change: i64,
    /// Quantity on the record after the change
    pub quantity_after: u32,
    /// When the movement happened
    pub timestamp: DateTime<Utc>,
    /// External reference (prescription, delivery note, ...)
    pub reference_id: String,
    /// What produced the movement
    pub source: MovementSource,
}

impl MovementRecord {
    /// Whether this movement brings stock into the facility
    pub fn is_receipt(&self) -> bool {
        self.kind.is_receipt()
    }

    /// Units handed out to patients by this movement
    pub fn dispensed_units(&self) -> u64 {
        match self.kind {
            MovementKind::Dispense => self.quantity_change.unsigned_abs(),
            _ => 0,
        }
    }
}

/// Fields of a movement built by hand, before an id is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
    /// Inventory record the movement claims to affect, if any
    pub inventory_id: Option<InventoryId>,
    /// Facility where the movement happened
    pub facility_id: FacilityId,
    /// Batch moved
    pub batch_id: BatchId,
    /// Medication of the batch
    pub medication_id: MedicationId,
    /// Kind of movement
    pub kind: MovementKind,
    /// Signed change
    pub quantity_change: i64,
    /// Quantity reported after the change
    pub quantity_after: u32,
    /// When the movement happened
    pub timestamp: DateTime<Utc>,
    /// External reference
    pub reference_id: String,
    /// What produced the movement
    pub source: MovementSource,
}

impl MovementDraft {
    /// Draft a movement against an existing record without looking at its quantity
    pub fn for_record(
        record: &InventoryRecord,
        kind: MovementKind,
        timestamp: DateTime<Utc>,
        source: MovementSource,
    ) -> Self {
        Self {
            inventory_id: Some(record.id.clone()),
            facility_id: record.facility_id.clone(),
            batch_id: record.batch_id.clone(),
            medication_id: record.medication_id.clone(),
            kind,
            quantity_change: 0,
            quantity_after: record.quantity,
            timestamp,
            reference_id: String::new(),
            source,
        }
    }
}

/// Assigns movement ids and applies quantity changes
#[derive(Debug, Clone)]
pub struct MovementRecorder {
    next_id: u64,
}

impl MovementRecorder {
    /// Create a recorder whose first movement is `MOV_00000001`
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Number of movements issued so far
    pub fn issued(&self) -> u64 {
        self.next_id - 1
    }

    fn allocate(&mut self) -> MovementId {
        let id = MovementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Apply `quantity` units of `kind` to `record` and describe the change
    ///
    /// The resulting quantity saturates at zero; the returned record keeps the
    /// requested change so that `quantity_after = max(0, before + change)`.
    pub fn apply(
        &mut self,
        record: &mut InventoryRecord,
        kind: MovementKind,
        quantity: u32,
        timestamp: DateTime<Utc>,
        source: MovementSource,
    ) -> MovementRecord {
        let id = self.allocate();
        let change = kind.sign() * quantity as i64;
        let after = (record.quantity as i64 + change).max(0);
        record.quantity = u32::try_from(after).unwrap_or(u32::MAX);

        trace!(
            movement_id = %id,
            inventory_id = %record.id,
            kind = %kind,
            change,
            after = record.quantity,
            "Applied movement"
        );

        MovementRecord {
            reference_id: format!("{}_{}", kind.reference_prefix(), id.0),
            id,
            inventory_id: Some(record.id.clone()),
            facility_id: record.facility_id.clone(),
            batch_id: record.batch_id.clone(),
            medication_id: record.medication_id.clone(),
            kind,
            quantity_change: change,
            quantity_after: record.quantity,
            timestamp,
            source,
        }
    }

    /// Record a movement without touching any inventory
    ///
    /// Used for receipts of stock already on hand and for injected scenarios.
    pub fn fabricate(&mut self, draft: MovementDraft) -> MovementRecord {
        let id = self.allocate();
        let reference_id = if draft.reference_id.is_empty() {
            format!("{}_{}", draft.kind.reference_prefix(), id.0)
        } else {
            draft.reference_id
        };

        MovementRecord {
            id,
            inventory_id: draft.inventory_id,
            facility_id: draft.facility_id,
            batch_id: draft.batch_id,
            medication_id: draft.medication_id,
            kind: draft.kind,
            quantity_change: draft.quantity_change,
            quantity_after: draft.quantity_after,
            timestamp: draft.timestamp,
            reference_id,
            source: draft.source,
        }
    }

    /// Move up to `quantity` units of a batch between two records
    ///
    /// Returns the TRANSFER_OUT and TRANSFER_IN pair, both carrying the same
    /// reference id. Only what is on hand at the sender is moved. Returns
    /// `None` when the records hold different batches or nothing can move.
    ///
    /// The engine never transfers stock itself; this is for callers that
    /// model inter-facility movements over the engine's inventory and log.
    pub fn transfer(
        &mut self,
        from: &mut InventoryRecord,
        to: &mut InventoryRecord,
        quantity: u32,
        timestamp: DateTime<Utc>,
        source: MovementSource,
    ) -> Option<(MovementRecord, MovementRecord)> {
        if from.batch_id != to.batch_id || from.id == to.id {
            return None;
        }
        let moved = quantity.min(from.quantity);
        if moved == 0 {
            return None;
        }

        let mut outbound = self.apply(from, MovementKind::TransferOut, moved, timestamp, source);
        let mut inbound = self.apply(to, MovementKind::TransferIn, moved, timestamp, source);
        let reference = format!("TRF_{}_{}", outbound.id.0, inbound.id.0);
        outbound.reference_id = reference.clone();
        inbound.reference_id = reference;

        Some((outbound, inbound))
    }
}

impl Default for MovementRecorder {
    fn default() -> Self {
        Self::new()
    }
}
