//! Inventory records and the movement log
//!
//! - [`InventoryRecord`]: quantity of one batch at one facility
//! - [`MovementRecorder`]: the only way quantities change; every change yields a
//!   [`MovementRecord`]

pub mod movement;
pub mod record;

pub use movement::{MovementDraft, MovementRecord, MovementRecorder};
pub use record::{reorder_point_for, InventoryRecord, MIN_REORDER_POINT};
