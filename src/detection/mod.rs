//! Anomaly detection
//!
//! Seven independent detectors scan the accumulated history for fraud
//! signatures; the [`AnomalyPipeline`] runs the enabled ones and suppresses
//! anything whose signature it has already surfaced.
//!
//! | Type | Signature |
//! |---|---|
//! | IMPOSSIBLE_QUANTITY | batch |
//! | GEOGRAPHIC_IMPOSSIBILITY | batch, medication |
//! | GHOST_STOCK | facility, batch, medication |
//! | RAPID_TURNOVER | facility, medication |
//! | UNAUTHORIZED_IMPORTER | batch, medication |
//! | DUPLICATE_BATCH_NUMBER | first batch, medication |
//! | PRICE_ANOMALY | facility, batch, medication |

pub mod anomaly;
pub mod detectors;
pub mod pipeline;
pub mod thresholds;

pub use anomaly::{Anomaly, Evidence, Finding, Signature};
pub use detectors::{run_detector, DetectionInput};
pub use pipeline::AnomalyPipeline;
pub use thresholds::{DetectionSettings, DetectionThresholds, ThresholdKey};
