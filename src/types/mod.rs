//! Core types and identifiers for the supply chain simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: catalog string ids plus sequential movement/event ids and
//!   content-derived anomaly ids
//! - **Enums**: movement kinds and sources, the anomaly taxonomy, severities and
//!   the facility classification
//! - **Configuration**: Simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use medguard_simulator::types::*;
//!
//! let facility = FacilityId::new("FAC_001");
//! assert_eq!(facility.as_str(), "FAC_001");
//!
//! assert!(MovementKind::Restock.is_receipt());
//! assert_eq!(AnomalyType::GhostStock.default_severity(), Severity::High);
//!
//! let config = SimulationConfig { days: 2, seed: Some(7), ..Default::default() };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
