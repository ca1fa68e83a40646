//! MedGuard Simulator
//!
//! A discrete-event simulation of a pharmaceutical supply chain paired with an
//! anomaly-detection pipeline that looks for counterfeit and diversion signals
//! in the resulting movement log.
//!
//! # Overview
//!
//! Facilities hold batches of medications. Over a simulated horizon they
//! dispense stock to patients, withdraw expired stock and get replenished when
//! stock runs low. Known fraud patterns are injected into the movement log, and
//! a periodic agent cycle scans the full history for anomalies.
//!
//! ## Key Features
//!
//! - **Typed Catalog**: facilities, medications, batches and authorized importers
//! - **Movement Log**: every quantity change recorded, quantities never negative
//! - **Stock Events**: LOW_STOCK and CRITICAL_STOCK derived from inventory
//! - **Anomaly Detection**: seven detectors with signature deduplication
//! - **Reproducible Runs**: a single seeded generator drives every random draw
//!
//! ## Quick Start
//!
//! ```rust
//! use medguard_simulator::*;
//!
//! let (catalog, inventory) = CatalogFile::demo().into_parts()?;
//! let config = SimulationConfig { days: 2, seed: Some(42), ..Default::default() };
//!
//! let outcome = simulate(config, catalog, inventory)?;
//! println!("{}", outcome.statistics.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums and configuration
//! - [`geo`]: great-circle distance
//! - [`catalog`]: facilities, medications, batches and catalog loading
//! - [`inventory`]: inventory records and the movement recorder
//! - [`events`]: stock-level events
//! - [`detection`]: anomaly detectors and the deduplicating pipeline
//! - [`simulation`]: engine, event queue, demand, scenarios and statistics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │   Catalog   │    │  Inventory  │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Facilities  │◄───┤ Records     │
//! │ Enums       │    │ Batches     │    │ Movements   │
//! │ Config      │    │ Importers   │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                   ▲                   ▲
//!        │                   │                   │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Events    │    │  Detection  │    │ Simulation  │
//! │             │    │             │    │             │
//! │ Stock       │◄───┤ Detectors   │◄───┤ Engine      │
//! │ Generator   │    │ Pipeline    │    │ Scenarios   │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
#![warn(missing_debug_implementations)]

// Module declarations
pub mod catalog;
pub mod detection;
pub mod events;
pub mod geo;
pub mod inventory;
pub mod simulation;

pub mod types;

// Core types and identifiers
pub use types::{
    // Identifiers
    AnomalyId,
    BatchId,
    EventId,
    FacilityId,
    InventoryId,
    MedicationId,
    MovementId,
    // Enums
    AnomalyType,
    FacilityTier,
    FacilityType,
    GhostStockScope,
    MovementKind,
    MovementSource,
    Severity,
    StockEventKind,
    // Configuration
    ConfigValidationError,
    SimulationConfig,
};

// Catalog
pub use catalog::{Batch, Catalog, CatalogError, CatalogFile, Facility, Medication};

// Inventory
pub use inventory::{InventoryRecord, MovementRecord, MovementRecorder};

// Stock events
pub use events::{StockEvent, StockEventGenerator};

// Detection
pub use detection::{Anomaly, AnomalyPipeline, DetectionInput, DetectionSettings, DetectionThresholds};

// Simulation
pub use simulation::{simulate, SimulationEngine, SimulationError, SimulationOutcome, RunStatistics};
