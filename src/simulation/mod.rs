//! Simulation orchestration and control
//!
//! This module contains the discrete-event engine and its supporting parts.
//!
//! # Overview
//!
//! - **SimulationEngine**: owns the inventory and logs, processes the event queue
//! - **EventQueue**: time-ordered queue with FIFO tie-breaking
//! - **TimeManager**: simulated horizon, opening hours and cycle times
//! - **DemandModel**: Poisson hourly dispensing demand
//! - **ScenarioInjector**: fabricates known fraud patterns into the movement log
//! - **RunStatistics**: counters and reports for a run
//! - **SimulationError**: error handling and recovery strategies
//!
//! # Usage Example
//!
//! ```rust
//! use medguard_simulator::catalog::CatalogFile;
//! use medguard_simulator::simulation::*;
//! use medguard_simulator::types::*;
//!
//! let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
//! let config = SimulationConfig { days: 1, seed: Some(42), ..Default::default() };
//!
//! let mut engine = SimulationEngine::seeded(config, catalog, inventory).unwrap();
//! engine.initialize().unwrap();
//! let outcome = engine.run().unwrap();
//!
//! assert!(!outcome.movements.is_empty());
//! assert_eq!(engine.phase(), EnginePhase::Ended);
//! ```

pub mod demand;
pub mod engine;
pub mod error;
pub mod event_queue;
pub mod logging;
pub mod scenarios;
pub mod statistics;
pub mod time_manager;

// Re-export all public types for convenience
pub use demand::*;
pub use engine::*;
pub use error::*;
pub use event_queue::*;
pub use logging::*;
pub use scenarios::*;
pub use statistics::*;
pub use time_manager::*;
