//! Stock-level events derived from inventory
//!
//! - **StockEvent**: LOW_STOCK / CRITICAL_STOCK observation with a quantity snapshot
//! - **StockEventGenerator**: turns inventory snapshots into new stock events
//!
//! # Usage Example
//!
//! ```rust
//! use medguard_simulator::events::*;
//! use medguard_simulator::catalog::CatalogFile;
//! use medguard_simulator::types::default_start_time;
//!
//! let (_, inventory) = CatalogFile::demo().into_parts().unwrap();
//! let mut generator = StockEventGenerator::new(0.25);
//! let events = generator.generate(&inventory, default_start_time());
//! assert!(events.iter().any(|e| e.is_low_stock()));
//! ```

pub mod generator;
pub mod stock_event;

// Re-export all public types for convenience
pub use generator::*;
pub use stock_event::*;
