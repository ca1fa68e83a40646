//! Reference data: facilities, medications, batches and importer authorizations
//!
//! The catalog is an input to a run. It is either loaded from a JSON
//! [`CatalogFile`] or taken from the built-in [`CatalogFile::demo`].

pub mod batch;
pub mod demo;
pub mod facility;
pub mod medication;
pub mod registry;

pub use batch::Batch;
pub use demo::default_authorized_importers;
pub use facility::Facility;
pub use medication::Medication;
pub use registry::{Catalog, CatalogError, CatalogFile, InventorySeed};
