//! Identifier types for the supply chain simulator
//!
//! Reference data (facilities, medications, batches, inventory records) arrives
//! with string identifiers assigned by the catalog owner, e.g. `FAC_001`.
//! Records created during a run (movements, stock events) get sequential
//! identifiers so that seeded runs are reproducible, and anomalies get a
//! content-derived UUID.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Declares a string-backed catalog identifier newtype.
macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

catalog_id!(
    /// Identifier of a health facility (hospital, pharmacy, health center)
    FacilityId
);
catalog_id!(
    /// Identifier of a medication (generic product)
    MedicationId
);
catalog_id!(
    /// Identifier of a manufactured batch
    BatchId
);
catalog_id!(
    /// Identifier of an inventory record (one batch held at one facility)
    InventoryId
);

/// Sequential identifier of a movement record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovementId(pub u64);

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MOV_{:08}", self.0)
    }
}

impl Serialize for MovementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MovementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("MOV_").unwrap_or(&s);
        digits.parse().map(MovementId).map_err(serde::de::Error::custom)
    }
}

/// Sequential identifier of a stock event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EVT_{:06}", self.0)
    }
}

impl Serialize for EventId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("EVT_").unwrap_or(&s);
        digits.parse().map(EventId).map_err(serde::de::Error::custom)
    }
}

/// Unique identifier for an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnomalyId(pub Uuid);

impl AnomalyId {
    /// Derive a stable ID from the anomaly's content
    ///
    /// The same key always yields the same ID, which keeps seeded runs
    /// byte-for-byte reproducible.
    pub fn derived(key: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }
}

impl fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "ANOM_{}", simple[..10].to_uppercase())
    }
}

impl Serialize for AnomalyId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for AnomalyId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let uuid = Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
        Ok(AnomalyId(uuid))
    }
}
