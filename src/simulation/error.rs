//! Error types and handling
//!
//! This module contains error types and error handling for the simulation.

use crate::catalog::CatalogError;
use crate::types::{ConfigError, ConfigValidationError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A referenced facility, medication, batch or inventory key is absent
    #[error("Unknown {kind}: {id}")]
    LookupMiss {
        /// Kind of key that was looked up
        kind: &'static str,
        /// The missing key
        id: String,
    },

    /// An engine operation was called in the wrong lifecycle phase
    #[error("Cannot {operation} while the engine is {phase}")]
    InvalidPhase {
        /// Operation attempted
        operation: &'static str,
        /// Phase the engine was in
        phase: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Configuration(String),

    /// Catalog could not be loaded or is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ConfigError> for SimulationError {
    fn from(error: ConfigError) -> Self {
        SimulationError::Configuration(error.to_string())
    }
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::Configuration(error.to_string())
    }
}

impl SimulationError {
    /// Create a lookup miss
    pub fn lookup_miss(kind: &'static str, id: impl ToString) -> Self {
        Self::LookupMiss { kind, id: id.to_string() }
    }

    /// Create an invalid phase error
    pub fn invalid_phase(operation: &'static str, phase: impl ToString) -> Self {
        Self::InvalidPhase { operation, phase: phase.to_string() }
    }

    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::LookupMiss { .. } => true,
            SimulationError::InvalidPhase { .. } => false,
            SimulationError::Configuration(_) => false,
            SimulationError::Catalog(_) => false,
            SimulationError::Io(_) => true,
            SimulationError::Serialization(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::LookupMiss { .. } => "Lookup",
            SimulationError::InvalidPhase { .. } => "Lifecycle",
            SimulationError::Configuration(_) => "Configuration",
            SimulationError::Catalog(_) => "Catalog",
            SimulationError::Io(_) => "IO",
            SimulationError::Serialization(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Error recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Skip the current unit of work and continue
    Skip,
    /// Use default values and continue
    UseDefaults,
    /// Abort the entire simulation
    Abort,
}

/// Error recovery context
#[derive(Debug, Clone)]
pub struct RecoveryContext {
    /// The recovery strategy to use for recoverable errors
    pub strategy: RecoveryStrategy,
    /// Additional context information
    pub context: String,
}

impl Default for RecoveryContext {
    fn default() -> Self {
        Self { strategy: RecoveryStrategy::Skip, context: String::new() }
    }
}

impl RecoveryContext {
    /// Create a new recovery context with skip strategy
    pub fn skip() -> Self {
        Self::default()
    }

    /// Add context information
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Error handler for graceful error recovery
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler;

impl ErrorHandler {
    /// Create a new error handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an error with the given recovery context
    pub fn handle_error(&self, error: &SimulationError, context: &RecoveryContext) -> RecoveryStrategy {
        match error {
            SimulationError::LookupMiss { .. } => {
                debug!("Lookup miss, skipping unit of work: {}", error);
            }
            SimulationError::Configuration(_) | SimulationError::Catalog(_) | SimulationError::InvalidPhase { .. } => {
                error!("Critical error in {}: {}", error.category(), error);
            }
            _ => {
                warn!("Recoverable error in {}: {}", error.category(), error);
            }
        }

        if !context.context.is_empty() {
            debug!("Error context: {}", context.context);
        }

        if !error.is_recoverable() {
            return RecoveryStrategy::Abort;
        }

        context.strategy
    }

    /// Execute an operation, turning recoverable failures into `Ok(None)`
    pub fn execute_with_recovery<T, F>(&self, operation: F, context: RecoveryContext) -> SimulationResult<Option<T>>
    where
        F: FnOnce() -> SimulationResult<T>,
    {
        match operation() {
            Ok(result) => Ok(Some(result)),
            Err(error) => match self.handle_error(&error, &context) {
                RecoveryStrategy::Skip => Ok(None),
                RecoveryStrategy::UseDefaults => {
                    info!("Using default values due to error: {}", error);
                    Ok(None)
                }
                RecoveryStrategy::Abort => {
                    error!("Aborting due to non-recoverable error: {}", error);
                    Err(error)
                }
            },
        }
    }
}
