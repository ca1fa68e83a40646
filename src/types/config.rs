//! Configuration structures for the supply chain simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the horizon, the demand model, scenario injection and the
//! detection thresholds of a run.

use crate::detection::thresholds::{DetectionSettings, DetectionThresholds};
use crate::types::{AnomalyType, GhostStockScope};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default operating constants
pub mod defaults {
    /// Days simulated when nothing else is configured
    pub const DAYS: usize = 4;

    /// Hours between two agent cycles
    pub const AGENT_CYCLE_HOURS: u32 = 4;

    /// First hour (inclusive) at which facilities dispense
    pub const OPEN_HOUR: u32 = 8;

    /// Hour (exclusive) at which facilities stop dispensing
    pub const CLOSE_HOUR: u32 = 18;

    /// Probability that an initial receipt is left out of the movement log
    pub const GHOST_STOCK_PROBABILITY: f64 = 0.01;

    /// Initial receipts are spread over this many days before the start
    pub const RECEIPT_STAGGER_DAYS: u32 = 7;
}

/// Start of the default simulation horizon (2026-01-03 00:00 UTC)
pub fn default_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a start time given either as RFC 3339 or as a plain `YYYY-MM-DD` date
pub fn parse_start_time(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::InvalidStartTime(value.to_string()))
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "medguard-simulator",
    version = "0.1.0",
    about = "MedGuard Simulator - Simulates a pharmaceutical supply chain and detects fraud signals",
    long_about = "Runs a discrete-event simulation of facilities dispensing and restocking medication \
batches, injects known counterfeit and diversion scenarios, and scans the resulting movement log \
for anomalies.

EXAMPLES:
    # Run the demonstration catalog with default settings
    medguard-simulator

    # Reproducible run written to a file
    medguard-simulator --seed 42 --output outcome.json

    # Use a catalog and a configuration file
    medguard-simulator --catalog catalog.json --config config.json

    # Tighten a detection threshold
    medguard-simulator --threshold GEOGRAPHIC_IMPOSSIBLE_KM=150

    # Generate configuration template
    medguard-simulator --print-config > my-config.json

    # Validate configuration without running
    medguard-simulator --config my-config.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)

    Use --print-config to generate a template configuration file."
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Catalog file with facilities, medications, batches and inventory
    #[arg(
        long,
        help = "Catalog file path (JSON format)",
        long_help = "Path to a JSON catalog holding facilities, medications, batches, authorized \
                     importers and the initial inventory. The built-in demonstration catalog is used \
                     when omitted."
    )]
    pub catalog: Option<String>,

    /// Where to write the run outcome
    #[arg(short, long, help = "Write the simulation outcome as JSON to this path")]
    pub output: Option<String>,

    /// Start of the simulated horizon
    #[arg(
        long,
        help = "Simulation start (RFC 3339 or YYYY-MM-DD)",
        long_help = "Start of the simulated horizon, either RFC 3339 or a plain date interpreted as \
                     midnight UTC. Default: 2026-01-03"
    )]
    pub start: Option<String>,

    /// Number of days to simulate
    #[arg(
        long,
        help = "Number of days to simulate",
        long_help = "Number of days to simulate. Must be greater than 0. Default: 4"
    )]
    pub days: Option<usize>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Hours between agent cycles
    #[arg(long, help = "Hours between agent cycles")]
    pub agent_cycle_hours: Option<u32>,

    /// Opening hour of facilities
    #[arg(long, help = "Hour at which facilities start dispensing (0-23)")]
    pub open_hour: Option<u32>,

    /// Closing hour of facilities
    #[arg(long, help = "Hour at which facilities stop dispensing (1-24)")]
    pub close_hour: Option<u32>,

    /// Probability that an initial receipt is omitted
    #[arg(
        long,
        help = "Probability of omitting an initial receipt (0.0-1.0)",
        long_help = "Probability that the receipt backing an initial inventory record is left out \
                     of the movement log, creating ghost stock. Range: 0.0-1.0. Default: 0.01"
    )]
    pub ghost_stock_probability: Option<f64>,

    /// Disable scenario injection
    #[arg(long, help = "Do not inject the fraud scenarios")]
    pub no_scenarios: bool,

    /// Threshold overrides
    #[arg(
        long = "threshold",
        value_name = "KEY=VALUE",
        help = "Override a detection threshold (repeatable)",
        long_help = "Override a detection threshold, e.g. IMPOSSIBLE_QUANTITY_MULTIPLIER=8. May be given several times."
    )]
    pub thresholds: Vec<String>,

    /// Ghost stock receipt scope
    #[arg(long, help = "Ghost stock receipt scope (facility or system)")]
    pub ghost_stock_scope: Option<String>,

    /// Detectors to switch off
    #[arg(
        long = "disable-detector",
        value_name = "ANOMALY_TYPE",
        help = "Disable a detector, e.g. RAPID_TURNOVER (repeatable)"
    )]
    pub disabled_detectors: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Directory for rolling JSON log files
    #[arg(long, value_name = "DIR", help = "Also write JSON logs to daily files in this directory")]
    pub log_dir: Option<String>,

    /// Emit console logs as JSON
    #[arg(long, help = "Emit console logs as JSON")]
    pub json_logs: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Start of the simulated horizon
    pub start_time: Option<DateTime<Utc>>,

    /// Number of days to simulate
    pub days: Option<usize>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Hours between agent cycles
    pub agent_cycle_hours: Option<u32>,

    /// Opening hour of facilities
    pub open_hour: Option<u32>,

    /// Closing hour of facilities
    pub close_hour: Option<u32>,

    /// Probability that an initial receipt is omitted
    pub ghost_stock_probability: Option<f64>,

    /// Days over which initial receipts are staggered
    pub receipt_stagger_days: Option<u32>,

    /// Whether fraud scenarios are injected
    pub inject_scenarios: Option<bool>,

    /// Detection thresholds (missing keys use their defaults)
    pub thresholds: Option<DetectionThresholds>,

    /// Detector selection
    pub detection: Option<DetectionSettings>,

    /// Catalog file path
    pub catalog_path: Option<String>,

    /// Output file path
    pub output_path: Option<String>,
}

/// Configuration for the supply chain simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Start of the simulated horizon
    pub start_time: DateTime<Utc>,

    /// Number of days to simulate
    pub days: usize,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Hours between agent cycles
    pub agent_cycle_hours: u32,

    /// Opening hour of facilities (inclusive)
    pub open_hour: u32,

    /// Closing hour of facilities (exclusive)
    pub close_hour: u32,

    /// Probability that an initial receipt is omitted (0.0-1.0)
    pub ghost_stock_probability: f64,

    /// Days over which initial receipts are staggered
    pub receipt_stagger_days: u32,

    /// Whether fraud scenarios are injected
    pub inject_scenarios: bool,

    /// Detection thresholds
    pub thresholds: DetectionThresholds,

    /// Detector selection
    pub detection: DetectionSettings,

    /// Catalog file path (demonstration catalog when absent)
    pub catalog_path: Option<String>,

    /// Output file path for the run outcome
    pub output_path: Option<String>,
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// Start time could not be parsed
    #[error("Invalid start time: {0} (expected RFC 3339 or YYYY-MM-DD)")]
    InvalidStartTime(String),

    /// A command line override could not be applied
    #[error("Invalid override: {0}")]
    InvalidOverride(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Days count is invalid
    #[error("Days count must be greater than 0, got {0}")]
    InvalidDaysCount(usize),

    /// Agent cycle interval is invalid
    #[error("Agent cycle hours must be greater than 0, got {0}")]
    InvalidAgentCycle(u32),

    /// Opening hours are invalid
    #[error("Invalid opening hours: open ({0}) must be < close ({1}) and close <= 24")]
    InvalidOpeningHours(u32, u32),

    /// Percentage value is out of range
    #[error("Invalid probability for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidProbability {
        /// Name of the field with invalid probability
        field: String,
        /// The invalid probability value
        value: f64,
    },

    /// Threshold is not a positive number
    #[error("Invalid threshold {key}: {value} (must be a positive number)")]
    InvalidThreshold {
        /// Threshold key
        key: String,
        /// The invalid value
        value: f64,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            days: defaults::DAYS,
            seed: None,
            agent_cycle_hours: defaults::AGENT_CYCLE_HOURS,
            open_hour: defaults::OPEN_HOUR,
            close_hour: defaults::CLOSE_HOUR,
            ghost_stock_probability: defaults::GHOST_STOCK_PROBABILITY,
            receipt_stagger_days: defaults::RECEIPT_STAGGER_DAYS,
            inject_scenarios: true,
            thresholds: DetectionThresholds::default(),
            detection: DetectionSettings::default(),
            catalog_path: None,
            output_path: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence
        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    pub fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            start_time: config_file.start_time.unwrap_or(defaults.start_time),
            days: config_file.days.unwrap_or(defaults.days),
            seed: config_file.seed.or(defaults.seed),
            agent_cycle_hours: config_file.agent_cycle_hours.unwrap_or(defaults.agent_cycle_hours),
            open_hour: config_file.open_hour.unwrap_or(defaults.open_hour),
            close_hour: config_file.close_hour.unwrap_or(defaults.close_hour),
            ghost_stock_probability: config_file
                .ghost_stock_probability
                .unwrap_or(defaults.ghost_stock_probability),
            receipt_stagger_days: config_file
                .receipt_stagger_days
                .unwrap_or(defaults.receipt_stagger_days),
            inject_scenarios: config_file.inject_scenarios.unwrap_or(defaults.inject_scenarios),
            thresholds: config_file.thresholds.unwrap_or(defaults.thresholds),
            detection: config_file.detection.unwrap_or(defaults.detection),
            catalog_path: config_file.catalog_path.or(defaults.catalog_path),
            output_path: config_file.output_path.or(defaults.output_path),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.start {
            config.start_time = parse_start_time(&value)?;
        }
        if let Some(value) = args.days {
            config.days = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.agent_cycle_hours {
            config.agent_cycle_hours = value;
        }
        if let Some(value) = args.open_hour {
            config.open_hour = value;
        }
        if let Some(value) = args.close_hour {
            config.close_hour = value;
        }
        if let Some(value) = args.ghost_stock_probability {
            config.ghost_stock_probability = value;
        }
        if args.no_scenarios {
            config.inject_scenarios = false;
        }
        if let Some(value) = args.catalog {
            config.catalog_path = Some(value);
        }
        if let Some(value) = args.output {
            config.output_path = Some(value);
        }

        for assignment in &args.thresholds {
            config
                .thresholds
                .apply_override(assignment)
                .map_err(ConfigError::InvalidOverride)?;
        }

        if let Some(value) = args.ghost_stock_scope {
            config.detection.ghost_stock_scope =
                value.parse::<GhostStockScope>().map_err(ConfigError::InvalidOverride)?;
        }

        for name in &args.disabled_detectors {
            let anomaly_type = name.parse::<AnomalyType>().map_err(ConfigError::InvalidOverride)?;
            config.detection.disable(anomaly_type);
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.days == 0 {
            return Err(ConfigValidationError::InvalidDaysCount(self.days));
        }

        if self.agent_cycle_hours == 0 {
            return Err(ConfigValidationError::InvalidAgentCycle(self.agent_cycle_hours));
        }

        if self.open_hour >= self.close_hour || self.close_hour > 24 {
            return Err(ConfigValidationError::InvalidOpeningHours(self.open_hour, self.close_hour));
        }

        if !(0.0..=1.0).contains(&self.ghost_stock_probability) {
            return Err(ConfigValidationError::InvalidProbability {
                field: "ghost_stock_probability".to_string(),
                value: self.ghost_stock_probability,
            });
        }

        if let Some((key, value)) = self.thresholds.invalid_keys().into_iter().next() {
            return Err(ConfigValidationError::InvalidThreshold { key: key.to_string(), value });
        }

        Ok(())
    }

    /// End of the simulated horizon (exclusive)
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::days(self.days as i64)
    }

    /// Number of opening hours per day
    pub fn opening_hours_per_day(&self) -> u32 {
        self.close_hour.saturating_sub(self.open_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::thresholds::ThresholdKey;

    fn parse(args: &[&str]) -> CliArgs {
        let mut full = vec!["medguard-simulator"];
        full.extend_from_slice(args);
        CliArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.start_time, Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(config.days, 4);
        assert_eq!(config.agent_cycle_hours, 4);
        assert_eq!(config.open_hour, 8);
        assert_eq!(config.close_hour, 18);
        assert_eq!(config.ghost_stock_probability, 0.01);
        assert!(config.inject_scenarios);
        assert!(config.seed.is_none());
        assert_eq!(config.end_time(), Utc.with_ymd_and_hms(2026, 1, 7, 0, 0, 0).unwrap());
        assert_eq!(config.opening_hours_per_day(), 10);
    }

    #[test]
    fn test_days_cli_parsing() {
        assert_eq!(parse(&["--days", "5"]).days, Some(5));
        assert_eq!(parse(&[]).days, None);
    }

    #[test]
    fn test_cli_overrides() {
        let args = parse(&[
            "--seed",
            "54321",
            "--days",
            "2",
            "--start",
            "2026-02-01",
            "--threshold",
            "IMPOSSIBLE_QUANTITY_MULTIPLIER=8",
            "--threshold",
            "GEOGRAPHIC_IMPOSSIBLE_KM=150",
            "--ghost-stock-scope",
            "system",
            "--disable-detector",
            "RAPID_TURNOVER",
            "--no-scenarios",
        ]);

        let config = SimulationConfig::from_cli_args(args).unwrap();

        assert_eq!(config.seed, Some(54321));
        assert_eq!(config.days, 2);
        assert_eq!(config.start_time, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(config.thresholds.get(ThresholdKey::ImpossibleQuantityMultiplier), 8.0);
        assert_eq!(config.thresholds.geographic_impossible_km, 150.0);
        assert_eq!(config.detection.ghost_stock_scope, GhostStockScope::System);
        assert!(!config.detection.is_enabled(AnomalyType::RapidTurnover));
        assert!(!config.inject_scenarios);
        // Untouched fields keep their defaults
        assert_eq!(config.agent_cycle_hours, 4);
        assert_eq!(config.thresholds.price_anomaly_low_threshold, 0.7);
    }

    #[test]
    fn test_bad_cli_override_is_rejected() {
        let args = parse(&["--threshold", "NOT_A_KEY=1"]);
        assert!(matches!(
            SimulationConfig::from_cli_args(args),
            Err(ConfigError::InvalidOverride(_))
        ));

        let args = parse(&["--start", "next tuesday"]);
        assert!(matches!(
            SimulationConfig::from_cli_args(args),
            Err(ConfigError::InvalidStartTime(_))
        ));
    }

    #[test]
    fn test_parse_start_time_accepts_rfc3339() {
        let parsed = parse_start_time("2026-01-03T06:30:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 1, 3, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "days": 2,
            "seed": 12345,
            "ghost_stock_probability": 0.0,
            "thresholds": { "RAPID_TURNOVER_MULTIPLIER": 4.0 },
            "detection": { "ghost_stock_scope": "SYSTEM" }
        }"#;

        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SimulationConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.days, 2);
        assert_eq!(config.seed, Some(12345));
        assert_eq!(config.ghost_stock_probability, 0.0);
        assert_eq!(config.thresholds.rapid_turnover_multiplier, 4.0);
        assert_eq!(config.thresholds.impossible_quantity_multiplier, 10.0);
        assert_eq!(config.detection.ghost_stock_scope, GhostStockScope::System);
        // Missing detector list falls back to all detectors
        assert_eq!(config.detection.enabled_detectors.len(), AnomalyType::ALL.len());
    }

    #[test]
    fn test_config_file_errors() {
        assert!(matches!(
            SimulationConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::FileNotFound(_))
        ));

        let temp_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            SimulationConfig::from_file(temp_file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_simulation_config_validation_success() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_simulation_config_validation_failures() {
        let config = SimulationConfig { days: 0, ..SimulationConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDaysCount(0))));

        let config = SimulationConfig { agent_cycle_hours: 0, ..SimulationConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidAgentCycle(0))));

        let config = SimulationConfig { open_hour: 18, close_hour: 8, ..SimulationConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidOpeningHours(18, 8))
        ));

        let config = SimulationConfig { ghost_stock_probability: 1.5, ..SimulationConfig::default() };
        match config.validate() {
            Err(ConfigValidationError::InvalidProbability { field, value }) => {
                assert_eq!(field, "ghost_stock_probability");
                assert_eq!(value, 1.5);
            }
            other => panic!("Expected InvalidProbability error, got {:?}", other),
        }

        let config = SimulationConfig {
            thresholds: DetectionThresholds::default().with(ThresholdKey::CriticalStockRatio, -1.0),
            ..SimulationConfig::default()
        };
        match config.validate() {
            Err(ConfigValidationError::InvalidThreshold { key, .. }) => {
                assert_eq!(key, "CRITICAL_STOCK_RATIO");
            }
            other => panic!("Expected InvalidThreshold error, got {:?}", other),
        }
    }

    #[test]
    fn test_simulation_config_serialization() {
        let config = SimulationConfig { seed: Some(7), ..SimulationConfig::default() };
        let json = config.print_json().unwrap();
        assert!(json.contains("\"IMPOSSIBLE_QUANTITY_MULTIPLIER\""));

        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.seed, Some(7));
        assert_eq!(deserialized.start_time, config.start_time);
        assert_eq!(deserialized.thresholds, config.thresholds);
    }
}
