// MedGuard Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/medguard-simulator --seed 42
// ```
//
// Or with a catalog and an output file:
//
// ```console
// $ ./target/release/medguard-simulator --catalog catalog.json --output outcome.json --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use medguard_simulator::catalog::CatalogFile;
use medguard_simulator::simulation::{LoggingConfig, SimulationEngine, SimulationOutcome};
use medguard_simulator::types::config::CliArgs;
use medguard_simulator::types::SimulationConfig;
use std::time::Instant;
use tracing::{info, Level};

fn main() -> Result<()> {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        let json = SimulationConfig::default()
            .print_json()
            .context("Failed to serialize default configuration")?;
        println!("{}", json);
        return Ok(());
    }

    // Initialize logging based on CLI flags; the guard flushes on exit
    let _logging = logging_config(&args).init().context("Failed to initialize logging")?;

    info!("Starting MedGuard Simulator");

    let dry_run = args.dry_run;
    let config = SimulationConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    info!("Configuration loaded and validated successfully");

    let catalog_file = match &config.catalog_path {
        Some(path) => CatalogFile::from_file(path).with_context(|| format!("Failed to load catalog '{}'", path))?,
        None => CatalogFile::demo(),
    };
    let (catalog, inventory) = catalog_file.into_parts().context("Invalid catalog")?;

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        eprintln!(
            "Catalog: {} facilities, {} batches, {} inventory records, {} entries rejected",
            catalog.facility_count(),
            catalog.batch_count(),
            inventory.len(),
            catalog.rejected_entries().len()
        );
        return Ok(());
    }

    print_startup_banner(&config);

    let started = Instant::now();
    let mut engine =
        SimulationEngine::seeded(config.clone(), catalog, inventory).context("Failed to create simulation engine")?;
    engine.initialize().context("Failed to initialize simulation")?;
    let outcome = engine.run().context("Simulation failed")?;

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Simulation completed");

    if let Some(path) = &config.output_path {
        outcome
            .save_to_file(path)
            .with_context(|| format!("Failed to write outcome to '{}'", path))?;
        eprintln!("Outcome written to: {}", path);
    }

    print_final_report(&outcome);
    Ok(())
}

/// Logging setup selected by the command line
fn logging_config(args: &CliArgs) -> LoggingConfig {
    let mut logging = if args.debug {
        LoggingConfig::debugging()
    } else if args.verbose {
        LoggingConfig::verbose()
    } else {
        // Default: minimal logging for normal users
        LoggingConfig::new().with_level(Level::WARN)
    };

    if args.json_logs {
        logging = logging.with_json_format();
    }
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir.as_str());
    }
    logging
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("MedGuard Simulator");
    eprintln!("==================");
    eprintln!("Pharmaceutical supply chain simulation with fraud detection");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Start: {}", config.start_time.to_rfc3339());
    eprintln!("  Days: {}", config.days);
    eprintln!("  Agent Cycle: every {}h", config.agent_cycle_hours);
    eprintln!("  Opening Hours: {:02}:00 - {:02}:00", config.open_hour, config.close_hour);
    eprintln!("  Ghost Stock Probability: {:.2}%", config.ghost_stock_probability * 100.0);
    eprintln!("  Scenario Injection: {}", if config.inject_scenarios { "on" } else { "off" });
    eprintln!("  Catalog: {}", config.catalog_path.as_deref().unwrap_or("built-in demonstration"));
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}

/// Print the run statistics and the anomalies found
fn print_final_report(outcome: &SimulationOutcome) {
    eprintln!("{}", outcome.statistics);

    if outcome.anomalies.is_empty() {
        eprintln!("No anomalies detected.");
        return;
    }

    eprintln!("Detected Anomalies:");
    for anomaly in &outcome.anomalies {
        eprintln!(
            "  {} [{}] {} at {}: {}",
            anomaly.id,
            anomaly.severity,
            anomaly.anomaly_type,
            anomaly.detected_at.format("%Y-%m-%d %H:%M"),
            anomaly.detail
        );
    }
}
