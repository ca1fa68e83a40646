//! Discrete-event simulation engine
//!
//! The engine owns the inventory, the movement log, the stock-event log and the
//! anomaly list. Work is scheduled on an [`EventQueue`] and processed strictly
//! in time order; every random draw comes from one seeded [`StdRng`].

use crate::catalog::Catalog;
use crate::detection::{Anomaly, AnomalyPipeline, DetectionInput};
use crate::events::{StockEvent, StockEventGenerator};
use crate::inventory::{InventoryRecord, MovementDraft, MovementRecord, MovementRecorder};
use crate::simulation::demand::DemandModel;
use crate::simulation::error::{ErrorHandler, RecoveryContext, SimulationError, SimulationResult};
use crate::simulation::event_queue::{EventQueue, ScheduledEvent, SimEvent};
use crate::simulation::scenarios::ScenarioInjector;
use crate::simulation::statistics::RunStatistics;
use crate::simulation::time_manager::TimeManager;
use crate::types::{AnomalyType, FacilityId, MedicationId, MovementKind, MovementSource, SimulationConfig};
use crate::{perf_span, sim_event};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Hours after the start at which geographic anomalies are injected
pub const GEOGRAPHIC_INJECTION_HOURS: [i64; 2] = [15, 35];

/// Hours after the start at which an impossible quantity is injected
pub const IMPOSSIBLE_QUANTITY_INJECTION_HOURS: i64 = 50;

/// Spacing between replenishments triggered in the same agent cycle
const RESTOCK_SPACING_MINUTES: i64 = 30;

/// Lifecycle of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnginePhase {
    /// Created, nothing scheduled yet
    Uninitialized,
    /// Initial receipts recorded and events scheduled
    Running,
    /// The horizon has been processed
    Ended,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Uninitialized => write!(f, "uninitialized"),
            EnginePhase::Running => write!(f, "running"),
            EnginePhase::Ended => write!(f, "ended"),
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Inventory at the end of the horizon
    pub inventory: Vec<InventoryRecord>,
    /// Movement log in recording order
    pub movements: Vec<MovementRecord>,
    /// Stock events in derivation order
    pub events: Vec<StockEvent>,
    /// Anomalies in detection order
    pub anomalies: Vec<Anomaly>,
    /// Start of the horizon
    pub start: DateTime<Utc>,
    /// End of the horizon (exclusive)
    pub end: DateTime<Utc>,
    /// Run counters
    pub statistics: RunStatistics,
}

impl SimulationOutcome {
    /// Anomalies of one type
    pub fn anomalies_of(&self, anomaly_type: AnomalyType) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(move |a| a.anomaly_type == anomaly_type)
    }

    /// Movements produced by one source
    pub fn movements_from(&self, source: MovementSource) -> impl Iterator<Item = &MovementRecord> {
        self.movements.iter().filter(move |m| m.source == source)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> SimulationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the outcome as JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SimulationResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Discrete-event engine driving one simulation run
#[derive(Debug)]
pub struct SimulationEngine {
    config: SimulationConfig,
    catalog: Catalog,
    inventory: Vec<InventoryRecord>,
    movements: Vec<MovementRecord>,
    events: Vec<StockEvent>,
    anomalies: Vec<Anomaly>,
    queue: EventQueue,
    clock: TimeManager,
    demand: DemandModel,
    recorder: MovementRecorder,
    stock_events: StockEventGenerator,
    pipeline: AnomalyPipeline,
    restocked: BTreeSet<(FacilityId, MedicationId)>,
    statistics: RunStatistics,
    error_handler: ErrorHandler,
    rng: StdRng,
    phase: EnginePhase,
}

impl SimulationEngine {
    /// Create an engine with an explicit random generator
    pub fn new(
        config: SimulationConfig,
        catalog: Catalog,
        inventory: Vec<InventoryRecord>,
        rng: StdRng,
    ) -> SimulationResult<Self> {
        config.validate()?;

        let clock = TimeManager::from_config(&config);
        let demand = DemandModel::new(clock.opening_hours());
        let stock_events = StockEventGenerator::new(config.thresholds.critical_stock_ratio);
        let pipeline = AnomalyPipeline::new(config.thresholds, config.detection.clone());

        let statistics = RunStatistics {
            rejected_catalog_entries: catalog.rejected_entries().len(),
            ..RunStatistics::new()
        };

        info!(
            facilities = catalog.facility_count(),
            batches = catalog.batch_count(),
            records = inventory.len(),
            rejected = statistics.rejected_catalog_entries,
            days = config.days,
            "Created simulation engine"
        );

        Ok(Self {
            config,
            catalog,
            inventory,
            movements: Vec::new(),
            events: Vec::new(),
            anomalies: Vec::new(),
            queue: EventQueue::new(),
            clock,
            demand,
            recorder: MovementRecorder::new(),
            stock_events,
            pipeline,
            restocked: BTreeSet::new(),
            statistics,
            error_handler: ErrorHandler::new(),
            rng,
            phase: EnginePhase::Uninitialized,
        })
    }

    /// Create an engine seeded from the configuration, or from entropy when no seed is set
    pub fn seeded(
        config: SimulationConfig,
        catalog: Catalog,
        inventory: Vec<InventoryRecord>,
    ) -> SimulationResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, catalog, inventory, rng)
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &[InventoryRecord] {
        &self.inventory
    }

    pub fn movements(&self) -> &[MovementRecord] {
        &self.movements
    }

    pub fn events(&self) -> &[StockEvent] {
        &self.events
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Number of events still waiting in the queue
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Record initial receipts and schedule the horizon
    #[instrument(skip(self))]
    pub fn initialize(&mut self) -> SimulationResult<()> {
        if self.phase != EnginePhase::Uninitialized {
            return Err(SimulationError::invalid_phase("initialize", self.phase));
        }

        self.seed_initial_receipts();

        for tick in self.clock.hourly_ticks() {
            self.queue.push(tick, SimEvent::HourlyTick);
        }
        for cycle in self.clock.agent_cycles() {
            self.queue.push(cycle, SimEvent::AgentCycle);
        }

        if self.config.inject_scenarios {
            for hours in GEOGRAPHIC_INJECTION_HOURS {
                if let Some(at) = self.clock.offset(hours) {
                    let description = format!("Same batch received far apart at +{}h", hours);
                    self.queue.push(at, SimEvent::InjectGeographicAnomaly { description });
                }
            }
            if let Some(at) = self.clock.offset(IMPOSSIBLE_QUANTITY_INJECTION_HOURS) {
                let description = format!(
                    "Dispensing beyond production at +{}h",
                    IMPOSSIBLE_QUANTITY_INJECTION_HOURS
                );
                self.queue.push(at, SimEvent::InjectImpossibleQuantity { description });
            }
        }

        self.phase = EnginePhase::Running;
        info!(
            scheduled = self.queue.len(),
            seeded_receipts = self.movements.len(),
            omitted_receipts = self.statistics.omitted_receipts,
            "Simulation initialized"
        );
        Ok(())
    }

    /// Process every event due before the end of the horizon
    #[instrument(skip(self))]
    pub fn run(&mut self) -> SimulationResult<SimulationOutcome> {
        if self.phase != EnginePhase::Running {
            return Err(SimulationError::invalid_phase("run", self.phase));
        }

        let end = self.clock.end();
        while let Some(scheduled) = self.queue.pop() {
            if scheduled.time >= end {
                break;
            }
            self.dispatch(scheduled)?;
        }

        let discarded = self.queue.len();
        self.queue.clear();
        self.phase = EnginePhase::Ended;

        info!(discarded, "{}", self.statistics.summary());
        Ok(self.outcome())
    }

    fn outcome(&mut self) -> SimulationOutcome {
        SimulationOutcome {
            inventory: self.inventory.clone(),
            movements: std::mem::take(&mut self.movements),
            events: std::mem::take(&mut self.events),
            anomalies: std::mem::take(&mut self.anomalies),
            start: self.clock.start(),
            end: self.clock.end(),
            statistics: self.statistics.clone(),
        }
    }

    fn dispatch(&mut self, scheduled: ScheduledEvent) -> SimulationResult<()> {
        let now = scheduled.time;
        let handler = self.error_handler.clone();
        let context = RecoveryContext::skip().with_context(format!("{} at {}", scheduled.event.name(), now));

        let handled = handler.execute_with_recovery(|| self.handle(now, &scheduled.event), context)?;
        if handled.is_none() {
            self.statistics.skipped_units_of_work += 1;
        }
        Ok(())
    }

    fn handle(&mut self, now: DateTime<Utc>, event: &SimEvent) -> SimulationResult<()> {
        match event {
            SimEvent::HourlyTick => self.on_hourly_tick(now),
            SimEvent::AgentCycle => self.on_agent_cycle(now),
            SimEvent::InjectGeographicAnomaly { description } => self.on_geographic_injection(now, description),
            SimEvent::InjectImpossibleQuantity { description } => {
                self.on_impossible_quantity_injection(now, description)
            }
        }
    }

    /// Receipts for the opening stock, backdated before the horizon
    fn seed_initial_receipts(&mut self) {
        let probability = self.config.ghost_stock_probability;
        let mut facilities_seen: Vec<FacilityId> = Vec::new();

        for record in &self.inventory {
            let facility_index = match facilities_seen.iter().position(|f| *f == record.facility_id) {
                Some(index) => index,
                None => {
                    facilities_seen.push(record.facility_id.clone());
                    facilities_seen.len() - 1
                }
            };

            if !record.in_stock() {
                continue;
            }

            if self.rng.gen::<f64>() < probability {
                self.statistics.omitted_receipts += 1;
                debug!(inventory_id = %record.id, "Initial receipt omitted");
                continue;
            }

            let at = self.clock.seed_receipt_time(facility_index, self.config.receipt_stagger_days);
            let mut draft = MovementDraft::for_record(record, MovementKind::Restock, at, MovementSource::InitialSeed);
            draft.quantity_change = i64::from(record.quantity);

            let movement = self.recorder.fabricate(draft);
            self.statistics.record_movement(&movement);
            self.movements.push(movement);
        }
    }

    fn on_hourly_tick(&mut self, now: DateTime<Utc>) -> SimulationResult<()> {
        self.statistics.hourly_ticks += 1;

        for record in self.inventory.iter_mut().filter(|r| r.in_stock() && r.is_expired_at(now)) {
            let units = record.quantity;
            let movement = self.recorder.apply(
                record,
                MovementKind::ExpiryWithdraw,
                units,
                now,
                MovementSource::Simulation,
            );
            debug!(inventory_id = %record.id, units, "Withdrew expired stock");
            self.statistics.record_movement(&movement);
            self.movements.push(movement);
        }

        if !self.clock.is_open(now) {
            return Ok(());
        }

        for facility in self.catalog.facilities() {
            for record in self
                .inventory
                .iter_mut()
                .filter(|r| r.facility_id == facility.id && r.in_stock())
            {
                let lookup = || {
                    self.catalog
                        .medication(&record.medication_id)
                        .ok_or_else(|| SimulationError::lookup_miss("medication", &record.medication_id))
                };
                let context = RecoveryContext::skip().with_context(format!("dispensing {}", record.id));
                let Some(medication) = self.error_handler.execute_with_recovery(lookup, context)? else {
                    self.statistics.skipped_units_of_work += 1;
                    continue;
                };

                let units = self.demand.draw(&mut self.rng, medication, facility, record.quantity);
                if units == 0 {
                    continue;
                }

                let movement =
                    self.recorder.apply(record, MovementKind::Dispense, units, now, MovementSource::Simulation);
                self.statistics.record_movement(&movement);
                self.movements.push(movement);
            }
        }

        Ok(())
    }

    fn on_agent_cycle(&mut self, now: DateTime<Utc>) -> SimulationResult<()> {
        self.statistics.agent_cycles += 1;
        let _span = perf_span!("agent_cycle", cycle = self.statistics.agent_cycles as u64).entered();

        let new_events = self.stock_events.generate(&self.inventory, now);
        self.statistics.record_events(&new_events);

        let mut issued: i64 = 0;
        for event in new_events.iter().filter(|e| e.is_low_stock()) {
            let pair = (event.facility_id.clone(), event.medication_id.clone());
            if self.restocked.contains(&pair) {
                continue;
            }

            let on_hand: u64 = self
                .inventory
                .iter()
                .filter(|r| r.facility_id == pair.0 && r.medication_id == pair.1)
                .map(|r| u64::from(r.quantity))
                .sum();
            if on_hand > u64::from(event.snapshot.reorder_point) {
                continue;
            }

            let Some(record) = self
                .inventory
                .iter_mut()
                .find(|r| r.facility_id == pair.0 && r.medication_id == pair.1 && !r.is_expired_at(now))
            else {
                debug!(facility = %pair.0, medication = %pair.1, "No unexpired record to restock");
                continue;
            };

            let at = now + Duration::minutes(RESTOCK_SPACING_MINUTES * issued);
            issued += 1;
            let units = event.snapshot.reorder_point.saturating_mul(2);
            let movement = self.recorder.apply(record, MovementKind::Restock, units, at, MovementSource::Simulation);

            sim_event!(
                info,
                "Restocked low inventory",
                facility = pair.0.as_str(),
                medication = pair.1.as_str(),
                units = units,
                on_hand = on_hand,
            );

            self.statistics.restocks += 1;
            self.statistics.record_movement(&movement);
            self.movements.push(movement);
            self.restocked.insert(pair);
        }

        self.events.extend(new_events);

        let input = DetectionInput {
            inventory: &self.inventory,
            movements: &self.movements,
            events: &self.events,
            catalog: &self.catalog,
        };
        let found = self.pipeline.detect(&input, now);

        for anomaly in &found {
            warn!(
                anomaly_id = %anomaly.id,
                anomaly_type = %anomaly.anomaly_type,
                severity = %anomaly.severity,
                "{}",
                anomaly.detail
            );
        }
        self.statistics.record_anomalies(&found);
        self.anomalies.extend(found);

        Ok(())
    }

    fn on_geographic_injection(&mut self, now: DateTime<Utc>, description: &str) -> SimulationResult<()> {
        let injector = ScenarioInjector::new(&self.catalog, self.config.thresholds.geographic_impossible_km);
        let movements = injector.geographic(&mut self.rng, &mut self.recorder, &self.inventory, now)?;
        self.record_injection(description, movements);
        Ok(())
    }

    fn on_impossible_quantity_injection(&mut self, now: DateTime<Utc>, description: &str) -> SimulationResult<()> {
        let injector = ScenarioInjector::new(&self.catalog, self.config.thresholds.geographic_impossible_km);
        let movements = injector.impossible_quantity(&mut self.rng, &mut self.recorder, &self.inventory, now)?;
        self.record_injection(description, movements);
        Ok(())
    }

    fn record_injection(&mut self, description: &str, movements: Vec<MovementRecord>) {
        if movements.is_empty() {
            self.statistics.skipped_injections += 1;
            sim_event!(warn, "Scenario injection skipped", description = description);
            return;
        }

        self.statistics.injections += 1;
        sim_event!(info, "Scenario injected", description = description, movements = movements.len() as u64);
        for movement in &movements {
            self.statistics.record_movement(movement);
        }
        self.movements.extend(movements);
    }
}

/// Build, initialize and run an engine in one go
pub fn simulate(
    config: SimulationConfig,
    catalog: Catalog,
    inventory: Vec<InventoryRecord>,
) -> SimulationResult<SimulationOutcome> {
    let mut engine = SimulationEngine::seeded(config, catalog, inventory)?;
    engine.initialize()?;
    engine.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFile;

    fn engine(days: usize, seed: u64) -> SimulationEngine {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let config = SimulationConfig { days, seed: Some(seed), ..Default::default() };
        SimulationEngine::seeded(config, catalog, inventory).unwrap()
    }

    #[test]
    fn test_phase_transitions() {
        let mut engine = engine(1, 1);
        assert_eq!(engine.phase(), EnginePhase::Uninitialized);
        assert!(matches!(engine.run(), Err(SimulationError::InvalidPhase { .. })));

        engine.initialize().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Running);
        assert!(matches!(engine.initialize(), Err(SimulationError::InvalidPhase { .. })));

        engine.run().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Ended);
        assert!(matches!(engine.run(), Err(SimulationError::InvalidPhase { .. })));
    }

    #[test]
    fn test_initialize_schedules_horizon() {
        let mut engine = engine(4, 1);
        engine.initialize().unwrap();
        // 96 ticks, 24 agent cycles, 3 injections
        assert_eq!(engine.pending_events(), 96 + 24 + 3);
    }

    #[test]
    fn test_short_horizon_drops_late_injections() {
        let mut engine = engine(1, 1);
        engine.initialize().unwrap();
        assert_eq!(engine.pending_events(), 24 + 6 + 1);
    }

    #[test]
    fn test_initial_receipts_are_backdated_and_do_not_change_stock() {
        let mut engine = engine(1, 5);
        let before: Vec<u32> = engine.inventory().iter().map(|r| r.quantity).collect();
        engine.initialize().unwrap();

        let after: Vec<u32> = engine.inventory().iter().map(|r| r.quantity).collect();
        assert_eq!(before, after);

        let start = engine.clock.start();
        let seeded = engine.movements().len() + engine.statistics().omitted_receipts;
        assert_eq!(seeded, engine.inventory().iter().filter(|r| r.in_stock()).count());
        for movement in engine.movements() {
            assert_eq!(movement.source, MovementSource::InitialSeed);
            assert_eq!(movement.kind, MovementKind::Restock);
            assert!(movement.timestamp < start);
            assert!(movement.timestamp >= start - Duration::days(7));
            assert_eq!(movement.quantity_change, i64::from(movement.quantity_after));
        }
    }

    #[test]
    fn test_no_receipts_when_every_receipt_is_omitted() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let config = SimulationConfig { days: 1, seed: Some(2), ghost_stock_probability: 1.0, ..Default::default() };
        let mut engine = SimulationEngine::seeded(config, catalog, inventory).unwrap();
        engine.initialize().unwrap();
        assert!(engine.movements().is_empty());
        assert_eq!(engine.statistics().omitted_receipts, engine.inventory().len());
    }

    #[test]
    fn test_first_cycle_restocks_low_record() {
        let mut engine = engine(1, 11);
        engine.initialize().unwrap();
        let outcome = engine.run().unwrap();

        let restock = outcome
            .movements_from(MovementSource::Simulation)
            .find(|m| m.kind == MovementKind::Restock)
            .expect("a low-stock restock");
        assert_eq!(restock.timestamp, outcome.start);
        assert!(outcome.events.iter().any(|e| e.is_low_stock()));
        assert!(outcome.statistics.restocks >= 1);
    }

    #[test]
    fn test_restocks_in_one_cycle_are_spaced() {
        let mut engine = engine(1, 11);
        engine.initialize().unwrap();
        let outcome = engine.run().unwrap();

        let mut first_cycle: Vec<_> = outcome
            .movements_from(MovementSource::Simulation)
            .filter(|m| m.kind == MovementKind::Restock && m.timestamp < outcome.start + Duration::hours(4))
            .map(|m| m.timestamp)
            .collect();
        first_cycle.sort();
        for (n, at) in first_cycle.iter().enumerate() {
            assert_eq!(*at, outcome.start + Duration::minutes(30 * n as i64));
        }
    }

    #[test]
    fn test_unknown_medication_skips_only_that_record() {
        let (catalog, mut inventory) = CatalogFile::demo().into_parts().unwrap();
        inventory[0].medication_id = MedicationId::new("MED_404");
        let config = SimulationConfig { days: 1, seed: Some(8), ..Default::default() };
        let outcome = simulate(config, catalog, inventory).unwrap();

        // Ten opening hours, one miss each
        assert_eq!(outcome.statistics.skipped_units_of_work, 10);
        assert!(outcome.movements.iter().any(|m| m.kind == MovementKind::Dispense));
        assert!(!outcome
            .movements
            .iter()
            .any(|m| m.kind == MovementKind::Dispense && m.medication_id.as_str() == "MED_404"));
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = |seed| {
            let mut engine = engine(2, seed);
            engine.initialize().unwrap();
            engine.run().unwrap()
        };
        let first = run(42);
        let second = run(42);
        assert_eq!(first.movements, second.movements);
        assert_eq!(first.inventory, second.inventory);
        assert_eq!(first.anomalies, second.anomalies);
    }

    #[test]
    fn test_scenarios_can_be_disabled() {
        let (catalog, inventory) = CatalogFile::demo().into_parts().unwrap();
        let config = SimulationConfig { days: 4, seed: Some(3), inject_scenarios: false, ..Default::default() };
        let outcome = simulate(config, catalog, inventory).unwrap();

        assert_eq!(outcome.movements_from(MovementSource::ScenarioInjection).count(), 0);
        assert_eq!(outcome.statistics.injections, 0);
    }
}
