//! Simulation facade - frame driver, commands and queries
//!
//! The presentation layer talks to the economy only through this type:
//! it calls `advance` once per frame, issues commands addressed by
//! (sect, unit, module) index, and reads snapshots. Update order within a
//! tick is scheduler, then sects in founding order, then their units in
//! roster order, each unit depleting the field as it extracts.

pub mod snapshot;

pub use snapshot::{
    CellSnapshot, ClockSnapshot, ColonySnapshot, ModuleSnapshot, SectSnapshot, UnitSnapshot,
    WorldSnapshot,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{ConfigError, EconomyError, Result};
use crate::core::scheduler::TimeScheduler;
use crate::core::types::{Day, Vec2};
use crate::planet::{ActiveArea, Planet};
use crate::resources::{ResourceKind, FIELD_KINDS};
use crate::sect::{Collection, Colony};
use crate::unit::{ProductionUnit, UnitCatalog};

/// What one `advance` call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceReport {
    /// Ticks processed during this call
    pub ticks: u64,
    /// Day after the last processed tick
    pub day: Day,
    /// Unit-ticks skipped for lack of inputs
    pub starved: usize,
    /// Daily collections made, by sect index
    pub collections: Vec<(usize, Collection)>,
}

#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    catalog: UnitCatalog,
    scheduler: TimeScheduler,
    planet: Planet,
    colony: Colony,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Validate `config` and `catalog`, then start a game from `seed`
    pub fn new(
        config: SimulationConfig,
        catalog: UnitCatalog,
        seed: u64,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        catalog.validate()?;
        let scheduler = TimeScheduler::from_config(&config)?;
        Ok(Self::assemble(config, catalog, scheduler, seed))
    }

    /// Built-in config and unit catalog
    pub fn with_defaults(seed: u64) -> Self {
        Self::assemble(
            SimulationConfig::default(),
            UnitCatalog::with_defaults(),
            TimeScheduler::default(),
            seed,
        )
    }

    fn assemble(
        config: SimulationConfig,
        catalog: UnitCatalog,
        scheduler: TimeScheduler,
        seed: u64,
    ) -> Self {
        let mut sim = Self {
            scheduler,
            planet: Planet::new(config.generation.clone()),
            colony: Colony::new(config.generation.cell_size / 2.0),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
            catalog,
        };
        sim.new_game(seed);
        sim
    }

    /// Throw away the current game and start over: fresh clock, fresh
    /// field, one colony with one sect at a prepared start location
    pub fn new_game(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.scheduler.reset();

        let sites = self.planet.generate(&mut self.rng);
        let start = self.planet.random_start_position(&mut self.rng);
        self.planet.prepare_start_location(start);

        self.colony = Colony::new(self.config.generation.cell_size / 2.0);
        self.colony.found_sect(start, &self.catalog);

        tracing::info!(
            seed,
            sites = sites.len(),
            x = start.x,
            y = start.y,
            "new game started"
        );
    }

    /// Feed one frame's elapsed wall time; runs every tick it yields
    pub fn advance(&mut self, delta: f64) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        let tick_dt = self.scheduler.tick_duration() as f32;

        for tick in self.scheduler.advance(delta) {
            let day = self.scheduler.day_of_tick(tick);
            let results = self
                .colony
                .update(tick_dt, day, self.planet.field_mut(), &self.config);

            for (index, result) in results.into_iter().enumerate() {
                report.starved += result.starved;
                if let Some(collection) = result.collection {
                    report.collections.push((index, collection));
                }
            }
            report.ticks += 1;
        }

        report.day = self.scheduler.current_day();
        report
    }

    // === Clock commands ===

    pub fn pause(&mut self) {
        self.scheduler.pause();
        tracing::info!(tick = self.scheduler.current_tick(), "paused");
    }

    pub fn resume(&mut self) {
        self.scheduler.resume();
        tracing::info!(tick = self.scheduler.current_tick(), "resumed");
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.scheduler.set_time_scale(scale);
    }

    // === Unit commands ===

    pub fn start_unit(&mut self, sect: usize, unit: usize) -> Result<()> {
        let result = locate(&mut self.colony, sect, unit).map(|u| u.start());
        refused(result, "start unit")
    }

    pub fn stop_unit(&mut self, sect: usize, unit: usize) -> Result<()> {
        let result = locate(&mut self.colony, sect, unit).map(|u| u.stop());
        refused(result, "stop unit")
    }

    pub fn build_module(&mut self, sect: usize, unit: usize, module: usize) -> Result<()> {
        let result = locate(&mut self.colony, sect, unit).and_then(|u| u.build_module(module));
        refused(result, "build module")
    }

    pub fn upgrade_module(&mut self, sect: usize, unit: usize, module: usize) -> Result<u8> {
        let config = &self.config;
        let result =
            locate(&mut self.colony, sect, unit).and_then(|u| u.upgrade_module(module, config));
        refused(result, "upgrade module")
    }

    pub fn toggle_module(&mut self, sect: usize, unit: usize, module: usize) -> Result<bool> {
        let config = &self.config;
        let result =
            locate(&mut self.colony, sect, unit).and_then(|u| u.toggle_module(module, config));
        refused(result, "toggle module")
    }

    /// Set a module's rate for `kind` to one of the discrete steps
    pub fn set_production_step(
        &mut self,
        sect: usize,
        unit: usize,
        module: usize,
        kind: ResourceKind,
        step: u8,
    ) -> Result<f32> {
        let config = &self.config;
        let result = locate(&mut self.colony, sect, unit)
            .and_then(|u| u.set_production_step(module, kind, step, config));
        refused(result, "set production rate")
    }

    // === Queries ===

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn scheduler(&self) -> &TimeScheduler {
        &self.scheduler
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    pub fn colony(&self) -> &Colony {
        &self.colony
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn current_day(&self) -> Day {
        self.scheduler.current_day()
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    pub fn unit(&self, sect: usize, unit: usize) -> Option<&ProductionUnit> {
        self.colony.sect(sect).and_then(|s| s.unit(unit))
    }

    pub fn clock(&self) -> ClockSnapshot {
        ClockSnapshot::capture(&self.scheduler)
    }

    pub fn sect_snapshot(&self, sect: usize) -> Option<SectSnapshot> {
        self.colony
            .sect(sect)
            .map(|s| SectSnapshot::capture(s, &self.config))
    }

    pub fn unit_snapshot(&self, sect: usize, unit: usize) -> Option<UnitSnapshot> {
        self.unit(sect, unit)
            .map(|u| UnitSnapshot::capture(u, &self.config))
    }

    /// Region of the planet the colony occupies
    pub fn active_area(&self) -> ActiveArea {
        self.planet.active_area(std::slice::from_ref(&self.colony))
    }

    /// The tile under a world position
    pub fn cell_at(&self, world: Vec2) -> CellSnapshot {
        CellSnapshot::capture(self.planet.field(), world)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let field = self.planet.field();
        WorldSnapshot {
            seed: self.seed,
            clock: self.clock(),
            active_area: self.active_area(),
            colony: ColonySnapshot::capture(&self.colony, &self.config),
            field_totals: FIELD_KINDS.iter().map(|k| (*k, field.total(*k))).collect(),
        }
    }
}

fn locate(colony: &mut Colony, sect: usize, unit: usize) -> Result<&mut ProductionUnit> {
    colony
        .sect_mut(sect)
        .ok_or(EconomyError::UnknownSect(sect))?
        .unit_mut(unit)
        .ok_or(EconomyError::UnknownUnit(unit))
}

/// Log a refused command; the result passes through unchanged
fn refused<T>(result: Result<T>, action: &str) -> Result<T> {
    if let Err(err) = &result {
        tracing::warn!(action, %err, "command refused");
    }
    result
}
