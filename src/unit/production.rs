//! Production units - per-tick resource transformation
//!
//! Each tick a running unit with an active module:
//! 1. Re-derives the module's consumption from its production rates
//! 2. Checks storage covers every input for this tick (skips the whole
//!    tick if not, so nothing is partially consumed)
//! 3. Consumes the inputs
//! 4. Produces: extraction units draw from the resource field at their
//!    cell, every other kind adds its production rates straight to storage

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{EconomyError, Result};
use crate::core::types::Vec2;
use crate::planet::ResourceField;
use crate::resources::ResourceKind;
use crate::unit::module::Module;
use crate::unit::profile::{CostTable, UnitKind, UnitProfile};
use crate::unit::storage::Storage;

/// What happened to a unit on one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Stopped, or no active module
    Idle,
    /// Inputs short for this tick; storage untouched
    Starved {
        kind: ResourceKind,
        required: f32,
        available: f32,
    },
    /// Inputs consumed and outputs stored
    Produced { output: Vec<(ResourceKind, f32)> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionUnit {
    kind: UnitKind,
    position: Vec2,
    running: bool,
    storage: Storage,
    modules: Vec<Module>,
    cost_table: CostTable,
    extraction_rates: BTreeMap<ResourceKind, f32>,
}

impl ProductionUnit {
    /// Build a stopped unit from its profile. The first built module is
    /// switched on so the unit works as soon as it is started.
    pub fn from_profile(profile: &UnitProfile, position: Vec2) -> Self {
        let mut modules: Vec<Module> = profile.modules.iter().map(Module::from_spec).collect();
        if let Some(first) = modules.iter_mut().find(|m| m.is_built()) {
            first.set_active(true);
        }

        Self {
            kind: profile.kind,
            position,
            running: false,
            storage: Storage::from_amounts(&profile.starting_storage),
            modules,
            cost_table: profile.cost_table.clone(),
            extraction_rates: profile.extraction_rates.iter().copied().collect(),
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    pub fn cost_table(&self) -> &CostTable {
        &self.cost_table
    }

    pub fn active_index(&self) -> Option<usize> {
        self.modules.iter().position(|m| m.is_active())
    }

    pub fn active_module(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.is_active())
    }

    pub fn start(&mut self) {
        self.running = true;
        tracing::debug!(unit = %self.kind, "unit started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        tracing::debug!(unit = %self.kind, "unit stopped");
    }

    fn check_cost(&self, cost: &[(ResourceKind, f32)]) -> Result<()> {
        match self.storage.shortfall(cost) {
            Some((kind, required, available)) => Err(EconomyError::InsufficientResources {
                kind,
                required,
                available,
            }),
            None => Ok(()),
        }
    }

    /// Whether `index` is a locked module whose build cost is covered
    pub fn can_build(&self, index: usize) -> bool {
        match self.modules.get(index) {
            Some(module) if !module.is_built() => module
                .upgrade_cost(1)
                .map(|cost| self.storage.has_all(cost))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Whether `index` is a built module below max level whose next cost
    /// is covered
    pub fn can_upgrade(&self, index: usize, config: &SimulationConfig) -> bool {
        match self.modules.get(index) {
            Some(module) if module.is_built() && module.level() < config.max_module_level => module
                .upgrade_cost(module.level() + 1)
                .map(|cost| self.storage.has_all(cost))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Pay the level-1 cost and unlock a module
    pub fn build_module(&mut self, index: usize) -> Result<()> {
        let module = self.modules.get(index).ok_or(EconomyError::UnknownModule(index))?;
        if module.is_built() {
            return Err(EconomyError::ModuleAlreadyBuilt(index));
        }
        let cost = module
            .upgrade_cost(1)
            .ok_or(EconomyError::NoUpgradeCost { index, level: 1 })?
            .to_vec();

        self.check_cost(&cost)?;
        self.storage.consume_all(&cost);
        let module = &mut self.modules[index];
        module.mark_built();

        tracing::info!(unit = %self.kind, module = module.name(), "module built");
        Ok(())
    }

    /// Pay the next level's cost and level the module up; returns the new level
    pub fn upgrade_module(&mut self, index: usize, config: &SimulationConfig) -> Result<u8> {
        let module = self.modules.get(index).ok_or(EconomyError::UnknownModule(index))?;
        if !module.is_built() {
            return Err(EconomyError::ModuleNotBuilt(index));
        }
        let level = module.level();
        if level >= config.max_module_level {
            return Err(EconomyError::MaxLevelReached { index, level });
        }
        let cost = module
            .upgrade_cost(level + 1)
            .ok_or(EconomyError::NoUpgradeCost { index, level: level + 1 })?
            .to_vec();

        self.check_cost(&cost)?;
        self.storage.consume_all(&cost);
        let module = &mut self.modules[index];
        module.apply_level(level + 1, config);
        module.derive_consumption(&self.cost_table, config);

        tracing::info!(
            unit = %self.kind,
            module = module.name(),
            level = module.level(),
            "module upgraded"
        );
        Ok(level + 1)
    }

    /// Flip a module on or off; returns whether it is now active.
    ///
    /// Switching on turns every other module off first. Each module turned
    /// off pays the switch penalty. The unit runs iff a module is active.
    pub fn toggle_module(&mut self, index: usize, config: &SimulationConfig) -> Result<bool> {
        let module = self.modules.get(index).ok_or(EconomyError::UnknownModule(index))?;
        if !module.is_built() {
            return Err(EconomyError::ModuleNotBuilt(index));
        }

        let now_active = if module.is_active() {
            self.modules[index].switch_off(config.switch_penalty);
            false
        } else {
            for other in self.modules.iter_mut().filter(|m| m.is_active()) {
                other.switch_off(config.switch_penalty);
            }
            self.modules[index].set_active(true);
            true
        };

        self.running = self.modules.iter().any(|m| m.is_active());

        tracing::info!(
            unit = %self.kind,
            module = self.modules[index].name(),
            active = now_active,
            "module toggled"
        );
        Ok(now_active)
    }

    /// Set one of the discrete production steps on a module; returns the
    /// resulting rate
    pub fn set_production_step(
        &mut self,
        index: usize,
        kind: ResourceKind,
        step: u8,
        config: &SimulationConfig,
    ) -> Result<f32> {
        if step > config.rate_steps {
            return Err(EconomyError::InvalidRateStep { step, max: config.rate_steps });
        }
        let module = self.modules.get_mut(index).ok_or(EconomyError::UnknownModule(index))?;
        if !module.is_built() {
            return Err(EconomyError::ModuleNotBuilt(index));
        }
        let rate = module.step_rate(kind, step, config.rate_steps);
        if !module.set_production_rate(kind, rate) {
            return Err(EconomyError::RateNotControllable(kind));
        }
        module.derive_consumption(&self.cost_table, config);
        Ok(module.production_rate(kind))
    }

    /// Inputs the unit needs to get through one day with the reserve margin
    /// applied. Empty when stopped or without an active module.
    pub fn daily_need(&self, config: &SimulationConfig) -> BTreeMap<ResourceKind, f32> {
        if !self.running {
            return BTreeMap::new();
        }
        let Some(module) = self.active_module() else {
            return BTreeMap::new();
        };
        let scale = (config.day_length() as f32) * config.reserve_multiplier;
        module
            .projected_consumption(&self.cost_table, config)
            .into_iter()
            .map(|(kind, rate)| (kind, rate * scale))
            .collect()
    }

    /// Run one tick of `dt` seconds
    pub fn update(
        &mut self,
        dt: f32,
        field: &mut ResourceField,
        config: &SimulationConfig,
    ) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        let Some(index) = self.active_index() else {
            return TickOutcome::Idle;
        };

        let module = &mut self.modules[index];
        module.derive_consumption(&self.cost_table, config);

        let inputs: Vec<(ResourceKind, f32)> = module
            .consumption_rates()
            .iter()
            .map(|(kind, rate)| (*kind, rate * dt))
            .collect();

        if let Some((kind, required, available)) = self.storage.shortfall(&inputs) {
            tracing::debug!(unit = %self.kind, %kind, required, available, "unit starved");
            return TickOutcome::Starved { kind, required, available };
        }
        self.storage.consume_all(&inputs);

        let output = if self.kind.extracts() {
            self.extract(index, dt, field, config)
        } else {
            self.produce(index, dt)
        };

        TickOutcome::Produced { output }
    }

    fn produce(&mut self, index: usize, dt: f32) -> Vec<(ResourceKind, f32)> {
        let output: Vec<(ResourceKind, f32)> = self.modules[index]
            .production_rates()
            .iter()
            .filter(|(_, rate)| **rate > 0.0)
            .map(|(kind, rate)| (*kind, rate * dt))
            .collect();

        for (kind, amount) in &output {
            self.storage.add(*kind, *amount);
        }
        output
    }

    /// Pull from the field at this unit's cell, scaled by base rate,
    /// efficiency, level and local abundance
    fn extract(
        &mut self,
        index: usize,
        dt: f32,
        field: &mut ResourceField,
        config: &SimulationConfig,
    ) -> Vec<(ResourceKind, f32)> {
        let module = &self.modules[index];
        let yield_factor = module.efficiency() * config.level_multiplier(module.level()) * dt;
        let cell = field.cell_of(self.position);

        let mut output = Vec::new();
        for (kind, abundance) in field.resources_at_cell(cell.x, cell.y) {
            if abundance < config.extraction_floor {
                continue;
            }
            let Some(base) = self.extraction_rates.get(&kind).copied() else {
                continue;
            };
            let extracted = base * yield_factor * abundance;
            if extracted <= 0.0 {
                continue;
            }
            field.deplete(cell.x, cell.y, kind, extracted);
            self.storage.add(kind, extracted);
            output.push((kind, extracted));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CellCoord;
    use crate::unit::module::ModuleStat;
    use crate::unit::profile::{ModuleSpec, UnitCatalog};

    fn farm_profile() -> UnitProfile {
        UnitProfile {
            kind: UnitKind::Farming,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(ResourceKind::Food, &[(ResourceKind::Water, 0.5)]),
            starting_storage: vec![(ResourceKind::Water, 1.0), (ResourceKind::Fe, 30.0)],
            modules: vec![
                ModuleSpec::new("Basic", true, 1.0, &[(ResourceKind::Food, 1.0)])
                    .cost(2, &[(ResourceKind::Fe, 10.0)]),
                ModuleSpec::new("Advanced", false, 1.0, &[(ResourceKind::Food, 2.0)])
                    .cost(1, &[(ResourceKind::Fe, 20.0)]),
            ],
        }
    }

    #[test]
    fn test_new_unit_is_stopped_with_basic_active() {
        let unit = ProductionUnit::from_profile(&farm_profile(), Vec2::new(50.0, 50.0));
        assert!(!unit.is_running());
        assert_eq!(unit.active_index(), Some(0));
        assert_eq!(unit.storage().get(ResourceKind::Water), 1.0);
    }

    #[test]
    fn test_stopped_unit_is_idle() {
        let config = SimulationConfig::default();
        let mut field = ResourceField::new(20, 100.0);
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::new(50.0, 50.0));

        assert_eq!(unit.update(1.0, &mut field, &config), TickOutcome::Idle);
        assert_eq!(unit.storage().get(ResourceKind::Water), 1.0);
    }

    #[test]
    fn test_direct_production_until_starved() {
        let config = SimulationConfig::default();
        let mut field = ResourceField::new(20, 100.0);
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::new(50.0, 50.0));
        unit.start();

        // 1.0 water covers two ticks at 0.5 per tick
        for _ in 0..2 {
            assert!(matches!(
                unit.update(1.0, &mut field, &config),
                TickOutcome::Produced { .. }
            ));
        }
        assert_eq!(unit.storage().get(ResourceKind::Food), 2.0);
        assert_eq!(unit.storage().get(ResourceKind::Water), 0.0);

        // Third tick: no water, nothing changes
        let outcome = unit.update(1.0, &mut field, &config);
        assert!(matches!(outcome, TickOutcome::Starved { kind: ResourceKind::Water, .. }));
        assert_eq!(unit.storage().get(ResourceKind::Food), 2.0);
    }

    #[test]
    fn test_extraction_depletes_field() {
        let config = SimulationConfig::default();
        let mut field = ResourceField::new(20, 100.0);
        let cell = CellCoord::new(3, 4);
        field.raise_to(cell, ResourceKind::Fe, 0.5);
        // Below the extraction floor, left alone
        field.raise_to(cell, ResourceKind::Si, 0.05);

        let profile = UnitProfile {
            kind: UnitKind::Extraction,
            extraction_rates: vec![(ResourceKind::Fe, 0.3), (ResourceKind::Si, 0.2)],
            cost_table: CostTable::new(),
            starting_storage: vec![],
            modules: vec![ModuleSpec::new("Drill", true, 0.8, &[(ResourceKind::Fe, 0.3)])],
        };
        let mut unit = ProductionUnit::from_profile(&profile, field.cell_center(3, 4));
        unit.start();
        unit.update(1.0, &mut field, &config);

        // 0.3 * 0.8 * 1.0 * 0.5 * 1.0
        assert!((unit.storage().get(ResourceKind::Fe) - 0.12).abs() < 1e-6);
        assert!((field.abundance(cell, ResourceKind::Fe) - 0.38).abs() < 1e-6);
        assert_eq!(unit.storage().get(ResourceKind::Si), 0.0);
        assert!((field.abundance(cell, ResourceKind::Si) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_extraction_off_grid_yields_nothing() {
        let config = SimulationConfig::default();
        let mut field = ResourceField::new(20, 100.0);
        let catalog = UnitCatalog::with_defaults();
        let profile = catalog.get(UnitKind::Extraction).unwrap();

        let mut unit = ProductionUnit::from_profile(profile, Vec2::new(-500.0, 50.0));
        unit.start();
        let outcome = unit.update(1.0, &mut field, &config);
        assert_eq!(outcome, TickOutcome::Produced { output: vec![] });
    }

    #[test]
    fn test_build_requires_resources() {
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::default());
        unit.storage_mut().consume(ResourceKind::Fe, 15.0);
        assert!(!unit.can_build(1));

        let err = unit.build_module(1).unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientResources {
                kind: ResourceKind::Fe,
                required: 20.0,
                available: 15.0,
            }
        );
        // Refusal deducts nothing
        assert_eq!(unit.storage().get(ResourceKind::Fe), 15.0);
        assert!(!unit.modules()[1].is_built());

        unit.storage_mut().add(ResourceKind::Fe, 5.0);
        assert!(unit.can_build(1));
        unit.build_module(1).unwrap();
        assert!(unit.modules()[1].is_built());
        assert_eq!(unit.storage().get(ResourceKind::Fe), 0.0);

        assert_eq!(unit.build_module(1), Err(EconomyError::ModuleAlreadyBuilt(1)));
        assert_eq!(unit.build_module(7), Err(EconomyError::UnknownModule(7)));
    }

    #[test]
    fn test_upgrade_module() {
        let config = SimulationConfig::default();
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::default());

        assert!(unit.can_upgrade(0, &config));
        assert_eq!(unit.upgrade_module(0, &config), Ok(2));
        assert_eq!(unit.storage().get(ResourceKind::Fe), 20.0);
        assert!((unit.modules()[0].max_rate(ResourceKind::Food) - 1.2).abs() < 1e-6);

        // No level 3 cost defined
        assert_eq!(
            unit.upgrade_module(0, &config),
            Err(EconomyError::NoUpgradeCost { index: 0, level: 3 })
        );
        // Locked module
        assert_eq!(unit.upgrade_module(1, &config), Err(EconomyError::ModuleNotBuilt(1)));
    }

    #[test]
    fn test_toggle_keeps_single_active_module() {
        let config = SimulationConfig::default();
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::default());
        unit.build_module(1).unwrap();

        // Switching to module 1 turns module 0 off with the penalty
        assert_eq!(unit.toggle_module(1, &config), Ok(true));
        assert_eq!(unit.active_index(), Some(1));
        assert!(unit.is_running());
        assert!((unit.modules()[0].efficiency() - 0.9).abs() < 1e-6);
        assert_eq!(unit.modules()[1].efficiency(), 1.0);

        // Turning module 1 off leaves nothing active and stops the unit
        assert_eq!(unit.toggle_module(1, &config), Ok(false));
        assert_eq!(unit.active_index(), None);
        assert!(!unit.is_running());
        assert!((unit.modules()[1].efficiency() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_set_production_step() {
        let config = SimulationConfig::default();
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::default());

        assert_eq!(unit.set_production_step(0, ResourceKind::Food, 2, &config), Ok(0.5));
        assert_eq!(unit.modules()[0].production_step(ResourceKind::Food, 4), Some(2));

        assert_eq!(
            unit.set_production_step(0, ResourceKind::Food, 5, &config),
            Err(EconomyError::InvalidRateStep { step: 5, max: 4 })
        );
        assert_eq!(
            unit.set_production_step(0, ResourceKind::Fe, 1, &config),
            Err(EconomyError::RateNotControllable(ResourceKind::Fe))
        );
    }

    #[test]
    fn test_commands_refresh_consumption() {
        let config = SimulationConfig::default();
        let mut profile = farm_profile();
        profile.modules[0] = profile.modules[0].clone().enhance(2, ModuleStat::Upkeep, 0.8);
        let mut unit = ProductionUnit::from_profile(&profile, Vec2::default());
        assert_eq!(unit.modules()[0].consumption_rate(ResourceKind::Water), 0.0);

        // Half of 1.0 food at 0.5 water each
        unit.set_production_step(0, ResourceKind::Food, 2, &config).unwrap();
        let water = unit.modules()[0].consumption_rate(ResourceKind::Water);
        assert!((water - 0.25).abs() < 1e-6);

        unit.set_production_step(0, ResourceKind::Food, 4, &config).unwrap();
        let water = unit.modules()[0].consumption_rate(ResourceKind::Water);
        assert!((water - 0.5).abs() < 1e-6);

        // Level 2: 1.2 food * 0.5 water * 0.8 upkeep / 1.2 level multiplier
        unit.upgrade_module(0, &config).unwrap();
        let module = &unit.modules()[0];
        assert!((module.production_rate(ResourceKind::Food) - 1.2).abs() < 1e-6);
        assert!((module.consumption_rate(ResourceKind::Water) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_daily_need() {
        let config = SimulationConfig {
            ticks_per_day: 20,
            ..SimulationConfig::default()
        };
        let mut unit = ProductionUnit::from_profile(&farm_profile(), Vec2::default());
        assert!(unit.daily_need(&config).is_empty());

        unit.start();
        // 1.0 food/tick * 0.5 water * 20 ticks * 1.5
        let need = unit.daily_need(&config);
        assert!((need[&ResourceKind::Water] - 15.0).abs() < 1e-5);
    }
}
