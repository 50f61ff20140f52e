//! Sect - owns a roster of units and collects their surplus once a day
//!
//! Units keep a rolling reserve sized to their own next-day consumption
//! (with the configured safety margin). Everything above that flows up into
//! sect storage on the first tick of each new day.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{Day, Vec2};
use crate::planet::ResourceField;
use crate::resources::ResourceKind;
use crate::unit::{ProductionUnit, Storage, TickOutcome, UnitCatalog, UnitKind, UnitProfile};

/// Result of one daily collection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub day: Day,
    /// Total moved into sect storage per resource, sorted by kind
    pub collected: Vec<(ResourceKind, f32)>,
}

impl Collection {
    pub fn total(&self, kind: ResourceKind) -> f32 {
        self.collected
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

/// Per-tick summary for a sect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectTick {
    pub produced: usize,
    pub starved: usize,
    pub collection: Option<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sect {
    position: Vec2,
    units: Vec<ProductionUnit>,
    core: usize,
    storage: Storage,
    last_collection_day: Option<Day>,
}

impl Sect {
    /// Found a sect with the full unit roster. The extraction unit is the
    /// core and starts running; the rest start stopped.
    pub fn found(position: Vec2, catalog: &UnitCatalog) -> Self {
        let units: Vec<ProductionUnit> = UnitKind::SECT_ROSTER
            .iter()
            .map(|kind| {
                let profile = catalog
                    .get(*kind)
                    .cloned()
                    .unwrap_or_else(|| UnitProfile::bare(*kind));
                ProductionUnit::from_profile(&profile, position)
            })
            .collect();

        let core = units
            .iter()
            .position(|u| u.kind() == UnitKind::Extraction)
            .unwrap_or(0);

        let mut sect = Self::with_units(position, units, core);
        if let Some(unit) = sect.units.get_mut(core) {
            unit.start();
        }

        tracing::info!(x = position.x, y = position.y, units = sect.units.len(), "sect founded");
        sect
    }

    /// Sect over an explicit set of units, all left as given
    pub fn with_units(position: Vec2, units: Vec<ProductionUnit>, core: usize) -> Self {
        Self {
            position,
            units,
            core,
            storage: Storage::new(),
            last_collection_day: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn units(&self) -> &[ProductionUnit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Option<&ProductionUnit> {
        self.units.get(index)
    }

    pub fn unit_mut(&mut self, index: usize) -> Option<&mut ProductionUnit> {
        self.units.get_mut(index)
    }

    pub fn core_index(&self) -> usize {
        self.core
    }

    pub fn core(&self) -> Option<&ProductionUnit> {
        self.units.get(self.core)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn last_collection_day(&self) -> Option<Day> {
        self.last_collection_day
    }

    /// Whether `day` has not been collected yet
    pub fn is_due(&self, day: Day) -> bool {
        self.last_collection_day.map_or(true, |last| day > last)
    }

    /// Advance every unit by one tick, then collect if `day` is new
    pub fn update(
        &mut self,
        dt: f32,
        day: Day,
        field: &mut ResourceField,
        config: &SimulationConfig,
    ) -> SectTick {
        let mut tick = SectTick::default();

        for unit in &mut self.units {
            match unit.update(dt, field, config) {
                TickOutcome::Produced { .. } => tick.produced += 1,
                TickOutcome::Starved { .. } => tick.starved += 1,
                TickOutcome::Idle => {}
            }
        }

        if self.is_due(day) {
            tick.collection = Some(self.collect(day, config));
        }

        tick
    }

    /// Discharge every unit's surplus above its daily need into sect
    /// storage and mark `day` as collected
    pub fn collect(&mut self, day: Day, config: &SimulationConfig) -> Collection {
        let mut totals: std::collections::BTreeMap<ResourceKind, f32> = Default::default();

        for unit in &mut self.units {
            let need = unit.daily_need(config);
            for (kind, _) in unit.storage().positive() {
                let keep = need.get(&kind).copied().unwrap_or(0.0);
                let excess = unit.storage_mut().take_above(kind, keep);
                if excess > 0.0 {
                    self.storage.add(kind, excess);
                    *totals.entry(kind).or_insert(0.0) += excess;
                }
            }
        }

        self.last_collection_day = Some(day);

        let collection = Collection {
            day,
            collected: totals.into_iter().collect(),
        };
        tracing::debug!(day, kinds = collection.collected.len(), "sect collection");
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{CostTable, ModuleSpec};

    fn energy_eater() -> UnitProfile {
        UnitProfile {
            kind: UnitKind::Research,
            extraction_rates: vec![],
            cost_table: CostTable::new()
                .with(ResourceKind::Science, &[(ResourceKind::Energy, 5.0)]),
            starting_storage: vec![(ResourceKind::Energy, 1000.0)],
            modules: vec![ModuleSpec::new("Lab", true, 1.0, &[(ResourceKind::Science, 1.0)])],
        }
    }

    #[test]
    fn test_found_sect_roster() {
        let sect = Sect::found(Vec2::new(550.0, 550.0), &UnitCatalog::with_defaults());

        let kinds: Vec<UnitKind> = sect.units().iter().map(|u| u.kind()).collect();
        assert_eq!(kinds, UnitKind::SECT_ROSTER.to_vec());

        let core = sect.core().unwrap();
        assert_eq!(core.kind(), UnitKind::Extraction);
        assert!(core.is_running());
        assert_eq!(sect.units().iter().filter(|u| u.is_running()).count(), 1);
        assert!(core.storage().get(ResourceKind::Energy) > 0.0);

        for unit in sect.units() {
            assert_eq!(unit.position(), sect.position());
        }
    }

    #[test]
    fn test_collection_keeps_reserve() {
        let config = SimulationConfig {
            ticks_per_day: 20,
            ..SimulationConfig::default()
        };
        let mut unit = ProductionUnit::from_profile(&energy_eater(), Vec2::default());
        unit.start();
        unit.storage_mut().add(ResourceKind::Science, 3.0);

        let mut sect = Sect::with_units(Vec2::default(), vec![unit], 0);
        let collection = sect.collect(0, &config);

        // Need = 5 * 20 * 1.0 * 1.5 = 150
        assert!((sect.units()[0].storage().get(ResourceKind::Energy) - 150.0).abs() < 1e-3);
        assert!((sect.storage().get(ResourceKind::Energy) - 850.0).abs() < 1e-3);
        // Nothing consumes science, so all of it moves up
        assert_eq!(sect.units()[0].storage().get(ResourceKind::Science), 0.0);
        assert_eq!(collection.total(ResourceKind::Science), 3.0);
        assert_eq!(sect.last_collection_day(), Some(0));
    }

    #[test]
    fn test_stopped_unit_keeps_no_reserve() {
        let config = SimulationConfig::default();
        let unit = ProductionUnit::from_profile(&energy_eater(), Vec2::default());

        let mut sect = Sect::with_units(Vec2::default(), vec![unit], 0);
        sect.collect(0, &config);

        assert_eq!(sect.units()[0].storage().get(ResourceKind::Energy), 0.0);
        assert_eq!(sect.storage().get(ResourceKind::Energy), 1000.0);
    }

    #[test]
    fn test_collects_once_per_day() {
        let config = SimulationConfig {
            ticks_per_day: 20,
            ..SimulationConfig::default()
        };
        let mut field = ResourceField::new(20, 100.0);
        let mut unit = ProductionUnit::from_profile(&energy_eater(), Vec2::default());
        unit.start();
        let mut sect = Sect::with_units(Vec2::default(), vec![unit], 0);

        let mut collections = 0;
        for tick in 0..60u64 {
            let day = tick / config.ticks_per_day;
            if sect.update(1.0, day, &mut field, &config).collection.is_some() {
                collections += 1;
            }
        }

        // Days 0, 1 and 2
        assert_eq!(collections, 3);
        assert_eq!(sect.last_collection_day(), Some(2));
        assert!(!sect.is_due(2));
        assert!(sect.is_due(3));
    }
}
