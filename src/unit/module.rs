//! Modules - leveled production profiles owned by a unit
//!
//! A module is built once, upgraded through levels 1..=max, and toggled on
//! and off. Its production rates are set by the player in discrete steps up
//! to a level-scaled ceiling; its consumption is never set directly but
//! derived from production through the unit's cost table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::resources::ResourceKind;
use crate::unit::profile::{CostTable, ModuleSpec};

/// Stats a level enhancement can multiply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleStat {
    /// Module efficiency (extraction yield)
    Efficiency,
    /// Input consumption per unit of output
    Upkeep,
}

impl ModuleStat {
    pub fn name(&self) -> &'static str {
        match self {
            ModuleStat::Efficiency => "Efficiency",
            ModuleStat::Upkeep => "Upkeep",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "efficiency" => Some(ModuleStat::Efficiency),
            "upkeep" => Some(ModuleStat::Upkeep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    name: String,
    level: u8,
    built: bool,
    active: bool,
    efficiency: f32,
    /// Multiplier on derived consumption, lowered by upkeep enhancements
    upkeep_factor: f32,
    /// Ceilings at level 1
    base_max_rates: BTreeMap<ResourceKind, f32>,
    max_rates: BTreeMap<ResourceKind, f32>,
    production_rates: BTreeMap<ResourceKind, f32>,
    consumption_rates: BTreeMap<ResourceKind, f32>,
    upgrade_costs: BTreeMap<u8, Vec<(ResourceKind, f32)>>,
    enhancements: BTreeMap<u8, Vec<(ModuleStat, f32)>>,
}

impl Module {
    /// Fresh level-1 module. Production starts at the full ceiling.
    pub fn from_spec(spec: &ModuleSpec) -> Self {
        let base_max_rates: BTreeMap<ResourceKind, f32> = spec.max_rates.iter().copied().collect();
        Self {
            name: spec.name.clone(),
            level: 1,
            built: spec.built,
            active: false,
            efficiency: spec.efficiency,
            upkeep_factor: 1.0,
            max_rates: base_max_rates.clone(),
            production_rates: base_max_rates.clone(),
            base_max_rates,
            consumption_rates: BTreeMap::new(),
            upgrade_costs: spec.upgrade_costs.clone(),
            enhancements: spec.enhancements.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn efficiency(&self) -> f32 {
        self.efficiency
    }

    pub fn upkeep_factor(&self) -> f32 {
        self.upkeep_factor
    }

    pub fn max_rates(&self) -> &BTreeMap<ResourceKind, f32> {
        &self.max_rates
    }

    pub fn production_rates(&self) -> &BTreeMap<ResourceKind, f32> {
        &self.production_rates
    }

    pub fn consumption_rates(&self) -> &BTreeMap<ResourceKind, f32> {
        &self.consumption_rates
    }

    pub fn max_rate(&self, kind: ResourceKind) -> f32 {
        self.max_rates.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn production_rate(&self, kind: ResourceKind) -> f32 {
        self.production_rates.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn consumption_rate(&self, kind: ResourceKind) -> f32 {
        self.consumption_rates.get(&kind).copied().unwrap_or(0.0)
    }

    /// Cost to reach `level` (level 1 is the build cost)
    pub fn upgrade_cost(&self, level: u8) -> Option<&[(ResourceKind, f32)]> {
        self.upgrade_costs.get(&level).map(|c| c.as_slice())
    }

    pub fn enhancements_at(&self, level: u8) -> &[(ModuleStat, f32)] {
        self.enhancements.get(&level).map(|e| e.as_slice()).unwrap_or(&[])
    }

    /// Level the next build/upgrade would reach, if any
    pub fn next_level(&self, max_level: u8) -> Option<u8> {
        if !self.built {
            Some(1)
        } else if self.level < max_level {
            Some(self.level + 1)
        } else {
            None
        }
    }

    /// Cost of the next build/upgrade step
    pub fn next_upgrade_cost(&self, max_level: u8) -> Option<&[(ResourceKind, f32)]> {
        self.next_level(max_level).and_then(|level| self.upgrade_cost(level))
    }

    pub(crate) fn mark_built(&mut self) {
        self.built = true;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Switch the module off, paying the one-time switchover penalty
    pub(crate) fn switch_off(&mut self, penalty: f32) {
        self.active = false;
        self.efficiency *= penalty;
    }

    /// Move to `level`, rescaling ceilings and applying that level's
    /// enhancements. Current rates keep their share of the ceiling.
    pub(crate) fn apply_level(&mut self, level: u8, config: &SimulationConfig) {
        self.level = level.clamp(1, config.max_module_level);
        let multiplier = config.level_multiplier(self.level);

        for (kind, base) in &self.base_max_rates {
            let old_max = self.max_rates.get(kind).copied().unwrap_or(0.0);
            let new_max = base * multiplier;
            let share = if old_max > 0.0 {
                self.production_rates.get(kind).copied().unwrap_or(0.0) / old_max
            } else {
                0.0
            };
            self.max_rates.insert(*kind, new_max);
            self.production_rates.insert(*kind, (share * new_max).clamp(0.0, new_max));
        }

        for (stat, factor) in self.enhancements_at(self.level).to_vec() {
            match stat {
                ModuleStat::Efficiency => self.efficiency *= factor,
                ModuleStat::Upkeep => self.upkeep_factor *= factor,
            }
        }
    }

    /// Consumption implied by the current production rates. Higher levels
    /// consume less per unit of output.
    pub fn projected_consumption(
        &self,
        cost_table: &CostTable,
        config: &SimulationConfig,
    ) -> BTreeMap<ResourceKind, f32> {
        let factor = self.upkeep_factor / config.level_multiplier(self.level);
        cost_table.consumption(&self.production_rates, factor)
    }

    /// Recompute and store consumption rates, replacing whatever was there
    pub(crate) fn derive_consumption(&mut self, cost_table: &CostTable, config: &SimulationConfig) {
        self.consumption_rates = self.projected_consumption(cost_table, config);
    }

    /// Set a production rate directly, clamped to the ceiling
    pub fn set_production_rate(&mut self, kind: ResourceKind, rate: f32) -> bool {
        let Some(max) = self.max_rates.get(&kind).copied() else {
            return false;
        };
        self.production_rates.insert(kind, rate.clamp(0.0, max));
        true
    }

    /// Rate for one of the discrete steps: `max * step / steps`
    pub fn step_rate(&self, kind: ResourceKind, step: u8, steps: u8) -> f32 {
        if steps == 0 {
            return 0.0;
        }
        self.max_rate(kind) * step.min(steps) as f32 / steps as f32
    }

    /// Which step the current rate sits on.
    ///
    /// Step `s` covers `[(s - 0.5) / steps, (s + 0.5) / steps)` of the
    /// ceiling; the top step is open-ended and step 0 only matches an exact
    /// zero. Rates between zero and the first bracket match nothing.
    pub fn production_step(&self, kind: ResourceKind, steps: u8) -> Option<u8> {
        let max = self.max_rates.get(&kind).copied()?;
        let rate = self.production_rate(kind);

        if rate == 0.0 {
            return Some(0);
        }

        (1..=steps).find(|&s| {
            let lower = max * (s as f32 - 0.5) / steps as f32;
            let upper = max * (s as f32 + 0.5) / steps as f32;
            if s == steps {
                rate >= lower
            } else {
                rate >= lower && rate < upper
            }
        })
    }
}
