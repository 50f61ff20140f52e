//! Read-only views of simulation state for the presentation layer
//!
//! Snapshots are plain owned data: they can be held across frames, diffed,
//! or serialized without borrowing the simulation.

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::scheduler::TimeScheduler;
use crate::core::types::{CellCoord, Day, Tick, Vec2};
use crate::planet::{ActiveArea, ResourceField};
use crate::resources::ResourceKind;
use crate::sect::{Colony, Sect};
use crate::unit::{Module, ProductionUnit, UnitKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockSnapshot {
    pub tick: Tick,
    pub day: Day,
    pub tick_in_day: u64,
    pub game_time: f64,
    pub time_scale: f64,
    pub paused: bool,
}

impl ClockSnapshot {
    pub fn capture(scheduler: &TimeScheduler) -> Self {
        Self {
            tick: scheduler.current_tick(),
            day: scheduler.current_day(),
            tick_in_day: scheduler.tick_in_day(),
            game_time: scheduler.game_time(),
            time_scale: scheduler.time_scale(),
            paused: scheduler.is_paused(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub level: u8,
    pub built: bool,
    pub active: bool,
    pub efficiency: f32,
    pub max_rates: Vec<(ResourceKind, f32)>,
    pub production_rates: Vec<(ResourceKind, f32)>,
    pub consumption_rates: Vec<(ResourceKind, f32)>,
    /// Which rate button is lit for each produced resource
    pub production_steps: Vec<(ResourceKind, Option<u8>)>,
    pub next_upgrade_cost: Option<Vec<(ResourceKind, f32)>>,
}

impl ModuleSnapshot {
    pub fn capture(module: &Module, config: &SimulationConfig) -> Self {
        Self {
            name: module.name().to_string(),
            level: module.level(),
            built: module.is_built(),
            active: module.is_active(),
            efficiency: module.efficiency(),
            max_rates: module.max_rates().iter().map(|(k, v)| (*k, *v)).collect(),
            production_rates: module.production_rates().iter().map(|(k, v)| (*k, *v)).collect(),
            consumption_rates: module.consumption_rates().iter().map(|(k, v)| (*k, *v)).collect(),
            production_steps: module
                .max_rates()
                .keys()
                .map(|k| (*k, module.production_step(*k, config.rate_steps)))
                .collect(),
            next_upgrade_cost: module
                .next_upgrade_cost(config.max_module_level)
                .map(|cost| cost.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSnapshot {
    pub kind: UnitKind,
    pub running: bool,
    pub position: Vec2,
    pub storage: Vec<(ResourceKind, f32)>,
    pub active_module: Option<usize>,
    pub modules: Vec<ModuleSnapshot>,
}

impl UnitSnapshot {
    pub fn capture(unit: &ProductionUnit, config: &SimulationConfig) -> Self {
        Self {
            kind: unit.kind(),
            running: unit.is_running(),
            position: unit.position(),
            storage: unit.storage().positive(),
            active_module: unit.active_index(),
            modules: unit
                .modules()
                .iter()
                .map(|m| ModuleSnapshot::capture(m, config))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectSnapshot {
    pub position: Vec2,
    pub core: usize,
    pub storage: Vec<(ResourceKind, f32)>,
    pub last_collection_day: Option<Day>,
    pub units: Vec<UnitSnapshot>,
}

impl SectSnapshot {
    pub fn capture(sect: &Sect, config: &SimulationConfig) -> Self {
        Self {
            position: sect.position(),
            core: sect.core_index(),
            storage: sect.storage().positive(),
            last_collection_day: sect.last_collection_day(),
            units: sect
                .units()
                .iter()
                .map(|u| UnitSnapshot::capture(u, config))
                .collect(),
        }
    }
}

/// Tile under the cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub cell: CellCoord,
    pub in_bounds: bool,
    pub exploited: bool,
    pub resources: Vec<(ResourceKind, f32)>,
}

impl CellSnapshot {
    pub fn capture(field: &ResourceField, world: Vec2) -> Self {
        let cell = field.cell_of(world);
        Self {
            cell,
            in_bounds: field.in_bounds(cell),
            exploited: field.is_exploited(cell),
            resources: field.resources_at_cell(cell.x, cell.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColonySnapshot {
    pub centroid: Option<Vec2>,
    pub jurisdiction_radius: f32,
    pub sects: Vec<SectSnapshot>,
}

impl ColonySnapshot {
    pub fn capture(colony: &Colony, config: &SimulationConfig) -> Self {
        Self {
            centroid: colony.centroid(),
            jurisdiction_radius: colony.jurisdiction_radius(),
            sects: colony
                .sects()
                .iter()
                .map(|s| SectSnapshot::capture(s, config))
                .collect(),
        }
    }
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub seed: u64,
    pub clock: ClockSnapshot,
    pub active_area: ActiveArea,
    pub colony: ColonySnapshot,
    /// Total remaining abundance per field resource
    pub field_totals: Vec<(ResourceKind, f32)>,
}
