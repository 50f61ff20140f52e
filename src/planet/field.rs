//! Resource field - per-cell resource abundance over the planet grid
//!
//! Lookups and depletion are lenient: anything outside the grid reads as
//! empty and writes are dropped. Units call into the field every tick
//! without validating their own position first.

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{CellCoord, Vec2};
use crate::planet::generation::{scatter_clusters, ClusterSite, GenerationConfig, ResourceFloor};
use crate::resources::ResourceKind;

/// A single grid cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCell {
    abundance: AHashMap<ResourceKind, f32>,
    exploited: bool,
}

impl FieldCell {
    pub fn abundance(&self, kind: ResourceKind) -> f32 {
        self.abundance.get(&kind).copied().unwrap_or(0.0)
    }

    /// True once any extraction has drawn from this cell
    pub fn is_exploited(&self) -> bool {
        self.exploited
    }

    /// Kinds with positive abundance, sorted by kind
    pub fn available(&self) -> Vec<(ResourceKind, f32)> {
        let mut out: Vec<(ResourceKind, f32)> = self
            .abundance
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(kind, amount)| (*kind, *amount))
            .collect();
        out.sort_by_key(|(kind, _)| *kind);
        out
    }
}

/// Square grid of resource cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceField {
    grid_size: u32,
    cell_size: f32,
    /// Row-major: index = y * grid_size + x
    cells: Vec<FieldCell>,
}

impl ResourceField {
    pub fn new(grid_size: u32, cell_size: f32) -> Self {
        Self {
            grid_size,
            cell_size,
            cells: vec![FieldCell::default(); (grid_size * grid_size) as usize],
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.grid_size, config.cell_size)
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Wipe every cell back to empty
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = FieldCell::default();
        }
    }

    /// Clear the grid and scatter fresh deposits
    pub fn generate<R: Rng>(&mut self, config: &GenerationConfig, rng: &mut R) -> Vec<ClusterSite> {
        self.clear();
        let sites = scatter_clusters(self, config, rng);
        tracing::info!(
            grid_size = self.grid_size,
            sites = sites.len(),
            "generated resource field"
        );
        sites
    }

    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as u32) < self.grid_size
            && (cell.y as u32) < self.grid_size
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.grid_size as usize + cell.x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, cell: CellCoord) -> Option<&FieldCell> {
        self.index(cell).map(|i| &self.cells[i])
    }

    /// Cell containing a world position (no clamping)
    pub fn cell_of(&self, world: Vec2) -> CellCoord {
        CellCoord::new(
            (world.x / self.cell_size).floor() as i32,
            (world.y / self.cell_size).floor() as i32,
        )
    }

    /// World position of a cell's corner, clamped onto the grid for display
    pub fn cell_to_world(&self, x: i32, y: i32) -> Vec2 {
        let max = self.grid_size as i32 - 1;
        Vec2::new(
            x.clamp(0, max) as f32 * self.cell_size,
            y.clamp(0, max) as f32 * self.cell_size,
        )
    }

    /// World position of a cell's centre, clamped onto the grid
    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        let half = self.cell_size / 2.0;
        self.cell_to_world(x, y) + Vec2::new(half, half)
    }

    pub fn abundance(&self, cell: CellCoord, kind: ResourceKind) -> f32 {
        self.cell(cell).map(|c| c.abundance(kind)).unwrap_or(0.0)
    }

    pub fn is_exploited(&self, cell: CellCoord) -> bool {
        self.cell(cell).map(|c| c.is_exploited()).unwrap_or(false)
    }

    /// Resources with positive abundance at the cell under a world position
    pub fn resources_at(&self, world: Vec2) -> Vec<(ResourceKind, f32)> {
        let cell = self.cell_of(world);
        self.resources_at_cell(cell.x, cell.y)
    }

    /// Resources with positive abundance at a grid cell; empty if out of range
    pub fn resources_at_cell(&self, x: i32, y: i32) -> Vec<(ResourceKind, f32)> {
        self.cell(CellCoord::new(x, y))
            .map(|c| c.available())
            .unwrap_or_default()
    }

    /// Raise a cell's abundance to at least `value`; never lowers it
    pub fn raise_to(&mut self, cell: CellCoord, kind: ResourceKind, value: f32) {
        if let Some(i) = self.index(cell) {
            let entry = self.cells[i].abundance.entry(kind).or_insert(0.0);
            *entry = entry.max(value);
        }
    }

    /// Guarantee a minimum of every floored resource at a cell
    pub fn ensure_basic_resources(&mut self, cell: CellCoord, floors: &[ResourceFloor]) {
        for floor in floors {
            self.raise_to(cell, floor.kind, floor.floor);
        }
    }

    /// Draw down a cell's abundance, stopping at zero.
    ///
    /// Out-of-range cells are ignored.
    pub fn deplete(&mut self, x: i32, y: i32, kind: ResourceKind, amount: f32) {
        let Some(i) = self.index(CellCoord::new(x, y)) else {
            return;
        };
        let cell = &mut self.cells[i];
        let entry = cell.abundance.entry(kind).or_insert(0.0);
        *entry = (*entry - amount).max(0.0);
        if amount > 0.0 {
            cell.exploited = true;
        }
    }

    /// Sum of one resource over the whole grid
    pub fn total(&self, kind: ResourceKind) -> f32 {
        self.cells.iter().map(|c| c.abundance(kind)).sum()
    }
}
