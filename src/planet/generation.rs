//! Procedural placement of resource deposits
//!
//! Deposits are laid down as clusters. Each cluster site picks one random
//! centre and one base radius, then lays a cone-shaped deposit of every
//! field resource around that shared centre, each with its own radius
//! scale and peak abundance. Overlapping deposits of the same kind combine
//! with `max`, so a strong nearby cluster wins instead of stacking.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::types::{CellCoord, Vec2};
use crate::planet::field::ResourceField;
use crate::resources::ResourceKind;

/// Shape of one resource's deposit around a cluster centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterShape {
    pub kind: ResourceKind,
    /// Multiplier applied to the site's base radius
    pub radius_scale: f32,
    /// Abundance at the cluster centre
    pub peak: f32,
}

/// Minimum abundance guaranteed at the starting location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceFloor {
    pub kind: ResourceKind,
    pub floor: f32,
}

/// Layout of the resource grid and how deposits are scattered on it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cells per side of the square grid
    pub grid_size: u32,
    /// World units per cell side
    pub cell_size: f32,
    /// Number of cluster sites; one per grid row when unset
    pub cluster_count: Option<u32>,
    /// Cells kept clear between a cluster centre and the border
    pub cluster_margin: u32,
    /// Base radius range (in cells) for each site, `[min, max)`
    pub min_radius: f32,
    pub max_radius: f32,
    /// Per-resource deposit shapes laid at every site
    pub clusters: Vec<ClusterShape>,
    /// Floors applied to the starting location
    pub basic_floors: Vec<ResourceFloor>,
    /// Cells kept clear between the starting sect and the border
    pub start_margin: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            cell_size: 100.0,
            cluster_count: None,
            cluster_margin: 1,
            min_radius: 2.0,
            max_radius: 5.0,
            clusters: vec![
                ClusterShape { kind: ResourceKind::H2, radius_scale: 1.0, peak: 0.8 },
                ClusterShape { kind: ResourceKind::O2, radius_scale: 0.8, peak: 0.7 },
                ClusterShape { kind: ResourceKind::C, radius_scale: 1.2, peak: 0.6 },
                ClusterShape { kind: ResourceKind::Fe, radius_scale: 0.6, peak: 0.9 },
                ClusterShape { kind: ResourceKind::Si, radius_scale: 1.0, peak: 0.75 },
            ],
            basic_floors: vec![
                ResourceFloor { kind: ResourceKind::H2, floor: 0.3 },
                ResourceFloor { kind: ResourceKind::O2, floor: 0.3 },
                ResourceFloor { kind: ResourceKind::C, floor: 0.3 },
                ResourceFloor { kind: ResourceKind::Fe, floor: 0.3 },
                ResourceFloor { kind: ResourceKind::Si, floor: 0.2 },
            ],
            start_margin: 3,
        }
    }
}

impl GenerationConfig {
    /// Number of cluster sites to place
    pub fn site_count(&self) -> u32 {
        self.cluster_count.unwrap_or(self.grid_size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < self.cluster_margin * 2 + 1 {
            return Err(ConfigError::Invalid(format!(
                "grid_size ({}) too small for cluster_margin ({})",
                self.grid_size, self.cluster_margin
            )));
        }

        if self.grid_size < self.start_margin * 2 + 1 {
            return Err(ConfigError::Invalid(format!(
                "grid_size ({}) too small for start_margin ({})",
                self.grid_size, self.start_margin
            )));
        }

        if !(self.cell_size > 0.0) {
            return Err(ConfigError::Invalid("cell_size must be positive".into()));
        }

        if !(self.min_radius > 0.0 && self.max_radius > self.min_radius) {
            return Err(ConfigError::Invalid(format!(
                "radius range [{}, {}) is empty",
                self.min_radius, self.max_radius
            )));
        }

        if let Some(shape) = self.clusters.iter().find(|s| !s.kind.is_field_kind()) {
            return Err(ConfigError::Invalid(format!(
                "{} does not occur in the resource field",
                shape.kind
            )));
        }

        Ok(())
    }
}

/// A placed cluster site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSite {
    pub center: CellCoord,
    pub base_radius: f32,
}

/// Scatter cluster sites over an already-cleared field.
///
/// Returns the sites in the order they were placed.
pub fn scatter_clusters<R: Rng>(
    field: &mut ResourceField,
    config: &GenerationConfig,
    rng: &mut R,
) -> Vec<ClusterSite> {
    let size = field.grid_size() as i32;
    let margin = config.cluster_margin as i32;
    let mut sites = Vec::with_capacity(config.site_count() as usize);

    for _ in 0..config.site_count() {
        let center = CellCoord::new(
            rng.gen_range(margin..=size - margin - 1),
            rng.gen_range(margin..=size - margin - 1),
        );
        let base_radius = rng.gen_range(config.min_radius..config.max_radius);

        tracing::debug!(x = center.x, y = center.y, base_radius, "placing cluster site");

        for shape in &config.clusters {
            lay_deposit(field, shape.kind, center, base_radius * shape.radius_scale, shape.peak);
        }

        sites.push(ClusterSite { center, base_radius });
    }

    sites
}

/// Lay one cone-shaped deposit: `peak * (1 - d / radius)` inside the radius
fn lay_deposit(
    field: &mut ResourceField,
    kind: ResourceKind,
    center: CellCoord,
    radius: f32,
    peak: f32,
) {
    if radius <= 0.0 {
        return;
    }

    let size = field.grid_size() as i32;
    let cx = center.x as f32;
    let cy = center.y as f32;
    let start_x = ((cx - radius) as i32).max(0);
    let end_x = ((cx + radius) as i32).min(size - 1);
    let start_y = ((cy - radius) as i32).max(0);
    let end_y = ((cy + radius) as i32).min(size - 1);

    let origin = Vec2::new(cx, cy);
    for y in start_y..=end_y {
        for x in start_x..=end_x {
            let dist = origin.distance(&Vec2::new(x as f32, y as f32));
            if dist <= radius {
                field.raise_to(CellCoord::new(x, y), kind, peak * (1.0 - dist / radius));
            }
        }
    }
}
