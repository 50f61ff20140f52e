//! The planet surface: the resource field and where the colony may start

pub mod field;
pub mod generation;

pub use field::{FieldCell, ResourceField};
pub use generation::{ClusterShape, ClusterSite, GenerationConfig, ResourceFloor};

use rand::Rng;
use serde::Serialize;

use crate::core::types::Vec2;
use crate::resources::ResourceKind;
use crate::sect::Colony;

/// Padding applied to the farthest colony when sizing the active area
pub const ACTIVE_AREA_PADDING: f32 = 1.2;

/// Part of the planet covered by colonies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveArea {
    pub centroid: Vec2,
    pub radius: f32,
}

/// Owns the resource field and its generation settings
#[derive(Debug, Clone)]
pub struct Planet {
    field: ResourceField,
    generation: GenerationConfig,
}

impl Planet {
    pub fn new(generation: GenerationConfig) -> Self {
        Self {
            field: ResourceField::from_config(&generation),
            generation,
        }
    }

    pub fn field(&self) -> &ResourceField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ResourceField {
        &mut self.field
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Regenerate the whole field
    pub fn generate<R: Rng>(&mut self, rng: &mut R) -> Vec<ClusterSite> {
        self.field.generate(&self.generation, rng)
    }

    /// Centre of a random cell at least `start_margin` cells from the border
    pub fn random_start_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let size = self.generation.grid_size as i32;
        let margin = self.generation.start_margin as i32;
        let x = rng.gen_range(margin..=size - margin - 1);
        let y = rng.gen_range(margin..=size - margin - 1);
        self.field.cell_center(x, y)
    }

    /// Make sure the cell under `position` carries the basic floors
    pub fn prepare_start_location(&mut self, position: Vec2) {
        let cell = self.field.cell_of(position);
        self.field.ensure_basic_resources(cell, &self.generation.basic_floors);
        tracing::debug!(x = cell.x, y = cell.y, "prepared start location");
    }

    pub fn resources_at(&self, position: Vec2) -> Vec<(ResourceKind, f32)> {
        self.field.resources_at(position)
    }

    /// World-space centre of the grid
    pub fn center(&self) -> Vec2 {
        let half = self.field.grid_size() as f32 * self.field.cell_size() / 2.0;
        Vec2::new(half, half)
    }

    /// Centroid of the colonies' centroids and the padded distance to the
    /// farthest one. Colonies without sects are skipped; with none left the
    /// area collapses onto the planet centre.
    pub fn active_area(&self, colonies: &[Colony]) -> ActiveArea {
        let centroids: Vec<Vec2> = colonies.iter().filter_map(|c| c.centroid()).collect();
        if centroids.is_empty() {
            return ActiveArea { centroid: self.center(), radius: 0.0 };
        }

        let sum = centroids.iter().fold(Vec2::default(), |acc, c| acc + *c);
        let centroid = sum * (1.0 / centroids.len() as f32);
        let farthest = centroids
            .iter()
            .map(|c| c.distance(&centroid))
            .fold(0.0_f32, f32::max);

        ActiveArea { centroid, radius: farthest * ACTIVE_AREA_PADDING }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_start_position_inside_margin() {
        let planet = Planet::new(GenerationConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..200 {
            let pos = planet.random_start_position(&mut rng);
            let cell = planet.field().cell_of(pos);
            assert!((3..=16).contains(&cell.x));
            assert!((3..=16).contains(&cell.y));
            // Always on a cell centre
            assert_eq!(pos.x % 100.0, 50.0);
            assert_eq!(pos.y % 100.0, 50.0);
        }
    }

    #[test]
    fn test_prepared_start_has_every_field_kind() {
        let mut planet = Planet::new(GenerationConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        planet.generate(&mut rng);

        let start = planet.random_start_position(&mut rng);
        planet.prepare_start_location(start);

        let found = planet.resources_at(start);
        for floor in &planet.generation().basic_floors {
            let amount = found
                .iter()
                .find(|(kind, _)| *kind == floor.kind)
                .map(|(_, a)| *a)
                .unwrap_or(0.0);
            assert!(amount >= floor.floor, "{} below floor", floor.kind);
        }
    }

    #[test]
    fn test_active_area_without_colonies_is_planet_centre() {
        let planet = Planet::new(GenerationConfig::default());
        let area = planet.active_area(&[]);
        assert_eq!(area.centroid, Vec2::new(1000.0, 1000.0));
        assert_eq!(area.radius, 0.0);

        // A colony with no sects does not count
        let area = planet.active_area(&[Colony::new(50.0)]);
        assert_eq!(area.centroid, Vec2::new(1000.0, 1000.0));
    }

    #[test]
    fn test_active_area_pads_farthest_colony() {
        let planet = Planet::new(GenerationConfig::default());
        let catalog = crate::unit::UnitCatalog::with_defaults();

        let mut west = Colony::new(50.0);
        west.found_sect(Vec2::new(200.0, 500.0), &catalog);
        let mut east = Colony::new(50.0);
        east.found_sect(Vec2::new(800.0, 500.0), &catalog);

        let area = planet.active_area(&[west, east]);
        assert_eq!(area.centroid, Vec2::new(500.0, 500.0));
        // 300 to either colony, plus 20%
        assert!((area.radius - 360.0).abs() < 1e-3);
    }
}
