//! Colony - the set of sects founded on the planet

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{Day, Vec2};
use crate::planet::ResourceField;
use crate::sect::collector::{Sect, SectTick};
use crate::unit::UnitCatalog;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    sects: Vec<Sect>,
    /// Radius of a sect's core on the map
    core_radius: f32,
}

impl Colony {
    pub fn new(core_radius: f32) -> Self {
        Self {
            sects: Vec::new(),
            core_radius,
        }
    }

    /// Found a sect at `position`; returns its index
    pub fn found_sect(&mut self, position: Vec2, catalog: &UnitCatalog) -> usize {
        self.sects.push(Sect::found(position, catalog));
        self.sects.len() - 1
    }

    pub fn sects(&self) -> &[Sect] {
        &self.sects
    }

    pub fn sect(&self, index: usize) -> Option<&Sect> {
        self.sects.get(index)
    }

    pub fn sect_mut(&mut self, index: usize) -> Option<&mut Sect> {
        self.sects.get_mut(index)
    }

    pub fn core_radius(&self) -> f32 {
        self.core_radius
    }

    /// Average of sect positions
    pub fn centroid(&self) -> Option<Vec2> {
        if self.sects.is_empty() {
            return None;
        }
        let sum = self
            .sects
            .iter()
            .fold(Vec2::default(), |acc, sect| acc + sect.position());
        Some(sum * (1.0 / self.sects.len() as f32))
    }

    /// How far the colony's claim reaches from its centroid.
    ///
    /// A lone sect claims four core radii; otherwise the claim is the
    /// farthest sect plus two core radii.
    pub fn jurisdiction_radius(&self) -> f32 {
        let Some(center) = self.centroid() else {
            return 0.0;
        };
        if self.sects.len() == 1 {
            return self.core_radius * 4.0;
        }
        let farthest = self
            .sects
            .iter()
            .map(|sect| sect.position().distance(&center))
            .fold(0.0_f32, f32::max);
        farthest + self.core_radius * 2.0
    }

    /// Run one tick for every sect in founding order
    pub fn update(
        &mut self,
        dt: f32,
        day: Day,
        field: &mut ResourceField,
        config: &SimulationConfig,
    ) -> Vec<SectTick> {
        self.sects
            .iter_mut()
            .map(|sect| sect.update(dt, day, field, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sect_jurisdiction() {
        let mut colony = Colony::new(50.0);
        assert_eq!(colony.centroid(), None);
        assert_eq!(colony.jurisdiction_radius(), 0.0);

        colony.found_sect(Vec2::new(550.0, 750.0), &UnitCatalog::with_defaults());
        assert_eq!(colony.centroid(), Some(Vec2::new(550.0, 750.0)));
        assert_eq!(colony.jurisdiction_radius(), 200.0);
    }

    #[test]
    fn test_multi_sect_jurisdiction() {
        let catalog = UnitCatalog::with_defaults();
        let mut colony = Colony::new(50.0);
        colony.found_sect(Vec2::new(0.0, 0.0), &catalog);
        colony.found_sect(Vec2::new(600.0, 0.0), &catalog);
        colony.found_sect(Vec2::new(300.0, 400.0), &catalog);

        let center = colony.centroid().unwrap();
        assert!((center.x - 300.0).abs() < 1e-3);
        assert!((center.y - 133.333).abs() < 1e-2);

        // Farthest from (300, 133.3) is one of the base corners: sqrt(300^2 + 133.3^2)
        let expected = (300.0_f32.powi(2) + (400.0_f32 / 3.0).powi(2)).sqrt() + 100.0;
        assert!((colony.jurisdiction_radius() - expected).abs() < 1e-2);
    }
}
