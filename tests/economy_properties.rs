//! Property tests for the economy core
//!
//! Frame deltas are ordinary decimal or fractional seconds (0.01 s steps,
//! 1/n s frames), so the scheduler sees the same rounding a real frame loop
//! produces.

use colony_economy::core::types::{CellCoord, Vec2};
use colony_economy::planet::{GenerationConfig, ResourceField};
use colony_economy::resources::{ResourceKind, FIELD_KINDS};
use colony_economy::sect::Sect;
use colony_economy::unit::{
    CostTable, ModuleSpec, ProductionUnit, TickOutcome, UnitKind, UnitProfile,
};
use colony_economy::{SimulationConfig, TimeScheduler};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn hundredths(max: u32) -> impl Strategy<Value = (u32, f64)> {
    (0..=max).prop_map(|n| (n, n as f64 / 100.0))
}

fn field_kind() -> impl Strategy<Value = ResourceKind> {
    prop::sample::select(FIELD_KINDS.to_vec())
}

fn farm_with(water: f32, energy: f32) -> ProductionUnit {
    let profile = UnitProfile {
        kind: UnitKind::Farming,
        extraction_rates: vec![],
        cost_table: CostTable::new()
            .with(ResourceKind::Food, &[(ResourceKind::Water, 0.5), (ResourceKind::Energy, 0.25)]),
        starting_storage: vec![(ResourceKind::Water, water), (ResourceKind::Energy, energy)],
        modules: vec![ModuleSpec::new("Basic", true, 1.0, &[(ResourceKind::Food, 1.0)])],
    };
    let mut unit = ProductionUnit::from_profile(&profile, Vec2::default());
    unit.start();
    unit
}

proptest! {
    /// Splitting a delta across two frames fires the same ticks as one frame
    #[test]
    fn prop_tick_count_is_split_invariant(
        (na, a) in hundredths(1000),
        (nb, b) in hundredths(1000),
    ) {
        let mut split = TimeScheduler::new(1.0, 60).unwrap();
        let mut whole = TimeScheduler::new(1.0, 60).unwrap();

        let first = split.advance(a);
        let second = split.advance(b);
        let both = whole.advance(a + b);

        prop_assert_eq!(split.current_tick(), whole.current_tick());
        prop_assert_eq!(first.end, second.start);
        prop_assert_eq!(first.start, both.start);
        prop_assert_eq!(second.end, both.end);
        prop_assert_eq!(split.current_tick(), u64::from((na + nb) / 100));
    }

    /// Any steady frame rate yields exactly one tick per simulated second
    #[test]
    fn prop_frame_rate_does_not_change_tick_count(fps in 1u32..=240, seconds in 1u32..=5) {
        let mut clock = TimeScheduler::new(1.0, 60).unwrap();
        let frame = 1.0 / f64::from(fps);
        for _ in 0..fps * seconds {
            clock.advance(frame);
        }
        prop_assert_eq!(clock.current_tick(), u64::from(seconds));
    }

    /// The day is always the tick counter divided by ticks per day
    #[test]
    fn prop_day_follows_tick(
        deltas in prop::collection::vec(hundredths(2500), 1..20),
        tpd in 1u64..100,
    ) {
        let mut scheduler = TimeScheduler::new(1.0, tpd).unwrap();
        for (_, delta) in deltas {
            let fired = scheduler.advance(delta);
            for tick in fired {
                prop_assert_eq!(scheduler.day_of_tick(tick), tick / tpd);
            }
            prop_assert_eq!(scheduler.current_day(), scheduler.current_tick() / tpd);
            prop_assert!(scheduler.tick_in_day() < tpd);
        }
    }

    /// Depletion never raises abundance and never drives it below zero
    #[test]
    fn prop_depletion_is_monotone(
        start in 0.0f32..1.0,
        amounts in prop::collection::vec(0.0f32..0.5, 1..30),
        kind in field_kind(),
    ) {
        let mut field = ResourceField::new(4, 100.0);
        let cell = CellCoord::new(1, 2);
        field.raise_to(cell, kind, start);

        let mut previous = field.abundance(cell, kind);
        for amount in amounts {
            field.deplete(cell.x, cell.y, kind, amount);
            let now = field.abundance(cell, kind);
            prop_assert!(now <= previous);
            prop_assert!(now >= 0.0);
            previous = now;
        }
    }

    /// Generated abundance stays inside [0, peak] and only appears within
    /// reach of some cluster site
    #[test]
    fn prop_clusters_stay_in_bounds(seed in any::<u64>()) {
        let config = GenerationConfig::default();
        let mut field = ResourceField::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sites = field.generate(&config, &mut rng);

        for shape in &config.clusters {
            let reach = config.max_radius * shape.radius_scale;
            for y in 0..config.grid_size as i32 {
                for x in 0..config.grid_size as i32 {
                    let amount = field.abundance(CellCoord::new(x, y), shape.kind);
                    prop_assert!(amount >= 0.0 && amount <= shape.peak + 1e-6);
                    if amount > 0.0 {
                        let here = Vec2::new(x as f32, y as f32);
                        let near = sites.iter().any(|site| {
                            let centre = Vec2::new(site.center.x as f32, site.center.y as f32);
                            here.distance(&centre) <= reach
                        });
                        prop_assert!(near);
                    }
                }
            }
        }
    }

    /// A tick either consumes every input in full or touches nothing
    #[test]
    fn prop_input_gating_is_atomic(water in 0.0f32..2.0, energy in 0.0f32..1.0) {
        let config = SimulationConfig::default();
        let mut field = ResourceField::new(4, 100.0);
        let mut unit = farm_with(water, energy);

        match unit.update(1.0, &mut field, &config) {
            TickOutcome::Starved { .. } => {
                prop_assert!(water < 0.5 || energy < 0.25);
                prop_assert_eq!(unit.storage().get(ResourceKind::Water), water);
                prop_assert_eq!(unit.storage().get(ResourceKind::Energy), energy);
                prop_assert_eq!(unit.storage().get(ResourceKind::Food), 0.0);
            }
            TickOutcome::Produced { .. } => {
                prop_assert!(water >= 0.5 && energy >= 0.25);
                let water_left = unit.storage().get(ResourceKind::Water);
                let energy_left = unit.storage().get(ResourceKind::Energy);
                prop_assert!((water_left - (water - 0.5)).abs() < 1e-5);
                prop_assert!((energy_left - (energy - 0.25)).abs() < 1e-5);
                prop_assert_eq!(unit.storage().get(ResourceKind::Food), 1.0);
            }
            TickOutcome::Idle => prop_assert!(false, "running unit went idle"),
        }
    }

    /// Collection leaves each unit min(stored, need) and moves the rest up,
    /// with nothing created or lost
    #[test]
    fn prop_collection_preserves_reserve(
        water in 0.0f32..500.0,
        energy in 0.0f32..500.0,
        food in 0.0f32..50.0,
    ) {
        let config = SimulationConfig::default();
        let mut unit = farm_with(water, energy);
        unit.storage_mut().add(ResourceKind::Food, food);
        let need = unit.daily_need(&config);

        let mut sect = Sect::with_units(Vec2::default(), vec![unit], 0);
        sect.collect(0, &config);

        for (kind, before) in [
            (ResourceKind::Water, water),
            (ResourceKind::Energy, energy),
            (ResourceKind::Food, food),
        ] {
            let keep = need.get(&kind).copied().unwrap_or(0.0);
            let left = sect.units()[0].storage().get(kind);
            let moved = sect.storage().get(kind);
            prop_assert!((left - before.min(keep)).abs() < 1e-3);
            prop_assert!((left + moved - before).abs() < 1e-3);
        }
        prop_assert_eq!(sect.last_collection_day(), Some(0));
    }
}
