//! Unit kinds and their per-kind configuration
//!
//! Every unit kind has one typed profile: which field resources it can
//! extract and how fast, what each produced resource costs in inputs, what
//! a fresh unit holds, and which modules it offers. Profiles are looked up
//! once when a unit is created; nothing downstream branches on the kind
//! except the extraction/direct-production split.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::resources::ResourceKind;
use crate::unit::module::ModuleStat;

/// Fixed catalogue of unit kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    Extraction,
    Farming,
    Energy,
    Manufacture,
    Construction,
    Transport,
    Research,
    Communication,
}

impl UnitKind {
    pub const ALL: [UnitKind; 8] = [
        UnitKind::Extraction,
        UnitKind::Farming,
        UnitKind::Energy,
        UnitKind::Manufacture,
        UnitKind::Construction,
        UnitKind::Transport,
        UnitKind::Research,
        UnitKind::Communication,
    ];

    /// Order in which a new sect lays out its units
    pub const SECT_ROSTER: [UnitKind; 8] = [
        UnitKind::Extraction,
        UnitKind::Farming,
        UnitKind::Manufacture,
        UnitKind::Transport,
        UnitKind::Communication,
        UnitKind::Research,
        UnitKind::Energy,
        UnitKind::Construction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::Extraction => "Extraction",
            UnitKind::Farming => "Farming",
            UnitKind::Energy => "Energy",
            UnitKind::Manufacture => "Manufacture",
            UnitKind::Construction => "Construction",
            UnitKind::Transport => "Transport",
            UnitKind::Research => "Research",
            UnitKind::Communication => "Communication",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().to_lowercase() == lower)
    }

    /// Extraction units pull their output out of the resource field
    pub fn extracts(&self) -> bool {
        matches!(self, UnitKind::Extraction)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs consumed per unit of each produced resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    inputs: BTreeMap<ResourceKind, Vec<(ResourceKind, f32)>>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, output: ResourceKind, inputs: &[(ResourceKind, f32)]) -> Self {
        self.set(output, inputs.to_vec());
        self
    }

    pub fn set(&mut self, output: ResourceKind, inputs: Vec<(ResourceKind, f32)>) {
        self.inputs.insert(output, inputs);
    }

    pub fn inputs_for(&self, output: ResourceKind) -> &[(ResourceKind, f32)] {
        self.inputs.get(&output).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Per-tick consumption implied by a set of production rates, scaled
    /// by `factor`
    pub fn consumption(
        &self,
        production: &BTreeMap<ResourceKind, f32>,
        factor: f32,
    ) -> BTreeMap<ResourceKind, f32> {
        let mut out = BTreeMap::new();
        for (output, rate) in production {
            if *rate <= 0.0 {
                continue;
            }
            for (input, ratio) in self.inputs_for(*output) {
                *out.entry(*input).or_insert(0.0) += rate * ratio * factor;
            }
        }
        out
    }

    fn entries(&self) -> impl Iterator<Item = (&ResourceKind, &Vec<(ResourceKind, f32)>)> {
        self.inputs.iter()
    }
}

/// Blueprint for one module slot on a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    /// Built modules come ready; the rest must be paid for
    pub built: bool,
    pub efficiency: f32,
    /// Production ceiling per resource at level 1
    pub max_rates: Vec<(ResourceKind, f32)>,
    /// Cost to reach each level; level 1 is the build cost
    pub upgrade_costs: BTreeMap<u8, Vec<(ResourceKind, f32)>>,
    /// Stat multipliers applied on reaching a level
    pub enhancements: BTreeMap<u8, Vec<(ModuleStat, f32)>>,
}

impl ModuleSpec {
    pub fn new(
        name: &str,
        built: bool,
        efficiency: f32,
        max_rates: &[(ResourceKind, f32)],
    ) -> Self {
        Self {
            name: name.into(),
            built,
            efficiency,
            max_rates: max_rates.to_vec(),
            upgrade_costs: BTreeMap::new(),
            enhancements: BTreeMap::new(),
        }
    }

    pub fn cost(mut self, level: u8, cost: &[(ResourceKind, f32)]) -> Self {
        self.upgrade_costs.insert(level, cost.to_vec());
        self
    }

    pub fn enhance(mut self, level: u8, stat: ModuleStat, multiplier: f32) -> Self {
        self.enhancements.entry(level).or_default().push((stat, multiplier));
        self
    }

    /// Level 1..=5 costs, doubling from `base` each level
    fn tiered(mut self, base: &[(ResourceKind, f32)]) -> Self {
        for level in 1..=5u8 {
            let factor = (1u32 << (level - 1)) as f32;
            let cost = base.iter().map(|(k, a)| (*k, a * factor)).collect();
            self.upgrade_costs.insert(level, cost);
        }
        self
    }

    /// The usual enhancement track: +10% efficiency at 3 and 5, -10% upkeep at 5
    fn standard_track(self) -> Self {
        self.enhance(3, ModuleStat::Efficiency, 1.1)
            .enhance(5, ModuleStat::Efficiency, 1.1)
            .enhance(5, ModuleStat::Upkeep, 0.9)
    }
}

/// Complete configuration for one unit kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    pub kind: UnitKind,
    /// Base extraction rate per field resource (Extraction only)
    pub extraction_rates: Vec<(ResourceKind, f32)>,
    pub cost_table: CostTable,
    pub starting_storage: Vec<(ResourceKind, f32)>,
    pub modules: Vec<ModuleSpec>,
}

impl UnitProfile {
    /// A profile with no modules; such a unit never produces anything
    pub fn bare(kind: UnitKind) -> Self {
        Self {
            kind,
            extraction_rates: Vec::new(),
            cost_table: CostTable::new(),
            starting_storage: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn extraction_rate(&self, kind: ResourceKind) -> f32 {
        self.extraction_rates
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| ConfigError::Invalid(format!("{}: {}", self.kind, msg));

        if self.modules.is_empty() {
            return Err(invalid("no modules".into()));
        }
        if !self.modules.iter().any(|m| m.built) {
            return Err(invalid("no module is built from the start".into()));
        }

        if !self.kind.extracts() && !self.extraction_rates.is_empty() {
            return Err(invalid("only extraction units have extraction rates".into()));
        }
        for (kind, rate) in &self.extraction_rates {
            if !kind.is_field_kind() {
                return Err(invalid(format!("{} cannot be extracted", kind)));
            }
            check_amount(*rate).map_err(|e| invalid(format!("extraction rate {}", e)))?;
        }

        for (output, inputs) in self.cost_table.entries() {
            for (input, ratio) in inputs {
                check_amount(*ratio)
                    .map_err(|e| invalid(format!("cost of {} in {}: {}", output, input, e)))?;
            }
        }

        for (_, amount) in &self.starting_storage {
            check_amount(*amount).map_err(|e| invalid(format!("starting storage {}", e)))?;
        }

        for module in &self.modules {
            if !(module.efficiency > 0.0) {
                return Err(invalid(format!("module '{}' needs positive efficiency", module.name)));
            }
            for (_, rate) in &module.max_rates {
                check_amount(*rate)
                    .map_err(|e| invalid(format!("module '{}' rate {}", module.name, e)))?;
            }
            for (level, cost) in &module.upgrade_costs {
                if *level == 0 {
                    return Err(invalid(format!("module '{}' has a level 0 cost", module.name)));
                }
                for (_, amount) in cost {
                    check_amount(*amount)
                        .map_err(|e| invalid(format!("module '{}' cost {}", module.name, e)))?;
                }
            }
            for stats in module.enhancements.values() {
                if stats.iter().any(|(_, m)| !(*m > 0.0)) {
                    return Err(invalid(format!(
                        "module '{}' has a non-positive enhancement",
                        module.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_amount(value: f32) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("must be a non-negative number, got {}", value))
    }
}

/// Catalog of unit profiles, one per kind
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    profiles: Vec<UnitProfile>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in profiles for every unit kind
    pub fn with_defaults() -> Self {
        use ResourceKind::*;

        let mut catalog = Self::new();

        catalog.add(UnitProfile {
            kind: UnitKind::Extraction,
            extraction_rates: vec![(H2, 0.2), (O2, 0.2), (C, 0.25), (Fe, 0.3), (Si, 0.2)],
            cost_table: CostTable::new()
                .with(H2, &[(Energy, 0.5)])
                .with(O2, &[(Energy, 0.5)])
                .with(C, &[(Energy, 0.5)])
                .with(Fe, &[(Energy, 1.0)])
                .with(Si, &[(Energy, 1.0)]),
            starting_storage: vec![(Energy, 500.0), (Fe, 60.0), (Si, 30.0), (C, 20.0)],
            modules: vec![
                ModuleSpec::new(
                    "Basic Extractor",
                    true,
                    0.8,
                    &[(H2, 0.2), (O2, 0.2), (C, 0.25), (Fe, 0.3), (Si, 0.2)],
                )
                .tiered(&[(Fe, 10.0), (Si, 5.0)])
                .standard_track(),
                ModuleSpec::new("Deep Core Drill", false, 1.0, &[(Fe, 0.5), (Si, 0.4), (C, 0.3)])
                    .tiered(&[(Fe, 40.0), (Si, 20.0), (Energy, 50.0)])
                    .standard_track(),
                ModuleSpec::new("Gas Siphon", false, 0.9, &[(H2, 0.5), (O2, 0.5)])
                    .tiered(&[(Fe, 25.0), (C, 10.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Farming,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Food, &[(Water, 0.3), (Energy, 0.2)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Hydroponics Bay", true, 1.0, &[(Food, 1.0)])
                    .tiered(&[(Fe, 8.0), (C, 4.0)])
                    .standard_track(),
                ModuleSpec::new("Algae Vats", false, 1.0, &[(Food, 1.8)])
                    .tiered(&[(Fe, 20.0), (C, 15.0), (Water, 10.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Energy,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Energy, &[(H2, 0.2), (O2, 0.1)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Fuel Cell Stack", true, 0.9, &[(Energy, 1.5)])
                    .tiered(&[(Fe, 10.0), (Si, 8.0)])
                    .standard_track(),
                ModuleSpec::new("Fusion Core", false, 1.0, &[(Energy, 4.0)])
                    .tiered(&[(Fe, 60.0), (Si, 40.0), (C, 20.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Manufacture,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Water, &[(H2, 0.2), (O2, 0.1), (Energy, 0.3)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Synthesis Plant", true, 0.85, &[(Water, 0.5)])
                    .tiered(&[(Fe, 12.0), (Si, 6.0)])
                    .standard_track(),
                ModuleSpec::new("Reclamation Loop", false, 1.0, &[(Water, 1.2)])
                    .tiered(&[(Fe, 30.0), (Si, 20.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Construction,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Manpower, &[(Food, 0.5), (Energy, 0.4)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Habitat Block", true, 0.9, &[(Manpower, 0.2)])
                    .tiered(&[(Fe, 15.0), (C, 10.0)])
                    .standard_track(),
                ModuleSpec::new("Training Yard", false, 1.0, &[(Manpower, 0.5)])
                    .tiered(&[(Fe, 35.0), (C, 20.0), (Food, 20.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Transport,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Manpower, &[(H2, 0.3), (Energy, 0.5)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Shuttle Bay", true, 0.8, &[(Manpower, 0.1)])
                    .tiered(&[(Fe, 12.0), (Si, 4.0)])
                    .standard_track(),
                ModuleSpec::new("Mass Driver", false, 1.0, &[(Manpower, 0.3)])
                    .tiered(&[(Fe, 50.0), (Si, 25.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Research,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Science, &[(Energy, 1.0), (Si, 0.1)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Field Lab", true, 1.0, &[(Science, 0.5)])
                    .tiered(&[(Si, 10.0), (Fe, 5.0)])
                    .standard_track(),
                ModuleSpec::new("Particle Lab", false, 1.0, &[(Science, 1.5)])
                    .tiered(&[(Si, 40.0), (Fe, 30.0), (Energy, 100.0)])
                    .standard_track(),
            ],
        });

        catalog.add(UnitProfile {
            kind: UnitKind::Communication,
            extraction_rates: vec![],
            cost_table: CostTable::new().with(Science, &[(Energy, 0.6)]),
            starting_storage: vec![],
            modules: vec![
                ModuleSpec::new("Relay Mast", true, 0.9, &[(Science, 0.2)])
                    .tiered(&[(Fe, 6.0), (Si, 6.0)])
                    .standard_track(),
                ModuleSpec::new("Deep Space Array", false, 1.0, &[(Science, 0.6)])
                    .tiered(&[(Fe, 30.0), (Si, 30.0)])
                    .standard_track(),
            ],
        });

        catalog
    }

    /// Add a profile, replacing any existing profile of the same kind
    pub fn add(&mut self, profile: UnitProfile) {
        self.profiles.retain(|p| p.kind != profile.kind);
        self.profiles.push(profile);
    }

    pub fn get(&self, kind: UnitKind) -> Option<&UnitProfile> {
        self.profiles.iter().find(|p| p.kind == kind)
    }

    pub fn all(&self) -> &[UnitProfile] {
        &self.profiles
    }

    /// Check that every kind has exactly one usable profile
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in UnitKind::ALL {
            let count = self.profiles.iter().filter(|p| p.kind == kind).count();
            if count != 1 {
                return Err(ConfigError::Invalid(format!(
                    "expected one profile for {}, found {}",
                    kind, count
                )));
            }
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        Ok(())
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a catalog from TOML text
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_data: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Self::new();
        for unit in toml_data.units {
            let profile = unit.into_profile()?;
            if catalog.get(profile.kind).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "duplicate profile for {}",
                    profile.kind
                )));
            }
            catalog.add(profile);
        }

        catalog.validate()?;
        Ok(catalog)
    }
}

/// TOML representation of a catalog file
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    units: Vec<TomlUnit>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlUnit {
    kind: String,
    #[serde(default)]
    extraction_rates: Vec<TomlAmount>,
    #[serde(default)]
    costs: Vec<TomlCost>,
    #[serde(default)]
    starting_storage: Vec<TomlAmount>,
    modules: Vec<TomlModule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlAmount {
    resource: String,
    amount: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCost {
    output: String,
    inputs: Vec<TomlAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlModule {
    name: String,
    #[serde(default)]
    built: bool,
    #[serde(default = "default_efficiency")]
    efficiency: f32,
    #[serde(default)]
    max_rates: Vec<TomlAmount>,
    #[serde(default)]
    upgrades: Vec<TomlUpgrade>,
    #[serde(default)]
    enhancements: Vec<TomlEnhancement>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlUpgrade {
    level: u8,
    cost: Vec<TomlAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlEnhancement {
    level: u8,
    stat: String,
    multiplier: f32,
}

fn default_efficiency() -> f32 {
    1.0
}

fn parse_resource(code: &str) -> Result<ResourceKind, ConfigError> {
    ResourceKind::from_code(code)
        .ok_or_else(|| ConfigError::Invalid(format!("unknown resource '{}'", code)))
}

fn parse_amounts(amounts: Vec<TomlAmount>) -> Result<Vec<(ResourceKind, f32)>, ConfigError> {
    amounts
        .into_iter()
        .map(|a| Ok((parse_resource(&a.resource)?, a.amount)))
        .collect()
}

impl TomlUnit {
    fn into_profile(self) -> Result<UnitProfile, ConfigError> {
        let kind = UnitKind::from_name(&self.kind)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown unit kind '{}'", self.kind)))?;

        let mut cost_table = CostTable::new();
        for cost in self.costs {
            cost_table.set(parse_resource(&cost.output)?, parse_amounts(cost.inputs)?);
        }

        let modules = self
            .modules
            .into_iter()
            .map(|m| m.into_spec())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UnitProfile {
            kind,
            extraction_rates: parse_amounts(self.extraction_rates)?,
            cost_table,
            starting_storage: parse_amounts(self.starting_storage)?,
            modules,
        })
    }
}

impl TomlModule {
    fn into_spec(self) -> Result<ModuleSpec, ConfigError> {
        let max_rates = parse_amounts(self.max_rates)?;
        let mut spec = ModuleSpec::new(&self.name, self.built, self.efficiency, &max_rates);

        for upgrade in self.upgrades {
            spec.upgrade_costs.insert(upgrade.level, parse_amounts(upgrade.cost)?);
        }

        for enhancement in self.enhancements {
            let stat = ModuleStat::from_name(&enhancement.stat).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown module stat '{}'", enhancement.stat))
            })?;
            spec = spec.enhance(enhancement.level, stat, enhancement.multiplier);
        }

        Ok(spec)
    }
}
