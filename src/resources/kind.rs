//! The closed catalogue of resource kinds

use serde::{Deserialize, Serialize};

/// Every resource the economy knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Energy,
    H2,
    O2,
    C,
    Fe,
    Si,
    Water,
    Food,
    Science,
    Manpower,
}

/// Kinds that occur naturally in the planet's resource field
pub const FIELD_KINDS: [ResourceKind; 5] = [
    ResourceKind::H2,
    ResourceKind::O2,
    ResourceKind::C,
    ResourceKind::Fe,
    ResourceKind::Si,
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Energy,
        ResourceKind::H2,
        ResourceKind::O2,
        ResourceKind::C,
        ResourceKind::Fe,
        ResourceKind::Si,
        ResourceKind::Water,
        ResourceKind::Food,
        ResourceKind::Science,
        ResourceKind::Manpower,
    ];

    /// Human-readable name shown in the UI
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Energy => "Energy",
            ResourceKind::H2 => "Hydrogen",
            ResourceKind::O2 => "Oxygen",
            ResourceKind::C => "Carbon",
            ResourceKind::Fe => "Iron",
            ResourceKind::Si => "Silicon",
            ResourceKind::Water => "Water",
            ResourceKind::Food => "Food",
            ResourceKind::Science => "Science",
            ResourceKind::Manpower => "Manpower",
        }
    }

    /// Short code used in config files and logs
    pub fn code(&self) -> &'static str {
        match self {
            ResourceKind::Energy => "ENERGY",
            ResourceKind::H2 => "H2",
            ResourceKind::O2 => "O2",
            ResourceKind::C => "C",
            ResourceKind::Fe => "Fe",
            ResourceKind::Si => "Si",
            ResourceKind::Water => "WATER",
            ResourceKind::Food => "FOOD",
            ResourceKind::Science => "SCIENCE",
            ResourceKind::Manpower => "MANPOWER",
        }
    }

    /// Whether this kind can be extracted from the planet's field
    pub fn is_field_kind(&self) -> bool {
        FIELD_KINDS.contains(self)
    }

    /// Parse a code or display name, case-insensitively
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code.trim().to_lowercase().as_str() {
            "energy" => ResourceKind::Energy,
            "h2" | "hydrogen" => ResourceKind::H2,
            "o2" | "oxygen" => ResourceKind::O2,
            "c" | "carbon" => ResourceKind::C,
            "fe" | "iron" => ResourceKind::Fe,
            "si" | "silicon" => ResourceKind::Si,
            "water" => ResourceKind::Water,
            "food" => ResourceKind::Food,
            "science" => ResourceKind::Science,
            "manpower" => ResourceKind::Manpower,
            _ => return None,
        };
        Some(kind)
    }

    /// Display name for an arbitrary code; "Unknown" if it is not recognised
    pub fn display_name_for(code: &str) -> &'static str {
        Self::from_code(code)
            .map(|kind| kind.display_name())
            .unwrap_or("Unknown")
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
