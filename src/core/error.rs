use thiserror::Error;

use crate::resources::ResourceKind;

/// Refusals surfaced by simulation commands.
///
/// None of these are fatal: the requested transition simply did not happen
/// and no resources were deducted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EconomyError {
    #[error("Insufficient {kind}: need {required:.2}, have {available:.2}")]
    InsufficientResources {
        kind: ResourceKind,
        required: f32,
        available: f32,
    },

    #[error("Module {0} is not built")]
    ModuleNotBuilt(usize),

    #[error("Module {0} is already built")]
    ModuleAlreadyBuilt(usize),

    #[error("Module {index} is already at max level {level}")]
    MaxLevelReached { index: usize, level: u8 },

    #[error("Module {index} has no cost defined for level {level}")]
    NoUpgradeCost { index: usize, level: u8 },

    #[error("Unknown module index: {0}")]
    UnknownModule(usize),

    #[error("Unknown unit index: {0}")]
    UnknownUnit(usize),

    #[error("Unknown sect index: {0}")]
    UnknownSect(usize),

    #[error("Unit has no active module")]
    NoActiveModule,

    #[error("Active module cannot produce {0}")]
    RateNotControllable(ResourceKind),

    #[error("Rate step {step} out of range 0..={max}")]
    InvalidRateStep { step: u8, max: u8 },
}

pub type Result<T> = std::result::Result<T, EconomyError>;

/// Errors raised while loading configuration or unit catalogs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
