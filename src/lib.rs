//! Colony Economy - the economic simulation core of a colony-building game
//!
//! A procedurally generated resource field, a fixed-step time scheduler and
//! a per-unit production engine. Sects own production units, units turn
//! inputs and field resources into stored goods every tick, and once per
//! in-game day each sect collects whatever its units hold above their
//! operating reserve.

pub mod core;
pub mod planet;
pub mod resources;
pub mod sect;
pub mod simulation;
pub mod unit;

pub use crate::core::{ClockState, ConfigError, EconomyError, SimulationConfig, TimeScheduler};
pub use crate::simulation::{AdvanceReport, Simulation};
