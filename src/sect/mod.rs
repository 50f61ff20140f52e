//! Sects and the colony that owns them

pub mod collector;
pub mod colony;

pub use collector::{Collection, Sect, SectTick};
pub use colony::Colony;
