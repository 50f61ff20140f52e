pub mod config;
pub mod error;
pub mod scheduler;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ConfigError, EconomyError, Result};
pub use scheduler::{ClockState, TimeScheduler};
