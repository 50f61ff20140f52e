//! Production units, their modules and per-kind profiles

pub mod module;
pub mod production;
pub mod profile;
pub mod storage;

pub use module::{Module, ModuleStat};
pub use production::{ProductionUnit, TickOutcome};
pub use profile::{CostTable, ModuleSpec, UnitCatalog, UnitKind, UnitProfile};
pub use storage::Storage;
