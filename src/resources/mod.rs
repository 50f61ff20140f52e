//! Resource kinds and naming

pub mod kind;

pub use kind::{ResourceKind, FIELD_KINDS};
