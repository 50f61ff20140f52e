//! Storage - per-unit and per-sect resource amounts

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Resource amounts held by a unit or a sect.
///
/// Amounts never go negative: `consume` refuses rather than overdraw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Storage {
    amounts: AHashMap<ResourceKind, f32>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_amounts(amounts: &[(ResourceKind, f32)]) -> Self {
        let mut storage = Self::new();
        for (kind, amount) in amounts {
            storage.add(*kind, *amount);
        }
        storage
    }

    /// Current amount of a resource (0 if never stored)
    pub fn get(&self, kind: ResourceKind) -> f32 {
        self.amounts.get(&kind).copied().unwrap_or(0.0)
    }

    /// Add a non-negative amount; anything else is ignored
    pub fn add(&mut self, kind: ResourceKind, amount: f32) {
        if !(amount > 0.0) || !amount.is_finite() {
            return;
        }
        *self.amounts.entry(kind).or_insert(0.0) += amount;
    }

    /// Remove `amount` if there is enough of it; returns false and leaves
    /// storage untouched otherwise
    pub fn consume(&mut self, kind: ResourceKind, amount: f32) -> bool {
        if !(amount >= 0.0) {
            return false;
        }
        let available = self.get(kind);
        if amount > available {
            return false;
        }
        if amount > 0.0 {
            self.amounts.insert(kind, available - amount);
        }
        true
    }

    /// First requirement that cannot be covered, as `(kind, required, available)`
    pub fn shortfall(
        &self,
        requirements: &[(ResourceKind, f32)],
    ) -> Option<(ResourceKind, f32, f32)> {
        requirements
            .iter()
            .find(|(kind, amount)| self.get(*kind) < *amount)
            .map(|(kind, amount)| (*kind, *amount, self.get(*kind)))
    }

    /// Check if every requirement can be covered
    pub fn has_all(&self, requirements: &[(ResourceKind, f32)]) -> bool {
        self.shortfall(requirements).is_none()
    }

    /// Consume every requirement, or nothing at all
    pub fn consume_all(&mut self, requirements: &[(ResourceKind, f32)]) -> bool {
        if !self.has_all(requirements) {
            return false;
        }
        for (kind, amount) in requirements {
            self.consume(*kind, *amount);
        }
        true
    }

    /// Cut a resource down to `keep`, returning what was removed (0 if the
    /// stored amount does not exceed `keep`)
    pub fn take_above(&mut self, kind: ResourceKind, keep: f32) -> f32 {
        let stored = self.get(kind);
        let keep = keep.max(0.0);
        let excess = stored - keep;
        if excess > 0.0 {
            self.amounts.insert(kind, keep);
            excess
        } else {
            0.0
        }
    }

    /// Stored amounts with a positive balance, sorted by kind
    pub fn positive(&self) -> Vec<(ResourceKind, f32)> {
        let mut out: Vec<(ResourceKind, f32)> = self
            .amounts
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(kind, amount)| (*kind, *amount))
            .collect();
        out.sort_by_key(|(kind, _)| *kind);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.values().all(|amount| *amount <= 0.0)
    }
}
