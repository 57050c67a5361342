use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Consumable power-up kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    /// Reveal every card for a short window.
    Peek,
    /// Match one random remaining pair.
    AutoMatch,
}

/// In-memory stock of power-up charges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    /// Peek charges.
    pub peek: u32,
    /// Auto-match charges.
    pub auto_match: u32,
}

impl Inventory {
    /// Charges held for `kind`.
    pub fn count(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Peek => self.peek,
            PowerUpKind::AutoMatch => self.auto_match,
        }
    }

    fn slot_mut(&mut self, kind: PowerUpKind) -> &mut u32 {
        match kind {
            PowerUpKind::Peek => &mut self.peek,
            PowerUpKind::AutoMatch => &mut self.auto_match,
        }
    }

    /// Add `delta` charges (negative removes), never going below zero.
    pub fn adjust(&mut self, kind: PowerUpKind, delta: i64) {
        let slot = self.slot_mut(kind);
        let next = (*slot as i64).saturating_add(delta).clamp(0, u32::MAX as i64);
        *slot = next as u32;
    }

    /// Take one charge of `kind`. Returns `false` when none is left.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Build an inventory from untrusted numeric counts: truncated, floored at zero.
    pub fn from_counts(peek: f64, auto_match: f64) -> Self {
        Self {
            peek: sanitize_count(peek),
            auto_match: sanitize_count(auto_match),
        }
    }
}

fn sanitize_count(raw: f64) -> u32 {
    // `as` saturates and maps NaN to zero.
    raw.trunc().max(0.0) as u32
}
