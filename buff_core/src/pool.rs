//! Pooled resources - fixed-size boolean slot arrays

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of primary slots for a fresh actor
pub const DEFAULT_PRIMARY_SLOTS: usize = 3;
/// Default number of bonus slots for a fresh actor
pub const DEFAULT_BONUS_SLOTS: usize = 2;

/// Which slot array a cost or effect touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Primary,
    Bonus,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Primary => write!(f, "primary"),
            PoolKind::Bonus => write!(f, "bonus"),
        }
    }
}

/// Two slot arrays; `false` = available, `true` = spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PooledResource {
    primary: Vec<bool>,
    bonus: Vec<bool>,
}

impl Default for PooledResource {
    fn default() -> Self {
        PooledResource::new(DEFAULT_PRIMARY_SLOTS, DEFAULT_BONUS_SLOTS)
    }
}

impl PooledResource {
    /// Create pools with every slot available
    pub fn new(primary_slots: usize, bonus_slots: usize) -> Self {
        PooledResource {
            primary: vec![false; primary_slots],
            bonus: vec![false; bonus_slots],
        }
    }

    pub fn slots(&self, kind: PoolKind) -> &[bool] {
        match kind {
            PoolKind::Primary => &self.primary,
            PoolKind::Bonus => &self.bonus,
        }
    }

    fn slots_mut(&mut self, kind: PoolKind) -> &mut Vec<bool> {
        match kind {
            PoolKind::Primary => &mut self.primary,
            PoolKind::Bonus => &mut self.bonus,
        }
    }

    pub fn capacity(&self, kind: PoolKind) -> usize {
        self.slots(kind).len()
    }

    /// Unspent slots
    pub fn available(&self, kind: PoolKind) -> usize {
        self.slots(kind).iter().filter(|spent| !**spent).count()
    }

    /// Spent slots
    pub fn spent(&self, kind: PoolKind) -> usize {
        self.slots(kind).iter().filter(|spent| **spent).count()
    }

    /// Mark up to `count` available slots spent, lowest index first
    ///
    /// Returns how many slots were actually spent.
    pub fn spend(&mut self, kind: PoolKind, count: usize) -> usize {
        flip_lowest(self.slots_mut(kind), false, count)
    }

    /// Spend exactly `count` slots or none at all
    pub fn try_spend(&mut self, kind: PoolKind, count: usize) -> bool {
        if self.available(kind) < count {
            return false;
        }
        self.spend(kind, count);
        true
    }

    /// Mark up to `count` spent slots available again, lowest index first
    pub fn restore(&mut self, kind: PoolKind, count: usize) -> usize {
        flip_lowest(self.slots_mut(kind), true, count)
    }

    /// Make every slot available
    pub fn refresh(&mut self) {
        self.primary.iter_mut().for_each(|s| *s = false);
        self.bonus.iter_mut().for_each(|s| *s = false);
    }
}

fn flip_lowest(slots: &mut [bool], from: bool, count: usize) -> usize {
    let mut flipped = 0;
    for slot in slots.iter_mut().filter(|s| **s == from).take(count) {
        *slot = !from;
        flipped += 1;
    }
    flipped
}
