//! StackStore - the live stack instances of one actor

use crate::types::{StackInstance, StackKey, Timing};
use serde::{Deserialize, Serialize};

/// Collection of stack instances with merge-on-add semantics
///
/// Holds at most one instance per (key, timing) for anything added through
/// [`StackStore::add`]. Only round reconciliation can leave two current
/// instances of a decaying key side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackStore {
    stacks: Vec<StackInstance>,
}

impl StackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackInstance> {
        self.stacks.iter()
    }

    /// Active view of a key: layers and potency summed over every active
    /// instance, reported with the timing of the first one (current before both)
    pub fn get(&self, key: &StackKey) -> Option<StackInstance> {
        let timing = [Timing::Current, Timing::Both]
            .into_iter()
            .find(|t| self.active(key).any(|s| s.timing == *t))?;
        Some(StackInstance::new(key.clone(), self.layers(key), self.potency(key), timing))
    }

    /// Instance for an exact (key, timing) slot
    pub fn get_timed(&self, key: &StackKey, timing: Timing) -> Option<&StackInstance> {
        self.stacks.iter().find(|s| s.same_slot(key, timing))
    }

    /// Total layers active this round
    pub fn layers(&self, key: &StackKey) -> u32 {
        self.active(key).fold(0, |total, s| total.saturating_add(s.layers))
    }

    /// Total potency active this round
    pub fn potency(&self, key: &StackKey) -> i32 {
        self.active(key).fold(0, |total, s| total.saturating_add(s.potency))
    }

    fn active<'a>(&'a self, key: &'a StackKey) -> impl Iterator<Item = &'a StackInstance> + 'a {
        self.stacks
            .iter()
            .filter(move |s| s.key == *key && s.timing.is_active() && s.layers > 0)
    }

    /// Add layers and potency, merging into an existing (key, timing) instance
    ///
    /// Returns the resulting instance, or `None` when nothing is left to hold
    /// (zero layers added to an empty slot).
    pub fn add(&mut self, key: StackKey, layers: u32, potency: i32, timing: Timing) -> Option<&StackInstance> {
        if let Some(idx) = self.stacks.iter().position(|s| s.same_slot(&key, timing)) {
            let existing = &mut self.stacks[idx];
            existing.layers = existing.layers.saturating_add(layers);
            existing.potency = existing.potency.saturating_add(potency);
            return Some(&self.stacks[idx]);
        }

        if layers == 0 {
            return None;
        }

        self.stacks.push(StackInstance::new(key, layers, potency, timing));
        self.stacks.last()
    }

    /// Remove layers from the active instances, all or nothing
    ///
    /// Every current-round instance is drained before any both-round one. Instances that
    /// reach zero layers are deleted. Returns false and leaves the store
    /// untouched when fewer layers are active than requested.
    pub fn consume(&mut self, key: &StackKey, layers: u32) -> bool {
        if self.layers(key) < layers {
            return false;
        }

        let mut remaining = layers;
        for timing in [Timing::Current, Timing::Both] {
            if remaining == 0 {
                break;
            }
            for stack in self.stacks.iter_mut().filter(|s| s.same_slot(key, timing)) {
                let taken = stack.layers.min(remaining);
                stack.layers -= taken;
                remaining -= taken;
            }
        }

        self.stacks.retain(|s| s.layers > 0);
        true
    }

    /// Remove every instance of a key, returning how many were removed
    pub fn clear(&mut self, key: &StackKey) -> usize {
        let before = self.stacks.len();
        self.stacks.retain(|s| s.key != *key);
        before - self.stacks.len()
    }

    /// Remove everything
    pub fn clear_all(&mut self) {
        self.stacks.clear();
    }

    /// Take all instances out, leaving the store empty
    pub(crate) fn take_all(&mut self) -> Vec<StackInstance> {
        std::mem::take(&mut self.stacks)
    }

    /// Replace the whole collection (round reconciliation only)
    pub(crate) fn replace_all(&mut self, stacks: Vec<StackInstance>) {
        self.stacks = stacks;
    }
}
