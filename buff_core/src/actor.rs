//! ActorCombatState - everything the engine reads and writes on an actor

use crate::pool::{PoolKind, PooledResource};
use crate::store::StackStore;
use crate::types::{StackInstance, StackKey, Timing};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current and maximum hit points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Health { current: max, max }
    }

    /// `100 * current / max`, 0 for a zero-max actor
    pub fn percent(&self) -> f64 {
        if self.max <= 0 {
            return 0.0;
        }
        100.0 * self.current as f64 / self.max as f64
    }
}

/// Usage counters for one activity on one actor
///
/// Round and combat counts are tagged with the round / combat they were
/// counted in; a counter read under a different tag counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub round_uses: u32,
    #[serde(default)]
    pub combat: Option<String>,
    #[serde(default)]
    pub combat_uses: u32,
    #[serde(default)]
    pub total_uses: u32,
}

impl UsageCounter {
    /// Uses counted in the given round
    pub fn uses_in_round(&self, round: Option<u32>) -> u32 {
        if self.round == round {
            self.round_uses
        } else {
            0
        }
    }

    /// Uses counted in the given combat
    pub fn uses_in_combat(&self, combat: Option<&str>) -> u32 {
        if self.combat.as_deref() == combat {
            self.combat_uses
        } else {
            0
        }
    }

    /// Count one use, resetting stale round / combat tallies first
    pub fn record(&mut self, round: Option<u32>, combat: Option<&str>) {
        if self.round != round {
            self.round = round;
            self.round_uses = 0;
        }
        if self.combat.as_deref() != combat {
            self.combat = combat.map(str::to_string);
            self.combat_uses = 0;
        }
        self.round_uses += 1;
        self.combat_uses += 1;
        self.total_uses += 1;
    }
}

/// Per-actor combat state, persisted by the host as an opaque flag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorCombatState {
    id: String,
    health: Health,
    #[serde(default)]
    stacks: StackStore,
    #[serde(default)]
    pools: PooledResource,
    #[serde(default)]
    usage: HashMap<String, UsageCounter>,
}

impl ActorCombatState {
    pub fn new(id: impl Into<String>, max_hp: i32) -> Self {
        ActorCombatState {
            id: id.into(),
            health: Health::new(max_hp),
            stacks: StackStore::new(),
            pools: PooledResource::default(),
            usage: HashMap::new(),
        }
    }

    pub fn with_pools(mut self, pools: PooledResource) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_current_hp(mut self, current: i32) -> Self {
        self.health.current = current.clamp(0, self.health.max);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // === Health ===

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn health_percent(&self) -> f64 {
        self.health.percent()
    }

    pub fn is_alive(&self) -> bool {
        self.health.current > 0
    }

    /// Heal, never above max and never below the current value
    ///
    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health.current;
        let healed = before.saturating_add(amount.max(0)).min(self.health.max);
        self.health.current = healed.max(before);
        self.health.current - before
    }

    /// Take damage, flooring HP at 0
    ///
    /// Returns the damage actually applied.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.health.current;
        self.health.current = before.saturating_sub(amount.max(0)).max(0);
        before - self.health.current
    }

    // === Stacks ===

    pub fn stacks(&self) -> &StackStore {
        &self.stacks
    }

    pub(crate) fn stacks_mut(&mut self) -> &mut StackStore {
        &mut self.stacks
    }

    /// Active layers and potency of a key, summed across instances
    pub fn get_stack(&self, key: &StackKey) -> Option<StackInstance> {
        self.stacks.get(key)
    }

    pub fn stack_layers(&self, key: &StackKey) -> u32 {
        self.stacks.layers(key)
    }

    pub fn stack_potency(&self, key: &StackKey) -> i32 {
        self.stacks.potency(key)
    }

    pub fn add_stack(&mut self, key: StackKey, layers: u32, potency: i32, timing: Timing) -> Option<StackInstance> {
        self.stacks.add(key, layers, potency, timing).cloned()
    }

    pub fn consume_stack(&mut self, key: &StackKey, layers: u32) -> bool {
        self.stacks.consume(key, layers)
    }

    pub fn clear_stack(&mut self, key: &StackKey) -> usize {
        self.stacks.clear(key)
    }

    /// Drop every stack, e.g. when combat ends
    pub fn clear_all_stacks(&mut self) {
        self.stacks.clear_all();
    }

    // === Pools ===

    pub fn pools(&self) -> &PooledResource {
        &self.pools
    }

    pub fn available(&self, kind: PoolKind) -> usize {
        self.pools.available(kind)
    }

    pub fn spend_pool(&mut self, kind: PoolKind, count: usize) -> usize {
        self.pools.spend(kind, count)
    }

    /// Spend exactly `count` slots, or nothing if fewer are available
    pub fn try_spend_pool(&mut self, kind: PoolKind, count: usize) -> bool {
        self.pools.try_spend(kind, count)
    }

    pub fn restore_pool(&mut self, kind: PoolKind, count: usize) -> usize {
        self.pools.restore(kind, count)
    }

    pub fn refresh_pools(&mut self) {
        self.pools.refresh();
    }

    // === Usage ===

    pub fn usage(&self, activity_id: &str) -> Option<&UsageCounter> {
        self.usage.get(activity_id)
    }

    pub fn record_usage(&mut self, activity_id: &str, round: Option<u32>, combat: Option<&str>) {
        self.usage
            .entry(activity_id.to_string())
            .or_default()
            .record(round, combat);
    }

    // === Persistence ===

    /// Serialize into the host's flag value
    pub fn to_flag(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Restore from the host's flag value
    pub fn from_flag(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
