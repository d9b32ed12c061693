//! Round-advance reconciliation
//!
//! Runs once per actor when a combat round ends:
//! 1. Split stacks into current vs next/both
//! 2. Remove current one-round stacks
//! 3. Decay current decaying stacks by one layer (burn-like stacks deal
//!    their potency as damage first)
//! 4. Drop current stacks left with no layers
//! 5. Merge remaining non-decaying current stacks with their next/both
//!    counterparts
//! 6. Promote unmerged next/both stacks to current
//! 7. Store the result with every timing set to current

use crate::actor::ActorCombatState;
use crate::catalog::BuffCatalog;
use crate::types::{StackInstance, StackKey, Timing};
use std::fmt;

/// One thing that happened during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEntry {
    /// A one-round stack ended
    Expired { key: StackKey, layers: u32 },
    /// A decaying stack dealt its potency as damage
    Burned { key: StackKey, damage: i32 },
    /// A decaying stack lost a layer
    Decayed { key: StackKey, from: u32, to: u32 },
    /// A stack ran out of layers
    Faded { key: StackKey },
    /// A current stack absorbed its next-round counterpart
    Merged { key: StackKey, layers: u32, potency: i32 },
    /// A next-round stack became active
    Activated { key: StackKey, layers: u32 },
}

impl fmt::Display for RoundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundEntry::Expired { key, layers } => write!(f, "{} ({} layers) expired", key, layers),
            RoundEntry::Burned { key, damage } => write!(f, "{} dealt {} damage", key, damage),
            RoundEntry::Decayed { key, from, to } => write!(f, "{} decayed {} -> {}", key, from, to),
            RoundEntry::Faded { key } => write!(f, "{} faded", key),
            RoundEntry::Merged { key, layers, potency } => {
                write!(f, "{} merged to {} layers (potency {})", key, layers, potency)
            }
            RoundEntry::Activated { key, layers } => write!(f, "{} ({} layers) now active", key, layers),
        }
    }
}

/// Everything reconciliation did to one actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub actor_id: String,
    pub entries: Vec<RoundEntry>,
    /// Total damage dealt by round-end stacks
    pub damage_taken: i32,
}

impl RoundReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display lines for the combat log
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to_string()).collect()
    }
}

/// Reconcile an actor's stacks at the end of a round
pub fn advance_round(actor: &mut ActorCombatState, catalog: &BuffCatalog) -> RoundReport {
    let mut report = RoundReport {
        actor_id: actor.id().to_string(),
        ..Default::default()
    };

    let (mut current, upcoming): (Vec<StackInstance>, Vec<StackInstance>) = actor
        .stacks_mut()
        .take_all()
        .into_iter()
        .partition(|s| s.timing == Timing::Current);

    // Step 2: one-round stacks end with the round
    current.retain(|stack| {
        if catalog.is_one_round(&stack.key) {
            report.entries.push(RoundEntry::Expired {
                key: stack.key.clone(),
                layers: stack.layers,
            });
            false
        } else {
            true
        }
    });

    // Step 3: decay, with pre-decay damage
    for stack in current.iter_mut().filter(|s| catalog.decays(&s.key)) {
        if catalog.deals_round_end_damage(&stack.key) {
            let damage = actor.take_damage(stack.potency);
            report.damage_taken += damage;
            report.entries.push(RoundEntry::Burned {
                key: stack.key.clone(),
                damage,
            });
        }
        let from = stack.layers;
        stack.layers = from.saturating_sub(1);
        report.entries.push(RoundEntry::Decayed {
            key: stack.key.clone(),
            from,
            to: stack.layers,
        });
    }

    // Step 4
    current.retain(|stack| {
        if stack.layers == 0 {
            report.entries.push(RoundEntry::Faded { key: stack.key.clone() });
            false
        } else {
            true
        }
    });

    // Step 5: merge; decaying stacks keep their own instance
    let mut consumed = vec![false; upcoming.len()];
    for stack in current.iter_mut().filter(|s| !catalog.decays(&s.key)) {
        let mut merged = false;
        for (idx, next) in upcoming.iter().enumerate() {
            if !consumed[idx] && next.key == stack.key {
                stack.layers = stack.layers.saturating_add(next.layers);
                stack.potency = stack.potency.saturating_add(next.potency);
                consumed[idx] = true;
                merged = true;
            }
        }
        if merged {
            report.entries.push(RoundEntry::Merged {
                key: stack.key.clone(),
                layers: stack.layers,
                potency: stack.potency,
            });
        }
    }

    // Step 6
    for (next, used) in upcoming.into_iter().zip(consumed) {
        if used {
            continue;
        }
        report.entries.push(RoundEntry::Activated {
            key: next.key.clone(),
            layers: next.layers,
        });
        current.push(next);
    }

    // Step 7
    for stack in current.iter_mut() {
        stack.timing = Timing::Current;
    }
    actor.stacks_mut().replace_all(current);

    if !report.is_empty() {
        tracing::info!(
            actor = %report.actor_id,
            entries = report.entries.len(),
            damage = report.damage_taken,
            "round reconciled"
        );
    }

    report
}
