//! Effect executor - typed state changes an activity applies
//!
//! Effect kinds are a closed enum, so an unknown `type` is rejected when
//! activity data is loaded rather than when it runs.

mod amount;
mod exec;
mod heal;

pub use amount::Amount;
pub use exec::{apply, Applied, EffectEnv};
pub use heal::PendingHeal;

use buff_core::{PoolKind, StackKey, Timing};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which actor an effect lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EffectTarget {
    #[default]
    #[serde(rename = "self", alias = "source")]
    Source,
    #[serde(rename = "opponent", alias = "selected", alias = "target")]
    Opponent,
}

impl EffectTarget {
    fn opponent() -> Self {
        EffectTarget::Opponent
    }
}

/// What an effect does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Add layers of a catalog stack
    #[serde(alias = "addBuff")]
    AddBuff {
        id: String,
        #[serde(default = "Amount::one")]
        layers: Amount,
        #[serde(default)]
        potency: Amount,
        #[serde(default)]
        target: EffectTarget,
        #[serde(default, alias = "roundTiming")]
        timing: Timing,
    },
    /// Remove layers, all or nothing
    #[serde(alias = "consumeBuff")]
    ConsumeBuff {
        id: String,
        #[serde(default = "Amount::one")]
        layers: Amount,
        #[serde(default)]
        target: EffectTarget,
    },
    Heal {
        amount: Amount,
        #[serde(default)]
        target: EffectTarget,
    },
    #[serde(alias = "dealDamage")]
    DealDamage {
        amount: Amount,
        #[serde(default = "EffectTarget::opponent")]
        target: EffectTarget,
    },
    /// Adjust the dice total in flight
    #[serde(alias = "modifyDice")]
    ModifyDice { delta: Amount },
    /// Mark spent slots available again
    #[serde(alias = "restoreResource")]
    RestoreResource {
        pool: PoolKind,
        #[serde(default = "Amount::one")]
        count: Amount,
        #[serde(default)]
        target: EffectTarget,
    },
    /// Mark available slots spent
    #[serde(alias = "deductResource")]
    DeductResource {
        pool: PoolKind,
        #[serde(default = "Amount::one")]
        count: Amount,
        #[serde(default)]
        target: EffectTarget,
    },
    /// A free-text stack keyed on its display name
    #[serde(alias = "customBuff")]
    CustomBuff {
        name: String,
        #[serde(default = "Amount::one")]
        layers: Amount,
        #[serde(default)]
        potency: Amount,
        #[serde(default)]
        target: EffectTarget,
        #[serde(default, alias = "roundTiming")]
        timing: Timing,
    },
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::AddBuff { .. } => "add_buff",
            EffectKind::ConsumeBuff { .. } => "consume_buff",
            EffectKind::Heal { .. } => "heal",
            EffectKind::DealDamage { .. } => "deal_damage",
            EffectKind::ModifyDice { .. } => "modify_dice",
            EffectKind::RestoreResource { .. } => "restore_resource",
            EffectKind::DeductResource { .. } => "deduct_resource",
            EffectKind::CustomBuff { .. } => "custom_buff",
        }
    }

    /// Every amount the effect resolves
    pub fn amounts(&self) -> Vec<&Amount> {
        match self {
            EffectKind::AddBuff { layers, potency, .. } | EffectKind::CustomBuff { layers, potency, .. } => {
                vec![layers, potency]
            }
            EffectKind::ConsumeBuff { layers, .. } => vec![layers],
            EffectKind::Heal { amount, .. } | EffectKind::DealDamage { amount, .. } => vec![amount],
            EffectKind::ModifyDice { delta } => vec![delta],
            EffectKind::RestoreResource { count, .. } | EffectKind::DeductResource { count, .. } => vec![count],
        }
    }
}

/// An effect as authored: the kind plus whether failure halts the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(flatten)]
    pub kind: EffectKind,
    #[serde(default)]
    pub critical: bool,
}

impl EffectSpec {
    pub fn new(kind: EffectKind) -> Self {
        EffectSpec { kind, critical: false }
    }

    pub fn critical(kind: EffectKind) -> Self {
        EffectSpec { kind, critical: true }
    }
}

impl From<EffectKind> for EffectSpec {
    fn from(kind: EffectKind) -> Self {
        EffectSpec::new(kind)
    }
}

/// What a successful effect did
#[derive(Debug, Clone, PartialEq)]
pub enum EffectDetail {
    BuffAdded {
        actor: String,
        key: StackKey,
        layers: u32,
        potency: i32,
        timing: Timing,
        /// Layers on the merged instance afterwards
        total: u32,
    },
    BuffConsumed {
        actor: String,
        key: StackKey,
        layers: u32,
    },
    Healed {
        actor: String,
        requested: i32,
        applied: i32,
    },
    /// Rolled but waiting for confirmation
    HealPending {
        actor: String,
        amount: i32,
    },
    Damaged {
        actor: String,
        requested: i32,
        applied: i32,
    },
    DiceModified {
        delta: i64,
        total: i64,
    },
    ResourceRestored {
        actor: String,
        pool: PoolKind,
        requested: usize,
        moved: usize,
    },
    ResourceDeducted {
        actor: String,
        pool: PoolKind,
        requested: usize,
        moved: usize,
    },
}

impl fmt::Display for EffectDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectDetail::BuffAdded {
                actor,
                key,
                layers,
                timing,
                total,
                ..
            } => write!(f, "{} gains {} {} ({}, now {})", actor, layers, key, timing, total),
            EffectDetail::BuffConsumed { actor, key, layers } => write!(f, "{} spends {} {}", actor, layers, key),
            EffectDetail::Healed { actor, applied, .. } => write!(f, "{} heals {}", actor, applied),
            EffectDetail::HealPending { actor, amount } => {
                write!(f, "{} may heal {} (awaiting confirmation)", actor, amount)
            }
            EffectDetail::Damaged { actor, applied, .. } => write!(f, "{} takes {} damage", actor, applied),
            EffectDetail::DiceModified { delta, total } => write!(f, "dice {:+} (total {})", delta, total),
            EffectDetail::ResourceRestored {
                actor, pool, moved, ..
            } => write!(f, "{} restores {} {} slot(s)", actor, moved, pool),
            EffectDetail::ResourceDeducted {
                actor, pool, moved, ..
            } => write!(f, "{} loses {} {} slot(s)", actor, moved, pool),
        }
    }
}

/// Why an effect did nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("unknown stack id '{0}'")]
    UnknownCatalogId(String),
    #[error("{key} has {available} layers, {requested} requested")]
    InsufficientLayers {
        key: StackKey,
        requested: u32,
        available: u32,
    },
    #[error("effect targets the opponent but no target was given")]
    MissingTarget,
    #[error("unknown actor '{0}'")]
    UnknownActor(String),
    #[error("no dice roll to modify")]
    NoDiceContext,
    #[error("custom stack name is empty")]
    InvalidName,
}
