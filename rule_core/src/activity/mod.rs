//! Activity definitions - the authored trigger/condition/consume/effect rules

mod context;
mod trigger;
mod usage;

pub use context::{DiceContext, ExecutionContext};
pub use trigger::{Trigger, TriggerType};
pub use usage::{UsageLimit, UsageScope};

use crate::condition::Condition;
use crate::consume::ConsumeSpec;
use crate::effect::EffectSpec;
use serde::{Deserialize, Serialize};

/// One rule attached to an item or actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub consume: ConsumeSpec,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default, alias = "usageLimit")]
    pub usage_limit: UsageLimit,
}

impl Activity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger: Trigger) -> Self {
        Activity {
            id: id.into(),
            name: name.into(),
            trigger,
            conditions: Vec::new(),
            consume: ConsumeSpec::default(),
            effects: Vec::new(),
            usage_limit: UsageLimit::default(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_consume(mut self, consume: ConsumeSpec) -> Self {
        self.consume = consume;
        self
    }

    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_usage_limit(mut self, limit: UsageLimit) -> Self {
        self.usage_limit = limit;
        self
    }
}
