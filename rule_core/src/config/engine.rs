//! Tunable engine behaviour

use super::ConfigError;
use buff_core::{ActorCombatState, PooledResource};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a condition with an unknown `type` is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownConditionPolicy {
    /// Treat as satisfied (lenient legacy data)
    Allow,
    /// Treat as failed
    #[default]
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub unknown_condition_policy: UnknownConditionPolicy,
    /// Heals whose amount rolls dice wait for confirmation before applying
    #[serde(default = "default_confirm_dice_heals")]
    pub confirm_dice_heals: bool,
    /// Primary slots given to actors created through the config
    #[serde(default = "default_primary_slots")]
    pub primary_slots: usize,
    /// Bonus slots given to actors created through the config
    #[serde(default = "default_bonus_slots")]
    pub bonus_slots: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            unknown_condition_policy: UnknownConditionPolicy::default(),
            confirm_dice_heals: default_confirm_dice_heals(),
            primary_slots: default_primary_slots(),
            bonus_slots: default_bonus_slots(),
        }
    }
}

fn default_confirm_dice_heals() -> bool {
    true
}
fn default_primary_slots() -> usize {
    buff_core::pool::DEFAULT_PRIMARY_SLOTS
}
fn default_bonus_slots() -> usize {
    buff_core::pool::DEFAULT_BONUS_SLOTS
}

impl EngineConfig {
    /// Load config from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        super::load_toml(path)
    }

    /// Parse config from a TOML string
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        super::parse_toml(toml)
    }

    /// A fresh actor with this config's pool sizes
    pub fn new_actor(&self, id: impl Into<String>, max_hp: i32) -> ActorCombatState {
        ActorCombatState::new(id, max_hp).with_pools(PooledResource::new(self.primary_slots, self.bonus_slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buff_core::PoolKind;

    #[test]
    fn test_defaults_fail_closed() {
        let config = EngineConfig::default();
        assert_eq!(config.unknown_condition_policy, UnknownConditionPolicy::Deny);
        assert!(config.confirm_dice_heals);
    }

    #[test]
    fn test_parse_partial() {
        let config = EngineConfig::parse(
            r#"
unknown_condition_policy = "allow"
bonus_slots = 4
"#,
        )
        .unwrap();
        assert_eq!(config.unknown_condition_policy, UnknownConditionPolicy::Allow);
        assert_eq!(config.bonus_slots, 4);
        assert_eq!(config.primary_slots, 3);

        let actor = config.new_actor("hero", 10);
        assert_eq!(actor.available(PoolKind::Bonus), 4);
    }

    #[test]
    fn test_parse_rejects_bad_policy() {
        assert!(matches!(
            EngineConfig::parse("unknown_condition_policy = \"maybe\""),
            Err(ConfigError::Parse { .. })
        ));
    }
}
