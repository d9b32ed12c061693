use serde::{Deserialize, Serialize};
use std::fmt;

/// Moments at which an activity can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[serde(alias = "onUse")]
    OnUse,
    #[serde(alias = "onAttack")]
    OnAttack,
    #[serde(alias = "onCounter")]
    OnCounter,
    #[serde(alias = "onHit")]
    OnHit,
    #[serde(alias = "onDamaged")]
    OnDamaged,
    #[serde(alias = "onDodge")]
    OnDodge,
    #[serde(alias = "onBlock")]
    OnBlock,
    #[serde(alias = "onCritical")]
    OnCritical,
    #[serde(alias = "onKill")]
    OnKill,
    #[serde(alias = "onRoundStart")]
    OnRoundStart,
    #[serde(alias = "onRoundEnd")]
    OnRoundEnd,
    #[serde(alias = "onTurnStart")]
    OnTurnStart,
    #[serde(alias = "onTurnEnd")]
    OnTurnEnd,
    #[serde(alias = "onCombatStart")]
    OnCombatStart,
    #[serde(alias = "onCombatEnd")]
    OnCombatEnd,
    #[serde(alias = "onBuffApplied")]
    OnBuffApplied,
    #[serde(alias = "onBuffRemoved")]
    OnBuffRemoved,
    #[serde(alias = "onHealed")]
    OnHealed,
}

impl TriggerType {
    pub fn name(&self) -> &'static str {
        match self {
            TriggerType::OnUse => "on_use",
            TriggerType::OnAttack => "on_attack",
            TriggerType::OnCounter => "on_counter",
            TriggerType::OnHit => "on_hit",
            TriggerType::OnDamaged => "on_damaged",
            TriggerType::OnDodge => "on_dodge",
            TriggerType::OnBlock => "on_block",
            TriggerType::OnCritical => "on_critical",
            TriggerType::OnKill => "on_kill",
            TriggerType::OnRoundStart => "on_round_start",
            TriggerType::OnRoundEnd => "on_round_end",
            TriggerType::OnTurnStart => "on_turn_start",
            TriggerType::OnTurnEnd => "on_turn_end",
            TriggerType::OnCombatStart => "on_combat_start",
            TriggerType::OnCombatEnd => "on_combat_end",
            TriggerType::OnBuffApplied => "on_buff_applied",
            TriggerType::OnBuffRemoved => "on_buff_removed",
            TriggerType::OnHealed => "on_healed",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// When an activity fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerType,
    /// Fires automatically on matching events instead of waiting for an explicit use
    #[serde(default)]
    pub passive: bool,
    /// Only fire for this attack category
    #[serde(default, alias = "categoryFilter")]
    pub category: Option<String>,
}

impl Trigger {
    pub fn new(kind: TriggerType) -> Self {
        Trigger {
            kind,
            passive: false,
            category: None,
        }
    }

    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Same moment, and the attack category passes the filter (case-insensitive)
    pub fn matches(&self, kind: TriggerType, category: Option<&str>) -> bool {
        if self.kind != kind {
            return false;
        }
        match (&self.category, category) {
            (None, _) => true,
            (Some(filter), Some(actual)) => filter.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_kind() {
        let trigger = Trigger::new(TriggerType::OnHit);
        assert!(trigger.matches(TriggerType::OnHit, None));
        assert!(trigger.matches(TriggerType::OnHit, Some("pierce")));
        assert!(!trigger.matches(TriggerType::OnUse, None));
    }

    #[test]
    fn test_category_filter() {
        let trigger = Trigger::new(TriggerType::OnAttack).with_category("slash");
        assert!(trigger.matches(TriggerType::OnAttack, Some("Slash")));
        assert!(!trigger.matches(TriggerType::OnAttack, Some("blunt")));
        assert!(!trigger.matches(TriggerType::OnAttack, None));
    }

    #[test]
    fn test_deserialize_aliases() {
        let trigger: Trigger =
            serde_json::from_str(r#"{"type": "onRoundEnd", "passive": true, "categoryFilter": "slash"}"#).unwrap();
        assert_eq!(trigger.kind, TriggerType::OnRoundEnd);
        assert!(trigger.passive);
        assert_eq!(trigger.category.as_deref(), Some("slash"));

        let trigger: Trigger = toml::from_str(r#"type = "on_use""#).unwrap();
        assert_eq!(trigger, Trigger::new(TriggerType::OnUse));
    }
}
