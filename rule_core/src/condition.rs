//! Condition evaluation - side-effect free predicates gating an activity

use crate::config::UnknownConditionPolicy;
use crate::expr::{self, ActorResolver};
use buff_core::{ActorCombatState, PoolKind, StackKey};
use dice_core::Roller;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which actor a predicate inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Subject {
    #[default]
    #[serde(rename = "self", alias = "source")]
    Source,
    #[serde(rename = "target", alias = "opponent")]
    Target,
}

/// Comparison used by counting predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Eq => (lhs - rhs).abs() < f64::EPSILON,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        };
        write!(f, "{}", symbol)
    }
}

/// A single predicate; an activity's list is AND-combined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// The stack is present with at least one active layer
    #[serde(alias = "hasBuff")]
    HasBuff {
        #[serde(default)]
        target: Subject,
        id: String,
    },
    /// Compare active layers of a stack
    #[serde(alias = "buffLayer")]
    BuffLayer {
        #[serde(default)]
        target: Subject,
        id: String,
        operator: CompareOp,
        value: f64,
    },
    /// Compare unspent pooled-resource slots
    #[serde(alias = "resourceCount")]
    ResourceCount {
        #[serde(default)]
        target: Subject,
        pool: PoolKind,
        operator: CompareOp,
        value: f64,
    },
    /// Compare `100 * current / max` HP
    #[serde(alias = "healthPercent")]
    HealthPercent {
        #[serde(default)]
        target: Subject,
        operator: CompareOp,
        value: f64,
    },
    /// True when the expression evaluates above zero
    #[serde(alias = "customExpression")]
    CustomExpression { expression: String },
    /// Any `type` this build does not know
    #[serde(other)]
    Unrecognized,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::HasBuff { id, .. } => write!(f, "has {}", id),
            Condition::BuffLayer { id, operator, value, .. } => {
                write!(f, "{} layers {} {}", id, operator, value)
            }
            Condition::ResourceCount { pool, operator, value, .. } => {
                write!(f, "{} slots {} {}", pool, operator, value)
            }
            Condition::HealthPercent { operator, value, .. } => write!(f, "health% {} {}", operator, value),
            Condition::CustomExpression { expression } => write!(f, "{} > 0", expression),
            Condition::Unrecognized => write!(f, "unrecognized condition"),
        }
    }
}

/// The actors a condition list is checked against
pub struct ConditionScope<'a> {
    pub source: &'a ActorCombatState,
    pub target: Option<&'a ActorCombatState>,
    pub policy: UnknownConditionPolicy,
}

impl<'a> ConditionScope<'a> {
    fn subject(&self, subject: Subject) -> Option<&'a ActorCombatState> {
        match subject {
            Subject::Source => Some(self.source),
            Subject::Target => self.target,
        }
    }
}

impl Condition {
    /// Evaluate one predicate; a missing target makes it false
    pub fn check(&self, scope: &ConditionScope<'_>, roller: &mut dyn Roller) -> bool {
        match self {
            Condition::HasBuff { target, id } => scope
                .subject(*target)
                .is_some_and(|actor| actor.stack_layers(&StackKey::parse(id)) > 0),
            Condition::BuffLayer {
                target,
                id,
                operator,
                value,
            } => scope
                .subject(*target)
                .is_some_and(|actor| operator.compare(actor.stack_layers(&StackKey::parse(id)) as f64, *value)),
            Condition::ResourceCount {
                target,
                pool,
                operator,
                value,
            } => scope
                .subject(*target)
                .is_some_and(|actor| operator.compare(actor.available(*pool) as f64, *value)),
            Condition::HealthPercent {
                target,
                operator,
                value,
            } => scope
                .subject(*target)
                .is_some_and(|actor| operator.compare(actor.health_percent(), *value)),
            Condition::CustomExpression { expression } => {
                let mut resolver = ActorResolver::new(scope.source, roller);
                expr::evaluate(expression, &mut resolver) > 0.0
            }
            Condition::Unrecognized => {
                let allowed = scope.policy == UnknownConditionPolicy::Allow;
                tracing::warn!(allowed, "unrecognized condition type");
                allowed
            }
        }
    }
}

/// Check every condition in order; returns the index of the first failure
pub fn check_all(conditions: &[Condition], scope: &ConditionScope<'_>, roller: &mut dyn Roller) -> Result<(), usize> {
    for (index, condition) in conditions.iter().enumerate() {
        if !condition.check(scope, roller) {
            return Err(index);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buff_core::{PooledResource, Timing};
    use dice_core::FixedRoller;

    fn hero() -> ActorCombatState {
        let mut hero = ActorCombatState::new("hero", 40)
            .with_current_hp(10)
            .with_pools(PooledResource::new(3, 1));
        hero.add_stack(StackKey::known("strong"), 3, 0, Timing::Current);
        hero.add_stack(StackKey::known("guard"), 2, 0, Timing::Next);
        hero.spend_pool(PoolKind::Primary, 1);
        hero
    }

    fn check(condition: Condition, source: &ActorCombatState, target: Option<&ActorCombatState>) -> bool {
        let scope = ConditionScope {
            source,
            target,
            policy: UnknownConditionPolicy::Deny,
        };
        condition.check(&scope, &mut FixedRoller(1))
    }

    #[test]
    fn test_has_buff() {
        let hero = hero();
        let has = |id: &str| Condition::HasBuff {
            target: Subject::Source,
            id: id.to_string(),
        };
        assert!(check(has("strong"), &hero, None));
        // Next-round stacks are not active yet
        assert!(!check(has("guard"), &hero, None));
        assert!(!check(has("burn"), &hero, None));
    }

    #[test]
    fn test_buff_layer_operators() {
        let hero = hero();
        let layer = |operator, value| Condition::BuffLayer {
            target: Subject::Source,
            id: "strong".into(),
            operator,
            value,
        };
        assert!(check(layer(CompareOp::Eq, 3.0), &hero, None));
        assert!(check(layer(CompareOp::Ge, 3.0), &hero, None));
        assert!(check(layer(CompareOp::Gt, 2.0), &hero, None));
        assert!(!check(layer(CompareOp::Lt, 3.0), &hero, None));
        assert!(check(layer(CompareOp::Le, 3.0), &hero, None));
    }

    #[test]
    fn test_resource_count_uses_available_slots() {
        let hero = hero();
        let cond = Condition::ResourceCount {
            target: Subject::Source,
            pool: PoolKind::Primary,
            operator: CompareOp::Eq,
            value: 2.0,
        };
        assert!(check(cond, &hero, None));
    }

    #[test]
    fn test_health_percent_on_target() {
        let hero = hero();
        let foe = ActorCombatState::new("foe", 100).with_current_hp(80);
        let cond = Condition::HealthPercent {
            target: Subject::Target,
            operator: CompareOp::Ge,
            value: 50.0,
        };
        assert!(check(cond.clone(), &hero, Some(&foe)));
        // No target selected
        assert!(!check(cond, &hero, None));
    }

    #[test]
    fn test_custom_expression() {
        let hero = hero();
        let cond = |e: &str| Condition::CustomExpression { expression: e.into() };
        assert!(check(cond("{strong.layers} - 2"), &hero, None));
        assert!(!check(cond("{strong.layers} - 3"), &hero, None));
        assert!(!check(cond("import(1)"), &hero, None));
    }

    #[test]
    fn test_unrecognized_policy() {
        let hero = hero();
        let deny = ConditionScope {
            source: &hero,
            target: None,
            policy: UnknownConditionPolicy::Deny,
        };
        let allow = ConditionScope {
            policy: UnknownConditionPolicy::Allow,
            ..deny
        };
        assert!(!Condition::Unrecognized.check(&deny, &mut FixedRoller(1)));
        assert!(Condition::Unrecognized.check(&allow, &mut FixedRoller(1)));
    }

    #[test]
    fn test_check_all() {
        let hero = hero();
        let scope = ConditionScope {
            source: &hero,
            target: None,
            policy: UnknownConditionPolicy::Deny,
        };
        assert!(check_all(&[], &scope, &mut FixedRoller(1)).is_ok());

        let conditions = vec![
            Condition::HasBuff {
                target: Subject::Source,
                id: "strong".into(),
            },
            Condition::HasBuff {
                target: Subject::Source,
                id: "burn".into(),
            },
        ];
        assert_eq!(check_all(&conditions, &scope, &mut FixedRoller(1)), Err(1));
    }

    #[test]
    fn test_deserialize_unknown_type() {
        let json = r#"[{"type": "has_buff", "id": "strong"}, {"type": "moon_phase", "phase": 3}]"#;
        let conditions: Vec<Condition> = serde_json::from_str(json).unwrap();
        assert_eq!(conditions[1], Condition::Unrecognized);
        assert_eq!(
            conditions[0],
            Condition::HasBuff {
                target: Subject::Source,
                id: "strong".into()
            }
        );
    }
}
