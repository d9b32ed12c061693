use super::{Amount, EffectDetail, EffectError, EffectKind, EffectTarget, PendingHeal};
use crate::activity::ExecutionContext;
use crate::config::EngineConfig;
use crate::expr::{ActorResolver, Expr};
use crate::host::ActorAccess;
use buff_core::{ActorCombatState, BuffCatalog, StackKey, Timing};
use dice_core::Roller;

/// Everything an effect reads or mutates
pub struct EffectEnv<'a> {
    pub catalog: &'a BuffCatalog,
    pub config: &'a EngineConfig,
    pub actors: &'a mut dyn ActorAccess,
    pub roller: &'a mut dyn Roller,
    pub ctx: &'a mut ExecutionContext,
    /// Activity the effect belongs to, for pending heals and logs
    pub activity_id: &'a str,
}

/// Result of a successful effect
#[derive(Debug)]
pub struct Applied {
    pub detail: EffectDetail,
    pub pending: Option<PendingHeal>,
}

impl From<EffectDetail> for Applied {
    fn from(detail: EffectDetail) -> Self {
        Applied { detail, pending: None }
    }
}

/// A resolved amount, floored, and whether dice were rolled for it
#[derive(Debug, Clone, Copy)]
struct Resolved {
    value: i64,
    rolled: bool,
}

impl Resolved {
    fn layers(self) -> u32 {
        u32::try_from(self.value.max(0)).unwrap_or(u32::MAX)
    }

    fn count(self) -> usize {
        usize::try_from(self.value.max(0)).unwrap_or(usize::MAX)
    }

    fn hp(self) -> i32 {
        self.value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

/// Apply one effect
///
/// Each effect either fully applies its own mutation or leaves state
/// untouched and reports why.
pub fn apply(effect: &EffectKind, env: &mut EffectEnv<'_>) -> Result<Applied, EffectError> {
    match effect {
        EffectKind::AddBuff {
            id,
            layers,
            potency,
            target,
            timing,
        } => {
            let key = StackKey::parse(id);
            if key.is_custom() || !env.catalog.accepts(&key) {
                return Err(EffectError::UnknownCatalogId(id.clone()));
            }
            add_stack(env, key, layers, potency, *target, *timing)
        }
        EffectKind::CustomBuff {
            name,
            layers,
            potency,
            target,
            timing,
        } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(EffectError::InvalidName);
            }
            add_stack(env, StackKey::custom(name), layers, potency, *target, *timing)
        }
        EffectKind::ConsumeBuff { id, layers, target } => {
            let key = StackKey::parse(id);
            if !env.catalog.accepts(&key) {
                return Err(EffectError::UnknownCatalogId(id.clone()));
            }
            let requested = resolve(env, layers)?.layers();
            let actor = target_actor(env, *target)?;
            let available = actor.stack_layers(&key);
            if !actor.consume_stack(&key, requested) {
                return Err(EffectError::InsufficientLayers {
                    key,
                    requested,
                    available,
                });
            }
            Ok(EffectDetail::BuffConsumed {
                actor: actor.id().to_string(),
                key,
                layers: requested,
            }
            .into())
        }
        EffectKind::Heal { amount, target } => {
            let resolved = resolve(env, amount)?;
            let confirm = resolved.rolled && env.config.confirm_dice_heals;
            let activity_id = env.activity_id;
            let actor = target_actor(env, *target)?;
            let requested = resolved.hp().max(0);
            if confirm {
                let pending = PendingHeal::new(actor.id(), requested, activity_id);
                return Ok(Applied {
                    detail: EffectDetail::HealPending {
                        actor: actor.id().to_string(),
                        amount: requested,
                    },
                    pending: Some(pending),
                });
            }
            let applied = actor.heal(requested);
            Ok(EffectDetail::Healed {
                actor: actor.id().to_string(),
                requested,
                applied,
            }
            .into())
        }
        EffectKind::DealDamage { amount, target } => {
            let requested = resolve(env, amount)?.hp().max(0);
            let actor = target_actor(env, *target)?;
            let applied = actor.take_damage(requested);
            Ok(EffectDetail::Damaged {
                actor: actor.id().to_string(),
                requested,
                applied,
            }
            .into())
        }
        EffectKind::ModifyDice { delta } => {
            if env.ctx.dice.is_none() {
                return Err(EffectError::NoDiceContext);
            }
            let delta = resolve(env, delta)?.value;
            let dice = env.ctx.dice.as_mut().ok_or(EffectError::NoDiceContext)?;
            dice.total = dice.total.saturating_add(delta);
            Ok(EffectDetail::DiceModified {
                delta,
                total: dice.total,
            }
            .into())
        }
        EffectKind::RestoreResource { pool, count, target } => {
            let requested = resolve(env, count)?.count();
            let actor = target_actor(env, *target)?;
            let moved = actor.restore_pool(*pool, requested);
            Ok(EffectDetail::ResourceRestored {
                actor: actor.id().to_string(),
                pool: *pool,
                requested,
                moved,
            }
            .into())
        }
        EffectKind::DeductResource { pool, count, target } => {
            let requested = resolve(env, count)?.count();
            let actor = target_actor(env, *target)?;
            let moved = actor.spend_pool(*pool, requested);
            Ok(EffectDetail::ResourceDeducted {
                actor: actor.id().to_string(),
                pool: *pool,
                requested,
                moved,
            }
            .into())
        }
    }
}

fn add_stack(
    env: &mut EffectEnv<'_>,
    key: StackKey,
    layers: &Amount,
    potency: &Amount,
    target: EffectTarget,
    timing: Timing,
) -> Result<Applied, EffectError> {
    let layers = resolve(env, layers)?.layers();
    let potency = resolve(env, potency)?.hp();
    let actor = target_actor(env, target)?;
    let total = actor
        .add_stack(key.clone(), layers, potency, timing)
        .map(|instance| instance.layers)
        .unwrap_or(0);
    Ok(EffectDetail::BuffAdded {
        actor: actor.id().to_string(),
        key,
        layers,
        potency,
        timing,
        total,
    }
    .into())
}

fn target_actor<'e>(env: &'e mut EffectEnv<'_>, target: EffectTarget) -> Result<&'e mut ActorCombatState, EffectError> {
    let id = match target {
        EffectTarget::Source => &env.ctx.source,
        EffectTarget::Opponent => env.ctx.target.as_ref().ok_or(EffectError::MissingTarget)?,
    };
    env.actors
        .actor_mut(id)
        .ok_or_else(|| EffectError::UnknownActor(id.clone()))
}

/// Resolve an amount against the acting actor
///
/// Formula errors fail soft: they are logged and resolve to 0.
fn resolve(env: &mut EffectEnv<'_>, amount: &Amount) -> Result<Resolved, EffectError> {
    let text = match amount {
        Amount::Value(v) => {
            return Ok(Resolved {
                value: v.floor() as i64,
                rolled: false,
            })
        }
        Amount::Formula(text) => text,
    };

    let source = env
        .actors
        .actor(&env.ctx.source)
        .ok_or_else(|| EffectError::UnknownActor(env.ctx.source.clone()))?;
    let mut resolver = ActorResolver::new(source, &mut *env.roller);

    let result = Expr::parse(text).and_then(|tree| Ok((tree.eval(&mut resolver)?, tree.has_dice())));
    match result {
        Ok((value, rolled)) => Ok(Resolved {
            value: value.floor() as i64,
            rolled,
        }),
        Err(error) => {
            tracing::warn!(expression = %text, %error, "expression evaluation failed, using 0");
            Ok(Resolved { value: 0, rolled: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{DiceContext, TriggerType};
    use crate::host::Roster;
    use buff_core::{builtin_catalog, PoolKind, PooledResource};
    use dice_core::{DiceFormula, FixedRoller};

    struct Fixture {
        roster: Roster,
        roller: FixedRoller,
        config: EngineConfig,
        ctx: ExecutionContext,
    }

    impl Fixture {
        fn new() -> Self {
            let hero = ActorCombatState::new("hero", 30)
                .with_current_hp(10)
                .with_pools(PooledResource::new(3, 2));
            let foe = ActorCombatState::new("foe", 20);
            Fixture {
                roster: Roster::new().with(hero).with(foe),
                roller: FixedRoller(4),
                config: EngineConfig::default(),
                ctx: ExecutionContext::new("hero", TriggerType::OnUse).with_target("foe"),
            }
        }

        fn run(&mut self, effect: EffectKind) -> Result<Applied, EffectError> {
            let mut env = EffectEnv {
                catalog: builtin_catalog(),
                config: &self.config,
                actors: &mut self.roster,
                roller: &mut self.roller,
                ctx: &mut self.ctx,
                activity_id: "test",
            };
            apply(&effect, &mut env)
        }

        fn hero(&self) -> &ActorCombatState {
            self.roster.get("hero").unwrap()
        }

        fn foe(&self) -> &ActorCombatState {
            self.roster.get("foe").unwrap()
        }
    }

    fn add_buff(id: &str, layers: impl Into<Amount>, target: EffectTarget) -> EffectKind {
        EffectKind::AddBuff {
            id: id.into(),
            layers: layers.into(),
            potency: Amount::default(),
            target,
            timing: Timing::Current,
        }
    }

    #[test]
    fn test_add_buff_merges() {
        let mut fx = Fixture::new();
        fx.run(add_buff("strong", 2, EffectTarget::Source)).unwrap();
        let applied = fx.run(add_buff("strong", "1+1", EffectTarget::Source)).unwrap();
        assert!(matches!(applied.detail, EffectDetail::BuffAdded { layers: 2, total: 4, .. }));
        assert_eq!(fx.hero().stack_layers(&StackKey::known("strong")), 4);
    }

    #[test]
    fn test_add_buff_unknown_id_does_nothing() {
        let mut fx = Fixture::new();
        let result = fx.run(add_buff("mystery", 2, EffectTarget::Source));
        assert_eq!(result.unwrap_err(), EffectError::UnknownCatalogId("mystery".into()));
        assert!(fx.hero().stacks().is_empty());
    }

    #[test]
    fn test_add_buff_to_opponent() {
        let mut fx = Fixture::new();
        fx.run(add_buff("weak", 1, EffectTarget::Opponent)).unwrap();
        assert_eq!(fx.foe().stack_layers(&StackKey::known("weak")), 1);

        fx.ctx.target = None;
        let result = fx.run(add_buff("weak", 1, EffectTarget::Opponent));
        assert_eq!(result.unwrap_err(), EffectError::MissingTarget);
    }

    #[test]
    fn test_formula_reads_source_layers() {
        let mut fx = Fixture::new();
        fx.run(add_buff("charge", 10, EffectTarget::Source)).unwrap();
        fx.run(add_buff("bleed", "floor({charge.layers}/4)", EffectTarget::Opponent))
            .unwrap();
        assert_eq!(fx.foe().stack_layers(&StackKey::known("bleed")), 2);
    }

    #[test]
    fn test_negative_layers_resolve_to_zero() {
        let mut fx = Fixture::new();
        let applied = fx.run(add_buff("strong", -3, EffectTarget::Source)).unwrap();
        assert!(matches!(applied.detail, EffectDetail::BuffAdded { layers: 0, total: 0, .. }));
        assert!(fx.hero().get_stack(&StackKey::known("strong")).is_none());
    }

    #[test]
    fn test_consume_buff_atomic() {
        let mut fx = Fixture::new();
        fx.run(add_buff("charge", 2, EffectTarget::Source)).unwrap();
        let consume = |layers: i32| EffectKind::ConsumeBuff {
            id: "charge".into(),
            layers: layers.into(),
            target: EffectTarget::Source,
        };
        let err = fx.run(consume(3)).unwrap_err();
        assert!(matches!(err, EffectError::InsufficientLayers { requested: 3, available: 2, .. }));
        assert_eq!(fx.hero().stack_layers(&StackKey::known("charge")), 2);

        fx.run(consume(2)).unwrap();
        assert!(fx.hero().get_stack(&StackKey::known("charge")).is_none());
    }

    #[test]
    fn test_flat_heal_applies_immediately() {
        let mut fx = Fixture::new();
        let applied = fx
            .run(EffectKind::Heal {
                amount: 50.into(),
                target: EffectTarget::Source,
            })
            .unwrap();
        assert!(applied.pending.is_none());
        assert!(matches!(applied.detail, EffectDetail::Healed { requested: 50, applied: 20, .. }));
        assert_eq!(fx.hero().health().current, 30);
    }

    #[test]
    fn test_dice_heal_waits_for_confirmation() {
        let mut fx = Fixture::new();
        let applied = fx
            .run(EffectKind::Heal {
                amount: "2d6+1".into(),
                target: EffectTarget::Source,
            })
            .unwrap();
        let pending = applied.pending.unwrap();
        // FixedRoller(4): 4 + 4 + 1
        assert_eq!(pending.amount(), 9);
        assert_eq!(fx.hero().health().current, 10);

        assert_eq!(pending.confirm(&mut fx.roster), Ok(9));
        assert_eq!(fx.hero().health().current, 19);
    }

    #[test]
    fn test_dice_heal_without_confirmation() {
        let mut fx = Fixture::new();
        fx.config.confirm_dice_heals = false;
        let applied = fx
            .run(EffectKind::Heal {
                amount: "1d6".into(),
                target: EffectTarget::Source,
            })
            .unwrap();
        assert!(applied.pending.is_none());
        assert_eq!(fx.hero().health().current, 14);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut fx = Fixture::new();
        let applied = fx
            .run(EffectKind::DealDamage {
                amount: 25.into(),
                target: EffectTarget::Opponent,
            })
            .unwrap();
        assert!(matches!(applied.detail, EffectDetail::Damaged { requested: 25, applied: 20, .. }));
        assert_eq!(fx.foe().health().current, 0);
    }

    #[test]
    fn test_modify_dice() {
        let mut fx = Fixture::new();
        let effect = EffectKind::ModifyDice { delta: 2.into() };
        assert_eq!(fx.run(effect.clone()).unwrap_err(), EffectError::NoDiceContext);

        fx.ctx.dice = Some(DiceContext::new(DiceFormula::new(1, 20), 11));
        fx.run(effect).unwrap();
        assert_eq!(fx.ctx.dice.as_ref().map(|d| d.total), Some(13));
    }

    #[test]
    fn test_pool_effects_move_partial() {
        let mut fx = Fixture::new();
        let deduct = EffectKind::DeductResource {
            pool: PoolKind::Bonus,
            count: 5.into(),
            target: EffectTarget::Source,
        };
        let applied = fx.run(deduct).unwrap();
        assert!(matches!(applied.detail, EffectDetail::ResourceDeducted { requested: 5, moved: 2, .. }));
        assert_eq!(fx.hero().available(PoolKind::Bonus), 0);

        let restore = EffectKind::RestoreResource {
            pool: PoolKind::Bonus,
            count: 1.into(),
            target: EffectTarget::Source,
        };
        fx.run(restore).unwrap();
        assert_eq!(fx.hero().pools().slots(PoolKind::Bonus), &[false, true]);
    }

    #[test]
    fn test_custom_buff_keys_on_name() {
        let mut fx = Fixture::new();
        let custom = |name: &str| EffectKind::CustomBuff {
            name: name.into(),
            layers: 2.into(),
            potency: 1.into(),
            target: EffectTarget::Source,
            timing: Timing::Current,
        };
        fx.run(custom("Resolve")).unwrap();
        fx.run(custom("Resolve")).unwrap();
        fx.run(custom("Grit")).unwrap();
        assert_eq!(fx.hero().stack_layers(&StackKey::custom("Resolve")), 4);
        assert_eq!(fx.hero().stack_potency(&StackKey::custom("Resolve")), 2);
        assert_eq!(fx.hero().stack_layers(&StackKey::custom("Grit")), 2);
        assert_eq!(fx.run(custom("  ")).unwrap_err(), EffectError::InvalidName);
    }

    #[test]
    fn test_bad_formula_contributes_nothing() {
        let mut fx = Fixture::new();
        let applied = fx
            .run(EffectKind::DealDamage {
                amount: "process.exit()".into(),
                target: EffectTarget::Opponent,
            })
            .unwrap();
        assert!(matches!(applied.detail, EffectDetail::Damaged { applied: 0, .. }));
        assert_eq!(fx.foe().health().current, 20);
    }
}
