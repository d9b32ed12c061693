//! Activity orchestrator
//!
//! One invocation walks trigger, usage, conditions, consumption and effects
//! in that order, stopping at the first stage that fails. Usage is counted
//! only after the effects ran without a critical failure.

mod outcome;

pub use outcome::{ActivityFailure, ActivityOutcome, EffectReport, OutcomeStatus};

use crate::activity::{Activity, ExecutionContext};
use crate::condition::{self, ConditionScope};
use crate::config::EngineConfig;
use crate::consume;
use crate::effect::{self, EffectEnv, EffectError, PendingHeal};
use crate::host::{ActorAccess, Host};
use buff_core::{builtin_catalog, BuffCatalog, RoundReport};

/// Runs activities against host-owned actor state
#[derive(Debug, Clone)]
pub struct RuleEngine {
    catalog: BuffCatalog,
    config: EngineConfig,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RuleEngine {
    pub fn new(catalog: BuffCatalog, config: EngineConfig) -> Self {
        RuleEngine { catalog, config }
    }

    /// Built-in catalog and default config
    pub fn with_defaults() -> Self {
        Self::new(builtin_catalog().clone(), EngineConfig::default())
    }

    pub fn catalog(&self) -> &BuffCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one activity
    ///
    /// The outcome is shown through the presenter unless the trigger did
    /// not match.
    pub fn invoke(&self, activity: &Activity, mut ctx: ExecutionContext, host: &mut Host<'_>) -> ActivityOutcome {
        let outcome = self.run(activity, &mut ctx, host);
        match &outcome.status {
            OutcomeStatus::Skipped => {
                tracing::trace!(activity = %activity.id, trigger = %ctx.trigger, "trigger mismatch");
            }
            OutcomeStatus::Completed => {
                tracing::info!(activity = %activity.id, source = %ctx.source, effects = outcome.effects.len(), "activity completed");
                host.presenter.present(&outcome);
            }
            OutcomeStatus::Failed(failure) => {
                tracing::info!(activity = %activity.id, source = %ctx.source, %failure, "activity failed");
                host.presenter.present(&outcome);
            }
        }
        outcome
    }

    /// Fire every passive activity whose trigger matches the event
    ///
    /// Activities run in order; a failure never stops the rest of the batch.
    /// Non-passive and non-matching activities are left out of the result.
    pub fn dispatch<'a>(
        &self,
        activities: impl IntoIterator<Item = &'a Activity>,
        event: &ExecutionContext,
        host: &mut Host<'_>,
    ) -> Vec<ActivityOutcome> {
        activities
            .into_iter()
            .filter(|a| a.trigger.passive && a.trigger.matches(event.trigger, event.attack_category.as_deref()))
            .map(|a| self.invoke(a, event.clone(), host))
            .collect()
    }

    /// End-of-round reconciliation for one actor
    pub fn advance_round(&self, actor_id: &str, actors: &mut dyn ActorAccess) -> Option<RoundReport> {
        let actor = actors.actor_mut(actor_id)?;
        Some(buff_core::advance_round(actor, &self.catalog))
    }

    /// Apply a heal that was waiting for confirmation
    pub fn confirm_heal(&self, pending: PendingHeal, actors: &mut dyn ActorAccess) -> Result<i32, EffectError> {
        pending.confirm(actors)
    }

    fn run(&self, activity: &Activity, ctx: &mut ExecutionContext, host: &mut Host<'_>) -> ActivityOutcome {
        let mut outcome = ActivityOutcome::new(activity.id.as_str(), activity.name.as_str());

        if !activity.trigger.matches(ctx.trigger, ctx.attack_category.as_deref()) {
            outcome.status = OutcomeStatus::Skipped;
            return outcome;
        }

        let Some(source) = host.actors.actor(&ctx.source) else {
            return outcome.failed(ActivityFailure::UnknownActor(ctx.source.clone()));
        };

        tracing::debug!(activity = %activity.id, "usage check");
        if let Some(scope) =
            activity
                .usage_limit
                .exceeded(source.usage(&activity.id), ctx.round, ctx.combat_id.as_deref())
        {
            return outcome.failed(ActivityFailure::UsageLimitExceeded(scope));
        }

        tracing::debug!(activity = %activity.id, count = activity.conditions.len(), "condition check");
        let scope = ConditionScope {
            source,
            target: ctx.target.as_deref().and_then(|id| host.actors.actor(id)),
            policy: self.config.unknown_condition_policy,
        };
        if let Err(index) = condition::check_all(&activity.conditions, &scope, &mut *host.roller) {
            return outcome.failed(ActivityFailure::ConditionNotMet {
                index,
                description: activity.conditions[index].to_string(),
            });
        }

        tracing::debug!(activity = %activity.id, mode = ?activity.consume.mode, "consume");
        let Some(source) = host.actors.actor_mut(&ctx.source) else {
            return outcome.failed(ActivityFailure::UnknownActor(ctx.source.clone()));
        };
        let names = (activity.id.as_str(), activity.name.as_str());
        let payment = match consume::resolve(&activity.consume, source, &mut *host.presenter, names) {
            Ok(payment) => payment,
            Err(failure) => return outcome.failed(failure),
        };
        ctx.consumed = payment.paid;
        ctx.selected_option = payment.selected;
        outcome.consumed = ctx.consumed.clone();
        outcome.selected_option = ctx.selected_option;

        tracing::debug!(activity = %activity.id, count = activity.effects.len(), "effects");
        let mut env = EffectEnv {
            catalog: &self.catalog,
            config: &self.config,
            actors: &mut *host.actors,
            roller: &mut *host.roller,
            ctx: &mut *ctx,
            activity_id: &activity.id,
        };
        for (index, spec) in activity.effects.iter().enumerate() {
            let kind = spec.kind.name();
            let result = match effect::apply(&spec.kind, &mut env) {
                Ok(applied) => {
                    tracing::info!(activity = %activity.id, index, effect = kind, detail = %applied.detail, "effect applied");
                    outcome.pending_heals.extend(applied.pending);
                    Ok(applied.detail)
                }
                Err(error) => {
                    tracing::warn!(activity = %activity.id, index, effect = kind, critical = spec.critical, %error, "effect failed");
                    Err(error)
                }
            };
            let mut halt = false;
            if let (true, Err(error)) = (spec.critical, &result) {
                outcome.status = OutcomeStatus::Failed(ActivityFailure::CriticalEffectFailed {
                    index,
                    kind,
                    error: error.clone(),
                });
                halt = true;
            }
            outcome.effects.push(EffectReport {
                index,
                kind,
                critical: spec.critical,
                result,
            });
            if halt {
                break;
            }
        }
        outcome.dice = ctx.dice.clone();

        if outcome.is_success() {
            tracing::debug!(activity = %activity.id, "usage update");
            if let Some(source) = host.actors.actor_mut(&ctx.source) {
                source.record_usage(&activity.id, ctx.round, ctx.combat_id.as_deref());
            }
        }
        outcome
    }
}
