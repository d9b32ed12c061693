//! Consumption resolution - validating and paying activity costs
//!
//! Every requirement (mandatory part plus the chosen alternative) is
//! validated together before anything is deducted, so a failure or a
//! cancelled choice never leaves a partial payment behind.

use crate::engine::ActivityFailure;
use crate::host::{ChoiceOption, ChoicePrompt, ChoiceResponse, Presenter};
use buff_core::{ActorCombatState, PoolKind, StackKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single resource requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceCost {
    /// N active layers of a stack (`"custom:Name"` for custom stacks)
    Stack { id: String, layers: u32 },
    /// N unspent slots of a pool
    Pool { pool: PoolKind, count: u32 },
}

impl ResourceCost {
    pub fn stack(id: impl Into<String>, layers: u32) -> Self {
        ResourceCost::Stack { id: id.into(), layers }
    }

    pub fn pool(pool: PoolKind, count: u32) -> Self {
        ResourceCost::Pool { pool, count }
    }
}

impl fmt::Display for ResourceCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceCost::Stack { id, layers } => write!(f, "{} x{}", id, layers),
            ResourceCost::Pool { pool, count } => write!(f, "{} slot x{}", pool, count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeMode {
    #[default]
    None,
    Mandatory,
    Optional,
}

/// What an activity costs
///
/// `resources` are paid in both `mandatory` and `optional` mode; in
/// `optional` mode exactly one of `options` is paid on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConsumeSpec {
    #[serde(default)]
    pub mode: ConsumeMode,
    #[serde(default)]
    pub resources: Vec<ResourceCost>,
    #[serde(default)]
    pub options: Vec<Vec<ResourceCost>>,
}

impl ConsumeSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn mandatory(resources: Vec<ResourceCost>) -> Self {
        ConsumeSpec {
            mode: ConsumeMode::Mandatory,
            resources,
            options: Vec::new(),
        }
    }

    pub fn optional(options: Vec<Vec<ResourceCost>>) -> Self {
        ConsumeSpec {
            mode: ConsumeMode::Optional,
            resources: Vec::new(),
            options,
        }
    }

    pub fn with_resources(mut self, resources: Vec<ResourceCost>) -> Self {
        self.resources = resources;
        self
    }
}

/// What was paid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payment {
    pub paid: Vec<ResourceCost>,
    /// Index of the alternative that was paid, if any
    pub selected: Option<usize>,
}

impl Payment {
    pub fn is_empty(&self) -> bool {
        self.paid.is_empty()
    }
}

/// Totals per stack / pool, so overlapping requirements are counted once
#[derive(Debug, Default)]
struct Demand {
    stacks: HashMap<StackKey, u32>,
    pools: HashMap<PoolKind, usize>,
}

impl Demand {
    fn of<'a>(costs: impl IntoIterator<Item = &'a ResourceCost>) -> Self {
        let mut demand = Demand::default();
        for cost in costs {
            match cost {
                ResourceCost::Stack { id, layers } => {
                    let total = demand.stacks.entry(StackKey::parse(id)).or_insert(0);
                    *total = total.saturating_add(*layers);
                }
                ResourceCost::Pool { pool, count } => {
                    let total = demand.pools.entry(*pool).or_insert(0);
                    *total = total.saturating_add(*count as usize);
                }
            }
        }
        demand
    }

    /// First requirement the actor cannot cover
    fn shortfall(&self, actor: &ActorCombatState) -> Option<String> {
        let mut stacks: Vec<_> = self.stacks.iter().collect();
        stacks.sort();
        for (key, needed) in stacks {
            let have = actor.stack_layers(key);
            if have < *needed {
                return Some(format!("{} ({} of {} layers)", key, have, needed));
            }
        }
        for kind in [PoolKind::Primary, PoolKind::Bonus] {
            let needed = self.pools.get(&kind).copied().unwrap_or(0);
            let have = actor.available(kind);
            if have < needed {
                return Some(format!("{} slots ({} of {})", kind, have, needed));
            }
        }
        None
    }
}

/// Whether the actor can pay all of the given costs together
pub fn can_afford<'a>(actor: &ActorCombatState, costs: impl IntoIterator<Item = &'a ResourceCost>) -> bool {
    Demand::of(costs).shortfall(actor).is_none()
}

/// Validate, choose and pay an activity's costs
pub fn resolve(
    spec: &ConsumeSpec,
    actor: &mut ActorCombatState,
    presenter: &mut dyn Presenter,
    activity: (&str, &str),
) -> Result<Payment, ActivityFailure> {
    if spec.mode == ConsumeMode::None {
        return Ok(Payment::default());
    }

    let mandatory = &spec.resources;
    if let Some(missing) = Demand::of(mandatory).shortfall(actor) {
        return Err(ActivityFailure::InsufficientResource(missing));
    }

    let mut selected = None;
    if spec.mode == ConsumeMode::Optional {
        let view: &ActorCombatState = actor;
        let affordable: Vec<ChoiceOption> = spec
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| can_afford(view, mandatory.iter().chain(option.iter())))
            .map(|(index, option)| ChoiceOption {
                index,
                costs: option.clone(),
            })
            .collect();

        selected = Some(match affordable.len() {
            0 => {
                return Err(ActivityFailure::InsufficientResource(
                    "no affordable option".to_string(),
                ))
            }
            1 => affordable[0].index,
            _ => {
                let prompt = ChoicePrompt {
                    activity_id: activity.0.to_string(),
                    activity_name: activity.1.to_string(),
                    actor_id: actor.id().to_string(),
                    options: affordable,
                };
                match presenter.choose_option(&prompt) {
                    ChoiceResponse::Selected(index) if prompt.options.iter().any(|o| o.index == index) => index,
                    ChoiceResponse::Selected(index) => return Err(ActivityFailure::InvalidSelection(index)),
                    ChoiceResponse::Cancelled | ChoiceResponse::TimedOut => return Err(ActivityFailure::UserCancelled),
                }
            }
        });
    }

    let paid: Vec<ResourceCost> = mandatory
        .iter()
        .chain(selected.map(|i| spec.options[i].iter()).into_iter().flatten())
        .cloned()
        .collect();

    // Validated above; re-check against the combined demand before touching state
    if let Some(missing) = Demand::of(&paid).shortfall(actor) {
        return Err(ActivityFailure::InsufficientResource(missing));
    }
    deduct(actor, &paid)?;

    Ok(Payment { paid, selected })
}

fn deduct(actor: &mut ActorCombatState, costs: &[ResourceCost]) -> Result<(), ActivityFailure> {
    for cost in costs {
        let paid = match cost {
            ResourceCost::Stack { id, layers } => actor.consume_stack(&StackKey::parse(id), *layers),
            ResourceCost::Pool { pool, count } => actor.try_spend_pool(*pool, *count as usize),
        };
        if !paid {
            return Err(ActivityFailure::InsufficientResource(cost.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedPresenter;
    use buff_core::{PooledResource, Timing};

    const ACTIVITY: (&str, &str) = ("test.act", "Test");

    fn actor_with(id: &str, layers: u32) -> ActorCombatState {
        let mut actor = ActorCombatState::new("hero", 10).with_pools(PooledResource::new(3, 1));
        actor.add_stack(StackKey::known(id), layers, 0, Timing::Current);
        actor
    }

    #[test]
    fn test_none_mode_is_free() {
        let mut actor = actor_with("x", 1);
        let payment = resolve(&ConsumeSpec::none(), &mut actor, &mut ScriptedPresenter::new(), ACTIVITY).unwrap();
        assert!(payment.is_empty());
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 1);
    }

    #[test]
    fn test_mandatory_exact_layers() {
        let mut actor = actor_with("x", 3);
        let spec = ConsumeSpec::mandatory(vec![ResourceCost::stack("x", 3)]);
        let payment = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY).unwrap();
        assert_eq!(payment.paid, vec![ResourceCost::stack("x", 3)]);
        assert!(actor.get_stack(&StackKey::known("x")).is_none());
    }

    #[test]
    fn test_mandatory_short_leaves_state() {
        let mut actor = actor_with("x", 2);
        let spec = ConsumeSpec::mandatory(vec![ResourceCost::pool(PoolKind::Primary, 1), ResourceCost::stack("x", 3)]);
        let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);
        assert!(matches!(result, Err(ActivityFailure::InsufficientResource(_))));
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 2);
        assert_eq!(actor.available(PoolKind::Primary), 3);
    }

    #[test]
    fn test_overlapping_requirements_are_summed() {
        let mut actor = actor_with("x", 3);
        let spec = ConsumeSpec::mandatory(vec![ResourceCost::stack("x", 2), ResourceCost::stack("x", 2)]);
        let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);
        assert!(result.is_err());
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 3);
    }

    #[test]
    fn test_pool_spends_lowest_slots() {
        let mut actor = actor_with("x", 0);
        let spec = ConsumeSpec::mandatory(vec![ResourceCost::pool(PoolKind::Primary, 2)]);
        resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY).unwrap();
        assert_eq!(actor.pools().slots(PoolKind::Primary), &[true, true, false]);
    }

    #[test]
    fn test_single_affordable_option_auto_selects() {
        let mut actor = actor_with("x", 1);
        let spec = ConsumeSpec::optional(vec![
            vec![ResourceCost::stack("x", 5)],
            vec![ResourceCost::pool(PoolKind::Bonus, 1)],
        ]);
        let mut presenter = ScriptedPresenter::new();
        let payment = resolve(&spec, &mut actor, &mut presenter, ACTIVITY).unwrap();

        assert_eq!(payment.selected, Some(1));
        assert!(presenter.prompts.is_empty());
        assert_eq!(actor.available(PoolKind::Bonus), 0);
    }

    #[test]
    fn test_multiple_options_wait_for_choice() {
        let mut actor = actor_with("x", 2);
        let spec = ConsumeSpec::optional(vec![
            vec![ResourceCost::stack("x", 2)],
            vec![ResourceCost::pool(PoolKind::Primary, 1), ResourceCost::pool(PoolKind::Bonus, 1)],
        ]);
        let mut presenter = ScriptedPresenter::answering([ChoiceResponse::Selected(1)]);
        let payment = resolve(&spec, &mut actor, &mut presenter, ACTIVITY).unwrap();

        assert_eq!(presenter.prompts.len(), 1);
        assert_eq!(presenter.prompts[0].options.len(), 2);
        assert_eq!(payment.selected, Some(1));
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 2);
        assert_eq!(actor.available(PoolKind::Primary), 2);
        assert_eq!(actor.available(PoolKind::Bonus), 0);
    }

    #[test]
    fn test_cancel_deducts_nothing() {
        let mut actor = actor_with("x", 2);
        let spec = ConsumeSpec::optional(vec![
            vec![ResourceCost::stack("x", 1)],
            vec![ResourceCost::pool(PoolKind::Primary, 1)],
        ])
        .with_resources(vec![ResourceCost::pool(PoolKind::Bonus, 1)]);

        for response in [ChoiceResponse::Cancelled, ChoiceResponse::TimedOut] {
            let mut presenter = ScriptedPresenter::answering([response]);
            let result = resolve(&spec, &mut actor, &mut presenter, ACTIVITY);
            assert!(matches!(result, Err(ActivityFailure::UserCancelled)));
        }
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 2);
        assert_eq!(actor.available(PoolKind::Primary), 3);
        assert_eq!(actor.available(PoolKind::Bonus), 1);
    }

    #[test]
    fn test_selection_outside_offer_is_rejected() {
        let mut actor = actor_with("x", 2);
        let spec = ConsumeSpec::optional(vec![
            vec![ResourceCost::stack("x", 1)],
            vec![ResourceCost::pool(PoolKind::Primary, 1)],
            vec![ResourceCost::stack("x", 9)],
        ]);
        let mut presenter = ScriptedPresenter::answering([ChoiceResponse::Selected(2)]);
        let result = resolve(&spec, &mut actor, &mut presenter, ACTIVITY);
        assert!(matches!(result, Err(ActivityFailure::InvalidSelection(2))));
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 2);
    }

    #[test]
    fn test_mandatory_and_optional_validate_together() {
        // 3 layers: mandatory 2 plus option 2 would overdraw, so only the pool option fits
        let mut actor = actor_with("x", 3);
        let spec = ConsumeSpec::optional(vec![
            vec![ResourceCost::stack("x", 2)],
            vec![ResourceCost::pool(PoolKind::Primary, 1)],
        ])
        .with_resources(vec![ResourceCost::stack("x", 2)]);
        let mut presenter = ScriptedPresenter::new();
        let payment = resolve(&spec, &mut actor, &mut presenter, ACTIVITY).unwrap();

        assert_eq!(payment.selected, Some(1));
        assert!(presenter.prompts.is_empty());
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 1);
        assert_eq!(actor.available(PoolKind::Primary), 2);
    }

    #[test]
    fn test_optional_without_options_fails() {
        let mut actor = actor_with("x", 3);
        let spec = ConsumeSpec::optional(Vec::new()).with_resources(vec![ResourceCost::stack("x", 1)]);
        let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);
        assert!(matches!(result, Err(ActivityFailure::InsufficientResource(_))));
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 3);
    }

    #[test]
    fn test_huge_costs_do_not_overflow() {
        let mut actor = actor_with("x", 3);
        let spec = ConsumeSpec::mandatory(vec![
            ResourceCost::stack("x", u32::MAX),
            ResourceCost::stack("x", u32::MAX),
            ResourceCost::pool(PoolKind::Bonus, u32::MAX),
            ResourceCost::pool(PoolKind::Bonus, u32::MAX),
        ]);
        let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);
        assert!(matches!(result, Err(ActivityFailure::InsufficientResource(_))));
        assert_eq!(actor.stack_layers(&StackKey::known("x")), 3);
    }

    #[test]
    fn test_mandatory_after_decay_split_pays_in_full() {
        let mut actor = actor_with("bleed", 3);
        actor.add_stack(StackKey::known("bleed"), 2, 0, Timing::Next);
        buff_core::advance_round(&mut actor, buff_core::builtin_catalog());
        assert_eq!(actor.stack_layers(&StackKey::known("bleed")), 4);

        let spec = ConsumeSpec::mandatory(vec![ResourceCost::stack("bleed", 4)]);
        resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY).unwrap();
        assert_eq!(actor.stack_layers(&StackKey::known("bleed")), 0);
    }

    #[test]
    fn test_no_affordable_option_fails() {
        let mut actor = actor_with("x", 0);
        let spec = ConsumeSpec::optional(vec![vec![ResourceCost::stack("x", 1)]]);
        let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);
        assert!(matches!(result, Err(ActivityFailure::InsufficientResource(_))));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn failed_payment_changes_nothing(have in 0u32..6, need in 0u32..6, slots in 0usize..4) {
                let mut actor = actor_with("x", have);
                let before = actor.clone();
                let spec = ConsumeSpec::mandatory(vec![
                    ResourceCost::stack("x", need),
                    ResourceCost::pool(PoolKind::Primary, slots as u32),
                ]);
                let result = resolve(&spec, &mut actor, &mut ScriptedPresenter::new(), ACTIVITY);

                if need <= have && slots <= 3 {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(actor.stack_layers(&StackKey::known("x")), have - need);
                    prop_assert_eq!(actor.available(PoolKind::Primary), 3 - slots);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(actor, before);
                }
            }
        }
    }
}
