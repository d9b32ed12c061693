use super::TriggerType;
use crate::consume::ResourceCost;
use dice_core::DiceFormula;

/// A dice roll in flight that effects may adjust
#[derive(Debug, Clone, PartialEq)]
pub struct DiceContext {
    pub formula: DiceFormula,
    pub total: i64,
}

impl DiceContext {
    pub fn new(formula: DiceFormula, total: i64) -> Self {
        DiceContext { formula, total }
    }
}

/// Per-invocation inputs, plus what consumption resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    pub source: String,
    pub target: Option<String>,
    pub item: Option<String>,
    pub dice: Option<DiceContext>,
    pub round: Option<u32>,
    pub combat_id: Option<String>,
    pub trigger: TriggerType,
    pub attack_category: Option<String>,
    /// Costs paid by consumption (empty when nothing was paid)
    pub consumed: Vec<ResourceCost>,
    /// Alternative chosen during optional consumption
    pub selected_option: Option<usize>,
}

impl ExecutionContext {
    pub fn new(source: impl Into<String>, trigger: TriggerType) -> Self {
        ExecutionContext {
            source: source.into(),
            target: None,
            item: None,
            dice: None,
            round: None,
            combat_id: None,
            trigger,
            attack_category: None,
            consumed: Vec::new(),
            selected_option: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_dice(mut self, dice: DiceContext) -> Self {
        self.dice = Some(dice);
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_combat(mut self, combat_id: impl Into<String>) -> Self {
        self.combat_id = Some(combat_id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.attack_category = Some(category.into());
        self
    }

    /// Whether consumption paid anything
    pub fn was_consumed(&self) -> bool {
        !self.consumed.is_empty()
    }
}
