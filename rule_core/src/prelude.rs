//! Prelude module for convenient imports
//!
//! ```rust
//! use rule_core::prelude::*;
//! ```

// Definitions
pub use crate::activity::{Activity, DiceContext, ExecutionContext, Trigger, TriggerType, UsageLimit};
pub use crate::condition::{CompareOp, Condition, Subject};
pub use crate::consume::{ConsumeMode, ConsumeSpec, ResourceCost};
pub use crate::effect::{Amount, EffectKind, EffectSpec, EffectTarget, PendingHeal};

// Running activities
pub use crate::engine::{ActivityFailure, ActivityOutcome, OutcomeStatus, RuleEngine};
pub use crate::host::{ActorAccess, ChoicePrompt, ChoiceResponse, Host, Presenter, Roster, ScriptedPresenter};

// Config
pub use crate::config::{ActivityRegistry, EngineConfig, UnknownConditionPolicy};

// Re-exports from buff_core and dice_core
pub use buff_core::{builtin_catalog, ActorCombatState, BuffCatalog, PoolKind, PooledResource, StackKey, Timing};
pub use dice_core::{DiceFormula, Roller, SeededRoller};
