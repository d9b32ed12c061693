//! rule_core - Data-driven activity rules for tabletop combat
//!
//! This library provides:
//! - Activity: authored trigger / condition / consume / effect rules
//! - Expression language: safe formulas over stack layers, pools and dice
//! - Condition evaluation, consumption resolution and effect execution
//! - RuleEngine: the orchestrator that runs activities and round advances
//! - ActivityRegistry: TOML activity files loaded from a directory
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rule_core::prelude::*;
//!
//! let engine = RuleEngine::with_defaults();
//! let registry = ActivityRegistry::load(Path::new("activities/"), engine.catalog())?;
//!
//! let mut roster = Roster::new().with(engine.config().new_actor("hero", 30));
//! let mut roller = SeededRoller::new(7);
//! let mut presenter = ScriptedPresenter::new();
//! let mut host = Host::new(&mut roster, &mut roller, &mut presenter);
//!
//! let rally = registry.get("iron_sword.rally").unwrap();
//! let outcome = engine.invoke(rally, ExecutionContext::new("hero", TriggerType::OnUse), &mut host);
//! println!("{}", outcome);
//! ```

pub mod activity;
pub mod condition;
pub mod config;
pub mod consume;
pub mod effect;
pub mod engine;
pub mod expr;
pub mod host;
pub mod prelude;

// Core API - what most users need
pub use activity::{Activity, ExecutionContext, Trigger, TriggerType};
pub use engine::{ActivityFailure, ActivityOutcome, OutcomeStatus, RuleEngine};
pub use host::{ActorAccess, Host, Presenter};

// Configuration
pub use config::{ActivityRegistry, ConfigError, EngineConfig};

// Re-export the state and dice crates the engine works over
pub use buff_core::{ActorCombatState, BuffCatalog, StackKey, Timing};
pub use dice_core::{DiceFormula, Roller};
