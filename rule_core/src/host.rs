//! Collaborator interfaces supplied by the host platform

use crate::consume::ResourceCost;
use crate::engine::ActivityOutcome;
use buff_core::ActorCombatState;
use dice_core::Roller;
use std::collections::{HashMap, VecDeque};

/// Read/write access to actor combat state
pub trait ActorAccess {
    fn actor(&self, id: &str) -> Option<&ActorCombatState>;
    fn actor_mut(&mut self, id: &str) -> Option<&mut ActorCombatState>;
}

/// One alternative offered to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    /// Index into the activity's declared options
    pub index: usize,
    pub costs: Vec<ResourceCost>,
}

/// Request to pick one of several affordable alternatives
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicePrompt {
    pub activity_id: String,
    pub activity_name: String,
    pub actor_id: String,
    pub options: Vec<ChoiceOption>,
}

/// The user's answer to a [`ChoicePrompt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceResponse {
    /// Declared option index (as in [`ChoiceOption::index`])
    Selected(usize),
    Cancelled,
    /// The host gave up waiting; handled exactly like a cancellation
    TimedOut,
}

/// Shows results and asks the user to choose
pub trait Presenter {
    /// Block until the user picks an option, cancels, or the host times out
    fn choose_option(&mut self, prompt: &ChoicePrompt) -> ChoiceResponse;

    /// Show a finished (completed or failed) activity
    fn present(&mut self, _outcome: &ActivityOutcome) {}
}

/// Everything the engine calls out to during one invocation
pub struct Host<'a> {
    pub actors: &'a mut dyn ActorAccess,
    pub roller: &'a mut dyn Roller,
    pub presenter: &'a mut dyn Presenter,
}

impl<'a> Host<'a> {
    pub fn new(actors: &'a mut dyn ActorAccess, roller: &'a mut dyn Roller, presenter: &'a mut dyn Presenter) -> Self {
        Host {
            actors,
            roller,
            presenter,
        }
    }
}

/// In-memory actor table
#[derive(Debug, Clone, Default)]
pub struct Roster {
    actors: HashMap<String, ActorCombatState>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: ActorCombatState) {
        self.actors.insert(actor.id().to_string(), actor);
    }

    pub fn with(mut self, actor: ActorCombatState) -> Self {
        self.insert(actor);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ActorCombatState> {
        self.actors.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ActorCombatState> {
        self.actors.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(|s| s.as_str())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActorCombatState> {
        self.actors.values_mut()
    }
}

impl ActorAccess for Roster {
    fn actor(&self, id: &str) -> Option<&ActorCombatState> {
        self.actors.get(id)
    }

    fn actor_mut(&mut self, id: &str) -> Option<&mut ActorCombatState> {
        self.actors.get_mut(id)
    }
}

/// Presenter that replays queued answers and records what it was shown
///
/// Cancels when it runs out of answers. Intended for tests and headless
/// simulations.
#[derive(Debug, Default)]
pub struct ScriptedPresenter {
    responses: VecDeque<ChoiceResponse>,
    pub prompts: Vec<ChoicePrompt>,
    pub presented: Vec<String>,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(responses: impl IntoIterator<Item = ChoiceResponse>) -> Self {
        ScriptedPresenter {
            responses: responses.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl Presenter for ScriptedPresenter {
    fn choose_option(&mut self, prompt: &ChoicePrompt) -> ChoiceResponse {
        self.prompts.push(prompt.clone());
        self.responses.pop_front().unwrap_or(ChoiceResponse::Cancelled)
    }

    fn present(&mut self, outcome: &ActivityOutcome) {
        self.presented.push(outcome.to_string());
    }
}
