use super::EffectError;
use crate::host::ActorAccess;

/// A rolled heal waiting for the user to apply it
///
/// Created when a heal's amount rolls dice. Both `confirm` and `abandon`
/// take the value, so a heal is applied at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending heal does nothing until confirmed"]
pub struct PendingHeal {
    actor_id: String,
    amount: i32,
    activity_id: String,
}

impl PendingHeal {
    pub(crate) fn new(actor_id: impl Into<String>, amount: i32, activity_id: impl Into<String>) -> Self {
        PendingHeal {
            actor_id: actor_id.into(),
            amount,
            activity_id: activity_id.into(),
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Apply the heal, returning HP actually restored
    pub fn confirm(self, actors: &mut dyn ActorAccess) -> Result<i32, EffectError> {
        let actor = actors
            .actor_mut(&self.actor_id)
            .ok_or_else(|| EffectError::UnknownActor(self.actor_id.clone()))?;
        let applied = actor.heal(self.amount);
        tracing::info!(actor = %self.actor_id, amount = self.amount, applied, "confirmed heal");
        Ok(applied)
    }

    /// Drop the heal without applying it
    pub fn abandon(self) {
        tracing::debug!(actor = %self.actor_id, amount = self.amount, "abandoned heal");
    }
}
