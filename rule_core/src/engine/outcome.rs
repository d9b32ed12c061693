use crate::activity::{DiceContext, UsageScope};
use crate::consume::ResourceCost;
use crate::effect::{EffectDetail, EffectError, PendingHeal};
use std::fmt;
use thiserror::Error;

/// Why an activity did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityFailure {
    #[error("{0} usage limit reached")]
    UsageLimitExceeded(UsageScope),
    #[error("condition {index} not met: {description}")]
    ConditionNotMet { index: usize, description: String },
    #[error("insufficient resources: {0}")]
    InsufficientResource(String),
    #[error("cancelled by user")]
    UserCancelled,
    #[error("option {0} was not offered")]
    InvalidSelection(usize),
    #[error("critical effect {index} ({kind}) failed: {error}")]
    CriticalEffectFailed {
        index: usize,
        kind: &'static str,
        error: EffectError,
    },
    #[error("unknown actor '{0}'")]
    UnknownActor(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Completed,
    /// Trigger did not match; nothing was checked or changed
    Skipped,
    Failed(ActivityFailure),
}

/// One effect's result, in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct EffectReport {
    pub index: usize,
    pub kind: &'static str,
    pub critical: bool,
    pub result: Result<EffectDetail, EffectError>,
}

impl EffectReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Structured result of one activity invocation
#[derive(Debug)]
pub struct ActivityOutcome {
    pub activity_id: String,
    pub activity_name: String,
    pub status: OutcomeStatus,
    pub consumed: Vec<ResourceCost>,
    pub selected_option: Option<usize>,
    pub effects: Vec<EffectReport>,
    /// Dice roll after any modifiers
    pub dice: Option<DiceContext>,
    /// Rolled heals waiting for the user to confirm them
    pub pending_heals: Vec<PendingHeal>,
}

impl ActivityOutcome {
    pub(crate) fn new(activity_id: &str, activity_name: &str) -> Self {
        ActivityOutcome {
            activity_id: activity_id.to_string(),
            activity_name: activity_name.to_string(),
            status: OutcomeStatus::Completed,
            consumed: Vec::new(),
            selected_option: None,
            effects: Vec::new(),
            dice: None,
            pending_heals: Vec::new(),
        }
    }

    pub(crate) fn failed(mut self, failure: ActivityFailure) -> Self {
        self.status = OutcomeStatus::Failed(failure);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == OutcomeStatus::Skipped
    }

    pub fn failure(&self) -> Option<&ActivityFailure> {
        match &self.status {
            OutcomeStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Effects that applied
    pub fn applied(&self) -> impl Iterator<Item = &EffectDetail> {
        self.effects.iter().filter_map(|r| r.result.as_ref().ok())
    }
}

impl fmt::Display for ActivityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Completed => write!(f, "{}: completed", self.activity_name)?,
            OutcomeStatus::Skipped => return write!(f, "{}: skipped", self.activity_name),
            OutcomeStatus::Failed(failure) => write!(f, "{}: failed ({})", self.activity_name, failure)?,
        }
        if !self.consumed.is_empty() {
            let paid: Vec<String> = self.consumed.iter().map(|c| c.to_string()).collect();
            write!(f, "; paid {}", paid.join(", "))?;
        }
        for report in &self.effects {
            match &report.result {
                Ok(detail) => write!(f, "; {}", detail)?,
                Err(error) => write!(f, "; {} failed: {}", report.kind, error)?,
            }
        }
        Ok(())
    }
}
