use buff_core::UsageCounter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which cap an activity hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageScope {
    Round,
    Combat,
    Total,
}

impl fmt::Display for UsageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageScope::Round => write!(f, "per-round"),
            UsageScope::Combat => write!(f, "per-combat"),
            UsageScope::Total => write!(f, "total"),
        }
    }
}

/// Optional caps on how often an activity may succeed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimit {
    #[serde(default, alias = "perRound")]
    pub per_round: Option<u32>,
    #[serde(default, alias = "perCombat")]
    pub per_combat: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
}

impl UsageLimit {
    pub fn is_unlimited(&self) -> bool {
        self.per_round.is_none() && self.per_combat.is_none() && self.total.is_none()
    }

    /// First cap that one more use would exceed
    ///
    /// A missing counter, or one tagged with another round or combat, reads
    /// as zero uses. A zero cap therefore blocks even the first use.
    pub fn exceeded(&self, counter: Option<&UsageCounter>, round: Option<u32>, combat: Option<&str>) -> Option<UsageScope> {
        let unused = UsageCounter::default();
        let counter = counter.unwrap_or(&unused);
        if self.per_round.is_some_and(|cap| counter.uses_in_round(round) >= cap) {
            return Some(UsageScope::Round);
        }
        if self.per_combat.is_some_and(|cap| counter.uses_in_combat(combat) >= cap) {
            return Some(UsageScope::Combat);
        }
        if self.total.is_some_and(|cap| counter.total_uses >= cap) {
            return Some(UsageScope::Total);
        }
        None
    }
}
