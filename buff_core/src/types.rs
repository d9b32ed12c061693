//! Stack identity and instance types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The id every custom stack reports
pub const CUSTOM_ID: &str = "custom";

/// Prefix used in authored references to name a custom stack
const CUSTOM_PREFIX: &str = "custom:";

/// Which round(s) a stack instance counts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    #[default]
    Current,
    Next,
    Both,
}

impl Timing {
    /// Whether instances with this timing count toward this round's layers
    pub fn is_active(&self) -> bool {
        matches!(self, Timing::Current | Timing::Both)
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timing::Current => write!(f, "current round"),
            Timing::Next => write!(f, "next round"),
            Timing::Both => write!(f, "this and next round"),
        }
    }
}

/// Merge identity of a stack
///
/// Catalog stacks key on their id; custom stacks all share the id
/// `"custom"` and key on their display name instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StackKey {
    Known(String),
    Custom(String),
}

impl StackKey {
    pub fn known(id: impl Into<String>) -> Self {
        StackKey::Known(id.into())
    }

    pub fn custom(name: impl Into<String>) -> Self {
        StackKey::Custom(name.into())
    }

    /// Parse an authored reference: `"custom:Name"` or a catalog id
    pub fn parse(reference: &str) -> Self {
        match reference.strip_prefix(CUSTOM_PREFIX) {
            Some(name) => StackKey::Custom(name.trim().to_string()),
            None => StackKey::Known(reference.trim().to_string()),
        }
    }

    /// The stack id (`"custom"` for every custom stack)
    pub fn id(&self) -> &str {
        match self {
            StackKey::Known(id) => id,
            StackKey::Custom(_) => CUSTOM_ID,
        }
    }

    /// Display name for custom stacks
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            StackKey::Known(_) => None,
            StackKey::Custom(name) => Some(name),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, StackKey::Custom(_))
    }
}

impl fmt::Display for StackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackKey::Known(id) => write!(f, "{}", id),
            StackKey::Custom(name) => write!(f, "{}{}", CUSTOM_PREFIX, name),
        }
    }
}

/// One live stack on an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInstance {
    pub key: StackKey,
    /// Stack count; the instance is removed when this reaches 0
    pub layers: u32,
    /// Secondary magnitude, independent of layers
    pub potency: i32,
    pub timing: Timing,
}

impl StackInstance {
    pub fn new(key: StackKey, layers: u32, potency: i32, timing: Timing) -> Self {
        StackInstance {
            key,
            layers,
            potency,
            timing,
        }
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    /// Whether this instance merges with another on add
    pub fn same_slot(&self, key: &StackKey, timing: Timing) -> bool {
        self.key == *key && self.timing == timing
    }
}
