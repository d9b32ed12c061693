use serde::{Deserialize, Serialize};
use std::fmt;

/// A number or a formula, resolved when the effect runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Value(f64),
    Formula(String),
}

impl Amount {
    pub fn one() -> Self {
        Amount::Value(1.0)
    }

    pub fn formula(text: impl Into<String>) -> Self {
        Amount::Formula(text.into())
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Amount::Value(_) => None,
            Amount::Formula(text) => Some(text),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Value(0.0)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Value(value)
    }
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Amount::Value(value as f64)
    }
}

impl From<&str> for Amount {
    fn from(text: &str) -> Self {
        Amount::Formula(text.to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Value(v) => write!(f, "{}", v),
            Amount::Formula(text) => write!(f, "{}", text),
        }
    }
}
