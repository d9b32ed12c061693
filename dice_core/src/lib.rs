//! dice_core - Dice formulas and rollers
//!
//! Recognizes `NdM[+K]` formulas and rolls them through a [`Roller`].
//! The rule engine never draws randomness itself; every roll goes through
//! one of these rollers so tests can pin results.

mod formula;
mod roller;

pub use formula::{DiceFormula, MAX_DICE};
pub use roller::{FixedRoller, RollOutcome, Roller, SeededRoller, ThreadRoller};

use thiserror::Error;

/// Error parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Not a dice formula: '{0}'")]
    Malformed(String),
    #[error("Dice formula '{0}' has zero dice or zero sides")]
    Empty(String),
    #[error("Dice formula '{formula}' exceeds the limit of {limit} dice")]
    TooManyDice { formula: String, limit: u32 },
}
