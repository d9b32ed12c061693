use crate::DiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hard cap on dice in a single formula
pub const MAX_DICE: u32 = 1000;

/// A parsed `NdM[+K]` formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceFormula {
    /// Number of dice
    pub count: u32,
    /// Faces per die
    pub sides: u32,
    /// Flat modifier added after summing the dice (may be negative)
    pub modifier: i64,
}

impl DiceFormula {
    pub fn new(count: u32, sides: u32) -> Self {
        DiceFormula {
            count,
            sides,
            modifier: 0,
        }
    }

    pub fn with_modifier(mut self, modifier: i64) -> Self {
        self.modifier = modifier;
        self
    }

    /// Parse a formula, returning `None` when the text is not dice syntax
    ///
    /// Accepts surrounding whitespace, a lowercase or uppercase `d`, and an
    /// optional `+K` / `-K` tail. A leading count may be omitted (`d20`).
    pub fn parse(text: &str) -> Result<Self, DiceError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let malformed = || DiceError::Malformed(text.to_string());

        let d_pos = compact.find(['d', 'D']).ok_or_else(malformed)?;
        let (count_str, rest) = compact.split_at(d_pos);
        let rest = &rest[1..];

        let count = if count_str.is_empty() {
            1
        } else if count_str.chars().all(|c| c.is_ascii_digit()) {
            count_str.parse::<u32>().map_err(|_| malformed())?
        } else {
            return Err(malformed());
        };

        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(idx) => {
                let (sides, tail) = rest.split_at(idx);
                let digits = &tail[1..];
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(malformed());
                }
                let value = digits.parse::<i64>().map_err(|_| malformed())?;
                (sides, if tail.starts_with('-') { -value } else { value })
            }
            None => (rest, 0),
        };

        if sides_str.is_empty() || !sides_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let sides = sides_str.parse::<u32>().map_err(|_| malformed())?;

        if count == 0 || sides == 0 {
            return Err(DiceError::Empty(text.to_string()));
        }
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice {
                formula: text.to_string(),
                limit: MAX_DICE,
            });
        }

        Ok(DiceFormula {
            count,
            sides,
            modifier,
        })
    }

    /// Whether the text is entirely a dice formula
    pub fn is_formula(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// Smallest possible total
    pub fn min_total(&self) -> i64 {
        (self.count as i64).saturating_add(self.modifier)
    }

    /// Largest possible total
    pub fn max_total(&self) -> i64 {
        (self.count as i64 * self.sides as i64).saturating_add(self.modifier)
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceFormula::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}
