use crate::DiceFormula;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Result of rolling a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die faces, in roll order
    pub rolls: Vec<u32>,
    /// Sum of the faces plus the modifier
    pub total: i64,
}

impl RollOutcome {
    fn from_faces(formula: DiceFormula, rolls: Vec<u32>) -> Self {
        let faces = rolls.iter().fold(0i64, |sum, &r| sum.saturating_add(r as i64));
        let total = faces.saturating_add(formula.modifier);
        RollOutcome {
            formula,
            rolls,
            total,
        }
    }
}

/// Source of dice results
pub trait Roller {
    /// Roll a single die with the given number of faces (1..=sides)
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Roll a whole formula
    fn roll(&mut self, formula: &DiceFormula) -> RollOutcome {
        let rolls = (0..formula.count).map(|_| self.roll_die(formula.sides)).collect();
        RollOutcome::from_faces(*formula, rolls)
    }
}

/// Deterministic roller seeded from a u64
#[derive(Debug, Clone)]
pub struct SeededRoller {
    rng: ChaCha8Rng,
}

impl SeededRoller {
    pub fn new(seed: u64) -> Self {
        SeededRoller {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Roller for SeededRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Roller backed by the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRoller;

impl Roller for ThreadRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        rand::thread_rng().gen_range(1..=sides.max(1))
    }
}

/// Roller that always shows the same face, clamped to the die size
///
/// Mostly useful in tests: `FixedRoller(3)` rolls `2d6` as 3 + 3.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoller(pub u32);

impl Roller for FixedRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.clamp(1, sides.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_modifier_saturates() {
        let high = FixedRoller(6).roll(&DiceFormula::new(1, 6).with_modifier(i64::MAX));
        assert_eq!(high.total, i64::MAX);
        let low = FixedRoller(1).roll(&DiceFormula::new(1, 6).with_modifier(i64::MIN));
        assert_eq!(low.total, i64::MIN + 1);
    }

    #[test]
    fn test_parsed_extreme_modifier_rolls() {
        let formula = DiceFormula::parse("2d6+9223372036854775807").unwrap();
        assert_eq!(SeededRoller::new(7).roll(&formula).total, i64::MAX);
        assert_eq!(formula.max_total(), i64::MAX);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let formula = DiceFormula::parse("4d6+2").unwrap();
        let a = SeededRoller::new(12345).roll(&formula);
        let b = SeededRoller::new(12345).roll(&formula);
        assert_eq!(a, b);
        assert_eq!(a.rolls.len(), 4);
    }

    #[test]
    fn test_rolls_stay_in_bounds() {
        let formula = DiceFormula::parse("3d8-1").unwrap();
        let mut roller = SeededRoller::new(7);
        for _ in 0..500 {
            let outcome = roller.roll(&formula);
            assert!(outcome.total >= formula.min_total());
            assert!(outcome.total <= formula.max_total());
            assert!(outcome.rolls.iter().all(|&r| (1..=8).contains(&r)));
        }
    }

    #[test]
    fn test_fixed_roller() {
        let formula = DiceFormula::parse("2d6+3").unwrap();
        assert_eq!(FixedRoller(4).roll(&formula).total, 11);
        // Faces above the die size clamp down
        assert_eq!(FixedRoller(9).roll(&formula).total, 15);
    }
}
