//! 2d6 game mechanics for Taleweaver.
//!
//! Provides six-sided dice, character sheets with loosely
//! matched skills, and the skill-check resolver that decides whether a
//! character's attempt succeeds.

pub mod check;
pub mod dice;
pub mod sheet;

pub use check::{
    CheckModifiers, EXCEPTIONAL_MARGIN, SkillCheckResult, UNSKILLED_PENALTY, attempt,
    perform_check,
};
pub use dice::{D6_SIDES, RollResult, roll_2d6, roll_d6};
pub use sheet::{CharacterSheet, characteristic_dm};
