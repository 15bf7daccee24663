//! Character sheets: skill lists and characteristics.
//!
//! Skills are stored the way players write them, with the level at the
//! end: `"Pilot-2"`, `"Gun Combat 1"`, `"Streetwise-0"`. Lookups match
//! loosely so narration can say "pilot" and still find `"Pilot-2"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A player character's mechanical state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSheet {
    /// Character name.
    pub name: String,
    /// Skill entries with trailing levels.
    pub skills: Vec<String>,
    /// Characteristic scores (e.g., STR: 7, INT: 10).
    pub characteristics: BTreeMap<String, i32>,
}

impl CharacterSheet {
    /// Create an empty sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a skill entry such as `"Pilot-2"`.
    pub fn with_skill(mut self, entry: impl Into<String>) -> Self {
        self.skills.push(entry.into());
        self
    }

    /// Set a characteristic score.
    pub fn with_characteristic(mut self, name: impl Into<String>, value: i32) -> Self {
        self.characteristics.insert(name.into(), value);
        self
    }

    /// Find the first skill entry containing `name`, ignoring case.
    pub fn find_skill(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.skills
            .iter()
            .find(|entry| entry.to_lowercase().contains(&needle))
            .map(String::as_str)
    }

    /// Level of the matching skill; an entry without a number is level 0.
    pub fn skill_level(&self, name: &str) -> Option<i32> {
        self.find_skill(name).map(trailing_level)
    }

    /// Whether the character has `name` at `min_level` or better.
    ///
    /// A missing skill is simply `false`.
    pub fn has_skill_level(&self, name: &str, min_level: i32) -> bool {
        self.skill_level(name).is_some_and(|level| level >= min_level)
    }

    /// Characteristic score, matched case-insensitively.
    pub fn characteristic(&self, name: &str) -> Option<i32> {
        self.characteristics
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
            .map(|(_, value)| *value)
    }
}

/// Dice modifier for a characteristic score.
pub fn characteristic_dm(value: i32) -> i32 {
    match value {
        i32::MIN..=0 => -3,
        1..=2 => -2,
        3..=5 => -1,
        6..=8 => 0,
        9..=11 => 1,
        12..=14 => 2,
        _ => 3,
    }
}

fn trailing_level(entry: &str) -> i32 {
    let digits_start = entry
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    digits_start
        .and_then(|i| entry[i..].parse().ok())
        .unwrap_or(0)
}
