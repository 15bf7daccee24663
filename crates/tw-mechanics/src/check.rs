//! 2d6 skill checks.
//!
//! A check rolls 2d6, adds the skill level, a characteristic modifier, and
//! any situational modifier, and succeeds when the total meets the
//! threshold (`8+` means 8 or more). Success, margin, and the exceptional
//! flag all derive from the total; a fumble is snake eyes on the dice
//! themselves, whatever the modifiers.

use rand::rngs::StdRng;
use serde::Serialize;
use tw_core::CheckRequirement;

use crate::dice::{RollResult, roll_2d6};
use crate::sheet::{CharacterSheet, characteristic_dm};

/// Skill modifier applied when the character lacks the skill entirely.
pub const UNSKILLED_PENALTY: i32 = -3;

/// Margin at which a success counts as exceptional.
pub const EXCEPTIONAL_MARGIN: i32 = 6;

/// The modifiers feeding a check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckModifiers {
    /// Skill level (or the unskilled penalty).
    pub skill_mod: i32,
    /// Characteristic modifier.
    pub attr_mod: i32,
    /// Situational modifier.
    pub modifier: i32,
}

impl CheckModifiers {
    /// Only a situational modifier.
    pub fn situational(modifier: i32) -> Self {
        Self {
            modifier,
            ..Self::default()
        }
    }

    /// Derive modifiers for `sheet` attempting `requirement`.
    pub fn for_character(sheet: &CharacterSheet, requirement: &CheckRequirement) -> Self {
        let skill_mod = sheet
            .skill_level(&requirement.skill)
            .unwrap_or(UNSKILLED_PENALTY);
        let attr_mod = requirement
            .attribute
            .as_deref()
            .and_then(|attr| sheet.characteristic(attr))
            .map(characteristic_dm)
            .unwrap_or(0);
        Self {
            skill_mod,
            attr_mod,
            modifier: requirement.modifier,
        }
    }

    /// Sum of all modifiers.
    pub fn sum(&self) -> i32 {
        self.skill_mod + self.attr_mod + self.modifier
    }
}

/// The full outcome of a skill check.
///
/// Constructed only by resolving dice, so the derived fields always agree
/// with the roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCheckResult {
    skill: String,
    dice: RollResult,
    roll: i32,
    modifiers: CheckModifiers,
    total: i32,
    threshold: i32,
    success: bool,
    margin: i32,
    exceptional: bool,
    fumble: bool,
}

impl SkillCheckResult {
    /// Resolve already-rolled dice against a threshold.
    pub fn resolve(
        skill: impl Into<String>,
        dice: RollResult,
        threshold: i32,
        modifiers: CheckModifiers,
    ) -> Self {
        let roll = dice.total() as i32;
        let total = roll + modifiers.sum();
        let margin = total - threshold;
        Self {
            skill: skill.into(),
            dice,
            roll,
            modifiers,
            total,
            threshold,
            success: total >= threshold,
            margin,
            exceptional: margin >= EXCEPTIONAL_MARGIN,
            fumble: roll == 2,
        }
    }

    /// The skill that was tested.
    pub fn skill(&self) -> &str {
        &self.skill
    }

    /// The individual dice.
    pub fn dice(&self) -> &RollResult {
        &self.dice
    }

    /// Raw 2d6 total (2-12).
    pub fn roll(&self) -> i32 {
        self.roll
    }

    /// Skill modifier.
    pub fn skill_mod(&self) -> i32 {
        self.modifiers.skill_mod
    }

    /// Characteristic modifier.
    pub fn attr_mod(&self) -> i32 {
        self.modifiers.attr_mod
    }

    /// Situational modifier.
    pub fn modifier(&self) -> i32 {
        self.modifiers.modifier
    }

    /// Roll plus every modifier.
    pub fn total(&self) -> i32 {
        self.total
    }

    /// Target number.
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// `total >= threshold`.
    pub fn success(&self) -> bool {
        self.success
    }

    /// `total - threshold`.
    pub fn margin(&self) -> i32 {
        self.margin
    }

    /// Margin of 6 or more.
    pub fn exceptional(&self) -> bool {
        self.exceptional
    }

    /// Snake eyes on the dice.
    pub fn fumble(&self) -> bool {
        self.fumble
    }
}

impl std::fmt::Display for SkillCheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}+: {} {:+} skill {:+} attr {:+} mod = {}, {} (margin {:+})",
            self.skill,
            self.threshold,
            self.dice,
            self.modifiers.skill_mod,
            self.modifiers.attr_mod,
            self.modifiers.modifier,
            self.total,
            if self.success { "success" } else { "failure" },
            self.margin,
        )?;
        if self.exceptional {
            write!(f, ", exceptional")?;
        }
        if self.fumble {
            write!(f, ", fumble")?;
        }
        Ok(())
    }
}

/// Roll a check.
pub fn perform_check(
    rng: &mut StdRng,
    skill: &str,
    threshold: i32,
    modifiers: CheckModifiers,
) -> SkillCheckResult {
    let result = SkillCheckResult::resolve(skill, roll_2d6(rng), threshold, modifiers);
    tracing::debug!(
        skill,
        threshold,
        roll = result.roll(),
        total = result.total(),
        success = result.success(),
        "skill check"
    );
    result
}

/// Roll a check for `sheet` against an authored requirement.
pub fn attempt(
    rng: &mut StdRng,
    sheet: &CharacterSheet,
    requirement: &CheckRequirement,
) -> SkillCheckResult {
    perform_check(
        rng,
        &requirement.skill,
        requirement.threshold,
        CheckModifiers::for_character(sheet, requirement),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn resolved(faces: [u32; 2], threshold: i32, modifier: i32) -> SkillCheckResult {
        SkillCheckResult::resolve(
            "Pilot",
            RollResult::from_d6(&faces),
            threshold,
            CheckModifiers::situational(modifier),
        )
    }

    #[test]
    fn success_at_threshold() {
        let r = resolved([4, 4], 8, 0);
        assert!(r.success());
        assert_eq!(r.margin(), 0);
        assert!(!r.exceptional());
    }

    #[test]
    fn failure_below_threshold() {
        let r = resolved([3, 4], 8, 0);
        assert!(!r.success());
        assert_eq!(r.margin(), -1);
    }

    #[test]
    fn exceptional_at_margin_six() {
        let r = resolved([6, 6], 6, 0);
        assert!(r.exceptional());
        assert_eq!(r.margin(), 6);
        assert!(!resolved([6, 5], 6, 0).exceptional());
    }

    #[test]
    fn fumble_ignores_modifiers() {
        let r = resolved([1, 1], 4, 10);
        assert!(r.fumble());
        assert!(r.success());
        assert!(!resolved([1, 2], 4, -10).fumble());
    }

    #[test]
    fn modifiers_from_sheet() {
        let sheet = CharacterSheet::new("Kiri")
            .with_skill("Pilot-2")
            .with_characteristic("DEX", 9);
        let req = CheckRequirement {
            skill: "pilot".to_string(),
            threshold: 8,
            attribute: Some("dex".to_string()),
            modifier: -1,
        };
        let mods = CheckModifiers::for_character(&sheet, &req);
        assert_eq!(
            mods,
            CheckModifiers {
                skill_mod: 2,
                attr_mod: 1,
                modifier: -1
            }
        );
    }

    #[test]
    fn unskilled_penalty() {
        let sheet = CharacterSheet::new("Kiri");
        let mods = CheckModifiers::for_character(&sheet, &CheckRequirement::new("Medic", 8));
        assert_eq!(mods.skill_mod, UNSKILLED_PENALTY);
        assert_eq!(mods.attr_mod, 0);
    }

    #[test]
    fn display() {
        let r = SkillCheckResult::resolve(
            "Pilot",
            RollResult::from_d6(&[3, 4]),
            8,
            CheckModifiers {
                skill_mod: 2,
                attr_mod: 1,
                modifier: 0,
            },
        );
        assert_eq!(
            r.to_string(),
            "Pilot 8+: [3, 4] = 7 +2 skill +1 attr +0 mod = 10, success (margin +2)"
        );
    }

    #[test]
    fn perform_check_is_seeded() {
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        let mods = CheckModifiers::situational(1);
        assert_eq!(
            perform_check(&mut a, "Pilot", 8, mods),
            perform_check(&mut b, "Pilot", 8, mods)
        );
    }

    proptest! {
        #[test]
        fn derived_fields_agree(seed in any::<u64>(), threshold in -5i32..20, m in -10i32..10) {
            let mut rng = StdRng::seed_from_u64(seed);
            let r = perform_check(&mut rng, "Recon", threshold, CheckModifiers::situational(m));
            prop_assert!((2..=12).contains(&r.roll()));
            prop_assert_eq!(r.total(), r.roll() + m);
            prop_assert_eq!(r.success(), r.total() >= threshold);
            prop_assert_eq!(r.margin(), r.total() - threshold);
            prop_assert_eq!(r.exceptional(), r.margin() >= 6);
            prop_assert_eq!(r.fumble(), r.roll() == 2);
        }
    }
}
