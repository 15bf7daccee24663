//! How each NPC feels about each player character.
//!
//! Durable: the ledger lives in one JSON file shared by every adventure.
//! Levels run from -3 (hostile) to 3 (grateful) and are clamped after
//! every change. Each change is kept in an append-only history.
//!
//! Authored caps are not enforced here. A record can sit above an NPC's
//! `max_without_deed`; callers pass levels through [`check_disposition_cap`]
//! before showing them to the narrator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tw_core::{CoreResult, DataPaths, GameDate, JsonStore, NpcConfig};

/// Lowest disposition level.
pub const MIN_DISPOSITION: i8 = -3;

/// Highest disposition level.
pub const MAX_DISPOSITION: i8 = 3;

/// Named disposition levels, one per step from -3 to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionLabel {
    /// -3: actively wants to hinder the PC.
    Hostile,
    /// -2: wary and distrustful.
    Suspicious,
    /// -1: can't be bothered.
    Dismissive,
    /// 0: no strong feelings.
    #[default]
    Neutral,
    /// 1: professional respect.
    Respectful,
    /// 2: warm and helpful.
    Friendly,
    /// 3: owes the PC.
    Grateful,
}

impl DispositionLabel {
    /// Label for a level, clamping out-of-range input.
    pub fn from_level(level: i8) -> Self {
        match level.clamp(MIN_DISPOSITION, MAX_DISPOSITION) {
            -3 => Self::Hostile,
            -2 => Self::Suspicious,
            -1 => Self::Dismissive,
            0 => Self::Neutral,
            1 => Self::Respectful,
            2 => Self::Friendly,
            _ => Self::Grateful,
        }
    }

    /// The level this label stands for.
    pub fn level(self) -> i8 {
        match self {
            Self::Hostile => -3,
            Self::Suspicious => -2,
            Self::Dismissive => -1,
            Self::Neutral => 0,
            Self::Respectful => 1,
            Self::Friendly => 2,
            Self::Grateful => 3,
        }
    }

    /// Lowercase name, as shown to the narrator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hostile => "hostile",
            Self::Suspicious => "suspicious",
            Self::Dismissive => "dismissive",
            Self::Neutral => "neutral",
            Self::Respectful => "respectful",
            Self::Friendly => "friendly",
            Self::Grateful => "grateful",
        }
    }
}

impl fmt::Display for DispositionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded change of disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionChange {
    /// In-world date of the change.
    pub date: GameDate,
    /// Requested delta, before clamping.
    pub change: i32,
    /// Why it changed.
    pub reason: String,
    /// Level before.
    pub from: i8,
    /// Level after.
    pub to: i8,
}

/// One NPC's attitude toward one PC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispositionRecord {
    /// The NPC.
    pub npc_id: String,
    /// The player character.
    pub pc_id: String,
    /// Current level, always within -3..=3.
    pub level: i8,
    /// Label derived from `level`.
    pub label: DispositionLabel,
    /// Every change, oldest first.
    pub history: Vec<DispositionChange>,
    /// Free-form notes on how the PC came across.
    pub impressions: Vec<String>,
}

impl DispositionRecord {
    /// Neutral record for a pair with no history.
    pub fn neutral(npc_id: &str, pc_id: &str) -> Self {
        Self {
            npc_id: npc_id.to_string(),
            pc_id: pc_id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct DispositionBook {
    /// npc -> pc -> record
    records: BTreeMap<String, BTreeMap<String, DispositionRecord>>,
}

impl DispositionBook {
    fn entry(&mut self, npc_id: &str, pc_id: &str) -> &mut DispositionRecord {
        self.records
            .entry(npc_id.to_string())
            .or_default()
            .entry(pc_id.to_string())
            .or_insert_with(|| DispositionRecord::neutral(npc_id, pc_id))
    }
}

/// The persisted disposition ledger.
#[derive(Debug, Clone)]
pub struct DispositionLedger {
    store: JsonStore<DispositionBook>,
}

impl DispositionLedger {
    /// A ledger backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// The ledger at its standard place in the data directory.
    pub fn open(paths: &DataPaths) -> Self {
        Self::new(paths.dispositions_file())
    }

    /// Current disposition of `npc_id` toward `pc_id`.
    ///
    /// Unknown, empty, or unreadable entries give the neutral record.
    pub fn get_disposition(&self, npc_id: &str, pc_id: &str) -> DispositionRecord {
        self.store
            .load()
            .data
            .records
            .get(npc_id)
            .and_then(|by_pc| by_pc.get(pc_id))
            .cloned()
            .unwrap_or_else(|| DispositionRecord::neutral(npc_id, pc_id))
    }

    /// Shift a disposition by `delta`, clamped to -3..=3, and return the
    /// new level.
    pub fn modify_disposition(
        &self,
        npc_id: &str,
        pc_id: &str,
        delta: i32,
        reason: &str,
        date: GameDate,
    ) -> CoreResult<i8> {
        let (from, to) = self.store.update(|book| {
            let record = book.entry(npc_id, pc_id);
            let from = record.level;
            let to = clamp_level(i32::from(from).saturating_add(delta));
            record.history.push(DispositionChange {
                date,
                change: delta,
                reason: reason.to_string(),
                from,
                to,
            });
            record.level = to;
            record.label = DispositionLabel::from_level(to);
            (from, to)
        })?;
        tracing::info!(
            npc = npc_id,
            pc = pc_id,
            delta,
            from,
            to,
            reason,
            "disposition changed"
        );
        Ok(to)
    }

    /// Note an impression the PC made on the NPC.
    pub fn add_impression(&self, npc_id: &str, pc_id: &str, impression: &str) -> CoreResult<()> {
        self.store.update(|book| {
            book.entry(npc_id, pc_id)
                .impressions
                .push(impression.to_string());
        })?;
        tracing::debug!(npc = npc_id, pc = pc_id, "impression recorded");
        Ok(())
    }
}

fn clamp_level(level: i32) -> i8 {
    level.clamp(i32::from(MIN_DISPOSITION), i32::from(MAX_DISPOSITION)) as i8
}

/// Apply an NPC's authored ceiling to a level before it is shown.
///
/// Levels at or below the cap, or NPCs without one, pass unchanged.
pub fn check_disposition_cap(npc: &NpcConfig, level: i8) -> i8 {
    match npc.caps.max_without_deed {
        Some(cap) => level.min(cap),
        None => level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tw_core::DispositionCaps;

    fn ledger(dir: &tempfile::TempDir) -> DispositionLedger {
        DispositionLedger::open(&DataPaths::new(dir.path()))
    }

    fn date() -> GameDate {
        "001-1105".parse().unwrap()
    }

    #[test]
    fn absent_pair_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let r = ledger(&dir).get_disposition("mara", "kiri");
        assert_eq!(r.level, 0);
        assert_eq!(r.label, DispositionLabel::Neutral);
        assert!(r.history.is_empty());
        assert!(r.impressions.is_empty());

        let r = ledger(&dir).get_disposition("", "");
        assert_eq!(r.label.to_string(), "neutral");
    }

    #[test]
    fn clamps_at_top_with_history() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir);
        assert_eq!(l.modify_disposition("mara", "kiri", 2, "saved her ship", date()).unwrap(), 2);
        assert_eq!(l.modify_disposition("mara", "kiri", 5, "bonus", date()).unwrap(), 3);

        let r = l.get_disposition("mara", "kiri");
        assert_eq!(r.level, 3);
        assert_eq!(r.label, DispositionLabel::Grateful);
        assert_eq!(r.history.len(), 2);
        let last = r.history.last().unwrap();
        assert_eq!((last.from, last.to, last.change), (2, 3, 5));
        assert_eq!(last.reason, "bonus");
        assert_eq!(last.date, date());
    }

    #[test]
    fn clamps_at_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir);
        assert_eq!(l.modify_disposition("vex", "kiri", -10, "insult", date()).unwrap(), -3);
        assert_eq!(l.get_disposition("vex", "kiri").label, DispositionLabel::Hostile);
    }

    #[test]
    fn pairs_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir);
        l.modify_disposition("mara", "kiri", 1, "helped", date()).unwrap();
        assert_eq!(l.get_disposition("mara", "ossa").level, 0);
        assert_eq!(l.get_disposition("vex", "kiri").level, 0);
    }

    #[test]
    fn impressions_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let l = ledger(&dir);
        l.add_impression("mara", "kiri", "keeps promises").unwrap();
        l.add_impression("mara", "kiri", "bad at cards").unwrap();
        let r = l.get_disposition("mara", "kiri");
        assert_eq!(r.impressions, ["keeps promises", "bad at cards"]);
        assert_eq!(r.level, 0);
    }

    #[test]
    fn malformed_file_reads_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        std::fs::write(paths.dispositions_file(), "not json").unwrap();
        let l = DispositionLedger::open(&paths);
        assert_eq!(l.get_disposition("mara", "kiri").level, 0);
        assert_eq!(l.modify_disposition("mara", "kiri", 1, "fresh start", date()).unwrap(), 1);
    }

    #[test]
    fn cap_applies_only_above_ceiling() {
        let npc = NpcConfig {
            caps: DispositionCaps {
                max_without_deed: Some(2),
            },
            ..NpcConfig::default()
        };
        assert_eq!(check_disposition_cap(&npc, 3), 2);
        assert_eq!(check_disposition_cap(&npc, 1), 1);
        assert_eq!(check_disposition_cap(&NpcConfig::default(), 3), 3);
    }

    #[test]
    fn labels_cover_every_level() {
        for level in MIN_DISPOSITION..=MAX_DISPOSITION {
            assert_eq!(DispositionLabel::from_level(level).level(), level);
        }
        assert_eq!(DispositionLabel::from_level(9), DispositionLabel::Grateful);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn modify_clamps_and_logs_once(start in -3i32..=3, delta in -20i32..=20) {
            let dir = tempfile::tempdir().unwrap();
            let l = ledger(&dir);
            if start != 0 {
                l.modify_disposition("npc", "pc", start, "setup", date()).unwrap();
            }
            let before = l.get_disposition("npc", "pc");
            let level = l.modify_disposition("npc", "pc", delta, "test", date()).unwrap();
            let after = l.get_disposition("npc", "pc");

            prop_assert_eq!(i32::from(level), (start + delta).clamp(-3, 3));
            prop_assert_eq!(after.level, level);
            prop_assert_eq!(after.history.len(), before.history.len() + 1);
            let entry = after.history.last().unwrap();
            prop_assert_eq!(entry.from, before.level);
            prop_assert_eq!(entry.to, level);
            prop_assert_eq!(entry.change, delta);
        }
    }
}
