//! Information an NPC only shares once the PC earns it.
//!
//! Durable: unlocks are recorded per `(pc, npc, key)` and never revoked.
//! Until a key is unlocked every attempt is a fresh roll; once it is,
//! attempts return the cached result without rolling.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tw_core::{CoreResult, DataPaths, GatedInfo, JsonStore, NpcConfig};
use tw_mechanics::{CharacterSheet, SkillCheckResult, attempt};

/// Reason given for a cached unlock.
pub const PREVIOUSLY_UNLOCKED: &str = "Previously unlocked";

/// The outcome of trying to get gated information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessResult {
    /// Whether the information was revealed.
    pub accessible: bool,
    /// The information, when revealed.
    pub content: Option<String>,
    /// Human-readable explanation.
    pub reason: String,
    /// Checks rolled for this attempt, in order. Empty for cached unlocks.
    pub checks: Vec<SkillCheckResult>,
}

/// What an NPC will tell a PC right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibleKnowledge {
    /// Freely shared facts.
    pub public: Vec<String>,
    /// Gated facts already unlocked, by key.
    pub accessible: BTreeMap<String, String>,
    /// Keys still locked. Their content is withheld.
    pub gated: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UnlockBook {
    /// pc -> npc -> keys
    unlocked: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl UnlockBook {
    fn contains(&self, pc_id: &str, npc_id: &str, key: &str) -> bool {
        self.unlocked
            .get(pc_id)
            .and_then(|by_npc| by_npc.get(npc_id))
            .is_some_and(|keys| keys.contains(key))
    }
}

/// The persisted record of unlocked knowledge.
#[derive(Debug, Clone)]
pub struct KnowledgeGate {
    store: JsonStore<UnlockBook>,
}

impl KnowledgeGate {
    /// A gate backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// The gate at its standard place in the data directory.
    pub fn open(paths: &DataPaths) -> Self {
        Self::new(paths.knowledge_file())
    }

    /// Whether `pc_id` has unlocked `key` from `npc_id`.
    pub fn is_unlocked(&self, pc_id: &str, npc_id: &str, key: &str) -> bool {
        self.store.load().data.contains(pc_id, npc_id, key)
    }

    /// Record an unlock. Returns false if it was already unlocked.
    pub fn unlock(&self, pc_id: &str, npc_id: &str, key: &str) -> CoreResult<bool> {
        let added = self.store.update(|book| {
            book.unlocked
                .entry(pc_id.to_string())
                .or_default()
                .entry(npc_id.to_string())
                .or_default()
                .insert(key.to_string())
        })?;
        if added {
            tracing::info!(pc = pc_id, npc = npc_id, key, "knowledge unlocked");
        }
        Ok(added)
    }

    /// Try to get `info` out of `npc_id`.
    ///
    /// A cached unlock returns immediately. Otherwise the primary check is
    /// rolled, then each alternate in order, stopping at the first success.
    pub fn attempt_access(
        &self,
        rng: &mut StdRng,
        info: &GatedInfo,
        sheet: &CharacterSheet,
        pc_id: &str,
        npc_id: &str,
        key: &str,
    ) -> CoreResult<AccessResult> {
        if self.is_unlocked(pc_id, npc_id, key) {
            tracing::debug!(pc = pc_id, npc = npc_id, key, "cached unlock");
            return Ok(AccessResult {
                accessible: true,
                content: Some(info.content.clone()),
                reason: PREVIOUSLY_UNLOCKED.to_string(),
                checks: Vec::new(),
            });
        }

        let mut checks = Vec::new();
        for requirement in std::iter::once(&info.requires).chain(&info.alternates) {
            let result = attempt(rng, sheet, requirement);
            let success = result.success();
            let total = result.total();
            checks.push(result);
            if success {
                if info.unlock_on_success {
                    self.unlock(pc_id, npc_id, key)?;
                }
                return Ok(AccessResult {
                    accessible: true,
                    content: Some(info.content.clone()),
                    reason: format!(
                        "Passed {} check (rolled {total} vs {}+)",
                        requirement.skill, requirement.threshold
                    ),
                    checks,
                });
            }
        }

        tracing::debug!(pc = pc_id, npc = npc_id, key, attempts = checks.len(), "access denied");
        Ok(AccessResult {
            accessible: false,
            content: None,
            reason: format!("Failed {} check", info.requires.skill),
            checks,
        })
    }

    /// Split the knowledge of `npc`, looked up as `npc_id`, into what
    /// `pc_id` may hear and what stays locked.
    pub fn get_accessible_knowledge(
        &self,
        npc: &NpcConfig,
        npc_id: &str,
        pc_id: &str,
    ) -> AccessibleKnowledge {
        let book = self.store.load().data;
        let mut out = AccessibleKnowledge {
            public: npc.knowledge_base.clone(),
            ..AccessibleKnowledge::default()
        };
        for (key, info) in &npc.gated_knowledge {
            if book.contains(pc_id, npc_id, key) {
                out.accessible.insert(key.clone(), info.content.clone());
            } else {
                out.gated.push(key.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tw_core::CheckRequirement;

    fn gate(dir: &tempfile::TempDir) -> KnowledgeGate {
        KnowledgeGate::open(&DataPaths::new(dir.path()))
    }

    fn info(threshold: i32, unlock: bool) -> GatedInfo {
        GatedInfo {
            content: "The vault code is 7-1-9".to_string(),
            requires: CheckRequirement::new("Persuade", threshold),
            unlock_on_success: unlock,
            alternates: Vec::new(),
        }
    }

    fn sheet() -> CharacterSheet {
        CharacterSheet::new("Kiri").with_skill("Persuade-1")
    }

    #[test]
    fn sure_success_unlocks_then_caches() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut rng = StdRng::seed_from_u64(1);

        // 2d6 + 1 always beats 3+.
        let first = g
            .attempt_access(&mut rng, &info(3, true), &sheet(), "kiri", "mara", "code")
            .unwrap();
        assert!(first.accessible);
        assert_eq!(first.checks.len(), 1);
        assert!(first.reason.starts_with("Passed Persuade check (rolled "));
        assert!(first.reason.ends_with(" vs 3+)"));
        assert!(g.is_unlocked("kiri", "mara", "code"));

        // Impossible now, but the unlock is cached.
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let again = g
                .attempt_access(&mut rng, &info(99, true), &sheet(), "kiri", "mara", "code")
                .unwrap();
            assert!(again.accessible);
            assert_eq!(again.reason, PREVIOUSLY_UNLOCKED);
            assert!(again.checks.is_empty());
        }
    }

    #[test]
    fn failures_reroll_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut rng = StdRng::seed_from_u64(7);

        let mut rolls = BTreeSet::new();
        for _ in 0..20 {
            let r = g
                .attempt_access(&mut rng, &info(99, true), &sheet(), "kiri", "mara", "code")
                .unwrap();
            assert!(!r.accessible);
            assert_eq!(r.content, None);
            assert_eq!(r.reason, "Failed Persuade check");
            assert_eq!(r.checks.len(), 1);
            rolls.insert(r.checks[0].roll());
        }
        // Independent rolls, not a cached failure.
        assert!(rolls.len() > 1);
        assert!(!g.is_unlocked("kiri", "mara", "code"));
    }

    #[test]
    fn success_without_unlock_flag_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut rng = StdRng::seed_from_u64(3);
        let r = g
            .attempt_access(&mut rng, &info(3, false), &sheet(), "kiri", "mara", "code")
            .unwrap();
        assert!(r.accessible);
        assert!(!g.is_unlocked("kiri", "mara", "code"));
    }

    #[test]
    fn alternate_check_can_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut rng = StdRng::seed_from_u64(11);
        let mut gated = info(99, true);
        gated.alternates.push(CheckRequirement::new("Streetwise", 99));
        gated.alternates.push(CheckRequirement::new("Deception", -20));

        let r = g
            .attempt_access(&mut rng, &gated, &sheet(), "kiri", "mara", "code")
            .unwrap();
        assert!(r.accessible);
        assert_eq!(r.checks.len(), 3);
        assert!(r.reason.starts_with("Passed Deception check"));
        assert!(g.is_unlocked("kiri", "mara", "code"));
    }

    #[test]
    fn unlocks_are_scoped_per_pc_and_npc() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        assert!(g.unlock("kiri", "mara", "code").unwrap());
        assert!(!g.unlock("kiri", "mara", "code").unwrap());
        assert!(!g.is_unlocked("ossa", "mara", "code"));
        assert!(!g.is_unlocked("kiri", "vex", "code"));
    }

    #[test]
    fn accessible_knowledge_splits_gated() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut npc = NpcConfig {
            id: "mara".to_string(),
            name: "Mara Voss".to_string(),
            knowledge_base: vec!["Runs the salvage yard".to_string()],
            ..NpcConfig::default()
        };
        npc.gated_knowledge.insert("code".to_string(), info(8, true));
        npc.gated_knowledge.insert(
            "debts".to_string(),
            GatedInfo {
                content: "Owes the syndicate".to_string(),
                ..GatedInfo::default()
            },
        );
        g.unlock("kiri", "mara", "code").unwrap();

        let k = g.get_accessible_knowledge(&npc, "mara", "kiri");
        assert_eq!(k.public, ["Runs the salvage yard"]);
        assert_eq!(k.accessible["code"], "The vault code is 7-1-9");
        assert_eq!(k.gated, ["debts"]);

        let k = g.get_accessible_knowledge(&npc, "mara", "ossa");
        assert!(k.accessible.is_empty());
        assert_eq!(k.gated, ["code", "debts"]);
    }

    #[test]
    fn unlocks_follow_lookup_id_not_config_id() {
        let dir = tempfile::tempdir().unwrap();
        let g = gate(&dir);
        let mut npc = NpcConfig::default();
        npc.gated_knowledge.insert("code".to_string(), info(8, true));
        g.unlock("kiri", "mara", "code").unwrap();

        let k = g.get_accessible_knowledge(&npc, "mara", "kiri");
        assert_eq!(k.accessible["code"], "The vault code is 7-1-9");
        assert!(k.gated.is_empty());

        npc.id = "mara-voss".to_string();
        let k = g.get_accessible_knowledge(&npc, "mara", "kiri");
        assert!(k.accessible.contains_key("code"));
    }
}
