//! Facts shared across NPCs.
//!
//! Durable: one JSON file for the whole installation. A fact's `known_by`
//! scope is either `["all"]`, a list of NPC ids, or a list of
//! `faction:<name>` entries (the forms can be mixed). Adding a fact with
//! an existing id replaces it in place.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tw_core::{CoreResult, DataPaths, JsonStore};

/// Scope entry visible to every NPC.
pub const KNOWN_BY_ALL: &str = "all";

/// Prefix of faction scope entries.
pub const FACTION_PREFIX: &str = "faction:";

/// A fact some set of NPCs knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFact {
    /// Unique fact id.
    pub id: String,
    /// The fact itself.
    pub content: String,
    /// Who knows it.
    pub known_by: Vec<String>,
    /// When it was last written.
    pub timestamp: DateTime<Utc>,
}

impl SharedFact {
    /// A fact stamped now. An empty scope means everyone.
    pub fn new(id: impl Into<String>, content: impl Into<String>, known_by: Vec<String>) -> Self {
        let known_by = if known_by.is_empty() {
            vec![KNOWN_BY_ALL.to_string()]
        } else {
            known_by
        };
        Self {
            id: id.into(),
            content: content.into(),
            known_by,
            timestamp: Utc::now(),
        }
    }

    /// Known to everyone, or to `npc_id` by name.
    pub fn is_known_by(&self, npc_id: &str) -> bool {
        self.known_by
            .iter()
            .any(|scope| scope == KNOWN_BY_ALL || scope == npc_id)
    }

    /// Known to everyone, or to a member of one of `factions`.
    pub fn is_known_by_faction(&self, factions: &[String]) -> bool {
        self.known_by.iter().any(|scope| {
            scope == KNOWN_BY_ALL
                || scope
                    .strip_prefix(FACTION_PREFIX)
                    .is_some_and(|faction| factions.iter().any(|f| f == faction))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FactBook {
    facts: Vec<SharedFact>,
}

/// The persisted shared-fact store.
#[derive(Debug, Clone)]
pub struct WorldKnowledge {
    store: JsonStore<FactBook>,
}

impl WorldKnowledge {
    /// A store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// The store at its standard place in the data directory.
    pub fn open(paths: &DataPaths) -> Self {
        Self::new(paths.world_facts_file())
    }

    /// Add a fact, or replace the one with the same id.
    pub fn add_shared_fact(
        &self,
        id: &str,
        content: &str,
        known_by: Vec<String>,
    ) -> CoreResult<SharedFact> {
        let fact = SharedFact::new(id, content, known_by);
        let replaced = self.store.update(|book| {
            match book.facts.iter_mut().find(|f| f.id == fact.id) {
                Some(existing) => {
                    *existing = fact.clone();
                    true
                }
                None => {
                    book.facts.push(fact.clone());
                    false
                }
            }
        })?;
        tracing::info!(fact = id, scope = ?fact.known_by, replaced, "shared fact stored");
        Ok(fact)
    }

    /// Remove a fact. Returns false if there was none.
    pub fn remove_shared_fact(&self, id: &str) -> CoreResult<bool> {
        self.store.update(|book| {
            let before = book.facts.len();
            book.facts.retain(|f| f.id != id);
            book.facts.len() < before
        })
    }

    /// Every stored fact.
    pub fn all_facts(&self) -> Vec<SharedFact> {
        self.store.load().data.facts
    }

    /// Facts known to everyone or to `npc_id` by name.
    pub fn get_shared_facts(&self, npc_id: &str) -> Vec<SharedFact> {
        self.all_facts()
            .into_iter()
            .filter(|f| f.is_known_by(npc_id))
            .collect()
    }

    /// Everything `npc_id` knows, by name or through `factions`.
    pub fn facts_for_npc(&self, npc_id: &str, factions: &[String]) -> Vec<SharedFact> {
        self.all_facts()
            .into_iter()
            .filter(|f| f.is_known_by(npc_id) || f.is_known_by_faction(factions))
            .collect()
    }
}

/// Facts from `facts` visible to a member of `factions`.
pub fn filter_by_faction(facts: &[SharedFact], factions: &[String]) -> Vec<SharedFact> {
    facts
        .iter()
        .filter(|f| f.is_known_by_faction(factions))
        .cloned()
        .collect()
}

/// The existing fact `new` contradicts, if any: same id, different content.
pub fn check_contradiction<'a>(
    new: &SharedFact,
    existing: &'a [SharedFact],
) -> Option<&'a SharedFact> {
    existing
        .iter()
        .find(|f| f.id == new.id && f.content != new.content)
}
