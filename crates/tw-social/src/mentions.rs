//! Who told the PC what about whom.
//!
//! Durable: records "NPC A told PC P about NPC B", keyed by the NPC being
//! talked about and the PC who heard it. Kept apart from shared facts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tw_core::{CoreResult, DataPaths, JsonStore};

/// One NPC talking about another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// The NPC who spoke.
    pub by_npc: String,
    /// What was said.
    pub content: String,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct MentionBook {
    /// about npc -> pc -> mentions
    mentions: BTreeMap<String, BTreeMap<String, Vec<Mention>>>,
}

/// The persisted mention log.
#[derive(Debug, Clone)]
pub struct MentionLog {
    store: JsonStore<MentionBook>,
}

impl MentionLog {
    /// A log backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// The log at its standard place in the data directory.
    pub fn open(paths: &DataPaths) -> Self {
        Self::new(paths.mentions_file())
    }

    /// Record that `by_npc` told `pc_id` something about `about_npc`.
    pub fn record_npc_mention(
        &self,
        by_npc: &str,
        about_npc: &str,
        pc_id: &str,
        content: &str,
    ) -> CoreResult<()> {
        let mention = Mention {
            by_npc: by_npc.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        self.store.update(|book| {
            book.mentions
                .entry(about_npc.to_string())
                .or_default()
                .entry(pc_id.to_string())
                .or_default()
                .push(mention);
        })?;
        tracing::debug!(by = by_npc, about = about_npc, pc = pc_id, "npc mention recorded");
        Ok(())
    }

    /// Everything `pc_id` has heard about `about_npc`, oldest first.
    pub fn get_mentions_about(&self, about_npc: &str, pc_id: &str) -> Vec<Mention> {
        self.store
            .load()
            .data
            .mentions
            .remove(about_npc)
            .and_then(|mut by_pc| by_pc.remove(pc_id))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_are_keyed_by_subject_and_listener() {
        let dir = tempfile::tempdir().unwrap();
        let log = MentionLog::open(&DataPaths::new(dir.path()));
        log.record_npc_mention("mara", "vex", "kiri", "Don't trust him")
            .unwrap();
        log.record_npc_mention("ossa", "vex", "kiri", "He pays on time")
            .unwrap();
        log.record_npc_mention("mara", "vex", "jun", "Stay away")
            .unwrap();

        let heard = log.get_mentions_about("vex", "kiri");
        assert_eq!(heard.len(), 2);
        assert_eq!(heard[0].by_npc, "mara");
        assert_eq!(heard[1].content, "He pays on time");

        assert_eq!(log.get_mentions_about("vex", "jun").len(), 1);
        assert!(log.get_mentions_about("mara", "kiri").is_empty());
    }
}
