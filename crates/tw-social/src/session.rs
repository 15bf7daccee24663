//! In-session knowledge propagation.
//!
//! Session-only: nothing here is persisted. When one NPC reveals a fact,
//! every other NPC tracked in the session hears it too. The source never
//! counts as its own witness.

use serde::{Deserialize, Serialize};

/// An NPC present in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedNpc {
    /// NPC id.
    pub npc_id: String,
    /// Display name.
    pub name: String,
    /// Facts heard from other NPCs this session, oldest first.
    pub known_facts: Vec<String>,
}

/// A fact revealed during the session and who heard it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedKnowledge {
    /// The fact.
    pub fact: String,
    /// NPC who revealed it.
    pub source: String,
    /// NPCs who heard it.
    pub witnesses: Vec<String>,
}

/// NPCs present in the session and what they've overheard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionKnowledge {
    npcs: Vec<TrackedNpc>,
    shared_knowledge: Vec<SharedKnowledge>,
}

impl SessionKnowledge {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an NPC. Returns false if it already was.
    pub fn track_npc(&mut self, npc_id: impl Into<String>, name: impl Into<String>) -> bool {
        let npc_id = npc_id.into();
        if self.is_tracked(&npc_id) {
            return false;
        }
        self.npcs.push(TrackedNpc {
            npc_id,
            name: name.into(),
            known_facts: Vec::new(),
        });
        true
    }

    /// Stop tracking an NPC. Returns true if found.
    pub fn untrack_npc(&mut self, npc_id: &str) -> bool {
        let len_before = self.npcs.len();
        self.npcs.retain(|n| n.npc_id != npc_id);
        self.npcs.len() < len_before
    }

    /// Whether an NPC is tracked.
    pub fn is_tracked(&self, npc_id: &str) -> bool {
        self.npcs.iter().any(|n| n.npc_id == npc_id)
    }

    /// Tracked NPCs in the order they arrived.
    pub fn tracked(&self) -> &[TrackedNpc] {
        &self.npcs
    }

    /// Number of tracked NPCs.
    pub fn count(&self) -> usize {
        self.npcs.len()
    }

    /// Facts a tracked NPC has heard. Empty for untracked NPCs.
    pub fn known_facts(&self, npc_id: &str) -> &[String] {
        self.npcs
            .iter()
            .find(|n| n.npc_id == npc_id)
            .map(|n| n.known_facts.as_slice())
            .unwrap_or(&[])
    }

    /// Every fact revealed this session, in order.
    pub fn shared_knowledge(&self) -> &[SharedKnowledge] {
        &self.shared_knowledge
    }

    /// `source_npc_id` reveals `fact` to everyone else present. Returns the
    /// entry appended to [`Self::shared_knowledge`].
    pub fn propagate_knowledge(
        &mut self,
        source_npc_id: &str,
        fact: impl Into<String>,
    ) -> SharedKnowledge {
        let fact = fact.into();
        let mut witnesses = Vec::new();
        for npc in self.npcs.iter_mut().filter(|n| n.npc_id != source_npc_id) {
            if !npc.known_facts.contains(&fact) {
                npc.known_facts.push(fact.clone());
            }
            witnesses.push(npc.npc_id.clone());
        }
        tracing::debug!(source = source_npc_id, witnesses = witnesses.len(), "knowledge propagated");
        let entry = SharedKnowledge {
            fact,
            source: source_npc_id.to_string(),
            witnesses,
        };
        self.shared_knowledge.push(entry.clone());
        entry
    }
}
