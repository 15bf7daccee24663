//! On-disk layout of persisted game data.

use std::path::{Path, PathBuf};

/// Locates every persisted file below a single root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Use `root` as the data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Story state for one player character in one adventure:
    /// `story/<adventure>/<pc>.json`, with both ids escaped.
    pub fn story_file(&self, adventure_id: &str, pc_id: &str) -> PathBuf {
        self.root
            .join("story")
            .join(escape(adventure_id))
            .join(format!("{}.json", escape(pc_id)))
    }

    /// The disposition ledger.
    pub fn dispositions_file(&self) -> PathBuf {
        self.root.join("dispositions.json")
    }

    /// The knowledge-gate unlock record.
    pub fn knowledge_file(&self) -> PathBuf {
        self.root.join("knowledge.json")
    }

    /// Facts shared across NPCs.
    pub fn world_facts_file(&self) -> PathBuf {
        self.root.join("world_facts.json")
    }

    /// The NPC mention log.
    pub fn mentions_file(&self) -> PathBuf {
        self.root.join("npc_mentions.json")
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Make an id safe as a single file name component.
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `_`
/// followed by two hex digits, and the empty id becomes `_`. Distinct ids
/// never share a name.
fn escape(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}
