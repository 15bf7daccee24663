//! Journal storage and export.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::JournalEntry;

/// A chronological log of session events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    session_id: Uuid,
    entries: Vec<JournalEntry>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl Journal {
    /// Create an empty journal for a session.
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            entries: Vec::new(),
        }
    }

    /// The session this journal belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Append an entry to the journal.
    pub fn append(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Get all entries.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the journal as markdown. Each scene change opens a section.
    pub fn export_markdown(&self) -> String {
        let mut out = format!("# Session Journal\n\n*Session {}*\n", self.session_id);
        for entry in &self.entries {
            match entry {
                JournalEntry::SceneChange { title, date, .. } => {
                    out.push_str(&format!("\n## {title}\n\n*{date}*\n\n"));
                }
                JournalEntry::Note { text, .. } => out.push_str(&format!("> {text}\n")),
                other => out.push_str(&format!("- {other}\n")),
            }
        }
        out
    }

    /// Export the journal as plain text, one timestamped line per entry.
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "Session Journal\n===============\nSession {}\n\n",
            self.session_id
        );
        for entry in &self.entries {
            out.push_str(&format!(
                "[{}] {entry}\n",
                entry.timestamp().format("%H:%M:%S")
            ));
        }
        out
    }
}
