//! Journal entry types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tw_core::GameDate;

/// A single entry in the session journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// The story moved to another scene.
    SceneChange {
        /// `forward` or `back`.
        kind: String,
        /// Scene left.
        from: String,
        /// Scene entered.
        to: String,
        /// Title of the scene entered.
        title: String,
        /// In-world date after the move.
        date: GameDate,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// A scene recalled without moving.
    Flashback {
        /// Scene recalled.
        scene: String,
        /// Its title.
        title: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// Several scenes passed at once.
    Montage {
        /// Scenes in order.
        scenes: Vec<String>,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// A new stage within the current scene.
    Stage {
        /// Current scene.
        scene: String,
        /// Stage entered.
        stage: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// A skill check requested by the narrator.
    SkillCheck {
        /// Why the check was made.
        reason: String,
        /// Full check breakdown.
        summary: String,
        /// Whether it succeeded.
        success: bool,
        /// When rolled.
        timestamp: DateTime<Utc>,
    },
    /// The conversation passed to an NPC.
    NpcDialogue {
        /// NPC id.
        npc_id: String,
        /// Display name.
        name: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// A story beat was completed.
    Beat {
        /// Beat id.
        beat: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// The player made a decision.
    Decision {
        /// Decision id.
        id: String,
        /// The choice.
        choice: String,
        /// Scene it was made in.
        scene: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// An NPC's disposition changed.
    Disposition {
        /// NPC id.
        npc_id: String,
        /// Requested delta.
        change: i32,
        /// Why.
        reason: String,
        /// Resulting level.
        level: i8,
        /// Label of the resulting level.
        label: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// The PC tried to get gated knowledge out of an NPC.
    KnowledgeAccess {
        /// NPC asked.
        npc_id: String,
        /// Knowledge key.
        key: String,
        /// Whether it was revealed.
        accessible: bool,
        /// Explanation.
        reason: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// An NPC revealed a fact to the others present.
    FactRevealed {
        /// NPC who revealed it.
        npc_id: String,
        /// The fact.
        fact: String,
        /// NPCs who heard it.
        witnesses: Vec<String>,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
    /// A player note.
    Note {
        /// The note text.
        text: String,
        /// When recorded.
        timestamp: DateTime<Utc>,
    },
}

impl JournalEntry {
    /// When the entry was recorded.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SceneChange { timestamp, .. }
            | Self::Flashback { timestamp, .. }
            | Self::Montage { timestamp, .. }
            | Self::Stage { timestamp, .. }
            | Self::SkillCheck { timestamp, .. }
            | Self::NpcDialogue { timestamp, .. }
            | Self::Beat { timestamp, .. }
            | Self::Decision { timestamp, .. }
            | Self::Disposition { timestamp, .. }
            | Self::KnowledgeAccess { timestamp, .. }
            | Self::FactRevealed { timestamp, .. }
            | Self::Note { timestamp, .. } => *timestamp,
        }
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SceneChange {
                kind,
                from,
                to,
                title,
                date,
                ..
            } => write!(f, "{title} ({date}): {from} -> {to}, {kind}"),
            Self::Flashback { title, .. } => write!(f, "Flashback: {title}"),
            Self::Montage { scenes, .. } => write!(f, "Montage: {}", scenes.join(" -> ")),
            Self::Stage { scene, stage, .. } => write!(f, "Stage ({scene}): {stage}"),
            Self::SkillCheck {
                reason,
                summary,
                success,
                ..
            } => {
                let outcome = if *success { "Success" } else { "Failure" };
                write!(f, "Check, {reason}: {summary}, {outcome}")
            }
            Self::NpcDialogue { name, .. } => write!(f, "{name} joins the conversation"),
            Self::Beat { beat, .. } => write!(f, "Beat complete: {beat}"),
            Self::Decision { id, choice, .. } => write!(f, "Decision ({id}): {choice}"),
            Self::Disposition {
                npc_id,
                change,
                reason,
                label,
                ..
            } => write!(f, "Disposition ({npc_id}): {change:+}, now {label} ({reason})"),
            Self::KnowledgeAccess {
                npc_id,
                key,
                accessible,
                reason,
                ..
            } => {
                let verdict = if *accessible { "revealed" } else { "withheld" };
                write!(f, "Knowledge ({npc_id}/{key}): {verdict}, {reason}")
            }
            Self::FactRevealed {
                npc_id,
                fact,
                witnesses,
                ..
            } if witnesses.is_empty() => write!(f, "{npc_id} reveals: {fact}"),
            Self::FactRevealed {
                npc_id,
                fact,
                witnesses,
                ..
            } => write!(
                f,
                "{npc_id} reveals: {fact} (overheard by {})",
                witnesses.join(", ")
            ),
            Self::Note { text, .. } => write!(f, "Note: {text}"),
        }
    }
}
