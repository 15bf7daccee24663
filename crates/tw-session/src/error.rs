//! Error types for play sessions.

use thiserror::Error;
use tw_core::CoreError;
use tw_story::StoryError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur during a play session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The NPC has no gated knowledge under this key.
    #[error("npc \"{npc_id}\" has no gated knowledge \"{key}\"")]
    UnknownGatedKey {
        /// NPC asked.
        npc_id: String,
        /// Key requested.
        key: String,
    },

    /// Story engine error.
    #[error(transparent)]
    Story(#[from] StoryError),

    /// Content or persistence error.
    #[error(transparent)]
    Core(#[from] CoreError),
}
