use std::path::PathBuf;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// The kind of authored content a lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// An adventure definition.
    Adventure,
    /// A scene within an adventure.
    Scene,
    /// An NPC configuration.
    Npc,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adventure => write!(f, "adventure"),
            Self::Scene => write!(f, "scene"),
            Self::Npc => write!(f, "npc"),
        }
    }
}

/// Errors raised by content loading and store writes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Referenced content does not exist.
    #[error("{kind} not found: \"{id}\"")]
    NotFound {
        /// What was being looked up.
        kind: ContentKind,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A game date string was not in `DDD-YYYY` form.
    #[error("invalid game date: \"{0}\"")]
    InvalidDate(String),

    /// Another writer saved the document after it was loaded.
    #[error("write conflict on {}: loaded version {expected}, found {found}", .path.display())]
    Conflict {
        /// The contended file.
        path: PathBuf,
        /// Version the writer loaded.
        expected: u64,
        /// Version currently on disk.
        found: u64,
    },

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Authored content or a document could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`].
    pub fn not_found(kind: ContentKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
