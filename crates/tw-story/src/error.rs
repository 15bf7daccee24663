//! Error types for the story engine.

use std::path::PathBuf;

use thiserror::Error;
use tw_core::CoreError;

/// Result type for story operations.
pub type StoryResult<T> = Result<T, StoryError>;

/// Errors raised by scene transitions and story bookkeeping.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The target scene does not exist in the adventure.
    #[error("scene not found: \"{scene_id}\"{}", did_you_mean(.suggestions))]
    SceneNotFound {
        /// The id that failed to resolve.
        scene_id: String,
        /// Similar scene ids, best first.
        suggestions: Vec<String>,
    },

    /// The current scene defines stages and this is not one of them.
    #[error("stage \"{stage_id}\" not found in scene \"{scene_id}\"")]
    StageNotFound {
        /// Scene being played.
        scene_id: String,
        /// The stage that was requested.
        stage_id: String,
    },

    /// There is no previous scene to go back to.
    #[error("no previous scene to return to")]
    HistoryEmpty,

    /// A montage named no scenes.
    #[error("montage needs at least one scene")]
    EmptyMontage,

    /// The story file holds another character's story.
    #[error("{} holds the story of \"{pc_id}\" in \"{adventure_id}\"", .path.display())]
    ForeignState {
        /// The story file.
        path: PathBuf,
        /// Adventure found in the file.
        adventure_id: String,
        /// Player character found in the file.
        pc_id: String,
    },

    /// Content loading or persistence failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
