//! Story engine for Taleweaver.
//!
//! Parses the directives a narrator embeds in its prose and moves a
//! player character's story through an adventure's scenes: forward
//! moves, going back, flashbacks, montages, stages, beats, decisions,
//! and calendar time skips. State is persisted after every change.

pub mod directive;
/// Error types for the story engine.
pub mod error;
pub mod machine;
pub mod notify;
pub mod state;
pub mod summary;

pub use directive::{Directive, parse_directive, strip_directives};
pub use error::{StoryError, StoryResult};
pub use machine::{MontageOutcome, SceneMachine, StageChange, Transition, TransitionKind};
pub use notify::{CompletionContext, CompletionNotifier, LogNotifier, NotifyError};
pub use state::{Decision, SCENE_HISTORY_LIMIT, StoryState};
pub use summary::{plot_summary, scene_control_summary};
