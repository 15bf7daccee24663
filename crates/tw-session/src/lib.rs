//! Play sessions for Taleweaver.
//!
//! A [`StorySession`] is what a narrator host talks to: it applies the
//! directives found in each narration, rolls the checks they ask for,
//! keeps NPC relationships and knowledge up to date, and journals it
//! all. [`StorySession::prompt_context`] renders the state back as text
//! for the next prompt.

pub mod config;
pub mod error;
pub mod journal;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use journal::{Journal, JournalEntry};
pub use session::{Applied, FactUpdate, StorySession};
