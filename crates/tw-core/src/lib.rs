//! Core types for Taleweaver: the calendar, authored adventure content,
//! and the versioned JSON stores every persisted ledger is built on.
//!
//! Nothing here knows about scenes being played or NPCs changing their
//! minds; those live in `tw-story` and `tw-social`.

/// The `DDD-YYYY` in-world calendar and time skips.
pub mod calendar;
/// Adventure, scene, and NPC definitions and their loaders.
pub mod content;
/// Error types used throughout the crate.
pub mod error;
/// File layout of the data directory.
pub mod paths;
/// Whole-document JSON stores with optimistic versioning.
pub mod store;

/// Re-export calendar types.
pub use calendar::{GameDate, TimeSkip, TimeUnit};
/// Re-export content types.
pub use content::{
    AdventureDef, CheckRequirement, CompletionTrigger, ContentSource, DispositionCaps,
    FlagTrigger, GatedInfo, JsonContent, MemoryContent, NpcConfig, SceneDef, StageDef,
};
/// Re-export error types.
pub use error::{ContentKind, CoreError, CoreResult};
/// Re-export the data layout.
pub use paths::DataPaths;
/// Re-export store types.
pub use store::{JsonStore, Snapshot};
