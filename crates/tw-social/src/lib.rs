//! NPC relationships and knowledge for Taleweaver.
//!
//! Durable stores, one JSON file each:
//!
//! - [`DispositionLedger`]: how each NPC feels about each PC.
//! - [`KnowledgeGate`]: which gated facts each PC has earned.
//! - [`WorldKnowledge`]: facts shared across NPCs.
//! - [`MentionLog`]: what NPCs have said about each other.
//!
//! Session-only, in memory:
//!
//! - [`SessionKnowledge`]: facts spreading between NPCs present in a scene.

pub mod disposition;
pub mod knowledge;
pub mod mentions;
pub mod session;
pub mod world;

pub use disposition::{
    DispositionChange, DispositionLabel, DispositionLedger, DispositionRecord, MAX_DISPOSITION,
    MIN_DISPOSITION, check_disposition_cap,
};
pub use knowledge::{AccessResult, AccessibleKnowledge, KnowledgeGate, PREVIOUSLY_UNLOCKED};
pub use mentions::{Mention, MentionLog};
pub use session::{SessionKnowledge, SharedKnowledge, TrackedNpc};
pub use world::{
    FACTION_PREFIX, KNOWN_BY_ALL, SharedFact, WorldKnowledge, check_contradiction,
    filter_by_faction,
};
