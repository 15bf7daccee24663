//! Authored adventure content and the loaders that read it.
//!
//! Content is read-only at runtime. Scenes, NPCs, and adventures are
//! authored as JSON and looked up by id through a [`ContentSource`].
//! A failed lookup is always [`CoreError::NotFound`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calendar::GameDate;
use crate::error::{ContentKind, CoreError, CoreResult};

/// Top-level definition of an adventure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdventureDef {
    /// Adventure identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Scene the story starts in.
    pub starting_scene: String,
    /// Calendar date at the start of play.
    pub start_date: GameDate,
    /// Every scene id in authored order.
    pub scenes: Vec<String>,
}

/// A scene: one node of the story graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDef {
    /// Scene identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// The act this scene belongs to, if the adventure uses acts.
    pub act: Option<String>,
    /// Short narrative summary for the narrator.
    pub summary: String,
    /// Optional sub-steps within the scene, in order.
    pub stages: Vec<StageDef>,
    /// Flags set whenever the scene is entered.
    pub on_enter: Vec<FlagTrigger>,
    /// Flags set whenever the scene is left.
    pub on_exit: Vec<FlagTrigger>,
    /// Notifications sent the first time the scene is completed.
    pub on_complete: Vec<CompletionTrigger>,
}

impl SceneDef {
    /// Create a bare scene with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// The first stage of this scene, if it has any.
    pub fn first_stage(&self) -> Option<&StageDef> {
        self.stages.first()
    }

    /// Whether the scene defines a stage with this id.
    pub fn has_stage(&self, stage_id: &str) -> bool {
        self.stages.iter().any(|s| s.id == stage_id)
    }
}

/// A named step inside a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDef {
    /// Stage identifier, unique within its scene.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Sets a story flag when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagTrigger {
    /// Flag name.
    pub flag: String,
    /// Value to store; defaults to `true`.
    #[serde(default = "default_flag_value")]
    pub value: serde_json::Value,
}

fn default_flag_value() -> serde_json::Value {
    serde_json::Value::Bool(true)
}

impl FlagTrigger {
    /// A trigger that sets `flag` to `true`.
    pub fn set(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: default_flag_value(),
        }
    }
}

/// A notification to send when a scene is completed for the first time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionTrigger {
    /// Message template name understood by the notifier.
    pub template: String,
    /// Recipient addresses.
    pub recipients: Vec<String>,
}

/// A skill check that must be passed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckRequirement {
    /// Skill name, matched loosely against the character's skills.
    pub skill: String,
    /// Target total (the `N` in `N+`).
    pub threshold: i32,
    /// Characteristic whose modifier applies, if any.
    pub attribute: Option<String>,
    /// Situational modifier.
    pub modifier: i32,
}

impl CheckRequirement {
    /// A plain `skill threshold+` requirement.
    pub fn new(skill: impl Into<String>, threshold: i32) -> Self {
        Self {
            skill: skill.into(),
            threshold,
            ..Self::default()
        }
    }
}

/// Knowledge an NPC only shares after a successful check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatedInfo {
    /// The withheld information.
    pub content: String,
    /// Primary check.
    pub requires: CheckRequirement,
    /// Record a permanent unlock when a check succeeds.
    pub unlock_on_success: bool,
    /// Fallback checks tried in order when the primary fails.
    pub alternates: Vec<CheckRequirement>,
}

/// Ceilings applied to a disposition before it reaches narration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispositionCaps {
    /// Highest level the NPC shows until the PC has done a qualifying deed.
    pub max_without_deed: Option<i8>,
}

/// Authored configuration for one NPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// NPC identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Factions the NPC belongs to.
    pub factions: Vec<String>,
    /// Facts the NPC shares freely.
    pub knowledge_base: Vec<String>,
    /// Facts behind a skill check, by key.
    pub gated_knowledge: BTreeMap<String, GatedInfo>,
    /// Disposition ceilings.
    pub caps: DispositionCaps,
}

/// Read-only lookup of authored content by id.
pub trait ContentSource {
    /// Load an adventure definition.
    fn adventure(&self, adventure_id: &str) -> CoreResult<AdventureDef>;

    /// Load one scene of an adventure.
    fn scene(&self, adventure_id: &str, scene_id: &str) -> CoreResult<SceneDef>;

    /// Load an NPC configuration.
    fn npc(&self, npc_id: &str) -> CoreResult<NpcConfig>;
}

/// Content read from a directory of JSON files.
///
/// Layout:
///
/// ```text
/// <root>/<adventure>/adventure.json
/// <root>/<adventure>/scenes/<scene>.json
/// <root>/npcs/<npc>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonContent {
    root: PathBuf,
}

impl JsonContent {
    /// Read content below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read<T: serde::de::DeserializeOwned>(
        path: &Path,
        kind: ContentKind,
        id: &str,
    ) -> CoreResult<T> {
        // Ids come from narration; refuse anything that could escape the root.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(CoreError::not_found(kind, id));
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::not_found(kind, id));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }
}

impl ContentSource for JsonContent {
    fn adventure(&self, adventure_id: &str) -> CoreResult<AdventureDef> {
        let path = self.root.join(adventure_id).join("adventure.json");
        Self::read(&path, ContentKind::Adventure, adventure_id)
    }

    fn scene(&self, adventure_id: &str, scene_id: &str) -> CoreResult<SceneDef> {
        let path = self
            .root
            .join(adventure_id)
            .join("scenes")
            .join(format!("{scene_id}.json"));
        Self::read(&path, ContentKind::Scene, scene_id)
    }

    fn npc(&self, npc_id: &str) -> CoreResult<NpcConfig> {
        let path = self.root.join("npcs").join(format!("{npc_id}.json"));
        let mut npc: NpcConfig = Self::read(&path, ContentKind::Npc, npc_id)?;
        if npc.id.is_empty() {
            npc.id = npc_id.to_string();
        }
        Ok(npc)
    }
}

/// Content held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryContent {
    adventures: HashMap<String, AdventureDef>,
    scenes: HashMap<(String, String), SceneDef>,
    npcs: HashMap<String, NpcConfig>,
}

impl MemoryContent {
    /// Create an empty content set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adventure together with its scenes.
    ///
    /// Scene ids missing from `adventure.scenes` are appended in order.
    pub fn with_adventure(mut self, mut adventure: AdventureDef, scenes: Vec<SceneDef>) -> Self {
        for scene in scenes {
            if !adventure.scenes.contains(&scene.id) {
                adventure.scenes.push(scene.id.clone());
            }
            self.scenes
                .insert((adventure.id.clone(), scene.id.clone()), scene);
        }
        self.adventures.insert(adventure.id.clone(), adventure);
        self
    }

    /// Add an NPC.
    pub fn with_npc(mut self, npc: NpcConfig) -> Self {
        self.npcs.insert(npc.id.clone(), npc);
        self
    }
}

impl ContentSource for MemoryContent {
    fn adventure(&self, adventure_id: &str) -> CoreResult<AdventureDef> {
        self.adventures
            .get(adventure_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(ContentKind::Adventure, adventure_id))
    }

    fn scene(&self, adventure_id: &str, scene_id: &str) -> CoreResult<SceneDef> {
        self.scenes
            .get(&(adventure_id.to_string(), scene_id.to_string()))
            .cloned()
            .ok_or_else(|| CoreError::not_found(ContentKind::Scene, scene_id))
    }

    fn npc(&self, npc_id: &str) -> CoreResult<NpcConfig> {
        self.npcs
            .get(npc_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(ContentKind::Npc, npc_id))
    }
}
