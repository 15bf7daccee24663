//! Persistent story state for one player character in one adventure.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tw_core::GameDate;

/// Default number of scenes remembered for going back.
pub const SCENE_HISTORY_LIMIT: usize = 10;

/// A choice the player made, with where and when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Decision identifier.
    pub id: String,
    /// Wall-clock time the decision was recorded.
    pub timestamp: DateTime<Utc>,
    /// Scene the decision was made in.
    pub scene: String,
    /// The option chosen.
    pub choice: String,
    /// Free-form elaboration.
    #[serde(default)]
    pub details: Option<String>,
    /// Named consequences for later scenes to consult.
    #[serde(default)]
    pub consequences: BTreeMap<String, Value>,
}

/// Everything the story remembers between sessions.
///
/// Completion lists only ever grow. The history holds the scenes left by
/// forward moves, most recent last, capped at a configurable length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryState {
    adventure_id: String,
    pc_id: String,
    current_scene: String,
    current_stage: Option<String>,
    completed_scenes: Vec<String>,
    completed_stages: BTreeMap<String, Vec<String>>,
    completed_beats: Vec<String>,
    decisions: BTreeMap<String, Decision>,
    flags: BTreeMap<String, Value>,
    game_date: GameDate,
    scene_history: VecDeque<String>,
    last_played: Option<DateTime<Utc>>,
}

impl StoryState {
    /// Fresh state positioned at `starting_scene`.
    pub fn new(
        adventure_id: impl Into<String>,
        pc_id: impl Into<String>,
        starting_scene: impl Into<String>,
        game_date: GameDate,
    ) -> Self {
        Self {
            adventure_id: adventure_id.into(),
            pc_id: pc_id.into(),
            current_scene: starting_scene.into(),
            game_date,
            ..Self::default()
        }
    }

    /// Whether this state belongs to the given adventure and character.
    ///
    /// A default (never initialized) state matches nothing.
    pub fn belongs_to(&self, adventure_id: &str, pc_id: &str) -> bool {
        !self.current_scene.is_empty() && self.adventure_id == adventure_id && self.pc_id == pc_id
    }

    /// Adventure identifier.
    pub fn adventure_id(&self) -> &str {
        &self.adventure_id
    }

    /// Player character identifier.
    pub fn pc_id(&self) -> &str {
        &self.pc_id
    }

    /// Scene being played.
    pub fn current_scene(&self) -> &str {
        &self.current_scene
    }

    /// Stage within the current scene, if any.
    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    /// In-world date.
    pub fn game_date(&self) -> GameDate {
        self.game_date
    }

    /// Last time the state was saved.
    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        self.last_played
    }

    /// Completed scenes in completion order.
    pub fn completed_scenes(&self) -> &[String] {
        &self.completed_scenes
    }

    /// Whether a scene has been completed.
    pub fn is_scene_completed(&self, scene_id: &str) -> bool {
        self.completed_scenes.iter().any(|s| s == scene_id)
    }

    /// Completed stages of one scene.
    pub fn completed_stages(&self, scene_id: &str) -> &[String] {
        self.completed_stages
            .get(scene_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Completed story beats in completion order.
    pub fn completed_beats(&self) -> &[String] {
        &self.completed_beats
    }

    /// Whether a beat has been completed.
    pub fn is_beat_completed(&self, beat_id: &str) -> bool {
        self.completed_beats.iter().any(|b| b == beat_id)
    }

    /// Look up a recorded decision.
    pub fn decision(&self, id: &str) -> Option<&Decision> {
        self.decisions.get(id)
    }

    /// All recorded decisions, by id.
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.values()
    }

    /// Raw value of a flag.
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    /// Whether a flag is set to anything other than `false` or `null`.
    pub fn has_flag(&self, name: &str) -> bool {
        !matches!(self.flags.get(name), None | Some(Value::Null | Value::Bool(false)))
    }

    /// All flags, by name.
    pub fn flags(&self) -> &BTreeMap<String, Value> {
        &self.flags
    }

    /// Scenes available to go back to, oldest first.
    pub fn scene_history(&self) -> impl Iterator<Item = &str> {
        self.scene_history.iter().map(String::as_str)
    }

    /// Number of scenes available to go back to.
    pub fn history_len(&self) -> usize {
        self.scene_history.len()
    }

    /// Set a flag, replacing any previous value.
    pub fn set_flag(&mut self, name: impl Into<String>, value: Value) {
        self.flags.insert(name.into(), value);
    }

    /// Mark a beat complete. Returns false if it already was.
    pub fn complete_beat(&mut self, beat_id: impl Into<String>) -> bool {
        let beat_id = beat_id.into();
        if self.is_beat_completed(&beat_id) {
            return false;
        }
        self.completed_beats.push(beat_id);
        true
    }

    /// Record a decision made in the current scene, replacing any earlier
    /// decision with the same id.
    pub fn record_decision(
        &mut self,
        id: impl Into<String>,
        choice: impl Into<String>,
        details: Option<String>,
        consequences: BTreeMap<String, Value>,
    ) -> &Decision {
        let id = id.into();
        let decision = Decision {
            id: id.clone(),
            timestamp: Utc::now(),
            scene: self.current_scene.clone(),
            choice: choice.into(),
            details,
            consequences,
        };
        self.decisions.insert(id.clone(), decision);
        &self.decisions[&id]
    }

    pub(crate) fn set_position(&mut self, scene_id: impl Into<String>, stage: Option<String>) {
        self.current_scene = scene_id.into();
        self.current_stage = stage;
    }

    pub(crate) fn set_stage(&mut self, stage: Option<String>) {
        self.current_stage = stage;
    }

    pub(crate) fn set_game_date(&mut self, date: GameDate) {
        self.game_date = date;
    }

    /// Returns true when the scene was not already completed.
    pub(crate) fn mark_scene_completed(&mut self, scene_id: &str) -> bool {
        if self.is_scene_completed(scene_id) {
            return false;
        }
        self.completed_scenes.push(scene_id.to_string());
        true
    }

    pub(crate) fn mark_stage_completed(&mut self, scene_id: &str, stage_id: &str) -> bool {
        let stages = self.completed_stages.entry(scene_id.to_string()).or_default();
        if stages.iter().any(|s| s == stage_id) {
            return false;
        }
        stages.push(stage_id.to_string());
        true
    }

    pub(crate) fn push_history(&mut self, scene_id: impl Into<String>, limit: usize) {
        self.scene_history.push_back(scene_id.into());
        while self.scene_history.len() > limit {
            self.scene_history.pop_front();
        }
    }

    pub(crate) fn pop_history(&mut self) -> Option<String> {
        self.scene_history.pop_back()
    }

    pub(crate) fn touch(&mut self) {
        self.last_played = Some(Utc::now());
    }
}
