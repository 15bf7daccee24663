//! The scene state machine.
//!
//! A [`SceneMachine`] owns one player character's [`StoryState`] in one
//! adventure and moves it between scenes. Every mutating operation
//! persists the state before returning.
//!
//! A forward transition runs these steps in order:
//!
//! 1. the target scene is loaded (a missing target changes nothing),
//! 2. the scene being left is pushed onto the history,
//! 3. its `on_exit` flags are set,
//! 4. it is marked completed,
//! 5. the target's `on_enter` flags are set,
//! 6. the target becomes current, positioned at its first stage,
//! 7. any time skip advances the calendar,
//! 8. the new state is saved, and only then do the completion triggers
//!    of a scene completed for the first time fire.
//!
//! Steps 2 to 7 work on a copy, so a failed save changes nothing. Going
//! back skips step 2. A flashback only loads the scene.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strsim::jaro_winkler;
use tw_core::{
    AdventureDef, ContentSource, DataPaths, FlagTrigger, GameDate, JsonStore, SceneDef, Snapshot,
    TimeSkip,
};

use crate::error::{StoryError, StoryResult};
use crate::notify::{CompletionContext, CompletionNotifier, LogNotifier};
use crate::state::{Decision, SCENE_HISTORY_LIMIT, StoryState};

/// Minimum similarity for a scene id to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Maximum number of suggested scene ids.
const MAX_SUGGESTIONS: usize = 3;

/// How a scene change should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Ordinary move; the scene left is remembered for going back.
    Forward,
    /// Return to a remembered scene; history is not extended.
    Back,
    /// Recall a scene without moving or changing anything.
    Flashback,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Back => write!(f, "back"),
            Self::Flashback => write!(f, "flashback"),
        }
    }
}

/// The result of a scene change.
#[derive(Debug, Clone)]
pub struct Transition {
    /// How the change was made.
    pub kind: TransitionKind,
    /// Scene that was current before the change.
    pub from: String,
    /// The target scene.
    pub scene: SceneDef,
    /// Whether `from` was completed for the first time.
    pub first_completion: bool,
    /// In-world date after the change.
    pub game_date: GameDate,
}

/// The result of a montage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MontageOutcome {
    /// Scenes passed through, in order. The last is now current.
    pub scenes: Vec<String>,
    /// Scenes that had not been completed before.
    pub newly_completed: Vec<String>,
}

/// The result of moving between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageChange {
    /// Stage left, now recorded as completed.
    pub previous: Option<String>,
    /// Stage now current.
    pub current: String,
}

/// Drives one player character through one adventure.
pub struct SceneMachine {
    content: Arc<dyn ContentSource>,
    notifier: Box<dyn CompletionNotifier>,
    store: JsonStore<StoryState>,
    adventure: AdventureDef,
    snapshot: Snapshot<StoryState>,
    history_limit: usize,
}

impl std::fmt::Debug for SceneMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneMachine")
            .field("adventure", &self.adventure.id)
            .field("store", &self.store.path())
            .field("state", &self.snapshot.data)
            .field("version", &self.snapshot.version)
            .finish_non_exhaustive()
    }
}

impl SceneMachine {
    /// Open the story for `pc_id` in `adventure_id`.
    ///
    /// Saved state is resumed when present. Otherwise the story starts at
    /// the adventure's starting scene, whose `on_enter` flags are applied,
    /// and the fresh state is saved. A story file that belongs to another
    /// character is never overwritten: it fails with
    /// [`StoryError::ForeignState`].
    pub fn open(
        content: Arc<dyn ContentSource>,
        paths: &DataPaths,
        adventure_id: &str,
        pc_id: &str,
    ) -> StoryResult<Self> {
        let adventure = content.adventure(adventure_id)?;
        let store = JsonStore::new(paths.story_file(adventure_id, pc_id));
        let snapshot = store.load();
        let mut machine = Self {
            content,
            notifier: Box::new(LogNotifier),
            store,
            adventure,
            snapshot,
            history_limit: SCENE_HISTORY_LIMIT,
        };

        if machine.snapshot.data.belongs_to(adventure_id, pc_id) {
            tracing::debug!(
                adventure = adventure_id,
                pc = pc_id,
                scene = machine.snapshot.data.current_scene(),
                "story resumed"
            );
        } else if machine.snapshot.version > 0 && !machine.snapshot.data.adventure_id().is_empty() {
            let found = &machine.snapshot.data;
            return Err(StoryError::ForeignState {
                path: machine.store.path().to_path_buf(),
                adventure_id: found.adventure_id().to_string(),
                pc_id: found.pc_id().to_string(),
            });
        } else {
            machine.initialize(pc_id)?;
        }
        Ok(machine)
    }

    /// Use `notifier` for completion triggers.
    pub fn with_notifier(mut self, notifier: impl CompletionNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Remember at most `limit` scenes for going back.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    fn initialize(&mut self, pc_id: &str) -> StoryResult<()> {
        let start_id = self.adventure.starting_scene.clone();
        let start = self.load_scene(&start_id)?;
        let mut state = StoryState::new(
            self.adventure.id.clone(),
            pc_id,
            start_id.clone(),
            self.adventure.start_date,
        );
        state.set_stage(start.first_stage().map(|s| s.id.clone()));
        apply_flags(&mut state, &start.on_enter);
        self.commit(state)?;
        tracing::info!(
            adventure = %self.adventure.id,
            pc = pc_id,
            scene = %start_id,
            "story started"
        );
        Ok(())
    }

    /// The story state.
    pub fn state(&self) -> &StoryState {
        &self.snapshot.data
    }

    /// The adventure being played.
    pub fn adventure(&self) -> &AdventureDef {
        &self.adventure
    }

    /// Version stamp of the last save.
    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    /// Definition of the current scene.
    pub fn current_scene_def(&self) -> StoryResult<SceneDef> {
        self.load_scene(self.snapshot.data.current_scene())
    }

    /// Load a scene of this adventure, suggesting near misses when it
    /// does not exist.
    pub fn load_scene(&self, scene_id: &str) -> StoryResult<SceneDef> {
        match self.content.scene(&self.adventure.id, scene_id) {
            Ok(scene) => Ok(scene),
            Err(e) if e.is_not_found() => Err(StoryError::SceneNotFound {
                scene_id: scene_id.to_string(),
                suggestions: suggest_scenes(scene_id, &self.adventure.scenes),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-read the saved state, discarding unsaved changes.
    ///
    /// Used to recover after a write conflict.
    pub fn reload(&mut self) {
        let snapshot = self.store.load();
        let state = &self.snapshot.data;
        if snapshot.data.belongs_to(state.adventure_id(), state.pc_id()) {
            self.snapshot = snapshot;
        } else {
            tracing::warn!(path = %self.store.path().display(), "saved story unusable, keeping memory state");
        }
    }

    /// Move to `target`.
    ///
    /// Fails with [`StoryError::SceneNotFound`] without changing anything
    /// when the target does not exist. A flashback ignores `time_skip`.
    /// Nothing changes either when the save fails, and completion
    /// triggers fire only once the new state is saved.
    pub fn advance_to_scene(
        &mut self,
        target: &str,
        kind: TransitionKind,
        time_skip: Option<TimeSkip>,
    ) -> StoryResult<Transition> {
        let state = self.snapshot.data.clone();
        self.transition(state, target, kind, time_skip)
    }

    fn transition(
        &mut self,
        mut state: StoryState,
        target: &str,
        kind: TransitionKind,
        time_skip: Option<TimeSkip>,
    ) -> StoryResult<Transition> {
        let scene = self.load_scene(target)?;
        let from = self.snapshot.data.current_scene().to_string();

        if kind == TransitionKind::Flashback {
            tracing::debug!(from = %from, scene = target, "flashback");
            return Ok(Transition {
                kind,
                from,
                scene,
                first_completion: false,
                game_date: self.snapshot.data.game_date(),
            });
        }

        let leaving = match self.content.scene(&self.adventure.id, &from) {
            Ok(def) => Some(def),
            Err(e) => {
                tracing::warn!(scene = %from, error = %e, "current scene unavailable, skipping exit triggers");
                None
            }
        };

        if kind == TransitionKind::Forward {
            state.push_history(from.clone(), self.history_limit);
        }
        if let Some(leaving) = &leaving {
            apply_flags(&mut state, &leaving.on_exit);
        }
        let first_completion = state.mark_scene_completed(&from);
        let completed_on = state.game_date();

        apply_flags(&mut state, &scene.on_enter);
        state.set_position(target, scene.first_stage().map(|s| s.id.clone()));
        if let Some(skip) = time_skip {
            state.set_game_date(state.game_date().apply_time_skip(skip));
        }
        let game_date = state.game_date();

        self.commit(state)?;
        if let Some(leaving) = leaving.as_ref().filter(|_| first_completion) {
            self.notify_completion(leaving, completed_on);
        }
        tracing::info!(
            from = %from,
            to = target,
            kind = %kind,
            date = %game_date,
            "scene transition"
        );
        Ok(Transition {
            kind,
            from,
            scene,
            first_completion,
            game_date,
        })
    }

    /// Return to the most recent scene in the history.
    ///
    /// On failure the history is left as it was.
    pub fn go_back_to_scene(&mut self) -> StoryResult<Transition> {
        let mut state = self.snapshot.data.clone();
        let previous = state.pop_history().ok_or(StoryError::HistoryEmpty)?;
        self.transition(state, &previous, TransitionKind::Back, None)
    }

    /// Recall `scene_id` without changing any state.
    pub fn execute_flashback(&mut self, scene_id: &str) -> StoryResult<Transition> {
        self.advance_to_scene(scene_id, TransitionKind::Flashback, None)
    }

    /// Pass through `scene_ids`, marking each completed and ending on the
    /// last.
    ///
    /// No triggers fire, no history is recorded, and ids are not checked
    /// against the adventure.
    pub fn execute_montage(&mut self, scene_ids: &[String]) -> StoryResult<MontageOutcome> {
        let last = scene_ids.last().ok_or(StoryError::EmptyMontage)?;
        let mut state = self.snapshot.data.clone();
        let newly_completed: Vec<String> = scene_ids
            .iter()
            .filter(|id| state.mark_scene_completed(id))
            .cloned()
            .collect();
        state.set_position(last.clone(), None);
        self.commit(state)?;
        tracing::info!(scenes = ?scene_ids, "montage");
        Ok(MontageOutcome {
            scenes: scene_ids.to_vec(),
            newly_completed,
        })
    }

    /// Move to another stage of the current scene.
    ///
    /// The stage being left is recorded as completed. When the scene
    /// defines stages, `stage_id` must be one of them.
    pub fn advance_stage(&mut self, stage_id: &str) -> StoryResult<StageChange> {
        let scene_id = self.snapshot.data.current_scene().to_string();
        match self.content.scene(&self.adventure.id, &scene_id) {
            Ok(def) if !def.stages.is_empty() && !def.has_stage(stage_id) => {
                return Err(StoryError::StageNotFound {
                    scene_id,
                    stage_id: stage_id.to_string(),
                });
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let mut state = self.snapshot.data.clone();
        let previous = state.current_stage().map(str::to_string);
        if let Some(prev) = previous.as_deref().filter(|prev| *prev != stage_id) {
            state.mark_stage_completed(&scene_id, prev);
        }
        state.set_stage(Some(stage_id.to_string()));
        self.commit(state)?;
        tracing::debug!(scene = %scene_id, stage = stage_id, "stage advanced");
        Ok(StageChange {
            previous,
            current: stage_id.to_string(),
        })
    }

    /// Advance the calendar.
    pub fn apply_time_skip(&mut self, skip: TimeSkip) -> StoryResult<GameDate> {
        let mut state = self.snapshot.data.clone();
        let date = state.game_date().apply_time_skip(skip);
        state.set_game_date(date);
        self.commit(state)?;
        Ok(date)
    }

    /// Mark a story beat complete. Returns false if it already was.
    pub fn complete_beat(&mut self, beat_id: &str) -> StoryResult<bool> {
        let mut state = self.snapshot.data.clone();
        let added = state.complete_beat(beat_id);
        if added {
            self.commit(state)?;
            tracing::info!(beat = beat_id, "beat completed");
        }
        Ok(added)
    }

    /// Record a decision made in the current scene.
    pub fn record_decision(
        &mut self,
        id: &str,
        choice: &str,
        details: Option<String>,
        consequences: BTreeMap<String, Value>,
    ) -> StoryResult<Decision> {
        let mut state = self.snapshot.data.clone();
        let decision = state
            .record_decision(id, choice, details, consequences)
            .clone();
        self.commit(state)?;
        tracing::info!(decision = id, choice, "decision recorded");
        Ok(decision)
    }

    /// Set a story flag.
    pub fn set_flag(&mut self, name: &str, value: Value) -> StoryResult<()> {
        let mut state = self.snapshot.data.clone();
        state.set_flag(name, value);
        self.commit(state)
    }

    fn notify_completion(&mut self, scene: &SceneDef, completed_on: GameDate) {
        let ctx = CompletionContext {
            adventure_id: &self.adventure.id,
            pc_id: self.snapshot.data.pc_id(),
            scene,
            game_date: completed_on,
        };
        for trigger in &scene.on_complete {
            if let Err(e) = self.notifier.notify(trigger, &ctx) {
                tracing::warn!(scene = %scene.id, template = %trigger.template, error = %e, "completion trigger failed");
            }
        }
    }

    /// Save `state` over the loaded version and make it current. A failed
    /// save leaves the machine untouched.
    fn commit(&mut self, mut state: StoryState) -> StoryResult<()> {
        state.touch();
        let mut snapshot = Snapshot {
            version: self.snapshot.version,
            data: state,
        };
        snapshot.version = self.store.save(&snapshot)?;
        self.snapshot = snapshot;
        Ok(())
    }
}

fn apply_flags(state: &mut StoryState, triggers: &[FlagTrigger]) {
    for trigger in triggers {
        state.set_flag(trigger.flag.clone(), trigger.value.clone());
    }
}

/// Scene ids similar to `input`, best match first.
fn suggest_scenes(input: &str, candidates: &[String]) -> Vec<String> {
    let input_lower = input.to_lowercase();
    let mut matches: Vec<(&String, f64)> = candidates
        .iter()
        .filter_map(|id| {
            let score = jaro_winkler(&input_lower, &id.to_lowercase());
            (score >= SUGGESTION_THRESHOLD).then_some((id, score))
        })
        .collect();

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(id, _)| id.clone())
        .collect()
}
