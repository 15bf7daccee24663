//! Narration-driven play sessions.
//!
//! `StorySession` ties one player character's story to the social stores.
//! The host feeds it each narration; any directive in the text is applied
//! and journaled. Disposition changes, gated questions, and revealed
//! facts come in through their own calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use tw_core::{CheckRequirement, ContentSource, NpcConfig, TimeSkip};
use tw_mechanics::{CharacterSheet, SkillCheckResult, attempt};
use tw_social::{
    AccessResult, DispositionLabel, DispositionLedger, KnowledgeGate, Mention, MentionLog,
    SessionKnowledge, SharedFact, SharedKnowledge, WorldKnowledge, check_contradiction,
    check_disposition_cap,
};
use tw_story::{
    CompletionNotifier, Decision, Directive, MontageOutcome, SceneMachine, StageChange,
    StoryState, Transition, TransitionKind, parse_directive, plot_summary, scene_control_summary,
};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::journal::{Journal, JournalEntry};

/// The effect of a directive.
#[derive(Debug, Clone)]
pub enum Applied {
    /// A scene change or flashback.
    Transition(Transition),
    /// A montage.
    Montage(MontageOutcome),
    /// A stage change.
    Stage(StageChange),
    /// A skill check was rolled.
    SkillCheck {
        /// Why the narrator asked for it.
        reason: String,
        /// The outcome.
        result: SkillCheckResult,
    },
    /// An NPC took over the conversation.
    NpcDialogue {
        /// NPC id.
        npc_id: String,
        /// Display name.
        name: String,
    },
    /// A beat was completed.
    BeatComplete {
        /// Beat id.
        beat_id: String,
        /// False if it had already been completed.
        newly_completed: bool,
    },
    /// A decision was recorded.
    Decision(Decision),
}

/// A shared fact after it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactUpdate {
    /// The fact as stored.
    pub fact: SharedFact,
    /// The earlier version it contradicted, if any.
    pub contradicted: Option<SharedFact>,
}

/// One player character playing one adventure.
pub struct StorySession {
    id: Uuid,
    pc_id: String,
    sheet: CharacterSheet,
    content: Arc<dyn ContentSource>,
    machine: SceneMachine,
    dispositions: DispositionLedger,
    gate: KnowledgeGate,
    world: WorldKnowledge,
    mentions: MentionLog,
    knowledge: SessionKnowledge,
    active_npc: Option<String>,
    journal: Journal,
    rng: StdRng,
}

impl std::fmt::Debug for StorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorySession")
            .field("id", &self.id)
            .field("pc_id", &self.pc_id)
            .field("machine", &self.machine)
            .field("active_npc", &self.active_npc)
            .finish_non_exhaustive()
    }
}

impl StorySession {
    /// Open or resume `adventure_id` for the character `pc_id`.
    pub fn new(
        content: Arc<dyn ContentSource>,
        config: &SessionConfig,
        adventure_id: &str,
        pc_id: &str,
        sheet: CharacterSheet,
    ) -> SessionResult<Self> {
        let paths = config.data_paths();
        let machine = SceneMachine::open(Arc::clone(&content), &paths, adventure_id, pc_id)?
            .with_history_limit(config.history_limit);
        let id = Uuid::new_v4();
        tracing::info!(session = %id, adventure = adventure_id, pc = pc_id, "session opened");

        Ok(Self {
            id,
            pc_id: pc_id.to_string(),
            sheet,
            content,
            machine,
            dispositions: DispositionLedger::open(&paths),
            gate: KnowledgeGate::open(&paths),
            world: WorldKnowledge::open(&paths),
            mentions: MentionLog::open(&paths),
            knowledge: SessionKnowledge::new(),
            active_npc: None,
            journal: Journal::new(id),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Deliver completion triggers through `notifier`.
    pub fn with_notifier(mut self, notifier: impl CompletionNotifier + 'static) -> Self {
        self.machine = self.machine.with_notifier(notifier);
        self
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The player character's id.
    pub fn pc_id(&self) -> &str {
        &self.pc_id
    }

    /// The player character's sheet.
    pub fn sheet(&self) -> &CharacterSheet {
        &self.sheet
    }

    /// The story state.
    pub fn state(&self) -> &StoryState {
        self.machine.state()
    }

    /// The scene machine.
    pub fn machine(&self) -> &SceneMachine {
        &self.machine
    }

    /// The session journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// NPCs present and what they've overheard.
    pub fn knowledge(&self) -> &SessionKnowledge {
        &self.knowledge
    }

    /// The NPC currently talking, if any.
    pub fn active_npc(&self) -> Option<&str> {
        self.active_npc.as_deref()
    }

    /// The disposition ledger.
    pub fn dispositions(&self) -> &DispositionLedger {
        &self.dispositions
    }

    /// Shared facts.
    pub fn world(&self) -> &WorldKnowledge {
        &self.world
    }

    /// Apply the directive in a narration, if it carries one.
    pub fn apply_narration(&mut self, text: &str) -> SessionResult<Option<Applied>> {
        match parse_directive(text) {
            Some(directive) => self.apply_directive(directive).map(Some),
            None => Ok(None),
        }
    }

    /// Apply one directive.
    pub fn apply_directive(&mut self, directive: Directive) -> SessionResult<Applied> {
        tracing::debug!(directive = %directive, "applying directive");
        match directive {
            Directive::Scene {
                scene_id,
                time_skip,
            } => self.move_to(&scene_id, time_skip),
            Directive::Flashback { scene_id } => {
                let t = self.machine.execute_flashback(&scene_id)?;
                self.journal.append(JournalEntry::Flashback {
                    scene: t.scene.id.clone(),
                    title: t.scene.title.clone(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::Transition(t))
            }
            Directive::Montage { scene_ids } => {
                let out = self.machine.execute_montage(&scene_ids)?;
                self.journal.append(JournalEntry::Montage {
                    scenes: out.scenes.clone(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::Montage(out))
            }
            Directive::Stage { stage_id } => {
                let change = self.machine.advance_stage(&stage_id)?;
                self.journal.append(JournalEntry::Stage {
                    scene: self.machine.state().current_scene().to_string(),
                    stage: change.current.clone(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::Stage(change))
            }
            Directive::SkillCheck {
                skill,
                threshold,
                reason,
            } => {
                let result = self.roll_check(&CheckRequirement::new(skill, threshold));
                self.journal.append(JournalEntry::SkillCheck {
                    reason: reason.clone(),
                    summary: result.to_string(),
                    success: result.success(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::SkillCheck { reason, result })
            }
            Directive::NpcDialogue { npc_id } => {
                let name = match self.content.npc(&npc_id) {
                    Ok(npc) => npc.name,
                    Err(e) => {
                        tracing::warn!(npc = %npc_id, error = %e, "npc not configured");
                        npc_id.clone()
                    }
                };
                self.knowledge.track_npc(npc_id.clone(), name.clone());
                self.active_npc = Some(npc_id.clone());
                self.journal.append(JournalEntry::NpcDialogue {
                    npc_id: npc_id.clone(),
                    name: name.clone(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::NpcDialogue { npc_id, name })
            }
            Directive::BeatComplete { beat_id } => {
                let newly_completed = self.machine.complete_beat(&beat_id)?;
                if newly_completed {
                    self.journal.append(JournalEntry::Beat {
                        beat: beat_id.clone(),
                        timestamp: Utc::now(),
                    });
                }
                Ok(Applied::BeatComplete {
                    beat_id,
                    newly_completed,
                })
            }
            Directive::Decision { id, value } => {
                let decision = self
                    .machine
                    .record_decision(&id, &value, None, BTreeMap::new())?;
                self.journal.append(JournalEntry::Decision {
                    id: decision.id.clone(),
                    choice: decision.choice.clone(),
                    scene: decision.scene.clone(),
                    timestamp: Utc::now(),
                });
                Ok(Applied::Decision(decision))
            }
        }
    }

    fn move_to(&mut self, scene_id: &str, time_skip: Option<TimeSkip>) -> SessionResult<Applied> {
        let t = self
            .machine
            .advance_to_scene(scene_id, TransitionKind::Forward, time_skip)?;
        self.journal_transition(&t);
        Ok(Applied::Transition(t))
    }

    fn journal_transition(&mut self, t: &Transition) {
        self.journal.append(JournalEntry::SceneChange {
            kind: t.kind.to_string(),
            from: t.from.clone(),
            to: t.scene.id.clone(),
            title: t.scene.title.clone(),
            date: t.game_date,
            timestamp: Utc::now(),
        });
    }

    fn roll_check(&mut self, requirement: &CheckRequirement) -> SkillCheckResult {
        attempt(&mut self.rng, &self.sheet, requirement)
    }

    /// Return to the previous scene.
    pub fn go_back(&mut self) -> SessionResult<Transition> {
        let t = self.machine.go_back_to_scene()?;
        self.journal_transition(&t);
        Ok(t)
    }

    /// `npc_id` reveals `fact` to every other NPC present.
    pub fn reveal_fact(&mut self, npc_id: &str, fact: &str) -> SharedKnowledge {
        let entry = self.knowledge.propagate_knowledge(npc_id, fact);
        self.journal.append(JournalEntry::FactRevealed {
            npc_id: npc_id.to_string(),
            fact: entry.fact.clone(),
            witnesses: entry.witnesses.clone(),
            timestamp: Utc::now(),
        });
        entry
    }

    /// Store a fact durably for the NPCs in `known_by` (everyone if empty).
    ///
    /// A contradiction of an earlier version is reported, and the new
    /// version replaces it.
    pub fn share_fact(
        &mut self,
        fact_id: &str,
        content: &str,
        known_by: Vec<String>,
    ) -> SessionResult<FactUpdate> {
        let candidate = SharedFact::new(fact_id, content, known_by);
        let existing = self.world.all_facts();
        let contradicted = check_contradiction(&candidate, &existing).cloned();
        if let Some(old) = &contradicted {
            tracing::warn!(fact = fact_id, old = %old.content, new = content, "shared fact contradicted");
        }
        let fact = self
            .world
            .add_shared_fact(fact_id, content, candidate.known_by)?;
        Ok(FactUpdate { fact, contradicted })
    }

    /// Record that `by_npc` told the PC something about `about_npc`.
    pub fn record_mention(
        &mut self,
        by_npc: &str,
        about_npc: &str,
        content: &str,
    ) -> SessionResult<()> {
        self.mentions
            .record_npc_mention(by_npc, about_npc, &self.pc_id, content)?;
        Ok(())
    }

    /// What the PC has heard about `npc_id`.
    pub fn mentions_about(&self, npc_id: &str) -> Vec<Mention> {
        self.mentions.get_mentions_about(npc_id, &self.pc_id)
    }

    /// Shift how `npc_id` feels about the PC, dated today in-world.
    pub fn adjust_disposition(
        &mut self,
        npc_id: &str,
        delta: i32,
        reason: &str,
    ) -> SessionResult<i8> {
        let date = self.machine.state().game_date();
        let level = self
            .dispositions
            .modify_disposition(npc_id, &self.pc_id, delta, reason, date)?;
        self.journal.append(JournalEntry::Disposition {
            npc_id: npc_id.to_string(),
            change: delta,
            reason: reason.to_string(),
            level,
            label: DispositionLabel::from_level(level).to_string(),
            timestamp: Utc::now(),
        });
        Ok(level)
    }

    /// Note an impression the PC made on `npc_id`.
    pub fn add_impression(&mut self, npc_id: &str, impression: &str) -> SessionResult<()> {
        self.dispositions
            .add_impression(npc_id, &self.pc_id, impression)?;
        Ok(())
    }

    /// The level `npc_id` shows toward the PC, after its authored cap.
    pub fn visible_disposition(&self, npc_id: &str, npc: &NpcConfig) -> i8 {
        let record = self.dispositions.get_disposition(npc_id, &self.pc_id);
        check_disposition_cap(npc, record.level)
    }

    /// Ask `npc_id` for the gated knowledge under `key`.
    pub fn ask_gated(&mut self, npc_id: &str, key: &str) -> SessionResult<AccessResult> {
        let npc = self.content.npc(npc_id)?;
        let info = npc
            .gated_knowledge
            .get(key)
            .ok_or_else(|| SessionError::UnknownGatedKey {
                npc_id: npc_id.to_string(),
                key: key.to_string(),
            })?;
        let result = self.gate.attempt_access(
            &mut self.rng,
            info,
            &self.sheet,
            &self.pc_id,
            npc_id,
            key,
        )?;
        self.journal.append(JournalEntry::KnowledgeAccess {
            npc_id: npc_id.to_string(),
            key: key.to_string(),
            accessible: result.accessible,
            reason: result.reason.clone(),
            timestamp: Utc::now(),
        });
        Ok(result)
    }

    /// Add a player note to the journal.
    pub fn note(&mut self, text: &str) {
        self.journal.append(JournalEntry::Note {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Text for the narrator's prompt: where the story is, what has
    /// happened, and what the active NPC feels and knows.
    pub fn prompt_context(&self) -> String {
        let state = self.machine.state();
        let mut out = scene_control_summary(self.machine.adventure(), state);
        out.push_str("\n\n");
        out.push_str(&plot_summary(state));

        let Some(npc_id) = self.active_npc.as_deref() else {
            return out;
        };
        let npc = match self.content.npc(npc_id) {
            Ok(npc) => npc,
            Err(e) => {
                tracing::warn!(npc = npc_id, error = %e, "active npc not configured");
                return out;
            }
        };

        let level = self.visible_disposition(npc_id, &npc);
        out.push_str(&format!("\n\nACTIVE NPC: {} ({npc_id})\n", npc.name));
        out.push_str(&format!(
            "Disposition: {} ({level:+})\n",
            DispositionLabel::from_level(level)
        ));

        let known = self.gate.get_accessible_knowledge(&npc, npc_id, &self.pc_id);
        let mut facts = known.public;
        facts.extend(known.accessible.into_values());
        facts.extend(
            self.world
                .facts_for_npc(npc_id, &npc.factions)
                .into_iter()
                .map(|f| f.content),
        );
        facts.extend(self.knowledge.known_facts(npc_id).iter().cloned());
        if facts.is_empty() {
            out.push_str("Knows: (nothing)\n");
        } else {
            out.push_str("Knows:\n");
            for fact in facts {
                out.push_str(&format!("  - {fact}\n"));
            }
        }
        if !known.gated.is_empty() {
            out.push_str(&format!("Withholding: {}\n", known.gated.join(", ")));
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::{AdventureDef, GatedInfo, MemoryContent, SceneDef};

    fn content() -> Arc<dyn ContentSource> {
        let adventure = AdventureDef {
            id: "salvage".to_string(),
            title: "Salvage Run".to_string(),
            starting_scene: "intro".to_string(),
            ..AdventureDef::default()
        };
        let mut mara = NpcConfig {
            id: "mara".to_string(),
            name: "Mara Voss".to_string(),
            factions: vec!["syndicate".to_string()],
            knowledge_base: vec!["Runs the salvage yard".to_string()],
            ..NpcConfig::default()
        };
        mara.caps.max_without_deed = Some(1);
        mara.gated_knowledge.insert(
            "code".to_string(),
            GatedInfo {
                content: "The vault code is 7-1-9".to_string(),
                requires: CheckRequirement::new("Persuade", 2),
                unlock_on_success: true,
                alternates: vec![],
            },
        );
        Arc::new(
            MemoryContent::new()
                .with_adventure(
                    adventure,
                    vec![
                        SceneDef::new("intro", "Waking Up"),
                        SceneDef::new("dock", "The Dock"),
                    ],
                )
                .with_npc(mara),
        )
    }

    fn session(dir: &tempfile::TempDir) -> StorySession {
        let config = SessionConfig::default().with_data_dir(dir.path());
        let sheet = CharacterSheet::new("Kiri")
            .with_skill("Pilot-2")
            .with_skill("Persuade-1");
        StorySession::new(content(), &config, "salvage", "kiri", sheet).unwrap()
    }

    #[test]
    fn narration_without_directive() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        assert!(s.apply_narration("The engines hum.").unwrap().is_none());
        assert!(s.journal().is_empty());
    }

    #[test]
    fn scene_directive_moves_and_journals() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        let applied = s
            .apply_narration("You cycle the airlock. [SCENE: dock, TIME: +2d]")
            .unwrap();
        assert!(matches!(applied, Some(Applied::Transition(_))));
        assert_eq!(s.state().current_scene(), "dock");
        assert_eq!(s.state().game_date().to_string(), "003-1105");
        assert!(matches!(
            s.journal().entries()[0],
            JournalEntry::SceneChange { .. }
        ));

        let back = s.go_back().unwrap();
        assert_eq!(back.scene.id, "intro");
        assert_eq!(s.journal().len(), 2);
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        let err = s.apply_narration("[SCENE: nowhere]").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Story(tw_story::StoryError::SceneNotFound { .. })
        ));
        assert!(s.journal().is_empty());
    }

    #[test]
    fn skill_check_uses_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        let applied = s
            .apply_narration("[SKILL_CHECK: Pilot 2+ dock the ship]")
            .unwrap();
        match applied {
            Some(Applied::SkillCheck { reason, result }) => {
                assert_eq!(reason, "dock the ship");
                assert_eq!(result.skill_mod(), 2);
                assert!(result.success());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn npc_dialogue_tracks_npc() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.apply_narration("[NPC_DIALOGUE: mara]").unwrap();
        s.apply_narration("[NPC_DIALOGUE: stranger]").unwrap();
        assert_eq!(s.active_npc(), Some("stranger"));
        assert_eq!(s.knowledge().tracked()[0].name, "Mara Voss");
        assert_eq!(s.knowledge().tracked()[1].name, "stranger");

        let shared = s.reveal_fact("mara", "The vault is trapped");
        assert_eq!(shared.witnesses, ["stranger"]);
    }

    #[test]
    fn disposition_is_capped_for_narration() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        assert_eq!(s.adjust_disposition("mara", 3, "saved her yard").unwrap(), 3);
        let npc = s.content.npc("mara").unwrap();
        assert_eq!(s.visible_disposition("mara", &npc), 1);

        s.apply_narration("[NPC_DIALOGUE: mara]").unwrap();
        let ctx = s.prompt_context();
        assert!(ctx.contains("ACTIVE NPC: Mara Voss (mara)"));
        assert!(ctx.contains("Disposition: respectful (+1)"));
        assert!(ctx.contains("  - Runs the salvage yard"));
        assert!(ctx.contains("Withholding: code"));
    }

    #[test]
    fn gated_question_unlocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        let r = s.ask_gated("mara", "code").unwrap();
        assert!(r.accessible);
        let r = s.ask_gated("mara", "code").unwrap();
        assert_eq!(r.reason, "Previously unlocked");

        assert!(matches!(
            s.ask_gated("mara", "debts"),
            Err(SessionError::UnknownGatedKey { .. })
        ));
    }

    #[test]
    fn share_fact_reports_contradiction() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        let first = s.share_fact("war", "The war ended", vec![]).unwrap();
        assert!(first.contradicted.is_none());
        let second = s.share_fact("war", "The war resumed", vec![]).unwrap();
        assert_eq!(
            second.contradicted.map(|f| f.content),
            Some("The war ended".to_string())
        );
        assert_eq!(s.world().get_shared_facts("anyone").len(), 1);
    }

    #[test]
    fn mentions_are_per_pc() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.record_mention("mara", "vex", "He cheats at cards").unwrap();
        assert_eq!(s.mentions_about("vex").len(), 1);
        assert!(s.mentions_about("mara").is_empty());
    }
}
