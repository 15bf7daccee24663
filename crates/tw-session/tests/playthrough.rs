//! End-to-end play over JSON content in a temporary directory.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tw_core::{CompletionTrigger, JsonContent};
use tw_mechanics::CharacterSheet;
use tw_session::{Applied, JournalEntry, SessionConfig, SessionError, StorySession};
use tw_story::{CompletionContext, CompletionNotifier, NotifyError, StoryError};

/// Write a small three-scene adventure and one NPC below `root`.
fn write_content(root: &Path) {
    let adv = root.join("salvage");
    fs::create_dir_all(adv.join("scenes")).unwrap();
    fs::create_dir_all(root.join("npcs")).unwrap();
    fs::write(
        adv.join("adventure.json"),
        r#"{
    "id": "salvage",
    "title": "Salvage Run",
    "starting_scene": "intro",
    "start_date": "100-1105",
    "scenes": ["intro", "dock", "vault"]
}"#,
    )
    .unwrap();
    fs::write(
        adv.join("scenes/intro.json"),
        r#"{
    "id": "intro",
    "title": "Waking Up",
    "on_enter": [{ "flag": "awake" }],
    "on_exit": [{ "flag": "left_ship", "value": "yes" }],
    "on_complete": [{ "template": "welcome", "recipients": ["kiri"] }]
}"#,
    )
    .unwrap();
    fs::write(
        adv.join("scenes/dock.json"),
        r#"{
    "id": "dock",
    "title": "The Dock",
    "stages": [
        { "id": "arrival", "title": "Arrival" },
        { "id": "haggling", "title": "Haggling" }
    ]
}"#,
    )
    .unwrap();
    fs::write(
        adv.join("scenes/vault.json"),
        r#"{ "id": "vault", "title": "The Vault" }"#,
    )
    .unwrap();
    fs::write(
        root.join("npcs/mara.json"),
        r#"{
    "id": "mara",
    "name": "Mara Voss",
    "factions": ["syndicate"],
    "knowledge_base": ["Runs the salvage yard"],
    "gated_knowledge": {
        "code": {
            "content": "The vault code is 7-1-9",
            "requires": { "skill": "Persuade", "threshold": 3 },
            "unlock_on_success": true
        }
    },
    "caps": { "max_without_deed": 2 }
}"#,
    )
    .unwrap();
}

#[derive(Clone, Default)]
struct Outbox(Arc<Mutex<Vec<String>>>);

impl CompletionNotifier for Outbox {
    fn notify(
        &mut self,
        trigger: &CompletionTrigger,
        ctx: &CompletionContext<'_>,
    ) -> Result<(), NotifyError> {
        self.0
            .lock()
            .unwrap()
            .push(format!("{} for {} on {}", trigger.template, ctx.pc_id, ctx.game_date));
        Ok(())
    }
}

fn open(content_dir: &TempDir, data_dir: &TempDir) -> StorySession {
    let content = Arc::new(JsonContent::new(content_dir.path()));
    let config = SessionConfig::default()
        .with_seed(7)
        .with_data_dir(data_dir.path());
    let sheet = CharacterSheet::new("Kiri")
        .with_skill("Persuade-1")
        .with_skill("Pilot-1");
    StorySession::new(content, &config, "salvage", "kiri", sheet).unwrap()
}

#[test]
fn play_through_salvage_run() {
    let content_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    write_content(content_dir.path());
    let outbox = Outbox::default();
    let mut session = open(&content_dir, &data_dir).with_notifier(outbox.clone());

    assert_eq!(session.state().current_scene(), "intro");
    assert!(session.state().has_flag("awake"));

    session
        .apply_narration("You stumble out of the airlock. [SCENE: dock, TIME: +2d]")
        .unwrap();
    let state = session.state();
    assert_eq!(state.current_scene(), "dock");
    assert_eq!(state.current_stage(), Some("arrival"));
    assert_eq!(state.game_date().to_string(), "102-1105");
    assert!(state.is_scene_completed("intro"));
    assert!(state.has_flag("left_ship"));
    assert_eq!(
        *outbox.0.lock().unwrap(),
        ["welcome for kiri on 100-1105".to_string()]
    );

    session.apply_narration("[STAGE: haggling]").unwrap();
    assert!(matches!(
        session.apply_narration("[STAGE: fistfight]"),
        Err(SessionError::Story(StoryError::StageNotFound { .. }))
    ));
    assert_eq!(session.state().current_stage(), Some("haggling"));

    session.apply_narration("[NPC_DIALOGUE: mara]").unwrap();
    session.adjust_disposition("mara", 3, "paid in full").unwrap();
    let access = session.ask_gated("mara", "code").unwrap();
    assert!(access.accessible);
    assert_eq!(access.content.as_deref(), Some("The vault code is 7-1-9"));

    let ctx = session.prompt_context();
    assert!(ctx.contains("Disposition: friendly (+2)"));
    assert!(ctx.contains("  - The vault code is 7-1-9"));

    let applied = session
        .apply_narration("[DECISION: deal = partner] You shake on it.")
        .unwrap();
    assert!(matches!(applied, Some(Applied::Decision(ref d)) if d.scene == "dock"));

    session.apply_narration("[FLASHBACK: intro]").unwrap();
    assert_eq!(session.state().current_scene(), "dock");

    session.apply_narration("[SCENE: vault]").unwrap();
    let back = session.go_back().unwrap();
    assert_eq!(back.scene.id, "dock");
    assert_eq!(session.state().current_stage(), Some("arrival"));

    // Completing intro again must not resend its notification.
    assert_eq!(outbox.0.lock().unwrap().len(), 1);

    let journal = session.journal();
    assert!(
        journal
            .entries()
            .iter()
            .any(|e| matches!(e, JournalEntry::KnowledgeAccess { accessible: true, .. }))
    );
    let md = journal.export_markdown();
    assert!(md.contains("## The Dock"));
    assert!(md.contains("- Decision (deal): partner\n"));
}

#[test]
fn progress_survives_a_new_session() {
    let content_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    write_content(content_dir.path());

    {
        let mut session = open(&content_dir, &data_dir);
        session.apply_narration("[SCENE: dock]").unwrap();
        session.apply_narration("[BEAT_COMPLETE: met-mara]").unwrap();
        session.adjust_disposition("mara", -1, "haggled hard").unwrap();
        session
            .share_fact("raid", "The syndicate plans a raid", vec!["faction:syndicate".into()])
            .unwrap();
    }

    let mut session = open(&content_dir, &data_dir);
    assert_eq!(session.state().current_scene(), "dock");
    assert!(session.state().is_beat_completed("met-mara"));
    assert_eq!(session.state().history_len(), 1);
    assert_eq!(
        session.dispositions().get_disposition("mara", "kiri").level,
        -1
    );

    session.apply_narration("[NPC_DIALOGUE: mara]").unwrap();
    let ctx = session.prompt_context();
    assert!(ctx.contains("Disposition: dismissive (-1)"));
    assert!(ctx.contains("  - The syndicate plans a raid"));
    assert!(ctx.contains("Beats: met-mara"));
}

#[test]
fn montage_skips_history() {
    let content_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    write_content(content_dir.path());
    let mut session = open(&content_dir, &data_dir);

    let applied = session
        .apply_narration("Days blur together. [MONTAGE: dock, vault]")
        .unwrap();
    match applied {
        Some(Applied::Montage(out)) => assert_eq!(out.newly_completed, ["dock", "vault"]),
        other => panic!("unexpected: {other:?}"),
    }
    let state = session.state();
    assert_eq!(state.current_scene(), "vault");
    assert_eq!(state.current_stage(), None);
    assert_eq!(state.history_len(), 0);
    assert!(matches!(
        session.go_back(),
        Err(SessionError::Story(StoryError::HistoryEmpty))
    ));
}

#[test]
fn npc_config_id_does_not_split_records() {
    let content_dir = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    write_content(content_dir.path());
    fs::write(
        content_dir.path().join("npcs/vex.json"),
        r#"{
    "id": "vex-the-fence",
    "name": "Vex",
    "gated_knowledge": {
        "buyer": {
            "content": "The buyer waits on deck four",
            "requires": { "skill": "Persuade", "threshold": 2 },
            "unlock_on_success": true
        }
    }
}"#,
    )
    .unwrap();
    let mut session = open(&content_dir, &data_dir);

    session.adjust_disposition("vex", 2, "paid up front").unwrap();
    assert!(session.ask_gated("vex", "buyer").unwrap().accessible);

    session.apply_narration("[NPC_DIALOGUE: vex]").unwrap();
    let ctx = session.prompt_context();
    assert!(ctx.contains("ACTIVE NPC: Vex (vex)"));
    assert!(ctx.contains("Disposition: friendly (+2)"));
    assert!(ctx.contains("  - The buyer waits on deck four"));
    assert!(!ctx.contains("Withholding"));
}
