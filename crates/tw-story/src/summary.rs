//! Plain-text summaries of story state for the narrator's prompt.

use tw_core::AdventureDef;

use crate::state::StoryState;

/// Directive syntax reminder appended to the scene control block.
const DIRECTIVE_HELP: &str = "[SCENE: id] [SCENE: id, TIME: +Nd] [FLASHBACK: id] \
[MONTAGE: id, id] [STAGE: id] [SKILL_CHECK: Skill N+ reason] [DECISION: id = value] \
[BEAT_COMPLETE: id] [NPC_DIALOGUE: id]";

/// Where the story is and where it can go.
pub fn scene_control_summary(adventure: &AdventureDef, state: &StoryState) -> String {
    let mut out = format!("SCENE CONTROL: {}\n", adventure.title);
    out.push_str(&format!("Date: {}\n", state.game_date()));
    match state.current_stage() {
        Some(stage) => out.push_str(&format!(
            "Current: {} (stage: {stage})\n",
            state.current_scene()
        )),
        None => out.push_str(&format!("Current: {}\n", state.current_scene())),
    }

    out.push_str("Scenes:\n");
    let mut completed = 0;
    for scene in &adventure.scenes {
        let mark = if scene == state.current_scene() {
            ">"
        } else if state.is_scene_completed(scene) {
            "x"
        } else {
            " "
        };
        if state.is_scene_completed(scene) {
            completed += 1;
        }
        out.push_str(&format!("  [{mark}] {scene}\n"));
    }
    out.push_str(&format!(
        "Progress: {completed}/{} scenes completed\n",
        adventure.scenes.len()
    ));

    let back = state.scene_history().last().unwrap_or("(none)");
    out.push_str(&format!("Back: {back}\n"));
    out.push_str(&format!("Directives: {DIRECTIVE_HELP}"));
    out
}

/// What has happened so far.
pub fn plot_summary(state: &StoryState) -> String {
    let mut out = String::from("STORY SO FAR\n");
    out.push_str(&format!(
        "Completed scenes: {}\n",
        list_or_none(state.completed_scenes())
    ));
    out.push_str(&format!("Beats: {}\n", list_or_none(state.completed_beats())));

    let mut decisions = state.decisions().peekable();
    if decisions.peek().is_none() {
        out.push_str("Decisions: (none)\n");
    } else {
        out.push_str("Decisions:\n");
        for d in decisions {
            out.push_str(&format!("  {} = {} ({})", d.id, d.choice, d.scene));
            if let Some(details) = &d.details {
                out.push_str(&format!(": {details}"));
            }
            out.push('\n');
        }
    }

    let flags: Vec<String> = state
        .flags()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    out.push_str(&format!("Flags: {}", list_or_none(&flags)));
    out
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
