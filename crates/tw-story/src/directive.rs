//! Directive parsing for narrator output.
//!
//! The narrator embeds bracketed tags in its prose to request state
//! changes: `[SCENE: dock, TIME: +3d]`, `[SKILL_CHECK: Pilot 8+ evade the
//! patrol]`, and so on. A narration yields at most one directive. Tags
//! are tried kind by kind in a fixed priority order, and the first kind
//! with a well-formed tag anywhere in the text wins. Malformed tags are
//! not errors; they just don't match.

use std::fmt;

use serde::{Deserialize, Serialize};
use tw_core::TimeSkip;

/// A state change requested by the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Move to another scene, optionally skipping time.
    Scene {
        /// Target scene id.
        scene_id: String,
        /// Calendar time that passes on the way.
        time_skip: Option<TimeSkip>,
    },
    /// Narrate another scene as a memory without moving.
    Flashback {
        /// Scene to recall.
        scene_id: String,
    },
    /// Pass through several scenes at once, ending on the last.
    Montage {
        /// Scenes in order.
        scene_ids: Vec<String>,
    },
    /// Move to a stage within the current scene.
    Stage {
        /// Target stage id.
        stage_id: String,
    },
    /// Ask for a dice check.
    SkillCheck {
        /// Skill being tested.
        skill: String,
        /// Target number.
        threshold: i32,
        /// Why the check is being made.
        reason: String,
    },
    /// Hand the conversation to an NPC.
    NpcDialogue {
        /// NPC id.
        npc_id: String,
    },
    /// Record a story beat as complete.
    BeatComplete {
        /// Beat id.
        beat_id: String,
    },
    /// Record a player decision.
    Decision {
        /// Decision id.
        id: String,
        /// The choice made.
        value: String,
    },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene {
                scene_id,
                time_skip: Some(skip),
            } => write!(f, "[SCENE: {scene_id}, TIME: {skip}]"),
            Self::Scene {
                scene_id,
                time_skip: None,
            } => write!(f, "[SCENE: {scene_id}]"),
            Self::Flashback { scene_id } => write!(f, "[FLASHBACK: {scene_id}]"),
            Self::Montage { scene_ids } => write!(f, "[MONTAGE: {}]", scene_ids.join(", ")),
            Self::Stage { stage_id } => write!(f, "[STAGE: {stage_id}]"),
            Self::SkillCheck {
                skill,
                threshold,
                reason,
            } if reason.is_empty() => write!(f, "[SKILL_CHECK: {skill} {threshold}+]"),
            Self::SkillCheck {
                skill,
                threshold,
                reason,
            } => write!(f, "[SKILL_CHECK: {skill} {threshold}+ {reason}]"),
            Self::NpcDialogue { npc_id } => write!(f, "[NPC_DIALOGUE: {npc_id}]"),
            Self::BeatComplete { beat_id } => write!(f, "[BEAT_COMPLETE: {beat_id}]"),
            Self::Decision { id, value } => write!(f, "[DECISION: {id} = {value}]"),
        }
    }
}

/// Tag kinds in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    SkillCheck,
    Scene,
    Flashback,
    Montage,
    NextScene,
    Stage,
    Decision,
    BeatComplete,
    NpcDialogue,
}

const TAG_ORDER: [TagKind; 9] = [
    TagKind::SkillCheck,
    TagKind::Scene,
    TagKind::Flashback,
    TagKind::Montage,
    TagKind::NextScene,
    TagKind::Stage,
    TagKind::Decision,
    TagKind::BeatComplete,
    TagKind::NpcDialogue,
];

impl TagKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::SkillCheck => "SKILL_CHECK",
            Self::Scene => "SCENE",
            Self::Flashback => "FLASHBACK",
            Self::Montage => "MONTAGE",
            Self::NextScene => "NEXT_SCENE",
            Self::Stage => "STAGE",
            Self::Decision => "DECISION",
            Self::BeatComplete => "BEAT_COMPLETE",
            Self::NpcDialogue => "NPC_DIALOGUE",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        TAG_ORDER
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(name))
    }

    fn parse_body(self, body: &str) -> Option<Directive> {
        match self {
            Self::SkillCheck => parse_skill_check(body),
            Self::Scene => parse_scene(body),
            Self::Flashback => Some(Directive::Flashback {
                scene_id: ident(body)?,
            }),
            Self::Montage => {
                let scene_ids = body.split(',').map(ident).collect::<Option<Vec<_>>>()?;
                Some(Directive::Montage { scene_ids })
            }
            Self::NextScene => Some(Directive::Scene {
                scene_id: ident(body)?,
                time_skip: None,
            }),
            Self::Stage => Some(Directive::Stage {
                stage_id: ident(body)?,
            }),
            Self::Decision => {
                let (id, value) = body.split_once('=')?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                Some(Directive::Decision {
                    id: ident(id)?,
                    value: value.to_string(),
                })
            }
            Self::BeatComplete => Some(Directive::BeatComplete {
                beat_id: ident(body)?,
            }),
            Self::NpcDialogue => Some(Directive::NpcDialogue {
                npc_id: ident(body)?,
            }),
        }
    }
}

/// A bracketed `[NAME: body]` span.
#[derive(Debug)]
struct Tag<'a> {
    kind: TagKind,
    body: &'a str,
    start: usize,
    end: usize,
}

/// Find every `[NAME: body]` span whose name is a known tag kind.
fn scan_tags(text: &str) -> Vec<Tag<'_>> {
    let mut tags = Vec::new();
    let mut cursor = 0;
    while let Some(open) = text[cursor..].find('[').map(|i| cursor + i) {
        let Some(close) = text[open + 1..].find(']').map(|i| open + 1 + i) else {
            break;
        };
        let inner = &text[open + 1..close];
        // A later '[' before the ']' starts the real tag.
        if let Some(nested) = inner.rfind('[') {
            cursor = open + 1 + nested;
            continue;
        }
        let parsed = inner
            .split_once(':')
            .and_then(|(name, body)| Some((TagKind::from_name(name)?, body)));
        if let Some((kind, body)) = parsed {
            tags.push(Tag {
                kind,
                body,
                start: open,
                end: close + 1,
            });
        }
        cursor = close + 1;
    }
    tags
}

/// Identifiers are letters, digits, `-`, and `_`.
fn ident(s: &str) -> Option<String> {
    let s = s.trim();
    let valid = !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    valid.then(|| s.to_string())
}

fn parse_scene(body: &str) -> Option<Directive> {
    let (id, rest) = match body.split_once(',') {
        Some((id, rest)) => (id, Some(rest)),
        None => (body, None),
    };
    let time_skip = match rest {
        None => None,
        Some(rest) => {
            let (label, value) = rest.split_once(':')?;
            if !label.trim().eq_ignore_ascii_case("TIME") {
                return None;
            }
            Some(TimeSkip::parse(value)?)
        }
    };
    Some(Directive::Scene {
        scene_id: ident(id)?,
        time_skip,
    })
}

fn parse_skill_check(body: &str) -> Option<Directive> {
    let mut parts = body.trim().splitn(3, char::is_whitespace);
    let skill = parts.next()?;
    if skill.is_empty() || !skill.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let threshold = parts.next()?.strip_suffix('+')?;
    if threshold.is_empty() || !threshold.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let reason = parts.next().unwrap_or("").trim();
    Some(Directive::SkillCheck {
        skill: skill.to_string(),
        threshold: threshold.parse().ok()?,
        reason: reason.to_string(),
    })
}

/// Extract the directive from a narration, if it carries one.
pub fn parse_directive(text: &str) -> Option<Directive> {
    let tags = scan_tags(text);
    TAG_ORDER.into_iter().find_map(|kind| {
        tags.iter()
            .filter(|tag| tag.kind == kind)
            .find_map(|tag| kind.parse_body(tag.body))
    })
}

/// Remove every directive tag from a narration, leaving the prose.
///
/// Runs of spaces left behind are collapsed within each line.
pub fn strip_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for tag in scan_tags(text) {
        out.push_str(&text[last..tag.start]);
        last = tag.end;
    }
    out.push_str(&text[last..]);

    out.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
