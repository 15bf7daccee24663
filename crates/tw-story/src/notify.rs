//! Hooks fired when a scene is completed for the first time.
//!
//! Scenes can carry completion triggers (typically in-world email). The
//! scene machine hands each one to a [`CompletionNotifier`]; delivery
//! failures are logged and never abort a transition.

use thiserror::Error;
use tw_core::{CompletionTrigger, GameDate, SceneDef};

/// A notification could not be delivered.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// What was completed, for building the message.
#[derive(Debug, Clone, Copy)]
pub struct CompletionContext<'a> {
    /// Adventure being played.
    pub adventure_id: &'a str,
    /// Player character.
    pub pc_id: &'a str,
    /// The scene that was completed.
    pub scene: &'a SceneDef,
    /// In-world date of completion.
    pub game_date: GameDate,
}

/// Delivers completion triggers.
pub trait CompletionNotifier {
    /// Deliver one trigger.
    fn notify(
        &mut self,
        trigger: &CompletionTrigger,
        ctx: &CompletionContext<'_>,
    ) -> Result<(), NotifyError>;
}

/// Notifier that only logs what would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl CompletionNotifier for LogNotifier {
    fn notify(
        &mut self,
        trigger: &CompletionTrigger,
        ctx: &CompletionContext<'_>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            scene = %ctx.scene.id,
            template = %trigger.template,
            recipients = trigger.recipients.len(),
            date = %ctx.game_date,
            "scene completion notification"
        );
        Ok(())
    }
}
