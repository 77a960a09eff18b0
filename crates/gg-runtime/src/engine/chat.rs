use gg_core::{ChatView, EngineOutput, GalgameError, PlayMode};
use tracing::debug;

use super::GalgameEngine;
use crate::reducer::Event;
use crate::render::{lookup_sprite, protagonist_name};

pub const RESTART_KEYWORDS: [&str; 4] = ["重新开始", "restart", "重启", "重置"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeChatCommand {
    Restart,
    Message(String),
    Empty,
}

pub fn parse_free_chat_input(raw: &str) -> FreeChatCommand {
    let text = raw.trim();
    if text.is_empty() {
        return FreeChatCommand::Empty;
    }
    if RESTART_KEYWORDS
        .iter()
        .any(|keyword| text.eq_ignore_ascii_case(keyword))
    {
        return FreeChatCommand::Restart;
    }
    FreeChatCommand::Message(text.to_string())
}

impl GalgameEngine {
    pub fn in_free_chat(&self) -> bool {
        self.state.mode == PlayMode::FreeChat
    }

    /// Folds one chat exchange into the session: applies the affection delta
    /// and resolves the protagonist sprite for `emotion`. An undefined pose
    /// leaves `sprite` empty so the caller keeps the current one.
    pub fn apply_chat(
        &mut self,
        reply: &str,
        emotion: &str,
        affection_delta: i64,
    ) -> Result<ChatView, GalgameError> {
        if !self.in_free_chat() {
            return Err(GalgameError::new(
                "ENGINE_NOT_FREE_CHAT",
                "Chat replies are only accepted in free chat.",
            ));
        }
        if affection_delta != 0 {
            self.dispatch(Event::AdjustAffection(affection_delta))?;
        }

        let ctx = self.render_context()?;
        let sprite = lookup_sprite(&ctx, &self.story.protagonist, emotion, None);
        debug!(
            emotion,
            affection_delta,
            affection = self.state.affection,
            sprite = sprite.is_some(),
            "chat reply applied"
        );
        Ok(ChatView {
            speaker: protagonist_name(&ctx),
            reply: reply.to_string(),
            emotion: emotion.to_string(),
            sprite,
            affection: self.state.affection,
            affection_gain: affection_delta,
        })
    }
}
