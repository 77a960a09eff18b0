use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::emotion::classify_emotion;
use crate::error::ChatError;
use crate::fallback::fallback_reply;
use crate::lexicon::ChatLexicon;
use crate::rng::RandomSource;
use crate::sentiment::affection_delta;
use crate::tag::strip_emotion_tag;
use crate::transport::{ChatRequest, ChatTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub reply: String,
    pub emotion: String,
    pub affection_delta: i64,
    pub emotion_score: Option<f64>,
    pub source: ReplySource,
}

pub struct ChatBridge {
    transport: Box<dyn ChatTransport>,
    lexicon: ChatLexicon,
    random: Box<dyn RandomSource>,
}

impl ChatBridge {
    pub fn new(
        transport: Box<dyn ChatTransport>,
        lexicon: ChatLexicon,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            transport,
            lexicon,
            random,
        }
    }

    pub fn lexicon(&self) -> &ChatLexicon {
        &self.lexicon
    }

    pub fn speaker(&self) -> &str {
        &self.lexicon.persona.speaker
    }

    /// Draws the seed a later bridge should start from to carry on this
    /// conversation's random sequence.
    pub fn next_seed(&mut self) -> u64 {
        self.random.next_seed()
    }

    /// Never fails: any transport problem is answered from the local tables.
    pub fn send(&mut self, user_text: &str) -> ChatOutcome {
        let request = ChatRequest {
            message: user_text.to_string(),
            system_prompt: self.lexicon.system_prompt(true),
            analyze_emotion: true,
        };

        let remote = self.transport.complete(&request).and_then(|reply| {
            let tagged = strip_emotion_tag(&reply.reply);
            if tagged.text.is_empty() {
                return Err(ChatError::EmptyReply);
            }
            Ok((tagged.text, reply.emotion_score.or(tagged.score)))
        });

        let (reply, score, source) = match remote {
            Ok((reply, score)) => {
                debug!(transport = self.transport.name(), ?score, "chat reply received");
                (reply, score, ReplySource::Remote)
            }
            Err(error) => {
                warn!(
                    transport = self.transport.name(),
                    %error,
                    "chat request failed, using local fallback"
                );
                let reply = fallback_reply(&self.lexicon, user_text, self.random.as_mut());
                (reply, None, ReplySource::Fallback)
            }
        };

        let emotion = classify_emotion(&self.lexicon, user_text, &reply, self.random.as_mut());
        let affection_delta = affection_delta(&self.lexicon, user_text, score);
        ChatOutcome {
            reply,
            emotion,
            affection_delta,
            emotion_score: score,
            source,
        }
    }
}
