//! Free-chat bridge: remote completion transports with a fully local fallback.

mod bridge;
mod emotion;
mod error;
mod fallback;
mod lexicon;
mod rng;
mod sentiment;
mod tag;
mod transport;

pub use bridge::{ChatBridge, ChatOutcome, ReplySource};
pub use emotion::classify_emotion;
pub use error::ChatError;
pub use fallback::fallback_reply;
pub use lexicon::{
    AffectionRule, ChatLexicon, EmotionRule, FallbackCategory, Persona, RandomSplit,
};
pub use rng::{RandomSource, SeededRandom};
pub use sentiment::affection_delta;
pub use tag::{strip_emotion_tag, TaggedReply};
pub use transport::{
    build_transport, ChatConfig, ChatMode, ChatRequest, ChatTransport, CompletionTransport,
    OfflineTransport, ProxyTransport, ScriptedTransport, TransportReply,
    DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL, DEFAULT_PROXY_ENDPOINT,
};
