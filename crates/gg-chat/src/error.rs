use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat transport is offline")]
    Offline,
    #[error("chat request failed: {0}")]
    RequestFailed(String),
    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat endpoint returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("chat endpoint returned an empty reply")]
    EmptyReply,
    #[error("chat configuration error: {0}")]
    Config(String),
    #[error("chat lexicon error: {0}")]
    Lexicon(String),
}
