mod boundary;
mod chat;
mod lifecycle;
mod snapshot;
mod step;

pub use chat::{parse_free_chat_input, FreeChatCommand, RESTART_KEYWORDS};
pub use lifecycle::{GalgameEngine, GalgameEngineOptions};


#[cfg(test)]
mod overlay_tests;
