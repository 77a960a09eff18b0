mod engine;
mod library;
mod overrides;
mod reducer;
mod render;
mod story;
mod text;

pub use engine::{
    parse_free_chat_input, FreeChatCommand, GalgameEngine, GalgameEngineOptions,
    RESTART_KEYWORDS,
};
pub use library::{MemoryScriptLoader, SceneLookup, ScriptLibrary, ScriptLoader};
pub use overrides::{IdentityEntry, ResponseTemplate, SpecialResponse, SpecialResponseTable};
pub use reducer::{reduce, Effect, Event, ReduceContext, Transition, STORY_ENDED_MESSAGE};
pub use render::{
    render_free_chat, render_scene, scene_hint, RenderContext, RenderedScene, SPEAKER_FALLBACK,
};
pub use story::{AssetRoot, StoryConfig};
pub use text::substitute_variables;
