mod bundle;

pub use bundle::{
    load_bundle_dir, make_bundle_id, read_bundle_files, resolve_bundle_dir, BundleManifest,
    StoryBundle, MANIFEST_FILE,
};

use gg_chat::{build_transport, ChatBridge, ChatConfig, ChatLexicon, SeededRandom};
use gg_core::{EngineOutput, GalgameError, SaveSnapshot};
use gg_runtime::{GalgameEngine, GalgameEngineOptions, MemoryScriptLoader};

#[derive(Debug, Clone, Default)]
pub struct CreateChatBridgeOptions {
    pub config: ChatConfig,
    /// Seed for canned-reply and tie-break randomness; time-based when absent.
    pub random_seed: Option<u64>,
}

pub fn create_engine_from_bundle(bundle: &StoryBundle) -> Result<GalgameEngine, GalgameError> {
    GalgameEngine::new(GalgameEngineOptions {
        loader: Box::new(MemoryScriptLoader::new(bundle.files.clone())),
        story: bundle.manifest.story_config(),
        overrides: bundle.special_responses()?,
    })
}

pub fn resume_engine_from_bundle(
    bundle: &StoryBundle,
    snapshot: SaveSnapshot,
) -> Result<(GalgameEngine, EngineOutput), GalgameError> {
    let mut engine = create_engine_from_bundle(bundle)?;
    let output = engine.resume(snapshot)?;
    Ok((engine, output))
}

/// The bundle's own lexicon when the manifest names one, else the built-in.
pub fn load_chat_lexicon(bundle: &StoryBundle) -> Result<ChatLexicon, GalgameError> {
    let lexicon = match &bundle.manifest.chat_lexicon {
        Some(file) => ChatLexicon::parse(bundle.file(file)?),
        None => ChatLexicon::builtin(),
    };
    lexicon.map_err(|error| GalgameError::new("BUNDLE_CHAT_LEXICON", error.to_string()))
}

pub fn create_chat_bridge(
    bundle: &StoryBundle,
    options: CreateChatBridgeOptions,
) -> Result<ChatBridge, GalgameError> {
    let lexicon = load_chat_lexicon(bundle)?;
    let transport = build_transport(&options.config)
        .map_err(|error| GalgameError::new("CHAT_CONFIG", error.to_string()))?;
    let random = match options.random_seed {
        Some(seed) => SeededRandom::new(seed),
        None => SeededRandom::from_entropy(),
    };
    Ok(ChatBridge::new(transport, lexicon, Box::new(random)))
}
