use std::path::Path;

use gg_api::{create_engine_from_bundle, load_bundle_dir, resume_engine_from_bundle, StoryBundle};
use gg_chat::{ChatBridge, ChatOutcome};
use gg_core::{ChatView, EngineOutput, GalgameError};
use gg_runtime::{parse_free_chat_input, FreeChatCommand, GalgameEngine};
use tracing::info;

use crate::{
    emit_boundary, load_player_state, save_player_state, BoundaryResult, PlayerState,
    PLAYER_STATE_SCHEMA,
};

const BUNDLE_REF_PREFIX: &str = "bundle:";

/// Loads a story directory; `entry_script` swaps in another base script.
pub(crate) fn load_story(
    scripts_dir: &str,
    entry_script: Option<&str>,
) -> Result<StoryBundle, GalgameError> {
    let mut bundle = load_bundle_dir(scripts_dir)?;
    if let Some(entry_script) = entry_script {
        if !bundle.files.contains_key(entry_script) {
            return Err(GalgameError::new(
                "BUNDLE_BASE_SCRIPT",
                format!("Entry script \"{}\" is not part of the bundle.", entry_script),
            ));
        }
        bundle.manifest.base_script = entry_script.to_string();
    }
    Ok(bundle)
}

pub(crate) fn load_story_by_ref(
    bundle_ref: &str,
    base_script: &str,
) -> Result<StoryBundle, GalgameError> {
    let Some(raw) = bundle_ref.strip_prefix(BUNDLE_REF_PREFIX) else {
        return Err(GalgameError::new(
            "CLI_BUNDLE_REF_INVALID",
            format!("Unsupported bundle ref: {}", bundle_ref),
        ));
    };
    load_story(raw, Some(base_script))
}

pub(crate) fn player_state_for(
    engine: &GalgameEngine,
    bundle: &StoryBundle,
    chat_seed: Option<u64>,
) -> PlayerState {
    PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        bundle_id: bundle.id.clone(),
        base_script: bundle.manifest.base_script.clone(),
        snapshot: engine.snapshot(),
        chat_seed,
    }
}

pub(crate) fn save_engine_state(
    path: &Path,
    engine: &GalgameEngine,
    bundle: &StoryBundle,
    chat_seed: Option<u64>,
) -> Result<(), GalgameError> {
    save_player_state(path, &player_state_for(engine, bundle, chat_seed))
}

/// An agent session rebuilt from its state file.
pub(crate) struct ResumedSession {
    pub(crate) bundle: StoryBundle,
    pub(crate) engine: GalgameEngine,
    pub(crate) output: EngineOutput,
    pub(crate) chat_seed: Option<u64>,
}

pub(crate) fn load_engine_from_state(path: &Path) -> Result<ResumedSession, GalgameError> {
    let state = load_player_state(path)?;
    let bundle = load_story_by_ref(&state.bundle_id, &state.base_script)?;
    let (engine, output) = resume_engine_from_bundle(&bundle, state.snapshot)?;
    Ok(ResumedSession {
        bundle,
        engine,
        output,
        chat_seed: state.chat_seed,
    })
}

pub(crate) fn create_engine_for_story(bundle: &StoryBundle) -> Result<GalgameEngine, GalgameError> {
    create_engine_from_bundle(bundle)
}

/// Writes the state file unless the story ended, then prints the boundary.
pub(crate) fn emit_boundary_with_saved_state(
    engine: &GalgameEngine,
    boundary: BoundaryResult,
    state_out: &str,
    bundle: &StoryBundle,
    chat_seed: Option<u64>,
) -> Result<i32, GalgameError> {
    if boundary.event.keeps_state() {
        save_engine_state(Path::new(state_out), engine, bundle, chat_seed)?;
        emit_boundary(&boundary, Some(state_out));
        return Ok(0);
    }

    emit_boundary(&boundary, None);
    Ok(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChatStep {
    Restarted(EngineOutput),
    Reply(ChatView),
    Ignored,
}

pub(crate) fn ensure_free_chat(engine: &GalgameEngine) -> Result<(), GalgameError> {
    if engine.in_free_chat() {
        return Ok(());
    }
    Err(GalgameError::new(
        "ENGINE_NOT_FREE_CHAT",
        "Chat messages are only accepted in free chat.",
    ))
}

pub(crate) fn apply_chat_outcome(
    engine: &mut GalgameEngine,
    outcome: &ChatOutcome,
) -> Result<ChatView, GalgameError> {
    engine.apply_chat(&outcome.reply, &outcome.emotion, outcome.affection_delta)
}

/// One synchronous free-chat turn: restart keywords restart, anything else
/// goes through the bridge.
pub(crate) fn chat_step(
    engine: &mut GalgameEngine,
    bridge: &mut ChatBridge,
    text: &str,
) -> Result<ChatStep, GalgameError> {
    match parse_free_chat_input(text) {
        FreeChatCommand::Empty => Ok(ChatStep::Ignored),
        FreeChatCommand::Restart => {
            info!("restart requested from free chat");
            Ok(ChatStep::Restarted(engine.restart()?))
        }
        FreeChatCommand::Message(message) => {
            ensure_free_chat(engine)?;
            let outcome = bridge.send(&message);
            Ok(ChatStep::Reply(apply_chat_outcome(engine, &outcome)?))
        }
    }
}
