use std::path::Path;

use gg_api::{create_chat_bridge, CreateChatBridgeOptions};
use gg_core::{EngineOutput, GalgameError};
use gg_runtime::GalgameEngine;
use tracing::debug;

use crate::{
    boundary_from_chat, boundary_from_output, chat_step, create_engine_for_story,
    emit_boundary_with_saved_state, load_engine_from_state, load_story, AdvanceArgs, AgentArgs,
    AgentCommand, BoundaryResult, ChatArgs, ChatStep, ChooseArgs, InputArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, GalgameError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Advance(args) => run_advance(args),
        AgentCommand::Choose(args) => run_choose(args),
        AgentCommand::Input(args) => run_input(args),
        AgentCommand::Chat(args) => run_chat(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, GalgameError> {
    let bundle = load_story(&args.scripts_dir, args.entry_script.as_deref())?;
    let mut engine = create_engine_for_story(&bundle)?;
    let boundary = boundary_from_output(engine.start()?);
    emit_boundary_with_saved_state(&engine, boundary, &args.state_out, &bundle, None)
}

pub(super) fn run_advance(args: AdvanceArgs) -> Result<i32, GalgameError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.advance().map(boundary_from_output)
    })
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, GalgameError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.choose(args.choice).map(boundary_from_output)
    })
}

pub(super) fn run_input(args: InputArgs) -> Result<i32, GalgameError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.submit_input(&args.text).map(boundary_from_output)
    })
}

/// A seeded session keeps its random sequence across calls: the seed saved
/// by the previous turn wins over `--seed`.
pub(super) fn run_chat(args: ChatArgs) -> Result<i32, GalgameError> {
    let mut session = load_engine_from_state(Path::new(&args.state_in))?;
    let seed = session.chat_seed.or(args.chat.seed);
    let mut bridge = create_chat_bridge(
        &session.bundle,
        CreateChatBridgeOptions {
            random_seed: seed,
            ..args.chat.bridge_options()
        },
    )?;
    let boundary = match chat_step(&mut session.engine, &mut bridge, &args.text)? {
        ChatStep::Restarted(output) => boundary_from_output(output),
        ChatStep::Reply(view) => boundary_from_chat(view),
        ChatStep::Ignored => boundary_from_output(EngineOutput::Unchanged),
    };
    let chat_seed = seed.map(|_| bridge.next_seed());
    debug!(carried = chat_seed.is_some(), "chat turn finished");
    emit_boundary_with_saved_state(
        &session.engine,
        boundary,
        &args.state_out,
        &session.bundle,
        chat_seed,
    )
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut GalgameEngine) -> Result<BoundaryResult, GalgameError>,
) -> Result<i32, GalgameError> {
    let mut session = load_engine_from_state(Path::new(state_in))?;
    let boundary = transition(&mut session.engine)?;
    debug!(
        event = boundary.event.label(),
        scene = session.engine.state().current_scene_id,
        "agent step"
    );
    emit_boundary_with_saved_state(
        &session.engine,
        boundary,
        state_out,
        &session.bundle,
        session.chat_seed,
    )
}
