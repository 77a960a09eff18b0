use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use gg_api::create_chat_bridge;
use gg_core::GalgameError;
use tracing::info;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_tui;
mod logging;
mod models;
mod session_ops;
mod state_store;
mod tui;
mod tui_actions;
mod tui_render;
mod tui_state;

pub(crate) use boundary_runner::{boundary_from_chat, boundary_from_output, emit_boundary};
#[cfg(test)]
pub(crate) use boundary_runner::boundary_lines;
pub(crate) use cli_args::{
    AdvanceArgs, AgentArgs, AgentCommand, ChatArgs, ChooseArgs, Cli, InputArgs, Mode,
    StartArgs, TuiArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_log_file, map_cli_state_encode, map_cli_state_invalid,
    map_cli_state_read, map_cli_state_write, map_tui_io,
};
pub(crate) use line_tui::{run_tui_line_mode, TuiCommandContext};
#[cfg(test)]
pub(crate) use line_tui::{handle_line_cmd, run_tui_line_mode_with_io};
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, PlayerState, TuiCommandAction, DEFAULT_LOG_FILE,
    DEFAULT_STATE_FILE, LOCAL_SAVE_KEY, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    apply_chat_outcome, chat_step, create_engine_for_story, emit_boundary_with_saved_state,
    load_engine_from_state, load_story, ChatStep,
};
pub(crate) use state_store::{
    load_local_snapshot, load_player_state, save_local_snapshot, save_player_state, LocalStore,
};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, GalgameError> {
    match cli.command {
        Mode::Agent(args) => run_agent(args),
        Mode::Tui(args) => run_tui(args),
    }
}

fn run_agent(args: AgentArgs) -> Result<i32, GalgameError> {
    logging::init_stderr_logging();
    agent::run_agent(args)
}

fn run_tui(args: TuiArgs) -> Result<i32, GalgameError> {
    let log_file = args.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    logging::init_file_logging(Path::new(log_file))?;

    let state_file = args.state_file.as_deref().unwrap_or(DEFAULT_STATE_FILE);
    let bundle = load_story(&args.scripts_dir, args.entry_script.as_deref())?;
    let mut engine = create_engine_for_story(&bundle)?;
    let bridge = create_chat_bridge(&bundle, args.chat.bridge_options())?;
    let store = LocalStore::new(state_file);
    info!(
        bundle = %bundle.id,
        state_file,
        chat_mode = ?args.chat.chat_mode,
        "tui session starting"
    );

    let context = TuiCommandContext {
        store: &store,
        bundle: &bundle,
    };
    tui::run_tui_ratatui_mode(&context, &mut engine, bridge)
}

#[cfg(test)]
pub(crate) mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("galgame-rs-{}-{}", nanos, name))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    pub(crate) fn demo_scripts_dir() -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("demos")
            .join("kurose-counseling")
            .to_string_lossy()
            .to_string()
    }
}
