use std::io::{self, BufRead, Write};

use gg_api::StoryBundle;
use gg_chat::ChatBridge;
use gg_core::{EngineOutput, GalgameError};
use gg_runtime::{parse_free_chat_input, FreeChatCommand, GalgameEngine};

use crate::{
    apply_chat_outcome, boundary_from_chat, boundary_from_output, load_local_snapshot,
    map_tui_io, save_local_snapshot, BoundaryEvent, BoundaryResult, LocalStore,
    TuiCommandAction,
};

pub(crate) const COMMANDS_HELP: &str = "commands: :help :save :load :restart :quit";

pub(crate) struct TuiCommandContext<'a> {
    pub(crate) store: &'a LocalStore,
    pub(crate) bundle: &'a StoryBundle,
}

pub(crate) fn run_tui_line_mode(
    context: &TuiCommandContext<'_>,
    engine: &mut GalgameEngine,
    bridge: &mut ChatBridge,
) -> Result<i32, GalgameError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_tui_line_mode_with_io(context, engine, bridge, &mut reader, &mut writer)
}

pub(crate) fn run_tui_line_mode_with_io(
    context: &TuiCommandContext<'_>,
    engine: &mut GalgameEngine,
    bridge: &mut ChatBridge,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, GalgameError> {
    write_lines(
        writer,
        &[context.bundle.title().to_string(), COMMANDS_HELP.to_string()],
    )?;

    let mut output = engine.start()?;
    let mut event = BoundaryEvent::Scene;
    loop {
        let boundary = boundary_from_output(output);
        if boundary.event != BoundaryEvent::Unchanged {
            event = boundary.event;
            write_lines(writer, &describe_boundary(&boundary))?;
        }
        if event == BoundaryEvent::End {
            write_lines(writer, &["[END]".to_string()])?;
            return Ok(0);
        }

        output = loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut notes = Vec::new();
            let action = {
                let mut emit = |line: String| notes.push(line);
                handle_line_cmd(raw.as_str(), context, engine, &mut emit)
            };
            let action = match action {
                Ok(action) => action,
                Err(error) => {
                    write_lines(writer, &[format!("error: {}", error)])?;
                    continue;
                }
            };
            write_lines(writer, &notes)?;
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break engine.current_output()?,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }

            match line_step(raw.as_str(), event, engine, bridge, reader, writer) {
                Ok(Some(next)) => break next,
                Ok(None) => continue,
                Err(error) => write_lines(writer, &[format!("error: {}", error)])?,
            }
        };
    }
}

/// Applies one typed line to the boundary the player is looking at.
/// `None` means the line was consumed without a new engine output.
fn line_step(
    raw: &str,
    event: BoundaryEvent,
    engine: &mut GalgameEngine,
    bridge: &mut ChatBridge,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<EngineOutput>, GalgameError> {
    match event {
        BoundaryEvent::Choices => {
            let choice = raw.trim().parse::<usize>().map_err(|_| {
                GalgameError::new(
                    "TUI_CHOICE_PARSE",
                    format!("Invalid choice index: {}", raw),
                )
            })?;
            engine.choose(choice).map(Some)
        }
        BoundaryEvent::Input => match engine.submit_input(raw)? {
            EngineOutput::Unchanged => {
                write_lines(writer, &["请输入内容".to_string()])?;
                Ok(None)
            }
            output => Ok(Some(output)),
        },
        BoundaryEvent::FreeChat | BoundaryEvent::Chat => match parse_free_chat_input(raw) {
            FreeChatCommand::Empty => Ok(None),
            FreeChatCommand::Restart => {
                let answer = prompt_input_from("确定要重新开始吗？(y/N) ", reader, writer)?;
                if answer.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")) {
                    return engine.restart().map(Some);
                }
                Ok(None)
            }
            FreeChatCommand::Message(message) => {
                let outcome = bridge.send(&message);
                let view = apply_chat_outcome(engine, &outcome)?;
                write_lines(writer, &describe_boundary(&boundary_from_chat(view)))?;
                Ok(None)
            }
        },
        BoundaryEvent::Scene | BoundaryEvent::Unchanged | BoundaryEvent::End => {
            engine.advance().map(Some)
        }
    }
}

/// Plain-text rendering of one boundary for the line fallback.
pub(crate) fn describe_boundary(boundary: &BoundaryResult) -> Vec<String> {
    let mut lines = vec![String::new()];
    if let Some(title) = &boundary.title {
        lines.push(format!("== {} ==", title));
    }
    if let Some(background) = &boundary.background {
        lines.push(format!("[背景] {}", background));
    }
    if let Some(sprite) = &boundary.sprite {
        lines.push(format!("[立绘] {}", sprite));
    }
    let speaker = boundary.speaker.as_deref().unwrap_or_default();
    for text in &boundary.texts {
        if speaker.is_empty() {
            lines.push(text.clone());
        } else {
            lines.push(format!("【{}】{}", speaker, text));
        }
    }
    for (index, text) in &boundary.choices {
        lines.push(format!("  [{}] {}", index, text));
    }
    if let Some(placeholder) = &boundary.input_placeholder {
        lines.push(format!("({})", placeholder));
    }
    match (boundary.affection, boundary.affection_gain) {
        (Some(affection), Some(gain)) if gain != 0 => {
            lines.push(format!("好感度 {:+} → {}", gain, affection));
        }
        (Some(affection), _) => lines.push(format!("好感度: {}", affection)),
        _ => {}
    }
    if let Some(hint) = &boundary.hint {
        lines.push(hint.clone());
    }
    lines
}

pub(crate) fn handle_tui_command(
    raw: &str,
    store: &LocalStore,
    engine: &mut GalgameEngine,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, GalgameError> {
    match raw.trim() {
        ":help" => {
            emit(COMMANDS_HELP.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":save" => {
            save_local_snapshot(store, &engine.snapshot())?;
            emit(format!("saved: {}", store.path().display()));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => match load_local_snapshot(store)? {
            Some(snapshot) => {
                engine.resume(snapshot)?;
                emit(format!("loaded: {}", store.path().display()));
                Ok(TuiCommandAction::RefreshBoundary)
            }
            None => {
                emit("no saved game".to_string());
                Ok(TuiCommandAction::Continue)
            }
        },
        ":restart" => {
            engine.restart()?;
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    context: &TuiCommandContext<'_>,
    engine: &mut GalgameEngine,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, GalgameError> {
    handle_tui_command(raw, context.store, engine, emit)
}

/// `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, GalgameError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_tui_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

fn write_lines(writer: &mut dyn Write, lines: &[String]) -> Result<(), GalgameError> {
    for line in lines {
        writeln!(writer, "{}", line).map_err(map_tui_io)?;
    }
    Ok(())
}
