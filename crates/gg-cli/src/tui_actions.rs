use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gg_core::GalgameError;
use gg_runtime::{parse_free_chat_input, FreeChatCommand, GalgameEngine};
use tracing::info;

use crate::tui_state::TuiUiState;
use crate::{
    boundary_from_output, load_local_snapshot, save_local_snapshot, LocalStore,
};

pub(crate) const CHOICE_VIEWPORT_ROWS: usize = 5;

pub(crate) struct TuiActionContext<'a> {
    pub(crate) store: &'a LocalStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Handled,
    Quit,
    /// Hand the message to the chat worker; controls stay disabled until it answers.
    SendChat(String),
}

enum Command {
    Help,
    Save,
    Load,
    Restart,
}

/// Letters are commands unless a text box is active; Ctrl+letter always is.
fn command_for(key: &KeyEvent, ui: &TuiUiState) -> Option<Command> {
    let KeyCode::Char(ch) = key.code else {
        return None;
    };
    let with_ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if !with_ctrl && ui.text_entry_active() {
        return None;
    }
    match ch {
        'h' => Some(Command::Help),
        's' => Some(Command::Save),
        'l' => Some(Command::Load),
        'r' => Some(Command::Restart),
        _ => None,
    }
}

pub(crate) fn handle_key(
    key: KeyEvent,
    context: &TuiActionContext<'_>,
    engine: &mut GalgameEngine,
    ui: &mut TuiUiState,
) -> Result<KeyOutcome, GalgameError> {
    if key.code == KeyCode::Esc {
        return Ok(KeyOutcome::Quit);
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(KeyOutcome::Quit);
    }
    if key.code == KeyCode::Char('q') && !ui.text_entry_active() {
        return Ok(KeyOutcome::Quit);
    }
    if ui.chat_pending {
        ui.status = "等待回复...".to_string();
        return Ok(KeyOutcome::Handled);
    }
    if ui.confirm_restart {
        ui.confirm_restart = false;
        if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter) {
            restart(engine, ui)?;
        } else {
            ui.status = "已取消重新开始".to_string();
        }
        return Ok(KeyOutcome::Handled);
    }

    if let Some(command) = command_for(&key, ui) {
        match command {
            Command::Help => ui.help_visible = !ui.help_visible,
            Command::Save => {
                save_local_snapshot(context.store, &engine.snapshot())?;
                ui.status = format!("saved to {}", context.store.path().display());
            }
            Command::Load => match load_local_snapshot(context.store)? {
                Some(snapshot) => {
                    let output = engine.resume(snapshot)?;
                    ui.show_boundary(boundary_from_output(output));
                    ui.status = format!("loaded from {}", context.store.path().display());
                }
                None => ui.status = "没有找到存档".to_string(),
            },
            Command::Restart => {
                ui.confirm_restart = true;
                ui.status = "确定要重新开始吗？(y/N)".to_string();
            }
        }
        return Ok(KeyOutcome::Handled);
    }

    let typing_in_progress = ui.typing_in_progress();

    match key.code {
        KeyCode::Up => {
            if ui.choices.is_empty() || typing_in_progress {
                return Ok(KeyOutcome::Handled);
            }
            ui.selected_choice_index = ui.selected_choice_index.saturating_sub(1);
            if ui.selected_choice_index < ui.choice_scroll_offset {
                ui.choice_scroll_offset = ui.selected_choice_index;
            }
        }
        KeyCode::Down => {
            if ui.choices.is_empty() || typing_in_progress {
                return Ok(KeyOutcome::Handled);
            }
            let last = ui.choices.len().saturating_sub(1);
            ui.selected_choice_index = (ui.selected_choice_index + 1).min(last);
            if ui.choices.len() > CHOICE_VIEWPORT_ROWS
                && ui.selected_choice_index >= ui.choice_scroll_offset + CHOICE_VIEWPORT_ROWS
            {
                ui.choice_scroll_offset = ui.selected_choice_index - CHOICE_VIEWPORT_ROWS + 1;
            }
        }
        KeyCode::Backspace | KeyCode::Delete => {
            if ui.text_entry_active() {
                ui.input_buffer.pop();
            }
        }
        KeyCode::Char(' ') if !ui.text_entry_active() => {
            return confirm(engine, ui);
        }
        KeyCode::Enter => {
            return confirm(engine, ui);
        }
        KeyCode::Char(ch) => {
            if ui.text_entry_active()
                && !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
            {
                ui.input_buffer.push(ch);
            }
        }
        _ => {}
    }

    Ok(KeyOutcome::Handled)
}

/// Enter / Space: finish the typewriter first, then act on the boundary.
fn confirm(engine: &mut GalgameEngine, ui: &mut TuiUiState) -> Result<KeyOutcome, GalgameError> {
    if ui.typing_in_progress() {
        ui.complete_typing();
        return Ok(KeyOutcome::Handled);
    }

    if ui.input_active {
        let output = engine.submit_input(ui.input_buffer.as_str())?;
        let boundary = boundary_from_output(output);
        if boundary.event == crate::BoundaryEvent::Unchanged {
            ui.status = "请输入内容".to_string();
        } else {
            ui.show_boundary(boundary);
            ui.status = "submitted input".to_string();
        }
        return Ok(KeyOutcome::Handled);
    }

    if ui.free_chat {
        let raw = std::mem::take(&mut ui.input_buffer);
        return match parse_free_chat_input(&raw) {
            FreeChatCommand::Empty => Ok(KeyOutcome::Handled),
            FreeChatCommand::Restart => {
                ui.confirm_restart = true;
                ui.status = "确定要重新开始吗？(y/N)".to_string();
                Ok(KeyOutcome::Handled)
            }
            FreeChatCommand::Message(message) => {
                ui.push_player_line(&message);
                ui.chat_pending = true;
                ui.status = "等待回复...".to_string();
                Ok(KeyOutcome::SendChat(message))
            }
        };
    }

    if !ui.choices.is_empty() {
        let selected = ui
            .choices
            .get(ui.selected_choice_index)
            .ok_or_else(|| GalgameError::new("TUI_CHOICE_PARSE", "No choices available"))?;
        let index = selected.index;
        let output = engine.choose(index)?;
        ui.show_boundary(boundary_from_output(output));
        ui.status = format!("chose {}", index);
        return Ok(KeyOutcome::Handled);
    }

    if ui.ended {
        ui.status = "按 r 重新开始".to_string();
        return Ok(KeyOutcome::Handled);
    }

    let output = engine.advance()?;
    ui.show_boundary(boundary_from_output(output));
    Ok(KeyOutcome::Handled)
}

fn restart(engine: &mut GalgameEngine, ui: &mut TuiUiState) -> Result<(), GalgameError> {
    let output = engine.restart()?;
    info!("session restarted from the terminal");
    ui.show_boundary(boundary_from_output(output));
    ui.affection = engine.state().affection;
    ui.flash = None;
    ui.status = "restarted".to_string();
    Ok(())
}
