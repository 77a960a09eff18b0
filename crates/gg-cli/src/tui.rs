use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use gg_chat::{ChatBridge, ChatOutcome};
use tracing::debug;

/// Owns the bridge on its own thread so a slow request never blocks drawing.
pub(crate) struct ChatWorker {
    requests: Option<Sender<String>>,
    replies: Receiver<ChatOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl ChatWorker {
    pub(crate) fn spawn(mut bridge: ChatBridge) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel::<ChatOutcome>();
        let handle = thread::spawn(move || {
            for message in request_rx {
                let outcome = bridge.send(&message);
                debug!(source = ?outcome.source, "chat worker answered");
                if reply_tx.send(outcome).is_err() {
                    break;
                }
            }
        });
        Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
        }
    }

    pub(crate) fn send(&self, message: String) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|requests| requests.send(message).is_ok())
    }

    pub(crate) fn try_reply(&self) -> Option<ChatOutcome> {
        self.replies.try_recv().ok()
    }
}

impl Drop for ChatWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(coverage)]
pub(super) fn run_tui_ratatui_mode(
    context: &super::TuiCommandContext<'_>,
    engine: &mut gg_runtime::GalgameEngine,
    mut bridge: ChatBridge,
) -> Result<i32, gg_core::GalgameError> {
    super::run_tui_line_mode(context, engine, &mut bridge)
}

#[cfg(not(coverage))]
mod rich {
    use std::io::{self, IsTerminal};
    use std::time::{Duration, Instant};

    use crossterm::event::{self, Event, KeyEventKind};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use gg_chat::ChatBridge;
    use gg_core::GalgameError;
    use gg_runtime::GalgameEngine;
    use ratatui::backend::CrosstermBackend;
    use ratatui::Terminal;
    use tracing::warn;

    use super::ChatWorker;
    use crate::tui_actions::{handle_key, KeyOutcome, TuiActionContext};
    use crate::tui_render::render_tui;
    use crate::tui_state::TuiUiState;
    use crate::{
        apply_chat_outcome, boundary_from_chat, boundary_from_output, map_tui_io,
        run_tui_line_mode, TuiCommandContext,
    };

    const TYPEWRITER_CHARS_PER_SECOND: usize = 33;
    const TYPEWRITER_TICK_MS: u64 = (1000 / TYPEWRITER_CHARS_PER_SECOND) as u64;

    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, GalgameError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(crate) fn run_tui_ratatui_mode(
        context: &TuiCommandContext<'_>,
        engine: &mut GalgameEngine,
        mut bridge: ChatBridge,
    ) -> Result<i32, GalgameError> {
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            return run_tui_line_mode(context, engine, &mut bridge);
        }

        let worker = ChatWorker::spawn(bridge);
        let mut terminal = TuiTerminal::new()?;
        let mut ui = TuiUiState::new(context.bundle.title());
        ui.show_boundary(boundary_from_output(engine.start()?));
        let action_context = TuiActionContext {
            store: context.store,
        };

        let tick = Duration::from_millis(TYPEWRITER_TICK_MS);
        let mut last_tick = Instant::now();

        loop {
            if let Some(outcome) = worker.try_reply() {
                match apply_chat_outcome(engine, &outcome) {
                    Ok(view) => ui.show_boundary(boundary_from_chat(view)),
                    Err(error) => {
                        ui.chat_pending = false;
                        ui.status = error.message;
                    }
                }
            }

            terminal
                .terminal
                .draw(|frame| render_tui(frame, &ui))
                .map_err(map_tui_io)?;

            if last_tick.elapsed() >= tick {
                ui.advance_typewriter();
                ui.expire_flash(Instant::now());
                last_tick = Instant::now();
            }

            let timeout = tick.saturating_sub(last_tick.elapsed());
            if !event::poll(timeout).map_err(map_tui_io)? {
                continue;
            }

            let Event::Key(key) = event::read().map_err(map_tui_io)? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match handle_key(key, &action_context, engine, &mut ui) {
                Ok(KeyOutcome::Handled) => {}
                Ok(KeyOutcome::Quit) => break,
                Ok(KeyOutcome::SendChat(message)) => {
                    if !worker.send(message) {
                        warn!("chat worker is gone");
                        ui.chat_pending = false;
                        ui.status = "chat unavailable".to_string();
                    }
                }
                Err(error) => ui.status = error.message,
            }
        }

        Ok(0)
    }
}

#[cfg(not(coverage))]
pub(super) use rich::run_tui_ratatui_mode;
