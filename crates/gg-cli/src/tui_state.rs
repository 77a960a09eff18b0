use std::time::{Duration, Instant};

use crate::{BoundaryEvent, BoundaryResult};

pub(crate) const FLASH_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub(crate) struct ChoiceRow {
    pub(crate) index: usize,
    pub(crate) text: String,
}

#[derive(Debug, Default)]
pub(crate) struct TuiUiState {
    pub(crate) title: String,
    pub(crate) affection: i64,
    pub(crate) speaker: String,
    pub(crate) background: Option<String>,
    pub(crate) sprite: Option<String>,
    pub(crate) hint: Option<String>,
    pub(crate) rendered_lines: Vec<String>,
    pub(crate) pending_lines: Vec<String>,
    pub(crate) typing_line: Option<String>,
    pub(crate) typing_chars: usize,
    pub(crate) choices: Vec<ChoiceRow>,
    pub(crate) input_placeholder: Option<String>,
    pub(crate) input_active: bool,
    pub(crate) free_chat: bool,
    pub(crate) input_buffer: String,
    pub(crate) selected_choice_index: usize,
    pub(crate) choice_scroll_offset: usize,
    pub(crate) chat_pending: bool,
    pub(crate) confirm_restart: bool,
    pub(crate) ended: bool,
    pub(crate) help_visible: bool,
    pub(crate) status: String,
    pub(crate) flash: Option<(String, Instant)>,
}

impl TuiUiState {
    pub(crate) fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            status: "ready".to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn typing_in_progress(&self) -> bool {
        self.typing_line.is_some() || !self.pending_lines.is_empty()
    }

    /// A text box (name input or free chat) is taking keystrokes.
    pub(crate) fn text_entry_active(&self) -> bool {
        self.input_active || self.free_chat
    }

    fn set_interaction(&mut self, boundary: &BoundaryResult) {
        self.choices = boundary
            .choices
            .iter()
            .map(|(index, text)| ChoiceRow {
                index: *index,
                text: text.clone(),
            })
            .collect();
        self.input_active = boundary.event == BoundaryEvent::Input;
        self.input_placeholder = boundary.input_placeholder.clone();
        self.free_chat = boundary.event == BoundaryEvent::FreeChat;
        self.ended = boundary.event == BoundaryEvent::End;
        self.input_buffer.clear();
        self.selected_choice_index = 0;
        self.choice_scroll_offset = 0;
        self.confirm_restart = false;
    }

    /// A new scene replaces the text area and restarts the typewriter.
    pub(crate) fn show_boundary(&mut self, boundary: BoundaryResult) {
        if boundary.event == BoundaryEvent::Unchanged {
            return;
        }
        if boundary.event == BoundaryEvent::Chat {
            self.append_chat(boundary);
            return;
        }
        self.set_interaction(&boundary);
        self.speaker = boundary.speaker.unwrap_or_default();
        self.background = boundary.background;
        self.sprite = boundary.sprite;
        self.hint = boundary.hint;
        if let Some(affection) = boundary.affection {
            self.affection = affection;
        }
        self.rendered_lines.clear();
        self.pending_lines = boundary.texts;
        self.typing_line = None;
        self.typing_chars = 0;
    }

    /// Chat replies accumulate under the free-chat intro. A reply without a
    /// sprite keeps the current one.
    pub(crate) fn append_chat(&mut self, boundary: BoundaryResult) {
        let speaker = boundary.speaker.unwrap_or_default();
        for text in boundary.texts {
            self.pending_lines.push(format!("【{}】{}", speaker, text));
        }
        if boundary.sprite.is_some() {
            self.sprite = boundary.sprite;
        }
        if let Some(affection) = boundary.affection {
            self.affection = affection;
        }
        if let Some(gain) = boundary.affection_gain.filter(|gain| *gain != 0) {
            self.flash = Some((format!("好感度 {:+}", gain), Instant::now()));
        }
        self.chat_pending = false;
    }

    pub(crate) fn push_player_line(&mut self, text: &str) {
        self.complete_typing();
        self.rendered_lines.push(format!("【你】{}", text));
    }

    pub(crate) fn complete_typing(&mut self) {
        if let Some(line) = self.typing_line.take() {
            self.rendered_lines.push(line);
        }
        self.rendered_lines.append(&mut self.pending_lines);
        self.typing_chars = 0;
    }

    pub(crate) fn expire_flash(&mut self, now: Instant) {
        if let Some((_, shown_at)) = &self.flash {
            if now.duration_since(*shown_at) >= FLASH_DURATION {
                self.flash = None;
            }
        }
    }

    pub(crate) fn advance_typewriter(&mut self) -> bool {
        let Some(line) = &self.typing_line else {
            if self.pending_lines.is_empty() {
                return false;
            }
            let next_line = self.pending_lines.remove(0);
            if next_line.is_empty() {
                self.rendered_lines.push(next_line);
                return true;
            }
            self.typing_line = Some(next_line);
            self.typing_chars = 1;
            return true;
        };

        if self.typing_chars >= line.chars().count() {
            self.rendered_lines.push(line.clone());
            self.typing_line = None;
            self.typing_chars = 0;
            return true;
        }
        self.typing_chars += 1;
        true
    }
}
