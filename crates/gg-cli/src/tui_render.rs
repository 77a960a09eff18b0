use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::tui_actions::CHOICE_VIEWPORT_ROWS;
use crate::tui_state::TuiUiState;

const ELLIPSIS: &str = "…";

pub(crate) fn render_tui(frame: &mut Frame<'_>, ui: &TuiUiState) {
    let terminal_width = frame.area().width as usize;
    let terminal_rows = frame.area().height as usize;
    let content_width = (terminal_width.saturating_sub(2)).max(16);

    let typing_in_progress = ui.typing_in_progress();
    let mut text_lines = ui.rendered_lines.clone();
    if let Some(typing) = &ui.typing_line {
        text_lines.push(typing.chars().take(ui.typing_chars).collect::<String>());
    }
    let wrapped_text_rows = text_lines
        .iter()
        .flat_map(|line| wrap_line_to_width(line, content_width))
        .collect::<Vec<_>>();

    let interaction_rows = interaction_rows(ui, typing_in_progress, content_width);

    let mut reserved_rows = 5usize + 2 + interaction_rows.len() + 1;
    if ui.help_visible {
        reserved_rows += 1;
    }
    let visible_text_rows = terminal_rows.saturating_sub(reserved_rows).max(1);
    let clipped_text_rows = if wrapped_text_rows.len() <= visible_text_rows {
        wrapped_text_rows
    } else {
        wrapped_text_rows[wrapped_text_rows.len() - visible_text_rows..].to_vec()
    };

    let mut header = vec![Span::styled(
        truncate_to_width(
            format!("{} | 好感度: {}", ui.title, ui.affection).as_str(),
            content_width,
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some((flash, _)) = &ui.flash {
        header.push(Span::styled(
            format!("  {}", flash),
            Style::default().fg(Color::LightMagenta),
        ));
    }

    let gray = Style::default().fg(Color::Gray);
    let mut lines_out: Vec<Line<'_>> = vec![Line::from(header)];
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(
            format!("背景: {}", ui.background.as_deref().unwrap_or("-")).as_str(),
            content_width,
        ),
        gray,
    )));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(
            format!("立绘: {}", ui.sprite.as_deref().unwrap_or("-")).as_str(),
            content_width,
        ),
        gray,
    )));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(format!("status: {}", ui.status).as_str(), content_width),
        gray,
    )));
    lines_out.push(Line::from(Span::styled(
        if ui.free_chat || ui.speaker.is_empty() {
            " ".to_string()
        } else {
            truncate_to_width(format!("【{}】", ui.speaker).as_str(), content_width)
        },
        Style::default().fg(Color::Cyan),
    )));
    for row in clipped_text_rows {
        lines_out.push(Line::from(row));
    }
    lines_out.push(Line::from(Span::styled("─".repeat(content_width), gray)));
    lines_out.extend(interaction_rows);
    lines_out.push(Line::from(Span::styled("─".repeat(content_width), gray)));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(key_help(ui), content_width),
        Style::default().fg(Color::Yellow),
    )));
    if ui.help_visible {
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(
                "save/load use the galgame_save entry of the state file. restart keywords in free chat: 重新开始 restart 重启 重置",
                content_width,
            ),
            Style::default().fg(Color::Magenta),
        )));
    }

    let paragraph = Paragraph::new(lines_out).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area());
}

fn key_help(ui: &TuiUiState) -> &'static str {
    if ui.text_entry_active() {
        "keys: type+backspace | enter send | ctrl+s save | ctrl+l load | ctrl+r restart | ctrl+h help | esc quit"
    } else {
        "keys: enter/space next | up/down choose | s save | l load | r restart | h help | q quit"
    }
}

fn interaction_rows(
    ui: &TuiUiState,
    typing_in_progress: bool,
    content_width: usize,
) -> Vec<Line<'static>> {
    let mut rows = Vec::new();
    if ui.confirm_restart {
        rows.push(Line::from(Span::styled(
            "确定要重新开始吗？(y/N)".to_string(),
            Style::default().fg(Color::Red),
        )));
        return rows;
    }
    if typing_in_progress {
        rows.push(Line::from(" "));
        return rows;
    }

    if ui.input_active || ui.free_chat {
        let label = if ui.free_chat {
            "💬 自由对话"
        } else {
            "✏️ 请输入"
        };
        rows.push(Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(Color::Cyan),
        )));
        let shown = if ui.input_buffer.is_empty() {
            ui.input_placeholder.clone().unwrap_or_default()
        } else {
            ui.input_buffer.clone()
        };
        let style = if ui.chat_pending {
            Style::default().fg(Color::DarkGray)
        } else if ui.input_buffer.is_empty() {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::Green)
        };
        rows.push(Line::from(Span::styled(
            format!("> {}", truncate_to_width(&shown, content_width.saturating_sub(2))),
            style,
        )));
        return rows;
    }

    if !ui.choices.is_empty() {
        let choice_text_width = content_width.saturating_sub(2).max(8);
        for row_index in 0..CHOICE_VIEWPORT_ROWS {
            let absolute_index = ui.choice_scroll_offset + row_index;
            let Some(choice) = ui.choices.get(absolute_index) else {
                break;
            };
            let selected = absolute_index == ui.selected_choice_index;
            let prefix = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            rows.push(Line::from(Span::styled(
                format!(
                    "{}{}",
                    prefix,
                    truncate_to_width(choice.text.as_str(), choice_text_width)
                ),
                style,
            )));
        }
        if ui.choices.len() > CHOICE_VIEWPORT_ROWS {
            let window_end =
                (ui.choice_scroll_offset + CHOICE_VIEWPORT_ROWS).min(ui.choices.len());
            rows.push(Line::from(Span::styled(
                format!(
                    "window {}-{} / {}",
                    ui.choice_scroll_offset + 1,
                    window_end,
                    ui.choices.len()
                ),
                Style::default().fg(Color::Gray),
            )));
        }
        return rows;
    }

    if ui.ended {
        rows.push(Line::from(Span::styled(
            "[end]".to_string(),
            Style::default().fg(Color::Green),
        )));
        return rows;
    }

    rows.push(Line::from(Span::styled(
        ui.hint.clone().unwrap_or_default(),
        Style::default().fg(Color::Gray),
    )));
    rows
}

pub(crate) fn truncate_to_width(value: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= width {
        return value.to_string();
    }
    if width == 1 {
        return ELLIPSIS.to_string();
    }
    let mut out = chars.into_iter().take(width - 1).collect::<String>();
    out.push_str(ELLIPSIS);
    out
}

pub(crate) fn wrap_line_to_width(value: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
