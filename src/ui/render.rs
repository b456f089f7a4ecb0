use crate::state::{SendPhase, StoreSnapshot};
use crate::types::{Confidence, Message, Role, Thread};
use crate::ui::input_metrics::{
    cursor_row_col, truncate_with_ellipsis, wrap_input_lines, wrap_text,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const APP_TITLE: &str = "Clinical AI Assistant";
/// Shown in an assistant message that has not received any text yet.
pub const TYPING_INDICATOR: &str = "▍";
const INPUT_PLACEHOLDER: &str = "Ask about clinical tools, healthcare AI, or workflow optimization...";

pub fn format_confidence(confidence: &Confidence) -> String {
    fn percent(value: f64) -> i64 {
        (value * 100.0).round() as i64
    }
    format!(
        "confidence: overall {}% (routing {}%, retrieval {}%, response {}%)",
        percent(confidence.overall),
        percent(confidence.routing),
        percent(confidence.retrieval),
        percent(confidence.response),
    )
}

fn phase_label(phase: SendPhase) -> &'static str {
    match phase {
        SendPhase::Idle => "ready",
        SendPhase::Sending => "sending...",
        SendPhase::Streaming => "streaming...",
        SendPhase::SettledOk => "done",
        SendPhase::SettledErr => "failed",
    }
}

/// Header text: app name, active thread title, send phase, and an optional notice.
pub fn status_text(snapshot: &StoreSnapshot, notice: Option<&str>) -> String {
    let title = snapshot
        .active_thread_id
        .as_deref()
        .map(|id| {
            snapshot
                .threads
                .iter()
                .find(|thread| thread.id == id)
                .map_or(id, |thread| thread.title.as_str())
        })
        .unwrap_or("no chat selected");

    let mut status = format!("{APP_TITLE} | {title} | {}", phase_label(snapshot.phase));
    if let Some(notice) = notice {
        status.push_str(" | ");
        status.push_str(notice);
    }
    status
}

/// One row per thread, numbered from 1, with the active thread marked `*`.
pub fn thread_list_lines(
    threads: &[Thread],
    active_id: Option<&str>,
    width: usize,
) -> Vec<Line<'static>> {
    if threads.is_empty() {
        return vec![Line::styled(
            "No conversations yet",
            Style::default().fg(Color::DarkGray),
        )];
    }

    threads
        .iter()
        .enumerate()
        .map(|(idx, thread)| {
            let active = active_id == Some(thread.id.as_str());
            let marker = if active { '*' } else { ' ' };
            let row = format!("{marker}{:>2} {}", idx + 1, thread.title);
            let style = if active {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::styled(truncate_with_ellipsis(&row, width), style)
        })
        .collect()
}

/// Rows for one message, wrapped to `width`.
pub fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (label, color) = match message.role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant => ("Assistant", Color::Green),
    };
    let mut lines = vec![Line::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];

    if let Some(route) = message.route.as_deref() {
        lines.push(Line::styled(
            truncate_with_ellipsis(&format!("Route: {route}"), width),
            Style::default().fg(Color::Yellow),
        ));
    }

    if message.content.is_empty() {
        if message.role == Role::Assistant {
            lines.push(Line::styled(
                TYPING_INDICATOR,
                Style::default().add_modifier(Modifier::SLOW_BLINK),
            ));
        }
    } else {
        lines.extend(
            wrap_text(&message.content, width)
                .into_iter()
                .map(Line::from),
        );
    }

    if let Some(confidence) = &message.confidence {
        lines.push(Line::styled(
            truncate_with_ellipsis(&format_confidence(confidence), width),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines
}

/// The whole transcript as display rows, including the empty states.
pub fn transcript_lines(snapshot: &StoreSnapshot, width: usize) -> Vec<Line<'static>> {
    let hint = Style::default().fg(Color::DarkGray);
    if snapshot.active_thread_id.is_none() {
        return vec![
            Line::styled(APP_TITLE, hint.add_modifier(Modifier::BOLD)),
            Line::styled("Select a chat or create a new one to get started (/new)", hint),
        ];
    }
    if snapshot.messages.is_empty() {
        return vec![Line::styled("How can I help you today?", hint)];
    }

    let mut lines = Vec::new();
    for (idx, message) in snapshot.messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::default());
        }
        lines.extend(message_lines(message, width));
    }
    lines
}

/// Top row to show so the view sits `from_bottom` rows above the newest line.
pub fn transcript_scroll(total_rows: usize, viewport_rows: usize, from_bottom: usize) -> usize {
    let max_scroll = total_rows.saturating_sub(viewport_rows);
    max_scroll.saturating_sub(from_bottom)
}

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_input_lines(input, width).len().max(1)
}

pub fn render_header(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let text = truncate_with_ellipsis(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray)),
        area,
    );
}

pub fn render_thread_list(
    frame: &mut Frame<'_>,
    area: Rect,
    threads: &[Thread],
    active_id: Option<&str>,
) {
    if area.height == 0 || area.width <= 2 {
        return;
    }
    let block = Block::default().borders(Borders::RIGHT).title("Chats");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = thread_list_lines(threads, active_id, inner.width as usize);
    let active_row = active_id
        .and_then(|id| threads.iter().position(|thread| thread.id == id))
        .unwrap_or(0);
    let scroll = (active_row + 1).saturating_sub(inner.height as usize);
    frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
}

/// Draws pre-wrapped transcript rows; returns the largest useful `from_bottom`.
pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    lines: Vec<Line<'static>>,
    from_bottom: usize,
) -> usize {
    if area.height == 0 || area.width == 0 {
        return 0;
    }
    let viewport = area.height as usize;
    let total = lines.len();
    let scroll = transcript_scroll(total, viewport, from_bottom);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(Color::White))
            .scroll((scroll.min(u16::MAX as usize) as u16, 0)),
        area,
    );
    total.saturating_sub(viewport)
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }
    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let style = Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 24));

    if input.is_empty() {
        let placeholder = truncate_with_ellipsis(INPUT_PLACEHOLDER, input_width);
        frame.render_widget(
            Paragraph::new(format!("> {placeholder}")).style(style.add_modifier(Modifier::DIM)),
            area,
        );
        frame.set_cursor_position((area.x.saturating_add(2), area.y));
        return;
    }

    let rows = wrap_input_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = (cursor_row + 1).saturating_sub(visible_rows);

    let rendered: Vec<Line<'static>> = (window_start..window_start + visible_rows)
        .map(|row_index| {
            let prefix = if row_index == 0 { "> " } else { "  " };
            let row = rows.get(row_index).map(String::as_str).unwrap_or_default();
            Line::from(format!("{prefix}{row}"))
        })
        .collect();
    frame.render_widget(Paragraph::new(rendered).style(style), area);

    let cursor_y = area
        .y
        .saturating_add((cursor_row - window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}
