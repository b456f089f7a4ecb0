use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Below this width the thread sidebar is hidden and the transcript takes the row.
pub const MIN_WIDTH_FOR_SIDEBAR: u16 = 60;
pub const SIDEBAR_WIDTH: u16 = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatLayout {
    pub header: Rect,
    /// Zero-width when the terminal is too narrow.
    pub sidebar: Rect,
    pub transcript: Rect,
    pub input: Rect,
}

pub fn split_chat_layout(area: Rect, input_rows: u16) -> ChatLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    let sidebar_width = if area.width >= MIN_WIDTH_FOR_SIDEBAR {
        SIDEBAR_WIDTH
    } else {
        0
    };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
        .split(rows[1]);

    ChatLayout {
        header: rows[0],
        sidebar: body[0],
        transcript: body[1],
        input: rows[2],
    }
}
