use crate::ui::input_metrics::clamp_to_char_boundary_left;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    /// Jump back to the newest message and keep following it.
    Bottom,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputAction {
    None,
    Submit(String),
    Quit,
    Scroll(ScrollAction),
    NextThread,
    PreviousThread,
}

/// Single prompt buffer with a byte cursor and recall of submitted lines.
#[derive(Debug, Default)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    /// Draft saved when history recall starts, restored when it ends.
    draft: Option<String>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.draft = None;
    }

    pub fn insert_str(&mut self, value: &str) {
        self.history_index = None;
        self.draft = None;
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        let value = value.replace("\r\n", "\n").replace('\r', "\n");
        self.buffer.insert_str(cursor, &value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        let Some((start, _)) = self.buffer[..end].char_indices().next_back() else {
            return;
        };
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        let Some(ch) = self.buffer[start..].chars().next() else {
            return;
        };
        self.buffer.replace_range(start..start + ch.len_utf8(), "");
        self.cursor = start;
    }

    fn move_left(&mut self) {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.cursor = self.buffer[..cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(idx, _)| idx);
    }

    fn move_right(&mut self) {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.cursor = self.buffer[cursor..]
            .chars()
            .next()
            .map_or(cursor, |ch| cursor + ch.len_utf8());
    }

    /// Takes the trimmed buffer if it has any content, recording it for recall.
    pub fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        if self.history.last() != Some(&value) {
            self.history.push(value.clone());
        }
        self.clear();
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => {
                self.draft = Some(self.buffer.clone());
                self.history.len() - 1
            }
        };
        self.history_index = Some(index);
        self.buffer = self.history[index].clone();
        self.cursor = self.buffer.len();
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 < self.history.len() {
            self.history_index = Some(idx + 1);
            self.buffer = self.history[idx + 1].clone();
        } else {
            self.history_index = None;
            self.buffer = self.draft.take().unwrap_or_default();
        }
        self.cursor = self.buffer.len();
    }

    pub fn apply_event(&mut self, event: Event) -> InputAction {
        match event {
            Event::Paste(text) => {
                self.insert_str(&text);
                InputAction::None
            }
            Event::Key(key) if key.kind != KeyEventKind::Release => self.apply_key(key),
            _ => InputAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return InputAction::Quit,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return InputAction::Quit;
                }
            }
            KeyCode::Char('j') if ctrl => self.insert_str("\n"),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_str("\n")
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return InputAction::Submit(value);
                }
            }
            KeyCode::Up if ctrl => return InputAction::Scroll(ScrollAction::LineUp),
            KeyCode::Down if ctrl => return InputAction::Scroll(ScrollAction::LineDown),
            KeyCode::End if ctrl => return InputAction::Scroll(ScrollAction::Bottom),
            KeyCode::PageUp => return InputAction::Scroll(ScrollAction::PageUp),
            KeyCode::PageDown => return InputAction::Scroll(ScrollAction::PageDown),
            KeyCode::Tab => return InputAction::NextThread,
            KeyCode::BackTab => return InputAction::PreviousThread,
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Esc => self.clear(),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut encoded = [0u8; 4];
                self.insert_str(ch.encode_utf8(&mut encoded));
            }
            _ => {}
        }
        InputAction::None
    }
}
