use std::borrow::Cow;
use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

/// Columns between tab stops when transcript text is laid out.
pub const TAB_WIDTH: usize = 4;

/// Splits prompt input into rows no wider than `width` columns, one character
/// at a time so rows line up with `cursor_row_col`.
///
/// Hard newlines always start a new row; `\r` is dropped. Always returns at
/// least one row.
pub fn wrap_input_lines(input: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut used = 0usize;

    for ch in input.chars() {
        match ch {
            '\r' => continue,
            '\n' => {
                rows.push(String::new());
                used = 0;
                continue;
            }
            _ => {}
        }
        let ch_width = char_display_width(ch);
        if used + ch_width > width && used > 0 {
            rows.push(String::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        used += ch_width;
    }
    rows
}

/// Lays out message text in rows no wider than `width` columns.
///
/// Rows break between words; a word wider than a whole row is split by
/// character. Tabs expand to the next `TAB_WIDTH` stop. Always returns at
/// least one row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let line = expand_tabs(line.trim_end_matches('\r'));
        wrap_words(&line, width, &mut rows);
    }
    rows
}

fn wrap_words(line: &str, width: usize, rows: &mut Vec<String>) {
    let mut row = String::new();
    let mut used = 0usize;

    for word in line.split_inclusive(' ') {
        let visible = display_width(word.trim_end_matches(' '));
        if used > 0 && used + visible > width {
            push_row(rows, &mut row);
            used = 0;
        }
        if visible > width {
            for ch in word.chars() {
                let ch_width = char_display_width(ch);
                if used + ch_width > width && used > 0 {
                    push_row(rows, &mut row);
                    used = 0;
                }
                row.push(ch);
                used += ch_width;
            }
            continue;
        }
        row.push_str(word);
        used += display_width(word);
    }
    push_row(rows, &mut row);
}

fn push_row(rows: &mut Vec<String>, row: &mut String) {
    row.truncate(row.trim_end_matches(' ').len());
    rows.push(std::mem::take(row));
}

fn expand_tabs(line: &str) -> Cow<'_, str> {
    if !line.contains('\t') {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(ch);
            column += char_display_width(ch);
        }
    }
    Cow::Owned(out)
}

/// Row and column of `cursor_byte` once `input` is wrapped to `width`.
pub fn cursor_row_col(input: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(input, cursor_byte);
    let (mut row, mut col) = (0usize, 0usize);

    for ch in input[..cursor_byte].chars() {
        match ch {
            '\r' => {}
            '\n' => {
                row += 1;
                col = 0;
            }
            _ => {
                let ch_width = char_display_width(ch);
                if col + ch_width > width && col > 0 {
                    row += 1;
                    col = 0;
                }
                col += ch_width;
            }
        }
    }

    if col >= width {
        (row + 1, 0)
    } else {
        (row, col)
    }
}

/// Cuts `text` to fit `width` columns, ending in `...` when anything was dropped.
pub fn truncate_with_ellipsis(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width < 4 {
        return take_columns(text, width);
    }
    let mut out = take_columns(text, width - 3);
    out.push_str("...");
    out
}

fn take_columns(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_wrap_breaks_on_width_and_newlines() {
        assert_eq!(wrap_input_lines("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_input_lines("ab\ncd", 10), vec!["ab", "cd"]);
        assert_eq!(wrap_input_lines("", 10), vec![""]);
    }

    #[test]
    fn test_input_wrap_counts_wide_characters_as_two_columns() {
        assert_eq!(wrap_input_lines("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_text_wrap_breaks_between_words() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(
            wrap_text("Ambient scribes reduce charting", 16),
            vec!["Ambient scribes", "reduce charting"]
        );
    }

    #[test]
    fn test_text_wrap_splits_words_longer_than_a_row() {
        assert_eq!(wrap_text("see abcdefghij", 4), vec!["see", "abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_text_wrap_expands_tabs_to_stops() {
        assert_eq!(wrap_text("\tdose", 20), vec!["    dose"]);
        assert_eq!(wrap_text("ab\tc", 20), vec!["ab  c"]);
    }

    #[test]
    fn test_text_wrap_keeps_blank_lines_and_indentation() {
        assert_eq!(wrap_text("a\r\n\n  b", 10), vec!["a", "", "  b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_cursor_moves_to_next_row_at_wrap_point() {
        assert_eq!(cursor_row_col("abcd", 2, 4), (0, 2));
        assert_eq!(cursor_row_col("abcd", 4, 4), (1, 0));
        assert_eq!(cursor_row_col("ab\ncd", 4, 10), (1, 1));
    }

    #[test]
    fn test_cursor_inside_multibyte_char_clamps_left() {
        let input = "é!";
        assert_eq!(cursor_row_col(input, 1, 10), (0, 0));
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Clinical notes", 20), "Clinical notes");
        assert_eq!(truncate_with_ellipsis("Clinical notes", 10), "Clinica...");
        assert_eq!(truncate_with_ellipsis("Clinical", 3), "Cli");
    }
}
