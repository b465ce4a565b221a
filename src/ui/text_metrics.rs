use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Soft-wraps `text` into rows no wider than `width` columns. Newlines always
/// break; carriage returns are dropped. Always returns at least one row.
pub fn wrap_display_rows(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut used = 0usize;

    for ch in text.chars() {
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

/// Row and column of the cursor at `cursor_byte` once `text` is wrapped to
/// `width`.
pub fn cursor_row_col(text: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(text, cursor_byte);
    let mut row = 0usize;
    let mut col = 0usize;

    for ch in text[..cursor_byte].chars() {
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
        row += 1;
        col = 0;
    }
    (row, col)
}

/// Cuts `text` to fit `width` columns, marking the cut with `...` when there
/// is room for it.
pub fn fit_to_width(text: &str, width: usize) -> String {
    let width = width.max(1);
    let total: usize = text.chars().map(char_display_width).sum();
    if total <= width {
        return text.to_string();
    }

    let (budget, marker) = if width >= 4 { (width - 3, "...") } else { (width, "") };
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > budget {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str(marker);
    out
}

pub fn clamp_to_char_boundary_left(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while cursor > 0 && !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_breaks_on_width_and_newlines() {
        assert_eq!(wrap_display_rows("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_display_rows("ab\r\ncd", 4), vec!["ab", "cd"]);
        assert_eq!(wrap_display_rows("", 4), vec![""]);
    }

    #[test]
    fn test_wrap_counts_wide_chars() {
        assert_eq!(wrap_display_rows("株価株価", 4), vec!["株価", "株価"]);
    }

    #[test]
    fn test_cursor_position_follows_wrapping() {
        assert_eq!(cursor_row_col("abcdef", 6, 4), (1, 2));
        assert_eq!(cursor_row_col("abcd", 4, 4), (1, 0));
        assert_eq!(cursor_row_col("ab\ncd", 4, 10), (1, 1));
        assert_eq!(cursor_row_col("é", 1, 10), (0, 0));
    }

    #[test]
    fn test_fit_to_width_marks_truncation() {
        assert_eq!(fit_to_width("finchat mode:ready", 10), "finchat...");
        assert_eq!(fit_to_width("short", 10), "short");
        assert_eq!(fit_to_width("abcdef", 3), "abc");
    }
}
