use crate::state::{LineKind, TranscriptLine};
use crate::ui::text_metrics::{cursor_row_col, fit_to_width, wrap_display_rows};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

const PROMPT_PREFIX: &str = "> ";
const PROMPT_PREFIX_COLS: usize = 2;

pub fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        LineKind::Assistant => Style::default().fg(Color::White),
        LineKind::ToolPending => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::DIM),
        LineKind::Tool => Style::default().fg(Color::Green),
        LineKind::Notice => Style::default().fg(Color::DarkGray),
        LineKind::Error => Style::default().fg(Color::Red),
    }
}

pub fn prompt_visual_rows(input: &str, width: usize) -> usize {
    wrap_display_rows(input, width.saturating_sub(PROMPT_PREFIX_COLS).max(1)).len()
}

/// Wraps the transcript to `width` and returns the `height` rows visible when
/// scrolled `scroll_back` rows up from the bottom.
pub fn visible_transcript_rows(
    lines: &[TranscriptLine],
    width: usize,
    height: usize,
    scroll_back: usize,
) -> Vec<(LineKind, String)> {
    let rows: Vec<(LineKind, String)> = lines
        .iter()
        .flat_map(|line| {
            wrap_display_rows(&line.text, width)
                .into_iter()
                .map(move |row| (line.kind, row))
        })
        .collect();

    let bottom = rows.len().saturating_sub(scroll_back).max(height.min(rows.len()));
    let top = bottom.saturating_sub(height);
    rows[top..bottom].to_vec()
}

pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    lines: &[TranscriptLine],
    scroll_back: usize,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let rows = visible_transcript_rows(
        lines,
        area.width as usize,
        area.height as usize,
        scroll_back,
    );
    let rendered: Vec<Line<'_>> = rows
        .into_iter()
        .map(|(kind, text)| Line::styled(text, line_style(kind)))
        .collect();
    frame.render_widget(Paragraph::new(rendered), area);
}

pub fn render_prompt(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width as usize <= PROMPT_PREFIX_COLS {
        return;
    }

    let text_width = area.width as usize - PROMPT_PREFIX_COLS;
    let rows = wrap_display_rows(input, text_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, text_width);
    let visible = area.height as usize;
    let first = cursor_row.saturating_add(1).saturating_sub(visible);

    let rendered: Vec<Line<'_>> = (first..first + visible)
        .map(|row| {
            let prefix = if row == 0 { PROMPT_PREFIX } else { "  " };
            let text = rows.get(row).map(String::as_str).unwrap_or_default();
            Line::from(format!("{prefix}{text}"))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(rendered).style(Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 24))),
        area,
    );

    let cursor_x = area
        .x
        .saturating_add((PROMPT_PREFIX_COLS + cursor_col) as u16)
        .min(area.x + area.width - 1);
    let cursor_y = area.y.saturating_add((cursor_row - first) as u16);
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    frame.render_widget(
        Paragraph::new(fit_to_width(status, area.width as usize))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
