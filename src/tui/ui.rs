//! Screen layout: the response log grows upward from above the input line.
//!
//! ```text
//! row 0        oldest visible line
//! ...
//! row rows-2   newest visible line (after skipping `scroll_offset` lines)
//! row rows-1   input line
//! ```

use std::borrow::Cow;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;

use crate::core::response_log::LogReader;
use crate::core::state::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub rows: u16,
    pub cols: u16,
}

impl From<Rect> for Viewport {
    fn from(area: Rect) -> Self {
        Self {
            rows: area.height,
            cols: area.width,
        }
    }
}

/// One line of output at a 0-based screen row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRow {
    pub row: u16,
    pub text: String,
}

/// Split a payload into newline-delimited lines.
///
/// A trailing newline ends the last line rather than starting an empty one,
/// and an empty payload has no lines at all.
pub fn logical_lines(payload: &[u8]) -> Vec<&[u8]> {
    if payload.is_empty() {
        return Vec::new();
    }
    let body = payload.strip_suffix(b"\n").unwrap_or(payload);
    body.split(|&b| b == b'\n').collect()
}

fn render_line(line: &[u8], cols: usize) -> String {
    String::from_utf8_lossy(line)
        .chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .take(cols)
        .collect()
}

fn truncate(text: &str, cols: usize) -> Cow<'_, str> {
    match text.char_indices().nth(cols) {
        Some((end, _)) => Cow::Borrowed(&text[..end]),
        None => Cow::Borrowed(text),
    }
}

/// Compute every row to paint, log lines first, the input line last.
///
/// Responses are walked newest to oldest and their lines last to first.
/// Failed responses contribute nothing. The first `scroll_offset` lines met on
/// that walk are skipped, so a positive offset reveals older content.
pub fn visible_rows(
    log: &LogReader,
    scroll_offset: i64,
    viewport: Viewport,
    input_line: &str,
) -> Vec<ScreenRow> {
    let mut rows = Vec::new();
    if viewport.rows == 0 {
        return rows;
    }
    let cols = usize::from(viewport.cols);
    let input_row = viewport.rows - 1;

    let mut free_rows = input_row;
    let mut skip = scroll_offset;
    'responses: for slot in log.iter_newest_first() {
        let Some(payload) = slot.payload() else {
            continue;
        };
        for line in logical_lines(payload).into_iter().rev() {
            if free_rows == 0 {
                break 'responses;
            }
            if skip > 0 {
                skip -= 1;
                continue;
            }
            free_rows -= 1;
            rows.push(ScreenRow {
                row: free_rows,
                text: render_line(line, cols),
            });
        }
    }

    rows.push(ScreenRow {
        row: input_row,
        text: truncate(input_line, cols).into_owned(),
    });
    rows
}

pub fn draw_ui(frame: &mut Frame, log: &LogReader, session: &Session) {
    let area = frame.area();
    let viewport = Viewport::from(area);

    for ScreenRow { row, text } in
        visible_rows(log, session.scroll_offset, viewport, &session.input_line)
    {
        let rect = Rect::new(area.x, area.y + row, area.width, 1);
        frame.render_widget(Line::raw(text), rect);
    }

    if area.height > 0 && area.width > 0 {
        let typed = u16::try_from(session.input_len()).unwrap_or(u16::MAX);
        let cursor_x = typed.min(area.width - 1);
        frame.set_cursor_position((area.x + cursor_x, area.y + area.height - 1));
    }
}
