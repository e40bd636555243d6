//! Conversation history display component

use crate::ui::chat::state::{ChatState, Exchange, ViewState};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Scrolling view over the conversation, anchored to the newest message
pub struct HistoryView<'a> {
    state: &'a ChatState,
}

impl<'a> HistoryView<'a> {
    pub fn new(state: &'a ChatState) -> Self {
        Self { state }
    }

    /// Render one exchange into lines; the answer row only appears once the
    /// response is non-empty
    fn render_exchange(&self, index: usize, exchange: &Exchange, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let editing = self.state.view == ViewState::Editing(index);
        let selected = self.state.view == ViewState::Idle && self.state.selected == index;

        let marker = if selected { "❯ " } else { "  " };
        let timestamp = exchange.asked_at.format("%H:%M:%S").to_string();
        let header = format!("{}👤 You  {} {}", marker, timestamp, "─".repeat(16));
        lines.push(Line::from(vec![Span::styled(
            header,
            if selected {
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        )]));

        if editing {
            // The edit field shows the shared scratch buffer.
            for content_line in wrap_text(&self.state.scratch.with_cursor_marker(), body_width(width)) {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(content_line, Style::default().fg(Color::Yellow)),
                ]));
            }
            lines.push(Line::from(vec![Span::styled(
                "  [Enter save · Esc cancel]",
                Style::default().fg(Color::DarkGray),
            )]));
        } else {
            for content_line in wrap_text(&exchange.text, body_width(width)) {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(content_line, Style::default().fg(Color::Blue)),
                ]));
            }
        }

        if !exchange.response.is_empty() {
            // Copy/like/dislike affordances are presentational only.
            let answer_header = format!("  🤖 ImmoGPT {}", "─".repeat(16));
            lines.push(Line::from(vec![
                Span::styled(answer_header, Style::default().fg(Color::DarkGray)),
                Span::styled("  ⧉ 👍 👎", Style::default().fg(Color::DarkGray)),
            ]));
            for content_line in wrap_text(&exchange.response, body_width(width)) {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(content_line, Style::default().fg(Color::Green)),
                ]));
            }
        }

        lines
    }
}

fn body_width(width: u16) -> usize {
    width.saturating_sub(4) as usize
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 Conversation");
        let inner_area = block.inner(area);
        block.render(area, buf);

        // An empty conversation renders no message list at all.
        if self.state.exchanges.is_empty() {
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for (index, exchange) in self.state.exchanges.iter().enumerate() {
            let mut lines = self.render_exchange(index, exchange, inner_area.width);
            all_lines.append(&mut lines);
            // spacing between exchanges
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        // Anchor to the bottom, then back off by the scroll offset.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_start = total.saturating_sub(height);
        let start = max_start.saturating_sub(self.state.scroll_from_bottom as usize);
        let visible = &all_lines[start..(start + height).min(total)];

        for (i, line) in visible.iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state_with(exchanges: Vec<(&str, &str)>) -> ChatState {
        let mut state = ChatState::new();
        state.started = true;
        for (text, response) in exchanges {
            state.exchanges.push(Exchange {
                text: text.to_string(),
                response: response.to_string(),
                asked_at: Utc::now(),
            });
        }
        state
    }

    fn rendered(state: &ChatState) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 60, 16));
        HistoryView::new(state).render(buf.area, &mut buf);

        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn pending_exchange_renders_only_the_user_row() {
        let state = state_with(vec![("Where is the cheapest flat?", "")]);
        let text = rendered(&state);

        assert!(text.contains("cheapest flat?"));
        assert!(!text.contains("ImmoGPT ─"));
    }

    #[test]
    fn answered_exchange_renders_both_rows() {
        let state = state_with(vec![("Where is the cheapest flat?", "Downtown costs less.")]);
        let text = rendered(&state);

        assert!(text.contains("cheapest flat?"));
        assert!(text.contains("Downtown costs less."));
    }

    #[test]
    fn empty_conversation_renders_no_message_list() {
        let state = state_with(vec![]);
        let text = rendered(&state);

        assert!(!text.contains("You"));
        assert!(text.contains("Conversation"));
    }

    #[test]
    fn editing_row_shows_the_scratch_buffer_not_the_row_text() {
        let mut state = state_with(vec![("original question", "answer")]);
        for c in "scratch value".chars() {
            state.scratch.insert(c);
        }
        assert!(state.begin_edit(0));

        let text = rendered(&state);
        assert!(text.contains("scratch value"));
        assert!(!text.contains("original question"));
        assert!(text.contains("Enter save"));
    }

    #[test]
    fn wrap_text_splits_on_word_boundaries() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }
}
