use crate::ui::chat::state::{ChatState, ViewState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when a key is routed to the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted,
    None,
}

/// Apply a key event to the draft buffer.
///
/// Enter with no modifier submits; Shift+Enter inserts a newline instead of
/// reaching the submit path. Submission while loading or on a blank draft is
/// a no-op.
pub fn handle_key(state: &mut ChatState, key: KeyEvent) -> ComposerResult {
    match key.code {
        KeyCode::Enter => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                state.draft.insert('\n');
            } else if state.can_submit() {
                return ComposerResult::Submitted;
            }
        }
        KeyCode::Char(c) => state.draft.insert(c),
        KeyCode::Backspace => {
            state.draft.backspace();
        }
        KeyCode::Delete => {
            state.draft.delete();
        }
        KeyCode::Left => state.draft.move_left(),
        KeyCode::Right => state.draft.move_right(),
        KeyCode::Home => state.draft.move_home(),
        KeyCode::End => state.draft.move_end(),
        _ => {}
    }

    ComposerResult::None
}

/// Composer input box for the next question
pub struct Composer<'a> {
    state: &'a ChatState,
    placeholder: &'a str,
}

impl<'a> Composer<'a> {
    pub fn new(state: &'a ChatState, placeholder: &'a str) -> Self {
        Self { state, placeholder }
    }

    /// Title line; shows the animated thinking indicator while loading
    fn title(&self) -> String {
        if self.state.view == ViewState::Loading {
            format!("ImmoGPT is thinking{}", loading_dots())
        } else {
            "Your question".to_string()
        }
    }

    /// Send affordance: dimmed on a blank draft, highlighted once there is
    /// something to send
    fn send_glyph(&self) -> Span<'static> {
        if self.state.view == ViewState::Loading {
            Span::styled("···", Style::default().fg(Color::Yellow))
        } else if self.state.draft.content.trim().is_empty() {
            Span::styled(" ➤ ", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(" ➤ ", Style::default().fg(Color::Yellow))
        }
    }
}

/// Animated dots driven by wall-clock time, redrawn on every tick
fn loading_dots() -> &'static str {
    match (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        / 300)
        % 4
    {
        0 => ".",
        1 => "..",
        2 => "...",
        _ => "   ",
    }
}

impl Widget for Composer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = !matches!(self.state.view, ViewState::Editing(_));
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if focused {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.draft.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let shown = if focused {
                self.state.draft.with_cursor_marker()
            } else {
                self.state.draft.content.clone()
            };

            for (i, line_text) in shown.split('\n').enumerate() {
                if i < inner_area.height as usize {
                    let line = Line::from(vec![Span::raw(line_text.to_string())]);
                    buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
                }
            }
        }

        // Send affordance pinned to the right edge
        if inner_area.width > 4 {
            let glyph_line = Line::from(vec![self.send_glyph()]);
            buf.set_line(
                inner_area.x + inner_area.width - 4,
                inner_area.y,
                &glyph_line,
                4,
            );
        }
    }
}
