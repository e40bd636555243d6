//! Conversation state and its transitions, independent of rendering.

use crate::events::RequestId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One user question paired with its (possibly pending) answer
#[derive(Debug, Clone)]
pub struct Exchange {
    pub text: String,
    pub response: String,
    pub asked_at: DateTime<Utc>,
}

/// Enumerated UI mode; editing and loading cannot overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Editing(usize),
    Loading,
}

/// Editable text buffer with a char-indexed cursor
#[derive(Debug, Clone, Default)]
pub struct DraftBuffer {
    pub content: String,
    pub cursor: usize,
}

impl DraftBuffer {
    /// Insert a character at the cursor position
    pub fn insert(&mut self, c: char) {
        let byte = char_to_byte(&self.content, self.cursor);
        self.content.insert(byte, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte = char_to_byte(&self.content, self.cursor);
            self.content.remove(byte);
            true
        } else {
            false
        }
    }

    /// Delete the character at the cursor
    pub fn delete(&mut self) -> bool {
        if self.cursor < self.content.chars().count() {
            let byte = char_to_byte(&self.content, self.cursor);
            self.content.remove(byte);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.content.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Content with a block cursor marker inserted at the cursor position
    pub fn with_cursor_marker(&self) -> String {
        let mut shown = self.content.clone();
        let byte = char_to_byte(&shown, self.cursor);
        shown.insert(byte, '▌');
        shown
    }
}

/// Byte offset of the given char index, clamped to the end of the string
fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Conversation state driven by the event loop
pub struct ChatState {
    /// Ordered conversation; insertion order is display order
    pub exchanges: Vec<Exchange>,
    /// The not-yet-submitted question text
    pub draft: DraftBuffer,
    /// Shared edit buffer; seeds and captures inline edits across rows
    pub scratch: DraftBuffer,
    pub view: ViewState,
    /// Set on the first submission, never cleared for the session
    pub started: bool,
    /// Row targeted by the next edit request
    pub selected: usize,
    /// History scroll offset measured from the bottom
    pub scroll_from_bottom: u16,
    in_flight: Option<RequestId>,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            exchanges: Vec::new(),
            draft: DraftBuffer::default(),
            scratch: DraftBuffer::default(),
            view: ViewState::Idle,
            started: false,
            selected: 0,
            scroll_from_bottom: 0,
            in_flight: None,
        }
    }

    /// Submission is enabled only for a non-blank draft while idle
    pub fn can_submit(&self) -> bool {
        self.view == ViewState::Idle && !self.draft.content.trim().is_empty()
    }

    /// Append the draft as a new exchange and enter the loading state.
    ///
    /// Returns the question and the request id the fetch must report under.
    pub fn submit(&mut self) -> Option<(RequestId, String)> {
        if !self.can_submit() {
            return None;
        }

        let question = self.draft.content.clone();
        self.started = true;
        self.exchanges.push(Exchange {
            text: question.clone(),
            response: String::new(),
            asked_at: Utc::now(),
        });
        self.draft.clear();
        self.view = ViewState::Loading;
        self.selected = self.exchanges.len() - 1;
        self.scroll_from_bottom = 0;

        let request_id = Uuid::new_v4();
        self.in_flight = Some(request_id);
        Some((request_id, question))
    }

    /// True when the outcome belongs to the current in-flight request
    pub fn accepts(&self, request_id: RequestId) -> bool {
        self.in_flight == Some(request_id)
    }

    /// Write a successful payload into the newest exchange.
    ///
    /// The answer is attached to the *last* exchange at completion time, not
    /// to the exchange the request was invoked for; the request-id check is
    /// the only guard against stale completions.
    pub fn apply_fetch_success(&mut self, request_id: RequestId, text: String) {
        if !self.accepts(request_id) {
            return;
        }
        self.in_flight = None;
        self.view = ViewState::Idle;
        if let Some(last) = self.exchanges.last_mut() {
            last.response = text;
        }
        self.scroll_from_bottom = 0;
    }

    /// A failed fetch leaves every response untouched; only the loading
    /// indicator is cleared
    pub fn apply_fetch_failure(&mut self, request_id: RequestId) {
        if !self.accepts(request_id) {
            return;
        }
        self.in_flight = None;
        self.view = ViewState::Idle;
    }

    /// Enter edit mode on a row. Rejected while a fetch is in flight.
    ///
    /// The edit field shows the shared scratch buffer, not the row's own
    /// text.
    pub fn begin_edit(&mut self, index: usize) -> bool {
        if self.view != ViewState::Idle || index >= self.exchanges.len() {
            return false;
        }
        self.scratch.move_end();
        self.view = ViewState::Editing(index);
        true
    }

    /// Exit edit mode without touching the conversation
    pub fn cancel_edit(&mut self) {
        if matches!(self.view, ViewState::Editing(_)) {
            self.view = ViewState::Idle;
        }
    }

    /// Save the edit, discarding everything after the row when the trimmed
    /// scratch text differs from the current draft value. The comparison
    /// target is the draft, not the row's original text.
    pub fn save_edit(&mut self) {
        if let ViewState::Editing(index) = self.view {
            if self.scratch.content.trim() != self.draft.content {
                self.exchanges.truncate(index + 1);
                self.selected = self.selected.min(self.exchanges.len().saturating_sub(1));
                self.scroll_from_bottom = 0;
            }
            self.view = ViewState::Idle;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.exchanges.len() {
            self.selected += 1;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    #[cfg(test)]
    pub(crate) fn in_flight_id(&self) -> Option<RequestId> {
        self.in_flight
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}
