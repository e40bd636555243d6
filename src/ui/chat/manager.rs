use crate::client::{AnswerClient, payload_text};
use crate::events::FetchOutcome;
use crate::ui::chat::composer::{self, Composer, ComposerResult};
use crate::ui::chat::history::HistoryView;
use crate::ui::chat::state::{ChatState, ViewState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};
use tokio::sync::mpsc;
use tracing::{error, info};

const PLACEHOLDER: &str = "Ask any question about real estate.";

/// Ties the conversation state to the answer client and the event loop
pub struct ChatManager {
    state: ChatState,
    client: AnswerClient,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    title: String,
    tagline: String,
}

impl ChatManager {
    pub fn new(client: AnswerClient, title: String, tagline: String) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            state: ChatState::new(),
            client,
            outcome_tx,
            outcome_rx,
            title,
            tagline,
        }
    }

    /// Handle a key event; returns false when the app should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return false,
                KeyCode::Char('e') => {
                    self.state.begin_edit(self.state.selected);
                    return true;
                }
                KeyCode::Up => {
                    self.state.select_prev();
                    return true;
                }
                KeyCode::Down => {
                    self.state.select_next();
                    return true;
                }
                _ => {}
            }
        }

        match self.state.view {
            ViewState::Editing(_) => self.handle_edit_key(key),
            _ => match key.code {
                KeyCode::PageUp => self.state.scroll_up(5),
                KeyCode::PageDown => self.state.scroll_down(5),
                _ => {
                    if composer::handle_key(&mut self.state, key) == ComposerResult::Submitted {
                        self.submit();
                    }
                }
            },
        }

        true
    }

    /// Keys routed to the inline edit field
    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_edit(),
            KeyCode::Enter => self.state.save_edit(),
            KeyCode::Char(c) => self.state.scratch.insert(c),
            KeyCode::Backspace => {
                self.state.scratch.backspace();
            }
            KeyCode::Delete => {
                self.state.scratch.delete();
            }
            KeyCode::Left => self.state.scratch.move_left(),
            KeyCode::Right => self.state.scratch.move_right(),
            KeyCode::Home => self.state.scratch.move_home(),
            KeyCode::End => self.state.scratch.move_end(),
            _ => {}
        }
    }

    /// Append the draft as a new exchange and spawn the answer fetch
    fn submit(&mut self) {
        let Some((request_id, question)) = self.state.submit() else {
            return;
        };
        info!(%request_id, "submitting question");

        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = client.ask(&question).await;
            let _ = tx.send(FetchOutcome { request_id, result });
        });
    }

    /// Drain completed fetches; called from the main loop before each draw
    pub fn process_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome.result {
            Ok(payload) => {
                self.state
                    .apply_fetch_success(outcome.request_id, payload_text(&payload));
            }
            Err(err) => {
                // The failure is swallowed: the exchange keeps its empty
                // response and only the loading indicator is cleared.
                error!(request_id = %outcome.request_id, "answer fetch failed: {err:#}");
                self.state.apply_fetch_failure(outcome.request_id);
            }
        }
    }

    /// Render either the hero screen or the chat layout, keyed only on the
    /// started flag
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if self.state.started {
            self.render_chat(area, buf);
        } else {
            self.render_hero(area, buf);
        }
    }

    /// Centered landing screen shown until the first question is sent
    fn render_hero(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(self.title.as_str())
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .render(chunks[1], buf);

        Paragraph::new(self.tagline.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[3], buf);

        Composer::new(&self.state, PLACEHOLDER).render(centered(chunks[5], 60), buf);
    }

    /// Chat layout: history above, composer docked at the bottom
    fn render_chat(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        Paragraph::new(self.title.as_str())
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .render(chunks[0], buf);

        HistoryView::new(&self.state).render(chunks[1], buf);
        Composer::new(&self.state, PLACEHOLDER).render(chunks[2], buf);
    }
}

impl Widget for &ChatManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        ChatManager::render(self, area, buf);
    }
}

/// Horizontally center a band of the given percentage width
fn centered(area: Rect, percent_x: u16) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    chunks[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FetchOutcome;
    use anyhow::anyhow;
    use serde_json::json;
    use uuid::Uuid;

    fn manager() -> ChatManager {
        ChatManager::new(
            AnswerClient::new("http://127.0.0.1:9"),
            "ImmoGPT".to_string(),
            "tagline".to_string(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn type_text(manager: &mut ChatManager, text: &str) {
        for c in text.chars() {
            manager.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn enter_submits_and_enters_loading() {
        let mut m = manager();
        type_text(&mut m, "Where is the cheapest flat?");
        m.handle_key(key(KeyCode::Enter));

        assert_eq!(m.state.exchanges.len(), 1);
        assert_eq!(m.state.view, ViewState::Loading);
        assert!(m.state.started);
        assert!(m.state.draft.content.is_empty());
    }

    #[tokio::test]
    async fn successful_outcome_fills_the_last_exchange() {
        let mut m = manager();
        type_text(&mut m, "question");
        m.handle_key(key(KeyCode::Enter));
        let request_id = request_id_of(&m);

        m.apply_outcome(FetchOutcome {
            request_id,
            result: Ok(json!("the answer")),
        });

        assert_eq!(m.state.exchanges[0].response, "the answer");
        assert_eq!(m.state.view, ViewState::Idle);
    }

    #[tokio::test]
    async fn failed_outcome_is_swallowed() {
        let mut m = manager();
        type_text(&mut m, "question");
        m.handle_key(key(KeyCode::Enter));
        let request_id = request_id_of(&m);

        m.apply_outcome(FetchOutcome {
            request_id,
            result: Err(anyhow!("connection refused")),
        });

        assert_eq!(m.state.exchanges[0].response, "");
        assert_eq!(m.state.view, ViewState::Idle);
    }

    #[tokio::test]
    async fn stale_outcome_is_dropped() {
        let mut m = manager();
        type_text(&mut m, "question");
        m.handle_key(key(KeyCode::Enter));

        m.apply_outcome(FetchOutcome {
            request_id: Uuid::new_v4(),
            result: Ok(json!("late answer")),
        });

        assert_eq!(m.state.exchanges[0].response, "");
        assert_eq!(m.state.view, ViewState::Loading);
    }

    #[tokio::test]
    async fn ctrl_e_edits_and_esc_cancels() {
        let mut m = manager();
        type_text(&mut m, "question");
        m.handle_key(key(KeyCode::Enter));
        let request_id = request_id_of(&m);
        m.apply_outcome(FetchOutcome {
            request_id,
            result: Ok(json!("answer")),
        });

        m.handle_key(ctrl(KeyCode::Char('e')));
        assert_eq!(m.state.view, ViewState::Editing(0));

        // Keys now land in the scratch buffer, not the draft.
        type_text(&mut m, "edited");
        assert_eq!(m.state.scratch.content, "edited");
        assert!(m.state.draft.content.is_empty());

        m.handle_key(key(KeyCode::Esc));
        assert_eq!(m.state.view, ViewState::Idle);
        assert_eq!(m.state.exchanges.len(), 1);
    }

    #[tokio::test]
    async fn saving_a_changed_edit_truncates_the_conversation() {
        let mut m = manager();
        for question in ["q1", "q2"] {
            type_text(&mut m, question);
            m.handle_key(key(KeyCode::Enter));
            let request_id = request_id_of(&m);
            m.apply_outcome(FetchOutcome {
                request_id,
                result: Ok(json!("a")),
            });
        }

        m.handle_key(ctrl(KeyCode::Up));
        m.handle_key(ctrl(KeyCode::Char('e')));
        type_text(&mut m, "changed");
        m.handle_key(key(KeyCode::Enter));

        assert_eq!(m.state.exchanges.len(), 1);
        assert_eq!(m.state.exchanges[0].text, "q1");
    }

    #[tokio::test]
    async fn ctrl_c_requests_exit() {
        let mut m = manager();
        assert!(!m.handle_key(ctrl(KeyCode::Char('c'))));
    }

    fn request_id_of(m: &ChatManager) -> Uuid {
        m.state.in_flight_id().expect("a fetch should be in flight")
    }
}
