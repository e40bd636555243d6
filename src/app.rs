//! Terminal lifecycle and the main event loop.

use crate::client::AnswerClient;
use crate::config::Config;
use crate::events::AppEvent;
use crate::ui::chat::ChatManager;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Pump terminal events and render ticks into one channel
struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            loop {
                if let Some(Ok(evt)) = reader.next().await {
                    let app_event = match evt {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            Some(AppEvent::Key(key))
                        }
                        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
                        _ => None,
                    };

                    if let Some(event) = app_event {
                        if tx_events.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        // Tick timer keeps the loading animation moving and picks up fetch
        // completions promptly.
        let tx_tick = tx;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(250));
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Run the chat UI until the user quits
pub async fn run(config: Config) -> Result<()> {
    install_panic_hook();
    let mut terminal = init()?;

    let client = AnswerClient::new(&config.endpoint);
    let mut manager = ChatManager::new(client, config.ui.title.clone(), config.ui.tagline.clone());
    let mut events = EventHandler::new();

    loop {
        manager.process_outcomes();
        terminal.draw(|frame| {
            frame.render_widget(&manager, frame.size());
        })?;

        match events.next().await {
            Some(AppEvent::Key(key)) => {
                if !manager.handle_key(key) {
                    break;
                }
            }
            Some(AppEvent::Resize(_, _)) | Some(AppEvent::Tick) => {}
            None => break,
        }
    }

    restore()?;
    Ok(())
}

fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore the terminal on panic
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
