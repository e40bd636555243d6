use crossterm::event::KeyEvent;
use serde_json::Value;
use uuid::Uuid;

/// Events drained by the main loop
#[derive(Debug)]
pub enum AppEvent {
    /// Key press event
    Key(KeyEvent),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic redraw tick (drives the loading animation)
    Tick,
}

/// Identifier for one in-flight answer request
pub type RequestId = Uuid;

/// Completion of a spawned answer fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub request_id: RequestId,
    pub result: anyhow::Result<Value>,
}
