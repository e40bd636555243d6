//! Chat UI: conversation state, composer, history, and the manager tying
//! them together

pub mod composer;
pub mod history;
pub mod manager;
pub mod state;

pub use manager::ChatManager;
pub use state::{ChatState, Exchange, ViewState};
