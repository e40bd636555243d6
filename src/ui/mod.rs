//! UI components for the chat interface

pub mod chat;
