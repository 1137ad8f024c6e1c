//! Conversation state: bounded message history and the chat message log.

pub mod history;
pub mod logger;

pub use history::{HistoryEntry, LimitedMessageHistory};
pub use logger::{MessageLogger, SqliteMessageLogger};
