//! Relaybot: a single-group chat bot gateway.
//!
//! The [`listener::Listener`] owns the chat connection, normalizes inbound
//! updates into [`Message`]s, fans them out to responders through the
//! [`bot::Dispatcher`] and relays the resulting [`Response`]s back to the chat.

pub mod bot;
pub mod config;
pub mod conversation;
pub mod error;
pub mod listener;
pub mod messaging;

pub use error::{Error, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text of the synthetic message injected when the chat has been quiet for the idle duration.
pub const IDLE_TEXT: &str = "idle";

/// Inbound or self-sent chat message, normalized from the wire representation.
///
/// Built once by the transformer and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Transport message id. Unique within a chat, not globally.
    pub id: i32,
    /// Conversation key: `"{chat_id}_{thread_id}"`, thread 0 outside of topics.
    /// Empty for synthetic messages.
    pub chat_id: String,
    pub sent: DateTime<Utc>,
    pub text: String,
    pub from: Option<User>,
    /// Set when the message was posted on behalf of a channel.
    pub sender_chat: Option<SenderChat>,
    pub image: Option<Image>,
    /// `None` when the wire message carries no spans, never an empty list.
    pub entities: Option<Vec<Entity>>,
    pub reply_to: Option<ReplyTo>,
}

impl Message {
    /// Synthetic message dispatched on idle timeout.
    pub fn idle() -> Self {
        Self {
            sent: Utc::now(),
            text: IDLE_TEXT.to_string(),
            ..Default::default()
        }
    }

    /// Whether the message carries any formatting spans.
    pub fn has_entities(&self) -> bool {
        self.entities.is_some()
    }
}

/// Human sender identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

impl User {
    /// Display string used in logs and moderation notices, e.g. `@bob (42)`.
    pub fn label(&self) -> String {
        let name = if !self.username.is_empty() {
            format!("@{}", self.username)
        } else if !self.display_name.trim().is_empty() {
            self.display_name.trim().to_string()
        } else {
            return format!("user {}", self.id);
        };
        format!("{name} ({})", self.id)
    }
}

/// Channel identity for messages posted as a channel rather than a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderChat {
    pub id: i64,
    pub username: String,
}

impl SenderChat {
    /// Display string used in logs and moderation notices, e.g. `@news (channel -100123)`.
    pub fn label(&self) -> String {
        if self.username.is_empty() {
            format!("channel {}", self.id)
        } else {
            format!("@{} (channel {})", self.username, self.id)
        }
    }
}

/// Largest photo variant attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Transport content reference.
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub caption: String,
    pub entities: Option<Vec<Entity>>,
}

/// Formatting span inside a message body or caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Span kind as named by the transport (`bold`, `text_link`, `mention`, ...).
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    pub url: Option<String>,
    /// Mentioned user for `text_mention` spans.
    pub user: Option<User>,
}

/// Summary of the message being replied to. Only what responders need for context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub text: String,
    pub sent: DateTime<Utc>,
    pub from: Option<User>,
    pub sender_chat: Option<SenderChat>,
}

/// Formatting mode requested for an outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Plain text, no markup parsing.
    Plain,
    /// Basic markup (legacy Markdown).
    #[default]
    Markdown,
    /// Rich markup (HTML subset).
    Html,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseMode::Plain => write!(f, "plain"),
            ParseMode::Markdown => write!(f, "markdown"),
            ParseMode::Html => write!(f, "html"),
        }
    }
}

/// What a responder asks the gateway to do.
///
/// Nothing happens unless `send` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub send: bool,
    pub pin: bool,
    pub preview: bool,
    /// Message id to reply to in a thread, `None` for a standalone message.
    pub reply_to: Option<i32>,
    /// Explicit formatting mode. `None` means the default basic markup.
    pub parse_mode: Option<ParseMode>,
    pub ban: Option<Ban>,
}

impl Response {
    /// A response that sends `text` with default settings.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            send: true,
            ..Default::default()
        }
    }

    /// The "not interested" response.
    pub fn none() -> Self {
        Self::default()
    }

    /// The ban directive, if it asks for a non-zero restriction.
    pub fn active_ban(&self) -> Option<&Ban> {
        self.ban.as_ref().filter(|ban| !ban.duration.is_zero())
    }
}

/// Moderation directive attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ban {
    pub user: User,
    /// Set when the offending message was posted on behalf of a channel.
    pub channel_id: Option<i64>,
    pub duration: Duration,
}

impl Ban {
    /// Whom the moderation action is applied to.
    pub fn target(&self) -> BanTarget {
        match self.channel_id {
            Some(channel_id) if channel_id != 0 => BanTarget::Channel(channel_id),
            _ => BanTarget::User(self.user.id),
        }
    }
}

/// Resolved subject of a moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanTarget {
    User(i64),
    Channel(i64),
}
