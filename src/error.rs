//! Top-level error types for Relaybot.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Substring the transport reports when it rejects the markup of a message.
const MARKUP_REJECTED: &str = "can't parse entities";

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this is the listener's normal cancellation exit.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Listener(ListenerError::Cancelled))
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),
}

/// Chat transport failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The transport refused or failed a request. The message is kept verbatim.
    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to decode transport payload: {0}")]
    Decode(String),

    #[error("transport connection closed")]
    Closed,
}

impl TransportError {
    /// Whether the transport rejected the message markup rather than the message itself.
    pub fn is_markup_rejected(&self) -> bool {
        match self {
            TransportError::Request(message) => message.to_lowercase().contains(MARKUP_REJECTED),
            _ => false,
        }
    }
}

/// Event loop and submission errors.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to get chat id for group {group:?}: {source}")]
    ResolveChat {
        group: String,
        source: TransportError,
    },

    #[error("chat update stream closed")]
    UpdatesClosed,

    #[error("listener cancelled")]
    Cancelled,

    #[error("can't send message {text:?}: {source}")]
    Delivery {
        text: String,
        source: TransportError,
    },

    #[error("submission channel closed")]
    SubmissionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_rejection_is_recognised_by_message() {
        let error = TransportError::Request(
            "Bad Request: can't parse entities: Can't find end of the entity starting at byte offset 3"
                .into(),
        );
        assert!(error.is_markup_rejected());
    }

    #[test]
    fn other_failures_are_not_markup_rejections() {
        assert!(!TransportError::Request("Forbidden: bot was kicked".into()).is_markup_rejected());
        assert!(!TransportError::Closed.is_markup_rejected());
        assert!(!TransportError::Decode("can't parse entities".into()).is_markup_rejected());
    }

    #[test]
    fn cancellation_is_detected() {
        assert!(Error::from(ListenerError::Cancelled).is_cancelled());
        assert!(!Error::from(ListenerError::UpdatesClosed).is_cancelled());
    }
}
