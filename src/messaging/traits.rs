//! Chat transport trait.

use crate::error::TransportError;
use crate::messaging::wire::{WireMessage, WireUpdate};
use crate::{BanTarget, ParseMode};

use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

/// Live update stream. Ends only when the connection has failed for good.
pub type UpdateStream = Pin<Box<dyn Stream<Item = WireUpdate> + Send>>;

/// A message ready to go out through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: ParseMode,
    pub reply_to: Option<i32>,
}

/// Connection to the chat platform.
///
/// Owned by the listener and only ever called from its loop.
pub trait ChatTransport: Send + Sync + 'static {
    /// Open the live update subscription.
    fn updates(
        &self,
    ) -> impl std::future::Future<Output = Result<UpdateStream, TransportError>> + Send;

    /// Send a message and return the platform's copy of what was sent.
    fn send(
        &self,
        message: &OutboundMessage,
    ) -> impl std::future::Future<Output = Result<WireMessage, TransportError>> + Send;

    /// Resolve a public chat handle (without `@`) to its numeric id.
    fn resolve_chat(
        &self,
        handle: &str,
    ) -> impl std::future::Future<Output = Result<i64, TransportError>> + Send;

    /// Pin a message without notifying members.
    fn pin(
        &self,
        _chat_id: i64,
        _message_id: i32,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send {
        async { Ok(()) }
    }

    /// Restrict a user, or ban a channel from posting, until the given time.
    fn restrict(
        &self,
        _chat_id: i64,
        _target: BanTarget,
        _until: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send {
        async { Ok(()) }
    }
}
