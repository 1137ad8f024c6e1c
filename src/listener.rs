//! Event loop: chat updates, outbound submissions and the idle timer.

use crate::bot::Responder;
use crate::config::ListenerConfig;
use crate::conversation::MessageLogger;
use crate::error::{ListenerError, Result, TransportError};
use crate::messaging::html::telegram_supported_html;
use crate::messaging::wire::{WireMessage, WireUpdate};
use crate::messaging::{ChatTransport, OutboundMessage, ban_username, transform};
use crate::{Message, ParseMode, Response};

use chrono::{TimeDelta, Utc};
use futures::StreamExt as _;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Modes to fall back to, in order, when the transport rejects the markup of `mode`.
fn fallback_modes(mode: ParseMode) -> &'static [ParseMode] {
    match mode {
        ParseMode::Markdown => &[ParseMode::Plain],
        ParseMode::Plain | ParseMode::Html => &[],
    }
}

/// The single chat event loop.
///
/// Owns the transport and the receiving end of the submission queue. Build it
/// with [`Listener::new`] before handing the [`Submitter`] to any producer.
pub struct Listener<T: ChatTransport> {
    transport: T,
    logger: Arc<dyn MessageLogger>,
    bots: Box<dyn Responder>,
    config: ListenerConfig,
    submissions: mpsc::Receiver<Response>,
}

impl<T: ChatTransport> Listener<T> {
    pub fn new(
        transport: T,
        logger: Arc<dyn MessageLogger>,
        bots: Box<dyn Responder>,
        config: ListenerConfig,
    ) -> (Self, Submitter) {
        let (tx, submissions) = mpsc::channel(config.outbound_capacity.max(1));
        let listener = Self {
            transport,
            logger,
            bots,
            config,
            submissions,
        };
        (listener, Submitter { tx })
    }

    /// Run until cancelled or until the update stream dies.
    ///
    /// Always returns an error: [`ListenerError::Cancelled`] on a requested stop,
    /// anything else is fatal.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let chat_id = self.resolve_chat().await?;
        let mut updates = self.transport.updates().await?;
        tracing::info!(chat_id, group = %self.config.group, "listener started");

        loop {
            if cancel.is_cancelled() {
                tracing::info!("listener cancelled");
                return Err(ListenerError::Cancelled.into());
            }
            // Unbiased: whichever source is ready first wins, ties are broken at random.
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("listener cancelled");
                    return Err(ListenerError::Cancelled.into());
                }
                update = updates.next() => {
                    let Some(update) = update else {
                        return Err(ListenerError::UpdatesClosed.into());
                    };
                    self.handle_update(chat_id, update).await;
                }
                Some(response) = self.submissions.recv() => {
                    if let Err(error) = self.send_response(chat_id, chat_id, &response).await {
                        tracing::warn!(%error, "failed to send submitted message");
                    }
                }
                _ = tokio::time::sleep(self.config.idle_duration) => {
                    let response = self.bots.on_message(&Message::idle()).await;
                    if let Err(error) = self.send_response(chat_id, chat_id, &response).await {
                        tracing::warn!(%error, "failed to respond on idle");
                    }
                }
            }
        }
    }

    async fn resolve_chat(&self) -> std::result::Result<i64, ListenerError> {
        let group = self.config.group.trim().trim_start_matches('@');
        if let Ok(chat_id) = group.parse::<i64>() {
            return Ok(chat_id);
        }
        self.transport
            .resolve_chat(group)
            .await
            .map_err(|source| ListenerError::ResolveChat {
                group: self.config.group.clone(),
                source,
            })
    }

    async fn handle_update(&mut self, chat_id: i64, update: WireUpdate) {
        let Some(wire) = update.message else {
            tracing::debug!(update_id = update.update_id, "dropping update without message");
            return;
        };
        if wire.is_private() {
            tracing::debug!(message_id = wire.message_id, "dropping private message");
            return;
        }
        let from_chat = wire.chat_id();
        if from_chat == 0 {
            tracing::debug!(message_id = wire.message_id, "dropping message without chat");
            return;
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(&wire) {
                Ok(json) => tracing::debug!(%json, "incoming message"),
                Err(error) => tracing::warn!(%error, "failed to encode incoming message for debug"),
            }
        }

        let message = transform(&wire);
        if from_chat == chat_id {
            self.logger.save(&message);
        }

        let response = self.bots.on_message(&message).await;
        if let Err(error) = self.send_response(chat_id, from_chat, &response).await {
            tracing::warn!(%error, "failed to respond on update");
        }
        self.apply_ban(from_chat, &response, &message).await;
    }

    /// Deliver a response to `to`, pinning and logging the sent copy as requested.
    async fn send_response(
        &self,
        home_chat: i64,
        to: i64,
        response: &Response,
    ) -> std::result::Result<(), ListenerError> {
        if !response.send || response.text.is_empty() {
            return Ok(());
        }
        tracing::debug!(chat_id = to, text = %response.text, "bot response");

        let outbound = OutboundMessage {
            chat_id: to,
            text: response.text.clone(),
            parse_mode: response.parse_mode.unwrap_or_default(),
            reply_to: response.reply_to.filter(|id| *id != 0),
        };
        let sent = self
            .deliver(outbound)
            .await
            .map_err(|source| ListenerError::Delivery {
                text: response.text.clone(),
                source,
            })?;

        if response.pin
            && let Err(error) = self.transport.pin(to, sent.message_id).await
        {
            tracing::warn!(%error, message_id = sent.message_id, "failed to pin message");
        }

        if to == home_chat {
            self.logger.save(&transform(&sent));
        }
        Ok(())
    }

    /// Send, retrying through the fallback modes while the transport rejects the markup.
    async fn deliver(
        &self,
        mut outbound: OutboundMessage,
    ) -> std::result::Result<WireMessage, TransportError> {
        let mut fallbacks = fallback_modes(outbound.parse_mode).iter();
        loop {
            match self.transport.send(&outbound).await {
                Ok(sent) => return Ok(sent),
                Err(error) if error.is_markup_rejected() => match fallbacks.next() {
                    Some(mode) => {
                        tracing::debug!(%error, from = %outbound.parse_mode, to = %mode, "markup rejected, retrying");
                        outbound.parse_mode = *mode;
                    }
                    None => return Err(error),
                },
                Err(error) => return Err(error),
            }
        }
    }

    async fn apply_ban(&self, chat_id: i64, response: &Response, message: &Message) {
        if !response.send {
            return;
        }
        let Some(ban) = response.active_ban() else {
            return;
        };
        let username = ban_username(response, message);
        let Some(until) = TimeDelta::from_std(ban.duration)
            .ok()
            .and_then(|duration| Utc::now().checked_add_signed(duration))
        else {
            tracing::warn!(user = %username, duration = ?ban.duration, "ban duration out of range");
            return;
        };

        match self.transport.restrict(chat_id, ban.target(), until).await {
            Ok(()) => tracing::info!(user = %username, %until, "banned"),
            Err(error) => tracing::warn!(%error, user = %username, "failed to ban"),
        }
    }
}

/// Sending end of the outbound submission queue.
///
/// Submissions always go to the listener's home chat.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Response>,
}

impl Submitter {
    /// Queue a basic-markup message. Waits while the queue is full.
    pub async fn submit(
        &self,
        cancel: &CancellationToken,
        text: impl Into<String>,
        pin: bool,
    ) -> Result<()> {
        let response = Response {
            text: text.into(),
            send: true,
            pin,
            preview: true,
            ..Default::default()
        };
        self.enqueue(cancel, response).await
    }

    /// Queue an HTML message, dropping tags the chat does not support.
    pub async fn submit_html(
        &self,
        cancel: &CancellationToken,
        text: impl AsRef<str>,
        pin: bool,
    ) -> Result<()> {
        let response = Response {
            text: telegram_supported_html(text.as_ref()),
            send: true,
            pin,
            preview: false,
            parse_mode: Some(ParseMode::Html),
            ..Default::default()
        };
        self.enqueue(cancel, response).await
    }

    async fn enqueue(&self, cancel: &CancellationToken, response: Response) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ListenerError::Cancelled.into()),
            result = self.tx.send(response) => {
                result.map_err(|_| ListenerError::SubmissionClosed.into())
            }
        }
    }
}
