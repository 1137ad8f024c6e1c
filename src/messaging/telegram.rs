//! Telegram transport using teloxide.
//!
//! Updates are long-polled on a background task and decoded into the wire
//! model through their Bot API JSON form, so the rest of the crate never
//! depends on teloxide's types.

use crate::error::TransportError;
use crate::messaging::traits::{ChatTransport, OutboundMessage, UpdateStream};
use crate::messaging::wire::{WireMessage, WireUpdate};
use crate::{BanTarget, ParseMode};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, ChatPermissions, MessageId, ParseMode as TelegramParseMode, Recipient,
    ReplyParameters, Update, UpdateId, UpdateKind, UserId,
};
use tokio::sync::mpsc;

/// Long-polling timeout, seconds.
const POLL_TIMEOUT_SECS: u32 = 60;

/// Pause before polling again after a network failure.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram Bot API transport.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

impl ChatTransport for TelegramTransport {
    async fn updates(&self) -> Result<UpdateStream, TransportError> {
        let (update_tx, update_rx) = mpsc::channel(256);
        let bot = self.bot.clone();

        tokio::spawn(async move {
            poll_updates(bot, update_tx).await;
            tracing::info!("telegram update polling stopped");
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(update_rx);
        Ok(Box::pin(stream))
    }

    async fn send(&self, message: &OutboundMessage) -> Result<WireMessage, TransportError> {
        let mut request = self
            .bot
            .send_message(ChatId(message.chat_id), message.text.clone());
        if let Some(mode) = telegram_parse_mode(message.parse_mode) {
            request = request.parse_mode(mode);
        }
        if let Some(reply_to) = message.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        let sent = request.await.map_err(request_error)?;
        decode(&sent)
    }

    async fn resolve_chat(&self, handle: &str) -> Result<i64, TransportError> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{handle}")))
            .await
            .map_err(request_error)?;
        Ok(chat.id.0)
    }

    async fn pin(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .pin_chat_message(ChatId(chat_id), MessageId(message_id))
            .disable_notification(true)
            .await
            .map(|_| ())
            .map_err(request_error)
    }

    async fn restrict(
        &self,
        chat_id: i64,
        target: BanTarget,
        until: DateTime<Utc>,
    ) -> Result<(), TransportError> {
        match target {
            BanTarget::User(user_id) => {
                let user_id = u64::try_from(user_id).map_err(|_| {
                    TransportError::Request(format!("invalid user id {user_id}"))
                })?;
                self.bot
                    .restrict_chat_member(ChatId(chat_id), UserId(user_id), ChatPermissions::empty())
                    .until_date(until)
                    .await
                    .map(|_| ())
                    .map_err(request_error)
            }
            BanTarget::Channel(channel_id) => self
                .bot
                .ban_chat_sender_chat(ChatId(chat_id), ChatId(channel_id))
                .await
                .map(|_| ())
                .map_err(request_error),
        }
    }
}

/// Poll until the receiver goes away or Telegram rejects the bot itself.
///
/// Network failures are retried. An API-level rejection (bad token, another
/// poller running) ends the task, which closes the update stream.
async fn poll_updates(bot: Bot, update_tx: mpsc::Sender<WireUpdate>) {
    let mut offset: i32 = 0;

    while !update_tx.is_closed() {
        let updates = match bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .await
        {
            Ok(updates) => updates,
            Err(RequestError::Api(error)) => {
                tracing::error!(%error, "telegram rejected update polling");
                return;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to poll telegram updates, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = next_offset(update.id);

            let wire = match decode_update(&update) {
                Ok(wire) => wire,
                Err(error) => {
                    tracing::warn!(%error, update_id = update.id.0, "dropping undecodable update");
                    continue;
                }
            };

            if update_tx.send(wire).await.is_err() {
                return;
            }
        }
    }
}

/// Offset that acknowledges `id` and everything before it.
fn next_offset(id: UpdateId) -> i32 {
    id.as_offset()
}

fn decode_update(update: &Update) -> Result<WireUpdate, TransportError> {
    let message = match &update.kind {
        UpdateKind::Message(message) => Some(decode(message)?),
        _ => None,
    };
    Ok(WireUpdate {
        update_id: i64::from(update.id.0),
        message,
    })
}

/// Re-read a teloxide value through its Bot API JSON form.
fn decode<T: Serialize>(value: &T) -> Result<WireMessage, TransportError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|error| TransportError::Decode(error.to_string()))
}

fn request_error(error: RequestError) -> TransportError {
    TransportError::Request(error.to_string())
}

#[allow(deprecated)]
fn telegram_parse_mode(mode: ParseMode) -> Option<TelegramParseMode> {
    match mode {
        ParseMode::Plain => None,
        ParseMode::Markdown => Some(TelegramParseMode::Markdown),
        ParseMode::Html => Some(TelegramParseMode::Html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_sends_without_parse_mode() {
        assert!(telegram_parse_mode(ParseMode::Plain).is_none());
        assert!(matches!(
            telegram_parse_mode(ParseMode::Html),
            Some(TelegramParseMode::Html)
        ));
    }

    #[test]
    fn offset_acknowledges_the_last_update() {
        assert_eq!(next_offset(UpdateId(41)), 42);
        assert_eq!(next_offset(UpdateId(0)), 1);
    }

    #[test]
    fn decodes_through_bot_api_json() {
        let raw = serde_json::json!({
            "message_id": 5,
            "date": 1_700_000_000,
            "chat": {"id": -1002, "type": "supergroup", "title": "Group"},
            "text": "pong"
        });

        let wire = decode(&raw).unwrap();

        assert_eq!(wire.message_id, 5);
        assert_eq!(wire.chat_id(), -1002);
        assert_eq!(wire.text.as_deref(), Some("pong"));
    }

    #[test]
    fn undecodable_payload_is_a_decode_error() {
        let raw = serde_json::json!({"message_id": "not a number"});
        assert!(matches!(decode(&raw), Err(TransportError::Decode(_))));
    }
}
