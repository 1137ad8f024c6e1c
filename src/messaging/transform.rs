//! Wire message → domain message mapping.
//!
//! Pure functions. Missing fields end up as `None`/empty, never as errors.

use crate::messaging::wire::{WireChat, WireEntity, WireMessage, WireUser};
use crate::{Entity, Image, Message, ReplyTo, Response, SenderChat, User};

use chrono::{DateTime, Utc};

/// Convert a wire message (inbound, or the confirmation of one we sent) into a [`Message`].
///
/// A message carries at most one rich body: formatting spans win over a photo.
/// The reply summary is filled independently of that choice.
pub fn transform(wire: &WireMessage) -> Message {
    let mut message = Message {
        id: wire.message_id,
        chat_id: conversation_key(wire),
        sent: timestamp(wire.date),
        text: wire.text.clone().unwrap_or_default(),
        from: wire.from.as_ref().map(transform_user),
        sender_chat: wire.sender_chat.as_ref().map(transform_sender_chat),
        ..Default::default()
    };

    if let Some(entities) = wire.entities.as_deref().and_then(transform_entities) {
        message.entities = Some(entities);
    } else if let Some(largest) = wire.photo.as_deref().and_then(|sizes| sizes.last()) {
        message.image = Some(Image {
            file_id: largest.file_id.clone(),
            width: largest.width,
            height: largest.height,
            caption: wire.caption.clone().unwrap_or_default(),
            entities: wire.caption_entities.as_deref().and_then(transform_entities),
        });
    }

    if let Some(parent) = wire.reply_to_message.as_deref() {
        message.reply_to = Some(ReplyTo {
            text: parent.text.clone().unwrap_or_default(),
            sent: timestamp(parent.date),
            from: parent.from.as_ref().map(transform_user),
            sender_chat: parent.sender_chat.as_ref().map(transform_sender_chat),
        });
    }

    message
}

/// `"{chat_id}_{thread_id}"`, or empty when the message has no chat.
fn conversation_key(wire: &WireMessage) -> String {
    let chat_id = wire.chat_id();
    if chat_id == 0 {
        return String::new();
    }
    format!("{}_{}", chat_id, wire.message_thread_id.unwrap_or(0))
}

fn timestamp(unix: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix, 0).unwrap_or_default()
}

fn transform_user(user: &WireUser) -> User {
    let display_name = match user.last_name.as_deref() {
        Some(last) if !last.is_empty() => format!("{} {}", user.first_name, last),
        _ => user.first_name.clone(),
    };
    User {
        id: user.id,
        username: user.username.clone().unwrap_or_default(),
        display_name,
    }
}

fn transform_sender_chat(chat: &WireChat) -> SenderChat {
    SenderChat {
        id: chat.id,
        username: chat.username.clone().unwrap_or_default(),
    }
}

fn transform_entities(entities: &[WireEntity]) -> Option<Vec<Entity>> {
    if entities.is_empty() {
        return None;
    }
    Some(
        entities
            .iter()
            .map(|entity| Entity {
                kind: entity.kind.clone(),
                offset: entity.offset,
                length: entity.length,
                url: entity.url.clone(),
                user: entity.user.as_ref().map(transform_user),
            })
            .collect(),
    )
}

/// Display name of whoever a ban response targets.
///
/// A ban issued on behalf of a channel poster names the channel. Its handle comes
/// from the current message, or from the replied-to message when a privileged
/// user bans an anonymous channel post by replying to it.
pub fn ban_username(response: &Response, message: &Message) -> String {
    let Some(ban) = response.ban.as_ref() else {
        return String::new();
    };
    let Some(channel_id) = ban.channel_id.filter(|id| *id != 0) else {
        return ban.user.label();
    };

    let mut channel = SenderChat {
        id: channel_id,
        username: message
            .sender_chat
            .as_ref()
            .map(|chat| chat.username.clone())
            .unwrap_or_default(),
    };
    if channel.username.is_empty()
        && let Some(replied) = message
            .reply_to
            .as_ref()
            .and_then(|reply| reply.sender_chat.as_ref())
    {
        channel.username = replied.username.clone();
    }
    channel.label()
}
