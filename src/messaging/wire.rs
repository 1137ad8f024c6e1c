//! Tolerant model of the Telegram Bot API message JSON.
//!
//! Every field is optional on the way in. The transport hands these to the
//! transformer, which never fails on a missing field.

use serde::{Deserialize, Serialize};

/// One long-polling update. Only message updates carry a body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireUpdate {
    pub update_id: i64,
    pub message: Option<WireMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireMessage {
    pub message_id: i32,
    pub message_thread_id: Option<i32>,
    /// Unix timestamp, seconds.
    pub date: i64,
    pub chat: Option<WireChat>,
    pub from: Option<WireUser>,
    pub sender_chat: Option<WireChat>,
    pub text: Option<String>,
    pub entities: Option<Vec<WireEntity>>,
    /// Size variants, smallest first.
    pub photo: Option<Vec<WirePhotoSize>>,
    pub caption: Option<String>,
    pub caption_entities: Option<Vec<WireEntity>>,
    pub reply_to_message: Option<Box<WireMessage>>,
}

impl WireMessage {
    /// Chat id, 0 when the message is not attached to a chat.
    pub fn chat_id(&self) -> i64 {
        self.chat.as_ref().map(|chat| chat.id).unwrap_or_default()
    }

    /// Whether the message comes from a one-to-one conversation.
    pub fn is_private(&self) -> bool {
        self.chat
            .as_ref()
            .is_some_and(|chat| chat.kind == "private")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    pub url: Option<String>,
    pub user: Option<WireUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bot_api_json_with_unknown_fields() {
        let update: WireUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 77,
                "date": 1_700_000_000,
                "chat": {"id": -1001, "type": "supergroup", "title": "Chat"},
                "from": {"id": 5, "is_bot": false, "first_name": "Ann", "username": "ann",
                         "language_code": "en"},
                "text": "hello",
                "has_protected_content": true
            }
        }))
        .unwrap();

        let message = update.message.unwrap();
        assert_eq!(message.message_id, 77);
        assert_eq!(message.chat_id(), -1001);
        assert!(!message.is_private());
        assert_eq!(message.from.unwrap().username.as_deref(), Some("ann"));
    }

    #[test]
    fn update_without_message_decodes() {
        let update: WireUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 11,
            "edited_message": {"message_id": 1, "date": 0}
        }))
        .unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn private_chat_is_detected() {
        let message = WireMessage {
            chat: Some(WireChat {
                id: 5,
                kind: "private".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(message.is_private());
        assert_eq!(WireMessage::default().chat_id(), 0);
    }
}
