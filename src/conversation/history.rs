//! Bounded per-conversation message history.

use crate::Message;

use rand::Rng as _;
use std::collections::{HashMap, VecDeque};

/// A retained message with its position in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// 1-based count of messages added to the conversation, including evicted ones.
    pub seq: u64,
    pub message: Message,
}

#[derive(Debug, Default)]
struct ChatHistory {
    count: u64,
    entries: VecDeque<HistoryEntry>,
}

/// Keeps the last `limit` messages of every conversation, keyed by [`Message::chat_id`].
///
/// Owned by a single responder. Not meant to be shared between tasks.
#[derive(Debug)]
pub struct LimitedMessageHistory {
    limit: usize,
    chats: HashMap<String, ChatHistory>,
}

impl LimitedMessageHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            chats: HashMap::new(),
        }
    }

    /// Append a message to its conversation, evicting the oldest one past the limit.
    pub fn add(&mut self, message: Message) {
        let limit = self.limit;
        let chat = self
            .chats
            .entry(message.chat_id.clone())
            .or_insert_with(|| ChatHistory {
                count: 0,
                entries: VecDeque::with_capacity(limit),
            });

        chat.count += 1;
        chat.entries.push_back(HistoryEntry {
            seq: chat.count,
            message,
        });
        if chat.entries.len() > limit {
            chat.entries.pop_front();
        }
    }

    /// A uniformly random retained message, `None` if the conversation has none.
    pub fn random_message(&self, chat_id: &str) -> Option<&Message> {
        let chat = self.chats.get(chat_id)?;
        if chat.entries.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..chat.entries.len());
        chat.entries.get(index).map(|entry| &entry.message)
    }

    /// Retained messages of a conversation, oldest first.
    pub fn messages(&self, chat_id: &str) -> impl Iterator<Item = &Message> {
        self.entries(chat_id).map(|entry| &entry.message)
    }

    /// Retained entries of a conversation, oldest first.
    pub fn entries(&self, chat_id: &str) -> impl Iterator<Item = &HistoryEntry> {
        self.chats
            .get(chat_id)
            .into_iter()
            .flat_map(|chat| chat.entries.iter())
    }

    /// Number of messages currently retained for a conversation.
    pub fn len(&self, chat_id: &str) -> usize {
        self.chats.get(chat_id).map_or(0, |chat| chat.entries.len())
    }

    /// Total number of messages ever added to a conversation.
    pub fn count(&self, chat_id: &str) -> u64 {
        self.chats.get(chat_id).map_or(0, |chat| chat.count)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
