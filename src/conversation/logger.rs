//! Chat message log (SQLite).

use crate::Message;
use crate::error::Result;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row as _, SqlitePool};
use std::path::Path;

/// Receives every message that belongs to the bot's home chat, inbound and self-sent.
pub trait MessageLogger: Send + Sync {
    /// Persist a message. Must not block the caller.
    fn save(&self, message: &Message);
}

/// Persists chat messages to SQLite.
///
/// `save` spawns a tokio task and returns immediately so the event loop never
/// waits on a DB write.
#[derive(Debug, Clone)]
pub struct SqliteMessageLogger {
    pool: SqlitePool,
}

impl SqliteMessageLogger {
    /// Open (or create) the log database at `path`.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the table if needed.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_messages ( \
                 row_id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 message_id INTEGER NOT NULL, \
                 chat_id TEXT NOT NULL, \
                 sender TEXT, \
                 text TEXT NOT NULL, \
                 sent_at TIMESTAMP NOT NULL, \
                 payload TEXT NOT NULL \
             )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_chat ON chat_messages (chat_id, row_id)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Load the newest messages of a conversation, oldest first.
    pub async fn load_recent(&self, chat_id: &str, limit: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT payload FROM chat_messages \
             WHERE chat_id = ? \
             ORDER BY row_id DESC \
             LIMIT ?",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<Message> = rows
            .into_iter()
            .filter_map(|row| {
                let payload: String = row.try_get("payload").ok()?;
                match serde_json::from_str(&payload) {
                    Ok(message) => Some(message),
                    Err(error) => {
                        tracing::warn!(%error, "skipping undecodable logged message");
                        None
                    }
                }
            })
            .collect();
        messages.reverse();
        Ok(messages)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl MessageLogger for SqliteMessageLogger {
    fn save(&self, message: &Message) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, message_id = message.id, "failed to encode message for log");
                return;
            }
        };
        let pool = self.pool.clone();
        let message_id = message.id;
        let chat_id = message.chat_id.clone();
        let sender = message.from.as_ref().map(|user| user.label());
        let text = message.text.clone();
        let sent_at = message.sent;

        tokio::spawn(async move {
            if let Err(error) = sqlx::query(
                "INSERT INTO chat_messages (message_id, chat_id, sender, text, sent_at, payload) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(message_id)
            .bind(&chat_id)
            .bind(&sender)
            .bind(&text)
            .bind(sent_at)
            .bind(&payload)
            .execute(&pool)
            .await
            {
                tracing::warn!(%error, message_id, "failed to persist chat message");
            }
        });
    }
}
