//! SQLite-backed message store using sqlx.

use {
    async_trait::async_trait,
    sqlx::{
        Row, SqlitePool,
        sqlite::{SqlitePoolOptions, SqliteRow},
    },
};

use crate::{
    Error, Result,
    model::{Conversation, Direction, Message, MessageKind, MessageStatus, NewMessage, now_ms},
    store::MessageStore,
};

/// SQLite-backed persistence for the message log.
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Create a new store with its own connection pool and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_key, direction, kind, body, media,
                    contact_name, status, timestamp_ms, created_at_ms, updated_at_ms
             FROM messages
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_message(&r)).transpose()
    }
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let media: Option<String> = row.get("media");
    let media = media.as_deref().map(serde_json::from_str).transpose()?;
    Ok(Message {
        id: row.get("id"),
        conversation_key: row.get("conversation_key"),
        direction: row.get::<String, _>("direction").parse()?,
        kind: MessageKind::from(row.get::<String, _>("kind").as_str()),
        body: row.get("body"),
        media,
        contact_name: row.get("contact_name"),
        status: row.get::<String, _>("status").parse()?,
        timestamp_ms: row.get("timestamp_ms"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    })
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<(Message, bool)> {
        let now = now_ms();
        let media = message
            .media
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            "INSERT INTO messages
             (id, conversation_key, direction, kind, body, media,
              contact_name, status, timestamp_ms, created_at_ms, updated_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&message.id)
        .bind(&message.conversation_key)
        .bind(message.direction.as_str())
        .bind(message.kind.as_str())
        .bind(&message.body)
        .bind(&media)
        .bind(&message.contact_name)
        .bind(message.status.as_str())
        .bind(message.timestamp_ms)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        let stored = self
            .fetch(&message.id)
            .await?
            .ok_or_else(|| Error::not_found(&message.id))?;
        Ok((stored, inserted))
    }

    async fn apply_status(&self, message_id: &str, status: MessageStatus) -> Result<Message> {
        let result = sqlx::query("UPDATE messages SET status = ?, updated_at_ms = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_ms())
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(message_id));
        }

        self.fetch(message_id)
            .await?
            .ok_or_else(|| Error::not_found(message_id))
    }

    async fn list_by_conversation(&self, conversation_key: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_key, direction, kind, body, media,
                    contact_name, status, timestamp_ms, created_at_ms, updated_at_ms
             FROM messages
             WHERE conversation_key = ?
             ORDER BY timestamp_ms ASC, rowid ASC",
        )
        .bind(conversation_key)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, (String, String, String, i64, i64)>(
            "SELECT m.conversation_key,
                    m.contact_name,
                    m.body AS last_message,
                    m.timestamp_ms AS last_message_time_ms,
                    (SELECT COUNT(*) FROM messages u
                      WHERE u.conversation_key = m.conversation_key
                        AND u.direction = 'incoming'
                        AND u.status != 'read') AS unread_count
             FROM messages m
             WHERE m.rowid = (SELECT m2.rowid FROM messages m2
                               WHERE m2.conversation_key = m.conversation_key
                               ORDER BY m2.timestamp_ms DESC, m2.rowid DESC
                               LIMIT 1)
             ORDER BY last_message_time_ms DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Conversation {
                conversation_key: r.0,
                contact_name: r.1,
                last_message: r.2,
                last_message_time_ms: r.3,
                unread_count: r.4,
            })
            .collect())
    }

    async fn delete(&self, conversation_key: &str, message_id: &str) -> Result<()> {
        // Ownership checks and removal run in one transaction so a concurrent
        // delete or status update cannot slip between check and act.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT conversation_key, direction FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Err(Error::not_found(message_id));
        };

        let owner: String = row.get("conversation_key");
        if owner != conversation_key {
            return Err(Error::conversation_mismatch(message_id, conversation_key));
        }

        let direction: Direction = row.get::<String, _>("direction").parse()?;
        if direction != Direction::Outgoing {
            return Err(Error::not_deletable(message_id));
        }

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM messages").execute(&self.pool).await?;
        Ok(())
    }
}
