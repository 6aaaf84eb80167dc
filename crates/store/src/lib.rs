//! Canonical message records and their persistence.
//! One SQLite table, keyed by the external message id.

pub mod error;
pub mod model;
pub mod store;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    model::{
        Conversation, Direction, MediaAttachment, MediaKind, Message, MessageKind, MessageStatus,
        NewMessage, now_ms,
    },
    store::MessageStore,
    store_sqlite::SqliteMessageStore,
};

/// Run database migrations for the message store.
///
/// Creates the `messages` table. Should be called at application startup
/// when using [`SqliteMessageStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
