/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by the message store and the pipeline built on it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid message input: {message}")]
    InvalidInput { message: String },

    /// The target message does not exist.
    #[error("message not found: {id}")]
    NotFound { id: String },

    /// The target message belongs to a different conversation.
    #[error("message {id} does not belong to conversation {conversation_key}")]
    ConversationMismatch { id: String, conversation_key: String },

    /// Only outgoing messages may be deleted.
    #[error("cannot delete incoming message: {id}")]
    NotDeletable { id: String },

    /// Underlying persistence failed or is unreachable.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// Migrations failed to apply.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    #[must_use]
    pub fn conversation_mismatch(id: impl Into<String>, conversation_key: impl Into<String>) -> Self {
        Self::ConversationMismatch {
            id: id.into(),
            conversation_key: conversation_key.into(),
        }
    }

    #[must_use]
    pub fn not_deletable(id: impl Into<String>) -> Self {
        Self::NotDeletable { id: id.into() }
    }
}
