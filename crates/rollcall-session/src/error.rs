//! Error types for the session lifecycle layer.

use rollcall_store::StoreError;
use rollcall_token::{ParticipantId, SessionId, TokenError};

/// Errors that can occur during session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The caller does not hold the coordinator role.
    #[error("participant {0} is not authorized to manage sessions")]
    Unauthorized(ParticipantId),

    /// No session exists with this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session name is empty or too long.
    #[error("invalid session name: {0}")]
    InvalidName(String),

    /// A token could not be minted for the session.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The session store failed. Retryable.
    #[error(transparent)]
    Storage(#[from] StoreError),
}
