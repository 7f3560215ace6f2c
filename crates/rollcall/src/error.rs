//! Unified error type for the Rollcall facade.

use rollcall_attendance::AttendanceError;
use rollcall_session::SessionError;
use rollcall_store::IdentityError;
use rollcall_token::TokenError;

/// Top-level error that wraps all crate-specific errors.
///
/// A rejected scan is NOT an error: it comes back as
/// `Ok(Outcome::Rejected(_))`. This type covers refused callers, bad
/// lifecycle requests, and failing collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    /// The credential did not resolve, or the identity lookup failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A lifecycle call failed (not a coordinator, unknown session, ...).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A store call failed while deciding a presentation.
    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    /// A token could not be built.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Configuration JSON did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl RollcallError {
    /// Returns `true` if retrying the same call may succeed.
    ///
    /// Only collaborator outages qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Identity(IdentityError::Store(_)) => true,
            Self::Session(SessionError::Storage(_)) => true,
            Self::Attendance(e) => e.is_retryable(),
            _ => false,
        }
    }
}
