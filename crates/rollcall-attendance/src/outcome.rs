//! Decision results returned by [`AttendanceEngine::present`](crate::AttendanceEngine::present).

use rollcall_store::AttendanceRecord;
use serde::Serialize;

/// Which transition an accepted presentation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Transition {
    /// `Absent → CheckedIn`
    CheckedIn,
    /// `CheckedIn → CheckedOut`
    CheckedOut,
}

/// Why a presentation was refused.
///
/// Each variant's `Display` text is the stable, user-facing message the
/// presentation layer shows. None of these is retryable with the same
/// token: expiry and supersession need a fresh scan, the
/// already-checked-in/out cases are simply the steady state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
pub enum Rejection {
    /// The string is not `SESSION_<id>;TYPE=<kind>;EXP=<millis>`.
    #[error("Invalid QR code format")]
    MalformedToken,

    /// `now` is past the expiry embedded in the token.
    #[error("QR code has expired")]
    TokenExpired,

    /// No session with the token's session id exists.
    #[error("Session not found")]
    SessionNotFound,

    /// The session was deactivated by its coordinator.
    #[error("Session is no longer active")]
    SessionInactive,

    /// The session has since been issued a newer token.
    #[error("QR code has been replaced by a newer one")]
    TokenSuperseded,

    #[error("Already checked in for this session")]
    AlreadyCheckedIn,

    #[error("Must check in before checking out")]
    CheckInRequired,

    #[error("Already checked out for this session")]
    AlreadyCheckedOut,

    /// The token's kind is neither `checkin` nor `checkout`.
    #[error("Invalid QR code type")]
    UnsupportedKind,
}

impl Rejection {
    /// The user-facing message (same as `to_string()`).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns `true` when scanning the session's CURRENT code could
    /// succeed where this one failed.
    pub fn needs_fresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::TokenSuperseded)
    }
}

/// An applied transition and the record as it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acceptance {
    pub transition: Transition,
    pub record: AttendanceRecord,
}

/// The result of presenting one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Accepted(Acceptance),
    Rejected(Rejection),
}

impl Outcome {
    /// Returns `true` if a transition was applied.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The applied transition, if accepted.
    pub fn transition(&self) -> Option<Transition> {
        match self {
            Self::Accepted(acceptance) => Some(acceptance.transition),
            Self::Rejected(_) => None,
        }
    }

    /// The written record, if accepted.
    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            Self::Accepted(acceptance) => Some(&acceptance.record),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason, if rejected.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// The message to show the participant.
    pub fn message(&self) -> String {
        match self {
            Self::Accepted(Acceptance {
                transition: Transition::CheckedIn,
                ..
            }) => "Check-in successful".to_string(),
            Self::Accepted(Acceptance {
                transition: Transition::CheckedOut,
                ..
            }) => "Check-out successful".to_string(),
            Self::Rejected(reason) => reason.message(),
        }
    }
}
