//! Data model: sessions, attendance records, and caller identities.
//!
//! These are the rows the stores hold. Invariants that can be expressed in
//! types are expressed in types: a session's token and its expiry live in
//! one `Option<SessionToken>`, and attendance timestamps can only be set
//! through methods that follow the check-in → check-out order.

use std::fmt;

use rollcall_token::{AttendanceKind, ParticipantId, SessionId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May open, refresh, deactivate, and delete sessions.
    Coordinator,
    /// May only present tokens.
    Participant,
}

/// An authenticated caller, as resolved by the [`IdentityStore`](crate::IdentityStore).
///
/// The core trusts this value as given; it never re-authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub participant_id: ParticipantId,
    pub role: Role,
}

impl Identity {
    /// Shorthand for a coordinator identity.
    pub fn coordinator(id: impl Into<String>) -> Self {
        Self {
            participant_id: ParticipantId::new(id),
            role: Role::Coordinator,
        }
    }

    /// Shorthand for a participant identity.
    pub fn participant(id: impl Into<String>) -> Self {
        Self {
            participant_id: ParticipantId::new(id),
            role: Role::Participant,
        }
    }

    /// Returns `true` if this caller holds the coordinator role.
    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The token a session currently accepts, with its expiry.
///
/// Bundling the two means a session either has both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// The exact wire string participants must present.
    pub value: String,
    /// Epoch millis; the token is usable while `now <= expires_at`.
    pub expires_at: u64,
}

/// An attendance window opened by a coordinator.
///
/// ## Lifecycle
///
/// ```text
/// create ──→ [active, token T1] ──regenerate──→ [active, token T2] ...
///                   │
///                   ├──deactivate──→ [inactive, token kept]
///                   │
///                   └──delete──→ gone (attendance records cascade)
/// ```
///
/// `id`, `kind` and `created_at` never change after creation. Only the
/// lifecycle manager mutates `active`, `name` and the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Human-readable label shown to the coordinator.
    pub name: String,
    pub kind: AttendanceKind,
    /// An inactive session validates no token, expired or not.
    pub active: bool,
    token: Option<SessionToken>,
    /// Epoch millis.
    pub created_at: u64,
}

impl Session {
    /// Creates an active session with no token yet.
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        kind: AttendanceKind,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            active: true,
            token: None,
            created_at,
        }
    }

    /// The token currently accepted for this session, if one was issued.
    pub fn current_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.value.as_str())
    }

    /// Expiry of the current token, if one was issued.
    pub fn token_expires_at(&self) -> Option<u64> {
        self.token.as_ref().map(|t| t.expires_at)
    }

    /// The current token and its expiry together.
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Replaces the current token unconditionally.
    ///
    /// The previous token stops matching immediately, even if its own
    /// expiry has not elapsed.
    pub fn install_token(&mut self, value: impl Into<String>, expires_at: u64) {
        self.token = Some(SessionToken {
            value: value.into(),
            expires_at,
        });
    }
}

// ---------------------------------------------------------------------------
// AttendanceState
// ---------------------------------------------------------------------------

/// Where a (participant, session) pair is in the attendance state machine.
///
/// Transitions are strictly forward, one step at a time:
///
/// ```text
/// Absent → CheckedIn → CheckedOut
/// ```
///
/// `Absent → CheckedOut` is forbidden, and `CheckedOut` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceState {
    Absent,
    CheckedIn,
    CheckedOut,
}

impl AttendanceState {
    /// Derives the state of an optional record. No record means `Absent`.
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        record.map_or(Self::Absent, AttendanceRecord::state)
    }

    /// The only state reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Absent => Some(Self::CheckedIn),
            Self::CheckedIn => Some(Self::CheckedOut),
            Self::CheckedOut => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Returns `true` once no further transition is possible.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for AttendanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::CheckedIn => write!(f, "CheckedIn"),
            Self::CheckedOut => write!(f, "CheckedOut"),
        }
    }
}

// ---------------------------------------------------------------------------
// AttendanceRecord
// ---------------------------------------------------------------------------

/// The unique key of an attendance record.
pub type AttendanceKey = (ParticipantId, SessionId);

/// Where a presentation came from. Advisory only: never used in decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Provenance {
    /// Provenance with both fields set.
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// One participant's attendance in one session.
///
/// The timestamps are private so the invariant "checked out implies
/// checked in" cannot be broken from outside: the only writers are
/// [`check_in`](Self::check_in) and [`check_out`](Self::check_out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub participant_id: ParticipantId,
    pub session_id: SessionId,
    check_in_at: Option<u64>,
    check_out_at: Option<u64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AttendanceRecord {
    /// An empty record for the pair. Not yet persisted.
    pub fn new(participant_id: ParticipantId, session_id: SessionId) -> Self {
        Self {
            participant_id,
            session_id,
            check_in_at: None,
            check_out_at: None,
            ip_address: None,
            user_agent: None,
        }
    }

    /// The `(participant, session)` key.
    pub fn key(&self) -> AttendanceKey {
        (self.participant_id.clone(), self.session_id.clone())
    }

    pub fn check_in_at(&self) -> Option<u64> {
        self.check_in_at
    }

    pub fn check_out_at(&self) -> Option<u64> {
        self.check_out_at
    }

    /// Current position in the state machine.
    pub fn state(&self) -> AttendanceState {
        match (self.check_in_at, self.check_out_at) {
            (None, _) => AttendanceState::Absent,
            (Some(_), None) => AttendanceState::CheckedIn,
            (Some(_), Some(_)) => AttendanceState::CheckedOut,
        }
    }

    /// Records arrival at `at`.
    ///
    /// # Errors
    /// Returns the current state if it is not `Absent`.
    pub fn check_in(
        &mut self,
        at: u64,
        provenance: &Provenance,
    ) -> Result<(), AttendanceState> {
        self.transition(AttendanceState::CheckedIn)?;
        self.check_in_at = Some(at);
        self.stamp(provenance);
        Ok(())
    }

    /// Records departure at `at`. Provenance stays as recorded at check-in.
    ///
    /// # Errors
    /// Returns the current state if it is not `CheckedIn`.
    pub fn check_out(&mut self, at: u64) -> Result<(), AttendanceState> {
        self.transition(AttendanceState::CheckedOut)?;
        self.check_out_at = Some(at);
        Ok(())
    }

    fn transition(&self, target: AttendanceState) -> Result<(), AttendanceState> {
        let current = self.state();
        if current.can_transition_to(target) {
            Ok(())
        } else {
            Err(current)
        }
    }

    fn stamp(&mut self, provenance: &Provenance) {
        self.ip_address = provenance.ip_address.clone();
        self.user_agent = provenance.user_agent.clone();
    }
}
