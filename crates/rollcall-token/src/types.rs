//! Identity and claim types shared by every Rollcall layer.
//!
//! These live in the leaf crate so that the store, the decision engine,
//! and the lifecycle manager all agree on what a session id or an
//! attendance kind is without depending on each other.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an attendance session.
///
/// Newtype wrapper around the opaque string the store keys sessions by.
/// Wrapping it means a `ParticipantId` can never be passed where a
/// `SessionId` is expected, even though both are strings underneath.
///
/// `#[serde(transparent)]` serializes it as the bare string, so a
/// `SessionId("ab12")` becomes `"ab12"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing identifier (e.g. one loaded from storage).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier: 32 lowercase hex characters
    /// (128 bits of randomness).
    ///
    /// Hex digits never collide with the token delimiters `;`, `=` or the
    /// nonce separator `.`, so a generated id is always encodable.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a participant (the person scanning a QR code).
///
/// The identity store decides what this looks like; the core treats it as
/// opaque and only uses it as half of the attendance record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps an identifier handed out by the identity store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AttendanceKind
// ---------------------------------------------------------------------------

/// What a session (and the tokens it issues) records: arrival or departure.
///
/// `#[serde(rename_all = "lowercase")]` makes the JSON form match the wire
/// form used inside tokens: `"checkin"` / `"checkout"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceKind {
    /// Participants scanning this token are arriving.
    CheckIn,
    /// Participants scanning this token are leaving.
    CheckOut,
}

impl AttendanceKind {
    /// The value written after `TYPE=` in a token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckIn => "checkin",
            Self::CheckOut => "checkout",
        }
    }

    /// Parses the wire value. Case-sensitive: `"CheckIn"` is not accepted.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "checkin" => Some(Self::CheckIn),
            "checkout" => Some(Self::CheckOut),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TokenKind
// ---------------------------------------------------------------------------

/// The kind carried by a decoded token.
///
/// Unlike [`AttendanceKind`], this keeps values the server does not know
/// about. Decoding is purely syntactic, so `TYPE=lunch` decodes fine and
/// the decision engine is the one that rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    CheckIn,
    CheckOut,
    /// Any other non-empty `TYPE=` value, kept verbatim.
    Unsupported(String),
}

impl TokenKind {
    /// Maps a raw `TYPE=` value to a kind.
    pub fn from_wire(value: &str) -> Self {
        match AttendanceKind::from_wire(value) {
            Some(kind) => kind.into(),
            None => Self::Unsupported(value.to_string()),
        }
    }

    /// The value written after `TYPE=`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckIn => AttendanceKind::CheckIn.as_str(),
            Self::CheckOut => AttendanceKind::CheckOut.as_str(),
            Self::Unsupported(raw) => raw,
        }
    }

    /// Returns the attendance kind, or `None` for unsupported values.
    pub fn attendance_kind(&self) -> Option<AttendanceKind> {
        match self {
            Self::CheckIn => Some(AttendanceKind::CheckIn),
            Self::CheckOut => Some(AttendanceKind::CheckOut),
            Self::Unsupported(_) => None,
        }
    }
}

impl From<AttendanceKind> for TokenKind {
    fn from(kind: AttendanceKind) -> Self {
        match kind {
            AttendanceKind::CheckIn => Self::CheckIn,
            AttendanceKind::CheckOut => Self::CheckOut,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// The structured form of a QR token.
///
/// `id` is the session-scoped identifier written after `SESSION_`. Tokens
/// minted by [`TokenIssuer`](crate::TokenIssuer) use `<session-id>.<nonce>`
/// so that two tokens for the same session never share a string, but the
/// codec treats the id as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Session-scoped identifier (no `;` or `=`).
    pub id: String,
    /// Check-in, check-out, or an unsupported raw value.
    pub kind: TokenKind,
    /// Last instant (epoch millis, inclusive) at which the token is usable.
    pub expires_at: u64,
}

impl Token {
    /// Builds a token from its three claims.
    pub fn new(id: impl Into<String>, kind: impl Into<TokenKind>, expires_at: u64) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            expires_at,
        }
    }

    /// Returns the session this token belongs to.
    ///
    /// The nonce suffix added by the issuer is stripped at the LAST `.`, so
    /// session ids may themselves contain dots. An id without a `.` is
    /// taken whole.
    pub fn session_id(&self) -> SessionId {
        match self.id.rsplit_once('.') {
            Some((session, _nonce)) => SessionId::new(session),
            None => SessionId::new(self.id.as_str()),
        }
    }

    /// Returns `true` once `now` is strictly past the embedded expiry.
    ///
    /// A token presented exactly at `expires_at` is still valid.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }
}
