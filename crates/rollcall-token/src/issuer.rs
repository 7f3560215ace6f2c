//! Token issuer: mints the token a coordinator puts on screen.
//!
//! Each call produces a new random nonce, so two tokens issued for the same
//! session at the same millisecond still differ. That is what lets the
//! decision engine tell a current token from a superseded one by string
//! comparison alone.

use std::time::Duration;

use rand::Rng;

use crate::{encode, AttendanceKind, SessionId, Token, TokenError};

/// How long a freshly issued token stays usable: 5 minutes.
pub const DEFAULT_TOKEN_WINDOW: Duration = Duration::from_secs(5 * 60);

/// A token that was just minted, in both structured and wire form.
///
/// The caller must persist `encoded` and `expires_at()` into the session
/// BEFORE showing the QR code, otherwise the first scan will be rejected
/// as superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The string to render as a QR code and store as the current token.
    pub encoded: String,
    /// The parsed claims of `encoded`.
    pub token: Token,
}

impl IssuedToken {
    /// Epoch millis after which the token is rejected as expired.
    pub fn expires_at(&self) -> u64 {
        self.token.expires_at
    }
}

/// Mints fresh tokens with a fixed validity window.
///
/// Stateless apart from the window: it does not remember what it issued.
/// Invalidating the previous token is the job of whoever stores the new
/// one (overwriting the session's current token does exactly that).
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    window: Duration,
}

impl TokenIssuer {
    /// Creates an issuer whose tokens expire `window` after issuance.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// The validity window applied to every token.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Issues a new token for `session_id`.
    ///
    /// The token id is `<session_id>.<16 hex chars>` and the expiry is
    /// `now + window` (saturating at `u64::MAX`).
    ///
    /// # Errors
    /// Returns [`TokenError::InvalidId`] if `session_id` is empty or
    /// contains `;` or `=`.
    pub fn issue(
        &self,
        session_id: &SessionId,
        kind: AttendanceKind,
        now: u64,
    ) -> Result<IssuedToken, TokenError> {
        let nonce: u64 = rand::rng().random();
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);

        let token = Token::new(
            format!("{session_id}.{nonce:016x}"),
            kind,
            now.saturating_add(window_ms),
        );
        let encoded = encode(&token)?;

        Ok(IssuedToken { encoded, token })
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, TokenKind};

    #[test]
    fn test_issue_expiry_is_now_plus_window() {
        let issuer = TokenIssuer::default();

        let issued = issuer
            .issue(&SessionId::new("s1"), AttendanceKind::CheckIn, 1_000)
            .expect("should issue");

        assert_eq!(issued.expires_at(), 1_000 + 300_000);
    }

    #[test]
    fn test_issue_encoded_decodes_to_claims() {
        let issuer = TokenIssuer::default();
        let issued = issuer
            .issue(&SessionId::new("s1"), AttendanceKind::CheckOut, 0)
            .unwrap();

        let decoded = decode(&issued.encoded).unwrap();

        assert_eq!(decoded, issued.token);
        assert_eq!(decoded.kind, TokenKind::CheckOut);
        assert_eq!(decoded.session_id(), SessionId::new("s1"));
    }

    #[test]
    fn test_issue_twice_same_instant_yields_distinct_tokens() {
        // Regeneration within the same millisecond must still supersede.
        let issuer = TokenIssuer::default();
        let session = SessionId::new("s1");

        let a = issuer.issue(&session, AttendanceKind::CheckIn, 5).unwrap();
        let b = issuer.issue(&session, AttendanceKind::CheckIn, 5).unwrap();

        assert_ne!(a.encoded, b.encoded);
        assert_eq!(a.expires_at(), b.expires_at());
    }

    #[test]
    fn test_issue_custom_window() {
        let issuer = TokenIssuer::new(Duration::from_secs(30));
        let issued = issuer
            .issue(&SessionId::new("s1"), AttendanceKind::CheckIn, 10)
            .unwrap();
        assert_eq!(issued.expires_at(), 30_010);
    }

    #[test]
    fn test_issue_saturates_instead_of_overflowing() {
        let issued = TokenIssuer::default()
            .issue(&SessionId::new("s1"), AttendanceKind::CheckIn, u64::MAX - 1)
            .unwrap();
        assert_eq!(issued.expires_at(), u64::MAX);
    }

    #[test]
    fn test_issue_rejects_undelimitable_session_id() {
        let result = TokenIssuer::default().issue(
            &SessionId::new("bad;id"),
            AttendanceKind::CheckIn,
            0,
        );
        assert!(matches!(result, Err(TokenError::InvalidId(_))));
    }
}
