//! Error types for the token layer.

/// Errors that can occur while encoding, decoding, or issuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The string does not follow the
    /// `SESSION_<id>;TYPE=<kind>;EXP=<millis>` grammar.
    ///
    /// The inner string says which part of the grammar was violated. It is
    /// meant for logs, not for end users.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token id cannot be encoded: it is empty or contains one of the
    /// delimiter characters `;` or `=`.
    #[error("invalid token id {0:?}")]
    InvalidId(String),

    /// The token kind cannot be encoded: it is empty or contains `;` or `=`.
    #[error("invalid token kind {0:?}")]
    InvalidKind(String),
}
