//! Token codec: [`Token`] ⇄ `SESSION_<id>;TYPE=<kind>;EXP=<millis>`.
//!
//! Decoding is purely syntactic. It never looks up a session and never
//! compares the expiry against a clock; those checks belong to the
//! decision engine, which needs a store and a `now` to make them.

use std::fmt;
use std::str::FromStr;

use crate::{Token, TokenError, TokenKind};

/// Prefix of the first segment.
pub const SESSION_PREFIX: &str = "SESSION_";

/// Prefix of the second segment.
pub const KIND_PREFIX: &str = "TYPE=";

/// Prefix of the third segment.
pub const EXPIRY_PREFIX: &str = "EXP=";

const SEGMENT_DELIMITER: char = ';';

/// Encodes a token into its wire string.
///
/// # Errors
/// - [`TokenError::InvalidId`] if the id is empty or contains `;` or `=`
/// - [`TokenError::InvalidKind`] if the kind is empty or contains `;` or `=`
///
/// Either would produce a string that [`decode`] rejects.
pub fn encode(token: &Token) -> Result<String, TokenError> {
    if !is_encodable(&token.id) {
        return Err(TokenError::InvalidId(token.id.clone()));
    }
    if !is_encodable(token.kind.as_str()) {
        return Err(TokenError::InvalidKind(token.kind.as_str().to_string()));
    }
    Ok(token.to_string())
}

/// Decodes a wire string into a token.
///
/// The string must split on `;` into exactly three segments carrying the
/// prefixes `SESSION_`, `TYPE=` and `EXP=` in that order, each followed by
/// a non-empty value. The expiry must be ASCII digits only (no sign, no
/// whitespace) and fit in a `u64`.
///
/// The kind is deliberately not validated: `TYPE=lunch` decodes to
/// [`TokenKind::Unsupported`].
///
/// # Errors
/// Returns [`TokenError::Malformed`] describing the first violation found.
pub fn decode(raw: &str) -> Result<Token, TokenError> {
    let segments: Vec<&str> = raw.split(SEGMENT_DELIMITER).collect();
    let [session, kind, expiry] = segments.as_slice() else {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let id = segment_value(session, SESSION_PREFIX)?;
    if id.contains('=') {
        return Err(TokenError::Malformed("session id contains '='".into()));
    }
    let kind = segment_value(kind, KIND_PREFIX)?;
    let expiry = segment_value(expiry, EXPIRY_PREFIX)?;

    // `u64::from_str` accepts a leading `+`, which the wire format does not.
    if !expiry.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::Malformed(format!(
            "expiry {expiry:?} is not a non-negative integer"
        )));
    }
    let expires_at = expiry.parse::<u64>().map_err(|_| {
        TokenError::Malformed(format!("expiry {expiry:?} is out of range"))
    })?;

    Ok(Token {
        id: id.to_string(),
        kind: TokenKind::from_wire(kind),
        expires_at,
    })
}

/// Strips `prefix` from `segment` and returns the non-empty remainder.
fn segment_value<'a>(
    segment: &'a str,
    prefix: &str,
) -> Result<&'a str, TokenError> {
    let value = segment.strip_prefix(prefix).ok_or_else(|| {
        TokenError::Malformed(format!("segment {segment:?} lacks prefix {prefix:?}"))
    })?;
    if value.is_empty() {
        return Err(TokenError::Malformed(format!("empty value after {prefix:?}")));
    }
    Ok(value)
}

fn is_encodable(value: &str) -> bool {
    !value.is_empty() && !value.contains([SEGMENT_DELIMITER, '='])
}

/// Writes the wire form without validating the id.
///
/// Use [`encode`] when the id comes from outside; `Display` is for logging
/// and for tokens the issuer already validated.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SESSION_PREFIX}{};{KIND_PREFIX}{};{EXPIRY_PREFIX}{}",
            self.id, self.kind, self.expires_at
        )
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}
