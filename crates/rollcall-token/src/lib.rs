//! QR token format for Rollcall.
//!
//! This crate defines the string that gets rendered into a QR code and
//! scanned by participants:
//!
//! - **Types** ([`SessionId`], [`ParticipantId`], [`AttendanceKind`],
//!   [`Token`]): the identities and claims a token carries.
//! - **Codec** ([`encode`], [`decode`]): the purely syntactic mapping
//!   between a [`Token`] and its wire string.
//! - **Issuer** ([`TokenIssuer`]): mints a fresh, time-boxed token for a
//!   session.
//! - **Errors** ([`TokenError`]): what can go wrong while encoding,
//!   decoding, or issuing.
//!
//! # Wire format
//!
//! ```text
//! SESSION_<id>;TYPE=<checkin|checkout>;EXP=<epoch-millis>
//! ```
//!
//! Tokens are NOT signed. The only integrity control is that a presented
//! token must exactly match the value the server stored for the session;
//! that check lives in `rollcall-attendance`, not here.

mod codec;
mod error;
mod issuer;
mod types;

pub use codec::{decode, encode, EXPIRY_PREFIX, KIND_PREFIX, SESSION_PREFIX};
pub use error::TokenError;
pub use issuer::{IssuedToken, TokenIssuer, DEFAULT_TOKEN_WINDOW};
pub use types::{AttendanceKind, ParticipantId, SessionId, Token, TokenKind};
