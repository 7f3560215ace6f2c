//! Attendance decision engine for Rollcall.
//!
//! One function matters here: [`AttendanceEngine::present`]. A participant
//! scans a QR code, the presentation layer hands the scanned string to the
//! engine, and the engine decides whether that scan records a check-in,
//! records a check-out, or is rejected.
//!
//! # Decision order
//!
//! ```text
//! decode ─→ expiry ─→ session exists ─→ session active ─→ token current
//!    │         │            │                 │                 │
//!    ▼         ▼            ▼                 ▼                 ▼
//! Malformed  Expired   NotFound         Inactive          Superseded
//!
//! ─→ (lock pair) ─→ load record ─→ CheckIn / CheckOut transition
//! ```
//!
//! The first failing check wins. Only the final step writes.
//!
//! # Outcomes vs errors
//!
//! Every decision about the input is an [`Outcome`], returned as `Ok`.
//! `Err` is reserved for [`AttendanceError::Storage`]: the store failed,
//! and that is the only case where retrying the same input can help.

mod engine;
mod error;
mod locks;
mod outcome;

pub use engine::AttendanceEngine;
pub use error::AttendanceError;
pub use outcome::{Acceptance, Outcome, Rejection, Transition};
