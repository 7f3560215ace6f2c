//! # Rollcall
//!
//! QR-token attendance tracking.
//!
//! A coordinator opens a session and displays its short-lived QR token.
//! Participants scan it, and the service decides whether the scan checks
//! them in, checks them out, or is refused. Rollcall provides the core of
//! that flow; the embedding application supplies storage and identity by
//! implementing the traits in [`rollcall_store`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rollcall::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), RollcallError> {
//! let store = Arc::new(MemoryStore::new());
//! let identities = Arc::new(
//!     MemoryIdentityStore::new()
//!         .with_identity("admin-key", Identity::coordinator("admin"))
//!         .with_identity("alice-key", Identity::participant("alice")),
//! );
//! let rollcall = RollcallBuilder::new().build(identities, Arc::clone(&store), store);
//!
//! let session = rollcall
//!     .create_session("admin-key", "Morning lecture", AttendanceKind::CheckIn)
//!     .await?;
//! let token = session.current_token().unwrap_or_default();
//!
//! let outcome = rollcall
//!     .present_token("alice-key", token, &Provenance::default())
//!     .await?;
//! assert_eq!(outcome.message(), "Check-in successful");
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod service;

pub use config::RollcallConfig;
pub use error::RollcallError;
pub use service::{Rollcall, RollcallBuilder};

pub use rollcall_attendance as attendance;
pub use rollcall_session as session;
pub use rollcall_store as store;
pub use rollcall_token as token;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Calling this
/// more than once, or after another subscriber was installed, does nothing.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Everything an embedding application usually needs.
pub mod prelude {
    pub use crate::{Rollcall, RollcallBuilder, RollcallConfig, RollcallError};
    pub use rollcall_attendance::{AttendanceEngine, Outcome, Rejection, Transition};
    pub use rollcall_session::{Clock, ManualClock, SessionManager, SystemClock};
    pub use rollcall_store::{
        AttendanceRecord, AttendanceState, AttendanceStore, Identity, IdentityStore,
        MemoryIdentityStore, MemoryStore, Provenance, Role, Session, SessionStore,
    };
    pub use rollcall_token::{AttendanceKind, ParticipantId, SessionId};
}
