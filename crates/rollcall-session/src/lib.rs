//! Session lifecycle management for Rollcall.
//!
//! Coordinators open attendance sessions, refresh their QR tokens,
//! deactivate them, and delete them. This crate owns those operations:
//!
//! 1. **Authorization**: every mutating call passes the caller through
//!    [`authorize`], which hands back a [`Coordinator`] capability or fails
//!    with [`SessionError::Unauthorized`]
//! 2. **Lifecycle**: [`SessionManager`] creates, refreshes, deactivates,
//!    and deletes sessions through an injected
//!    [`SessionStore`](rollcall_store::SessionStore)
//! 3. **Time**: a [`Clock`] supplies timestamps so tests can pin them
//!
//! # Session lifecycle
//!
//! ```text
//! create_session ──→ [active, token T1]
//!                        │
//!                        ├── regenerate_token ──→ [active, token T2]  (T1 now superseded)
//!                        ├── deactivate_session ──→ [inactive]  (every token refused)
//!                        └── delete_session ──→ gone (attendance cascades in the store)
//! ```

mod clock;
mod config;
mod error;
mod guard;
mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::SessionError;
pub use guard::{authorize, Coordinator};
pub use manager::SessionManager;
