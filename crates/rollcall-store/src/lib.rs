//! Storage collaborators for Rollcall.
//!
//! The attendance core does not own persistence. It reads and writes
//! through three traits that the embedding application implements on top
//! of whatever database it uses:
//!
//! 1. **[`IdentityStore`]**: who is calling, and with which [`Role`]
//! 2. **[`SessionStore`]**: attendance windows and their current token
//! 3. **[`AttendanceStore`]**: one [`AttendanceRecord`] per
//!    (participant, session) pair
//!
//! [`MemoryStore`] and [`MemoryIdentityStore`] are in-process
//! implementations used by tests and the demo.
//!
//! # How it fits in the stack
//!
//! ```text
//! rollcall-session / rollcall-attendance (above)  ← call the traits
//!     ↕
//! Store layer (this crate)  ← data model + collaborator interfaces
//!     ↕
//! rollcall-token (below)  ← SessionId, ParticipantId, AttendanceKind
//! ```

mod error;
mod memory;
mod model;
mod repository;

pub use error::{IdentityError, StoreError};
pub use memory::{MemoryIdentityStore, MemoryStore};
pub use model::{
    AttendanceKey, AttendanceRecord, AttendanceState, Identity, Provenance,
    Role, Session, SessionToken,
};
pub use repository::{AttendanceStore, IdentityStore, SessionStore};
