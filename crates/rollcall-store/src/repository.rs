//! Collaborator traits the core reads and writes through.
//!
//! Rollcall does not implement persistence itself. The embedding
//! application implements these traits over its database (or uses
//! [`MemoryStore`](crate::MemoryStore) in tests) and hands them to the
//! decision engine and lifecycle manager as `Arc`s.
//!
//! # Trait bounds
//!
//! - `Send + Sync` → the store is shared by every concurrent call.
//! - `'static` → it lives as long as the service that holds it.
//!
//! Every method returns `impl Future + Send` rather than using
//! `async fn` in the trait, so callers can hold the future across
//! `tokio::spawn` boundaries.

use std::future::Future;

use rollcall_token::{ParticipantId, SessionId};

use crate::{AttendanceRecord, Identity, IdentityError, Session, StoreError};

/// Resolves a caller credential (bearer token, API key, ...) to an identity.
pub trait IdentityStore: Send + Sync + 'static {
    /// Returns who `credential` belongs to.
    ///
    /// # Errors
    /// - [`IdentityError::Unauthenticated`]: the credential is not accepted
    /// - [`IdentityError::Store`]: the lookup itself failed
    fn resolve(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<Identity, IdentityError>> + Send;
}

/// Durable record of sessions.
///
/// Only the lifecycle manager writes through this trait. The decision
/// engine only calls [`get`](Self::get).
pub trait SessionStore: Send + Sync + 'static {
    /// Loads a session. `Ok(None)` means it does not exist.
    fn get(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Inserts or fully replaces a session.
    ///
    /// Must be atomic per session: a concurrent `get` sees either the old
    /// row or the new one, never a mix. Token regeneration relies on this.
    fn put(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a session and, transitively, its attendance records.
    ///
    /// Returns `false` if there was nothing to delete.
    fn delete(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Every session, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Session>, StoreError>> + Send;

    /// Every session with `active == true`, newest first.
    fn list_active(
        &self,
    ) -> impl Future<Output = Result<Vec<Session>, StoreError>> + Send;
}

/// Durable record of attendance, one row per (participant, session).
///
/// Only the decision engine writes through this trait. The engine
/// serializes read-modify-write per key, so implementations do not need
/// their own compare-and-swap.
pub trait AttendanceStore: Send + Sync + 'static {
    /// Loads the record for the pair. `Ok(None)` means none exists yet.
    fn get(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<AttendanceRecord>, StoreError>> + Send;

    /// Inserts or replaces the record for `record.key()`.
    fn put(
        &self,
        record: AttendanceRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every record of one participant.
    fn list_by_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    /// Every record of one session.
    fn list_by_session(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    /// Every record.
    fn list(
        &self,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;
}
