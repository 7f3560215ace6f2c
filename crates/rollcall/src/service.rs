//! `Rollcall` builder and service.
//!
//! This is the entry point an embedding application talks to. It ties
//! together all the layers: identity → lifecycle manager → decision engine.
//! Every call starts by resolving the caller's credential.

use std::sync::Arc;

use rollcall_attendance::{AttendanceEngine, Outcome};
use rollcall_session::{authorize, Clock, SessionManager, SystemClock};
use rollcall_store::{
    AttendanceRecord, AttendanceStore, Identity, IdentityStore, Provenance, Session, SessionStore,
};
use rollcall_token::{AttendanceKind, SessionId};

use crate::{RollcallConfig, RollcallError};

/// Builder for configuring a Rollcall service.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use rollcall::prelude::*;
///
/// let store = Arc::new(MemoryStore::new());
/// let identities = Arc::new(MemoryIdentityStore::new());
///
/// let service = RollcallBuilder::new()
///     .token_window_secs(120)
///     .build(identities, Arc::clone(&store), store);
/// assert_eq!(service.config().token_window_secs, 120);
/// ```
pub struct RollcallBuilder {
    config: RollcallConfig,
}

impl RollcallBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RollcallConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RollcallConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long issued tokens stay valid.
    pub fn token_window_secs(mut self, secs: u64) -> Self {
        self.config.token_window_secs = secs;
        self
    }

    /// Sets the longest accepted session name.
    pub fn max_name_len(mut self, len: usize) -> Self {
        self.config.max_name_len = len;
        self
    }

    /// Builds a service that reads the wall clock.
    pub fn build<I, S, A>(
        self,
        identities: Arc<I>,
        sessions: Arc<S>,
        attendance: Arc<A>,
    ) -> Rollcall<I, S, A>
    where
        I: IdentityStore,
        S: SessionStore,
        A: AttendanceStore,
    {
        self.build_with_clock(identities, sessions, attendance, SystemClock)
    }

    /// Builds a service with an explicit clock.
    pub fn build_with_clock<I, S, A, C>(
        self,
        identities: Arc<I>,
        sessions: Arc<S>,
        attendance: Arc<A>,
        clock: C,
    ) -> Rollcall<I, S, A, C>
    where
        I: IdentityStore,
        S: SessionStore,
        A: AttendanceStore,
        C: Clock,
    {
        let manager =
            SessionManager::with_clock(Arc::clone(&sessions), self.config.session_config(), clock);
        let engine = AttendanceEngine::new(sessions, attendance);
        tracing::debug!(
            token_window_secs = self.config.token_window_secs,
            max_name_len = self.config.max_name_len,
            "rollcall service built"
        );
        Rollcall {
            identities,
            manager,
            engine,
            config: self.config,
        }
    }
}

impl Default for RollcallBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The attendance service: session management for coordinators and
/// token presentation for participants.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called from many tasks at once.
pub struct Rollcall<I, S, A, C = SystemClock>
where
    I: IdentityStore,
    S: SessionStore,
    A: AttendanceStore,
    C: Clock,
{
    identities: Arc<I>,
    manager: SessionManager<S, C>,
    engine: AttendanceEngine<S, A>,
    config: RollcallConfig,
}

impl<I, S, A, C> Rollcall<I, S, A, C>
where
    I: IdentityStore,
    S: SessionStore,
    A: AttendanceStore,
    C: Clock,
{
    /// The configuration the service was built with.
    pub fn config(&self) -> &RollcallConfig {
        &self.config
    }

    /// The lifecycle manager, for callers that already hold an `Identity`.
    pub fn manager(&self) -> &SessionManager<S, C> {
        &self.manager
    }

    /// The decision engine, for callers that already know the participant.
    pub fn engine(&self) -> &AttendanceEngine<S, A> {
        &self.engine
    }

    /// Resolves a credential to the identity behind it.
    ///
    /// # Errors
    /// [`RollcallError::Identity`] if the credential is not accepted.
    pub async fn resolve(&self, credential: &str) -> Result<Identity, RollcallError> {
        self.identities.resolve(credential).await.map_err(|e| {
            tracing::debug!(error = %e, "credential did not resolve");
            RollcallError::from(e)
        })
    }

    // -- Coordinator operations -------------------------------------------

    /// Opens a session and issues its first token.
    pub async fn create_session(
        &self,
        credential: &str,
        name: &str,
        kind: AttendanceKind,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self.manager.create_session(&caller, name, kind).await?)
    }

    /// Replaces the session's token with a fresh one of the session's kind.
    pub async fn regenerate_token(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self.manager.regenerate_token(&caller, session_id).await?)
    }

    /// Replaces the session's token with a fresh one of `kind`.
    pub async fn regenerate_token_as(
        &self,
        credential: &str,
        session_id: &SessionId,
        kind: AttendanceKind,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self
            .manager
            .regenerate_token_as(&caller, session_id, kind)
            .await?)
    }

    /// Stops the session from accepting tokens.
    pub async fn deactivate_session(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self.manager.deactivate_session(&caller, session_id).await?)
    }

    /// Lets a deactivated session accept its current token again.
    pub async fn activate_session(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self.manager.activate_session(&caller, session_id).await?)
    }

    /// Changes the session's display name.
    pub async fn rename_session(
        &self,
        credential: &str,
        session_id: &SessionId,
        name: &str,
    ) -> Result<Session, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self
            .manager
            .rename_session(&caller, session_id, name)
            .await?)
    }

    /// Deletes the session and its attendance records.
    pub async fn delete_session(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<(), RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self.manager.delete_session(&caller, session_id).await?)
    }

    /// Every record of one session. Coordinators only.
    pub async fn session_attendance(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<Vec<AttendanceRecord>, RollcallError> {
        let caller = self.resolve(credential).await?;
        authorize(&caller)?;
        Ok(self.engine.records_for_session(session_id).await?)
    }

    /// Every record in the store. Coordinators only.
    pub async fn all_attendance(
        &self,
        credential: &str,
    ) -> Result<Vec<AttendanceRecord>, RollcallError> {
        let caller = self.resolve(credential).await?;
        authorize(&caller)?;
        Ok(self.engine.all_records().await?)
    }

    // -- Any authenticated caller -----------------------------------------

    /// Looks up one session.
    pub async fn get_session(
        &self,
        credential: &str,
        session_id: &SessionId,
    ) -> Result<Session, RollcallError> {
        self.resolve(credential).await?;
        Ok(self.manager.get_session(session_id).await?)
    }

    /// Every active session, newest first.
    pub async fn list_active(&self, credential: &str) -> Result<Vec<Session>, RollcallError> {
        self.resolve(credential).await?;
        Ok(self.manager.list_active().await?)
    }

    /// Every session, newest first.
    pub async fn list_sessions(&self, credential: &str) -> Result<Vec<Session>, RollcallError> {
        self.resolve(credential).await?;
        Ok(self.manager.list_sessions().await?)
    }

    /// Presents a scanned token on behalf of the caller, stamped with the
    /// service clock.
    ///
    /// A refused scan is `Ok(Outcome::Rejected(_))`; see
    /// [`AttendanceEngine::present_with_provenance`] for the checks.
    ///
    /// # Errors
    /// - [`RollcallError::Identity`]: the credential did not resolve
    /// - [`RollcallError::Attendance`]: a store call failed (retryable)
    pub async fn present_token(
        &self,
        credential: &str,
        token: &str,
        provenance: &Provenance,
    ) -> Result<Outcome, RollcallError> {
        let caller = self.resolve(credential).await?;
        let now = self.manager.clock().now_millis();
        Ok(self
            .engine
            .present_with_provenance(&caller.participant_id, token, now, provenance)
            .await?)
    }

    /// The caller's own attendance history.
    pub async fn my_attendance(
        &self,
        credential: &str,
    ) -> Result<Vec<AttendanceRecord>, RollcallError> {
        let caller = self.resolve(credential).await?;
        Ok(self
            .engine
            .records_for_participant(&caller.participant_id)
            .await?)
    }
}
