//! The session manager: the coordinator's side of Rollcall.
//!
//! Every mutating method takes the calling [`Identity`] and runs it through
//! [`authorize`] before doing anything else. Reads are open to any caller.
//!
//! # Concurrency note
//!
//! Lifecycle writes are load-modify-store on a whole `Session`. Two of
//! them racing on the same session (say, a deactivate and a regenerate)
//! could otherwise lose one update, so writes go through a single async
//! mutex. Coordinator actions are rare; presentations never take this
//! lock, they only read the session.

use std::sync::Arc;

use rollcall_store::{Identity, Session, SessionStore};
use rollcall_token::{AttendanceKind, SessionId, TokenIssuer};
use tokio::sync::Mutex;

use crate::{authorize, Clock, Coordinator, SessionConfig, SessionError, SystemClock};

/// Creates, refreshes, deactivates, and deletes attendance sessions.
///
/// ## Lifecycle
///
/// ```text
/// create_session() ──→ [active + token] ──→ regenerate_token() ──→ [active + new token]
///                            │
///                            ├──→ deactivate_session() ──→ [inactive] ──→ activate_session()
///                            │
///                            └──→ delete_session() ──→ gone
/// ```
pub struct SessionManager<S: SessionStore, C: Clock = SystemClock> {
    store: Arc<S>,
    issuer: TokenIssuer,
    clock: C,
    config: SessionConfig,
    writes: Mutex<()>,
}

impl<S: SessionStore> SessionManager<S, SystemClock> {
    /// Creates a manager that reads the wall clock.
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: SessionStore, C: Clock> SessionManager<S, C> {
    /// Creates a manager with an explicit clock.
    pub fn with_clock(store: Arc<S>, config: SessionConfig, clock: C) -> Self {
        Self {
            store,
            issuer: TokenIssuer::new(config.token_window()),
            clock,
            config,
            writes: Mutex::new(()),
        }
    }

    /// The clock this manager stamps times with.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens a new active session and issues its first token.
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`]: caller is not a coordinator
    /// - [`SessionError::InvalidName`]: name empty or too long
    /// - [`SessionError::Storage`]: the store failed
    pub async fn create_session(
        &self,
        caller: &Identity,
        name: &str,
        kind: AttendanceKind,
    ) -> Result<Session, SessionError> {
        let coordinator = authorize(caller)?;
        let name = self.validate_name(name)?;

        let now = self.clock.now_millis();
        let mut session = Session::new(SessionId::generate(), name, kind, now);
        let issued = self.issuer.issue(&session.id, kind, now)?;
        let expires_at = issued.expires_at();
        session.install_token(issued.encoded, expires_at);

        let _write = self.writes.lock().await;
        self.store.put(session.clone()).await?;

        tracing::info!(
            session_id = %session.id,
            %kind,
            by = %coordinator.participant_id(),
            "session created"
        );
        Ok(session)
    }

    /// Replaces the session's token with a fresh one of the session's kind.
    ///
    /// The previous token stops working immediately, even if it has not
    /// expired.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`]: caller is not a coordinator
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::Storage`]: the store failed
    pub async fn regenerate_token(
        &self,
        caller: &Identity,
        session_id: &SessionId,
    ) -> Result<Session, SessionError> {
        let coordinator = authorize(caller)?;
        self.reissue(&coordinator, session_id, None).await
    }

    /// Replaces the session's token with a fresh one of an explicit kind.
    ///
    /// This is how a check-in session's QR code is switched to check-out at
    /// the end of a class: the session keeps its id (and so its attendance
    /// records) while the displayed token starts recording departures.
    ///
    /// # Errors
    /// Same as [`regenerate_token`](Self::regenerate_token).
    pub async fn regenerate_token_as(
        &self,
        caller: &Identity,
        session_id: &SessionId,
        kind: AttendanceKind,
    ) -> Result<Session, SessionError> {
        let coordinator = authorize(caller)?;
        self.reissue(&coordinator, session_id, Some(kind)).await
    }

    /// Stops the session from accepting any token. The token is kept.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`]: caller is not a coordinator
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::Storage`]: the store failed
    pub async fn deactivate_session(
        &self,
        caller: &Identity,
        session_id: &SessionId,
    ) -> Result<Session, SessionError> {
        let coordinator = authorize(caller)?;
        let session = self
            .modify(session_id, |session| {
                session.active = false;
                Ok(())
            })
            .await?;
        tracing::info!(%session_id, by = %coordinator.participant_id(), "session deactivated");
        Ok(session)
    }

    /// Lets a deactivated session accept its current token again.
    ///
    /// # Errors
    /// Same as [`deactivate_session`](Self::deactivate_session).
    pub async fn activate_session(
        &self,
        caller: &Identity,
        session_id: &SessionId,
    ) -> Result<Session, SessionError> {
        let coordinator = authorize(caller)?;
        let session = self
            .modify(session_id, |session| {
                session.active = true;
                Ok(())
            })
            .await?;
        tracing::info!(%session_id, by = %coordinator.participant_id(), "session activated");
        Ok(session)
    }

    /// Changes the session's display name.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`]: caller is not a coordinator
    /// - [`SessionError::InvalidName`]: name empty or too long
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::Storage`]: the store failed
    pub async fn rename_session(
        &self,
        caller: &Identity,
        session_id: &SessionId,
        name: &str,
    ) -> Result<Session, SessionError> {
        authorize(caller)?;
        let name = self.validate_name(name)?;
        self.modify(session_id, move |session| {
            session.name = name;
            Ok(())
        })
        .await
    }

    /// Deletes the session. The store removes its attendance records too.
    ///
    /// # Errors
    /// - [`SessionError::Unauthorized`]: caller is not a coordinator
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::Storage`]: the store failed
    pub async fn delete_session(
        &self,
        caller: &Identity,
        session_id: &SessionId,
    ) -> Result<(), SessionError> {
        let coordinator = authorize(caller)?;

        let _write = self.writes.lock().await;
        if !self.store.delete(session_id).await? {
            return Err(SessionError::NotFound(session_id.clone()));
        }

        tracing::info!(%session_id, by = %coordinator.participant_id(), "session deleted");
        Ok(())
    }

    /// Looks up one session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if it does not exist.
    pub async fn get_session(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))
    }

    /// Every session, newest first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.store.list().await?)
    }

    /// Every active session, newest first.
    pub async fn list_active(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.store.list_active().await?)
    }

    // -- Internals --------------------------------------------------------

    async fn reissue(
        &self,
        coordinator: &Coordinator,
        session_id: &SessionId,
        kind: Option<AttendanceKind>,
    ) -> Result<Session, SessionError> {
        let now = self.clock.now_millis();
        let issuer = &self.issuer;
        let session = self
            .modify(session_id, |session| {
                let kind = kind.unwrap_or(session.kind);
                let issued = issuer.issue(&session.id, kind, now)?;
                let expires_at = issued.expires_at();
                session.install_token(issued.encoded, expires_at);
                Ok(())
            })
            .await?;

        tracing::info!(
            %session_id,
            expires_at = session.token_expires_at(),
            by = %coordinator.participant_id(),
            "session token regenerated"
        );
        Ok(session)
    }

    /// Loads a session, applies `change`, and stores the result, all under
    /// the write lock.
    async fn modify<F>(&self, session_id: &SessionId, change: F) -> Result<Session, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<(), SessionError> + Send,
    {
        let _write = self.writes.lock().await;
        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        change(&mut session)?;
        self.store.put(session.clone()).await?;
        Ok(session)
    }

    fn validate_name(&self, name: &str) -> Result<String, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidName("name must not be empty".into()));
        }
        let len = name.chars().count();
        if len > self.config.max_name_len {
            return Err(SessionError::InvalidName(format!(
                "name is {len} characters, at most {} allowed",
                self.config.max_name_len
            )));
        }
        Ok(name.to_string())
    }
}

// =========================================================================
// Tests
// =========================================================================
