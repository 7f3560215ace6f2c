//! The decision engine: turns a scanned token into an attendance transition.

use std::sync::Arc;

use rollcall_store::{
    AttendanceKey, AttendanceRecord, AttendanceState, AttendanceStore,
    Provenance, SessionStore,
};
use rollcall_token::{decode, ParticipantId, SessionId, TokenKind};

use crate::locks::KeyedLocks;
use crate::{Acceptance, AttendanceError, Outcome, Rejection, Transition};

/// Validates presented tokens and records check-ins and check-outs.
///
/// Holds the two stores it needs as injected `Arc`s; nothing is global.
/// The engine is the ONLY writer of attendance records. It never writes
/// sessions and never mints tokens.
///
/// ## Concurrency
///
/// `present` may be called concurrently from any number of tasks. The
/// read-modify-write of a record runs under a per-(participant, session)
/// lock, so for one pair the transitions are serialized while unrelated
/// pairs proceed in parallel. The lock is in-process: every caller that
/// writes the same attendance store must go through the same engine.
pub struct AttendanceEngine<S: SessionStore, A: AttendanceStore> {
    sessions: Arc<S>,
    attendance: Arc<A>,
    locks: KeyedLocks<AttendanceKey>,
}

impl<S: SessionStore, A: AttendanceStore> AttendanceEngine<S, A> {
    /// Creates an engine over the given stores.
    pub fn new(sessions: Arc<S>, attendance: Arc<A>) -> Self {
        Self {
            sessions,
            attendance,
            locks: KeyedLocks::new(),
        }
    }

    /// Presents `token` on behalf of `participant_id` at `now` (epoch millis).
    ///
    /// Same as [`present_with_provenance`](Self::present_with_provenance)
    /// with empty provenance.
    pub async fn present(
        &self,
        participant_id: &ParticipantId,
        token: &str,
        now: u64,
    ) -> Result<Outcome, AttendanceError> {
        self.present_with_provenance(participant_id, token, now, &Provenance::default())
            .await
    }

    /// Presents `token` on behalf of `participant_id` at `now`, recording
    /// where the scan came from.
    ///
    /// Checks run in this order and the first failure wins:
    ///
    /// 1. the string decodes → else [`Rejection::MalformedToken`]
    /// 2. `now <= expiry` embedded in the token → else [`Rejection::TokenExpired`]
    /// 3. the session exists → else [`Rejection::SessionNotFound`]
    /// 4. the session is active → else [`Rejection::SessionInactive`]
    /// 5. the token is exactly the session's current token → else
    ///    [`Rejection::TokenSuperseded`]
    /// 6. under the pair's lock, load the record and apply the kind:
    ///    check-in, check-out, or [`Rejection::UnsupportedKind`]
    ///
    /// Step 2 uses only the token itself, so a stale copy is refused
    /// without touching storage.
    ///
    /// # Errors
    /// Returns [`AttendanceError::Storage`] if a store call fails. Every
    /// other failure is an `Ok(Outcome::Rejected(_))`.
    pub async fn present_with_provenance(
        &self,
        participant_id: &ParticipantId,
        token: &str,
        now: u64,
        provenance: &Provenance,
    ) -> Result<Outcome, AttendanceError> {
        // --- Step 1: syntax ---
        let decoded = match decode(token) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(%participant_id, error = %e, "token did not decode");
                return Ok(rejected(participant_id, None, Rejection::MalformedToken));
            }
        };
        let session_id = decoded.session_id();

        // --- Step 2: the token's own expiry ---
        if decoded.is_expired_at(now) {
            return Ok(rejected(participant_id, Some(&session_id), Rejection::TokenExpired));
        }

        // --- Steps 3-5: bind to the stored session ---
        let session = self
            .sessions
            .get(&session_id)
            .await
            .inspect_err(|e| storage_failure(participant_id, &session_id, e))?;
        let Some(session) = session else {
            return Ok(rejected(participant_id, Some(&session_id), Rejection::SessionNotFound));
        };
        if !session.active {
            return Ok(rejected(participant_id, Some(&session_id), Rejection::SessionInactive));
        }
        // Tokens are unsigned; this exact match is the integrity check.
        if session.current_token() != Some(token) {
            return Ok(rejected(participant_id, Some(&session_id), Rejection::TokenSuperseded));
        }

        // --- Steps 6-8: serialized read-modify-write for the pair ---
        let _guard = self
            .locks
            .lock((participant_id.clone(), session_id.clone()))
            .await;

        let existing = self
            .attendance
            .get(participant_id, &session_id)
            .await
            .inspect_err(|e| storage_failure(participant_id, &session_id, e))?;

        let (record, transition) = match decoded.kind {
            TokenKind::CheckIn => {
                let mut record = existing.unwrap_or_else(|| {
                    AttendanceRecord::new(participant_id.clone(), session_id.clone())
                });
                if record.check_in(now, provenance).is_err() {
                    return Ok(rejected(
                        participant_id,
                        Some(&session_id),
                        Rejection::AlreadyCheckedIn,
                    ));
                }
                (record, Transition::CheckedIn)
            }
            TokenKind::CheckOut => {
                // A check-out never creates a record.
                let Some(mut record) = existing else {
                    return Ok(rejected(
                        participant_id,
                        Some(&session_id),
                        Rejection::CheckInRequired,
                    ));
                };
                if let Err(state) = record.check_out(now) {
                    let reason = match state {
                        AttendanceState::Absent => Rejection::CheckInRequired,
                        AttendanceState::CheckedIn | AttendanceState::CheckedOut => {
                            Rejection::AlreadyCheckedOut
                        }
                    };
                    return Ok(rejected(participant_id, Some(&session_id), reason));
                }
                (record, Transition::CheckedOut)
            }
            TokenKind::Unsupported(ref kind) => {
                tracing::debug!(%participant_id, %session_id, %kind, "unsupported token kind");
                return Ok(rejected(participant_id, Some(&session_id), Rejection::UnsupportedKind));
            }
        };

        self.attendance
            .put(record.clone())
            .await
            .inspect_err(|e| storage_failure(participant_id, &session_id, e))?;

        tracing::info!(
            %participant_id,
            %session_id,
            ?transition,
            at = now,
            "attendance recorded"
        );
        Ok(Outcome::Accepted(Acceptance { transition, record }))
    }

    /// The state of one (participant, session) pair.
    pub async fn state_of(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> Result<AttendanceState, AttendanceError> {
        let record = self.attendance.get(participant_id, session_id).await?;
        Ok(AttendanceState::of(record.as_ref()))
    }

    /// Every record of one participant ("my attendance").
    pub async fn records_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.attendance.list_by_participant(participant_id).await?)
    }

    /// Every record of one session (a coordinator's roster view).
    pub async fn records_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.attendance.list_by_session(session_id).await?)
    }

    /// Every record in the store.
    pub async fn all_records(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.attendance.list().await?)
    }
}

fn rejected(
    participant_id: &ParticipantId,
    session_id: Option<&SessionId>,
    reason: Rejection,
) -> Outcome {
    tracing::debug!(
        %participant_id,
        session_id = session_id.map(tracing::field::display),
        ?reason,
        "presentation rejected"
    );
    Outcome::Rejected(reason)
}

fn storage_failure(
    participant_id: &ParticipantId,
    session_id: &SessionId,
    error: &rollcall_store::StoreError,
) {
    tracing::warn!(%participant_id, %session_id, %error, "store call failed during presentation");
}

#[cfg(test)]
mod tests {
    //! Unit tests for `AttendanceEngine`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! Time is passed explicitly, so expiry is tested by choosing `now`
    //! rather than by sleeping.

    use rollcall_store::{MemoryStore, Session, StoreError};
    use rollcall_token::{AttendanceKind, Token, TokenIssuer};

    use super::*;

    const WINDOW: u64 = 300_000;

    // -- Helpers ----------------------------------------------------------

    type Engine = AttendanceEngine<MemoryStore, MemoryStore>;

    fn engine_over(store: &Arc<MemoryStore>) -> Engine {
        AttendanceEngine::new(Arc::clone(store), Arc::clone(store))
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    /// Stores an active session with a freshly issued token; returns the token.
    async fn open_session(
        store: &MemoryStore,
        id: &str,
        kind: AttendanceKind,
        now: u64,
    ) -> String {
        let session_id = SessionId::new(id);
        let issued = TokenIssuer::default().issue(&session_id, kind, now).unwrap();
        let mut session = Session::new(session_id, id, kind, now);
        session.install_token(issued.encoded.clone(), issued.expires_at());
        SessionStore::put(store, session).await.unwrap();
        issued.encoded
    }

    /// Overwrites the session's token with one of another kind.
    async fn reissue(store: &MemoryStore, id: &str, kind: AttendanceKind, now: u64) -> String {
        let session_id = SessionId::new(id);
        let mut session = SessionStore::get(store, &session_id).await.unwrap().unwrap();
        let issued = TokenIssuer::default().issue(&session_id, kind, now).unwrap();
        session.install_token(issued.encoded.clone(), issued.expires_at());
        SessionStore::put(store, session).await.unwrap();
        issued.encoded
    }

    // =====================================================================
    // Validation steps 1-5
    // =====================================================================

    #[tokio::test]
    async fn test_present_garbage_returns_malformed() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);

        let outcome = engine.present(&pid("p1"), "not a token", 0).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::MalformedToken));
    }

    #[tokio::test]
    async fn test_present_after_window_returns_expired() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;

        let late = engine.present(&pid("p1"), &token, WINDOW + 1).await.unwrap();

        assert_eq!(late, Outcome::Rejected(Rejection::TokenExpired));
    }

    #[tokio::test]
    async fn test_present_just_inside_window_is_accepted() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;

        let outcome = engine.present(&pid("p1"), &token, WINDOW - 1).await.unwrap();

        assert_eq!(outcome.transition(), Some(Transition::CheckedIn));
    }

    #[tokio::test]
    async fn test_present_expired_token_is_rejected_before_lookup() {
        // No session exists at all, yet the answer is TokenExpired.
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = Token::new("ghost.01", AttendanceKind::CheckIn, 10).to_string();

        let outcome = engine.present(&pid("p1"), &token, 11).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::TokenExpired));
    }

    #[tokio::test]
    async fn test_present_unknown_session_returns_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = Token::new("ghost.01", AttendanceKind::CheckIn, 10).to_string();

        let outcome = engine.present(&pid("p1"), &token, 0).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::SessionNotFound));
    }

    #[tokio::test]
    async fn test_present_inactive_session_returns_inactive() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        let mut session = SessionStore::get(&*store, &SessionId::new("s1")).await.unwrap().unwrap();
        session.active = false;
        SessionStore::put(&*store, session).await.unwrap();

        let outcome = engine.present(&pid("p1"), &token, 1).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::SessionInactive));
    }

    #[tokio::test]
    async fn test_present_forged_token_for_real_session_returns_superseded() {
        // Right session, right kind, unexpired, but not the stored string.
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        let forged = Token::new("s1.0000000000000000", AttendanceKind::CheckIn, WINDOW).to_string();

        let outcome = engine.present(&pid("p1"), &forged, 1).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::TokenSuperseded));
    }

    #[tokio::test]
    async fn test_present_old_token_after_regeneration_returns_superseded() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let old = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        let new = reissue(&store, "s1", AttendanceKind::CheckIn, 10).await;

        let stale = engine.present(&pid("p1"), &old, 20).await.unwrap();
        let fresh = engine.present(&pid("p1"), &new, 20).await.unwrap();

        assert_eq!(stale, Outcome::Rejected(Rejection::TokenSuperseded));
        assert!(fresh.is_accepted());
    }

    // =====================================================================
    // State machine
    // =====================================================================

    #[tokio::test]
    async fn test_present_full_state_machine_sequence() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let check_in = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        let p1 = pid("p1");

        let first = engine.present(&p1, &check_in, 1).await.unwrap();
        let second = engine.present(&p1, &check_in, 2).await.unwrap();
        let check_out = reissue(&store, "s1", AttendanceKind::CheckOut, 3).await;
        let out = engine.present(&p1, &check_out, 4).await.unwrap();
        let again = engine.present(&p1, &check_out, 5).await.unwrap();

        assert_eq!(first.transition(), Some(Transition::CheckedIn));
        assert_eq!(second, Outcome::Rejected(Rejection::AlreadyCheckedIn));
        assert_eq!(out.transition(), Some(Transition::CheckedOut));
        assert_eq!(again, Outcome::Rejected(Rejection::AlreadyCheckedOut));

        let record = out.record().unwrap();
        assert_eq!(record.check_in_at(), Some(1));
        assert_eq!(record.check_out_at(), Some(4));
        assert_eq!(
            engine.state_of(&p1, &SessionId::new("s1")).await.unwrap(),
            AttendanceState::CheckedOut
        );
    }

    #[tokio::test]
    async fn test_present_check_out_without_check_in_returns_required() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckOut, 0).await;

        let outcome = engine.present(&pid("p1"), &token, 1).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::CheckInRequired));
        assert!(
            engine.all_records().await.unwrap().is_empty(),
            "a rejected check-out must not create a record"
        );
    }

    #[tokio::test]
    async fn test_present_check_in_after_check_out_returns_already_checked_in() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let p1 = pid("p1");
        let check_in = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        engine.present(&p1, &check_in, 1).await.unwrap();
        let check_out = reissue(&store, "s1", AttendanceKind::CheckOut, 2).await;
        engine.present(&p1, &check_out, 3).await.unwrap();
        let check_in_again = reissue(&store, "s1", AttendanceKind::CheckIn, 4).await;

        let outcome = engine.present(&p1, &check_in_again, 5).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::AlreadyCheckedIn));
    }

    #[tokio::test]
    async fn test_present_records_provenance() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;

        let outcome = engine
            .present_with_provenance(&pid("p1"), &token, 1, &Provenance::new("10.1.2.3", "Firefox"))
            .await
            .unwrap();

        let record = outcome.record().unwrap();
        assert_eq!(record.ip_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(record.user_agent.as_deref(), Some("Firefox"));
    }

    #[tokio::test]
    async fn test_present_check_out_keeps_check_in_provenance() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let arrival = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;
        engine
            .present_with_provenance(&pid("p1"), &arrival, 1, &Provenance::new("10.1.2.3", "Firefox"))
            .await
            .unwrap();
        let departure = reissue(&store, "s1", AttendanceKind::CheckOut, 2).await;

        let outcome = engine
            .present_with_provenance(&pid("p1"), &departure, 3, &Provenance::new("10.9.9.9", "curl"))
            .await
            .unwrap();

        let record = outcome.record().unwrap();
        assert_eq!(record.check_out_at(), Some(3));
        assert_eq!(record.ip_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(record.user_agent.as_deref(), Some("Firefox"));
    }

    #[tokio::test]
    async fn test_present_unsupported_kind_returns_unsupported() {
        // Only reachable when the store itself holds an odd token.
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let raw = Token::new("s1.aa", TokenKind::Unsupported("lunch".into()), WINDOW).to_string();
        let mut session = Session::new(SessionId::new("s1"), "s1", AttendanceKind::CheckIn, 0);
        session.install_token(raw.clone(), WINDOW);
        SessionStore::put(&*store, session).await.unwrap();

        let outcome = engine.present(&pid("p1"), &raw, 1).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::UnsupportedKind));
    }

    #[tokio::test]
    async fn test_present_pairs_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(&store);
        let token = open_session(&store, "s1", AttendanceKind::CheckIn, 0).await;

        let a = engine.present(&pid("p1"), &token, 1).await.unwrap();
        let b = engine.present(&pid("p2"), &token, 1).await.unwrap();

        assert!(a.is_accepted());
        assert!(b.is_accepted());
        assert_eq!(engine.records_for_session(&SessionId::new("s1")).await.unwrap().len(), 2);
        assert_eq!(engine.records_for_participant(&pid("p2")).await.unwrap().len(), 1);
    }

    // =====================================================================
    // Storage failures
    // =====================================================================

    /// A session store that is always down.
    struct DownSessions;

    impl SessionStore for DownSessions {
        async fn get(&self, _: &SessionId) -> Result<Option<Session>, StoreError> {
            Err(StoreError::Unavailable("db offline".into()))
        }
        async fn put(&self, _: Session) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("db offline".into()))
        }
        async fn delete(&self, _: &SessionId) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("db offline".into()))
        }
        async fn list(&self) -> Result<Vec<Session>, StoreError> {
            Err(StoreError::Unavailable("db offline".into()))
        }
        async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
            Err(StoreError::Unavailable("db offline".into()))
        }
    }

    #[tokio::test]
    async fn test_present_store_down_returns_retryable_error() {
        let engine = AttendanceEngine::new(Arc::new(DownSessions), Arc::new(MemoryStore::new()));
        let token = Token::new("s1.01", AttendanceKind::CheckIn, 10).to_string();

        let result = engine.present(&pid("p1"), &token, 0).await;

        let err = result.expect_err("store failure is not an outcome");
        assert!(err.is_retryable());
        assert_eq!(
            err,
            AttendanceError::Storage(StoreError::Unavailable("db offline".into()))
        );
    }

    #[tokio::test]
    async fn test_present_malformed_never_touches_store() {
        // Even with a dead store, syntax and expiry checks answer.
        let engine = AttendanceEngine::new(Arc::new(DownSessions), Arc::new(MemoryStore::new()));

        let outcome = engine.present(&pid("p1"), "SESSION_x;TYPE=checkin", 0).await;

        assert_eq!(outcome, Ok(Outcome::Rejected(Rejection::MalformedToken)));
    }
}
